use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::ProjectStatus;

/// Status of a sync run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
}

/// A persisted record of a single sync operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: i64,
    pub source: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub records_synced: i64,
    pub anomalies: i64,
    /// Per-resource breakdown, stored as opaque JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Result of syncing one remote resource kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSync {
    pub resource: String,
    pub count: u64,
    /// Records whose monetary fields could not be parsed and were zeroed.
    pub anomalies: u64,
}

/// Aggregate result of a full connector sync across all resource kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub results: Vec<ResourceSync>,
}

impl SyncReport {
    pub fn records(&self) -> u64 {
        self.results.iter().map(|r| r.count).sum()
    }

    pub fn anomalies(&self) -> u64 {
        self.results.iter().map(|r| r.anomalies).sum()
    }
}

/// Per-entity counts produced by one mock seed batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub clients: u64,
    pub projects: u64,
    pub vendors: u64,
    pub employees: u64,
    pub finance_records: u64,
    pub purchase_orders: u64,
    pub inventory_items: u64,
}

impl SeedSummary {
    pub fn total(&self) -> u64 {
        self.clients
            + self.projects
            + self.vendors
            + self.employees
            + self.finance_records
            + self.purchase_orders
            + self.inventory_items
    }
}

/// What a dispatched sync produced, tagged by how it ran.
///
/// `NotImplemented` lets callers tell "ran, but the source is a stub" apart
/// from a failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SyncOutcome {
    Seeded { summary: SeedSummary },
    Synced { report: SyncReport },
    NotImplemented { source: String },
}

impl SyncOutcome {
    /// Total records written by this outcome.
    pub fn records(&self) -> u64 {
        match self {
            SyncOutcome::Seeded { summary } => summary.total(),
            SyncOutcome::Synced { report } => report.records(),
            SyncOutcome::NotImplemented { .. } => 0,
        }
    }

    /// Total mapping anomalies recorded by this outcome.
    pub fn anomalies(&self) -> u64 {
        match self {
            SyncOutcome::Synced { report } => report.anomalies(),
            _ => 0,
        }
    }
}

/// Filter for querying projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    /// Case-insensitive substring match on the denormalized client name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// Headline dashboard figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_revenue: Decimal,
    pub outstanding_receivables: Decimal,
    pub total_expenses: Decimal,
    pub active_projects: i64,
    pub vendor_outstanding: Decimal,
}

/// Budget-vs-actual figures for one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetVariance {
    pub id: String,
    pub name: String,
    pub budget: Decimal,
    pub actual: Decimal,
    /// Spend as a percentage of budget, one decimal place.
    pub utilization: f64,
}
