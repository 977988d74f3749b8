use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    client::Client,
    common::FinanceKind,
    employee::Employee,
    finance::FinanceRecord,
    inventory::InventoryItem,
    project::Project,
    purchase_order::PurchaseOrder,
    sync::{BudgetVariance, KpiSummary, ProjectFilter, SyncRun, SyncStatus},
    vendor::Vendor,
};

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Insert-or-replace keyed on `external_id`.
    async fn upsert_client(&self, client: &Client) -> Result<()>;
    /// Bulk insert for generated rows (no external id).
    async fn insert_clients(&self, clients: &[Client]) -> Result<u64>;
    async fn get_client_by_external_id(&self, external_id: &str) -> Result<Option<Client>>;
    async fn list_clients(&self) -> Result<Vec<Client>>;
    async fn count_clients(&self) -> Result<i64>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert-or-replace keyed on the project id.
    async fn upsert_project(&self, project: &Project) -> Result<()>;
    /// Bulk insert-or-ignore for generated rows.
    async fn insert_projects(&self, projects: &[Project]) -> Result<u64>;
    async fn get_project(&self, id: &str) -> Result<Option<Project>>;
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>>;
    async fn count_projects(&self) -> Result<i64>;
}

#[async_trait]
pub trait VendorRepository: Send + Sync {
    async fn upsert_vendor(&self, vendor: &Vendor) -> Result<()>;
    /// Bulk insert returning the assigned row ids, in input order.
    async fn insert_vendors(&self, vendors: &[Vendor]) -> Result<Vec<i64>>;
    async fn get_vendor_by_external_id(&self, external_id: &str) -> Result<Option<Vendor>>;
    async fn list_vendors(&self) -> Result<Vec<Vendor>>;
    async fn count_vendors(&self) -> Result<i64>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn upsert_employee(&self, employee: &Employee) -> Result<()>;
    async fn insert_employees(&self, employees: &[Employee]) -> Result<u64>;
    async fn list_employees(&self, limit: i64) -> Result<Vec<Employee>>;
    async fn count_employees(&self) -> Result<i64>;
}

#[async_trait]
pub trait FinanceRepository: Send + Sync {
    async fn upsert_finance_record(&self, record: &FinanceRecord) -> Result<()>;
    async fn insert_finance_records(&self, records: &[FinanceRecord]) -> Result<u64>;
    async fn get_finance_record(&self, id: &str) -> Result<Option<FinanceRecord>>;
    /// Newest first; `kind = None` lists every kind.
    async fn list_finance_records(
        &self,
        kind: Option<FinanceKind>,
        limit: i64,
    ) -> Result<Vec<FinanceRecord>>;
    async fn count_finance_records(&self) -> Result<i64>;
}

#[async_trait]
pub trait PurchaseOrderRepository: Send + Sync {
    async fn upsert_purchase_order(&self, po: &PurchaseOrder) -> Result<()>;
    async fn insert_purchase_orders(&self, pos: &[PurchaseOrder]) -> Result<u64>;
    async fn get_purchase_order(&self, id: &str) -> Result<Option<PurchaseOrder>>;
    async fn list_purchase_orders(&self, limit: i64) -> Result<Vec<PurchaseOrder>>;
    async fn count_purchase_orders(&self) -> Result<i64>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn upsert_inventory_item(&self, item: &InventoryItem) -> Result<()>;
    async fn insert_inventory_items(&self, items: &[InventoryItem]) -> Result<u64>;
    async fn get_inventory_item(&self, id: &str) -> Result<Option<InventoryItem>>;
    async fn list_inventory_items(&self, limit: i64) -> Result<Vec<InventoryItem>>;
    async fn count_inventory_items(&self) -> Result<i64>;
}

#[async_trait]
pub trait SyncRunRepository: Send + Sync {
    /// Record the start of a sync; the returned run is in `Running` state.
    async fn create_sync_run(&self, source: &str) -> Result<SyncRun>;
    async fn finish_sync_run(
        &self,
        id: i64,
        status: SyncStatus,
        error_message: Option<&str>,
        records_synced: i64,
        anomalies: i64,
        details: Option<&serde_json::Value>,
    ) -> Result<()>;
    async fn get_sync_run(&self, id: i64) -> Result<Option<SyncRun>>;
    async fn latest_sync_run(&self) -> Result<Option<SyncRun>>;
}

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn kpi_summary(&self) -> Result<KpiSummary>;
    /// Projects ranked by budget utilization, riskiest first.
    async fn budget_variance(&self, limit: usize) -> Result<Vec<BudgetVariance>>;
}

/// Combined repository trait for all entity types.
pub trait GirderRepository:
    ClientRepository
    + ProjectRepository
    + VendorRepository
    + EmployeeRepository
    + FinanceRepository
    + PurchaseOrderRepository
    + InventoryRepository
    + SyncRunRepository
    + DashboardRepository
{
}
