use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::models::{
    client::Client,
    common::{EmployeeStatus, FinanceKind, FinanceStatus, ProjectStatus, PurchaseOrderStatus},
    employee::Employee,
    finance::FinanceRecord,
    inventory::InventoryItem,
    project::Project,
    purchase_order::PurchaseOrder,
    sync::{BudgetVariance, KpiSummary, ProjectFilter, SyncRun, SyncStatus},
    vendor::Vendor,
};

use super::repository::{
    ClientRepository, DashboardRepository, EmployeeRepository, FinanceRepository,
    GirderRepository, InventoryRepository, ProjectRepository, PurchaseOrderRepository,
    SyncRunRepository, VendorRepository,
};

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl GirderRepository for SqliteRepository {}

// -- Helper functions for parsing enums and values from DB strings --
//
// Parse fallbacks match the documented defaults for each closed status set.

fn parse_project_status(s: &str) -> ProjectStatus {
    match s {
        "Planning" => ProjectStatus::Planning,
        "In Progress" => ProjectStatus::InProgress,
        "On Hold" => ProjectStatus::OnHold,
        "Completed" => ProjectStatus::Completed,
        _ => ProjectStatus::InProgress,
    }
}

fn project_status_to_str(s: &ProjectStatus) -> &'static str {
    match s {
        ProjectStatus::Planning => "Planning",
        ProjectStatus::InProgress => "In Progress",
        ProjectStatus::OnHold => "On Hold",
        ProjectStatus::Completed => "Completed",
    }
}

fn parse_finance_kind(s: &str) -> FinanceKind {
    match s {
        "invoice" => FinanceKind::Invoice,
        "payment" => FinanceKind::Payment,
        "expense" => FinanceKind::Expense,
        _ => FinanceKind::Expense,
    }
}

fn finance_kind_to_str(k: &FinanceKind) -> &'static str {
    match k {
        FinanceKind::Invoice => "invoice",
        FinanceKind::Payment => "payment",
        FinanceKind::Expense => "expense",
    }
}

fn parse_finance_status(s: &str) -> FinanceStatus {
    match s {
        "Paid" => FinanceStatus::Paid,
        "Pending" => FinanceStatus::Pending,
        "Overdue" => FinanceStatus::Overdue,
        _ => FinanceStatus::Pending,
    }
}

fn finance_status_to_str(s: &FinanceStatus) -> &'static str {
    match s {
        FinanceStatus::Paid => "Paid",
        FinanceStatus::Pending => "Pending",
        FinanceStatus::Overdue => "Overdue",
    }
}

fn parse_po_status(s: &str) -> PurchaseOrderStatus {
    match s {
        "Issued" => PurchaseOrderStatus::Issued,
        "Received" => PurchaseOrderStatus::Received,
        "Cancelled" => PurchaseOrderStatus::Cancelled,
        _ => PurchaseOrderStatus::Issued,
    }
}

fn po_status_to_str(s: &PurchaseOrderStatus) -> &'static str {
    match s {
        PurchaseOrderStatus::Issued => "Issued",
        PurchaseOrderStatus::Received => "Received",
        PurchaseOrderStatus::Cancelled => "Cancelled",
    }
}

fn parse_employee_status(s: &str) -> EmployeeStatus {
    match s {
        "Active" => EmployeeStatus::Active,
        "On Leave" => EmployeeStatus::OnLeave,
        "Left" => EmployeeStatus::Left,
        _ => EmployeeStatus::Active,
    }
}

fn employee_status_to_str(s: &EmployeeStatus) -> &'static str {
    match s {
        EmployeeStatus::Active => "Active",
        EmployeeStatus::OnLeave => "On Leave",
        EmployeeStatus::Left => "Left",
    }
}

fn parse_sync_status(s: &str) -> SyncStatus {
    match s {
        "running" => SyncStatus::Running,
        "completed" => SyncStatus::Completed,
        "failed" => SyncStatus::Failed,
        _ => SyncStatus::Failed,
    }
}

fn sync_status_to_str(s: &SyncStatus) -> &'static str {
    match s {
        SyncStatus::Running => "running",
        SyncStatus::Completed => "completed",
        SyncStatus::Failed => "failed",
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn datetime_to_str(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_opt_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
}

fn opt_date_to_str(d: &Option<NaiveDate>) -> Option<String> {
    d.map(|v| v.format("%Y-%m-%d").to_string())
}

fn parse_decimal(s: &str) -> Decimal {
    s.parse().unwrap_or(Decimal::ZERO)
}

fn decimal_to_str(d: &Decimal) -> String {
    d.to_string()
}

fn parse_opt_decimal(s: Option<String>) -> Option<Decimal> {
    s.and_then(|v| v.parse().ok())
}

fn opt_decimal_to_str(d: &Option<Decimal>) -> Option<String> {
    d.as_ref().map(|v| v.to_string())
}

fn parse_metadata(s: Option<String>) -> Option<serde_json::Value> {
    s.and_then(|v| serde_json::from_str(&v).ok())
}

fn metadata_to_str(v: &Option<serde_json::Value>) -> Option<String> {
    v.as_ref().map(|val| val.to_string())
}

// -- Row mapping --

fn row_to_client(r: &sqlx::sqlite::SqliteRow) -> Client {
    Client {
        id: r.get("id"),
        external_id: r.get("external_id"),
        name: r.get("name"),
        contact_person: r.get("contact_person"),
        email: r.get("email"),
        phone: r.get("phone"),
        address: r.get("address"),
        metadata: parse_metadata(r.get("metadata")),
    }
}

fn row_to_project(r: &sqlx::sqlite::SqliteRow) -> Project {
    Project {
        id: r.get("id"),
        name: r.get("name"),
        status: parse_project_status(r.get("status")),
        start_date: parse_opt_date(r.get("start_date")),
        end_date: parse_opt_date(r.get("end_date")),
        budget: parse_decimal(r.get("budget")),
        client_name: r.get("client_name"),
        anomaly: r.get("anomaly"),
        last_synced_at: parse_datetime(r.get("last_synced_at")),
        metadata: parse_metadata(r.get("metadata")),
    }
}

fn row_to_vendor(r: &sqlx::sqlite::SqliteRow) -> Vendor {
    Vendor {
        id: r.get("id"),
        external_id: r.get("external_id"),
        name: r.get("name"),
        category: r.get("category"),
        rating: r.get("rating"),
        contact_person: r.get("contact_person"),
        email: r.get("email"),
        phone: r.get("phone"),
        metadata: parse_metadata(r.get("metadata")),
    }
}

fn row_to_employee(r: &sqlx::sqlite::SqliteRow) -> Employee {
    Employee {
        id: r.get("id"),
        external_id: r.get("external_id"),
        name: r.get("name"),
        designation: r.get("designation"),
        department: r.get("department"),
        email: r.get("email"),
        phone: r.get("phone"),
        joining_date: parse_opt_date(r.get("joining_date")),
        salary: parse_opt_decimal(r.get("salary")),
        status: parse_employee_status(r.get("status")),
        metadata: parse_metadata(r.get("metadata")),
    }
}

fn row_to_finance_record(r: &sqlx::sqlite::SqliteRow) -> FinanceRecord {
    FinanceRecord {
        id: r.get("id"),
        project_id: r.get("project_id"),
        vendor_id: r.get("vendor_id"),
        kind: parse_finance_kind(r.get("kind")),
        amount: parse_decimal(r.get("amount")),
        date: parse_opt_date(r.get("date")),
        status: parse_finance_status(r.get("status")),
        description: r.get("description"),
        anomaly: r.get("anomaly"),
        metadata: parse_metadata(r.get("metadata")),
    }
}

fn row_to_purchase_order(r: &sqlx::sqlite::SqliteRow) -> PurchaseOrder {
    PurchaseOrder {
        id: r.get("id"),
        project_id: r.get("project_id"),
        vendor_id: r.get("vendor_id"),
        total_amount: parse_decimal(r.get("total_amount")),
        issue_date: parse_opt_date(r.get("issue_date")),
        delivery_date: parse_opt_date(r.get("delivery_date")),
        status: parse_po_status(r.get("status")),
        anomaly: r.get("anomaly"),
        metadata: parse_metadata(r.get("metadata")),
    }
}

fn row_to_inventory_item(r: &sqlx::sqlite::SqliteRow) -> InventoryItem {
    InventoryItem {
        id: r.get("id"),
        project_id: r.get("project_id"),
        name: r.get("name"),
        quantity: r.get("quantity"),
        unit: r.get("unit"),
        unit_price: parse_decimal(r.get("unit_price")),
        last_updated: parse_datetime(r.get("last_updated")),
        anomaly: r.get("anomaly"),
        metadata: parse_metadata(r.get("metadata")),
    }
}

fn row_to_sync_run(r: &sqlx::sqlite::SqliteRow) -> SyncRun {
    SyncRun {
        id: r.get("id"),
        source: r.get("source"),
        status: parse_sync_status(r.get("status")),
        started_at: parse_datetime(r.get("started_at")),
        completed_at: r
            .get::<Option<String>, _>("completed_at")
            .map(|s| parse_datetime(&s)),
        error_message: r.get("error_message"),
        records_synced: r.get("records_synced"),
        anomalies: r.get("anomalies"),
        details: parse_metadata(r.get("details")),
    }
}

// -- ClientRepository --

#[async_trait]
impl ClientRepository for SqliteRepository {
    async fn upsert_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            "INSERT INTO clients (external_id, name, contact_person, email, phone, address, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(external_id) DO UPDATE SET
                name = excluded.name,
                contact_person = excluded.contact_person,
                email = excluded.email,
                phone = excluded.phone,
                address = excluded.address,
                metadata = excluded.metadata",
        )
        .bind(&client.external_id)
        .bind(&client.name)
        .bind(&client.contact_person)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(metadata_to_str(&client.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_clients(&self, clients: &[Client]) -> Result<u64> {
        let mut inserted = 0;
        for client in clients {
            let result = sqlx::query(
                "INSERT INTO clients (external_id, name, contact_person, email, phone, address, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&client.external_id)
            .bind(&client.name)
            .bind(&client.contact_person)
            .bind(&client.email)
            .bind(&client.phone)
            .bind(&client.address)
            .bind(metadata_to_str(&client.metadata))
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn get_client_by_external_id(&self, external_id: &str) -> Result<Option<Client>> {
        let row = sqlx::query("SELECT * FROM clients WHERE external_id = ?1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_client))
    }

    async fn list_clients(&self) -> Result<Vec<Client>> {
        let rows = sqlx::query("SELECT * FROM clients ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_client).collect())
    }

    async fn count_clients(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

// -- ProjectRepository --

#[async_trait]
impl ProjectRepository for SqliteRepository {
    async fn upsert_project(&self, project: &Project) -> Result<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, status, start_date, end_date, budget, client_name, anomaly, last_synced_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                budget = excluded.budget,
                client_name = excluded.client_name,
                anomaly = excluded.anomaly,
                last_synced_at = excluded.last_synced_at,
                metadata = excluded.metadata",
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(project_status_to_str(&project.status))
        .bind(opt_date_to_str(&project.start_date))
        .bind(opt_date_to_str(&project.end_date))
        .bind(decimal_to_str(&project.budget))
        .bind(&project.client_name)
        .bind(project.anomaly)
        .bind(datetime_to_str(&project.last_synced_at))
        .bind(metadata_to_str(&project.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_projects(&self, projects: &[Project]) -> Result<u64> {
        let mut inserted = 0;
        for project in projects {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO projects (id, name, status, start_date, end_date, budget, client_name, anomaly, last_synced_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .bind(&project.id)
            .bind(&project.name)
            .bind(project_status_to_str(&project.status))
            .bind(opt_date_to_str(&project.start_date))
            .bind(opt_date_to_str(&project.end_date))
            .bind(decimal_to_str(&project.budget))
            .bind(&project.client_name)
            .bind(project.anomaly)
            .bind(datetime_to_str(&project.last_synced_at))
            .bind(metadata_to_str(&project.metadata))
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_project))
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let rows = match (&filter.status, &filter.client) {
            (Some(status), Some(client)) => {
                sqlx::query(
                    "SELECT * FROM projects WHERE status = ?1 AND client_name LIKE ?2 ORDER BY id",
                )
                .bind(project_status_to_str(status))
                .bind(format!("%{client}%"))
                .fetch_all(&self.pool)
                .await?
            }
            (Some(status), None) => {
                sqlx::query("SELECT * FROM projects WHERE status = ?1 ORDER BY id")
                    .bind(project_status_to_str(status))
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(client)) => {
                sqlx::query("SELECT * FROM projects WHERE client_name LIKE ?1 ORDER BY id")
                    .bind(format!("%{client}%"))
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                sqlx::query("SELECT * FROM projects ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.iter().map(row_to_project).collect())
    }

    async fn count_projects(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM projects")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

// -- VendorRepository --

#[async_trait]
impl VendorRepository for SqliteRepository {
    async fn upsert_vendor(&self, vendor: &Vendor) -> Result<()> {
        sqlx::query(
            "INSERT INTO vendors (external_id, name, category, rating, contact_person, email, phone, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(external_id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                rating = excluded.rating,
                contact_person = excluded.contact_person,
                email = excluded.email,
                phone = excluded.phone,
                metadata = excluded.metadata",
        )
        .bind(&vendor.external_id)
        .bind(&vendor.name)
        .bind(&vendor.category)
        .bind(vendor.rating)
        .bind(&vendor.contact_person)
        .bind(&vendor.email)
        .bind(&vendor.phone)
        .bind(metadata_to_str(&vendor.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_vendors(&self, vendors: &[Vendor]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(vendors.len());
        for vendor in vendors {
            let result = sqlx::query(
                "INSERT INTO vendors (external_id, name, category, rating, contact_person, email, phone, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&vendor.external_id)
            .bind(&vendor.name)
            .bind(&vendor.category)
            .bind(vendor.rating)
            .bind(&vendor.contact_person)
            .bind(&vendor.email)
            .bind(&vendor.phone)
            .bind(metadata_to_str(&vendor.metadata))
            .execute(&self.pool)
            .await?;
            ids.push(result.last_insert_rowid());
        }
        Ok(ids)
    }

    async fn get_vendor_by_external_id(&self, external_id: &str) -> Result<Option<Vendor>> {
        let row = sqlx::query("SELECT * FROM vendors WHERE external_id = ?1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_vendor))
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>> {
        let rows = sqlx::query("SELECT * FROM vendors ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_vendor).collect())
    }

    async fn count_vendors(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM vendors")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

// -- EmployeeRepository --

#[async_trait]
impl EmployeeRepository for SqliteRepository {
    async fn upsert_employee(&self, employee: &Employee) -> Result<()> {
        sqlx::query(
            "INSERT INTO employees (external_id, name, designation, department, email, phone, joining_date, salary, status, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(external_id) DO UPDATE SET
                name = excluded.name,
                designation = excluded.designation,
                department = excluded.department,
                email = excluded.email,
                phone = excluded.phone,
                joining_date = excluded.joining_date,
                salary = excluded.salary,
                status = excluded.status,
                metadata = excluded.metadata",
        )
        .bind(&employee.external_id)
        .bind(&employee.name)
        .bind(&employee.designation)
        .bind(&employee.department)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(opt_date_to_str(&employee.joining_date))
        .bind(opt_decimal_to_str(&employee.salary))
        .bind(employee_status_to_str(&employee.status))
        .bind(metadata_to_str(&employee.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_employees(&self, employees: &[Employee]) -> Result<u64> {
        let mut inserted = 0;
        for employee in employees {
            let result = sqlx::query(
                "INSERT INTO employees (external_id, name, designation, department, email, phone, joining_date, salary, status, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .bind(&employee.external_id)
            .bind(&employee.name)
            .bind(&employee.designation)
            .bind(&employee.department)
            .bind(&employee.email)
            .bind(&employee.phone)
            .bind(opt_date_to_str(&employee.joining_date))
            .bind(opt_decimal_to_str(&employee.salary))
            .bind(employee_status_to_str(&employee.status))
            .bind(metadata_to_str(&employee.metadata))
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn list_employees(&self, limit: i64) -> Result<Vec<Employee>> {
        let rows = sqlx::query("SELECT * FROM employees ORDER BY name LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_employee).collect())
    }

    async fn count_employees(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

// -- FinanceRepository --

#[async_trait]
impl FinanceRepository for SqliteRepository {
    async fn upsert_finance_record(&self, record: &FinanceRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO finance_records (id, project_id, vendor_id, kind, amount, date, status, description, anomaly, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                project_id = excluded.project_id,
                vendor_id = excluded.vendor_id,
                kind = excluded.kind,
                amount = excluded.amount,
                date = excluded.date,
                status = excluded.status,
                description = excluded.description,
                anomaly = excluded.anomaly,
                metadata = excluded.metadata",
        )
        .bind(&record.id)
        .bind(&record.project_id)
        .bind(record.vendor_id)
        .bind(finance_kind_to_str(&record.kind))
        .bind(decimal_to_str(&record.amount))
        .bind(opt_date_to_str(&record.date))
        .bind(finance_status_to_str(&record.status))
        .bind(&record.description)
        .bind(record.anomaly)
        .bind(metadata_to_str(&record.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_finance_records(&self, records: &[FinanceRecord]) -> Result<u64> {
        let mut inserted = 0;
        for record in records {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO finance_records (id, project_id, vendor_id, kind, amount, date, status, description, anomaly, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .bind(&record.id)
            .bind(&record.project_id)
            .bind(record.vendor_id)
            .bind(finance_kind_to_str(&record.kind))
            .bind(decimal_to_str(&record.amount))
            .bind(opt_date_to_str(&record.date))
            .bind(finance_status_to_str(&record.status))
            .bind(&record.description)
            .bind(record.anomaly)
            .bind(metadata_to_str(&record.metadata))
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn get_finance_record(&self, id: &str) -> Result<Option<FinanceRecord>> {
        let row = sqlx::query("SELECT * FROM finance_records WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_finance_record))
    }

    async fn list_finance_records(
        &self,
        kind: Option<FinanceKind>,
        limit: i64,
    ) -> Result<Vec<FinanceRecord>> {
        let rows = match kind {
            Some(kind) => {
                sqlx::query(
                    "SELECT * FROM finance_records WHERE kind = ?1 ORDER BY date DESC LIMIT ?2",
                )
                .bind(finance_kind_to_str(&kind))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM finance_records ORDER BY date DESC LIMIT ?1")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.iter().map(row_to_finance_record).collect())
    }

    async fn count_finance_records(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM finance_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

// -- PurchaseOrderRepository --

#[async_trait]
impl PurchaseOrderRepository for SqliteRepository {
    async fn upsert_purchase_order(&self, po: &PurchaseOrder) -> Result<()> {
        sqlx::query(
            "INSERT INTO purchase_orders (id, project_id, vendor_id, total_amount, issue_date, delivery_date, status, anomaly, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                project_id = excluded.project_id,
                vendor_id = excluded.vendor_id,
                total_amount = excluded.total_amount,
                issue_date = excluded.issue_date,
                delivery_date = excluded.delivery_date,
                status = excluded.status,
                anomaly = excluded.anomaly,
                metadata = excluded.metadata",
        )
        .bind(&po.id)
        .bind(&po.project_id)
        .bind(po.vendor_id)
        .bind(decimal_to_str(&po.total_amount))
        .bind(opt_date_to_str(&po.issue_date))
        .bind(opt_date_to_str(&po.delivery_date))
        .bind(po_status_to_str(&po.status))
        .bind(po.anomaly)
        .bind(metadata_to_str(&po.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_purchase_orders(&self, pos: &[PurchaseOrder]) -> Result<u64> {
        let mut inserted = 0;
        for po in pos {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO purchase_orders (id, project_id, vendor_id, total_amount, issue_date, delivery_date, status, anomaly, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(&po.id)
            .bind(&po.project_id)
            .bind(po.vendor_id)
            .bind(decimal_to_str(&po.total_amount))
            .bind(opt_date_to_str(&po.issue_date))
            .bind(opt_date_to_str(&po.delivery_date))
            .bind(po_status_to_str(&po.status))
            .bind(po.anomaly)
            .bind(metadata_to_str(&po.metadata))
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn get_purchase_order(&self, id: &str) -> Result<Option<PurchaseOrder>> {
        let row = sqlx::query("SELECT * FROM purchase_orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_purchase_order))
    }

    async fn list_purchase_orders(&self, limit: i64) -> Result<Vec<PurchaseOrder>> {
        let rows = sqlx::query("SELECT * FROM purchase_orders ORDER BY issue_date DESC LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_purchase_order).collect())
    }

    async fn count_purchase_orders(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM purchase_orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

// -- InventoryRepository --

#[async_trait]
impl InventoryRepository for SqliteRepository {
    async fn upsert_inventory_item(&self, item: &InventoryItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO inventory_items (id, project_id, name, quantity, unit, unit_price, last_updated, anomaly, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                project_id = excluded.project_id,
                name = excluded.name,
                quantity = excluded.quantity,
                unit = excluded.unit,
                unit_price = excluded.unit_price,
                last_updated = excluded.last_updated,
                anomaly = excluded.anomaly,
                metadata = excluded.metadata",
        )
        .bind(&item.id)
        .bind(&item.project_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(decimal_to_str(&item.unit_price))
        .bind(datetime_to_str(&item.last_updated))
        .bind(item.anomaly)
        .bind(metadata_to_str(&item.metadata))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_inventory_items(&self, items: &[InventoryItem]) -> Result<u64> {
        let mut inserted = 0;
        for item in items {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO inventory_items (id, project_id, name, quantity, unit, unit_price, last_updated, anomaly, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(&item.id)
            .bind(&item.project_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(&item.unit)
            .bind(decimal_to_str(&item.unit_price))
            .bind(datetime_to_str(&item.last_updated))
            .bind(item.anomaly)
            .bind(metadata_to_str(&item.metadata))
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn get_inventory_item(&self, id: &str) -> Result<Option<InventoryItem>> {
        let row = sqlx::query("SELECT * FROM inventory_items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_inventory_item))
    }

    async fn list_inventory_items(&self, limit: i64) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query("SELECT * FROM inventory_items ORDER BY name LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_inventory_item).collect())
    }

    async fn count_inventory_items(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM inventory_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

// -- SyncRunRepository --

#[async_trait]
impl SyncRunRepository for SqliteRepository {
    async fn create_sync_run(&self, source: &str) -> Result<SyncRun> {
        let started_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO sync_runs (source, status, started_at) VALUES (?1, 'running', ?2)",
        )
        .bind(source)
        .bind(datetime_to_str(&started_at))
        .execute(&self.pool)
        .await?;

        Ok(SyncRun {
            id: result.last_insert_rowid(),
            source: source.to_string(),
            status: SyncStatus::Running,
            started_at,
            completed_at: None,
            error_message: None,
            records_synced: 0,
            anomalies: 0,
            details: None,
        })
    }

    async fn finish_sync_run(
        &self,
        id: i64,
        status: SyncStatus,
        error_message: Option<&str>,
        records_synced: i64,
        anomalies: i64,
        details: Option<&serde_json::Value>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE sync_runs SET status = ?2, completed_at = ?3, error_message = ?4,
                records_synced = ?5, anomalies = ?6, details = ?7
             WHERE id = ?1",
        )
        .bind(id)
        .bind(sync_status_to_str(&status))
        .bind(datetime_to_str(&Utc::now()))
        .bind(error_message)
        .bind(records_synced)
        .bind(anomalies)
        .bind(details.map(|d| d.to_string()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_sync_run(&self, id: i64) -> Result<Option<SyncRun>> {
        let row = sqlx::query("SELECT * FROM sync_runs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_sync_run))
    }

    async fn latest_sync_run(&self) -> Result<Option<SyncRun>> {
        let row = sqlx::query("SELECT * FROM sync_runs ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_sync_run))
    }
}

// -- DashboardRepository --

async fn sum_amounts(pool: &SqlitePool, sql: &str) -> Result<Decimal> {
    let rows = sqlx::query(sql).fetch_all(pool).await?;
    Ok(rows
        .iter()
        .map(|r| parse_decimal(r.get("amount")))
        .sum())
}

#[async_trait]
impl DashboardRepository for SqliteRepository {
    async fn kpi_summary(&self) -> Result<KpiSummary> {
        // Sums run over canonical decimal strings in Rust rather than SQL so
        // monetary precision survives aggregation.
        let total_revenue = sum_amounts(
            &self.pool,
            "SELECT amount FROM finance_records WHERE kind = 'invoice' AND status = 'Paid'",
        )
        .await?;
        let outstanding_receivables = sum_amounts(
            &self.pool,
            "SELECT amount FROM finance_records WHERE kind = 'invoice' AND status = 'Pending'",
        )
        .await?;
        let total_expenses = sum_amounts(
            &self.pool,
            "SELECT amount FROM finance_records WHERE kind = 'expense'",
        )
        .await?;

        let row = sqlx::query("SELECT COUNT(*) AS n FROM projects WHERE status = 'In Progress'")
            .fetch_one(&self.pool)
            .await?;
        let active_projects: i64 = row.get("n");

        let po_rows = sqlx::query("SELECT total_amount AS amount FROM purchase_orders")
            .fetch_all(&self.pool)
            .await?;
        let total_po: Decimal = po_rows
            .iter()
            .map(|r| parse_decimal(r.get("amount")))
            .sum();
        // Heuristic: 20% of PO value is treated as unpaid vendor liability.
        let vendor_outstanding = total_po * Decimal::new(2, 1);

        Ok(KpiSummary {
            total_revenue,
            outstanding_receivables,
            total_expenses,
            active_projects,
            vendor_outstanding,
        })
    }

    async fn budget_variance(&self, limit: usize) -> Result<Vec<BudgetVariance>> {
        let expense_rows = sqlx::query(
            "SELECT project_id, amount FROM finance_records
             WHERE kind = 'expense' AND project_id IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut spent: HashMap<String, Decimal> = HashMap::new();
        for r in &expense_rows {
            let project_id: String = r.get("project_id");
            let amount = parse_decimal(r.get("amount"));
            *spent.entry(project_id).or_insert(Decimal::ZERO) += amount;
        }

        let projects = self.list_projects(&ProjectFilter::default()).await?;
        let mut variance: Vec<BudgetVariance> = projects
            .into_iter()
            .map(|p| {
                let actual = spent.get(&p.id).copied().unwrap_or(Decimal::ZERO);
                let utilization = if p.budget > Decimal::ZERO {
                    let ratio = (actual / p.budget * Decimal::from(100))
                        .to_f64()
                        .unwrap_or(0.0);
                    (ratio * 10.0).round() / 10.0
                } else {
                    0.0
                };
                BudgetVariance {
                    id: p.id,
                    name: p.name,
                    budget: p.budget,
                    actual,
                    utilization,
                }
            })
            .collect();

        variance.sort_by(|a, b| {
            b.utilization
                .partial_cmp(&a.utilization)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        variance.truncate(limit);
        Ok(variance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabasePool;
    use chrono::TimeZone;
    use std::str::FromStr;

    async fn setup_repo() -> SqliteRepository {
        let pool = DatabasePool::new_sqlite_memory().await.unwrap();
        match pool {
            DatabasePool::Sqlite(p) => SqliteRepository::new(p),
        }
    }

    fn synced_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn sample_project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: "Bridge A".to_string(),
            status: ProjectStatus::InProgress,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            end_date: None,
            budget: Decimal::from_str("2500000.00").unwrap(),
            client_name: Some("Harbor Logistics".to_string()),
            anomaly: false,
            last_synced_at: synced_at(),
            metadata: None,
        }
    }

    fn sample_client(external_id: Option<&str>) -> Client {
        Client {
            id: 0,
            external_id: external_id.map(|s| s.to_string()),
            name: "Harbor Logistics".to_string(),
            contact_person: Some("Dana Reyes".to_string()),
            email: Some("dana@harbor.example.com".to_string()),
            phone: None,
            address: None,
            metadata: None,
        }
    }

    fn sample_finance(id: &str, kind: FinanceKind, status: FinanceStatus, amount: &str) -> FinanceRecord {
        FinanceRecord {
            id: id.to_string(),
            project_id: Some("P1001".to_string()),
            vendor_id: None,
            kind,
            amount: Decimal::from_str(amount).unwrap(),
            date: NaiveDate::from_ymd_opt(2026, 1, 10),
            status,
            description: None,
            anomaly: false,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn upsert_project_updates_in_place() {
        let repo = setup_repo().await;
        let mut project = sample_project("erpnext_project_PROJ-001");
        repo.upsert_project(&project).await.unwrap();

        project.status = ProjectStatus::Completed;
        repo.upsert_project(&project).await.unwrap();

        assert_eq!(repo.count_projects().await.unwrap(), 1);
        let stored = repo
            .get_project("erpnext_project_PROJ-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ProjectStatus::Completed);
        assert_eq!(stored.budget, Decimal::from_str("2500000.00").unwrap());
    }

    #[tokio::test]
    async fn insert_projects_ignores_duplicate_ids() {
        let repo = setup_repo().await;
        let projects = vec![sample_project("P1001"), sample_project("P1001")];
        let inserted = repo.insert_projects(&projects).await.unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(repo.count_projects().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_projects_filters_by_status_and_client() {
        let repo = setup_repo().await;
        let mut a = sample_project("P1001");
        a.client_name = Some("Harbor Logistics".to_string());
        let mut b = sample_project("P1002");
        b.status = ProjectStatus::Completed;
        b.client_name = Some("Summit Estates".to_string());
        repo.insert_projects(&[a, b]).await.unwrap();

        let filter = ProjectFilter {
            status: Some(ProjectStatus::Completed),
            client: None,
        };
        let completed = repo.list_projects(&filter).await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, "P1002");

        let filter = ProjectFilter {
            status: None,
            client: Some("harbor".to_string()),
        };
        let by_client = repo.list_projects(&filter).await.unwrap();
        assert_eq!(by_client.len(), 1);
        assert_eq!(by_client[0].id, "P1001");
    }

    #[tokio::test]
    async fn upsert_client_reconciles_by_external_id() {
        let repo = setup_repo().await;
        let mut client = sample_client(Some("erpnext_customer_CUST-001"));
        repo.upsert_client(&client).await.unwrap();

        client.name = "Harbor Logistics Intl".to_string();
        repo.upsert_client(&client).await.unwrap();

        assert_eq!(repo.count_clients().await.unwrap(), 1);
        let stored = repo
            .get_client_by_external_id("erpnext_customer_CUST-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Harbor Logistics Intl");
    }

    #[tokio::test]
    async fn insert_clients_without_external_id() {
        let repo = setup_repo().await;
        let inserted = repo
            .insert_clients(&[sample_client(None), sample_client(None)])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        let listed = repo.list_clients().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].id > 0);
    }

    #[tokio::test]
    async fn insert_vendors_returns_row_ids() {
        let repo = setup_repo().await;
        let vendor = Vendor {
            id: 0,
            external_id: None,
            name: "Ridge Steel Co".to_string(),
            category: Some("Material".to_string()),
            rating: Some(4.2),
            contact_person: None,
            email: None,
            phone: None,
            metadata: None,
        };
        let ids = repo
            .insert_vendors(&[vendor.clone(), vendor])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[1] > ids[0]);
        assert_eq!(repo.count_vendors().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn upsert_vendor_reconciles_by_external_id() {
        let repo = setup_repo().await;
        let mut vendor = Vendor {
            id: 0,
            external_id: Some("erpnext_supplier_SUP-010".to_string()),
            name: "Ridge Steel Co".to_string(),
            category: None,
            rating: None,
            contact_person: None,
            email: None,
            phone: None,
            metadata: None,
        };
        repo.upsert_vendor(&vendor).await.unwrap();
        vendor.name = "Ridge Steel Company".to_string();
        repo.upsert_vendor(&vendor).await.unwrap();

        assert_eq!(repo.count_vendors().await.unwrap(), 1);
        let stored = repo
            .get_vendor_by_external_id("erpnext_supplier_SUP-010")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Ridge Steel Company");
    }

    #[tokio::test]
    async fn upsert_employee_reconciles_by_external_id() {
        let repo = setup_repo().await;
        let mut employee = Employee {
            id: 0,
            external_id: Some("erpnext_employee_HR-EMP-00007".to_string()),
            name: "Priya Nair".to_string(),
            designation: Some("Site Engineer".to_string()),
            department: Some("Civil".to_string()),
            email: None,
            phone: None,
            joining_date: NaiveDate::from_ymd_opt(2023, 6, 12),
            salary: Some(Decimal::from_str("85000").unwrap()),
            status: EmployeeStatus::Active,
            metadata: None,
        };
        repo.upsert_employee(&employee).await.unwrap();
        employee.status = EmployeeStatus::OnLeave;
        repo.upsert_employee(&employee).await.unwrap();

        assert_eq!(repo.count_employees().await.unwrap(), 1);
        let listed = repo.list_employees(10).await.unwrap();
        assert_eq!(listed[0].status, EmployeeStatus::OnLeave);
        assert_eq!(listed[0].salary, Some(Decimal::from_str("85000").unwrap()));
    }

    #[tokio::test]
    async fn finance_record_round_trips_with_unresolved_project() {
        let repo = setup_repo().await;
        let mut record = sample_finance(
            "erpnext_invoice_SINV-0042",
            FinanceKind::Invoice,
            FinanceStatus::Pending,
            "18250.75",
        );
        record.project_id = None;
        record.anomaly = true;
        repo.upsert_finance_record(&record).await.unwrap();

        let stored = repo
            .get_finance_record("erpnext_invoice_SINV-0042")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, record);
        assert!(stored.project_id.is_none());
        assert!(stored.anomaly);
    }

    #[tokio::test]
    async fn list_finance_records_by_kind() {
        let repo = setup_repo().await;
        repo.insert_finance_records(&[
            sample_finance("F1", FinanceKind::Invoice, FinanceStatus::Paid, "100"),
            sample_finance("F2", FinanceKind::Payment, FinanceStatus::Paid, "200"),
            sample_finance("F3", FinanceKind::Invoice, FinanceStatus::Pending, "300"),
        ])
        .await
        .unwrap();

        let invoices = repo
            .list_finance_records(Some(FinanceKind::Invoice), 100)
            .await
            .unwrap();
        assert_eq!(invoices.len(), 2);

        let all = repo.list_finance_records(None, 100).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(repo.count_finance_records().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn purchase_order_upsert_and_get() {
        let repo = setup_repo().await;
        let mut po = PurchaseOrder {
            id: "erpnext_po_PUR-ORD-0007".to_string(),
            project_id: Some("P1001".to_string()),
            vendor_id: Some(3),
            total_amount: Decimal::from_str("93000.00").unwrap(),
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 5),
            delivery_date: None,
            status: PurchaseOrderStatus::Issued,
            anomaly: false,
            metadata: None,
        };
        repo.upsert_purchase_order(&po).await.unwrap();
        po.status = PurchaseOrderStatus::Received;
        repo.upsert_purchase_order(&po).await.unwrap();

        assert_eq!(repo.count_purchase_orders().await.unwrap(), 1);
        let stored = repo
            .get_purchase_order("erpnext_po_PUR-ORD-0007")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PurchaseOrderStatus::Received);
    }

    #[tokio::test]
    async fn inventory_item_upsert_and_list() {
        let repo = setup_repo().await;
        let item = InventoryItem {
            id: "erpnext_item_ITM-CEMENT".to_string(),
            project_id: None,
            name: "Cement".to_string(),
            quantity: 420.0,
            unit: "bags".to_string(),
            unit_price: Decimal::from_str("8.50").unwrap(),
            last_updated: synced_at(),
            anomaly: false,
            metadata: Some(serde_json::json!({"is_stock_item": 1})),
        };
        repo.upsert_inventory_item(&item).await.unwrap();
        repo.upsert_inventory_item(&item).await.unwrap();

        assert_eq!(repo.count_inventory_items().await.unwrap(), 1);
        let listed = repo.list_inventory_items(10).await.unwrap();
        assert_eq!(listed[0], item);
    }

    #[tokio::test]
    async fn sync_run_lifecycle() {
        let repo = setup_repo().await;
        let run = repo.create_sync_run("erpnext").await.unwrap();
        assert_eq!(run.status, SyncStatus::Running);

        let details = serde_json::json!([{"resource": "Project", "count": 50}]);
        repo.finish_sync_run(run.id, SyncStatus::Completed, None, 870, 2, Some(&details))
            .await
            .unwrap();

        let stored = repo.get_sync_run(run.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SyncStatus::Completed);
        assert_eq!(stored.records_synced, 870);
        assert_eq!(stored.anomalies, 2);
        assert!(stored.completed_at.is_some());
        assert_eq!(stored.details, Some(details));

        let latest = repo.latest_sync_run().await.unwrap().unwrap();
        assert_eq!(latest.id, run.id);
    }

    #[tokio::test]
    async fn failed_sync_run_keeps_error() {
        let repo = setup_repo().await;
        let run = repo.create_sync_run("erpnext").await.unwrap();
        repo.finish_sync_run(
            run.id,
            SyncStatus::Failed,
            Some("fetch error: Project returned status 503"),
            0,
            0,
            None,
        )
        .await
        .unwrap();

        let stored = repo.get_sync_run(run.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SyncStatus::Failed);
        assert!(stored.error_message.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn kpi_summary_computes_totals() {
        let repo = setup_repo().await;
        repo.insert_projects(&[sample_project("P1001")]).await.unwrap();
        repo.insert_finance_records(&[
            sample_finance("F1", FinanceKind::Invoice, FinanceStatus::Paid, "1000.50"),
            sample_finance("F2", FinanceKind::Invoice, FinanceStatus::Paid, "499.50"),
            sample_finance("F3", FinanceKind::Invoice, FinanceStatus::Pending, "750"),
            sample_finance("F4", FinanceKind::Expense, FinanceStatus::Paid, "300"),
        ])
        .await
        .unwrap();
        repo.insert_purchase_orders(&[PurchaseOrder {
            id: "PO-1".to_string(),
            project_id: Some("P1001".to_string()),
            vendor_id: None,
            total_amount: Decimal::from_str("1000").unwrap(),
            issue_date: None,
            delivery_date: None,
            status: PurchaseOrderStatus::Issued,
            anomaly: false,
            metadata: None,
        }])
        .await
        .unwrap();

        let kpis = repo.kpi_summary().await.unwrap();
        assert_eq!(kpis.total_revenue, Decimal::from_str("1500.00").unwrap());
        assert_eq!(
            kpis.outstanding_receivables,
            Decimal::from_str("750").unwrap()
        );
        assert_eq!(kpis.total_expenses, Decimal::from_str("300").unwrap());
        assert_eq!(kpis.active_projects, 1);
        assert_eq!(kpis.vendor_outstanding, Decimal::from_str("200.0").unwrap());
    }

    #[tokio::test]
    async fn budget_variance_ranks_riskiest_first() {
        let repo = setup_repo().await;
        let mut low = sample_project("P1001");
        low.budget = Decimal::from_str("10000").unwrap();
        let mut high = sample_project("P1002");
        high.budget = Decimal::from_str("10000").unwrap();
        repo.insert_projects(&[low, high]).await.unwrap();

        let mut e1 = sample_finance("E1", FinanceKind::Expense, FinanceStatus::Paid, "2500");
        e1.project_id = Some("P1001".to_string());
        let mut e2 = sample_finance("E2", FinanceKind::Expense, FinanceStatus::Paid, "7500");
        e2.project_id = Some("P1002".to_string());
        repo.insert_finance_records(&[e1, e2]).await.unwrap();

        let variance = repo.budget_variance(5).await.unwrap();
        assert_eq!(variance.len(), 2);
        assert_eq!(variance[0].id, "P1002");
        assert_eq!(variance[0].utilization, 75.0);
        assert_eq!(variance[1].utilization, 25.0);

        let top_one = repo.budget_variance(1).await.unwrap();
        assert_eq!(top_one.len(), 1);
    }

    #[tokio::test]
    async fn zero_budget_projects_report_zero_utilization() {
        let repo = setup_repo().await;
        let mut project = sample_project("P1001");
        project.budget = Decimal::ZERO;
        repo.insert_projects(&[project]).await.unwrap();

        let variance = repo.budget_variance(5).await.unwrap();
        assert_eq!(variance[0].utilization, 0.0);
    }
}
