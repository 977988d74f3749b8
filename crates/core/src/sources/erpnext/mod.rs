pub mod client;
pub mod mapper;
pub mod models;

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::ErpNextConfig;
use crate::db::repository::GirderRepository;
use crate::error::Result;
use crate::models::sync::{ResourceSync, SyncReport};

use self::client::ErpNextClient;
use self::models::{
    RawCustomer, RawEmployee, RawItem, RawPaymentEntry, RawProject, RawPurchaseOrder,
    RawSalesInvoice, RawSupplier,
};

const CUSTOMER_FIELDS: &[&str] = &[
    "name",
    "customer_name",
    "customer_type",
    "customer_group",
    "territory",
    "email_id",
    "mobile_no",
    "website",
    "customer_primary_contact",
    "primary_address",
];
const SUPPLIER_FIELDS: &[&str] = &[
    "name",
    "supplier_name",
    "supplier_type",
    "supplier_group",
    "country",
    "email_id",
    "mobile_no",
    "website",
    "tax_id",
];
const PROJECT_FIELDS: &[&str] = &[
    "name",
    "project_name",
    "status",
    "project_type",
    "expected_start_date",
    "expected_end_date",
    "estimated_costing",
    "actual_start_date",
    "actual_end_date",
    "percent_complete",
    "customer",
    "company",
    "priority",
];
const EMPLOYEE_FIELDS: &[&str] = &[
    "name",
    "employee_name",
    "status",
    "department",
    "designation",
    "date_of_joining",
    "date_of_birth",
    "gender",
    "company",
    "cell_number",
    "personal_email",
    "current_address",
];
const ITEM_FIELDS: &[&str] = &[
    "name",
    "item_name",
    "item_code",
    "item_group",
    "stock_uom",
    "valuation_rate",
    "standard_rate",
    "opening_stock",
    "is_stock_item",
    "description",
];
const INVOICE_FIELDS: &[&str] = &[
    "name",
    "customer",
    "posting_date",
    "due_date",
    "grand_total",
    "outstanding_amount",
    "status",
    "project",
    "company",
    "currency",
];
const PAYMENT_FIELDS: &[&str] = &[
    "name",
    "posting_date",
    "payment_type",
    "party_type",
    "party",
    "paid_amount",
    "received_amount",
    "mode_of_payment",
    "project",
    "reference_no",
    "reference_date",
];
const PURCHASE_ORDER_FIELDS: &[&str] = &[
    "name",
    "supplier",
    "transaction_date",
    "schedule_date",
    "grand_total",
    "status",
    "company",
    "currency",
    "project",
];

/// Connector that pulls ERPNext resource collections and reconciles them into
/// the entity store, one idempotent upsert per mapped record.
pub struct ErpNextConnector<R: GirderRepository> {
    client: ErpNextClient,
    repo: Arc<R>,
}

impl<R: GirderRepository> ErpNextConnector<R> {
    pub fn new(config: &ErpNextConfig, repo: Arc<R>) -> Self {
        Self {
            client: ErpNextClient::new(config),
            repo,
        }
    }

    /// Verify the remote instance is reachable.
    pub async fn test_connection(&self) -> Result<()> {
        self.client.ping().await
    }

    /// Run every resource sync in dependency order.
    ///
    /// The order matters: invoices, payments, and purchase orders resolve
    /// links against the projects and suppliers the earlier steps upserted.
    /// Steps run sequentially and fail fast: on error, everything already
    /// synced stays committed and the remaining steps are skipped.
    pub async fn sync_all(&self) -> Result<SyncReport> {
        info!("Starting full ERPNext sync");

        let mut results = Vec::with_capacity(8);
        results.push(self.sync_customers().await?);
        results.push(self.sync_suppliers().await?);
        results.push(self.sync_projects().await?);
        results.push(self.sync_employees().await?);
        results.push(self.sync_items().await?);
        results.push(self.sync_invoices().await?);
        results.push(self.sync_payments().await?);
        results.push(self.sync_purchase_orders().await?);

        info!("Full ERPNext sync completed");
        Ok(SyncReport { results })
    }

    pub async fn sync_customers(&self) -> Result<ResourceSync> {
        info!("Syncing customers from ERPNext");
        let raws: Vec<RawCustomer> = self
            .client
            .list_all("Customer", CUSTOMER_FIELDS, None)
            .await?;

        let mut count = 0;
        for raw in raws {
            let client = mapper::map_customer(raw);
            self.repo.upsert_client(&client).await?;
            count += 1;
        }

        info!(count, "Synced customers");
        Ok(ResourceSync {
            resource: "Customer".to_string(),
            count,
            anomalies: 0,
        })
    }

    pub async fn sync_suppliers(&self) -> Result<ResourceSync> {
        info!("Syncing suppliers from ERPNext");
        let raws: Vec<RawSupplier> = self
            .client
            .list_all("Supplier", SUPPLIER_FIELDS, None)
            .await?;

        let mut count = 0;
        for raw in raws {
            let vendor = mapper::map_supplier(raw);
            self.repo.upsert_vendor(&vendor).await?;
            count += 1;
        }

        info!(count, "Synced suppliers");
        Ok(ResourceSync {
            resource: "Supplier".to_string(),
            count,
            anomalies: 0,
        })
    }

    pub async fn sync_projects(&self) -> Result<ResourceSync> {
        info!("Syncing projects from ERPNext");
        let raws: Vec<RawProject> = self
            .client
            .list_all("Project", PROJECT_FIELDS, None)
            .await?;

        let now = Utc::now();
        let mut count = 0;
        let mut anomalies = 0;
        for raw in raws {
            let project = mapper::map_project(raw, now);
            if project.anomaly {
                anomalies += 1;
            }
            self.repo.upsert_project(&project).await?;
            count += 1;
        }

        info!(count, anomalies, "Synced projects");
        Ok(ResourceSync {
            resource: "Project".to_string(),
            count,
            anomalies,
        })
    }

    pub async fn sync_employees(&self) -> Result<ResourceSync> {
        info!("Syncing employees from ERPNext");
        let raws: Vec<RawEmployee> = self
            .client
            .list_all("Employee", EMPLOYEE_FIELDS, None)
            .await?;

        let mut count = 0;
        for raw in raws {
            let employee = mapper::map_employee(raw);
            self.repo.upsert_employee(&employee).await?;
            count += 1;
        }

        info!(count, "Synced employees");
        Ok(ResourceSync {
            resource: "Employee".to_string(),
            count,
            anomalies: 0,
        })
    }

    pub async fn sync_items(&self) -> Result<ResourceSync> {
        info!("Syncing items from ERPNext");
        let raws: Vec<RawItem> = self.client.list_all("Item", ITEM_FIELDS, None).await?;

        let now = Utc::now();
        let mut count = 0;
        let mut anomalies = 0;
        for raw in raws {
            let item = mapper::map_item(raw, now);
            if item.anomaly {
                anomalies += 1;
            }
            self.repo.upsert_inventory_item(&item).await?;
            count += 1;
        }

        info!(count, anomalies, "Synced items");
        Ok(ResourceSync {
            resource: "Item".to_string(),
            count,
            anomalies,
        })
    }

    pub async fn sync_invoices(&self) -> Result<ResourceSync> {
        info!("Syncing sales invoices from ERPNext");
        let raws: Vec<RawSalesInvoice> = self
            .client
            .list_all("Sales Invoice", INVOICE_FIELDS, None)
            .await?;

        let mut count = 0;
        let mut anomalies = 0;
        for raw in raws {
            let mut record = mapper::map_invoice(raw);
            if record.anomaly {
                anomalies += 1;
            }
            record.project_id = self.resolve_project(record.project_id).await?;
            self.repo.upsert_finance_record(&record).await?;
            count += 1;
        }

        info!(count, anomalies, "Synced sales invoices");
        Ok(ResourceSync {
            resource: "Sales Invoice".to_string(),
            count,
            anomalies,
        })
    }

    pub async fn sync_payments(&self) -> Result<ResourceSync> {
        info!("Syncing payment entries from ERPNext");
        let raws: Vec<RawPaymentEntry> = self
            .client
            .list_all("Payment Entry", PAYMENT_FIELDS, None)
            .await?;

        let mut count = 0;
        let mut anomalies = 0;
        for raw in raws {
            let mut record = mapper::map_payment(raw);
            if record.anomaly {
                anomalies += 1;
            }
            record.project_id = self.resolve_project(record.project_id).await?;
            self.repo.upsert_finance_record(&record).await?;
            count += 1;
        }

        info!(count, anomalies, "Synced payment entries");
        Ok(ResourceSync {
            resource: "Payment Entry".to_string(),
            count,
            anomalies,
        })
    }

    pub async fn sync_purchase_orders(&self) -> Result<ResourceSync> {
        info!("Syncing purchase orders from ERPNext");
        let raws: Vec<RawPurchaseOrder> = self
            .client
            .list_all("Purchase Order", PURCHASE_ORDER_FIELDS, None)
            .await?;

        let mut count = 0;
        let mut anomalies = 0;
        for raw in raws {
            let supplier_ext = raw
                .supplier
                .as_deref()
                .map(|s| mapper::external_id("supplier", s));
            let mut po = mapper::map_purchase_order(raw);
            if po.anomaly {
                anomalies += 1;
            }
            po.project_id = self.resolve_project(po.project_id).await?;
            if let Some(ext) = supplier_ext {
                po.vendor_id = self
                    .repo
                    .get_vendor_by_external_id(&ext)
                    .await?
                    .map(|v| v.id);
            }
            self.repo.upsert_purchase_order(&po).await?;
            count += 1;
        }

        info!(count, anomalies, "Synced purchase orders");
        Ok(ResourceSync {
            resource: "Purchase Order".to_string(),
            count,
            anomalies,
        })
    }

    /// Resolve a candidate project link against the store.
    ///
    /// Linkage is best-effort: a reference to a project the store has not
    /// seen is dropped (the raw value stays in the record's metadata) rather
    /// than failing the batch. The lookup goes through the store, not
    /// in-memory state, so it survives partial failures and retries.
    async fn resolve_project(&self, candidate: Option<String>) -> Result<Option<String>> {
        match candidate {
            Some(id) => {
                if self.repo.get_project(&id).await?.is_some() {
                    Ok(Some(id))
                } else {
                    warn!(project = %id, "Referenced project not found in store, storing unresolved");
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }
}
