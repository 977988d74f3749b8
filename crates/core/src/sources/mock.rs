//! Mock data source: generates a complete, referentially-consistent batch of
//! entity records with randomized but schema-valid values.
//!
//! The batch is wired the same way real data would be: finance records,
//! purchase orders, and inventory items only ever reference generated project
//! ids, purchase orders only reference generated vendor rows, and projects
//! reference generated client names.

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::info;

use crate::db::repository::GirderRepository;
use crate::error::Result;
use crate::models::{
    client::Client,
    common::{EmployeeStatus, FinanceKind, FinanceStatus, ProjectStatus, PurchaseOrderStatus},
    employee::Employee,
    finance::FinanceRecord,
    inventory::InventoryItem,
    project::Project,
    purchase_order::PurchaseOrder,
    sync::SeedSummary,
    vendor::Vendor,
};

const COMPANY_STEMS: &[&str] = &[
    "Harbor", "Ridge", "Summit", "Cascade", "Granite", "Meridian", "Pioneer", "Beacon", "Atlas",
    "Keystone", "Northgate", "Ironwood",
];
const COMPANY_SUFFIXES: &[&str] = &[
    "Constructions", "Builders", "Holdings", "Materials", "Logistics", "Group", "Estates",
];
const FIRST_NAMES: &[&str] = &[
    "Dana", "Priya", "Marcus", "Elena", "Tomas", "Aisha", "Victor", "Ingrid", "Rafael", "Mei",
    "Omar", "Lucia",
];
const LAST_NAMES: &[&str] = &[
    "Reyes", "Nair", "Okafor", "Svensson", "Delgado", "Kowalski", "Tanaka", "Mbeki", "Larsen",
    "Costa",
];
const PROJECT_KINDS: &[&str] = &[
    "Bridge", "Tower", "Highway", "Plaza", "Terminal", "Reservoir", "Campus", "Depot",
];
const PROJECT_STATUSES: &[ProjectStatus] = &[
    ProjectStatus::Planning,
    ProjectStatus::InProgress,
    ProjectStatus::OnHold,
    ProjectStatus::Completed,
];
const VENDOR_CATEGORIES: &[&str] = &["Material", "Service", "Labor", "Equipment"];
const DEPARTMENTS: &[&str] = &["Civil", "Mechanical", "Electrical", "Accounts", "HR", "IT"];
const DESIGNATIONS: &[&str] = &[
    "Site Engineer",
    "Project Manager",
    "Surveyor",
    "Accountant",
    "Foreman",
    "Procurement Officer",
    "Safety Officer",
];
const FINANCE_KINDS: &[FinanceKind] = &[
    FinanceKind::Invoice,
    FinanceKind::Payment,
    FinanceKind::Expense,
];
const INVOICE_STATUSES: &[FinanceStatus] = &[
    FinanceStatus::Paid,
    FinanceStatus::Pending,
    FinanceStatus::Overdue,
];
const PO_STATUSES: &[PurchaseOrderStatus] = &[
    PurchaseOrderStatus::Issued,
    PurchaseOrderStatus::Received,
    PurchaseOrderStatus::Cancelled,
];
// Weighted toward Active, matching a real payroll.
const EMPLOYEE_STATUSES: &[EmployeeStatus] = &[
    EmployeeStatus::Active,
    EmployeeStatus::Active,
    EmployeeStatus::Active,
    EmployeeStatus::OnLeave,
];
const ITEM_NAMES: &[&str] = &[
    "Cement", "Steel Rods", "Bricks", "Sand", "Tiles", "Paint", "Pipes", "Cables",
];
const ITEM_UNITS: &[&str] = &["bags", "tons", "pcs", "kg", "sqft", "liters", "m", "m"];
const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Batch sizes for one generated dataset.
#[derive(Debug, Clone, Copy)]
pub struct BatchSizes {
    pub clients: usize,
    pub projects: usize,
    pub vendors: usize,
    pub employees: usize,
    pub finance_records: usize,
    pub purchase_orders: usize,
    pub inventory_items: usize,
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            clients: 20,
            projects: 50,
            vendors: 30,
            employees: 100,
            finance_records: 300,
            purchase_orders: 200,
            inventory_items: 500,
        }
    }
}

/// Generates randomized, internally-consistent mock entity batches.
pub struct MockGenerator {
    rng: StdRng,
    sizes: BatchSizes,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            sizes: BatchSizes::default(),
        }
    }

    /// Deterministic generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sizes: BatchSizes::default(),
        }
    }

    pub fn with_sizes(mut self, sizes: BatchSizes) -> Self {
        self.sizes = sizes;
        self
    }

    fn pick<'a, T>(&mut self, options: &'a [T]) -> &'a T {
        &options[self.rng.gen_range(0..options.len())]
    }

    fn alphanumeric(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| ID_CHARSET[self.rng.gen_range(0..ID_CHARSET.len())] as char)
            .collect()
    }

    fn company_name(&mut self) -> String {
        format!("{} {}", self.pick(COMPANY_STEMS), self.pick(COMPANY_SUFFIXES))
    }

    fn person_name(&mut self) -> String {
        format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES))
    }

    fn email_for(&mut self, name: &str) -> String {
        let slug: String = name
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        format!("{slug}{}@example.com", self.rng.gen_range(1..99))
    }

    fn phone(&mut self) -> String {
        format!("+1-555-{:04}", self.rng.gen_range(0..10000))
    }

    fn date_between(&mut self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        let span = (end - start).num_days().max(1);
        start + Duration::days(self.rng.gen_range(0..span))
    }

    /// Amount with two decimal places in `[min, max]` whole units.
    fn amount(&mut self, min: i64, max: i64) -> Decimal {
        Decimal::new(self.rng.gen_range(min * 100..=max * 100), 2)
    }

    pub fn clients(&mut self) -> Vec<Client> {
        (0..self.sizes.clients)
            .map(|_| {
                let name = self.company_name();
                let contact = self.person_name();
                let email = self.email_for(&name);
                Client {
                    id: 0,
                    external_id: None,
                    name,
                    contact_person: Some(contact),
                    email: Some(email),
                    phone: Some(self.phone()),
                    address: Some(format!(
                        "{} {} Street",
                        self.rng.gen_range(1..200),
                        self.pick(COMPANY_STEMS)
                    )),
                    metadata: None,
                }
            })
            .collect()
    }

    pub fn projects(&mut self, clients: &[Client]) -> Vec<Project> {
        let now = Utc::now();
        let today = now.date_naive();
        (0..self.sizes.projects)
            .map(|_| {
                let start = self.date_between(today - Duration::days(730), today);
                let end = self.date_between(today, today + Duration::days(730));
                let client_name = self.pick(clients).name.clone();
                Project {
                    id: format!("P{}", self.rng.gen_range(1000..10000)),
                    name: format!(
                        "{} {} Construction",
                        self.pick(COMPANY_STEMS),
                        self.pick(PROJECT_KINDS)
                    ),
                    status: *self.pick(PROJECT_STATUSES),
                    start_date: Some(start),
                    end_date: Some(end),
                    budget: self.amount(1_000_000, 50_000_000),
                    client_name: Some(client_name),
                    anomaly: false,
                    last_synced_at: now,
                    metadata: None,
                }
            })
            .collect()
    }

    pub fn vendors(&mut self) -> Vec<Vendor> {
        (0..self.sizes.vendors)
            .map(|_| {
                let name = self.company_name();
                let contact = self.person_name();
                let email = self.email_for(&name);
                Vendor {
                    id: 0,
                    external_id: None,
                    name,
                    category: Some(self.pick(VENDOR_CATEGORIES).to_string()),
                    rating: Some((self.rng.gen_range(10..=50) as f64) / 10.0),
                    contact_person: Some(contact),
                    email: Some(email),
                    phone: Some(self.phone()),
                    metadata: None,
                }
            })
            .collect()
    }

    pub fn employees(&mut self) -> Vec<Employee> {
        let today = Utc::now().date_naive();
        (0..self.sizes.employees)
            .map(|_| {
                let name = self.person_name();
                let email = self.email_for(&name);
                Employee {
                    id: 0,
                    external_id: None,
                    name,
                    designation: Some(self.pick(DESIGNATIONS).to_string()),
                    department: Some(self.pick(DEPARTMENTS).to_string()),
                    email: Some(email),
                    phone: Some(self.phone()),
                    joining_date: Some(self.date_between(today - Duration::days(1825), today)),
                    salary: Some(self.amount(30_000, 200_000)),
                    status: *self.pick(EMPLOYEE_STATUSES),
                    metadata: None,
                }
            })
            .collect()
    }

    pub fn finance_records(&mut self, projects: &[Project]) -> Vec<FinanceRecord> {
        let today = Utc::now().date_naive();
        (0..self.sizes.finance_records)
            .map(|_| {
                let project = self.pick(projects);
                let project_id = project.id.clone();
                let from = project.start_date.unwrap_or(today - Duration::days(365));
                let kind = *self.pick(FINANCE_KINDS);
                let status = if kind == FinanceKind::Invoice {
                    *self.pick(INVOICE_STATUSES)
                } else {
                    FinanceStatus::Paid
                };
                FinanceRecord {
                    id: format!("INV-{}", self.alphanumeric(8)),
                    project_id: Some(project_id),
                    vendor_id: None,
                    kind,
                    amount: self.amount(5_000, 500_000),
                    date: Some(self.date_between(from, today)),
                    status,
                    description: Some(format!(
                        "{} works, {} phase",
                        self.pick(PROJECT_KINDS),
                        self.pick(DEPARTMENTS)
                    )),
                    anomaly: false,
                    metadata: None,
                }
            })
            .collect()
    }

    pub fn purchase_orders(
        &mut self,
        projects: &[Project],
        vendor_ids: &[i64],
    ) -> Vec<PurchaseOrder> {
        let today = Utc::now().date_naive();
        (0..self.sizes.purchase_orders)
            .map(|_| {
                let project_id = self.pick(projects).id.clone();
                let vendor_id = *self.pick(vendor_ids);
                let issue = self.date_between(today - Duration::days(100), today);
                let delivery = self.date_between(today, today + Duration::days(180));
                PurchaseOrder {
                    id: format!("PO-{}", self.alphanumeric(6)),
                    project_id: Some(project_id),
                    vendor_id: Some(vendor_id),
                    total_amount: self.amount(10_000, 1_000_000),
                    issue_date: Some(issue),
                    delivery_date: Some(delivery),
                    status: *self.pick(PO_STATUSES),
                    anomaly: false,
                    metadata: None,
                }
            })
            .collect()
    }

    pub fn inventory_items(&mut self, projects: &[Project]) -> Vec<InventoryItem> {
        let now = Utc::now();
        (0..self.sizes.inventory_items)
            .map(|_| {
                let project_id = self.pick(projects).id.clone();
                let idx = self.rng.gen_range(0..ITEM_NAMES.len());
                InventoryItem {
                    id: format!("ITM-{}", self.alphanumeric(8)),
                    project_id: Some(project_id),
                    name: ITEM_NAMES[idx].to_string(),
                    quantity: self.rng.gen_range(10..=1000) as f64,
                    unit: ITEM_UNITS[idx].to_string(),
                    unit_price: self.amount(50, 5000),
                    last_updated: now,
                    anomaly: false,
                    metadata: None,
                }
            })
            .collect()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate one mock batch and persist it, returning per-entity counts.
///
/// Generation and persistence interleave because purchase orders need the row
/// ids the vendor insert assigns. String-keyed inserts are insert-or-ignore,
/// so generated id collisions (and repeated seed runs) shrink counts instead
/// of failing.
pub async fn run_seed<R: GirderRepository>(repo: &R, generator: &mut MockGenerator) -> Result<SeedSummary> {
    info!("Generating mock dataset");

    let clients = generator.clients();
    let clients_inserted = repo.insert_clients(&clients).await?;

    let projects = generator.projects(&clients);
    let projects_inserted = repo.insert_projects(&projects).await?;

    let vendors = generator.vendors();
    let vendor_ids = repo.insert_vendors(&vendors).await?;

    let employees = generator.employees();
    let employees_inserted = repo.insert_employees(&employees).await?;

    let finance = generator.finance_records(&projects);
    let finance_inserted = repo.insert_finance_records(&finance).await?;

    let pos = generator.purchase_orders(&projects, &vendor_ids);
    let pos_inserted = repo.insert_purchase_orders(&pos).await?;

    let items = generator.inventory_items(&projects);
    let items_inserted = repo.insert_inventory_items(&items).await?;

    let summary = SeedSummary {
        clients: clients_inserted,
        projects: projects_inserted,
        vendors: vendor_ids.len() as u64,
        employees: employees_inserted,
        finance_records: finance_inserted,
        purchase_orders: pos_inserted,
        inventory_items: items_inserted,
    };
    info!(records = summary.total(), "Mock dataset persisted");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{ClientRepository, ProjectRepository};
    use crate::db::sqlite::SqliteRepository;
    use crate::db::DatabasePool;
    use std::collections::HashSet;

    async fn setup_repo() -> SqliteRepository {
        let pool = DatabasePool::new_sqlite_memory().await.unwrap();
        match pool {
            DatabasePool::Sqlite(p) => SqliteRepository::new(p),
        }
    }

    #[test]
    fn seeded_generator_is_deterministic() {
        let mut a = MockGenerator::with_seed(42);
        let mut b = MockGenerator::with_seed(42);
        assert_eq!(a.clients(), b.clients());
    }

    #[test]
    fn generated_batch_is_referentially_consistent() {
        let mut generator = MockGenerator::with_seed(7);
        let clients = generator.clients();
        let projects = generator.projects(&clients);
        let vendor_ids: Vec<i64> = (1..=30).collect();

        let client_names: HashSet<&str> = clients.iter().map(|c| c.name.as_str()).collect();
        let project_ids: HashSet<&str> = projects.iter().map(|p| p.id.as_str()).collect();

        for project in &projects {
            assert!(client_names.contains(project.client_name.as_deref().unwrap()));
        }
        for record in generator.finance_records(&projects) {
            assert!(project_ids.contains(record.project_id.as_deref().unwrap()));
        }
        for po in generator.purchase_orders(&projects, &vendor_ids) {
            assert!(project_ids.contains(po.project_id.as_deref().unwrap()));
            assert!(vendor_ids.contains(&po.vendor_id.unwrap()));
        }
        for item in generator.inventory_items(&projects) {
            assert!(project_ids.contains(item.project_id.as_deref().unwrap()));
        }
    }

    #[test]
    fn generated_values_stay_in_range() {
        let mut generator = MockGenerator::with_seed(11);
        let clients = generator.clients();
        for project in generator.projects(&clients) {
            assert!(project.budget >= Decimal::from(1_000_000));
            assert!(project.budget <= Decimal::from(50_000_000));
            assert!(project.start_date.unwrap() <= project.end_date.unwrap());
        }
        for vendor in generator.vendors() {
            let rating = vendor.rating.unwrap();
            assert!((1.0..=5.0).contains(&rating));
        }
        for item in generator.inventory_items(&[Project {
            id: "P1".to_string(),
            name: "X".to_string(),
            status: ProjectStatus::Planning,
            start_date: None,
            end_date: None,
            budget: Decimal::ZERO,
            client_name: None,
            anomaly: false,
            last_synced_at: Utc::now(),
            metadata: None,
        }]) {
            assert!(item.quantity >= 10.0 && item.quantity <= 1000.0);
        }
    }

    #[test]
    fn invoice_statuses_vary_non_invoices_are_paid() {
        let mut generator = MockGenerator::with_seed(3);
        let clients = generator.clients();
        let projects = generator.projects(&clients);
        for record in generator.finance_records(&projects) {
            if record.kind != FinanceKind::Invoice {
                assert_eq!(record.status, FinanceStatus::Paid);
            }
        }
    }

    #[tokio::test]
    async fn run_seed_persists_full_batch() {
        let repo = setup_repo().await;
        let mut generator = MockGenerator::with_seed(5);
        let summary = run_seed(&repo, &mut generator).await.unwrap();

        assert_eq!(summary.clients, 20);
        assert_eq!(summary.vendors, 30);
        assert_eq!(summary.employees, 100);
        // String ids are random, so collisions may drop a few rows.
        assert!(summary.projects >= 45);
        assert!(summary.finance_records >= 295);
        assert!(summary.purchase_orders >= 195);
        assert!(summary.inventory_items >= 490);

        assert_eq!(repo.count_clients().await.unwrap(), 20);
        assert_eq!(
            repo.count_projects().await.unwrap() as u64,
            summary.projects
        );
    }

    #[tokio::test]
    async fn reseeding_never_errors() {
        let repo = setup_repo().await;
        let sizes = BatchSizes {
            clients: 3,
            projects: 5,
            vendors: 2,
            employees: 4,
            finance_records: 10,
            purchase_orders: 6,
            inventory_items: 8,
        };
        let mut generator = MockGenerator::with_seed(5).with_sizes(sizes);
        run_seed(&repo, &mut generator).await.unwrap();
        let second = run_seed(&repo, &mut generator).await.unwrap();
        // Second batch inserts fresh rows; duplicate ids are ignored.
        assert!(second.total() > 0);
    }
}
