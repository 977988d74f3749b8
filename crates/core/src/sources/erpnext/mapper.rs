//! Pure mapping from raw ERPNext records into the internal entity shapes.
//!
//! Every mapped record gets a namespaced external-stable id
//! (`erpnext_<kind>_<remoteid>`), a status inside the entity's closed enum,
//! decimal-coerced monetary fields, and a metadata attachment carrying the
//! untranslated remote fields.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::models::{
    client::Client,
    common::{EmployeeStatus, FinanceKind, FinanceStatus, ProjectStatus, PurchaseOrderStatus},
    employee::Employee,
    finance::FinanceRecord,
    inventory::InventoryItem,
    project::Project,
    purchase_order::PurchaseOrder,
    vendor::Vendor,
};

use super::models::{
    RawCustomer, RawEmployee, RawItem, RawPaymentEntry, RawProject, RawPurchaseOrder,
    RawSalesInvoice, RawSupplier,
};

const SOURCE: &str = "erpnext";

/// Build the namespaced external-stable id for a remote record.
///
/// Ids never collide across resource kinds or sources because both are part
/// of the id.
pub fn external_id(kind: &str, remote_id: &str) -> String {
    format!("{SOURCE}_{kind}_{remote_id}")
}

/// Coerce a raw monetary value into a decimal.
///
/// Returns the value plus an anomaly flag: a missing or empty field is a
/// plain zero, while input that exists but cannot be parsed is zeroed *and*
/// flagged so it stays distinguishable from a genuine zero-value amount.
pub fn coerce_amount(value: Option<&Value>) -> (Decimal, bool) {
    match value {
        None | Some(Value::Null) => (Decimal::ZERO, false),
        Some(Value::Number(n)) => parse_decimal_text(&n.to_string()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                (Decimal::ZERO, false)
            } else {
                parse_decimal_text(trimmed)
            }
        }
        Some(_) => (Decimal::ZERO, true),
    }
}

fn parse_decimal_text(text: &str) -> (Decimal, bool) {
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .map(|d| (d, false))
        .unwrap_or((Decimal::ZERO, true))
}

/// Non-monetary quantity coercion; unparsable input just becomes zero.
fn coerce_quantity(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

// -- Status translation tables --
//
// Each table is closed over the entity's enum; unrecognized remote values
// land on the documented fallback, never on the raw string.

fn map_project_status(status: Option<&str>) -> ProjectStatus {
    match status {
        Some("Open") => ProjectStatus::InProgress,
        Some("Completed") => ProjectStatus::Completed,
        Some("Cancelled") => ProjectStatus::OnHold,
        Some("Template") => ProjectStatus::Planning,
        _ => ProjectStatus::InProgress,
    }
}

fn map_invoice_status(status: Option<&str>) -> FinanceStatus {
    match status {
        Some("Paid") => FinanceStatus::Paid,
        Some("Overdue") => FinanceStatus::Overdue,
        _ => FinanceStatus::Pending,
    }
}

fn map_po_status(status: Option<&str>) -> PurchaseOrderStatus {
    match status {
        Some("Completed") | Some("Closed") | Some("Delivered") | Some("To Bill") => {
            PurchaseOrderStatus::Received
        }
        Some("Cancelled") | Some("Stopped") => PurchaseOrderStatus::Cancelled,
        // Draft, Submitted, On Hold, To Receive, To Receive and Bill, and
        // anything unrecognized: the order stands but goods are outstanding.
        _ => PurchaseOrderStatus::Issued,
    }
}

fn map_employee_status(status: Option<&str>) -> EmployeeStatus {
    match status {
        Some("Left") => EmployeeStatus::Left,
        Some("Inactive") | Some("Suspended") => EmployeeStatus::OnLeave,
        _ => EmployeeStatus::Active,
    }
}

fn insert_opt(metadata: &mut serde_json::Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        metadata.insert(key.to_string(), Value::String(v.to_string()));
    }
}

pub fn map_customer(raw: RawCustomer) -> Client {
    let mut metadata = raw.extra;
    metadata.insert("erpnext_id".to_string(), Value::String(raw.name.clone()));

    Client {
        id: 0,
        external_id: Some(external_id("customer", &raw.name)),
        name: raw.customer_name.unwrap_or_else(|| raw.name.clone()),
        contact_person: raw.customer_primary_contact,
        email: raw.email_id,
        phone: raw.mobile_no,
        address: raw.primary_address,
        metadata: Some(Value::Object(metadata)),
    }
}

pub fn map_supplier(raw: RawSupplier) -> Vendor {
    let mut metadata = raw.extra;
    metadata.insert("erpnext_id".to_string(), Value::String(raw.name.clone()));

    Vendor {
        id: 0,
        external_id: Some(external_id("supplier", &raw.name)),
        name: raw.supplier_name.unwrap_or_else(|| raw.name.clone()),
        category: raw.supplier_group,
        rating: None,
        contact_person: None,
        email: raw.email_id,
        phone: raw.mobile_no,
        metadata: Some(Value::Object(metadata)),
    }
}

pub fn map_project(raw: RawProject, now: DateTime<Utc>) -> Project {
    let (budget, anomaly) = coerce_amount(raw.estimated_costing.as_ref());
    // Actual dates win over planned ones when the instance tracks both.
    let start = raw
        .actual_start_date
        .as_deref()
        .or(raw.expected_start_date.as_deref());
    let end = raw
        .actual_end_date
        .as_deref()
        .or(raw.expected_end_date.as_deref());

    let mut metadata = raw.extra;
    metadata.insert("erpnext_id".to_string(), Value::String(raw.name.clone()));
    insert_opt(&mut metadata, "status", raw.status.as_deref());

    Project {
        id: external_id("project", &raw.name),
        name: raw.project_name.unwrap_or_else(|| raw.name.clone()),
        status: map_project_status(raw.status.as_deref()),
        start_date: parse_date(start),
        end_date: parse_date(end),
        budget,
        client_name: raw.customer,
        anomaly,
        last_synced_at: now,
        metadata: Some(Value::Object(metadata)),
    }
}

pub fn map_employee(raw: RawEmployee) -> Employee {
    let mut metadata = raw.extra;
    metadata.insert("erpnext_id".to_string(), Value::String(raw.name.clone()));
    insert_opt(&mut metadata, "status", raw.status.as_deref());

    Employee {
        id: 0,
        external_id: Some(external_id("employee", &raw.name)),
        name: raw.employee_name.unwrap_or_else(|| raw.name.clone()),
        designation: raw.designation,
        department: raw.department,
        email: raw.personal_email,
        phone: raw.cell_number,
        joining_date: parse_date(raw.date_of_joining.as_deref()),
        salary: None,
        status: map_employee_status(raw.status.as_deref()),
        metadata: Some(Value::Object(metadata)),
    }
}

pub fn map_item(raw: RawItem, now: DateTime<Utc>) -> InventoryItem {
    let price_raw = raw
        .valuation_rate
        .as_ref()
        .filter(|v| !v.is_null())
        .or(raw.standard_rate.as_ref());
    let (unit_price, anomaly) = coerce_amount(price_raw);

    let mut metadata = raw.extra;
    metadata.insert("erpnext_id".to_string(), Value::String(raw.name.clone()));

    InventoryItem {
        id: external_id("item", &raw.name),
        project_id: None,
        name: raw.item_name.unwrap_or_else(|| raw.name.clone()),
        quantity: coerce_quantity(raw.opening_stock.as_ref()),
        unit: raw.stock_uom.unwrap_or_else(|| "Nos".to_string()),
        unit_price,
        last_updated: now,
        anomaly,
        metadata: Some(Value::Object(metadata)),
    }
}

pub fn map_invoice(raw: RawSalesInvoice) -> FinanceRecord {
    let (amount, anomaly) = coerce_amount(raw.grand_total.as_ref());

    let mut metadata = raw.extra;
    metadata.insert("erpnext_id".to_string(), Value::String(raw.name.clone()));
    insert_opt(&mut metadata, "customer", raw.customer.as_deref());
    insert_opt(&mut metadata, "status", raw.status.as_deref());
    insert_opt(&mut metadata, "project", raw.project.as_deref());

    FinanceRecord {
        id: external_id("invoice", &raw.name),
        project_id: raw.project.as_deref().map(|p| external_id("project", p)),
        vendor_id: None,
        kind: FinanceKind::Invoice,
        amount,
        date: parse_date(raw.posting_date.as_deref()),
        status: map_invoice_status(raw.status.as_deref()),
        description: Some(format!("Sales Invoice {}", raw.name)),
        anomaly,
        metadata: Some(Value::Object(metadata)),
    }
}

pub fn map_payment(raw: RawPaymentEntry) -> FinanceRecord {
    let is_inflow = raw.payment_type.as_deref() == Some("Receive");
    let amount_raw = if is_inflow {
        raw.received_amount.as_ref()
    } else {
        raw.paid_amount.as_ref()
    };
    let (amount, anomaly) = coerce_amount(amount_raw);

    let mut metadata = raw.extra;
    metadata.insert("erpnext_id".to_string(), Value::String(raw.name.clone()));
    insert_opt(&mut metadata, "payment_type", raw.payment_type.as_deref());
    insert_opt(&mut metadata, "project", raw.project.as_deref());

    FinanceRecord {
        id: external_id("payment", &raw.name),
        project_id: raw.project.as_deref().map(|p| external_id("project", p)),
        vendor_id: None,
        kind: if is_inflow {
            FinanceKind::Payment
        } else {
            FinanceKind::Expense
        },
        amount,
        date: parse_date(raw.posting_date.as_deref()),
        status: FinanceStatus::Paid,
        description: Some(format!("Payment Entry {}", raw.name)),
        anomaly,
        metadata: Some(Value::Object(metadata)),
    }
}

pub fn map_purchase_order(raw: RawPurchaseOrder) -> PurchaseOrder {
    let (total_amount, anomaly) = coerce_amount(raw.grand_total.as_ref());

    let mut metadata = raw.extra;
    metadata.insert("erpnext_id".to_string(), Value::String(raw.name.clone()));
    insert_opt(&mut metadata, "supplier", raw.supplier.as_deref());
    insert_opt(&mut metadata, "status", raw.status.as_deref());
    insert_opt(&mut metadata, "project", raw.project.as_deref());

    PurchaseOrder {
        id: external_id("po", &raw.name),
        project_id: raw.project.as_deref().map(|p| external_id("project", p)),
        vendor_id: None,
        total_amount,
        issue_date: parse_date(raw.transaction_date.as_deref()),
        delivery_date: parse_date(raw.schedule_date.as_deref()),
        status: map_po_status(raw.status.as_deref()),
        anomaly,
        metadata: Some(Value::Object(metadata)),
    }
}
