//! Raw record shapes returned by the ERPNext resource API.
//!
//! Known fields are typed loosely (amounts arrive as numbers or strings
//! depending on the instance, so they stay `serde_json::Value` until the
//! mapper coerces them); everything else is captured by the flattened `extra`
//! map and carried into the stored record's metadata untouched.

use serde::Deserialize;
use serde_json::Value;

/// Envelope every resource endpoint wraps its page in: `{"data": [...]}`.
#[derive(Debug, Deserialize)]
pub struct ResourceEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCustomer {
    pub name: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub email_id: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub customer_primary_contact: Option<String>,
    #[serde(default)]
    pub primary_address: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSupplier {
    pub name: String,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub supplier_group: Option<String>,
    #[serde(default)]
    pub email_id: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProject {
    pub name: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expected_start_date: Option<String>,
    #[serde(default)]
    pub expected_end_date: Option<String>,
    #[serde(default)]
    pub actual_start_date: Option<String>,
    #[serde(default)]
    pub actual_end_date: Option<String>,
    #[serde(default)]
    pub estimated_costing: Option<Value>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEmployee {
    pub name: String,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub date_of_joining: Option<String>,
    #[serde(default)]
    pub cell_number: Option<String>,
    #[serde(default)]
    pub personal_email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub name: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub stock_uom: Option<String>,
    #[serde(default)]
    pub valuation_rate: Option<Value>,
    #[serde(default)]
    pub standard_rate: Option<Value>,
    #[serde(default)]
    pub opening_stock: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSalesInvoice {
    pub name: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub posting_date: Option<String>,
    #[serde(default)]
    pub grand_total: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPaymentEntry {
    pub name: String,
    #[serde(default)]
    pub posting_date: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub paid_amount: Option<Value>,
    #[serde(default)]
    pub received_amount: Option<Value>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPurchaseOrder {
    pub name: String,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub schedule_date: Option<String>,
    #[serde(default)]
    pub grand_total: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_defaults_to_empty() {
        let env: ResourceEnvelope<RawProject> = serde_json::from_str("{}").unwrap();
        assert!(env.data.is_empty());
    }

    #[test]
    fn raw_project_captures_extra_fields() {
        let json = r#"{
            "name": "PROJ-001",
            "project_name": "Bridge A",
            "status": "Open",
            "estimated_costing": "2500000.00",
            "priority": "High",
            "company": "Meridian Constructions"
        }"#;
        let raw: RawProject = serde_json::from_str(json).unwrap();
        assert_eq!(raw.name, "PROJ-001");
        assert_eq!(raw.project_name.as_deref(), Some("Bridge A"));
        assert_eq!(raw.extra["priority"], "High");
        assert_eq!(raw.extra["company"], "Meridian Constructions");
    }

    #[test]
    fn raw_amounts_accept_numbers_and_strings() {
        let as_number: RawItem =
            serde_json::from_str(r#"{"name": "ITM-1", "valuation_rate": 8.5}"#).unwrap();
        assert!(as_number.valuation_rate.unwrap().is_number());

        let as_string: RawItem =
            serde_json::from_str(r#"{"name": "ITM-1", "valuation_rate": "8.50"}"#).unwrap();
        assert!(as_string.valuation_rate.unwrap().is_string());
    }
}
