use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::EmployeeStatus;

/// An employee on the company payroll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joining_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<Decimal>,
    pub status: EmployeeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn employee_round_trip() {
        let employee = Employee {
            id: 42,
            external_id: Some("erpnext_employee_HR-EMP-00007".to_string()),
            name: "Priya Nair".to_string(),
            designation: Some("Site Engineer".to_string()),
            department: Some("Civil".to_string()),
            email: None,
            phone: Some("+1-555-0142".to_string()),
            joining_date: NaiveDate::from_ymd_opt(2023, 6, 12),
            salary: Some(Decimal::from_str("85000").unwrap()),
            status: EmployeeStatus::Active,
            metadata: None,
        };
        let json = serde_json::to_string(&employee).unwrap();
        let back: Employee = serde_json::from_str(&json).unwrap();
        assert_eq!(back, employee);
        assert!(json.contains("\"joiningDate\""));
    }
}
