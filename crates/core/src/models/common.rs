use serde::{Deserialize, Serialize};

/// Project lifecycle status.
///
/// The wire strings match what the dashboard displays, so `In Progress` and
/// `On Hold` keep their spaces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectStatus {
    Planning,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
}

/// Kind of a finance record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FinanceKind {
    Invoice,
    Payment,
    Expense,
}

/// Settlement status of a finance record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FinanceStatus {
    Paid,
    Pending,
    Overdue,
}

/// Purchase order lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PurchaseOrderStatus {
    Issued,
    Received,
    Cancelled,
}

/// Employment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmployeeStatus {
    Active,
    #[serde(rename = "On Leave")]
    OnLeave,
    Left,
}
