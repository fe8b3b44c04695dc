use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Production and loss totals across a set of records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LossSummary {
    pub total_tons: f64,
    pub loss_tons: f64,
    pub loss_cost: f64,
}

/// Identifying columns of a stored harvest, used to choose what to delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowIdentifier {
    pub id: Uuid,
    pub date: NaiveDate,
    pub plot_name: String,
}
