use serde::{Deserialize, Serialize};

use crate::models::decimal;
use crate::models::table::Record;

/// Aggregated call outcomes for one staff member or team leader. Every
/// number here is computed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffProductivityRow {
    #[serde(alias = "staff_id", alias = "team_leader_id")]
    pub id: i64,
    #[serde(alias = "staff_name", alias = "team_leader_name", alias = "username")]
    pub name: String,
    #[serde(default)]
    pub total_calls: u64,
    #[serde(default)]
    pub interested: u64,
    #[serde(default)]
    pub not_interested: u64,
    #[serde(default)]
    pub lost: u64,
    #[serde(default)]
    pub visit: u64,
    #[serde(default)]
    pub other_location: u64,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub interested_percentage: Option<f64>,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub not_interested_percentage: Option<f64>,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub lost_percentage: Option<f64>,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub visit_percentage: Option<f64>,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub other_location_percentage: Option<f64>,
}

impl Record for StaffProductivityRow {
    fn record_id(&self) -> i64 {
        self.id
    }
}

/// Renders a server percentage for a table cell; absent values show `-`.
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => format!("{value:.2}%"),
        _ => "-".to_string(),
    }
}
