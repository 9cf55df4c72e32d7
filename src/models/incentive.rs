use serde::{Deserialize, Serialize};

use crate::models::decimal;
use crate::models::table::Record;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncentiveSlab {
    pub id: i64,
    pub slab_name: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub min_amount: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub max_amount: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub incentive_percentage: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl IncentiveSlab {
    /// Half-open range check: `min_amount <= amount < max_amount`.
    pub fn covers(&self, amount: f64) -> bool {
        self.min_amount <= amount && amount < self.max_amount
    }
}

impl Record for IncentiveSlab {
    fn record_id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncentiveSlabInput {
    pub slab_name: String,
    pub min_amount: f64,
    pub max_amount: f64,
    pub incentive_percentage: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffEarnings {
    #[serde(default)]
    pub staff_id: Option<i64>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub total_earn: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveSummary {
    pub total_earn: f64,
    pub slab: Option<IncentiveSlab>,
    pub incentive_amount: f64,
}
