use serde::{Deserialize, Serialize};

use crate::models::lead::LeadStatus;
use crate::models::table::Record;

/// One audit entry for a lead; the backend only ever appends these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadHistory {
    pub id: i64,
    #[serde(alias = "lead")]
    pub lead_id: i64,
    pub status: LeadStatus,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
}

impl Record for LeadHistory {
    fn record_id(&self) -> i64 {
        self.id
    }
}
