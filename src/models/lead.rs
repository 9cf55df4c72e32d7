use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::table::Record;

/// Disposition of a lead. Values the client does not know are kept verbatim
/// so a round trip through the dashboard never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    Leads,
    Interested,
    NotInterested,
    Visit,
    NotPicked,
    OtherLocation,
    Lost,
    Unrecognized(String),
}

impl LeadStatus {
    pub const SELECTABLE: [LeadStatus; 7] = [
        LeadStatus::Leads,
        LeadStatus::Interested,
        LeadStatus::NotInterested,
        LeadStatus::Visit,
        LeadStatus::NotPicked,
        LeadStatus::OtherLocation,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            LeadStatus::Leads => "Leads",
            LeadStatus::Interested => "Interested",
            LeadStatus::NotInterested => "Not Interested",
            LeadStatus::Visit => "Visit",
            LeadStatus::NotPicked => "Not Picked",
            LeadStatus::OtherLocation => "Other Location",
            LeadStatus::Lost => "Lost",
            LeadStatus::Unrecognized(value) => value.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, LeadStatus::Unrecognized(_))
    }
}

impl From<String> for LeadStatus {
    fn from(value: String) -> Self {
        match value.trim() {
            "Leads" => LeadStatus::Leads,
            "Interested" => LeadStatus::Interested,
            "Not Interested" => LeadStatus::NotInterested,
            "Visit" => LeadStatus::Visit,
            "Not Picked" => LeadStatus::NotPicked,
            "Other Location" => LeadStatus::OtherLocation,
            "Lost" => LeadStatus::Lost,
            _ => LeadStatus::Unrecognized(value),
        }
    }
}

impl From<&str> for LeadStatus {
    fn from(value: &str) -> Self {
        LeadStatus::from(value.to_string())
    }
}

impl From<LeadStatus> for String {
    fn from(status: LeadStatus) -> Self {
        match status {
            LeadStatus::Unrecognized(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub call: String,
    pub status: LeadStatus,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    #[serde(default)]
    pub team_leader: Option<i64>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub updated_date: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Record for Lead {
    fn record_id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LeadCreateInput {
    pub name: String,
    pub call: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadStatusUpdate {
    pub status: LeadStatus,
}

/// KPI card tallies over one fetched page of leads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStatusCounts {
    pub total: usize,
    pub leads: usize,
    pub interested: usize,
    pub not_interested: usize,
    pub visit: usize,
    pub not_picked: usize,
    pub other_location: usize,
    pub lost: usize,
    pub unrecognized: usize,
}

impl LeadStatusCounts {
    pub fn tally<'a>(leads: impl IntoIterator<Item = &'a Lead>) -> Self {
        let mut counts = Self::default();
        for lead in leads {
            counts.total += 1;
            let slot = match lead.status {
                LeadStatus::Leads => &mut counts.leads,
                LeadStatus::Interested => &mut counts.interested,
                LeadStatus::NotInterested => &mut counts.not_interested,
                LeadStatus::Visit => &mut counts.visit,
                LeadStatus::NotPicked => &mut counts.not_picked,
                LeadStatus::OtherLocation => &mut counts.other_location,
                LeadStatus::Lost => &mut counts.lost,
                LeadStatus::Unrecognized(_) => &mut counts.unrecognized,
            };
            *slot += 1;
        }
        counts
    }
}
