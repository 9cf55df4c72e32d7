use crate::models::envelope::EnvelopeShape;
use crate::models::role::Role;

/// Every backend route the dashboard talks to, with the envelope its list
/// responses use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Leads(Role),
    Lead(i64),
    LeadHistory(i64),
    LeadImport,
    StaffProductivity,
    TeamLeaderProductivity,
    IncentiveSlabs,
    IncentiveSlab(i64),
    StaffEarnings(i64),
    Projects,
    Project(i64),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Leads(Role::SuperAdmin | Role::Admin) => "/api/leads/".to_string(),
            Endpoint::Leads(Role::TeamLeader) => "/api/team-leader/leads/".to_string(),
            Endpoint::Leads(Role::Staff) => "/api/staff/leads/".to_string(),
            Endpoint::Lead(id) => format!("/api/leads/{id}/"),
            Endpoint::LeadHistory(id) => format!("/api/leads/{id}/history/"),
            Endpoint::LeadImport => "/api/leads/import/".to_string(),
            Endpoint::StaffProductivity => "/api/reports/staff-productivity/".to_string(),
            Endpoint::TeamLeaderProductivity => {
                "/api/reports/team-leader-productivity/".to_string()
            }
            Endpoint::IncentiveSlabs => "/api/incentive-slabs/".to_string(),
            Endpoint::IncentiveSlab(id) => format!("/api/incentive-slabs/{id}/"),
            Endpoint::StaffEarnings(id) => format!("/api/staff/{id}/earnings/"),
            Endpoint::Projects => "/api/projects/".to_string(),
            Endpoint::Project(id) => format!("/api/projects/{id}/"),
        }
    }

    /// `None` for endpoints that answer with a single object.
    pub fn list_shape(&self) -> Option<EnvelopeShape> {
        match self {
            Endpoint::Leads(_) | Endpoint::Projects => Some(EnvelopeShape::Paginated),
            Endpoint::LeadHistory(_) | Endpoint::IncentiveSlabs => Some(EnvelopeShape::BareArray),
            Endpoint::StaffProductivity => Some(EnvelopeShape::Named("staff_data")),
            Endpoint::TeamLeaderProductivity => Some(EnvelopeShape::Named("team_leader_data")),
            Endpoint::Lead(_)
            | Endpoint::LeadImport
            | Endpoint::IncentiveSlab(_)
            | Endpoint::StaffEarnings(_)
            | Endpoint::Project(_) => None,
        }
    }
}
