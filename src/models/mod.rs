pub mod decimal;
pub mod envelope;
pub mod incentive;
pub mod lead;
pub mod lead_history;
pub mod notice;
pub mod productivity;
pub mod project;
pub mod query;
pub mod role;
pub mod session;
pub mod table;
