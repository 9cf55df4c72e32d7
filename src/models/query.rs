use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::lead::LeadStatus;

const ISO_DATE: &str = "%Y-%m-%d";

/// Filter parameters shared by the report and list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<LeadStatus>,
    pub staff_id: Option<i64>,
    pub page: Option<u32>,
}

impl ReportQuery {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_staff(mut self, staff_id: i64) -> Self {
        self.staff_id = Some(staff_id);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::validation(format!(
                    "Start date {} is after end date {}",
                    start.format(ISO_DATE),
                    end.format(ISO_DATE)
                )));
            }
        }

        if let Some(0) = self.page {
            return Err(AppError::validation("Page numbers start at 1"));
        }

        if let Some(staff_id) = self.staff_id {
            if staff_id <= 0 {
                return Err(AppError::validation("Staff id must be positive"));
            }
        }

        Ok(())
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.format(ISO_DATE).to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.format(ISO_DATE).to_string()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(staff_id) = self.staff_id {
            pairs.push(("staff_id", staff_id.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}
