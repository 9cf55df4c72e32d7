use serde::Serialize;
use tracing::debug;

use crate::error::AppResult;
use crate::models::envelope::RecordBatch;
use crate::models::productivity::StaffProductivityRow;
use crate::models::query::ReportQuery;
use crate::services::api_client::ApiClient;
use crate::services::endpoints::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductivityScope {
    Staff,
    TeamLeader,
}

impl ProductivityScope {
    fn endpoint(self) -> Endpoint {
        match self {
            ProductivityScope::Staff => Endpoint::StaffProductivity,
            ProductivityScope::TeamLeader => Endpoint::TeamLeaderProductivity,
        }
    }
}

/// Column sums shown in the KPI strip above a productivity table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityTotals {
    pub people: usize,
    pub total_calls: u64,
    pub interested: u64,
    pub not_interested: u64,
    pub lost: u64,
    pub visit: u64,
    pub other_location: u64,
}

impl ProductivityTotals {
    pub fn sum<'a>(rows: impl IntoIterator<Item = &'a StaffProductivityRow>) -> Self {
        rows.into_iter().fold(Self::default(), |mut acc, row| {
            acc.people += 1;
            acc.total_calls += row.total_calls;
            acc.interested += row.interested;
            acc.not_interested += row.not_interested;
            acc.lost += row.lost;
            acc.visit += row.visit;
            acc.other_location += row.other_location;
            acc
        })
    }
}

#[derive(Clone)]
pub struct ReportService {
    api: ApiClient,
}

impl ReportService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn productivity(
        &self,
        scope: ProductivityScope,
        query: &ReportQuery,
    ) -> AppResult<RecordBatch<StaffProductivityRow>> {
        let batch = self.api.fetch_records(scope.endpoint(), query).await?;
        debug!(target: "app::api", ?scope, rows = batch.len(), "productivity report loaded");
        Ok(batch)
    }
}
