use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::lead::{Lead, LeadStatus, LeadStatusCounts};
use crate::models::notice::Notice;
use crate::models::query::ReportQuery;
use crate::models::role::Role;
use crate::services::columns::lead_columns;
use crate::services::lead_service::LeadGateway;
use crate::services::mutation::{begin_optimistic, settle_optimistic, NoticeQueue};
use crate::services::report_panel::{LoadOutcome, PanelView, ReportPanel, SharedPanel};
use crate::services::row_renderer::Layout;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadsBoardView {
    pub panel: PanelView,
    pub counts: LeadStatusCounts,
    pub status_options: Vec<String>,
}

/// The leads page: role-scoped list, inline status edits, KPI counts.
pub struct LeadsBoard {
    gateway: Arc<dyn LeadGateway>,
    panel: SharedPanel<Lead>,
    notices: Arc<Mutex<NoticeQueue>>,
}

impl LeadsBoard {
    pub fn new(gateway: Arc<dyn LeadGateway>, page_size: usize) -> Self {
        Self {
            gateway,
            panel: SharedPanel::new(ReportPanel::new("Leads", lead_columns(), page_size)),
            notices: Arc::new(Mutex::new(NoticeQueue::default())),
        }
    }

    pub fn panel(&self) -> &SharedPanel<Lead> {
        &self.panel
    }

    pub async fn refresh(&self, role: Role, query: ReportQuery) -> AppResult<LoadOutcome> {
        query.validate()?;
        let gateway = Arc::clone(&self.gateway);
        let outcome = self
            .panel
            .load(async move { gateway.list_leads(role, &query).await })
            .await;
        Ok(outcome)
    }

    /// Optimistic status change. The row shows the new status at once and
    /// returns to its prior value if the PATCH fails. No lock is held while
    /// the PATCH is in flight; a reload that lands meanwhile wins.
    pub async fn change_status(&self, lead_id: i64, status: LeadStatus) -> AppResult<Lead> {
        let message = format!("Status updated to {status}");

        let (change, revision) = {
            let mut panel = self.panel.lock().await;
            let change = begin_optimistic(panel.table_mut().rows_mut(), lead_id, |lead| {
                lead.status = status
            })?;
            panel.rows_edited();
            (change, panel.rows_revision())
        };

        let result = self
            .gateway
            .update_status(lead_id, &change.pending().status)
            .await;

        let settled = {
            let mut panel = self.panel.lock().await;
            let settled = if panel.rows_revision() == revision {
                settle_optimistic(panel.table_mut().rows_mut(), change, result, &message)
            } else {
                debug!(target: "app::mutation", lead_id, "leads reloaded during the write, rows left as loaded");
                settle_optimistic(&mut [], change, result, &message)
            };
            panel.rows_edited();
            settled
        };
        self.notices.lock().await.push(settled.notice);

        if let Ok(lead) = &settled.outcome {
            info!(target: "app::mutation", lead_id, status = %lead.status, "lead status changed");
        }
        settled.outcome
    }

    pub async fn status_counts(&self) -> LeadStatusCounts {
        LeadStatusCounts::tally(self.panel.lock().await.table().rows())
    }

    pub async fn drain_notices(&self) -> Vec<Notice> {
        self.notices.lock().await.drain()
    }

    pub async fn view(&self, layout: Layout) -> LeadsBoardView {
        let panel = self.panel.lock().await;
        LeadsBoardView {
            panel: panel.view(layout),
            counts: LeadStatusCounts::tally(panel.table().rows()),
            status_options: LeadStatus::SELECTABLE
                .iter()
                .map(|status| status.as_str().to_string())
                .collect(),
        }
    }

    pub async fn close(&self) {
        self.panel.close().await;
    }
}
