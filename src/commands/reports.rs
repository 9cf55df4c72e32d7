use serde::{Deserialize, Serialize};

use crate::models::productivity::StaffProductivityRow;
use crate::models::query::ReportQuery;
use crate::services::report_panel::{PanelView, SharedPanel};
use crate::services::report_service::{ProductivityScope, ProductivityTotals};
use crate::services::row_renderer::Layout;

use super::{apply_table_action, current_role, AppState, CommandResult, TableAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    Staff,
    TeamLeader,
}

impl From<ReportKind> for ProductivityScope {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Staff => ProductivityScope::Staff,
            ReportKind::TeamLeader => ProductivityScope::TeamLeader,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPageView {
    pub panel: PanelView,
    pub totals: ProductivityTotals,
}

fn panel_for(state: &AppState, kind: ReportKind) -> &SharedPanel<StaffProductivityRow> {
    match kind {
        ReportKind::Staff => &state.panels().staff_report,
        ReportKind::TeamLeader => &state.panels().team_leader_report,
    }
}

async fn page_view(
    panel: &SharedPanel<StaffProductivityRow>,
    width_px: u32,
) -> ReportPageView {
    let panel = panel.lock().await;
    ReportPageView {
        panel: panel.view(Layout::for_width(width_px)),
        totals: ProductivityTotals::sum(panel.table().rows()),
    }
}

pub async fn reports_load(
    state: &AppState,
    kind: ReportKind,
    query: ReportQuery,
    width_px: u32,
) -> CommandResult<ReportPageView> {
    current_role(state).await?;
    query.validate()?;

    let service = state.reports();
    let panel = panel_for(state, kind);
    panel
        .load(async move { service.productivity(kind.into(), &query).await })
        .await;
    Ok(page_view(panel, width_px).await)
}

pub async fn reports_table_action(
    state: &AppState,
    kind: ReportKind,
    action: TableAction,
    width_px: u32,
) -> CommandResult<ReportPageView> {
    let panel = panel_for(state, kind);
    apply_table_action(panel, action).await?;
    Ok(page_view(panel, width_px).await)
}

pub async fn reports_close(state: &AppState, kind: ReportKind) -> CommandResult<()> {
    panel_for(state, kind).close().await;
    Ok(())
}
