use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::envelope::RecordBatch;
use crate::models::lead::{Lead, LeadCreateInput, LeadStatus};
use crate::models::notice::Notice;
use crate::models::query::ReportQuery;
use crate::services::csv_io::{lead_import_template, CsvUpload, TEMPLATE_FILE_NAME};
use crate::services::lead_service::ImportOutcome;
use crate::services::leads_board::LeadsBoardView;
use crate::services::report_panel::PanelView;
use crate::services::row_renderer::Layout;

use super::{apply_table_action, current_role, AppState, CommandError, CommandResult, TableAction};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvTemplate {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadImportPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub async fn leads_refresh(
    state: &AppState,
    query: ReportQuery,
    width_px: u32,
) -> CommandResult<LeadsBoardView> {
    let role = current_role(state).await?;
    let board = &state.panels().leads;
    board.refresh(role, query).await?;
    Ok(board.view(Layout::for_width(width_px)).await)
}

pub async fn leads_view(state: &AppState, width_px: u32) -> CommandResult<LeadsBoardView> {
    Ok(state.panels().leads.view(Layout::for_width(width_px)).await)
}

pub async fn leads_table_action(
    state: &AppState,
    action: TableAction,
    width_px: u32,
) -> CommandResult<LeadsBoardView> {
    let board = &state.panels().leads;
    apply_table_action(board.panel(), action).await?;
    Ok(board.view(Layout::for_width(width_px)).await)
}

pub async fn leads_change_status(
    state: &AppState,
    lead_id: i64,
    status: String,
) -> CommandResult<Lead> {
    let status = status.trim();
    if status.is_empty() {
        return Err(AppError::validation("Status is required").into());
    }
    state
        .panels()
        .leads
        .change_status(lead_id, LeadStatus::from(status))
        .await
        .map_err(CommandError::from)
}

pub async fn leads_create(state: &AppState, input: LeadCreateInput) -> CommandResult<Lead> {
    current_role(state).await?;
    let lead = state.leads().create_lead(input).await?;
    state
        .panels()
        .leads
        .panel()
        .lock()
        .await
        .upsert_row(lead.clone());
    state
        .notices()
        .lock()
        .await
        .push(Notice::success(format!("Lead {} added", lead.name)));
    Ok(lead)
}

pub async fn leads_history(
    state: &AppState,
    lead_id: i64,
    width_px: u32,
) -> CommandResult<PanelView> {
    let service = state.leads();
    let panel = &state.panels().lead_history;
    panel
        .load(async move {
            service
                .lead_history(lead_id)
                .await
                .map(RecordBatch::unpaged)
        })
        .await;
    Ok(panel.view(Layout::for_width(width_px)).await)
}

pub async fn leads_history_close(state: &AppState) -> CommandResult<()> {
    state.panels().lead_history.close().await;
    Ok(())
}

pub async fn leads_import(
    state: &AppState,
    payload: LeadImportPayload,
) -> CommandResult<ImportOutcome> {
    current_role(state).await?;
    let upload = CsvUpload::new(payload.file_name, payload.bytes)?;
    let notices = state.notices();
    match state.leads().import_leads(upload).await {
        Ok(outcome) => {
            notices.lock().await.push(Notice::success(outcome.message.clone()));
            Ok(outcome)
        }
        Err(error) => {
            notices.lock().await.push(Notice::error(error.to_string()));
            Err(error.into())
        }
    }
}

pub async fn leads_import_template() -> CommandResult<CsvTemplate> {
    let bytes = lead_import_template()?;
    let content = String::from_utf8(bytes)
        .map_err(|err| AppError::other(format!("template is not UTF-8: {err}")))?;
    Ok(CsvTemplate {
        file_name: TEMPLATE_FILE_NAME.to_string(),
        content,
    })
}

/// Reloads a single lead into the board, e.g. after its history was viewed.
pub async fn leads_reload_one(state: &AppState, lead_id: i64) -> CommandResult<Lead> {
    let lead = state.leads().get_lead(lead_id).await?;
    state
        .panels()
        .leads
        .panel()
        .lock()
        .await
        .replace_row(lead.clone());
    Ok(lead)
}

pub async fn leads_close(state: &AppState) -> CommandResult<()> {
    state.panels().leads.close().await;
    Ok(())
}
