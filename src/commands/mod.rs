pub mod incentives;
pub mod leads;
pub mod notices;
pub mod projects;
pub mod reports;
pub mod session;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::db::DbPool;
use crate::error::{ApiErrorCode, AppError, AppResult};
use crate::models::incentive::IncentiveSlab;
use crate::models::lead_history::LeadHistory;
use crate::models::productivity::StaffProductivityRow;
use crate::models::project::Project;
use crate::models::role::Role;
use crate::models::table::Record;
use crate::services::api_client::{ApiClient, ApiConfig};
use crate::services::columns::{
    lead_history_columns, productivity_columns, project_columns, slab_columns,
};
use crate::services::incentive_service::IncentiveService;
use crate::services::lead_service::LeadService;
use crate::services::leads_board::LeadsBoard;
use crate::services::mutation::NoticeQueue;
use crate::services::project_service::ProjectService;
use crate::services::report_panel::{ReportPanel, SharedPanel};
use crate::services::report_service::ReportService;
use crate::services::session_service::SessionService;

/// Per-page table state kept between commands.
pub struct Panels {
    pub leads: LeadsBoard,
    pub lead_history: SharedPanel<LeadHistory>,
    pub staff_report: SharedPanel<StaffProductivityRow>,
    pub team_leader_report: SharedPanel<StaffProductivityRow>,
    pub slabs: SharedPanel<IncentiveSlab>,
    pub projects: SharedPanel<Project>,
}

impl Panels {
    fn new(lead_service: Arc<LeadService>, page_size: usize) -> Self {
        Self {
            leads: LeadsBoard::new(lead_service, page_size),
            lead_history: SharedPanel::new(ReportPanel::new(
                "Lead History",
                lead_history_columns(),
                page_size,
            )),
            staff_report: SharedPanel::new(ReportPanel::new(
                "Staff Productivity",
                productivity_columns(),
                page_size,
            )),
            team_leader_report: SharedPanel::new(ReportPanel::new(
                "Team Leader Productivity",
                productivity_columns(),
                page_size,
            )),
            slabs: SharedPanel::new(ReportPanel::new(
                "Incentive Slabs",
                slab_columns(),
                page_size,
            )),
            projects: SharedPanel::new(ReportPanel::new("Projects", project_columns(), page_size)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    config: ApiConfig,
    api: ApiClient,
    lead_service: Arc<LeadService>,
    report_service: Arc<ReportService>,
    incentive_service: Arc<IncentiveService>,
    project_service: Arc<ProjectService>,
    session_service: Arc<SessionService>,
    panels: Arc<Panels>,
    notices: Arc<Mutex<NoticeQueue>>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> AppResult<Self> {
        let config = ApiConfig::load(&db_pool)?;
        Self::with_config(db_pool, config)
    }

    pub fn with_config(db_pool: DbPool, config: ApiConfig) -> AppResult<Self> {
        let api = ApiClient::new(&config)?;
        let lead_service = Arc::new(LeadService::new(api.clone()));
        let report_service = Arc::new(ReportService::new(api.clone()));
        let incentive_service = Arc::new(IncentiveService::new(api.clone()));
        let project_service = Arc::new(ProjectService::new(api.clone()));
        let session_service = Arc::new(SessionService::new(db_pool.clone(), api.clone()));

        let restored = session_service.restore()?;
        info!(
            target: "app::command",
            base_url = %config.base_url,
            signed_in = restored.is_some(),
            "application state ready"
        );

        let panels = Arc::new(Panels::new(Arc::clone(&lead_service), config.page_size));

        Ok(Self {
            db_pool,
            config,
            api,
            lead_service,
            report_service,
            incentive_service,
            project_service,
            session_service,
            panels,
            notices: Arc::new(Mutex::new(NoticeQueue::default())),
        })
    }

    pub fn db(&self) -> DbPool {
        self.db_pool.clone()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn leads(&self) -> Arc<LeadService> {
        Arc::clone(&self.lead_service)
    }

    pub fn reports(&self) -> Arc<ReportService> {
        Arc::clone(&self.report_service)
    }

    pub fn incentives(&self) -> Arc<IncentiveService> {
        Arc::clone(&self.incentive_service)
    }

    pub fn projects(&self) -> Arc<ProjectService> {
        Arc::clone(&self.project_service)
    }

    pub fn session(&self) -> Arc<SessionService> {
        Arc::clone(&self.session_service)
    }

    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    pub fn notices(&self) -> Arc<Mutex<NoticeQueue>> {
        Arc::clone(&self.notices)
    }
}

/// Table interactions shared by every page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TableAction {
    #[serde(rename_all = "camelCase")]
    SetFilter { column: String, needle: String },
    ClearFilter,
    #[serde(rename_all = "camelCase")]
    ToggleSort { column: String },
    #[serde(rename_all = "camelCase")]
    ToggleRow { row_id: i64 },
    NextPage,
    PreviousPage,
    #[serde(rename_all = "camelCase")]
    GoToPage { page_index: usize },
    #[serde(rename_all = "camelCase")]
    SetPageSize { page_size: usize },
}

pub(crate) async fn apply_table_action<T: Record + Send>(
    panel: &SharedPanel<T>,
    action: TableAction,
) -> AppResult<()> {
    let mut panel = panel.lock().await;
    match action {
        TableAction::SetFilter { column, needle } => panel.set_filter(&column, &needle)?,
        TableAction::ClearFilter => panel.clear_filter(),
        TableAction::ToggleSort { column } => panel.toggle_sort(&column)?,
        TableAction::ToggleRow { row_id } => {
            if panel.table().row(row_id).is_none() {
                return Err(AppError::not_found());
            }
            panel.toggle_row(row_id);
        }
        TableAction::NextPage => {
            panel.next_page();
        }
        TableAction::PreviousPage => {
            panel.previous_page();
        }
        TableAction::GoToPage { page_index } => panel.go_to_page(page_index),
        TableAction::SetPageSize { page_size } => panel.set_page_size(page_size),
    }
    Ok(())
}

/// Role of the signed-in user; commands that need one fail without a session.
pub(crate) async fn current_role(state: &AppState) -> CommandResult<Role> {
    let session = state.session();
    let identity = run_blocking(move || session.current()).await?;
    identity
        .map(|identity| identity.role)
        .ok_or_else(|| CommandError::from(AppError::unauthorized("Please sign in first")))
}

pub(crate) async fn require_admin(state: &AppState) -> CommandResult<Role> {
    let role = current_role(state).await?;
    if !role.is_admin() {
        return Err(CommandError::from(AppError::api(
            ApiErrorCode::Forbidden,
            "Only admins can change this",
        )));
    }
    Ok(role)
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation { message, details } => {
                CommandError::new("VALIDATION_ERROR", message, details)
            }
            AppError::NotFound => CommandError::new("NOT_FOUND", "Requested record was not found", None),
            AppError::Api {
                code,
                message,
                status,
                correlation_id,
            } => {
                let mut details = JsonMap::new();
                if let Some(status) = status {
                    details.insert("status".to_string(), JsonValue::from(status));
                }
                if let Some(id) = correlation_id {
                    details.insert("correlationId".to_string(), JsonValue::String(id));
                }
                let details = if details.is_empty() {
                    None
                } else {
                    Some(JsonValue::Object(details))
                };
                warn!(target: "app::command", code = %code, %message, "request failed in command");
                CommandError::new(code.as_str(), message, details)
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("STORAGE_ERROR", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "Failed to encode or decode data", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "Failed to read or write local files", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

pub(crate) async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("background task failed: {err}"), None))?
        .map_err(CommandError::from)
}
