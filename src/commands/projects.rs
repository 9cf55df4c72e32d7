use serde::Deserialize;

use crate::models::notice::Notice;
use crate::models::project::{MediaUpload, Project, ProjectInput};
use crate::models::query::ReportQuery;
use crate::services::report_panel::PanelView;
use crate::services::row_renderer::Layout;

use super::{apply_table_action, current_role, require_admin, AppState, CommandResult, TableAction};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPayload {
    pub name: String,
    pub message: Option<String>,
    pub youtube_link: Option<String>,
    pub media_file_name: Option<String>,
    pub media_content_type: Option<String>,
    pub media_bytes: Option<Vec<u8>>,
}

impl ProjectPayload {
    fn into_input(self) -> ProjectInput {
        let media = match (self.media_file_name, self.media_bytes) {
            (Some(file_name), Some(bytes)) => Some(MediaUpload {
                file_name,
                content_type: self.media_content_type,
                bytes,
            }),
            _ => None,
        };

        ProjectInput {
            name: self.name,
            message: self.message,
            youtube_link: self.youtube_link,
            media,
        }
    }
}

pub async fn projects_load(
    state: &AppState,
    query: ReportQuery,
    width_px: u32,
) -> CommandResult<PanelView> {
    current_role(state).await?;
    query.validate()?;
    let service = state.projects();
    let panel = &state.panels().projects;
    panel
        .load(async move { service.list_projects(&query).await })
        .await;
    Ok(panel.view(Layout::for_width(width_px)).await)
}

pub async fn projects_table_action(
    state: &AppState,
    action: TableAction,
    width_px: u32,
) -> CommandResult<PanelView> {
    let panel = &state.panels().projects;
    apply_table_action(panel, action).await?;
    Ok(panel.view(Layout::for_width(width_px)).await)
}

pub async fn projects_create(state: &AppState, payload: ProjectPayload) -> CommandResult<Project> {
    require_admin(state).await?;
    let project = state.projects().create_project(payload.into_input()).await?;
    state.panels().projects.lock().await.upsert_row(project.clone());
    state
        .notices()
        .lock()
        .await
        .push(Notice::success(format!("Project {} created", project.name)));
    Ok(project)
}

pub async fn projects_update(
    state: &AppState,
    project_id: i64,
    payload: ProjectPayload,
) -> CommandResult<Project> {
    require_admin(state).await?;
    let project = state
        .projects()
        .update_project(project_id, payload.into_input())
        .await?;
    state
        .panels()
        .projects
        .lock()
        .await
        .upsert_row(project.clone());
    state
        .notices()
        .lock()
        .await
        .push(Notice::success(format!("Project {} updated", project.name)));
    Ok(project)
}

pub async fn projects_delete(state: &AppState, project_id: i64) -> CommandResult<()> {
    require_admin(state).await?;
    state.projects().delete_project(project_id).await?;
    state.panels().projects.lock().await.remove_row(project_id);
    state
        .notices()
        .lock()
        .await
        .push(Notice::success("Project deleted"));
    Ok(())
}
