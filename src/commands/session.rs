use serde::Deserialize;

use crate::models::role::Role;
use crate::models::session::{Session, SessionIdentity};

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub token: String,
    pub role: String,
    pub username: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl SessionPayload {
    fn into_session(self) -> CommandResult<Session> {
        let role: Role = self.role.parse()?;
        Ok(Session {
            token: self.token,
            role,
            username: self.username,
            user_id: self.user_id,
        })
    }
}

pub async fn session_save(state: &AppState, payload: SessionPayload) -> CommandResult<SessionIdentity> {
    let session = payload.into_session()?;
    let service = state.session();
    run_blocking(move || service.save(session)).await
}

pub async fn session_current(state: &AppState) -> CommandResult<Option<SessionIdentity>> {
    let service = state.session();
    run_blocking(move || service.current()).await
}

/// Signs out locally and forgets every page's rows.
pub async fn session_clear(state: &AppState) -> CommandResult<()> {
    let service = state.session();
    run_blocking(move || service.clear()).await?;

    let panels = state.panels();
    panels.leads.panel().lock().await.reset();
    panels.lead_history.lock().await.reset();
    panels.staff_report.lock().await.reset();
    panels.team_leader_report.lock().await.reset();
    panels.slabs.lock().await.reset();
    panels.projects.lock().await.reset();
    Ok(())
}

pub async fn settings_set_api_base_url(state: &AppState, base_url: String) -> CommandResult<String> {
    let service = state.session();
    run_blocking(move || service.store_api_base_url(&base_url)).await
}
