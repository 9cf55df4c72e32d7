use crate::models::notice::Notice;

use super::{AppState, CommandResult};

/// Pending toasts from every page, oldest first.
pub async fn notices_drain(state: &AppState) -> CommandResult<Vec<Notice>> {
    let mut notices = state.panels().leads.drain_notices().await;
    notices.extend(state.notices().lock().await.drain());
    notices.sort_by_key(|notice| notice.created_at);
    Ok(notices)
}
