use crate::models::incentive::{IncentiveSlab, IncentiveSlabInput, IncentiveSummary};
use crate::models::envelope::RecordBatch;
use crate::models::notice::Notice;
use crate::services::incentive_service::compute_summary;
use crate::services::report_panel::PanelView;
use crate::services::row_renderer::Layout;

use super::{apply_table_action, current_role, require_admin, AppState, CommandResult, TableAction};

pub async fn slabs_load(state: &AppState, width_px: u32) -> CommandResult<PanelView> {
    current_role(state).await?;
    let service = state.incentives();
    let panel = &state.panels().slabs;
    panel
        .load(async move { service.list_slabs().await.map(RecordBatch::unpaged) })
        .await;
    Ok(panel.view(Layout::for_width(width_px)).await)
}

pub async fn slabs_table_action(
    state: &AppState,
    action: TableAction,
    width_px: u32,
) -> CommandResult<PanelView> {
    let panel = &state.panels().slabs;
    apply_table_action(panel, action).await?;
    Ok(panel.view(Layout::for_width(width_px)).await)
}

pub async fn slabs_create(state: &AppState, input: IncentiveSlabInput) -> CommandResult<IncentiveSlab> {
    require_admin(state).await?;
    let slab = state.incentives().create_slab(input).await?;
    state.panels().slabs.lock().await.upsert_row(slab.clone());
    state
        .notices()
        .lock()
        .await
        .push(Notice::success(format!("Slab {} created", slab.slab_name)));
    Ok(slab)
}

pub async fn slabs_update(
    state: &AppState,
    slab_id: i64,
    input: IncentiveSlabInput,
) -> CommandResult<IncentiveSlab> {
    require_admin(state).await?;
    let slab = state.incentives().update_slab(slab_id, input).await?;
    state
        .panels()
        .slabs
        .lock()
        .await
        .upsert_row(slab.clone());
    state
        .notices()
        .lock()
        .await
        .push(Notice::success(format!("Slab {} updated", slab.slab_name)));
    Ok(slab)
}

pub async fn slabs_delete(state: &AppState, slab_id: i64) -> CommandResult<()> {
    require_admin(state).await?;
    state.incentives().delete_slab(slab_id).await?;
    state.panels().slabs.lock().await.remove_row(slab_id);
    state
        .notices()
        .lock()
        .await
        .push(Notice::success("Slab deleted"));
    Ok(())
}

pub async fn incentive_for_staff(state: &AppState, staff_id: i64) -> CommandResult<IncentiveSummary> {
    current_role(state).await?;
    Ok(state.incentives().staff_incentive(staff_id).await?)
}

/// Calculator over the slabs already loaded in the slab table.
pub async fn incentive_calculate(state: &AppState, total_earn: f64) -> CommandResult<IncentiveSummary> {
    let panel = state.panels().slabs.lock().await;
    Ok(compute_summary(total_earn, panel.table().rows()))
}
