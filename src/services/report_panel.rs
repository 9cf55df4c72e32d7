use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::envelope::{PageInfo, RecordBatch};
use crate::models::table::{Record, TableView};
use crate::services::row_renderer::{render_table, ExpansionState, Layout};
use crate::services::table_model::{ColumnSpec, TableModel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum PanelStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Issued by [`ReportPanel::begin_load`]; only the newest ticket may apply
/// its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub title: String,
    pub status: PanelStatus,
    pub table: TableView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_page: Option<PageInfo>,
}

/// State of one dashboard page: its table, expanded row and load status.
/// A failure stays inside the panel that saw it.
#[derive(Debug, Clone)]
pub struct ReportPanel<T> {
    title: String,
    table: TableModel<T>,
    expansion: ExpansionState,
    status: PanelStatus,
    server_page: Option<PageInfo>,
    generation: u64,
    rows_revision: u64,
    closed: bool,
}

impl<T: Record> ReportPanel<T> {
    pub fn new(title: impl Into<String>, columns: Vec<ColumnSpec<T>>, page_size: usize) -> Self {
        Self {
            title: title.into(),
            table: TableModel::new(columns, page_size),
            expansion: ExpansionState::default(),
            status: PanelStatus::Idle,
            server_page: None,
            generation: 0,
            rows_revision: 0,
            closed: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn table(&self) -> &TableModel<T> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TableModel<T> {
        &mut self.table
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn server_page(&self) -> Option<&PageInfo> {
        self.server_page.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Changes whenever a load replaces the rows wholesale.
    pub fn rows_revision(&self) -> u64 {
        self.rows_revision
    }

    /// Starts a load and supersedes any load still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.closed = false;
        self.status = PanelStatus::Loading;
        debug!(target: "app::panel", title = %self.title, generation = self.generation, "load started");
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Applies a response unless the panel was closed or a newer load began
    /// after `ticket` was issued. Failures keep the previous rows on screen.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: AppResult<RecordBatch<T>>) -> LoadOutcome {
        if self.closed || ticket.generation != self.generation {
            debug!(
                target: "app::panel",
                title = %self.title,
                ticket = ticket.generation,
                current = self.generation,
                closed = self.closed,
                "stale response discarded"
            );
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(batch) => {
                self.server_page = batch.page;
                self.table.set_rows(batch.records);
                self.rows_revision += 1;
                self.sync_expansion();
                self.status = PanelStatus::Ready;
                LoadOutcome::Applied
            }
            Err(error) => {
                warn!(target: "app::panel", title = %self.title, error = %error, "panel load failed");
                self.status = PanelStatus::Failed(error.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Leaving the page. Responses still in flight are dropped on arrival.
    pub fn close(&mut self) {
        self.closed = true;
        self.expansion.collapse();
        if self.status == PanelStatus::Loading {
            self.status = PanelStatus::Idle;
        }
    }

    /// Closes the panel and forgets its rows.
    pub fn reset(&mut self) {
        self.close();
        self.table.set_rows(Vec::new());
        self.rows_revision += 1;
        self.server_page = None;
        self.status = PanelStatus::Idle;
    }

    pub fn upsert_row(&mut self, row: T) {
        self.table.upsert_row(row);
        self.sync_expansion();
    }

    /// Swaps in a fresher copy of a row already on the page.
    pub fn replace_row(&mut self, row: T) -> bool {
        let replaced = self.table.replace_row(row);
        self.sync_expansion();
        replaced
    }

    /// Call after editing rows through `table_mut().rows_mut()`.
    pub fn rows_edited(&mut self) {
        self.table.clamp_page();
        self.sync_expansion();
    }

    pub fn remove_row(&mut self, row_id: i64) -> Option<T> {
        let removed = self.table.remove_row(row_id);
        self.sync_expansion();
        removed
    }

    pub fn toggle_row(&mut self, row_id: i64) -> Option<i64> {
        self.expansion.toggle(row_id)
    }

    pub fn set_filter(&mut self, column: &str, needle: &str) -> AppResult<()> {
        self.table.set_filter(column, needle)?;
        self.sync_expansion();
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.table.clear_filter();
        self.sync_expansion();
    }

    pub fn toggle_sort(&mut self, column: &str) -> AppResult<()> {
        self.table.toggle_sort(column)?;
        self.sync_expansion();
        Ok(())
    }

    pub fn next_page(&mut self) -> bool {
        let moved = self.table.next_page();
        self.sync_expansion();
        moved
    }

    pub fn previous_page(&mut self) -> bool {
        let moved = self.table.previous_page();
        self.sync_expansion();
        moved
    }

    pub fn go_to_page(&mut self, page_index: usize) {
        self.table.go_to_page(page_index);
        self.sync_expansion();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.table.set_page_size(page_size);
        self.sync_expansion();
    }

    pub fn view(&self, layout: Layout) -> PanelView {
        PanelView {
            title: self.title.clone(),
            status: self.status.clone(),
            table: render_table(&self.table, &self.expansion, layout),
            server_page: self.server_page.clone(),
        }
    }

    pub(crate) fn sync_expansion(&mut self) {
        let visible: Vec<i64> = self
            .table
            .visible_rows()
            .iter()
            .map(|row| row.record_id())
            .collect();
        self.expansion.retain_visible(&visible);
    }
}

/// A panel shared between page commands. The lock is released while the
/// fetch is in flight, so a newer load or a close can overtake it.
pub struct SharedPanel<T> {
    inner: Arc<Mutex<ReportPanel<T>>>,
}

impl<T> Clone for SharedPanel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Record + Send> SharedPanel<T> {
    pub fn new(panel: ReportPanel<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(panel)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ReportPanel<T>> {
        self.inner.lock().await
    }

    pub async fn load<Fut>(&self, fetch: Fut) -> LoadOutcome
    where
        Fut: Future<Output = AppResult<RecordBatch<T>>>,
    {
        let ticket = self.inner.lock().await.begin_load();
        let result = fetch.await;
        self.inner.lock().await.finish_load(ticket, result)
    }

    pub async fn close(&self) {
        self.inner.lock().await.close();
    }

    pub async fn view(&self, layout: Layout) -> PanelView {
        self.inner.lock().await.view(layout)
    }
}
