use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::table::{
    CellValue, ColumnHeader, PagerState, Record, SortDirection, SortState, Visibility,
};
use crate::services::pager::Pager;

type ValueFn<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;
type RenderFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

pub struct ColumnSpec<T> {
    key: String,
    header: String,
    value: ValueFn<T>,
    render: Option<RenderFn<T>>,
    visibility: Visibility,
    sortable: bool,
}

impl<T> Clone for ColumnSpec<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: self.header.clone(),
            value: Arc::clone(&self.value),
            render: self.render.clone(),
            visibility: self.visibility,
            sortable: self.sortable,
        }
    }
}

impl<T> fmt::Debug for ColumnSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("visibility", &self.visibility)
            .field("sortable", &self.sortable)
            .finish()
    }
}

impl<T> ColumnSpec<T> {
    pub fn new(
        key: impl Into<String>,
        header: impl Into<String>,
        value: impl Fn(&T) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            value: Arc::new(value),
            render: None,
            visibility: Visibility::Primary,
            sortable: true,
        }
    }

    /// Folded into the detail panel below the medium breakpoint.
    pub fn secondary(mut self) -> Self {
        self.visibility = Visibility::Secondary;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn with_renderer(mut self, render: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.value)(row)
    }

    pub fn text(&self, row: &T) -> String {
        match &self.render {
            Some(render) => render(row),
            None => self.value(row).display(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFilter {
    pub column: String,
    pub needle: String,
}

/// In-memory table over one fetched page of records: a text filter on one
/// column, a sort on one column, and client-side paging. Filtering and
/// sorting only change which rows are shown, never the stored rows.
#[derive(Debug, Clone)]
pub struct TableModel<T> {
    rows: Vec<T>,
    columns: Vec<ColumnSpec<T>>,
    filter: Option<ColumnFilter>,
    sort: Option<SortState>,
    pager: Pager,
}

impl<T: Record> TableModel<T> {
    pub fn new(columns: Vec<ColumnSpec<T>>, page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            columns,
            filter: None,
            sort: None,
            pager: Pager::new(page_size),
        }
    }

    pub fn columns(&self) -> &[ColumnSpec<T>] {
        &self.columns
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Row contents may change in place; the row set may not. An edit can
    /// move rows in or out of the filter, so follow it with
    /// [`TableModel::clamp_page`].
    pub fn rows_mut(&mut self) -> &mut [T] {
        &mut self.rows
    }

    /// Pulls the page index back inside the filtered row count.
    pub fn clamp_page(&mut self) {
        let filtered = self.filtered_len();
        self.pager.clamp(filtered);
    }

    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
        let filtered = self.filtered_len();
        self.pager.clamp(filtered);
        debug!(target: "app::table", rows = self.rows.len(), filtered, "table rows replaced");
    }

    pub fn row(&self, id: i64) -> Option<&T> {
        self.rows.iter().find(|row| row.record_id() == id)
    }

    /// Swaps in a fresher copy of a row, matched by id.
    pub fn replace_row(&mut self, row: T) -> bool {
        match self
            .rows
            .iter_mut()
            .find(|existing| existing.record_id() == row.record_id())
        {
            Some(existing) => {
                *existing = row;
                self.clamp_page();
                true
            }
            None => false,
        }
    }

    pub fn remove_row(&mut self, id: i64) -> Option<T> {
        let index = self.rows.iter().position(|row| row.record_id() == id)?;
        let removed = self.rows.remove(index);
        let filtered = self.filtered_len();
        self.pager.clamp(filtered);
        Some(removed)
    }

    /// Replaces the row with the same id, or puts a new row first.
    pub fn upsert_row(&mut self, row: T) {
        if let Some(existing) = self
            .rows
            .iter_mut()
            .find(|existing| existing.record_id() == row.record_id())
        {
            *existing = row;
        } else {
            self.rows.insert(0, row);
        }
        self.clamp_page();
    }

    pub fn filter(&self) -> Option<&ColumnFilter> {
        self.filter.as_ref()
    }

    pub fn set_filter(&mut self, column: &str, needle: &str) -> AppResult<()> {
        self.column(column)?;
        let needle = needle.trim();
        self.filter = if needle.is_empty() {
            None
        } else {
            Some(ColumnFilter {
                column: column.to_string(),
                needle: needle.to_lowercase(),
            })
        };
        self.pager.first();
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.pager.first();
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// New column sorts ascending; the sorted column cycles ascending,
    /// descending, unsorted.
    pub fn toggle_sort(&mut self, column: &str) -> AppResult<Option<&SortState>> {
        let spec = self.column(column)?;
        if !spec.sortable {
            return Err(AppError::validation(format!(
                "Column `{column}` cannot be sorted"
            )));
        }

        self.sort = match self.sort.take() {
            Some(current) if current.column == column => match current.direction {
                SortDirection::Ascending => Some(SortState {
                    column: current.column,
                    direction: SortDirection::Descending,
                }),
                SortDirection::Descending => None,
            },
            _ => Some(SortState {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            }),
        };

        Ok(self.sort.as_ref())
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn pager_state(&self) -> PagerState {
        self.pager.state(self.filtered_len())
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.filtered_len();
        self.pager.next(total)
    }

    pub fn previous_page(&mut self) -> bool {
        self.pager.previous()
    }

    pub fn go_to_page(&mut self, page_index: usize) {
        let total = self.filtered_len();
        self.pager.go_to(page_index, total);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.pager.set_page_size(page_size);
        let total = self.filtered_len();
        self.pager.clamp(total);
    }

    pub fn filtered_len(&self) -> usize {
        self.rows.iter().filter(|row| self.matches_filter(row)).count()
    }

    /// Rows after filter and sort, before paging.
    pub fn processed_rows(&self) -> Vec<&T> {
        let mut rows: Vec<&T> = self
            .rows
            .iter()
            .filter(|row| self.matches_filter(row))
            .collect();

        if let Some(sort) = &self.sort {
            if let Some(spec) = self.columns.iter().find(|spec| spec.key == sort.column) {
                rows.sort_by(|a, b| {
                    let ordering = spec.value(a).compare(&spec.value(b));
                    match sort.direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    }
                });
            }
        }

        rows
    }

    /// Rows on the current page.
    pub fn visible_rows(&self) -> Vec<&T> {
        let processed = self.processed_rows();
        let range = self.pager.range(processed.len());
        processed[range].to_vec()
    }

    pub fn headers(&self) -> Vec<ColumnHeader> {
        self.columns
            .iter()
            .map(|spec| ColumnHeader {
                key: spec.key.clone(),
                header: spec.header.clone(),
                visibility: spec.visibility,
                sortable: spec.sortable,
                sorted: self
                    .sort
                    .as_ref()
                    .filter(|sort| sort.column == spec.key)
                    .map(|sort| sort.direction),
            })
            .collect()
    }

    fn column(&self, key: &str) -> AppResult<&ColumnSpec<T>> {
        self.columns
            .iter()
            .find(|spec| spec.key == key)
            .ok_or_else(|| AppError::validation(format!("Unknown column `{key}`")))
    }

    fn matches_filter(&self, row: &T) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };
        match self.columns.iter().find(|spec| spec.key == filter.column) {
            Some(spec) => spec.text(row).to_lowercase().contains(&filter.needle),
            None => true,
        }
    }
}
