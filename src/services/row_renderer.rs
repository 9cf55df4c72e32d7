use tracing::debug;

use crate::models::table::{DetailEntry, Record, RenderedCell, RenderedRow, TableView, Visibility};
use crate::services::table_model::TableModel;

/// Widths below this use the compact, expandable row layout.
pub const MEDIUM_BREAKPOINT_PX: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Desktop,
    Compact,
}

impl Layout {
    pub fn for_width(width_px: u32) -> Self {
        if width_px < MEDIUM_BREAKPOINT_PX {
            Layout::Compact
        } else {
            Layout::Desktop
        }
    }
}

/// Which row, if any, shows its detail panel. Holding a single id keeps at
/// most one row expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded_row_id: Option<i64>,
}

impl ExpansionState {
    pub fn expanded_row_id(&self) -> Option<i64> {
        self.expanded_row_id
    }

    pub fn is_expanded(&self, row_id: i64) -> bool {
        self.expanded_row_id == Some(row_id)
    }

    /// Collapses the row when it is open, otherwise moves expansion to it.
    pub fn toggle(&mut self, row_id: i64) -> Option<i64> {
        self.expanded_row_id = if self.is_expanded(row_id) {
            None
        } else {
            Some(row_id)
        };
        debug!(target: "app::table", row_id, expanded = ?self.expanded_row_id, "row toggled");
        self.expanded_row_id
    }

    pub fn collapse(&mut self) {
        self.expanded_row_id = None;
    }

    /// Drops the expansion when its row is no longer on screen.
    pub fn retain_visible(&mut self, visible_ids: &[i64]) {
        if let Some(id) = self.expanded_row_id {
            if !visible_ids.contains(&id) {
                self.expanded_row_id = None;
            }
        }
    }
}

pub fn render_table<T: Record>(
    model: &TableModel<T>,
    expansion: &ExpansionState,
    layout: Layout,
) -> TableView {
    let columns = model.columns();
    let has_secondary = columns
        .iter()
        .any(|spec| spec.visibility() == Visibility::Secondary);
    let compact = layout == Layout::Compact;

    let rows = model
        .visible_rows()
        .into_iter()
        .map(|row| {
            let id = row.record_id();
            let cells = columns
                .iter()
                .filter(|spec| !compact || spec.visibility() == Visibility::Primary)
                .map(|spec| RenderedCell {
                    key: spec.key().to_string(),
                    text: spec.text(row),
                })
                .collect();

            let expandable = compact && has_secondary;
            let expanded = expandable && expansion.is_expanded(id);
            let detail = expanded.then(|| {
                columns
                    .iter()
                    .filter(|spec| spec.visibility() == Visibility::Secondary)
                    .map(|spec| DetailEntry {
                        label: spec.header().to_string(),
                        value: spec.text(row),
                    })
                    .collect()
            });

            RenderedRow {
                id,
                cells,
                expandable,
                expanded,
                detail,
            }
        })
        .collect();

    let headers = model
        .headers()
        .into_iter()
        .filter(|header| !compact || header.visibility == Visibility::Primary)
        .collect();

    TableView {
        columns: headers,
        rows,
        pager: model.pager_state(),
        total_rows: model.rows().len(),
        filtered_rows: model.filtered_len(),
    }
}
