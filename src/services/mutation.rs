use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::notice::Notice;
use crate::models::table::Record;

const NOTICE_CAPACITY: usize = 20;

/// Pending toasts, oldest first. Old entries fall off once the queue is full.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    notices: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn push(&mut self, notice: Notice) {
        if self.notices.len() == NOTICE_CAPACITY {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

/// A local edit waiting for the server's verdict.
#[derive(Debug, Clone)]
pub struct PendingChange<T> {
    id: i64,
    snapshot: T,
    pending: T,
}

impl<T> PendingChange<T> {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    /// The row as it reads after the local edit.
    pub fn pending(&self) -> &T {
        &self.pending
    }
}

/// What a settled write left behind, plus the toast to show for it.
#[derive(Debug)]
pub struct Settled<T> {
    pub outcome: AppResult<T>,
    pub notice: Notice,
}

/// Applies `change` to the row with `id` and remembers the prior value. The
/// caller is free to release its lock on `rows` while the write runs.
pub fn begin_optimistic<T, C>(rows: &mut [T], id: i64, change: C) -> AppResult<PendingChange<T>>
where
    T: Record + Clone,
    C: FnOnce(&mut T),
{
    let row = rows
        .iter_mut()
        .find(|row| row.record_id() == id)
        .ok_or_else(AppError::not_found)?;

    let snapshot = row.clone();
    change(&mut *row);
    debug!(target: "app::mutation", record_id = id, "optimistic update applied");
    Ok(PendingChange {
        id,
        snapshot,
        pending: row.clone(),
    })
}

/// Folds the write result back into `rows`.
///
/// A failure restores the snapshot, but only while the row still holds the
/// value this change wrote; a later edit is left alone. A success merges the
/// server's echo when there is one. Rows missing from `rows` are not touched.
pub fn settle_optimistic<T>(
    rows: &mut [T],
    change: PendingChange<T>,
    result: AppResult<Option<T>>,
    success_message: &str,
) -> Settled<T>
where
    T: Record + Clone + PartialEq,
{
    let PendingChange { id, snapshot, pending } = change;
    let current = rows.iter_mut().find(|row| row.record_id() == id);

    match result {
        Ok(echo) => {
            let confirmed = match (echo, current) {
                (Some(server_row), Some(row)) => {
                    *row = server_row.clone();
                    server_row
                }
                (Some(server_row), None) => server_row,
                (None, Some(row)) if *row == pending => pending,
                (None, Some(row)) => row.clone(),
                (None, None) => pending,
            };
            info!(target: "app::mutation", record_id = id, "optimistic update confirmed");
            Settled {
                outcome: Ok(confirmed),
                notice: Notice::success(success_message),
            }
        }
        Err(error) => {
            match current {
                Some(row) if *row == pending => *row = snapshot,
                _ => {
                    debug!(target: "app::mutation", record_id = id, "row changed since the write began, rollback skipped");
                }
            }
            warn!(target: "app::mutation", record_id = id, error = %error, "optimistic update rolled back");
            Settled {
                notice: Notice::error(error.to_string()),
                outcome: Err(error),
            }
        }
    }
}
