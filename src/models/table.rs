use std::cmp::Ordering;

use serde::Serialize;

/// Anything a table can key rows by.
pub trait Record {
    fn record_id(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

/// Primary columns always render; secondary ones fold into the detail panel
/// on narrow viewports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Primary,
    Secondary,
}

/// Raw cell content used for sorting and filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(text) if !text.is_empty() => CellValue::Text(text.to_string()),
            _ => CellValue::Empty,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Integer(value) => value.to_string(),
            CellValue::Number(value) => format!("{value:.2}"),
        }
    }

    /// Empty cells sort last in ascending order; numbers compare numerically,
    /// text case-insensitively, mixed kinds fall back to display text.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Greater,
            (_, CellValue::Empty) => Ordering::Less,
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Integer(a), CellValue::Number(b)) => (*a as f64).total_cmp(b),
            (CellValue::Number(a), CellValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (CellValue::Text(a), CellValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (a, b) => a.display().to_lowercase().cmp(&b.display().to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    pub key: String,
    pub header: String,
    pub visibility: Visibility,
    pub sortable: bool,
    pub sorted: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedCell {
    pub key: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    pub id: i64,
    pub cells: Vec<RenderedCell>,
    /// Only compact layouts offer the expand toggle.
    pub expandable: bool,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Vec<DetailEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagerState {
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub can_previous: bool,
    pub can_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<RenderedRow>,
    pub pager: PagerState,
    pub total_rows: usize,
    pub filtered_rows: usize,
}
