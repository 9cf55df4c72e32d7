//! Column layouts for each dashboard table.

use crate::models::incentive::IncentiveSlab;
use crate::models::lead::Lead;
use crate::models::lead_history::LeadHistory;
use crate::models::productivity::{format_percentage, StaffProductivityRow};
use crate::models::project::Project;
use crate::models::table::CellValue;
use crate::services::table_model::ColumnSpec;

fn optional_id(value: Option<i64>) -> CellValue {
    value.map(CellValue::Integer).unwrap_or(CellValue::Empty)
}

fn percentage(value: Option<f64>) -> CellValue {
    value.map(CellValue::Number).unwrap_or(CellValue::Empty)
}

fn count(value: u64) -> CellValue {
    CellValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}

pub fn lead_columns() -> Vec<ColumnSpec<Lead>> {
    vec![
        ColumnSpec::new("name", "Name", |lead: &Lead| CellValue::text(lead.name.as_str())),
        ColumnSpec::new("call", "Phone", |lead: &Lead| CellValue::text(lead.call.as_str())),
        ColumnSpec::new("status", "Status", |lead: &Lead| CellValue::text(lead.status.as_str())),
        ColumnSpec::new("assigned_to", "Assigned To", |lead: &Lead| optional_id(lead.assigned_to))
            .secondary(),
        ColumnSpec::new("created_date", "Created", |lead: &Lead| {
            CellValue::optional_text(lead.created_date.as_deref())
        })
        .secondary(),
        ColumnSpec::new("message", "Message", |lead: &Lead| {
            CellValue::optional_text(lead.message.as_deref())
        })
        .secondary()
        .unsortable(),
    ]
}

pub fn lead_history_columns() -> Vec<ColumnSpec<LeadHistory>> {
    vec![
        ColumnSpec::new("status", "Status", |entry: &LeadHistory| {
            CellValue::text(entry.status.as_str())
        }),
        ColumnSpec::new("created_date", "Date", |entry: &LeadHistory| {
            CellValue::optional_text(entry.created_date.as_deref())
        }),
        ColumnSpec::new("message", "Message", |entry: &LeadHistory| {
            CellValue::optional_text(entry.message.as_deref())
        })
        .secondary()
        .unsortable(),
    ]
}

pub fn productivity_columns() -> Vec<ColumnSpec<StaffProductivityRow>> {
    type Row = StaffProductivityRow;
    vec![
        ColumnSpec::new("name", "Name", |row: &Row| CellValue::text(row.name.as_str())),
        ColumnSpec::new("total_calls", "Total Calls", |row: &Row| count(row.total_calls)),
        ColumnSpec::new("interested", "Interested", |row: &Row| count(row.interested)),
        ColumnSpec::new("interested_percentage", "Interested %", |row: &Row| {
            percentage(row.interested_percentage)
        })
        .with_renderer(|row: &Row| format_percentage(row.interested_percentage)),
        ColumnSpec::new("not_interested", "Not Interested", |row: &Row| count(row.not_interested))
            .secondary(),
        ColumnSpec::new("visit", "Visit", |row: &Row| count(row.visit)).secondary(),
        ColumnSpec::new("visit_percentage", "Visit %", |row: &Row| percentage(row.visit_percentage))
            .with_renderer(|row: &Row| format_percentage(row.visit_percentage))
            .secondary(),
        ColumnSpec::new("lost", "Lost", |row: &Row| count(row.lost)).secondary(),
        ColumnSpec::new("lost_percentage", "Lost %", |row: &Row| percentage(row.lost_percentage))
            .with_renderer(|row: &Row| format_percentage(row.lost_percentage))
            .secondary(),
        ColumnSpec::new("other_location", "Other Location", |row: &Row| count(row.other_location))
            .secondary(),
    ]
}

pub fn slab_columns() -> Vec<ColumnSpec<IncentiveSlab>> {
    vec![
        ColumnSpec::new("slab_name", "Slab", |slab: &IncentiveSlab| {
            CellValue::text(slab.slab_name.as_str())
        }),
        ColumnSpec::new("min_amount", "Min", |slab: &IncentiveSlab| CellValue::Number(slab.min_amount)),
        ColumnSpec::new("max_amount", "Max", |slab: &IncentiveSlab| CellValue::Number(slab.max_amount)),
        ColumnSpec::new("incentive_percentage", "Incentive %", |slab: &IncentiveSlab| {
            CellValue::Number(slab.incentive_percentage)
        })
        .with_renderer(|slab: &IncentiveSlab| format_percentage(Some(slab.incentive_percentage))),
        ColumnSpec::new("is_active", "Active", |slab: &IncentiveSlab| {
            CellValue::text(if slab.is_active { "Yes" } else { "No" })
        })
        .secondary(),
    ]
}

pub fn project_columns() -> Vec<ColumnSpec<Project>> {
    vec![
        ColumnSpec::new("name", "Project", |project: &Project| {
            CellValue::text(project.name.as_str())
        }),
        ColumnSpec::new("created_date", "Created", |project: &Project| {
            CellValue::optional_text(project.created_date.as_deref())
        }),
        ColumnSpec::new("youtube_link", "Video", |project: &Project| {
            CellValue::optional_text(project.youtube_link.as_deref())
        })
        .secondary()
        .unsortable(),
        ColumnSpec::new("media_file", "Media", |project: &Project| {
            CellValue::optional_text(project.media_file.as_deref())
        })
        .secondary()
        .unsortable(),
        ColumnSpec::new("message", "Description", |project: &Project| {
            CellValue::optional_text(project.message.as_deref())
        })
        .secondary()
        .unsortable(),
    ]
}
