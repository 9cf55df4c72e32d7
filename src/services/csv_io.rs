use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Multipart field the import endpoint reads the upload from.
pub const IMPORT_FILE_FIELD: &str = "file";
pub const TEMPLATE_FILE_NAME: &str = "lead_import_template.csv";
pub const TEMPLATE_HEADERS: [&str; 4] = ["name", "call", "status", "message"];

const SAMPLE_ROW: [&str; 4] = [
    "Asha Verma",
    "9876543210",
    "Leads",
    "Asked for a site visit next week",
];

/// A chosen CSV file that passed the client-side checks.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl CsvUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> AppResult<Self> {
        let file_name = file_name.into();
        validate_import_file(&file_name, &bytes)?;
        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_form(self) -> AppResult<Form> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str("text/csv")
            .map_err(|err| AppError::other(format!("failed to build upload part: {err}")))?;
        Ok(Form::new().part(IMPORT_FILE_FIELD, part))
    }
}

pub fn validate_import_file(file_name: &str, bytes: &[u8]) -> AppResult<()> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Please choose a CSV file to import"));
    }

    let is_csv = Path::new(trimmed)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(AppError::validation(format!(
            "{trimmed} is not a .csv file"
        )));
    }

    if bytes.iter().all(|byte| byte.is_ascii_whitespace()) {
        return Err(AppError::validation(format!("{trimmed} is empty")));
    }

    Ok(())
}

/// Sample file offered for download next to the import button. It is not
/// bound to any data.
pub fn lead_import_template() -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(TEMPLATE_HEADERS)
        .map_err(|err| AppError::other(format!("failed to write template header: {err}")))?;
    writer
        .write_record(SAMPLE_ROW)
        .map_err(|err| AppError::other(format!("failed to write template row: {err}")))?;

    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::other(format!("failed to finish template: {err}")))?;
    debug!(target: "app::csv", bytes = bytes.len(), "lead import template generated");
    Ok(bytes)
}
