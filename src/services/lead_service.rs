use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::envelope::RecordBatch;
use crate::models::lead::{Lead, LeadCreateInput, LeadStatus, LeadStatusUpdate};
use crate::models::lead_history::LeadHistory;
use crate::models::query::ReportQuery;
use crate::models::role::Role;
use crate::services::api_client::{extract_error_detail, ApiClient};
use crate::services::csv_io::CsvUpload;
use crate::services::endpoints::Endpoint;

static PHONE_PATTERN: Lazy<Result<Regex, String>> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").map_err(|err| err.to_string()));

const MAX_NAME_LEN: usize = 120;

/// The two lead calls the leads board depends on.
#[async_trait::async_trait]
pub trait LeadGateway: Send + Sync {
    async fn list_leads(&self, role: Role, query: &ReportQuery) -> AppResult<RecordBatch<Lead>>;

    /// Returns the server's copy of the lead when the response carries one.
    async fn update_status(&self, lead_id: i64, status: &LeadStatus) -> AppResult<Option<Lead>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub message: String,
    pub details: JsonValue,
}

#[derive(Clone)]
pub struct LeadService {
    api: ApiClient,
}

impl LeadService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_lead(&self, lead_id: i64) -> AppResult<Lead> {
        self.api.get_object(Endpoint::Lead(lead_id)).await
    }

    pub async fn lead_history(&self, lead_id: i64) -> AppResult<Vec<LeadHistory>> {
        let batch = self
            .api
            .fetch_records(Endpoint::LeadHistory(lead_id), &ReportQuery::default())
            .await?;
        Ok(batch.records)
    }

    pub async fn create_lead(&self, input: LeadCreateInput) -> AppResult<Lead> {
        let input = normalize_create_input(input)?;
        let lead: Lead = self.api.post_json(Endpoint::Leads(Role::Admin), &input).await?;
        info!(target: "app::api", lead_id = lead.id, "lead created");
        Ok(lead)
    }

    pub async fn import_leads(&self, upload: CsvUpload) -> AppResult<ImportOutcome> {
        let file_name = upload.file_name().to_string();
        let size = upload.len();
        let form = upload.into_form()?;
        let response: JsonValue = self.api.post_multipart(Endpoint::LeadImport, form).await?;

        let message = extract_error_detail(&response)
            .unwrap_or_else(|| format!("{file_name} uploaded"));
        info!(target: "app::api", %file_name, bytes = size, "lead import submitted");
        Ok(ImportOutcome {
            message,
            details: response,
        })
    }
}

#[async_trait::async_trait]
impl LeadGateway for LeadService {
    async fn list_leads(&self, role: Role, query: &ReportQuery) -> AppResult<RecordBatch<Lead>> {
        self.api.fetch_records(Endpoint::Leads(role), query).await
    }

    async fn update_status(&self, lead_id: i64, status: &LeadStatus) -> AppResult<Option<Lead>> {
        let payload = LeadStatusUpdate {
            status: status.clone(),
        };
        let response: JsonValue = self.api.patch_json(Endpoint::Lead(lead_id), &payload).await?;

        // Some deployments answer with `{status}` or a message only.
        let echoed = serde_json::from_value::<Lead>(response).ok();
        debug!(target: "app::api", lead_id, echoed = echoed.is_some(), "lead status patched");
        Ok(echoed)
    }
}

pub fn normalize_create_input(mut input: LeadCreateInput) -> AppResult<LeadCreateInput> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(AppError::validation("Lead name is required"));
    }
    if input.name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Lead name must be at most {MAX_NAME_LEN} characters"
        )));
    }

    let phone: String = input
        .call
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')'))
        .collect();
    if !is_valid_phone(&phone)? {
        return Err(AppError::validation_with_details(
            "Phone number must contain 10 to 15 digits",
            serde_json::json!({ "field": "call" }),
        ));
    }
    input.call = phone;

    input.message = input
        .message
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    Ok(input)
}

fn is_valid_phone(value: &str) -> AppResult<bool> {
    let pattern = PHONE_PATTERN
        .as_ref()
        .map_err(|err| AppError::other(format!("invalid phone pattern: {err}")))?;
    Ok(pattern.is_match(value))
}
