use std::sync::{Arc, RwLock};
use std::time::{Duration as StdDuration, Instant};

use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::repositories::settings_repository::SettingsRepository;
use crate::db::DbPool;
use crate::error::{ApiErrorCode, AppError, AppResult};
use crate::models::envelope::{decode_object, decode_records, RecordBatch};
use crate::models::query::ReportQuery;
use crate::services::endpoints::Endpoint;
use crate::services::pager::DEFAULT_PAGE_SIZE;
use crate::utils::redact::redact_sensitive_data;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const KEY_API_BASE_URL: &str = "api_base_url";

const ENV_BASE_URL: &str = "CRM_API_BASE_URL";
const ENV_HTTP_TIMEOUT: &str = "CRM_HTTP_TIMEOUT_SECS";
const ENV_PAGE_SIZE: &str = "CRM_PAGE_SIZE";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub http_timeout: StdDuration,
    pub page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout: StdDuration::from_secs(30),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var(ENV_BASE_URL)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.base_url);
        let http_timeout = std::env::var(ENV_HTTP_TIMEOUT)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(StdDuration::from_secs)
            .unwrap_or(defaults.http_timeout);
        let page_size = std::env::var(ENV_PAGE_SIZE)
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.page_size);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_timeout,
            page_size,
        }
    }

    /// Environment first, then the base URL saved in the local store.
    pub fn load(db_pool: &DbPool) -> AppResult<Self> {
        let mut config = Self::from_env();

        if std::env::var(ENV_BASE_URL).is_err() {
            let stored =
                db_pool.with_connection(|conn| SettingsRepository::get_value(conn, KEY_API_BASE_URL))?;
            if let Some(url) = stored.filter(|value| !value.trim().is_empty()) {
                config.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        Ok(config)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

/// Authenticated REST client shared by every page. The token cell is shared
/// between clones so a new session reaches all services at once.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        let token = token
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    pub fn has_token(&self) -> bool {
        self.current_token().is_some()
    }

    /// GET a list endpoint and unwrap its envelope.
    pub async fn fetch_records<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &ReportQuery,
    ) -> AppResult<RecordBatch<T>> {
        let shape = endpoint.list_shape().ok_or_else(|| {
            AppError::other(format!("{} is not a list endpoint", endpoint.path()))
        })?;
        query.validate()?;

        let pairs = query.to_query_pairs();
        let body = self
            .execute(Method::GET, endpoint, |builder| builder.query(&pairs), None)
            .await?;
        let batch = decode_records(body, shape)?;
        debug!(target: "app::api", path = %endpoint.path(), records = batch.len(), "records fetched");
        Ok(batch)
    }

    pub async fn get_object<T: DeserializeOwned>(&self, endpoint: Endpoint) -> AppResult<T> {
        let body = self
            .execute(Method::GET, endpoint, |builder| builder, None)
            .await?;
        decode_object(body)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        payload: &B,
    ) -> AppResult<T> {
        self.send_json(Method::POST, endpoint, payload).await
    }

    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        payload: &B,
    ) -> AppResult<T> {
        self.send_json(Method::PATCH, endpoint, payload).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        form: Form,
    ) -> AppResult<T> {
        self.send_multipart(Method::POST, endpoint, form).await
    }

    pub async fn patch_multipart<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        form: Form,
    ) -> AppResult<T> {
        self.send_multipart(Method::PATCH, endpoint, form).await
    }

    pub async fn delete(&self, endpoint: Endpoint) -> AppResult<()> {
        self.execute(Method::DELETE, endpoint, |builder| builder, None)
            .await
            .map(|_| ())
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: Endpoint,
        payload: &B,
    ) -> AppResult<T> {
        let value = serde_json::to_value(payload)?;
        let logged = redact_sensitive_data(&value);
        let body = self
            .execute(method, endpoint, |builder| builder.json(&value), Some(&logged))
            .await?;
        decode_object(body)
    }

    async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: Endpoint,
        form: Form,
    ) -> AppResult<T> {
        let body = self
            .execute(method, endpoint, move |builder| builder.multipart(form), None)
            .await?;
        decode_object(body)
    }

    async fn execute(
        &self,
        method: Method,
        endpoint: Endpoint,
        customize: impl FnOnce(RequestBuilder) -> RequestBuilder,
        logged_payload: Option<&JsonValue>,
    ) -> AppResult<JsonValue> {
        let correlation_id = Uuid::new_v4().to_string();
        let token = self.current_token().ok_or_else(|| {
            AppError::api_with_details(
                ApiErrorCode::Unauthorized,
                "Not signed in: no session token available",
                None,
                Some(correlation_id.as_str()),
            )
        })?;

        let path = endpoint.path();
        let url = format!("{}{}", self.base_url, path);

        debug!(
            target: "app::api",
            method = %method,
            path = %path,
            correlation_id = %correlation_id,
            payload = ?logged_payload,
            "sending request"
        );

        let builder = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::AUTHORIZATION, format!("Token {token}"))
            .header(reqwest::header::ACCEPT, "application/json");

        let start = Instant::now();
        let response = customize(builder).send().await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                let latency_ms = start.elapsed().as_millis();

                if status.is_success() {
                    debug!(
                        target: "app::api",
                        method = %method,
                        path = %path,
                        correlation_id = %correlation_id,
                        status = status.as_u16(),
                        latency_ms,
                        "request succeeded"
                    );
                    return read_json(resp, &correlation_id).await;
                }

                let detail = read_error_detail(resp).await;
                warn!(
                    target: "app::api",
                    method = %method,
                    path = %path,
                    correlation_id = %correlation_id,
                    status = status.as_u16(),
                    latency_ms,
                    "request returned non-success status"
                );
                Err(map_http_error(status, detail, &correlation_id))
            }
            Err(err) => {
                warn!(
                    target: "app::api",
                    method = %method,
                    path = %path,
                    correlation_id = %correlation_id,
                    error = %err,
                    "request failed"
                );
                Err(error_from_reqwest(err, &correlation_id))
            }
        }
    }

    fn current_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

async fn read_json(resp: Response, correlation_id: &str) -> AppResult<JsonValue> {
    let bytes = resp.bytes().await.map_err(|err| {
        AppError::api_with_details(
            ApiErrorCode::Network,
            format!("Failed to read response body: {err}"),
            None,
            Some(correlation_id),
        )
    })?;

    if bytes.iter().all(|byte| byte.is_ascii_whitespace()) {
        return Ok(JsonValue::Null);
    }

    serde_json::from_slice(&bytes).map_err(|err| {
        AppError::api_with_details(
            ApiErrorCode::InvalidResponse,
            format!("Response is not valid JSON: {err}"),
            None,
            Some(correlation_id),
        )
    })
}

/// Pulls a human message out of an error body: `detail`, `message`, `error`,
/// or the first field error of a validation response.
async fn read_error_detail(resp: Response) -> Option<String> {
    let bytes = resp.bytes().await.ok()?;
    let value: JsonValue = serde_json::from_slice(&bytes).ok()?;
    extract_error_detail(&value)
}

pub(crate) fn extract_error_detail(value: &JsonValue) -> Option<String> {
    let map = match value {
        JsonValue::Object(map) => map,
        JsonValue::Array(items) => {
            return items
                .first()
                .and_then(|item| item.as_str())
                .map(str::to_string)
        }
        JsonValue::String(text) if !text.trim().is_empty() => return Some(text.clone()),
        _ => return None,
    };

    for key in ["detail", "message", "error"] {
        if let Some(text) = map.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }

    map.iter().find_map(|(field, errors)| {
        let message = match errors {
            JsonValue::Array(items) => items.first().and_then(|item| item.as_str()),
            JsonValue::String(text) => Some(text.as_str()),
            _ => None,
        }?;
        Some(format!("{field}: {message}"))
    })
}

pub(crate) fn map_http_error(
    status: StatusCode,
    detail: Option<String>,
    correlation_id: &str,
) -> AppError {
    let code = status.as_u16();
    let (api_code, message) = match status {
        StatusCode::UNAUTHORIZED => (
            ApiErrorCode::Unauthorized,
            "Session expired or token invalid".to_string(),
        ),
        StatusCode::FORBIDDEN => (
            ApiErrorCode::Forbidden,
            detail.unwrap_or_else(|| "You do not have permission for this action".to_string()),
        ),
        StatusCode::NOT_FOUND => (
            ApiErrorCode::NotFound,
            "Requested record was not found".to_string(),
        ),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => (
            ApiErrorCode::BadRequest,
            detail.unwrap_or_else(|| "The server rejected the request".to_string()),
        ),
        status if status.is_server_error() => (
            ApiErrorCode::ServerError,
            format!("Server error (status {code})"),
        ),
        _ => (
            ApiErrorCode::Unknown,
            format!("Request failed with status {code}"),
        ),
    };

    AppError::api_with_details(api_code, message, Some(code), Some(correlation_id))
}

fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> AppError {
    if err.is_timeout() {
        AppError::api_with_details(
            ApiErrorCode::Timeout,
            "Request timed out",
            None,
            Some(correlation_id),
        )
    } else if err.is_connect() {
        AppError::api_with_details(
            ApiErrorCode::Network,
            "Could not reach the server",
            None,
            Some(correlation_id),
        )
    } else if let Some(status) = err.status() {
        map_http_error(status, None, correlation_id)
    } else {
        AppError::api_with_details(
            ApiErrorCode::Unknown,
            format!("Request failed: {err}"),
            None,
            Some(correlation_id),
        )
    }
}

pub mod testing {
    use super::*;

    /// Status mapping without a live request.
    pub fn map_status(status: u16, detail: Option<&str>) -> AppError {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        map_http_error(status, detail.map(str::to_string), "test-correlation-id")
    }

    pub fn error_detail(value: &JsonValue) -> Option<String> {
        extract_error_detail(value)
    }
}
