use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ApiErrorCode, AppError, AppResult};

/// Where an endpoint keeps its records inside the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `{ "count", "next", "previous", "results": [...] }`
    Paginated,
    /// `[...]`
    BareArray,
    /// `{ "<field>": [...] , ...aggregates }`
    Named(&'static str),
}

impl EnvelopeShape {
    pub fn describe(self) -> String {
        match self {
            EnvelopeShape::Paginated => "paginated `results`".to_string(),
            EnvelopeShape::BareArray => "bare array".to_string(),
            EnvelopeShape::Named(field) => format!("named `{field}` array"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl PageInfo {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordBatch<T> {
    pub records: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

impl<T> RecordBatch<T> {
    pub fn unpaged(records: Vec<T>) -> Self {
        Self {
            records,
            page: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn decode_records<T: DeserializeOwned>(
    body: JsonValue,
    shape: EnvelopeShape,
) -> AppResult<RecordBatch<T>> {
    match (shape, body) {
        (EnvelopeShape::BareArray, JsonValue::Array(items)) => {
            Ok(RecordBatch::unpaged(decode_items(items, shape)?))
        }
        (EnvelopeShape::Paginated, JsonValue::Object(mut map)) => {
            let results = match map.remove("results") {
                Some(JsonValue::Array(items)) => items,
                _ => return Err(shape_mismatch(shape)),
            };
            let count = map
                .get("count")
                .and_then(|value| value.as_u64())
                .unwrap_or(results.len() as u64);
            let next = string_field(&map, "next");
            let previous = string_field(&map, "previous");
            Ok(RecordBatch {
                records: decode_items(results, shape)?,
                page: Some(PageInfo {
                    count,
                    next,
                    previous,
                }),
            })
        }
        (EnvelopeShape::Named(field), JsonValue::Object(mut map)) => match map.remove(field) {
            Some(JsonValue::Array(items)) => Ok(RecordBatch::unpaged(decode_items(items, shape)?)),
            _ => Err(shape_mismatch(shape)),
        },
        _ => Err(shape_mismatch(shape)),
    }
}

/// Decodes a single-object body such as the echo of a PATCH.
pub fn decode_object<T: DeserializeOwned>(body: JsonValue) -> AppResult<T> {
    serde_json::from_value(body).map_err(|err| {
        AppError::api(
            ApiErrorCode::InvalidResponse,
            format!("Unexpected response body: {err}"),
        )
    })
}

fn decode_items<T: DeserializeOwned>(items: Vec<JsonValue>, shape: EnvelopeShape) -> AppResult<Vec<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|err| {
                AppError::api(
                    ApiErrorCode::InvalidResponse,
                    format!("Record {index} in {} is malformed: {err}", shape.describe()),
                )
            })
        })
        .collect()
}

fn string_field(map: &serde_json::Map<String, JsonValue>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
}

fn shape_mismatch(shape: EnvelopeShape) -> AppError {
    AppError::api(
        ApiErrorCode::InvalidResponse,
        format!("Response did not contain the expected {}", shape.describe()),
    )
}
