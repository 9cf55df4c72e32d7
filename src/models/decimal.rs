//! Amount fields arrive either as JSON numbers or as decimal strings
//! (`"1500.00"`), depending on how the backend serializer is configured.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn parse(value: NumberOrString) -> Result<f64, String> {
    match value {
        NumberOrString::Number(number) => Ok(number),
        NumberOrString::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid decimal `{text}`: {err}")),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = NumberOrString::deserialize(deserializer)?;
    parse(value).map_err(de::Error::custom)
}

pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(NumberOrString::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(inner) => parse(inner).map(Some).map_err(de::Error::custom),
    }
}
