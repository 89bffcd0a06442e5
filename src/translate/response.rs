//! Reading the upstream JSON-RPC reply.
//!
//! The schema is undocumented and may change without notice, so every field
//! is optional and the consumed values fall back to key-path lookups when the
//! typed view does not fit.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TranslateError;

/// JSON-RPC code the upstream uses for a request it cannot handle
const INVALID_REQUEST: i64 = -32600;

#[derive(Debug, Default, Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    result: Option<UpstreamResult>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamResult {
    #[serde(default)]
    texts: Vec<UpstreamText>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamText {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    alternatives: Vec<UpstreamAlternative>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamAlternative {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub alternatives: Vec<String>,
}

pub fn extract(status: StatusCode, body: &[u8]) -> Result<Extracted, TranslateError> {
    let value = serde_json::from_slice::<Value>(body).ok();

    if let Some(error) = value.as_ref().and_then(|v| v.get("error")) {
        if is_invalid_request(error.get("code").unwrap_or(&Value::Null)) {
            warn!("Upstream rejected the request: {}", error);
            return Err(TranslateError::InvalidTargetLang);
        }
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TranslateError::TooManyRequests);
    }

    let value = value.ok_or_else(|| {
        TranslateError::UpstreamInvalidResponse(format!("status {} with non-JSON body", status))
    })?;

    let extracted = match serde_json::from_value::<UpstreamResponse>(value.clone()) {
        Ok(typed) => from_typed(typed),
        Err(e) => {
            debug!("Upstream response did not fit the typed view ({}), using key paths", e);
            from_key_paths(&value)
        }
    };

    extracted.ok_or_else(|| {
        let detail = value
            .get("error")
            .map(|e| e.to_string())
            .unwrap_or_else(|| format!("status {} without translated text", status));
        TranslateError::UpstreamInvalidResponse(detail)
    })
}

fn is_invalid_request(code: &Value) -> bool {
    match code {
        Value::Number(n) => n.as_i64() == Some(INVALID_REQUEST),
        Value::String(s) => s.trim() == INVALID_REQUEST.to_string(),
        _ => false,
    }
}

fn from_typed(response: UpstreamResponse) -> Option<Extracted> {
    if let Some(error) = &response.error {
        debug!(
            "Upstream error {}: {}",
            error.code,
            error.message.as_deref().unwrap_or("")
        );
    }

    let first = response.result?.texts.into_iter().next()?;
    Some(Extracted {
        text: first.text?,
        alternatives: first
            .alternatives
            .into_iter()
            .filter_map(|alt| alt.text)
            .collect(),
    })
}

fn from_key_paths(value: &Value) -> Option<Extracted> {
    let text = value.pointer("/result/texts/0/text")?.as_str()?.to_string();
    let alternatives = value
        .pointer("/result/texts/0/alternatives")
        .and_then(|v| v.as_array())
        .map(|alts| {
            alts.iter()
                .filter_map(|alt| alt.get("text").and_then(|t| t.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Some(Extracted { text, alternatives })
}
