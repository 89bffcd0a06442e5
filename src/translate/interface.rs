use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranslateError;

/// Body of `POST /translate`
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
}

/// Result of one upstream translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Envelope id the upstream call was sent with
    pub id: i64,
    pub text: String,
    pub alternatives: Vec<String>,
}

/// Success body of `POST /translate`
#[derive(Debug, Serialize)]
pub struct TranslationResponse {
    pub code: u16,
    pub id: i64,
    pub data: String,
    pub alternatives: Vec<String>,
}

impl From<Translation> for TranslationResponse {
    fn from(translation: Translation) -> Self {
        Self {
            code: 200,
            id: translation.id,
            data: translation.text,
            alternatives: translation.alternatives,
        }
    }
}

/// Translator interface - the handler only sees this seam
#[async_trait]
pub trait TranslateInterface: Send + Sync {
    /// Translate non-empty text. Empty language codes are resolved by the
    /// implementation (detected source, default target).
    async fn translate(&self, request: &TranslationRequest) -> Result<Translation, TranslateError>;
}
