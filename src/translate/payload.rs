use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;
use serde::Serialize;

const METHOD: &str = "LMT_handle_texts";
const COMPACT_METHOD: &str = "\"method\":\"";
const SPACED_METHOD: &str = "\"method\" : \"";
const LEFT_SPACED_METHOD: &str = "\"method\": \"";

/// Process-lifetime envelope id counter.
///
/// Seeded in the range the mobile client issues, then handed out with a
/// single atomic fetch-and-add so concurrent calls never share an id.
#[derive(Debug)]
pub struct IdSequence {
    current: AtomicI64,
}

impl IdSequence {
    pub fn seeded() -> Self {
        let n: i64 = rand::thread_rng().gen_range(0..99_999);
        Self::starting_at((n + 8_300_000) * 1000)
    }

    pub fn starting_at(value: i64) -> Self {
        Self {
            current: AtomicI64::new(value),
        }
    }

    pub fn next_id(&self) -> i64 {
        self.current.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub id: i64,
    pub params: Params,
}

#[derive(Debug, Clone, Serialize)]
pub struct Params {
    pub texts: Vec<Text>,
    pub splitting: &'static str,
    pub lang: Lang,
    pub timestamp: i64,
    #[serde(rename = "commonJobParams")]
    pub common_job_params: CommonJobParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct Text {
    pub text: String,
    #[serde(rename = "requestAlternatives")]
    pub request_alternatives: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lang {
    pub source_lang_user_selected: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommonJobParams {
    #[serde(rename = "wasSpoken")]
    pub was_spoken: bool,
    pub transcribe_as: String,
}

impl Envelope {
    pub fn new(
        id: i64,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        alternatives: u32,
        timestamp: i64,
    ) -> Self {
        Self {
            jsonrpc: "2.0",
            method: METHOD,
            id,
            params: Params {
                texts: vec![Text {
                    text: text.to_string(),
                    request_alternatives: alternatives,
                }],
                splitting: "newlines",
                lang: Lang {
                    source_lang_user_selected: source_lang.to_string(),
                    target_lang: target_lang.to_string(),
                },
                timestamp,
                common_job_params: CommonJobParams {
                    was_spoken: false,
                    transcribe_as: String::new(),
                },
            },
        }
    }

    /// Serialize the way the mobile client does, spacing quirk included
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(apply_method_spacing(&json, self.id))
    }
}

pub fn count_i(text: &str) -> i64 {
    text.matches('i').count() as i64
}

/// Round `ts` up past the next multiple of `i_count + 1`. Zero leaves it alone.
pub fn adjust_timestamp(ts: i64, i_count: i64) -> i64 {
    if i_count == 0 {
        return ts;
    }
    let n = i_count + 1;
    ts - ts % n + n
}

pub fn timestamp_for(text: &str) -> i64 {
    adjust_timestamp(chrono::Utc::now().timestamp_millis(), count_i(text))
}

/// The upstream checks the whitespace around the `method` colon against the id.
pub fn apply_method_spacing(json: &str, id: i64) -> String {
    if (id + 5) % 29 == 0 || (id + 3) % 13 == 0 {
        json.replace(COMPACT_METHOD, SPACED_METHOD)
    } else {
        json.replace(COMPACT_METHOD, LEFT_SPACED_METHOD)
    }
}
