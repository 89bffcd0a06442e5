use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::interface::{TranslateInterface, Translation, TranslationRequest};
use super::lang;
use super::payload::{timestamp_for, Envelope, IdSequence};
use super::response;
use super::transport::{RateLimitedTransport, TransportError};
use crate::config::Config;
use crate::error::TranslateError;
use crate::rate_limiter::RateLimiter;

/// Headers of the iOS app the upstream expects to be talking to
const CLIENT_HEADERS: [(&str, &str); 11] = [
    ("content-type", "application/json"),
    ("accept", "*/*"),
    ("x-app-os-name", "iOS"),
    ("x-app-os-version", "16.3.0"),
    ("accept-language", "en-US,en;q=0.9"),
    ("accept-encoding", "gzip, deflate, br"),
    ("x-app-device", "iPhone13,2"),
    ("user-agent", "DeepL-iOS/2.6.0 iOS 16.3.0 (iPhone13,2)"),
    ("x-app-build", "353933"),
    ("x-app-version", "2.6"),
    ("connection", "keep-alive"),
];

pub fn client_headers() -> HeaderMap {
    CLIENT_HEADERS
        .into_iter()
        .map(|(name, value)| {
            (
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            )
        })
        .collect()
}

/// Client for the DeepL JSON-RPC endpoint
pub struct DeeplClient {
    url: String,
    transport: RateLimitedTransport,
    ids: IdSequence,
    default_target_lang: String,
    alternatives: u32,
    shutdown: CancellationToken,
}

impl DeeplClient {
    pub fn new(config: &Config, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(config.upstream.timeout()).build()?;
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let ids = IdSequence::seeded();

        info!(
            "Initialized DeepL client: url={}, one request every {:?}, burst={}",
            config.upstream.url,
            limiter.interval(),
            config.rate_limit.burst
        );

        Ok(Self {
            url: config.upstream.url.clone(),
            transport: RateLimitedTransport::new(http, limiter),
            ids,
            default_target_lang: config.translate.default_target_lang.clone(),
            alternatives: config.translate.alternatives,
            shutdown,
        })
    }

    /// Build the request body: fresh id, forged timestamp, spacing quirk
    pub fn build_payload(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<(i64, String), TranslateError> {
        let id = self.ids.next_id();
        let envelope = Envelope::new(
            id,
            text,
            source_lang,
            target_lang,
            self.alternatives,
            timestamp_for(text),
        );
        Ok((id, envelope.encode()?))
    }

    async fn send(&self, body: String) -> Result<(reqwest::StatusCode, Vec<u8>), TranslateError> {
        let request = self
            .transport
            .client()
            .post(&self.url)
            .headers(client_headers())
            .body(body)
            .build()
            .map_err(|e| TranslateError::UpstreamUnavailable(e.to_string()))?;

        let cancel = self.shutdown.child_token();
        let response = self
            .transport
            .execute(request, &cancel)
            .await
            .map_err(|e| match e {
                TransportError::Limiter(e) => {
                    error!("Send translate request error: {}", e);
                    TranslateError::RateLimitExceeded
                }
                TransportError::Http(e) => TranslateError::UpstreamUnavailable(e.to_string()),
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TranslateError::UpstreamUnavailable(e.to_string()))?;
        Ok((status, bytes.to_vec()))
    }
}

#[async_trait]
impl TranslateInterface for DeeplClient {
    async fn translate(&self, request: &TranslationRequest) -> Result<Translation, TranslateError> {
        let (source_lang, target_lang) = lang::resolve(
            &request.text,
            request.source_lang.as_deref(),
            request.target_lang.as_deref(),
            &self.default_target_lang,
        );

        let (id, body) = self.build_payload(&request.text, &source_lang, &target_lang)?;
        debug!(id, %source_lang, %target_lang, "Sending translate request");

        let (status, bytes) = self.send(body).await?;
        let extracted = response::extract(status, &bytes)?;

        debug!(id, alternatives = extracted.alternatives.len(), "Translation received");
        Ok(Translation {
            id,
            text: extracted.text,
            alternatives: extracted.alternatives,
        })
    }
}
