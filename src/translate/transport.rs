use std::sync::Arc;

use reqwest::{Client, Request, Response};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::rate_limiter::{LimiterError, RateLimiter};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Limiter(#[from] LimiterError),
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The only way out of the process: every request waits on the shared limiter.
pub struct RateLimitedTransport {
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedTransport {
    pub fn new(client: Client, limiter: Arc<RateLimiter>) -> Self {
        Self { client, limiter }
    }

    /// Builder access for constructing requests; sending goes through `execute`
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn execute(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response, TransportError> {
        self.limiter.acquire(cancel).await?;
        Ok(self.client.execute(request).await?)
    }
}
