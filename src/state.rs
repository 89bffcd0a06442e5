use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::translate::{DeeplClient, TranslateInterface};

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<dyn TranslateInterface>,
}

impl AppState {
    /// `shutdown` cancels outbound calls still waiting on the rate limiter
    pub fn new(config: &Config, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let translator = Arc::new(DeeplClient::new(config, shutdown)?);
        Ok(Self::with_translator(translator))
    }

    pub fn with_translator(translator: Arc<dyn TranslateInterface>) -> Self {
        Self { translator }
    }
}
