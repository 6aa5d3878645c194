//! Configurable mock provider shared by unit tests.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ResponseFn = Box<dyn Fn(u32) -> Result<LlmResponse, PipelineError> + Send + Sync>;

/// Each call to `generate()` invokes the response factory with the current
/// call index, so tests can return different results per attempt.
pub(crate) struct MockProvider {
    response_fn: ResponseFn,
    /// Shared for post-hoc assertions
    pub call_count: Arc<AtomicU32>,
    /// Prompts seen, in call order
    pub prompts: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    pub fn success(text: &str) -> Self {
        let text = text.to_string();
        Self::from_fn(move |_| {
            Ok(LlmResponse {
                text: text.clone(),
                model: "mock-v1".to_string(),
                tokens_used: Some(42),
                latency_ms: 10,
            })
        })
    }

    pub fn failing(status_code: Option<u16>, message: &str) -> Self {
        let message = message.to_string();
        Self::from_fn(move |_| Err(PipelineError::provider(message.clone(), status_code)))
    }

    pub fn from_fn(
        f: impl Fn(u32) -> Result<LlmResponse, PipelineError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            response_fn: Box::new(f),
            call_count: Arc::new(AtomicU32::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.response_fn)(idx)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}
