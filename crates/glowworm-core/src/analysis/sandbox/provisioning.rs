//! When and how long to wait before asking for another sandbox session.

use crate::config::SandboxConfig;
use crate::error::PipelineError;
use std::time::Duration;

/// Longest wait between two provisioning attempts.
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Retry schedule for session creation.
///
/// Attempt `n` that fails with a transient error is followed by a wait of
/// `base * 2^n` before attempt `n + 1`, so the default one-second base gives
/// 2s then 4s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionRetry {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl ProvisionRetry {
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Whether a failed create is worth another attempt.
    ///
    /// The sandbox API being slow, overloaded or unreachable is transient.
    /// A rejected request (bad key, quota, malformed env) fails the same way
    /// every time, as does missing configuration.
    pub fn should_retry(&self, error: &PipelineError) -> bool {
        match error {
            PipelineError::Timeout { .. } => true,
            PipelineError::Provider {
                status_code: Some(code),
                ..
            } => matches!(*code, 408 | 425 | 429 | 500..=599),
            // No status: the request never got an HTTP answer
            PipelineError::Provider {
                status_code: None, ..
            } => true,
            PipelineError::Sandbox { .. } => true,
            PipelineError::InvalidInput(_)
            | PipelineError::NotFound(_)
            | PipelineError::NotConfigured(_) => false,
        }
    }

    /// Wait after failed attempt `attempt` (1-based), or `None` after the last.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        Some(self.base_delay.saturating_mul(factor).min(MAX_DELAY))
    }
}
