//! Remote sandbox provider abstraction.

use crate::error::PipelineResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Parameters for provisioning one session.
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    /// Flat environment map visible to every command in the session
    pub env: BTreeMap<String, String>,
    /// Start from the pre-provisioned snapshot instead of a blank image
    pub use_snapshot: bool,
}

/// A provisioned remote execution environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Output of one shell command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    /// Combined stdout/stderr
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait implemented by remote sandbox backends.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    async fn create_session(&self, request: &SessionRequest) -> PipelineResult<SandboxSession>;

    /// Run a shell command. `timeout` of `None` means no execution limit.
    async fn exec(
        &self,
        session_id: &str,
        command: &str,
        timeout: Option<Duration>,
    ) -> PipelineResult<ExecOutput>;

    /// Whether [`upload_file`](Self::upload_file) transfers bytes directly.
    fn supports_native_upload(&self) -> bool {
        false
    }

    async fn upload_file(&self, session_id: &str, path: &str, bytes: Vec<u8>)
        -> PipelineResult<()>;

    async fn delete_session(&self, session_id: &str) -> PipelineResult<()>;
}
