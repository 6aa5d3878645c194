//! In-memory sandbox provider for unit tests.

use super::provider::{ExecOutput, SandboxProvider, SandboxSession, SessionRequest};
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type ExecFn = Box<dyn Fn(&str) -> PipelineResult<ExecOutput> + Send + Sync>;

pub(crate) struct MockSandbox {
    /// Leading `create_session` calls that fail with this status
    create_failures: u32,
    create_status: u16,
    native_upload: bool,
    exec_fn: ExecFn,
    creates: AtomicU32,
    pub snapshots: Mutex<Vec<bool>>,
    pub envs: Mutex<Vec<std::collections::BTreeMap<String, String>>>,
    pub commands: Mutex<Vec<(String, Option<Duration>)>>,
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub deleted: Mutex<Vec<String>>,
}

pub(crate) fn ok(output: &str) -> PipelineResult<ExecOutput> {
    Ok(ExecOutput {
        exit_code: 0,
        output: output.to_string(),
    })
}

pub(crate) fn exit(code: i32, output: &str) -> PipelineResult<ExecOutput> {
    Ok(ExecOutput {
        exit_code: code,
        output: output.to_string(),
    })
}

impl MockSandbox {
    /// Every command succeeds with empty output.
    pub fn new() -> Self {
        Self::with_exec(|_| ok(""))
    }

    pub fn with_exec(f: impl Fn(&str) -> PipelineResult<ExecOutput> + Send + Sync + 'static) -> Self {
        Self {
            create_failures: 0,
            create_status: 503,
            native_upload: true,
            exec_fn: Box::new(f),
            creates: AtomicU32::new(0),
            snapshots: Mutex::new(Vec::new()),
            envs: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_creates(mut self, count: u32, status: u16) -> Self {
        self.create_failures = count;
        self.create_status = status;
        self
    }

    pub fn without_native_upload(mut self) -> Self {
        self.native_upload = false;
        self
    }

    pub fn creates(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(cmd, _)| cmd.clone())
            .collect()
    }
}

#[async_trait]
impl SandboxProvider for MockSandbox {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_session(&self, request: &SessionRequest) -> PipelineResult<SandboxSession> {
        let idx = self.creates.fetch_add(1, Ordering::SeqCst);
        self.snapshots.lock().unwrap().push(request.use_snapshot);
        self.envs.lock().unwrap().push(request.env.clone());
        if idx < self.create_failures {
            return Err(PipelineError::provider(
                format!("HTTP {}: create failed", self.create_status),
                Some(self.create_status),
            ));
        }
        Ok(SandboxSession {
            id: format!("sbx-{idx}"),
            created_at: Utc::now(),
        })
    }

    async fn exec(
        &self,
        _session_id: &str,
        command: &str,
        timeout: Option<Duration>,
    ) -> PipelineResult<ExecOutput> {
        self.commands
            .lock()
            .unwrap()
            .push((command.to_string(), timeout));
        (self.exec_fn)(command)
    }

    fn supports_native_upload(&self) -> bool {
        self.native_upload
    }

    async fn upload_file(&self, _session_id: &str, path: &str, bytes: Vec<u8>) -> PipelineResult<()> {
        self.uploads.lock().unwrap().push((path.to_string(), bytes.len()));
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> PipelineResult<()> {
        self.deleted.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}
