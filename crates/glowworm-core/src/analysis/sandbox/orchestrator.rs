//! Sandbox orchestration: provision, transfer, deploy, execute, collect,
//! tear down.
//!
//! Only provisioning is retried. Every stage after provisioning runs inside
//! a session that is torn down before [`SandboxOrchestrator::analyze_in_sandbox`]
//! returns, whether the stages succeeded or not.

use super::provisioning::ProvisionRetry;
use super::provider::{ExecOutput, SandboxProvider, SandboxSession, SessionRequest};
use super::resources::{parse_resource_usage, RESOURCE_COMMAND};
use super::script::{self, RESULT_FILE, RESULT_SENTINEL, SCRIPT_FILE, WORK_DIR};
use crate::analysis::policy::{execution_timeout, timeout_disabled};
use crate::analysis::tags::synthesize_tags;
use crate::config::SandboxConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{
    AnalysisResult, Complexity, EnhancedAnalysisResult, MediaDescriptor, MediaKind,
    ProcessingMethod, ResourceUsage,
};
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Limit for setup, transfer and teardown commands.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Limit for a fresh dependency install.
const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

/// Runtime tuning forwarded into the session by complexity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceProfile {
    pub node_options: &'static str,
    pub processing_args: &'static str,
    pub concurrency: u32,
    pub batch_size: u32,
}

pub fn performance_profile(complexity: Complexity) -> PerformanceProfile {
    match complexity {
        Complexity::Simple => PerformanceProfile {
            node_options: "--max-old-space-size=2048",
            processing_args: "--memory-pressure-off",
            concurrency: 1,
            batch_size: 10,
        },
        Complexity::Medium => PerformanceProfile {
            node_options: "--max-old-space-size=4096",
            processing_args: "--memory-pressure-off --max_old_space_size=4096",
            concurrency: 2,
            batch_size: 25,
        },
        Complexity::Complex => PerformanceProfile {
            node_options: "--max-old-space-size=8192",
            processing_args: "--memory-pressure-off --max_old_space_size=8192 --disable-dev-shm-usage",
            concurrency: 3,
            batch_size: 50,
        },
        Complexity::Enterprise => PerformanceProfile {
            node_options: "--max-old-space-size=16384",
            processing_args:
                "--memory-pressure-off --max_old_space_size=16384 --disable-dev-shm-usage --no-sandbox",
            concurrency: 5,
            batch_size: 100,
        },
    }
}

/// Processing type reported to the in-session script.
pub fn processing_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image",
        MediaKind::Video => "video",
        MediaKind::Audio => "audio",
        MediaKind::Other => "document",
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "upload.bin".to_string()
    } else {
        safe
    }
}

/// Find the last sentinel line in command output and parse its payload.
pub fn parse_sentinel(output: &str) -> Option<Value> {
    output
        .lines()
        .rev()
        .filter_map(|line| line.trim().strip_prefix(RESULT_SENTINEL))
        .find_map(|payload| serde_json::from_str(payload.trim()).ok())
}

/// Where the script's result payload was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultSource {
    File,
    Sentinel,
    Stub,
}

/// Everything known about the file when a session is provisioned.
struct Job<'a> {
    descriptor: &'a MediaDescriptor,
    kind: MediaKind,
    complexity: Complexity,
    safe_name: String,
    file_id: String,
    user_id: &'a str,
}

/// Optional analysis fields a sandbox script may return under `aiAnalysis`.
#[derive(Debug, Default, Deserialize)]
struct ScriptAnalysis {
    description: Option<String>,
    objects: Option<Vec<String>>,
    colors: Option<Vec<String>>,
    mood: Option<String>,
    confidence: Option<f32>,
}

struct KindDefaults {
    description: &'static str,
    objects: &'static [&'static str],
    mood: &'static str,
    confidence: f32,
    base_tags: &'static [&'static str],
}

fn kind_defaults(kind: MediaKind) -> KindDefaults {
    match kind {
        MediaKind::Image => KindDefaults {
            description: "Image processed in sandbox",
            objects: &[],
            mood: "neutral",
            confidence: 0.8,
            base_tags: &[],
        },
        MediaKind::Video => KindDefaults {
            description: "Video processed in sandbox",
            objects: &["video", "motion"],
            mood: "dynamic",
            confidence: 0.7,
            base_tags: &["video", "motion"],
        },
        MediaKind::Audio => KindDefaults {
            description: "Audio processed in sandbox",
            objects: &["audio", "sound"],
            mood: "neutral",
            confidence: 0.7,
            base_tags: &["audio", "sound"],
        },
        MediaKind::Other => KindDefaults {
            description: "Document processed in sandbox",
            objects: &["document"],
            mood: "neutral",
            confidence: 0.5,
            base_tags: &["document"],
        },
    }
}

/// Build the analysis for a sandbox payload, defaulting absent fields by kind.
fn sandbox_analysis(kind: MediaKind, payload: &Value) -> AnalysisResult {
    let reported: ScriptAnalysis = payload
        .get("aiAnalysis")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let defaults = kind_defaults(kind);

    let mut analysis = AnalysisResult {
        description: reported
            .description
            .unwrap_or_else(|| defaults.description.to_string()),
        objects: reported
            .objects
            .unwrap_or_else(|| defaults.objects.iter().map(|s| s.to_string()).collect()),
        colors: reported.colors.unwrap_or_default(),
        mood: reported.mood.unwrap_or_else(|| defaults.mood.to_string()),
        confidence: reported
            .confidence
            .unwrap_or(defaults.confidence)
            .clamp(0.0, 1.0),
        tags: Vec::new(),
    };
    analysis.tags = synthesize_tags(&analysis, defaults.base_tags);
    analysis
}

/// Runs one file's analysis inside an ephemeral sandbox session.
pub struct SandboxOrchestrator {
    provider: Arc<dyn SandboxProvider>,
    config: SandboxConfig,
}

impl SandboxOrchestrator {
    pub fn new(provider: Arc<dyn SandboxProvider>, config: SandboxConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Analyze one file in a fresh session.
    ///
    /// Errors from any stage propagate after teardown; the caller decides
    /// on fallback.
    pub async fn analyze_in_sandbox(
        &self,
        bytes: &[u8],
        descriptor: &MediaDescriptor,
        complexity: Complexity,
        user_id: &str,
    ) -> PipelineResult<EnhancedAnalysisResult> {
        let start = Instant::now();
        let kind = descriptor.kind();
        let job = Job {
            descriptor,
            kind,
            complexity,
            safe_name: sanitize_file_name(&descriptor.name),
            file_id: format!(
                "{}_{}",
                &processing_type(kind)[..3],
                Utc::now().timestamp_millis()
            ),
            user_id,
        };

        let (session, use_snapshot) = self.provision(&job).await?;
        tracing::info!(
            session = %session.id,
            provider = self.provider.name(),
            snapshot = use_snapshot,
            "Sandbox session ready"
        );

        let outcome = self.run(&session, &job, bytes, use_snapshot).await;
        self.teardown(&session).await;
        let (payload, resource_usage) = outcome?;

        Ok(EnhancedAnalysisResult {
            analysis: sandbox_analysis(kind, &payload),
            processing_method: ProcessingMethod::Sandbox,
            processing_time: start.elapsed().as_millis() as u64,
            complexity,
            sandbox_id: Some(session.id),
            resource_usage: Some(resource_usage),
        })
    }

    fn session_env(&self, job: &Job<'_>, attempt: u32, use_snapshot: bool) -> BTreeMap<String, String> {
        let profile = performance_profile(job.complexity);
        let mut env = BTreeMap::new();
        let mut set = |key: &str, value: String| {
            env.insert(key.to_string(), value);
        };

        set("PROCESSING_TYPE", processing_type(job.kind).to_string());
        set("FILE_SIZE", job.descriptor.byte_size.to_string());
        set("MIME_TYPE", job.descriptor.mime_type.clone());
        set("COMPLEXITY", job.complexity.to_string());
        set("FILE_ID", job.file_id.clone());
        set("FILE_NAME", job.safe_name.clone());
        set("USER_ID", job.user_id.to_string());
        set("AI_PROVIDER", self.config.ai_provider.clone());
        set("MODEL_TYPE", self.config.model.clone());
        set(
            "TIMEOUT_DISABLED",
            timeout_disabled(job.kind, job.complexity).to_string(),
        );
        set("USE_SNAPSHOT", use_snapshot.to_string());
        set("NODE_OPTIONS", profile.node_options.to_string());
        set("PROCESSING_ARGS", profile.processing_args.to_string());
        set("CONCURRENCY", profile.concurrency.to_string());
        set("BATCH_SIZE", profile.batch_size.to_string());
        set("OPTIMIZATION_LEVEL", job.complexity.to_string());
        set("CREATED_AT", Utc::now().to_rfc3339());
        set("ATTEMPT_NUMBER", attempt.to_string());

        for name in &self.config.forward_env {
            if let Ok(value) = std::env::var(name) {
                if !value.is_empty() {
                    set(name.as_str(), value);
                }
            }
        }
        env
    }

    /// Create a session, retrying transient failures with exponential backoff.
    async fn provision(&self, job: &Job<'_>) -> PipelineResult<(SandboxSession, bool)> {
        let retry = ProvisionRetry::from_config(&self.config);
        let attempts = retry.attempts;
        let mut last_error = None;
        let mut made = 0;

        for attempt in 1..=attempts {
            made = attempt;
            // Retries always start from a fresh environment
            let use_snapshot = self.config.use_snapshot
                && attempt == 1
                && matches!(job.kind, MediaKind::Image | MediaKind::Video);

            let request = SessionRequest {
                env: self.session_env(job, attempt, use_snapshot),
                use_snapshot,
            };

            tracing::debug!(attempt, attempts, "Provisioning sandbox session");
            let e = match self.provider.create_session(&request).await {
                Ok(session) => return Ok((session, use_snapshot)),
                Err(e) => e,
            };
            tracing::warn!(attempt, attempts, "Sandbox provisioning failed: {e}");
            let retryable = retry.should_retry(&e);
            last_error = Some(e);
            if !retryable {
                break;
            }
            if let Some(delay) = retry.delay_after(attempt) {
                tracing::debug!("Retrying provisioning in {delay:?}");
                tokio::time::sleep(delay).await;
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        Err(PipelineError::sandbox(
            "provision",
            format!("gave up after {made} attempt(s): {reason}"),
        ))
    }

    async fn run(
        &self,
        session: &SandboxSession,
        job: &Job<'_>,
        bytes: &[u8],
        use_snapshot: bool,
    ) -> PipelineResult<(Value, ResourceUsage)> {
        let id = session.id.as_str();

        self.prepare_runtime(id, use_snapshot).await?;
        self.transfer(id, bytes, &job.safe_name).await?;

        tracing::debug!(session = id, "Deploying analysis script");
        self.exec_checked(id, "deploy", &script::deploy_command(), COMMAND_TIMEOUT)
            .await?;

        let timeout = execution_timeout(job.kind, job.complexity);
        tracing::debug!(session = id, ?timeout, "Executing analysis script");
        let execution = self
            .provider
            .exec(id, &format!("cd {WORK_DIR} && node {SCRIPT_FILE}"), timeout)
            .await?;

        let (payload, source) = self.collect_result(id, job.kind, &execution).await;
        if let Some(error) = payload.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(PipelineError::sandbox("execute", message));
        }
        if !execution.success() && source == ResultSource::Stub {
            return Err(PipelineError::sandbox(
                "execute",
                format!("script exited with {}: {}", execution.exit_code, tail(&execution.output)),
            ));
        }

        let resource_usage = self.sample_resources(id).await;
        Ok((payload, resource_usage))
    }

    async fn exec_checked(
        &self,
        session_id: &str,
        stage: &str,
        command: &str,
        timeout: Duration,
    ) -> PipelineResult<ExecOutput> {
        let out = self.provider.exec(session_id, command, Some(timeout)).await?;
        if !out.success() {
            return Err(PipelineError::sandbox(
                stage,
                format!("exit code {}: {}", out.exit_code, tail(&out.output)),
            ));
        }
        Ok(out)
    }

    async fn prepare_runtime(&self, session_id: &str, use_snapshot: bool) -> PipelineResult<()> {
        if use_snapshot {
            let check = self
                .provider
                .exec(session_id, "node --version && npm --version", Some(COMMAND_TIMEOUT))
                .await?;
            if !check.output.contains("command not found") {
                tracing::debug!(session = session_id, versions = %check.output.trim(), "Snapshot runtime verified");
                return Ok(());
            }
            tracing::warn!(session = session_id, "Snapshot lacks Node.js, installing fresh runtime");
        }

        self.exec_checked(
            session_id,
            "setup",
            &format!("mkdir -p {WORK_DIR} && cd {WORK_DIR} && npm init -y"),
            COMMAND_TIMEOUT,
        )
        .await?;
        self.exec_checked(
            session_id,
            "setup",
            &format!("cd {WORK_DIR} && {}", script::FRESH_INSTALL),
            INSTALL_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn transfer(&self, session_id: &str, bytes: &[u8], safe_name: &str) -> PipelineResult<()> {
        let target = format!("{WORK_DIR}/{safe_name}");
        self.exec_checked(session_id, "transfer", &format!("mkdir -p {WORK_DIR}"), COMMAND_TIMEOUT)
            .await?;

        if self.provider.supports_native_upload() {
            tracing::debug!(session = session_id, bytes = bytes.len(), "Uploading file");
            return self
                .provider
                .upload_file(session_id, &target, bytes.to_vec())
                .await
                .map_err(|e| PipelineError::sandbox("transfer", e.to_string()));
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let buffer = format!("{target}.b64");
        let chunk_size = self.config.upload_chunk_size.max(1);
        tracing::debug!(
            session = session_id,
            chunks = encoded.len().div_ceil(chunk_size),
            "Transferring file as base64 chunks"
        );

        self.exec_checked(session_id, "transfer", &format!("touch {buffer}"), COMMAND_TIMEOUT)
            .await?;
        // base64 output is ASCII, so byte slicing never splits a character
        for chunk in encoded.as_bytes().chunks(chunk_size) {
            let chunk = String::from_utf8_lossy(chunk);
            self.exec_checked(
                session_id,
                "transfer",
                &format!("echo -n \"{chunk}\" >> {buffer}"),
                COMMAND_TIMEOUT,
            )
            .await?;
        }
        self.exec_checked(
            session_id,
            "transfer",
            &format!("base64 -d {buffer} > {target} && rm {buffer}"),
            COMMAND_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Result file first, then the sentinel line, then a generic stub.
    async fn collect_result(
        &self,
        session_id: &str,
        kind: MediaKind,
        execution: &ExecOutput,
    ) -> (Value, ResultSource) {
        match self
            .provider
            .exec(session_id, &format!("cat {RESULT_FILE}"), Some(COMMAND_TIMEOUT))
            .await
        {
            Ok(out) if out.success() => match serde_json::from_str(out.output.trim()) {
                Ok(value) => return (value, ResultSource::File),
                Err(e) => tracing::debug!("Result file is not JSON: {e}"),
            },
            Ok(out) => tracing::debug!(exit_code = out.exit_code, "No result file"),
            Err(e) => tracing::debug!("Reading result file failed: {e}"),
        }

        if let Some(value) = parse_sentinel(&execution.output) {
            return (value, ResultSource::Sentinel);
        }

        tracing::warn!(session = session_id, "Sandbox produced no structured result");
        let stub = json!({
            "type": processing_type(kind),
            "status": "completed",
            "message": "Processing completed successfully",
        });
        (stub, ResultSource::Stub)
    }

    async fn sample_resources(&self, session_id: &str) -> ResourceUsage {
        match self
            .provider
            .exec(session_id, RESOURCE_COMMAND, Some(COMMAND_TIMEOUT))
            .await
        {
            Ok(out) => parse_resource_usage(&out.output),
            Err(e) => {
                tracing::debug!("Resource sampling failed: {e}");
                ResourceUsage::unknown()
            }
        }
    }

    /// Kill leftover processes, remove temp files and delete the session.
    /// Failures are logged only.
    async fn teardown(&self, session: &SandboxSession) {
        let id = session.id.as_str();
        for command in [
            "pkill -f node || true".to_string(),
            "pkill -f ffmpeg || true".to_string(),
            format!("rm -rf {WORK_DIR} || true"),
        ] {
            if let Err(e) = self.provider.exec(id, &command, Some(COMMAND_TIMEOUT)).await {
                tracing::warn!(session = id, "Teardown command failed: {e}");
            }
        }

        match self.provider.delete_session(id).await {
            Ok(()) => tracing::info!(
                session = id,
                lifetime_ms = (Utc::now() - session.created_at).num_milliseconds(),
                "Sandbox session deleted"
            ),
            Err(e) => tracing::warn!(session = id, "Failed to delete sandbox session: {e}"),
        }
    }
}

/// Last few hundred characters of command output, for error messages.
fn tail(output: &str) -> &str {
    let trimmed = output.trim_end();
    let start = trimmed.len().saturating_sub(300);
    let start = (start..trimmed.len())
        .find(|i| trimmed.is_char_boundary(*i))
        .unwrap_or(trimmed.len());
    &trimmed[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sandbox::mock::{exit, ok, MockSandbox};

    const RESULT: &str =
        r#"{"type":"image","aiAnalysis":{"description":"A cat on a sofa","objects":["cat","sofa"],"confidence":0.9}}"#;
    const TOP: &str = "Mem:  2000  500  1500\n%Cpu(s):  7.5 us,  1.0 sy\n/dev/root  30G  10G  20G  34% /\n";

    fn config() -> SandboxConfig {
        SandboxConfig {
            retry_base_delay_ms: 1,
            ..SandboxConfig::default()
        }
    }

    fn orchestrator(mock: Arc<MockSandbox>, config: SandboxConfig) -> SandboxOrchestrator {
        SandboxOrchestrator::new(mock, config)
    }

    fn standard_exec(cmd: &str) -> PipelineResult<ExecOutput> {
        if cmd.starts_with("node --version") {
            ok("v20.11.0\n10.2.4\n")
        } else if cmd == format!("cat {RESULT_FILE}") {
            ok(RESULT)
        } else if cmd == RESOURCE_COMMAND {
            ok(TOP)
        } else {
            ok("")
        }
    }

    fn png() -> MediaDescriptor {
        MediaDescriptor::new("my cat (1).png", 12, "image/png")
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my cat (1).png"), "my_cat__1_.png");
        assert_eq!(sanitize_file_name("../etc;rm -rf"), ".._etc_rm_-rf");
        assert_eq!(sanitize_file_name(""), "upload.bin");
    }

    #[test]
    fn test_parse_sentinel_takes_last_valid_line() {
        let out = format!("starting\n{RESULT_SENTINEL}{{\"a\":1}}\nnoise\n{RESULT_SENTINEL}{{\"a\":2}}\n");
        assert_eq!(parse_sentinel(&out), Some(json!({"a": 2})));
        assert_eq!(parse_sentinel("no payload here"), None);
    }

    #[test]
    fn test_sandbox_analysis_defaults_by_kind() {
        let analysis = sandbox_analysis(MediaKind::Video, &json!({"status": "completed"}));
        assert_eq!(analysis.description, "Video processed in sandbox");
        assert_eq!(analysis.objects, vec!["video", "motion"]);
        assert_eq!(analysis.tags, vec!["video", "motion", "dynamic", "medium-confidence"]);

        let analysis = sandbox_analysis(MediaKind::Audio, &json!({}));
        assert!(analysis.colors.is_empty());
        assert_eq!(analysis.mood, "neutral");
    }

    #[tokio::test]
    async fn test_native_upload_happy_path() {
        let mock = Arc::new(MockSandbox::with_exec(standard_exec));
        let result = orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[0u8; 12], &png(), Complexity::Simple, "user-1")
            .await
            .unwrap();

        assert_eq!(result.processing_method, ProcessingMethod::Sandbox);
        assert_eq!(result.sandbox_id.as_deref(), Some("sbx-0"));
        assert_eq!(result.analysis.description, "A cat on a sofa");
        assert_eq!(result.analysis.tags, vec!["cat", "sofa", "neutral", "high-confidence"]);

        let usage = result.resource_usage.unwrap();
        assert_eq!(usage.memory, "500/2000 MB");
        assert_eq!(usage.cpu, "7.5%");
        assert_eq!(usage.storage, "10G/20G");

        let uploads = mock.uploads.lock().unwrap().clone();
        assert_eq!(uploads, vec![(format!("{WORK_DIR}/my_cat__1_.png"), 12)]);
        assert_eq!(*mock.deleted.lock().unwrap(), vec!["sbx-0".to_string()]);
        // First attempt for an image uses the snapshot, so no fresh install
        assert!(!mock.command_lines().iter().any(|c| c.contains("npm init")));
    }

    #[tokio::test]
    async fn test_execution_timeout_follows_complexity() {
        let mock = Arc::new(MockSandbox::with_exec(standard_exec));
        orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[1], &png(), Complexity::Medium, "u")
            .await
            .unwrap();
        let commands = mock.commands.lock().unwrap().clone();
        let (_, timeout) = commands
            .iter()
            .find(|(cmd, _)| cmd.ends_with(&format!("node {SCRIPT_FILE}")))
            .unwrap();
        assert_eq!(*timeout, Some(Duration::from_secs(15 * 60)));
    }

    #[tokio::test]
    async fn test_chunked_transfer_when_native_upload_unsupported() {
        let mock = Arc::new(MockSandbox::with_exec(standard_exec).without_native_upload());
        let config = SandboxConfig {
            upload_chunk_size: 4,
            ..config()
        };
        // 9 bytes -> 12 base64 characters -> 3 chunks of 4
        orchestrator(mock.clone(), config)
            .analyze_in_sandbox(&[7u8; 9], &png(), Complexity::Simple, "u")
            .await
            .unwrap();

        let commands = mock.command_lines();
        let buffer = format!("{WORK_DIR}/my_cat__1_.png.b64");
        assert!(commands.contains(&format!("touch {buffer}")));
        let appends = commands.iter().filter(|c| c.starts_with("echo -n")).count();
        assert_eq!(appends, 3);
        assert!(commands
            .iter()
            .any(|c| c.starts_with(&format!("base64 -d {buffer}")) && c.ends_with(&format!("rm {buffer}"))));
        assert!(mock.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sentinel_used_when_result_file_missing() {
        let mock = Arc::new(MockSandbox::with_exec(|cmd| {
            if cmd == format!("cat {RESULT_FILE}") {
                exit(1, "cat: no such file")
            } else if cmd.contains("node /tmp") {
                ok(&format!("log line\n{RESULT_SENTINEL}{RESULT}\n"))
            } else {
                standard_exec(cmd)
            }
        }));
        let result = orchestrator(mock, config())
            .analyze_in_sandbox(&[1], &png(), Complexity::Simple, "u")
            .await
            .unwrap();
        assert_eq!(result.analysis.description, "A cat on a sofa");
    }

    #[tokio::test]
    async fn test_generic_stub_when_no_structured_result() {
        let mock = Arc::new(MockSandbox::new());
        let video = MediaDescriptor::new("clip.mp4", 10, "video/mp4");
        let result = orchestrator(mock, config())
            .analyze_in_sandbox(&[1], &video, Complexity::Medium, "u")
            .await
            .unwrap();
        assert_eq!(result.analysis.description, "Video processed in sandbox");
        assert_eq!(result.resource_usage, Some(ResourceUsage::unknown()));
    }

    #[tokio::test]
    async fn test_script_error_fails_and_still_tears_down() {
        let mock = Arc::new(MockSandbox::with_exec(|cmd| {
            if cmd == format!("cat {RESULT_FILE}") {
                ok(r#"{"error":"sharp missing"}"#)
            } else {
                standard_exec(cmd)
            }
        }));
        let err = orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[1], &png(), Complexity::Simple, "u")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sharp missing"));
        assert_eq!(mock.deleted.lock().unwrap().len(), 1);
        assert!(mock.command_lines().contains(&"pkill -f node || true".to_string()));
    }

    #[tokio::test]
    async fn test_transfer_failure_propagates_without_retry() {
        let mock = Arc::new(MockSandbox::with_exec(|cmd| {
            if cmd.starts_with("mkdir") {
                exit(1, "read-only file system")
            } else {
                standard_exec(cmd)
            }
        }));
        let err = orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[1], &png(), Complexity::Simple, "u")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Sandbox { ref stage, .. } if stage == "transfer"));
        assert_eq!(mock.creates(), 1);
        assert_eq!(mock.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_three_failed_provisions() {
        let mock = Arc::new(MockSandbox::new().failing_creates(3, 503));
        let err = orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[1], &png(), Complexity::Simple, "u")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("3 attempt(s)"));
        assert_eq!(mock.creates(), 3);
        // Snapshot only on the first attempt
        assert_eq!(*mock.snapshots.lock().unwrap(), vec![true, false, false]);
        assert!(mock.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provision_recovers_on_second_attempt() {
        let mock = Arc::new(MockSandbox::with_exec(standard_exec).failing_creates(1, 500));
        let result = orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[1], &png(), Complexity::Simple, "u")
            .await
            .unwrap();
        assert_eq!(result.sandbox_id.as_deref(), Some("sbx-1"));
        // Second attempt is a fresh environment, so dependencies get installed
        assert!(mock.command_lines().iter().any(|c| c.contains("npm init -y")));
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let mock = Arc::new(MockSandbox::new().failing_creates(3, 401));
        orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[1], &png(), Complexity::Simple, "u")
            .await
            .unwrap_err();
        assert_eq!(mock.creates(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_without_node_installs_fresh() {
        let mock = Arc::new(MockSandbox::with_exec(|cmd| {
            if cmd.starts_with("node --version") {
                ok("bash: node: command not found")
            } else {
                standard_exec(cmd)
            }
        }));
        orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[1], &png(), Complexity::Simple, "u")
            .await
            .unwrap();
        let commands = mock.command_lines();
        assert!(commands.iter().any(|c| c.contains("npm init -y")));
        assert!(commands.iter().any(|c| c.contains(script::FRESH_INSTALL)));
    }

    #[tokio::test]
    async fn test_session_env_contents() {
        let mock = Arc::new(MockSandbox::with_exec(standard_exec));
        let video = MediaDescriptor::new("big clip.mp4", 600 * 1024 * 1024, "video/mp4");
        orchestrator(mock.clone(), config())
            .analyze_in_sandbox(&[1], &video, Complexity::Enterprise, "user-9")
            .await
            .unwrap();

        let env = mock.envs.lock().unwrap()[0].clone();
        assert_eq!(env["PROCESSING_TYPE"], "video");
        assert_eq!(env["FILE_NAME"], "big_clip.mp4");
        assert_eq!(env["USER_ID"], "user-9");
        assert_eq!(env["COMPLEXITY"], "enterprise");
        assert_eq!(env["TIMEOUT_DISABLED"], "true");
        assert_eq!(env["USE_SNAPSHOT"], "true");
        assert_eq!(env["NODE_OPTIONS"], "--max-old-space-size=16384");
        assert_eq!(env["CONCURRENCY"], "5");
        assert_eq!(env["ATTEMPT_NUMBER"], "1");
        assert!(env["FILE_ID"].starts_with("vid_"));

        let commands = mock.commands.lock().unwrap().clone();
        let (_, timeout) = commands
            .iter()
            .find(|(cmd, _)| cmd.ends_with(&format!("node {SCRIPT_FILE}")))
            .unwrap();
        assert_eq!(*timeout, None);
    }
}
