//! Per-file orchestration: classify, pick a method, analyze, fall back.
//!
//! Provider clients are built once into [`AnalysisServices`] and handed to
//! [`MediaAnalyzer`]. Every path through [`MediaAnalyzer::analyze`] ends in
//! an [`AnalysisOutcome`]; sandbox failures degrade to local analysis.

use super::classify::classify;
use super::local::LocalAnalyzer;
use super::policy::MethodPolicy;
use super::sandbox::{DaytonaProvider, SandboxOrchestrator, SandboxProvider};
use super::{fallback, tags};
use crate::config::Config;
use crate::error::{ConfigError, PipelineError};
use crate::llm::{LlmProvider, LlmProviderFactory};
use crate::types::{
    AnalysisOutcome, Complexity, EnhancedAnalysisResult, MediaDescriptor, MediaFile, MediaKind,
    ProcessingMethod,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Provider clients shared by all analyses.
#[derive(Clone)]
pub struct AnalysisServices {
    pub llm: Arc<dyn LlmProvider>,
    /// `None` when the sandbox is disabled or has no credentials
    pub sandbox: Option<Arc<dyn SandboxProvider>>,
}

impl AnalysisServices {
    /// Build every client from a validated config.
    ///
    /// The completion provider is required. The sandbox is optional: a
    /// missing key only disables it.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let llm = LlmProviderFactory::create(
            &config.llm,
            Duration::from_millis(config.limits.llm_timeout_ms),
        )?;

        let sandbox = if !config.sandbox.enabled {
            tracing::info!("Sandbox disabled in config; all analysis runs locally");
            None
        } else {
            match DaytonaProvider::from_config(&config.sandbox) {
                Ok(provider) => Some(Arc::new(provider) as Arc<dyn SandboxProvider>),
                Err(e) => {
                    tracing::warn!("Sandbox unavailable, sandbox-routed files will fall back: {e}");
                    None
                }
            }
        };

        Ok(Self { llm, sandbox })
    }
}

/// Analyzes single files according to the method policy.
pub struct MediaAnalyzer {
    local: LocalAnalyzer,
    sandbox: Option<SandboxOrchestrator>,
    policy: MethodPolicy,
    suggest_tags: bool,
}

impl MediaAnalyzer {
    pub fn new(services: AnalysisServices, config: &Config) -> Self {
        Self {
            local: LocalAnalyzer::new(services.llm),
            sandbox: services
                .sandbox
                .map(|provider| SandboxOrchestrator::new(provider, config.sandbox.clone())),
            policy: config.analysis.policy.clone(),
            suggest_tags: config.analysis.suggest_tags,
        }
    }

    /// Complexity and intended processing method for a file.
    pub fn plan(&self, descriptor: &MediaDescriptor) -> (Complexity, ProcessingMethod) {
        let complexity = classify(&descriptor.mime_type, descriptor.byte_size);
        (complexity, self.policy.select_method(descriptor, complexity))
    }

    /// Analyze one file.
    pub async fn analyze(&self, file: &MediaFile, user_id: &str) -> AnalysisOutcome {
        let start = Instant::now();
        let descriptor = &file.descriptor;

        if file.bytes.is_empty() {
            return AnalysisOutcome::Failed(PipelineError::InvalidInput(format!(
                "{} is empty",
                descriptor.name
            )));
        }

        let (complexity, method) = self.plan(descriptor);
        tracing::debug!(
            file = %descriptor.name,
            kind = descriptor.kind().as_str(),
            size_mb = %format!("{:.2}", descriptor.size_mb()),
            %complexity,
            %method,
            "Planned analysis"
        );

        match method {
            ProcessingMethod::Local => self.analyze_locally(file, complexity, start).await,
            ProcessingMethod::Sandbox => {
                let Some(orchestrator) = &self.sandbox else {
                    let reason = "sandbox not configured".to_string();
                    tracing::warn!(file = %descriptor.name, "{reason}, falling back to local analysis");
                    return self.fall_back(file, complexity, start, reason).await;
                };

                match orchestrator
                    .analyze_in_sandbox(&file.bytes, descriptor, complexity, user_id)
                    .await
                {
                    Ok(result) => AnalysisOutcome::Success(result),
                    Err(e) => {
                        tracing::warn!(
                            file = %descriptor.name,
                            provider = orchestrator.provider_name(),
                            "Sandbox analysis failed, falling back to local analysis: {e}"
                        );
                        self.fall_back(file, complexity, start, e.to_string()).await
                    }
                }
            }
        }
    }

    async fn analyze_locally(
        &self,
        file: &MediaFile,
        complexity: Complexity,
        start: Instant,
    ) -> AnalysisOutcome {
        let local = self.local.analyze_local(&file.bytes, &file.descriptor).await;
        let result = local
            .analysis
            .into_local(complexity, start.elapsed().as_millis() as u64);
        match local.degraded {
            None => AnalysisOutcome::Success(result),
            Some(reason) => AnalysisOutcome::Degraded(result, reason),
        }
    }

    /// Local result after the sandbox branch failed or was unavailable.
    async fn fall_back(
        &self,
        file: &MediaFile,
        complexity: Complexity,
        start: Instant,
        reason: String,
    ) -> AnalysisOutcome {
        if file.descriptor.kind() == MediaKind::Video {
            let result = fallback::sandbox_video(&file.descriptor)
                .into_local(complexity, start.elapsed().as_millis() as u64);
            return AnalysisOutcome::Degraded(result, reason);
        }

        match self.analyze_locally(file, complexity, start).await {
            AnalysisOutcome::Success(result) => AnalysisOutcome::Degraded(result, reason),
            AnalysisOutcome::Degraded(result, local_reason) => {
                AnalysisOutcome::Degraded(result, format!("{reason}; {local_reason}"))
            }
            failed => failed,
        }
    }

    /// Merge provider-suggested tags into a result, keeping first-seen order.
    ///
    /// The merged list is capped at [`tags::MAX_TAGS`]; the result's own tags
    /// come first.
    pub async fn add_suggested_tags(&self, result: &mut EnhancedAnalysisResult) {
        if !self.suggest_tags {
            return;
        }
        let suggested = self.local.suggest_tags(&result.analysis).await;
        let merged = tags::dedup_tags(
            result
                .analysis
                .tags
                .iter()
                .chain(suggested.iter())
                .map(String::as_str),
            tags::MAX_TAGS,
        );
        result.analysis.tags = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sandbox::mock::MockSandbox;
    use crate::llm::mock::MockProvider;

    const MB: u64 = 1024 * 1024;
    const REPLY: &str = r#"{"description":"A red fox","objects":["fox"],"colors":["red"],"mood":"alert","confidence":0.88,"tags":["fox","wildlife"]}"#;

    fn config() -> Config {
        let mut config = Config::default();
        config.sandbox.retry_base_delay_ms = 1;
        config
    }

    fn analyzer(llm: MockProvider, sandbox: Option<Arc<MockSandbox>>) -> MediaAnalyzer {
        let services = AnalysisServices {
            llm: Arc::new(llm),
            sandbox: sandbox.map(|s| s as Arc<dyn SandboxProvider>),
        };
        MediaAnalyzer::new(services, &config())
    }

    /// A file whose descriptor claims `byte_size` without allocating it.
    fn sized_file(name: &str, mime: &str, byte_size: u64) -> MediaFile {
        MediaFile {
            descriptor: MediaDescriptor::new(name, byte_size, mime),
            bytes: vec![0u8; 16],
        }
    }

    #[tokio::test]
    async fn test_small_png_is_simple_and_local() {
        let analyzer = analyzer(MockProvider::success(REPLY), None);
        let file = sized_file("fox.png", "image/png", 3 * MB);
        assert_eq!(
            analyzer.plan(&file.descriptor),
            (Complexity::Simple, ProcessingMethod::Local)
        );

        let result = match analyzer.analyze(&file, "u").await {
            AnalysisOutcome::Success(result) => result,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(result.processing_method, ProcessingMethod::Local);
        assert_eq!(result.analysis.description, "A red fox");
        assert!(result.sandbox_id.is_none());
    }

    #[tokio::test]
    async fn test_large_video_falls_back_after_failed_provisioning() {
        let sandbox = Arc::new(MockSandbox::new().failing_creates(3, 503));
        let llm = Arc::new(MockProvider::success(REPLY));
        let services = AnalysisServices {
            llm: llm.clone(),
            sandbox: Some(sandbox.clone()),
        };
        let analyzer = MediaAnalyzer::new(services, &config());
        let file = sized_file("launch.mp4", "video/mp4", 600 * MB);

        assert_eq!(
            analyzer.plan(&file.descriptor),
            (Complexity::Enterprise, ProcessingMethod::Sandbox)
        );

        let outcome = analyzer.analyze(&file, "u").await;
        assert!(outcome.is_degraded());
        let result = outcome.into_result().unwrap();
        assert_eq!(result.processing_method, ProcessingMethod::Local);
        assert_eq!(result.complexity, Complexity::Enterprise);
        assert_eq!(result.analysis.description, "Video file: launch.mp4");
        assert!(result.analysis.tags.ends_with(&["processed".to_string(), "analyzed".to_string()]));
        assert!(result.sandbox_id.is_none());
        assert!(result.resource_usage.is_none());
        assert_eq!(sandbox.creates(), 3);
        // Video fallback never calls the vision provider
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_sandbox_falls_back_immediately() {
        let analyzer = analyzer(MockProvider::success(REPLY), None);
        let file = sized_file("clip.mov", "video/quicktime", 10 * MB);
        match analyzer.analyze(&file, "u").await {
            AnalysisOutcome::Degraded(result, reason) => {
                assert!(reason.contains("not configured"));
                assert_eq!(result.complexity, Complexity::Medium);
            }
            other => panic!("expected degraded outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_video_sandbox_success() {
        let sandbox = Arc::new(MockSandbox::new());
        let analyzer = analyzer(MockProvider::success(REPLY), Some(sandbox.clone()));
        let file = sized_file("clip.mp4", "video/mp4", 60 * MB);
        let AnalysisOutcome::Success(result) = analyzer.analyze(&file, "u").await else {
            panic!("expected sandbox success");
        };
        assert_eq!(result.processing_method, ProcessingMethod::Sandbox);
        assert_eq!(result.sandbox_id.as_deref(), Some("sbx-0"));
        assert_eq!(sandbox.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_image_routed_to_sandbox_falls_back_to_vision() {
        let mut config = config();
        config.analysis.policy.image.enterprise = ProcessingMethod::Sandbox;
        let services = AnalysisServices {
            llm: Arc::new(MockProvider::success(REPLY)),
            sandbox: Some(Arc::new(MockSandbox::new().failing_creates(3, 401))),
        };
        let analyzer = MediaAnalyzer::new(services, &config);
        let file = sized_file("poster.png", "image/png", 150 * MB);

        let outcome = analyzer.analyze(&file, "u").await;
        assert!(outcome.is_degraded());
        assert_eq!(outcome.result().unwrap().analysis.description, "A red fox");
    }

    #[tokio::test]
    async fn test_vision_failure_is_degraded() {
        let analyzer = analyzer(MockProvider::failing(Some(500), "boom"), None);
        let outcome = analyzer.analyze(&sized_file("a.jpg", "image/jpeg", MB), "u").await;
        assert!(outcome.is_degraded());
        assert_eq!(
            outcome.result().unwrap().analysis.description,
            "Image uploaded successfully"
        );
    }

    #[tokio::test]
    async fn test_empty_file_fails() {
        let analyzer = analyzer(MockProvider::success(REPLY), None);
        let file = MediaFile::new("empty.png", "image/png", Vec::new());
        assert!(matches!(
            analyzer.analyze(&file, "u").await,
            AnalysisOutcome::Failed(PipelineError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_suggested_tags_merge_without_duplicates() {
        let llm = MockProvider::from_fn(|idx| {
            let text = if idx == 0 { REPLY } else { r#"["wildlife", "forest"]"# };
            Ok(crate::llm::LlmResponse {
                text: text.to_string(),
                model: "mock-v1".to_string(),
                tokens_used: None,
                latency_ms: 1,
            })
        });
        let analyzer = analyzer(llm, None);
        let mut result = analyzer
            .analyze(&sized_file("fox.png", "image/png", MB), "u")
            .await
            .into_result()
            .unwrap();
        analyzer.add_suggested_tags(&mut result).await;
        assert_eq!(result.analysis.tags, vec!["fox", "wildlife", "forest"]);
    }

    #[tokio::test]
    async fn test_suggested_tags_merge_is_capped() {
        let llm = MockProvider::from_fn(|idx| {
            let text = if idx == 0 {
                REPLY
            } else {
                r#"["fox","s1","s2","s2","s3","s4","s5","s6","s7","s8","s9","s10"]"#
            };
            Ok(crate::llm::LlmResponse {
                text: text.to_string(),
                model: "mock-v1".to_string(),
                tokens_used: None,
                latency_ms: 1,
            })
        });
        let analyzer = analyzer(llm, None);
        let mut result = analyzer
            .analyze(&sized_file("fox.png", "image/png", MB), "u")
            .await
            .into_result()
            .unwrap();
        analyzer.add_suggested_tags(&mut result).await;
        assert_eq!(result.analysis.tags.len(), tags::MAX_TAGS);
        assert_eq!(result.analysis.tags[0], "fox");
        assert_eq!(result.analysis.tags[1], "wildlife");
        assert_eq!(result.analysis.tags[9], "s8");
    }

    #[test]
    fn test_services_require_llm_key() {
        let mut config = Config::default();
        config.llm.openai.api_key = "${GLOWWORM_TEST_UNSET_OPENAI}".to_string();
        assert!(AnalysisServices::from_config(&config).is_err());
    }

    #[test]
    fn test_services_without_sandbox_key() {
        let mut config = Config::default();
        config.llm.openai.api_key = "sk-test".to_string();
        config.sandbox.api_key = "${GLOWWORM_TEST_UNSET_DAYTONA}".to_string();
        let services = AnalysisServices::from_config(&config).unwrap();
        assert!(services.sandbox.is_none());
    }
}
