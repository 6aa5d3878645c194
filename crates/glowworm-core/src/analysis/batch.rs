//! Batch coordinator: fixed-width groups of concurrent analyses.
//!
//! Files run in groups of `batch_size`; each group's files are spawned as
//! tokio tasks and the next group starts once the whole group finished.
//! Output order always equals input order.

use super::fallback;
use super::service::MediaAnalyzer;
use crate::types::{AnalysisOutcome, EnhancedAnalysisResult, MediaFile};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;

/// Anything that can analyze one file. Implemented by [`MediaAnalyzer`].
#[async_trait]
pub trait FileAnalyzer: Send + Sync {
    async fn analyze_file(&self, file: &MediaFile, user_id: &str) -> AnalysisOutcome;
}

#[async_trait]
impl FileAnalyzer for MediaAnalyzer {
    async fn analyze_file(&self, file: &MediaFile, user_id: &str) -> AnalysisOutcome {
        self.analyze(file, user_id).await
    }
}

pub struct BatchCoordinator {
    analyzer: Arc<dyn FileAnalyzer>,
    batch_size: usize,
}

impl BatchCoordinator {
    pub fn new(analyzer: Arc<dyn FileAnalyzer>, batch_size: usize) -> Self {
        Self {
            analyzer,
            batch_size: batch_size.max(1),
        }
    }

    /// Analyze every file; a failed file becomes an error stub in place.
    pub async fn batch_analyze(
        &self,
        files: Vec<MediaFile>,
        user_id: &str,
    ) -> Vec<EnhancedAnalysisResult> {
        self.batch_analyze_with(files, user_id, |_, _| {}).await
    }

    /// Like [`batch_analyze`](Self::batch_analyze), calling `on_result`
    /// with the input index as each group completes.
    pub async fn batch_analyze_with<F>(
        &self,
        files: Vec<MediaFile>,
        user_id: &str,
        on_result: F,
    ) -> Vec<EnhancedAnalysisResult>
    where
        F: Fn(usize, &EnhancedAnalysisResult),
    {
        let total = files.len();
        let mut results = Vec::with_capacity(total);
        let mut files = files.into_iter().peekable();
        let mut group_index = 0usize;

        while files.peek().is_some() {
            let group: Vec<MediaFile> = files.by_ref().take(self.batch_size).collect();
            tracing::debug!(
                group = group_index,
                size = group.len(),
                done = results.len(),
                total,
                "Starting batch group"
            );

            let names: Vec<String> = group.iter().map(|f| f.descriptor.name.clone()).collect();
            let handles = group.into_iter().map(|file| {
                let analyzer = self.analyzer.clone();
                let user_id = user_id.to_string();
                tokio::spawn(async move { analyzer.analyze_file(&file, &user_id).await })
            });

            for (joined, name) in join_all(handles).await.into_iter().zip(names) {
                let result = match joined {
                    Ok(AnalysisOutcome::Success(result)) => result,
                    Ok(AnalysisOutcome::Degraded(result, reason)) => {
                        tracing::debug!(file = %name, "Degraded analysis: {reason}");
                        result
                    }
                    Ok(AnalysisOutcome::Failed(e)) => {
                        tracing::error!(file = %name, "Analysis failed: {e}");
                        fallback::error_stub(&name)
                    }
                    Err(e) => {
                        tracing::error!(file = %name, "Analysis task panicked: {e}");
                        fallback::error_stub(&name)
                    }
                };
                on_result(results.len(), &result);
                results.push(result);
            }
            group_index += 1;
        }

        results
    }
}
