//! The `glowworm classify` command: routing decisions without analysis.

use super::FormatArg;
use crate::media::mime_from_name;
use clap::Args;
use glowworm_core::analysis::policy::MethodPolicy;
use glowworm_core::analysis::sandbox::performance_profile;
use glowworm_core::analysis::{classify, execution_timeout};
use glowworm_core::output::Summarize;
use glowworm_core::{Complexity, Config, MediaDescriptor, OutputWriter, ProcessingMethod};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Files to classify
    #[arg(required_unless_present = "mime")]
    pub inputs: Vec<PathBuf>,

    /// Classify a hypothetical file with this MIME type instead
    #[arg(long, requires = "size_mb", conflicts_with = "inputs")]
    pub mime: Option<String>,

    /// Size of the hypothetical file in megabytes
    #[arg(long, requires = "mime")]
    pub size_mb: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub format: FormatArg,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Routing {
    name: String,
    mime_type: String,
    size_mb: f64,
    complexity: Complexity,
    processing_method: ProcessingMethod,
    /// `None` when the execution timeout is disabled
    timeout_secs: Option<u64>,
    node_options: &'static str,
}

impl Routing {
    fn plan(descriptor: &MediaDescriptor, policy: &MethodPolicy) -> Self {
        let complexity = classify(&descriptor.mime_type, descriptor.byte_size);
        Self {
            name: descriptor.name.clone(),
            mime_type: descriptor.mime_type.clone(),
            size_mb: descriptor.size_mb(),
            complexity,
            processing_method: policy.select_method(descriptor, complexity),
            timeout_secs: execution_timeout(descriptor.kind(), complexity).map(|t| t.as_secs()),
            node_options: performance_profile(complexity).node_options,
        }
    }
}

impl Summarize for Routing {
    fn summary(&self) -> String {
        let timeout = match self.timeout_secs {
            Some(secs) => format!("{}m timeout", secs / 60),
            None => "no timeout".to_string(),
        };
        format!(
            "{:<32} {:>10.2} MB  {:<10} {:<8} {}",
            self.name,
            self.size_mb,
            self.complexity.as_str(),
            self.processing_method.to_string(),
            timeout
        )
    }
}

pub fn execute(args: ClassifyArgs, config: &Config) -> anyhow::Result<()> {
    let descriptors = match (&args.mime, args.size_mb) {
        (Some(mime), Some(size_mb)) => {
            let bytes = (size_mb.max(0.0) * 1024.0 * 1024.0).round() as u64;
            vec![MediaDescriptor::new("(hypothetical)", bytes, mime.clone())]
        }
        _ => args
            .inputs
            .iter()
            .map(|path| -> anyhow::Result<MediaDescriptor> {
                let size = std::fs::metadata(path)?.len();
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                Ok(MediaDescriptor::new(name, size, mime_from_name(name)))
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
    };

    let routings: Vec<Routing> = descriptors
        .iter()
        .map(|d| Routing::plan(d, &config.analysis.policy))
        .collect();

    let mut writer = OutputWriter::new(std::io::stdout().lock(), args.format.into());
    writer.write_many(&routings)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_large_video_routes_to_sandbox_without_timeout() {
        let descriptor = MediaDescriptor::new("film.mp4", 600 * MB, "video/mp4");
        let routing = Routing::plan(&descriptor, &MethodPolicy::default());
        assert_eq!(routing.complexity, Complexity::Enterprise);
        assert_eq!(routing.processing_method, ProcessingMethod::Sandbox);
        assert_eq!(routing.timeout_secs, None);
        assert!(routing.summary().ends_with("no timeout"));
    }

    #[test]
    fn test_small_image_stays_local() {
        let descriptor = MediaDescriptor::new("cave.png", 3 * MB, "image/png");
        let routing = Routing::plan(&descriptor, &MethodPolicy::default());
        assert_eq!(routing.complexity, Complexity::Simple);
        assert_eq!(routing.processing_method, ProcessingMethod::Local);
        assert_eq!(routing.timeout_secs, Some(300));
        assert!(routing.summary().contains("5m timeout"));
    }
}
