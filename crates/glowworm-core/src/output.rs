//! Rendering of analysis, search and video records for the CLI.
//!
//! Records are written as one JSON document, as JSON Lines, or as a short
//! human-readable line per record.

use crate::recommend::Recommendation;
use crate::search::SearchHit;
use crate::types::{EnhancedAnalysisResult, ProcessingMethod};
use crate::video::VideoGeneration;
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON document (an array for batches)
    #[default]
    Json,
    /// One compact JSON object per line
    JsonLines,
    /// One human-readable line per record
    Summary,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "summary" | "text" => Ok(Self::Summary),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// One-line description of a record.
pub trait Summarize {
    fn summary(&self) -> String;
}

impl Summarize for EnhancedAnalysisResult {
    fn summary(&self) -> String {
        let place = match (&self.processing_method, &self.sandbox_id) {
            (ProcessingMethod::Sandbox, Some(id)) => format!("sandbox {id}"),
            (method, _) => method.to_string(),
        };
        format!(
            "[{} via {}, {}ms, confidence {:.2}] {} (tags: {})",
            self.complexity,
            place,
            self.processing_time,
            self.analysis.confidence,
            self.analysis.description,
            self.analysis.tags.join(", ")
        )
    }
}

impl Summarize for SearchHit {
    fn summary(&self) -> String {
        format!("{:.2}  {}  {}", self.score, self.id, self.reason)
    }
}

impl Summarize for Recommendation {
    fn summary(&self) -> String {
        format!("{:.2}  {}  {}", self.score, self.id, self.reason)
    }
}

impl Summarize for VideoGeneration {
    fn summary(&self) -> String {
        match (&self.video_url, &self.failure_reason) {
            (Some(url), _) => format!("{} {}: {}", self.id, self.state, url),
            (None, Some(reason)) => format!("{} {}: {}", self.id, self.state, reason),
            (None, None) => format!("{} {}", self.id, self.state),
        }
    }
}

/// Writes records in the chosen [`OutputFormat`].
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn write_one<T: Serialize + Summarize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?
            }
            OutputFormat::Summary => write!(self.writer, "{}", item.summary())?,
        }
        writeln!(self.writer)
    }

    /// Write a list; JSON output becomes a single array.
    pub fn write_many<T: Serialize + Summarize>(&mut self, items: &[T]) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, items).map_err(io::Error::other)?;
            return writeln!(self.writer);
        }
        items.iter().try_for_each(|item| self.write_one(item))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Aggregate counts over a batch of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total: usize,
    pub local: usize,
    pub sandbox: usize,
    /// Results that are error stubs
    pub failed: usize,
    pub total_time_ms: u64,
}

impl BatchReport {
    pub fn from_results(results: &[EnhancedAnalysisResult]) -> Self {
        results.iter().fold(Self::default(), |mut report, r| {
            report.total += 1;
            match r.processing_method {
                ProcessingMethod::Local => report.local += 1,
                ProcessingMethod::Sandbox => report.sandbox += 1,
            }
            if r.analysis.tags.iter().any(|t| t == "failed") && r.processing_time == 0 {
                report.failed += 1;
            }
            report.total_time_ms += r.processing_time;
            report
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fallback;
    use crate::types::{Complexity, MediaDescriptor};

    fn local_result() -> EnhancedAnalysisResult {
        fallback::image().into_local(Complexity::Medium, 42)
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSONL".parse::<OutputFormat>(), Ok(OutputFormat::JsonLines));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Summary));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_json_batch_is_one_array_with_camel_case_keys() {
        let mut buffer = Vec::new();
        OutputWriter::new(&mut buffer, OutputFormat::Json)
            .write_many(&[local_result(), local_result()])
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["processingMethod"], "local");
        assert_eq!(items[0]["processingTime"], 42);
        assert!(items[0].get("sandboxId").is_none());
    }

    #[test]
    fn test_jsonl_writes_one_line_per_record() {
        let mut buffer = Vec::new();
        OutputWriter::new(&mut buffer, OutputFormat::JsonLines)
            .write_many(&[local_result(), local_result(), local_result()])
            .unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 3);
        assert!(output.lines().all(|l| l.starts_with('{')));
    }

    #[test]
    fn test_summary_line_names_sandbox_session() {
        let descriptor = MediaDescriptor::new("clip.mp4", 10, "video/mp4");
        let mut result = fallback::sandbox_video(&descriptor).into_local(Complexity::Complex, 900);
        result.processing_method = ProcessingMethod::Sandbox;
        result.sandbox_id = Some("sbx-7".to_string());

        let line = result.summary();
        assert!(line.starts_with("[complex via sandbox sbx-7, 900ms"));
        assert!(line.contains("processed"));
    }

    #[test]
    fn test_batch_report_counts_stubs() {
        let mut sandboxed = local_result();
        sandboxed.processing_method = ProcessingMethod::Sandbox;
        let results = vec![local_result(), sandboxed, fallback::error_stub("broken.png")];

        let report = BatchReport::from_results(&results);
        assert_eq!(
            report,
            BatchReport {
                total: 3,
                local: 2,
                sandbox: 1,
                failed: 1,
                total_time_ms: 84,
            }
        );
    }
}
