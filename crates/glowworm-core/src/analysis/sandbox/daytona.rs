//! Daytona REST client.
//!
//! Sessions are created with `POST /sandbox`, commands run through the
//! toolbox process API, files go through the toolbox multipart upload, and
//! sessions are removed with `DELETE /sandbox/{id}`.

use super::provider::{ExecOutput, SandboxProvider, SandboxSession, SessionRequest};
use crate::config::{resolve_env_var, SandboxConfig};
use crate::error::{ConfigError, PipelineError, PipelineResult};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub struct DaytonaProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    snapshot: String,
    native_upload: bool,
    request_timeout: Duration,
}

#[derive(Serialize)]
struct CreateSandbox<'a> {
    language: &'static str,
    env: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<&'a str>,
}

#[derive(Deserialize)]
struct SandboxInfo {
    id: String,
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    command: &'a str,
    /// Seconds; omitted when execution is unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponse {
    exit_code: i32,
    #[serde(default)]
    result: String,
}

impl DaytonaProvider {
    /// Build a client from configuration. Fails when the API key is absent.
    pub fn from_config(config: &SandboxConfig) -> Result<Self, ConfigError> {
        let api_key = resolve_env_var(&config.api_key).ok_or_else(|| {
            ConfigError::not_configured("sandbox", "set the DAYTONA_API_KEY env var")
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            snapshot: config.snapshot.clone(),
            native_upload: config.native_upload,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    async fn check(
        &self,
        stage: &str,
        resp: std::result::Result<reqwest::Response, reqwest::Error>,
    ) -> PipelineResult<reqwest::Response> {
        let resp = resp.map_err(|e| {
            if e.is_timeout() {
                PipelineError::Timeout {
                    stage: stage.to_string(),
                    timeout_ms: self.request_timeout.as_millis() as u64,
                }
            } else {
                PipelineError::provider(format!("Daytona {stage} request failed: {e}"), None)
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PipelineError::provider(
            format!("Daytona {stage} HTTP {status}: {body}"),
            Some(status.as_u16()),
        ))
    }
}

#[async_trait]
impl SandboxProvider for DaytonaProvider {
    fn name(&self) -> &str {
        "daytona"
    }

    async fn create_session(&self, request: &SessionRequest) -> PipelineResult<SandboxSession> {
        let body = CreateSandbox {
            language: "javascript",
            env: &request.env,
            snapshot: request.use_snapshot.then_some(self.snapshot.as_str()),
        };

        let resp = self
            .client
            .post(self.url("/sandbox"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await;
        let info: SandboxInfo = self
            .check("create", resp)
            .await?
            .json()
            .await
            .map_err(|e| PipelineError::provider(format!("Bad Daytona create response: {e}"), None))?;

        Ok(SandboxSession {
            id: info.id,
            created_at: Utc::now(),
        })
    }

    async fn exec(
        &self,
        session_id: &str,
        command: &str,
        timeout: Option<Duration>,
    ) -> PipelineResult<ExecOutput> {
        let body = ExecuteRequest {
            command,
            timeout: timeout.map(|t| t.as_secs().max(1)),
        };

        let mut builder = self
            .client
            .post(self.url(&format!("/toolbox/{session_id}/toolbox/process/execute")))
            .bearer_auth(&self.api_key)
            .json(&body);
        // The HTTP deadline covers the execution limit plus API overhead
        if let Some(limit) = timeout {
            builder = builder.timeout(limit + self.request_timeout);
        }

        let resp = builder.send().await;
        let out: ExecuteResponse = self
            .check("exec", resp)
            .await?
            .json()
            .await
            .map_err(|e| PipelineError::provider(format!("Bad Daytona exec response: {e}"), None))?;

        Ok(ExecOutput {
            exit_code: out.exit_code,
            output: out.result,
        })
    }

    fn supports_native_upload(&self) -> bool {
        self.native_upload
    }

    async fn upload_file(&self, session_id: &str, path: &str, bytes: Vec<u8>) -> PipelineResult<()> {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let resp = self
            .client
            .post(self.url(&format!("/toolbox/{session_id}/toolbox/files/upload")))
            .query(&[("path", path)])
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await;
        self.check("upload", resp).await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> PipelineResult<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/sandbox/{session_id}")))
            .query(&[("force", "true")])
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .send()
            .await;
        self.check("delete", resp).await?;
        Ok(())
    }
}
