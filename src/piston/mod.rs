//! Reqwest client for the Piston code execution API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::Config,
    error::{Error, Result},
    registry::RuntimeDescriptor,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub language: String,
    pub version: String,
    pub files: Vec<SourceFile>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceFile {
    pub content: String,
}

impl ExecuteRequest {
    pub fn new(runtime: &RuntimeDescriptor, code: &str) -> Self {
        Self {
            language: runtime.service_language.to_string(),
            version: runtime.service_version.to_string(),
            files: vec![SourceFile { content: code.to_string() }],
        }
    }
}

/// Response body. Every field is optional since the service fills in only
/// the layers it reached.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub compile: Option<StageResult>,
    #[serde(default)]
    pub run: Option<StageResult>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct StageResult {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub signal: Option<String>,
    /// `None` when the service omitted the field entirely.
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub output: String,
}

impl StageResult {
    pub fn failed(&self) -> bool {
        self.code.is_some_and(|c| c != 0) || self.signal.is_some()
    }

    /// stderr, else stdout, else a description of how the stage ended.
    pub fn failure_message(&self, stage: &str) -> String {
        if !self.stderr.is_empty() {
            return self.stderr.clone();
        }
        if let Some(stdout) = self.stdout.as_deref().filter(|s| !s.is_empty()) {
            return stdout.to_string();
        }
        match (&self.signal, self.code) {
            (Some(signal), _) => format!("{} terminated by {}", stage, signal),
            (None, Some(code)) => format!("{} exited with code {}", stage, code),
            (None, None) => format!("{} failed", stage),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PistonClient {
    http: Client,
    base: String,
}

impl PistonClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport("failed to build http client", e))?;
        Ok(Self { http, base: base.into() })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.piston_url(), Duration::from_secs(cfg.request_timeout_secs()))
    }

    /// Sends one execution request.
    ///
    /// The body is decoded regardless of status, since the service reports
    /// request-level problems as `{"message": ...}` on a 4xx.
    pub async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse> {
        let url = format!("{}/execute", self.base.trim_end_matches('/'));
        debug!(url = %url, language = %request.language, version = %request.version, "Piston execute");

        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::transport("failed to send execute request", e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::transport(format!("failed to read response ({})", status), e))?;

        serde_json::from_str::<ExecuteResponse>(&text)
            .map_err(|e| Error::transport(format!("malformed response ({})", status), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    #[test]
    fn request_body_shape() {
        let req = ExecuteRequest::new(registry::lookup("python").unwrap(), "print(1)");
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "language": "python",
                "version": "3.10.0",
                "files": [{ "content": "print(1)" }]
            })
        );
    }

    #[test]
    fn decodes_partial_response() {
        let resp: ExecuteResponse =
            serde_json::from_str(r#"{"run":{"code":0,"output":"hi\n"}}"#).unwrap();
        let run = resp.run.unwrap();
        assert_eq!(run.code, Some(0));
        assert_eq!(run.output, "hi\n");
        assert!(run.stdout.is_none());
        assert!(resp.compile.is_none());
        assert!(resp.message.is_none());
    }

    #[test]
    fn stage_failure_detection() {
        let killed = StageResult { code: None, signal: Some("SIGKILL".into()), ..Default::default() };
        assert!(killed.failed());
        assert_eq!(killed.failure_message("run"), "run terminated by SIGKILL");

        let ok = StageResult { code: Some(0), ..Default::default() };
        assert!(!ok.failed());

        let bad = StageResult { code: Some(2), stdout: Some("usage".into()), ..Default::default() };
        assert!(bad.failed());
        assert_eq!(bad.failure_message("run"), "usage");
    }
}
