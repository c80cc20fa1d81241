//! Client configuration.
//!
//! The backend has shipped two endpoint-naming revisions for the secondary
//! artifact download and two upload submission modes. Both are configuration
//! choices here, never guessed from responses.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a multi-file batch reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStrategy {
    /// One multipart `POST /generate` carrying all files plus configuration.
    Multipart,
    /// Sequential per-file `POST /upload` against a shared session id,
    /// followed by a configuration-bearing `POST /generate`.
    PerFileSession,
}

/// Which route revision serves the answer-key artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerDownloadRoute {
    /// `GET /download_answer/{job_id}`
    Dedicated,
    /// `GET /download/{job_id}/answer`
    Nested,
}

impl AnswerDownloadRoute {
    pub fn path(&self, job_id: &str) -> String {
        match self {
            AnswerDownloadRoute::Dedicated => format!("/download_answer/{job_id}"),
            AnswerDownloadRoute::Nested => format!("/download/{job_id}/answer"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_upload_strategy")]
    pub upload_strategy: UploadStrategy,

    #[serde(default = "default_answer_route")]
    pub answer_download_route: AnswerDownloadRoute,

    /// Aggregate size cap for one upload batch.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Hard deadline for each upload request.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wait after the remote id is assigned, before the first status check,
    /// to accommodate backend registration lag.
    #[serde(default = "default_registration_delay_ms")]
    pub registration_delay_ms: u64,

    /// Consecutive not-found status responses tolerated before the poll
    /// chain fails with `JobNotFound`.
    #[serde(default = "default_not_found_retry_limit")]
    pub not_found_retry_limit: u32,

    /// Dev/testing only: treat every job as payment-unlocked without
    /// contacting the backend. Loudly logged when enabled.
    #[serde(default)]
    pub unlock_bypass: bool,
}

fn default_base_url() -> String {
    "https://api.examfrompdf.com".to_string()
}

fn default_upload_strategy() -> UploadStrategy {
    UploadStrategy::Multipart
}

fn default_answer_route() -> AnswerDownloadRoute {
    AnswerDownloadRoute::Dedicated
}

fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_upload_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_registration_delay_ms() -> u64 {
    1500
}

fn default_not_found_retry_limit() -> u32 {
    5
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            upload_strategy: default_upload_strategy(),
            answer_download_route: default_answer_route(),
            max_upload_bytes: default_max_upload_bytes(),
            upload_timeout_secs: default_upload_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            registration_delay_ms: default_registration_delay_ms(),
            not_found_retry_limit: default_not_found_retry_limit(),
            unlock_bypass: false,
        }
    }
}

impl ClientConfig {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn registration_delay(&self) -> Duration {
        Duration::from_millis(self.registration_delay_ms)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        return Err(ConfigError::Validation {
            message: format!("base_url must be an http(s) URL, got '{}'", config.base_url),
        });
    }
    if config.max_upload_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "max_upload_bytes must be nonzero".to_string(),
        });
    }
    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "poll_interval_ms must be nonzero".to_string(),
        });
    }
    if config.upload_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "upload_timeout_secs must be nonzero".to_string(),
        });
    }
    if config.unlock_bypass {
        log::warn!("unlock_bypass is enabled: every job will appear payment-unlocked");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.examfrompdf.com");
        assert_eq!(config.upload_strategy, UploadStrategy::Multipart);
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.not_found_retry_limit, 5);
        assert!(!config.unlock_bypass);
    }

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_from_str("{}").expect("empty object uses defaults");
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_load_overrides() {
        let config = load_config_from_str(
            r#"{
                "baseUrl": "http://localhost:8080",
                "uploadStrategy": "per_file_session",
                "answerDownloadRoute": "nested",
                "pollIntervalMs": 500
            }"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.upload_strategy, UploadStrategy::PerFileSession);
        assert_eq!(config.answer_download_route, AnswerDownloadRoute::Nested);
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = load_config_from_str(r#"{"baseUrl": "ftp://example.com"}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let result = load_config_from_str(r#"{"pollIntervalMs": 0}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_answer_route_paths() {
        assert_eq!(
            AnswerDownloadRoute::Dedicated.path("job-1"),
            "/download_answer/job-1"
        );
        assert_eq!(AnswerDownloadRoute::Nested.path("job-1"), "/download/job-1/answer");
    }
}
