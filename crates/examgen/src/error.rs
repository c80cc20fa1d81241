use thiserror::Error;

/// Errors surfaced by the exam-generation API client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Upload batch exceeds the aggregate size cap. Carries the measured
    /// sizes when checked locally before any network call; a backend 413
    /// reports no numbers.
    #[error("{}", file_too_large_text(.size, .limit))]
    FileTooLarge {
        size: Option<u64>,
        limit: Option<u64>,
    },

    /// A file is not a PDF by declared media type or filename extension.
    #[error("Invalid file type: '{0}' is not a PDF")]
    InvalidFileType(String),

    /// A bounded network call exceeded its deadline. Carries the file name
    /// in per-file upload mode so the caller can report which file stalled.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Fetch-level failure, distinct from an HTTP error status.
    #[error("Network unreachable\n{0}")]
    NetworkUnreachable(String),

    /// 401 from an authenticated call. The stored token is cleared.
    #[error("Session expired. Please log in again.")]
    Unauthorized,

    /// 403: quota or entitlement exhausted.
    #[error("Permission denied\n{0}")]
    PermissionDenied(String),

    /// 404 for the requested endpoint or resource.
    #[error("Not found")]
    EndpointNotFound,

    /// 5xx from the backend.
    #[error("Server error ({status})\n{body}")]
    ServerFault { status: u16, body: String },

    /// Any other 4xx from the backend.
    #[error("Request rejected ({status})\n{body}")]
    RequestRejected { status: u16, body: String },

    /// The status endpoint kept returning not-found past the retry bound.
    #[error("Job not found after {attempts} status checks")]
    JobNotFound { attempts: u32 },

    /// Backend-reported business failure for a job. Not retried
    /// automatically; retry is an explicit caller action.
    #[error("Exam generation failed\n{0}")]
    JobFailed(String),

    /// Artifact fetch returned a non-success status.
    #[error("Download failed ({status})\n{body}")]
    DownloadFailed { status: u16, body: String },

    /// Purchase request or checkout handoff failed.
    #[error("Payment failed\n{0}")]
    PaymentFailed(String),

    /// Answer key generation reached a failed terminal state.
    #[error("Answer key generation failed\n{0}")]
    AnswerKeyGenerationFailed(String),

    /// Downloads are blocked inside embedded in-app browsers; no fetch is
    /// attempted when one is detected.
    #[error("Downloads are not supported in this in-app browser ({0}). Open this page in your system browser.")]
    EmbeddedBrowser(String),

    /// Local durable storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn file_too_large_text(size: &Option<u64>, limit: &Option<u64>) -> String {
    match (size, limit) {
        (Some(size), Some(limit)) => {
            format!("Files too large: {size} bytes exceeds the {limit} byte limit")
        }
        _ => "Files too large: the upload exceeds the server's size limit".to_string(),
    }
}

impl ApiError {
    /// Classifies a transport-level `reqwest` failure, preserving the
    /// original error text as the technical detail.
    pub fn from_transport(err: reqwest::Error, context: &str) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(context.to_string())
        } else {
            ApiError::NetworkUnreachable(format!("{context}: {err}"))
        }
    }
}

/// Errors from the durable key-value store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read store file '{path}': {source}")]
    ReadFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store file '{path}': {source}")]
    WriteFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("No writable profile directory available")]
    NoProfileDir,
}

/// Errors raised while loading or validating client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// User-facing rendering of a fatal error: a short message plus an optional
/// expandable technical-details block. The split point is the first line
/// break in the underlying error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    pub details: Option<String>,
}

impl ErrorReport {
    pub fn from_text(text: &str) -> Self {
        match text.split_once('\n') {
            Some((message, details)) => Self {
                message: message.trim_end().to_string(),
                details: Some(details.trim().to_string()).filter(|d| !d.is_empty()),
            },
            None => Self {
                message: text.to_string(),
                details: None,
            },
        }
    }
}

impl From<&ApiError> for ErrorReport {
    fn from(err: &ApiError) -> Self {
        Self::from_text(&err.to_string())
    }
}

/// Result type for API client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_splits_on_first_line_break() {
        let report = ErrorReport::from_text("Server error (502)\nupstream timed out\nretry later");
        assert_eq!(report.message, "Server error (502)");
        assert_eq!(report.details.as_deref(), Some("upstream timed out\nretry later"));
    }

    #[test]
    fn test_report_without_details() {
        let report = ErrorReport::from_text("Session expired. Please log in again.");
        assert_eq!(report.message, "Session expired. Please log in again.");
        assert!(report.details.is_none());
    }

    #[test]
    fn test_report_drops_empty_details() {
        let report = ErrorReport::from_text("Payment failed\n");
        assert_eq!(report.message, "Payment failed");
        assert!(report.details.is_none());
    }

    #[test]
    fn test_file_too_large_display_with_and_without_sizes() {
        let local = ApiError::FileTooLarge {
            size: Some(150),
            limit: Some(100),
        };
        assert_eq!(
            local.to_string(),
            "Files too large: 150 bytes exceeds the 100 byte limit"
        );

        let remote = ApiError::FileTooLarge { size: None, limit: None };
        assert_eq!(
            remote.to_string(),
            "Files too large: the upload exceeds the server's size limit"
        );
    }

    #[test]
    fn test_server_fault_preserves_body_as_details() {
        let err = ApiError::ServerFault {
            status: 500,
            body: "internal error".to_string(),
        };
        let report = ErrorReport::from(&err);
        assert_eq!(report.message, "Server error (500)");
        assert_eq!(report.details.as_deref(), Some("internal error"));
    }
}
