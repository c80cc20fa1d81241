//! Wire request and response shapes consumed from the backend.

use serde::{Deserialize, Serialize};

use crate::model::{ExamJob, JobStatus, Progress};

/// `POST /generate` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Structured progress block inside a status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageProgress {
    pub stage: String,
    pub current: u32,
    pub total: u32,
    #[serde(default)]
    pub message: String,
}

/// `GET /status/{job_id}` response. `status` stays a string for forward
/// compatibility: unrecognized values keep the poll chain alive.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusReport {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<StageProgress>,
}

impl JobStatusReport {
    pub fn progress(&self) -> Progress {
        match &self.progress {
            Some(p) => Progress::Structured {
                stage: p.stage.clone(),
                current: p.current,
                total: p.total,
                message: p.message.clone(),
            },
            None => Progress::None,
        }
    }
}

/// `GET /answer_status/{job_id}` response: terminal `done|failed`, no
/// structured progress.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerStatusReport {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /payments/purchase-download` response: either an immediate unlock
/// confirmation or an external checkout URL.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseResponse {
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub checkout_url: Option<String>,
}

/// One entry of the authenticated `GET /jobs` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteJob {
    pub id: String,
    pub job_id: String,
    pub file_name: String,
    pub status: JobStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<RemoteJob> for ExamJob {
    fn from(remote: RemoteJob) -> Self {
        ExamJob {
            local_id: remote.id,
            remote_id: remote.job_id,
            display_name: remote.file_name,
            status: remote.status,
            created_at: remote.created_at,
            artifact_url: remote.download_url,
            exam_title: None,
            subject_label: None,
            page_count: None,
            error: remote.error,
        }
    }
}

/// `GET /jobs` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JobListResponse {
    pub jobs: Vec<RemoteJob>,
    #[serde(default)]
    pub total: u64,
}
