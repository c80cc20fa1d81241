//! The central job entity and its lifecycle state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days after which a generated artifact is no longer downloadable.
pub const EXPIRY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

/// One user-initiated exam-generation request.
///
/// Created client-side before the backend assigns a remote id, mutated in
/// place as the id arrives and polling reports progress, finalized into
/// `Done` or `Failed`. The history store owns the canonical list; other
/// components only produce updated copies merged back by `local_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamJob {
    /// Client-generated id, stable for the lifetime of the storage entry.
    pub local_id: String,
    /// Backend-assigned id; empty until the submission is accepted.
    #[serde(default)]
    pub remote_id: String,
    /// First uploaded file name, annotated when multiple files were combined.
    pub display_name: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Backend endpoint for the primary artifact once `status` is `Done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// Populated only when `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExamJob {
    /// Creates a fresh local job for an upload batch.
    pub fn new(display_name: &str) -> Self {
        Self {
            local_id: uuid::Uuid::new_v4().to_string(),
            remote_id: String::new(),
            display_name: display_name.to_string(),
            status: JobStatus::Queued,
            created_at: Utc::now(),
            artifact_url: None,
            exam_title: None,
            subject_label: None,
            page_count: None,
            error: None,
        }
    }

    /// Whether more than [`EXPIRY_DAYS`] have elapsed since creation.
    ///
    /// Computed on read for any status, never stored. Only `Done` jobs lose
    /// their redownload affordance through this predicate; non-`Done` jobs
    /// are still displayed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::days(EXPIRY_DAYS)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// A `Done` job whose artifact can still be fetched.
    pub fn is_redownloadable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Done && !self.is_expired_at(now)
    }
}

/// Derives the job display name from an upload batch: the first file name,
/// with a count suffix when several files were combined.
pub fn display_name_for_batch(file_names: &[&str]) -> String {
    match file_names {
        [] => "Untitled".to_string(),
        [only] => (*only).to_string(),
        [first, rest @ ..] => format!("{} (+{} more)", first, rest.len()),
    }
}

/// `lecture.pdf` -> `lecture_exam.pdf` (case-insensitive extension strip).
pub fn artifact_file_name(source_name: &str) -> String {
    format!("{}_exam.pdf", strip_pdf_extension(source_name))
}

/// `lecture.pdf` -> `lecture_answer_key.pdf`.
pub fn answer_key_file_name(source_name: &str) -> String {
    format!("{}_answer_key.pdf", strip_pdf_extension(source_name))
}

/// `lecture.pdf` -> `Practice Exam: lecture`.
pub fn exam_title_for(source_name: &str) -> String {
    format!("Practice Exam: {}", strip_pdf_extension(source_name))
}

fn strip_pdf_extension(name: &str) -> &str {
    // Multibyte names can put len-4 inside a character; such names cannot
    // end in ".pdf" anyway.
    if name.len() >= 4
        && name.is_char_boundary(name.len() - 4)
        && name[name.len() - 4..].eq_ignore_ascii_case(".pdf")
    {
        &name[..name.len() - 4]
    } else {
        name
    }
}
