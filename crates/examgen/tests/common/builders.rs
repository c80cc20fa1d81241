//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use examgen::history::{HistoryStore, LocalSnapshotRepository};
use examgen::model::{ExamJob, JobStatus};
use examgen::storage::{KeyValueStore, MemoryStore};

/// Builder for `ExamJob` instances in arbitrary lifecycle states.
pub struct JobBuilder {
    job: ExamJob,
}

impl JobBuilder {
    pub fn new(display_name: &str) -> Self {
        Self { job: ExamJob::new(display_name) }
    }

    pub fn remote_id(mut self, id: &str) -> Self {
        self.job.remote_id = id.to_string();
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.job.status = status;
        self
    }

    /// A finished job with artifact metadata filled in.
    pub fn done(mut self, remote_id: &str) -> Self {
        self.job.remote_id = remote_id.to_string();
        self.job.status = JobStatus::Done;
        self.job.artifact_url = Some(format!("/download/{remote_id}"));
        self
    }

    /// Backdates creation so expiry predicates fire.
    pub fn aged_days(mut self, days: i64) -> Self {
        self.job.created_at = Utc::now() - Duration::days(days);
        self
    }

    pub fn error(mut self, text: &str) -> Self {
        self.job.error = Some(text.to_string());
        self
    }

    pub fn build(self) -> ExamJob {
        self.job
    }
}

/// A history store over an anonymous (local snapshot) repository, plus the
/// shared memory store so tests can reopen the same durable state.
pub fn anonymous_history() -> (Arc<MemoryStore>, HistoryStore) {
    let store = Arc::new(MemoryStore::new());
    let history = reopen_history(&store);
    (store, history)
}

/// A fresh `HistoryStore` over existing durable state, as a new session
/// would construct it.
pub fn reopen_history(store: &Arc<MemoryStore>) -> HistoryStore {
    let repo = Arc::new(LocalSnapshotRepository::new(
        store.clone() as Arc<dyn KeyValueStore>
    ));
    HistoryStore::new(repo, store.clone() as Arc<dyn KeyValueStore>)
}
