//! End-to-end generation flow: validate, record, upload, poll, finalize.
//!
//! One flow instance drives one submission at a time; every state change is
//! merged into the [`HistoryStore`] so the job list is accurate even when
//! the flow itself errors out partway.

use std::sync::Arc;

use log::{info, warn};

use crate::api::client::ApiClient;
use crate::api::poller::{poll_job, PollOptions};
use crate::api::upload::{batch_display_name, validate_batch, UploadFile, UploadTransport};
use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorReport, Result};
use crate::history::HistoryStore;
use crate::model::{exam_title_for, ExamConfig, ExamJob, JobStatus, ProgressReporter};

pub struct GenerationFlow {
    client: Arc<ApiClient>,
    config: ClientConfig,
}

impl GenerationFlow {
    pub fn new(client: Arc<ApiClient>, config: ClientConfig) -> Self {
        Self { client, config }
    }

    /// Runs a batch through the whole lifecycle and returns the finished
    /// job. The history entry is created up front and updated at every
    /// transition, including the failing ones, so an error return never
    /// leaves a stale `Queued` entry behind.
    pub async fn generate(
        &self,
        history: &mut HistoryStore,
        files: &[UploadFile],
        exam: &ExamConfig,
        reporter: &dyn ProgressReporter,
    ) -> Result<ExamJob> {
        // A batch that fails validation never becomes a history entry.
        validate_batch(files, self.config.max_upload_bytes)?;

        let mut job = ExamJob::new(&batch_display_name(files));
        let local_id = job.local_id.clone();
        info!("Starting generation for '{}'", job.display_name);
        history.create(job.clone());

        let transport = UploadTransport::new(&self.client, &self.config);
        let remote_id = match transport.submit(files, exam).await {
            Ok(id) => id,
            Err(e) => {
                self.finalize_failed(history, &local_id, &e);
                return Err(e);
            }
        };

        job.remote_id = remote_id.clone();
        job.status = JobStatus::Running;
        history.update(job.clone());

        let options = PollOptions::from_config(&self.config);
        match poll_job(&self.client, &options, &remote_id, reporter).await {
            Ok(_report) => {
                job.status = JobStatus::Done;
                job.artifact_url = Some(format!("/download/{remote_id}"));
                job.exam_title = Some(exam_title_for(&files[0].file_name));
                history.update(job.clone());
                info!("Generation finished for '{}'", job.display_name);
                Ok(job)
            }
            Err(e) => {
                self.finalize_failed(history, &local_id, &e);
                Err(e)
            }
        }
    }

    fn finalize_failed(&self, history: &mut HistoryStore, local_id: &str, error: &ApiError) {
        let report = ErrorReport::from(error);
        warn!("Generation failed: {}", report.message);
        if let Some(existing) = history.get(local_id) {
            let mut job = existing.clone();
            job.status = JobStatus::Failed;
            // Full text; readers re-split it into message and details.
            job.error = Some(error.to_string());
            history.update(job);
        }
    }
}
