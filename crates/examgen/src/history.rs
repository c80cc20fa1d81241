//! Job history: canonical ordered list plus persistence strategies.
//!
//! Anonymous sessions persist the list to durable local storage on every
//! mutation; authenticated sessions fetch the canonical list from the
//! backend and persist nothing locally. The [`HistoryStore`] swaps between
//! the two at login/logout time instead of branching throughout the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};

use crate::api::client::ApiClient;
use crate::api::types::JobListResponse;
use crate::error::Result;
use crate::model::{ExamJob, JobStatus};
use crate::storage::{KeyValueStore, KEY_JOB_SNAPSHOT, KEY_SELECTED_JOB};

/// Persistence backend for the job list.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fetches the canonical list, newest first.
    async fn list(&self) -> Result<Vec<ExamJob>>;
    /// Persists a snapshot of the list. Best effort; failures are logged by
    /// the implementation, never surfaced to block in-memory updates.
    fn persist(&self, jobs: &[ExamJob]);
    /// Deletes a job from the backing store.
    async fn delete(&self, job: &ExamJob) -> Result<()>;
}

/// Durable local snapshot for anonymous sessions. Every write drops expired
/// `Done` jobs so they never reappear after a reload (lazy garbage
/// collection).
pub struct LocalSnapshotRepository {
    store: Arc<dyn KeyValueStore>,
}

impl LocalSnapshotRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn retained(jobs: &[ExamJob]) -> Vec<&ExamJob> {
        let now = Utc::now();
        jobs.iter()
            .filter(|job| !(job.status == JobStatus::Done && job.is_expired_at(now)))
            .collect()
    }
}

#[async_trait]
impl JobRepository for LocalSnapshotRepository {
    async fn list(&self) -> Result<Vec<ExamJob>> {
        let Some(raw) = self.store.get(KEY_JOB_SNAPSHOT) else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<ExamJob>>(&raw) {
            Ok(jobs) => Ok(jobs),
            Err(e) => {
                // A corrupt snapshot is not worth failing a session over.
                warn!("Discarding unreadable job snapshot: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn persist(&self, jobs: &[ExamJob]) {
        let retained = Self::retained(jobs);
        let body = match serde_json::to_string(&retained) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to serialize job snapshot: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(KEY_JOB_SNAPSHOT, &body) {
            warn!("Failed to persist job snapshot: {}", e);
        }
    }

    async fn delete(&self, _job: &ExamJob) -> Result<()> {
        // Local jobs vanish with the next persisted snapshot.
        Ok(())
    }
}

/// Backend-persisted history for authenticated sessions.
pub struct RemoteRepository {
    client: Arc<ApiClient>,
}

impl RemoteRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobRepository for RemoteRepository {
    async fn list(&self) -> Result<Vec<ExamJob>> {
        let response: JobListResponse = self
            .client
            .send_json(self.client.get("/jobs"), "jobs")
            .await?;
        debug!("Fetched {} of {} backend jobs", response.jobs.len(), response.total);
        Ok(response.jobs.into_iter().map(ExamJob::from).collect())
    }

    fn persist(&self, _jobs: &[ExamJob]) {
        // The backend is the canonical store for authenticated sessions.
    }

    async fn delete(&self, job: &ExamJob) -> Result<()> {
        if job.remote_id.is_empty() {
            return Ok(());
        }
        self.client
            .send_unit(
                self.client.delete(&format!("/jobs/{}", job.remote_id)),
                "delete job",
            )
            .await
    }
}

/// Canonical in-memory job list with selection state.
///
/// Owns the ordered list (newest first). Pollers and transports only ever
/// produce updated job copies that are merged back by `local_id`; updates
/// may arrive in any order across jobs.
pub struct HistoryStore {
    jobs: Vec<ExamJob>,
    repository: Arc<dyn JobRepository>,
    store: Arc<dyn KeyValueStore>,
    /// Remote id to select as soon as a list fetch surfaces it; used by the
    /// payment-callback flow where only the remote id is known.
    pending_remote_select: Option<String>,
}

impl HistoryStore {
    pub fn new(repository: Arc<dyn JobRepository>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            jobs: Vec::new(),
            repository,
            store,
            pending_remote_select: None,
        }
    }

    pub fn jobs(&self) -> &[ExamJob] {
        &self.jobs
    }

    /// Replaces the in-memory list from the active repository, then resolves
    /// any pending remote selection against the fresh list.
    pub async fn refresh(&mut self) -> Result<()> {
        self.jobs = self.repository.list().await?;
        self.resolve_pending_select();
        Ok(())
    }

    /// Swaps the persistence strategy at a session state change. Login
    /// discards the anonymous list; logout falls back to whatever local
    /// snapshot exists.
    pub async fn switch_repository(&mut self, repository: Arc<dyn JobRepository>) -> Result<()> {
        self.repository = repository;
        self.jobs.clear();
        self.refresh().await
    }

    /// Adds a new job at the head of the list and selects it.
    pub fn create(&mut self, job: ExamJob) {
        self.set_selected(Some(&job.local_id));
        self.jobs.insert(0, job);
        self.repository.persist(&self.jobs);
    }

    /// Merges an updated copy back by `local_id`. Unknown ids are appended
    /// at the head so out-of-order arrivals are never lost.
    pub fn update(&mut self, updated: ExamJob) {
        match self.jobs.iter_mut().find(|j| j.local_id == updated.local_id) {
            Some(slot) => *slot = updated,
            None => self.jobs.insert(0, updated),
        }
        self.repository.persist(&self.jobs);
    }

    pub async fn delete(&mut self, local_id: &str) -> Result<()> {
        if let Some(position) = self.jobs.iter().position(|j| j.local_id == local_id) {
            let job = self.jobs.remove(position);
            if self.selected_id().as_deref() == Some(local_id) {
                self.set_selected(None);
            }
            self.repository.persist(&self.jobs);
            self.repository.delete(&job).await?;
        }
        Ok(())
    }

    pub fn get(&self, local_id: &str) -> Option<&ExamJob> {
        self.jobs.iter().find(|j| j.local_id == local_id)
    }

    pub fn get_by_remote_id(&self, remote_id: &str) -> Option<&ExamJob> {
        if remote_id.is_empty() {
            return None;
        }
        self.jobs.iter().find(|j| j.remote_id == remote_id)
    }

    /// The selected id survives a full reload: it lives in durable storage,
    /// separate from the list itself.
    pub fn selected_id(&self) -> Option<String> {
        self.store.get(KEY_SELECTED_JOB)
    }

    pub fn selected(&self) -> Option<&ExamJob> {
        let id = self.selected_id()?;
        self.get(&id)
    }

    pub fn set_selected(&mut self, local_id: Option<&str>) {
        let result = match local_id {
            Some(id) => self.store.set(KEY_SELECTED_JOB, id),
            None => self.store.remove(KEY_SELECTED_JOB),
        };
        if let Err(e) = result {
            warn!("Failed to persist job selection: {}", e);
        }
    }

    /// Requests selection of a remote id once it appears in a fetched list.
    /// Retried against every successful fetch until satisfied, then cleared.
    pub fn select_remote_when_available(&mut self, remote_id: &str) {
        self.pending_remote_select = Some(remote_id.to_string());
        self.resolve_pending_select();
    }

    fn resolve_pending_select(&mut self) {
        let Some(remote_id) = self.pending_remote_select.clone() else {
            return;
        };
        if let Some(job) = self.get_by_remote_id(&remote_id) {
            let local_id = job.local_id.clone();
            info!("Resolved pending selection for remote job {}", remote_id);
            self.set_selected(Some(&local_id));
            self.pending_remote_select = None;
        }
    }
}
