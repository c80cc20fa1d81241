//! Poll-until-terminal loop, generalized over endpoint and status shape.
//!
//! The same loop drives the primary generation status and the answer-key
//! status: callers supply a fetch closure and terminal-state predicates
//! instead of duplicating the timer logic per endpoint.

use std::future::Future;

use log::{debug, warn};

use crate::api::client::ApiClient;
use crate::api::types::{AnswerStatusReport, JobStatusReport};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::model::{step_for_stage, GenerationStep, Progress, ProgressReporter, ProgressUpdate};

#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Wait before the first fetch, covering backend registration lag.
    pub initial_delay: std::time::Duration,
    pub interval: std::time::Duration,
    /// Consecutive not-found responses tolerated before giving up.
    pub not_found_retry_limit: u32,
}

impl PollOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            initial_delay: config.registration_delay(),
            interval: config.poll_interval(),
            not_found_retry_limit: config.not_found_retry_limit,
        }
    }
}

/// What a status snapshot means for the loop.
pub enum PollVerdict {
    /// Non-terminal, or unrecognized (forward compatibility): keep polling.
    Continue,
    Done,
    Failed(Option<String>),
}

/// Polls `fetch_status` until `classify` reports a terminal state.
///
/// A not-found response (the job may not be registered yet) counts as a
/// synthetic pending tick, retried up to `not_found_retry_limit` consecutive times
/// before the chain fails with `JobNotFound`; any successful fetch resets
/// the streak. `on_tick` fires on every non-terminal tick with the snapshot
/// (`None` for synthetic pending). There is no hard deadline: cancellation
/// is the caller's responsibility.
pub async fn poll_until_terminal<S, F, Fut>(
    mut fetch_status: F,
    options: &PollOptions,
    classify: impl Fn(&S) -> PollVerdict,
    mut on_tick: impl FnMut(Option<&S>),
) -> Result<S>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S>>,
{
    tokio::time::sleep(options.initial_delay).await;

    let mut not_found_streak: u32 = 0;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match fetch_status().await {
            Ok(snapshot) => {
                not_found_streak = 0;
                match classify(&snapshot) {
                    PollVerdict::Done => return Ok(snapshot),
                    PollVerdict::Failed(text) => {
                        return Err(ApiError::JobFailed(
                            text.unwrap_or_else(|| "Job failed".to_string()),
                        ))
                    }
                    PollVerdict::Continue => on_tick(Some(&snapshot)),
                }
            }
            Err(ApiError::EndpointNotFound) => {
                not_found_streak += 1;
                if not_found_streak > options.not_found_retry_limit {
                    warn!("Status endpoint returned not-found {attempts} times, giving up");
                    return Err(ApiError::JobNotFound { attempts });
                }
                debug!("Job not registered yet (attempt {attempts}), treating as pending");
                on_tick(None);
            }
            Err(other) => return Err(other),
        }

        tokio::time::sleep(options.interval).await;
    }
}

fn verdict_for(status: &str, error: Option<&str>) -> PollVerdict {
    match status {
        "done" => PollVerdict::Done,
        "failed" => PollVerdict::Failed(error.map(|e| e.to_string())),
        // pending/queued/running and anything the backend adds later.
        _ => PollVerdict::Continue,
    }
}

/// Polls the primary generation status for `job_id`, publishing progress.
///
/// Structured backend progress is mapped through the stage table; without
/// it the local step advances one per poll, capped at the last step, purely
/// as a visual heuristic.
pub async fn poll_job(
    client: &ApiClient,
    options: &PollOptions,
    job_id: &str,
    reporter: &dyn ProgressReporter,
) -> Result<JobStatusReport> {
    let path = format!("/status/{job_id}");
    let mut tracker = StepTracker::new();

    poll_until_terminal(
        || {
            let path = path.clone();
            async move { client.send_json::<JobStatusReport>(client.get(&path), "status").await }
        },
        options,
        |report: &JobStatusReport| verdict_for(&report.status, report.error.as_deref()),
        |snapshot| match snapshot {
            Some(report) => tracker.publish(report, reporter),
            // Synthetic pending: the job is not registered yet, nothing to show.
            None => {}
        },
    )
    .await
}

/// Tracks the local generation step across status ticks.
///
/// Structured progress latches the step from the stage table (unknown stages
/// keep the last step) and publishes the backend's counter and message.
/// Without structured data the current step is published and then advanced
/// by one, capped at the last step.
struct StepTracker {
    step: GenerationStep,
}

impl StepTracker {
    fn new() -> Self {
        Self {
            step: GenerationStep::ExtractingText,
        }
    }

    fn publish(&mut self, report: &JobStatusReport, reporter: &dyn ProgressReporter) {
        match report.progress() {
            Progress::Structured {
                stage,
                current,
                total,
                message,
            } => {
                if let Some(mapped) = step_for_stage(&stage) {
                    self.step = mapped;
                }
                let fraction = if total > 0 {
                    Some(current as f32 / total as f32)
                } else {
                    None
                };
                reporter.report(ProgressUpdate {
                    step: self.step,
                    fraction,
                    message: Some(message),
                });
            }
            Progress::None => {
                reporter.report(ProgressUpdate {
                    step: self.step,
                    fraction: None,
                    message: None,
                });
                self.step = self.step.next();
            }
        }
    }
}

/// Polls the answer-key generation status: terminal `done|failed`, no
/// structured progress. A business failure surfaces as
/// `AnswerKeyGenerationFailed`.
pub async fn poll_answer_status(
    client: &ApiClient,
    options: &PollOptions,
    job_id: &str,
) -> Result<AnswerStatusReport> {
    let path = format!("/answer_status/{job_id}");
    let result = poll_until_terminal(
        || {
            let path = path.clone();
            async move {
                client
                    .send_json::<AnswerStatusReport>(client.get(&path), "answer_status")
                    .await
            }
        },
        options,
        |report: &AnswerStatusReport| verdict_for(&report.status, report.error.as_deref()),
        |_| {},
    )
    .await;

    match result {
        Err(ApiError::JobFailed(text)) => Err(ApiError::AnswerKeyGenerationFailed(text)),
        other => other,
    }
}
