pub mod client;
pub mod download;
pub mod payment;
pub mod poller;
pub mod types;
pub mod upload;

pub use client::ApiClient;
pub use download::{
    download_answer_key, download_artifact, download_exam, filename_from_content_disposition,
    EnvironmentProbe, OpenEnvironment, SavedArtifact,
};
pub use payment::{
    CallbackAction, CheckoutHandoff, CheckoutReturn, Navigator, PaymentGate, PurchaseOutcome,
};
pub use poller::{poll_answer_status, poll_job, poll_until_terminal, PollOptions, PollVerdict};
pub use types::{
    AnswerStatusReport, GenerateResponse, JobListResponse, JobStatusReport, PurchaseResponse,
    RemoteJob, StageProgress,
};
pub use upload::{batch_display_name, validate_batch, UploadFile, UploadTransport};
