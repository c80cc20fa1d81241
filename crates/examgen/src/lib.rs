pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod session;
pub mod storage;

pub use api::client::ApiClient;
pub use api::download::{
    download_answer_key, download_artifact, download_exam, EnvironmentProbe, OpenEnvironment,
    SavedArtifact,
};
pub use api::payment::{CallbackAction, CheckoutReturn, Navigator, PaymentGate, PurchaseOutcome};
pub use api::poller::{poll_job, PollOptions};
pub use api::upload::{UploadFile, UploadTransport};
pub use config::{load_config, AnswerDownloadRoute, ClientConfig, UploadStrategy};
pub use error::{ApiError, ConfigError, ErrorReport, Result, StorageError};
pub use history::{HistoryStore, JobRepository, LocalSnapshotRepository, RemoteRepository};
pub use lifecycle::GenerationFlow;
pub use model::{ExamConfig, ExamJob, JobStatus, NoopProgress, ProgressReporter, ProgressUpdate};
pub use session::SessionStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
