pub mod exam;
pub mod job;
pub mod progress;

pub use exam::{Difficulty, ExamConfig, GroupKind, QuestionGroup};
pub use job::{
    answer_key_file_name, artifact_file_name, display_name_for_batch, exam_title_for, ExamJob,
    JobStatus, EXPIRY_DAYS,
};
pub use progress::{
    step_for_stage, GenerationStep, NoopProgress, Progress, ProgressReporter, ProgressUpdate,
};
