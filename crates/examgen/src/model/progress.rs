//! Local progress model for the generation timeline.
//!
//! The backend may or may not include structured stage data with a status
//! response. Both arms are explicit: callers match on [`Progress`] instead
//! of probing for field presence.

use serde::{Deserialize, Serialize};

/// Ordered steps shown while an exam is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStep {
    ExtractingText,
    WritingQuestions,
    Formatting,
    GeneratingPdf,
}

impl GenerationStep {
    pub const ALL: [GenerationStep; 4] = [
        GenerationStep::ExtractingText,
        GenerationStep::WritingQuestions,
        GenerationStep::Formatting,
        GenerationStep::GeneratingPdf,
    ];

    pub fn index(&self) -> usize {
        match self {
            GenerationStep::ExtractingText => 0,
            GenerationStep::WritingQuestions => 1,
            GenerationStep::Formatting => 2,
            GenerationStep::GeneratingPdf => 3,
        }
    }

    pub fn last() -> GenerationStep {
        GenerationStep::GeneratingPdf
    }

    /// The next step, saturating at the last one. Used for the heuristic
    /// advance when the backend supplies no structured progress.
    pub fn next(&self) -> GenerationStep {
        Self::ALL
            .get(self.index() + 1)
            .copied()
            .unwrap_or(GenerationStep::GeneratingPdf)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GenerationStep::ExtractingText => "Extracting text",
            GenerationStep::WritingQuestions => "Writing questions",
            GenerationStep::Formatting => "Formatting",
            GenerationStep::GeneratingPdf => "Generating PDF",
        }
    }
}

/// Fixed stage-name to step table. Unknown stages return `None` and the
/// caller falls back to the heuristic counter.
pub fn step_for_stage(stage: &str) -> Option<GenerationStep> {
    match stage.to_ascii_lowercase().as_str() {
        "extract" | "extracting" | "extract_text" => Some(GenerationStep::ExtractingText),
        "write" | "writing" | "writing_questions" => Some(GenerationStep::WritingQuestions),
        "format" | "formatting" => Some(GenerationStep::Formatting),
        "generate" | "generating" | "rendering" => Some(GenerationStep::GeneratingPdf),
        _ => None,
    }
}

/// Backend-reported progress for a non-terminal status response.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// No structured data supplied; advance the local step heuristically.
    None,
    Structured {
        stage: String,
        current: u32,
        total: u32,
        message: String,
    },
}

/// What the poller publishes to its reporter on each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub step: GenerationStep,
    /// `current / total` when the backend reported a counter.
    pub fraction: Option<f32>,
    pub message: Option<String>,
}

/// Sink for progress updates during a poll chain.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// No-op reporter for unit tests and headless callers.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_indices_are_ordered() {
        for (i, step) in GenerationStep::ALL.iter().enumerate() {
            assert_eq!(step.index(), i);
        }
    }

    #[test]
    fn test_next_saturates_at_last_step() {
        assert_eq!(
            GenerationStep::ExtractingText.next(),
            GenerationStep::WritingQuestions
        );
        assert_eq!(GenerationStep::GeneratingPdf.next(), GenerationStep::GeneratingPdf);
    }

    #[test]
    fn test_stage_table() {
        assert_eq!(step_for_stage("extracting"), Some(GenerationStep::ExtractingText));
        assert_eq!(step_for_stage("WRITE"), Some(GenerationStep::WritingQuestions));
        assert_eq!(step_for_stage("rendering"), Some(GenerationStep::GeneratingPdf));
        assert_eq!(step_for_stage("warming_up"), None);
    }
}
