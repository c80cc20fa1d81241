//! User-chosen generation parameters, immutable once a job is submitted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

/// One toggleable question-type group. `count` is only meaningful while the
/// group is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGroup {
    pub enabled: bool,
    pub count: u32,
}

impl QuestionGroup {
    pub fn new(enabled: bool, count: u32) -> Self {
        Self { enabled, count }
    }
}

/// Identifies one of the three question-type groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    MultipleChoice,
    ShortAnswer,
    LongForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfig {
    pub multiple_choice: QuestionGroup,
    pub short_answer: QuestionGroup,
    pub long_form: QuestionGroup,
    pub difficulty: Difficulty,
    /// Passed through verbatim to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            multiple_choice: QuestionGroup::new(true, 10),
            short_answer: QuestionGroup::new(true, 3),
            long_form: QuestionGroup::new(true, 1),
            difficulty: Difficulty::Normal,
            instructions: None,
        }
    }
}

impl ExamConfig {
    pub fn enabled_group_count(&self) -> usize {
        [&self.multiple_choice, &self.short_answer, &self.long_form]
            .iter()
            .filter(|g| g.enabled)
            .count()
    }

    fn group_mut(&mut self, kind: GroupKind) -> &mut QuestionGroup {
        match kind {
            GroupKind::MultipleChoice => &mut self.multiple_choice,
            GroupKind::ShortAnswer => &mut self.short_answer,
            GroupKind::LongForm => &mut self.long_form,
        }
    }

    /// Toggles a group. Disabling the last enabled group is a no-op: at
    /// least one group stays enabled at all times. Returns whether the
    /// state changed.
    pub fn set_group_enabled(&mut self, kind: GroupKind, enabled: bool) -> bool {
        let group = self.group_mut(kind);
        if group.enabled == enabled {
            return false;
        }
        if !enabled && self.enabled_group_count() == 1 {
            return false;
        }
        self.group_mut(kind).enabled = enabled;
        true
    }

    pub fn set_group_count(&mut self, kind: GroupKind, count: u32) {
        self.group_mut(kind).count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExamConfig::default();
        assert_eq!(config.multiple_choice.count, 10);
        assert_eq!(config.short_answer.count, 3);
        assert_eq!(config.long_form.count, 1);
        assert_eq!(config.difficulty, Difficulty::Normal);
        assert_eq!(config.enabled_group_count(), 3);
    }

    #[test]
    fn test_cannot_disable_last_group() {
        let mut config = ExamConfig::default();
        assert!(config.set_group_enabled(GroupKind::ShortAnswer, false));
        assert!(config.set_group_enabled(GroupKind::LongForm, false));
        assert_eq!(config.enabled_group_count(), 1);

        // Last enabled group: disabling must leave state unchanged.
        let before = config.clone();
        assert!(!config.set_group_enabled(GroupKind::MultipleChoice, false));
        assert_eq!(config, before);
        assert_eq!(config.enabled_group_count(), 1);
    }

    #[test]
    fn test_reenable_after_disable() {
        let mut config = ExamConfig::default();
        config.set_group_enabled(GroupKind::LongForm, false);
        assert!(config.set_group_enabled(GroupKind::LongForm, true));
        assert_eq!(config.enabled_group_count(), 3);
    }

    #[test]
    fn test_toggle_to_same_state_reports_unchanged() {
        let mut config = ExamConfig::default();
        assert!(!config.set_group_enabled(GroupKind::MultipleChoice, true));
    }

    #[test]
    fn test_serialization_shape() {
        let config = ExamConfig::default();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["multipleChoice"]["count"], 10);
        assert_eq!(value["difficulty"], "normal");
        assert!(value.get("instructions").is_none());
    }
}
