//! Assessment decode view
//!
//! A transient decode over an assessment turn's JSON content. Nothing here
//! is persisted; the view is reconstructed each time the turn is displayed,
//! and a failed decode means the caller falls back to literal text.

use crate::conversation::Turn;
use serde::Deserialize;

/// One aptitude puzzle as carried in an assessment turn
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentQuestion {
    /// The puzzle text
    pub question: String,
    /// Multiple choice options (may be absent)
    #[serde(default)]
    pub options: Vec<String>,
    /// Expected answer, grading-only, never rendered
    #[serde(default, rename = "correctAnswer")]
    pub correct_answer: Option<String>,
    /// Reasoning behind the answer, grading-only, never rendered
    #[serde(default)]
    pub explanation: Option<String>,
}

impl AssessmentQuestion {
    /// Decode a turn's content. `None` means render the literal text instead.
    #[must_use]
    pub fn parse(content: &str) -> Option<Self> {
        serde_json::from_str(content).ok()
    }

    /// Decode an assessment-flagged turn; `None` for other turns or bad JSON.
    #[must_use]
    pub fn from_turn(turn: &Turn) -> Option<Self> {
        if !turn.is_json_assessment {
            return None;
        }
        Self::parse(&turn.content)
    }
}

/// Label for a multiple-choice option: A, B, C, ...
#[must_use]
pub fn option_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let content = r#"{"question":"2,4,8,16,?","options":["24","32","20"],"explanation":"doubling"}"#;
        let q = AssessmentQuestion::parse(content).unwrap();
        assert_eq!(q.question, "2,4,8,16,?");
        assert_eq!(q.options, vec!["24", "32", "20"]);
        assert_eq!(q.explanation.as_deref(), Some("doubling"));
        assert_eq!(q.correct_answer, None);
    }

    #[test]
    fn test_parse_options_absent_defaults_empty() {
        let q = AssessmentQuestion::parse(r#"{"question":"Describe the pattern"}"#).unwrap();
        assert!(q.options.is_empty());
    }

    #[test]
    fn test_parse_correct_answer_rename() {
        let q = AssessmentQuestion::parse(r#"{"question":"q","correctAnswer":"32"}"#).unwrap();
        assert_eq!(q.correct_answer.as_deref(), Some("32"));
    }

    #[test]
    fn test_parse_invalid_json_is_none() {
        assert!(AssessmentQuestion::parse("The model ignored the schema").is_none());
        assert!(AssessmentQuestion::parse("").is_none());
    }

    #[test]
    fn test_from_turn_requires_flag() {
        let flagged = Turn::assistant(r#"{"question":"q"}"#).with_json_assessment();
        assert!(AssessmentQuestion::from_turn(&flagged).is_some());

        let unflagged = Turn::assistant(r#"{"question":"q"}"#);
        assert!(AssessmentQuestion::from_turn(&unflagged).is_none());
    }

    #[test]
    fn test_option_labels() {
        assert_eq!(option_label(0), 'A');
        assert_eq!(option_label(1), 'B');
        assert_eq!(option_label(2), 'C');
    }
}
