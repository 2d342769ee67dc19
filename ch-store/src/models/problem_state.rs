use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use ch_core::constants::logs;

use crate::store::LogKey;

/// Per-page scoring state written by the hosting framework. Read only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemState {
    #[serde(default)]
    pub scores: HashMap<String, f64>,
}

impl ProblemState {
    /// Recorded score for a question; missing counts as 0.
    pub fn score(&self, question: &str) -> f64 {
        self.scores.get(question).copied().unwrap_or(0.0)
    }

    /// Whether the viewer already has full credit on `question`.
    pub fn is_complete(&self, question: &str) -> bool {
        self.score(question) == 1.0
    }

    /// Log holding `username`'s state for the page at `path_info`.
    ///
    /// The first path segment is the course and is not part of the key.
    pub fn log_key(course: &str, username: &str, path_info: &[String]) -> LogKey {
        let mut parts: Vec<&str> = path_info.iter().skip(1).map(String::as_str).collect();
        parts.push(logs::PROBLEM_STATE_SUFFIX);
        LogKey::new(course, [username], parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_score_is_zero() {
        let state = ProblemState::default();
        assert_eq!(state.score("q1"), 0.0);
        assert!(!state.is_complete("q1"));
    }

    #[test]
    fn test_complete_only_at_one() {
        let mut state = ProblemState::default();
        state.scores.insert("q1".into(), 1.0);
        state.scores.insert("q2".into(), 0.5);
        assert!(state.is_complete("q1"));
        assert!(!state.is_complete("q2"));
    }

    #[test]
    fn test_log_key_skips_course_segment() {
        let path = vec!["6.101".to_string(), "week1".into(), "lab".into()];
        let key = ProblemState::log_key("6.101", "alice", &path);
        assert_eq!(key.scope, "6.101");
        assert_eq!(key.path, vec!["alice".to_string()]);
        assert_eq!(key.key, "week1.lab.problemstate");
    }

    #[test]
    fn test_tolerates_extra_fields() {
        let state: ProblemState =
            serde_json::from_str(r#"{"scores": {"q": 1}, "last_submit": {}}"#).unwrap();
        assert!(state.is_complete("q"));
    }
}
