// Progress data model
// Per (user, course): merge-updated map of completed lessons

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lesson completion map for one user and course.
/// Values are completion timestamps (RFC3339). Entries are only ever added.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Progress {
    #[serde(rename = "completedLessons", default)]
    pub completed_lessons: HashMap<String, String>,
}

impl Progress {
    pub fn is_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.contains_key(lesson_id)
    }

    /// Completed lessons out of `total`, clamped for stale maps
    pub fn completion_ratio(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (self.completed_lessons.len().min(total) as f64) / (total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_ratio() {
        let mut progress = Progress::default();
        progress
            .completed_lessons
            .insert("l1".into(), "2026-01-01T00:00:00Z".into());
        assert!((progress.completion_ratio(4) - 0.25).abs() < f64::EPSILON);
        assert_eq!(progress.completion_ratio(0), 0.0);
    }
}
