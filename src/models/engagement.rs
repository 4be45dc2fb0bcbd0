// Reaction and comment data models

use serde::{Deserialize, Serialize};

/// Reaction type on a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Dislike,
}

/// Per (lesson, user) reaction document.
/// At most one exists per user per lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: ReactionType,
}

/// Lesson comment with denormalized counters.
/// likeCount/replyCount always equal the live child-document counts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Comment {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    pub text: String,
    /// RFC3339, server-assigned
    pub timestamp: Option<String>,
    #[serde(rename = "isPinned", default)]
    pub is_pinned: bool,
    #[serde(rename = "likeCount", default)]
    pub like_count: i64,
    #[serde(rename = "replyCount", default)]
    pub reply_count: i64,
}

/// Append-only reply under a comment
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Reply {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    pub text: String,
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ReactionType::Like).unwrap(),
            serde_json::json!("like")
        );
        assert_eq!(
            serde_json::from_value::<ReactionType>(serde_json::json!("dislike")).unwrap(),
            ReactionType::Dislike
        );
    }
}
