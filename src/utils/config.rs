// Centralized configuration for the Aula backend

/// Platform owner — always treated as an admin regardless of the role
/// field on the user document
pub const OWNER_EMAIL: &str = "owner@aula.academy";

/// OAuth token lifetime requested from Google (seconds)
pub const TOKEN_TTL_SECS: u64 = 3600;

/// Refresh the cached access token this many seconds before expiry
pub const TOKEN_REFRESH_BUFFER_SECS: u64 = 60;

/// Page size for Firestore collection listing
pub const LIST_PAGE_SIZE: usize = 300;

/// Document path builders for every collection the backend touches.
/// Paths are relative to the Firestore database root.
pub mod paths {
    pub fn user(uid: &str) -> String {
        format!("users/{}", uid)
    }

    pub fn course_access(uid: &str, course_id: &str) -> String {
        format!("users/{}/courseAccess/{}", uid, course_id)
    }

    pub fn progress(uid: &str, course_id: &str) -> String {
        format!("users/{}/progress/{}", uid, course_id)
    }

    pub fn premium_link(link_id: &str) -> String {
        format!("premiumLinks/{}", link_id)
    }

    pub fn course(course_id: &str) -> String {
        format!("courses/{}", course_id)
    }

    pub fn lesson(course_id: &str, lesson_id: &str) -> String {
        format!("courses/{}/lessons/{}", course_id, lesson_id)
    }

    pub fn reaction(course_id: &str, lesson_id: &str, uid: &str) -> String {
        format!("{}/reactions/{}", lesson(course_id, lesson_id), uid)
    }

    pub fn comment(course_id: &str, lesson_id: &str, comment_id: &str) -> String {
        format!("{}/comments/{}", lesson(course_id, lesson_id), comment_id)
    }

    pub fn comment_like(course_id: &str, lesson_id: &str, comment_id: &str, uid: &str) -> String {
        format!("{}/likes/{}", comment(course_id, lesson_id, comment_id), uid)
    }

    pub fn reply(course_id: &str, lesson_id: &str, comment_id: &str, reply_id: &str) -> String {
        format!("{}/replies/{}", comment(course_id, lesson_id, comment_id), reply_id)
    }

    pub fn audit_log(id: &str) -> String {
        format!("auditLogs/{}", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_nest_under_lesson() {
        assert_eq!(
            paths::reaction("c1", "l1", "u1"),
            "courses/c1/lessons/l1/reactions/u1"
        );
        assert_eq!(
            paths::comment_like("c1", "l1", "m1", "u1"),
            "courses/c1/lessons/l1/comments/m1/likes/u1"
        );
    }
}
