// Access ledger data model
// CourseAccess grants and the premium links that create them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user course access grant, keyed by courseId.
/// Existence of this record means full access to the course.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourseAccess {
    #[serde(rename = "courseId")]
    pub course_id: String,
    /// Server-assigned grant time, RFC3339
    #[serde(rename = "grantedAt")]
    pub granted_at: Option<String>,
    #[serde(rename = "redeemedByLink")]
    pub redeemed_by_link: Option<String>,
}

impl CourseAccess {
    /// Parse the grant timestamp, if present and well-formed
    pub fn granted_at_time(&self) -> Option<DateTime<Utc>> {
        self.granted_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Shareable premium link granting a bundle of courses.
/// `max_uses == 0` means unlimited; `uses` only ever increases.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PremiumLink {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "courseIds", default)]
    pub course_ids: Vec<String>,
    #[serde(rename = "maxUses", default)]
    pub max_uses: i64,
    #[serde(default)]
    pub uses: i64,
    #[serde(default)]
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granted_at_parses_rfc3339() {
        let access = CourseAccess {
            course_id: "c1".into(),
            granted_at: Some("2026-01-15T10:00:00Z".into()),
            redeemed_by_link: None,
        };
        let t = access.granted_at_time().unwrap();
        assert_eq!(t.to_rfc3339(), "2026-01-15T10:00:00+00:00");
    }

    #[test]
    fn test_granted_at_tolerates_garbage() {
        let access = CourseAccess {
            course_id: "c1".into(),
            granted_at: Some("not-a-time".into()),
            redeemed_by_link: None,
        };
        assert!(access.granted_at_time().is_none());
    }
}
