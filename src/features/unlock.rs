// Content unlock policy
// Pure functions of (now, grant time, flags, role); no store or clock access

use chrono::{DateTime, Duration, Utc};

use crate::api::auth::Principal;
use crate::models::course::{Course, Lesson, Module};
use crate::models::user::{Role, UserRecord};
use crate::utils::config::OWNER_EMAIL;

/// The one admin predicate used at every call site.
/// The platform owner is an admin regardless of the stored role.
pub fn is_admin(principal: &Principal, record: Option<&UserRecord>) -> bool {
    if principal.email.as_deref() == Some(OWNER_EMAIL) {
        return true;
    }
    record.map_or(false, |r| r.role == Role::Admin)
}

/// Everything the unlock policy needs to know about the viewer
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewerAccess {
    pub is_admin: bool,
    /// CourseAccess record exists, OR the course is free, OR admin
    pub has_full_access: bool,
    /// Grant timestamp; None for inconsistent state (resolved to locked
    /// for everyone but admins)
    pub granted_at: Option<DateTime<Utc>>,
}

impl ViewerAccess {
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            has_full_access: true,
            granted_at: None,
        }
    }
}

/// Release gate shared by module and lesson checks: unlocked iff
/// `now >= granted_at + delay_days` (boundary inclusive). A delay of 0
/// always unlocks immediately. Missing grant time resolves to locked.
fn release_reached(granted_at: Option<DateTime<Utc>>, delay_days: i64, now: DateTime<Utc>) -> bool {
    if delay_days <= 0 {
        return true;
    }
    match granted_at {
        Some(granted) => now >= granted + Duration::days(delay_days),
        None => false,
    }
}

/// Whether a module is unlocked for the viewer.
/// Precedence: admin > demo visibility > release window.
pub fn is_module_unlocked(
    course: &Course,
    module: &Module,
    viewer: &ViewerAccess,
    now: DateTime<Utc>,
) -> bool {
    if viewer.is_admin {
        return true;
    }
    if !viewer.has_full_access {
        return course.is_demo_enabled && module.is_demo;
    }
    release_reached(viewer.granted_at, module.release_delay_days, now)
}

/// Whether a lesson is viewable. Lesson delays add to the module delay,
/// they do not override it.
pub fn is_lesson_viewable(
    course: &Course,
    module: &Module,
    lesson: &Lesson,
    viewer: &ViewerAccess,
    now: DateTime<Utc>,
) -> bool {
    if viewer.is_admin {
        return true;
    }
    if !viewer.has_full_access {
        return course.is_demo_enabled && (module.is_demo || lesson.is_demo);
    }
    release_reached(
        viewer.granted_at,
        module.release_delay_days + lesson.release_delay_days,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course() -> Course {
        Course {
            title: "Course".into(),
            ..Default::default()
        }
    }

    fn module(delay: i64) -> Module {
        Module {
            id: "m1".into(),
            release_delay_days: delay,
            ..Default::default()
        }
    }

    fn lesson(delay: i64) -> Lesson {
        Lesson {
            id: "l1".into(),
            release_delay_days: delay,
            ..Default::default()
        }
    }

    fn granted(rfc3339: &str) -> Option<DateTime<Utc>> {
        Some(
            DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn full_access(granted_at: Option<DateTime<Utc>>) -> ViewerAccess {
        ViewerAccess {
            is_admin: false,
            has_full_access: true,
            granted_at,
        }
    }

    #[test]
    fn test_unlock_boundary_is_inclusive() {
        let viewer = full_access(granted("2026-01-01T00:00:00Z"));
        let c = course();
        let m = module(7);

        // One second before the boundary: locked
        assert!(!is_module_unlocked(&c, &m, &viewer, at("2026-01-07T23:59:59Z")));
        // Exactly at the boundary: unlocked
        assert!(is_module_unlocked(&c, &m, &viewer, at("2026-01-08T00:00:00Z")));
        // After: unlocked
        assert!(is_module_unlocked(&c, &m, &viewer, at("2026-03-01T00:00:00Z")));
    }

    #[test]
    fn test_zero_delay_unlocks_immediately() {
        let viewer = full_access(granted("2026-01-01T00:00:00Z"));
        assert!(is_module_unlocked(
            &course(),
            &module(0),
            &viewer,
            at("2026-01-01T00:00:00Z")
        ));
    }

    #[test]
    fn test_lesson_delay_adds_to_module_delay() {
        let viewer = full_access(granted("2026-01-01T00:00:00Z"));
        let c = course();
        let m = module(7);
        let l = lesson(3);

        // Module alone would be open on day 7, but the lesson waits 10
        assert!(!is_lesson_viewable(&c, &m, &l, &viewer, at("2026-01-09T00:00:00Z")));
        assert!(is_lesson_viewable(&c, &m, &l, &viewer, at("2026-01-11T00:00:00Z")));
    }

    #[test]
    fn test_lesson_without_own_delay_inherits_module_delay() {
        let viewer = full_access(granted("2026-01-01T00:00:00Z"));
        let c = course();
        let m = module(7);
        let l = lesson(0);

        assert!(!is_lesson_viewable(&c, &m, &l, &viewer, at("2026-01-05T00:00:00Z")));
        assert!(is_lesson_viewable(&c, &m, &l, &viewer, at("2026-01-08T00:00:00Z")));
    }

    #[test]
    fn test_demo_visibility_ignores_time_and_access() {
        let mut c = course();
        c.is_demo_enabled = true;
        let mut m = module(30);
        let mut l = lesson(30);
        l.is_demo = true;

        let viewer = ViewerAccess::default(); // no access at all

        // Demo lesson visible despite huge delays and no grant
        assert!(is_lesson_viewable(&c, &m, &l, &viewer, at("2026-01-01T00:00:00Z")));

        // Demo module exposes its lessons too
        l.is_demo = false;
        m.is_demo = true;
        assert!(is_lesson_viewable(&c, &m, &l, &viewer, at("2026-01-01T00:00:00Z")));

        // Without the course-level switch nothing is visible
        c.is_demo_enabled = false;
        assert!(!is_lesson_viewable(&c, &m, &l, &viewer, at("2026-01-01T00:00:00Z")));
    }

    #[test]
    fn test_non_demo_locked_without_access() {
        let c = course();
        let viewer = ViewerAccess::default();
        assert!(!is_module_unlocked(&c, &module(0), &viewer, at("2026-01-01T00:00:00Z")));
    }

    #[test]
    fn test_admin_sees_everything() {
        let mut c = course();
        c.is_demo_enabled = false;
        let viewer = ViewerAccess::admin();

        // No grant timestamp and a long delay: still unlocked for admins
        assert!(is_module_unlocked(&c, &module(365), &viewer, at("2026-01-01T00:00:00Z")));
        assert!(is_lesson_viewable(
            &c,
            &module(365),
            &lesson(365),
            &viewer,
            at("2026-01-01T00:00:00Z")
        ));
    }

    #[test]
    fn test_missing_grant_time_locks_delayed_content() {
        // Inconsistent state: full access claimed but no grant timestamp.
        // Delayed content resolves to locked, zero-delay stays open.
        let viewer = full_access(None);
        let c = course();
        assert!(!is_module_unlocked(&c, &module(1), &viewer, at("2026-01-01T00:00:00Z")));
        assert!(is_module_unlocked(&c, &module(0), &viewer, at("2026-01-01T00:00:00Z")));
    }

    #[test]
    fn test_owner_email_is_admin() {
        let principal = Principal {
            uid: "u1".into(),
            email: Some(OWNER_EMAIL.into()),
            display_name: None,
            photo_url: None,
        };
        assert!(is_admin(&principal, None));

        let plain = Principal {
            uid: "u2".into(),
            email: Some("someone@example.com".into()),
            display_name: None,
            photo_url: None,
        };
        assert!(!is_admin(&plain, None));
        assert!(is_admin(
            &plain,
            Some(&UserRecord {
                role: Role::Admin,
                ..Default::default()
            })
        ));
    }
}
