// Course catalog and unlock-annotated course view

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::auth::Principal;
use crate::error::AppError;
use crate::features::{access, progress, unlock};
use crate::models::course::Course;
use crate::models::progress::Progress;
use crate::routes::{load_viewer, AppState};
use crate::utils::config::paths;

/// Public catalog entry; no lesson content leaks here
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
    #[serde(rename = "isFree")]
    pub is_free: bool,
    #[serde(rename = "isDemoEnabled")]
    pub is_demo_enabled: bool,
}

/// Published courses, no auth required (marketing front end)
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let docs = state.firestore.list_collection("courses").await?;

    let mut entries = Vec::new();
    for (id, data) in docs {
        if let Ok(course) = serde_json::from_value::<Course>(data) {
            if course.status == "published" {
                entries.push(CatalogEntry {
                    id,
                    title: course.title,
                    description: course.description,
                    thumbnail_url: course.thumbnail_url,
                    is_free: course.is_free,
                    is_demo_enabled: course.is_demo_enabled,
                });
            }
        }
    }

    Ok(Json(json!({ "courses": entries })))
}

/// One course with per-module/lesson unlock state for the caller.
/// Locked lessons keep their title but drop the video URL.
pub async fn get_course(
    State(state): State<AppState>,
    principal: Principal,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let course: Course = state
        .firestore
        .get_document(&paths::course(&course_id))
        .await?
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or(AppError::NotFound("course"))?;

    let (_, admin) = load_viewer(&state, &principal).await?;
    let (grant, user_progress) = futures::try_join!(
        access::get_access(&state.firestore, &principal.uid, &course_id),
        progress::get_progress(&state.firestore, &principal.uid, &course_id),
    )?;

    let now = Utc::now();
    let viewer = viewer_access(&course, admin, grant.as_ref().and_then(|g| g.granted_at_time()), grant.is_some(), now);

    let modules: Vec<Value> = course
        .modules
        .iter()
        .map(|module| {
            let unlocked = unlock::is_module_unlocked(&course, module, &viewer, now);
            let lessons: Vec<Value> = module
                .lessons
                .iter()
                .map(|lesson| {
                    let viewable = unlock::is_lesson_viewable(&course, module, lesson, &viewer, now);
                    lesson_view(lesson, viewable, &user_progress)
                })
                .collect();
            json!({
                "id": module.id,
                "title": module.title,
                "isDemo": module.is_demo,
                "unlocked": unlocked,
                "lessons": lessons,
            })
        })
        .collect();

    let total_lessons: usize = course.modules.iter().map(|m| m.lessons.len()).sum();

    Ok(Json(json!({
        "id": course_id,
        "title": course.title,
        "description": course.description,
        "thumbnailUrl": course.thumbnail_url,
        "heroImageUrl": course.hero_image_url,
        "isFree": course.is_free,
        "hasFullAccess": viewer.has_full_access,
        "completion": user_progress.completion_ratio(total_lessons),
        "modules": modules,
    })))
}

/// Resolve the viewer's access for one course. Free courses behave as if
/// granted at request time, so zero-delay content opens immediately.
fn viewer_access(
    course: &Course,
    admin: bool,
    granted_at: Option<chrono::DateTime<Utc>>,
    has_grant: bool,
    now: chrono::DateTime<Utc>,
) -> unlock::ViewerAccess {
    let granted_at = if has_grant {
        granted_at
    } else if course.is_free {
        Some(now)
    } else {
        None
    };
    unlock::ViewerAccess {
        is_admin: admin,
        has_full_access: admin || has_grant || course.is_free,
        granted_at,
    }
}

fn lesson_view(
    lesson: &crate::models::course::Lesson,
    viewable: bool,
    user_progress: &Progress,
) -> Value {
    let mut view = json!({
        "id": lesson.id,
        "title": lesson.title,
        "description": lesson.description,
        "isDemo": lesson.is_demo,
        "viewable": viewable,
        "completed": user_progress.is_completed(&lesson.id),
    });
    if viewable {
        view["videoUrl"] = json!(lesson.video_url);
        view["complementaryMaterials"] = json!(lesson.complementary_materials);
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::course::{Lesson, Module};

    fn at(rfc3339: &str) -> chrono::DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_free_course_counts_as_full_access() {
        let course = Course {
            is_free: true,
            ..Default::default()
        };
        let now = at("2026-01-01T00:00:00Z");
        let viewer = viewer_access(&course, false, None, false, now);
        assert!(viewer.has_full_access);
        assert_eq!(viewer.granted_at, Some(now));
    }

    #[test]
    fn test_locked_lesson_drops_video_url() {
        let lesson = Lesson {
            id: "l1".into(),
            video_url: "https://cdn/v.mp4".into(),
            ..Default::default()
        };
        let view = lesson_view(&lesson, false, &Progress::default());
        assert!(view.get("videoUrl").is_none());

        let view = lesson_view(&lesson, true, &Progress::default());
        assert_eq!(view["videoUrl"], "https://cdn/v.mp4");
    }

    #[test]
    fn test_paid_course_without_grant_has_no_access() {
        let course = Course::default();
        let now = at("2026-01-01T00:00:00Z");
        let viewer = viewer_access(&course, false, None, false, now);
        assert!(!viewer.has_full_access);

        // Demo flags are the only way in
        let mut demo_course = Course {
            is_demo_enabled: true,
            ..Default::default()
        };
        let module = Module {
            is_demo: true,
            ..Default::default()
        };
        demo_course.modules.push(module.clone());
        assert!(unlock::is_module_unlocked(&demo_course, &module, &viewer, now));
    }
}
