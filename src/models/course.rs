// Course data model
// Modules and lessons are embedded in the course document, not separate docs

use serde::{Deserialize, Serialize};

/// Extra downloadable material attached to a lesson
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Material {
    pub title: String,
    pub url: String,
}

/// Lesson embedded in a module
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "videoUrl", default)]
    pub video_url: String,
    #[serde(rename = "isDemo", default)]
    pub is_demo: bool,
    #[serde(rename = "releaseDelayDays", default)]
    pub release_delay_days: i64,
    #[serde(rename = "complementaryMaterials", default)]
    pub complementary_materials: Vec<Material>,
}

/// Module embedded in a course
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(rename = "isDemo", default)]
    pub is_demo: bool,
    #[serde(rename = "releaseDelayDays", default)]
    pub release_delay_days: i64,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Full course document
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "thumbnailUrl", default)]
    pub thumbnail_url: String,
    #[serde(rename = "heroImageUrl")]
    pub hero_image_url: Option<String>,
    #[serde(rename = "isFree", default)]
    pub is_free: bool,
    #[serde(rename = "isDemoEnabled", default)]
    pub is_demo_enabled: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Course {
    /// Find an embedded lesson and its parent module by lesson id
    pub fn find_lesson(&self, lesson_id: &str) -> Option<(&Module, &Lesson)> {
        self.modules.iter().find_map(|m| {
            m.lessons
                .iter()
                .find(|l| l.id == lesson_id)
                .map(|l| (m, l))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_lesson_walks_modules() {
        let course = Course {
            modules: vec![
                Module {
                    id: "m1".into(),
                    lessons: vec![Lesson {
                        id: "l1".into(),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                Module {
                    id: "m2".into(),
                    lessons: vec![Lesson {
                        id: "l2".into(),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let (module, lesson) = course.find_lesson("l2").unwrap();
        assert_eq!(module.id, "m2");
        assert_eq!(lesson.id, "l2");
        assert!(course.find_lesson("l3").is_none());
    }

    #[test]
    fn test_camel_case_field_names() {
        let course: Course = serde_json::from_value(serde_json::json!({
            "title": "Intro",
            "isFree": true,
            "isDemoEnabled": true,
            "modules": [{ "id": "m1", "title": "M1", "releaseDelayDays": 7 }]
        }))
        .unwrap();
        assert!(course.is_free);
        assert_eq!(course.modules[0].release_delay_days, 7);
    }
}
