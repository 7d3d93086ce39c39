//! Lesson catalog.
//!
//! Lessons are owned by whatever admin surface manages the course; the chat
//! core only needs each lesson's system prompt and enabled flag, looked up by
//! id at request time.

use lessonchat_common::config::LessonConfig;
use std::collections::HashMap;

/// Read-only lookup of lesson configuration by id.
pub trait LessonCatalog: Send + Sync {
    fn lesson(&self, lesson_id: i64) -> Option<LessonConfig>;
}

/// Catalog backed by the service configuration file.
pub struct ConfigLessonCatalog {
    lessons: HashMap<i64, LessonConfig>,
}

impl ConfigLessonCatalog {
    pub fn new(lessons: HashMap<i64, LessonConfig>) -> Self {
        Self { lessons }
    }
}

impl LessonCatalog for ConfigLessonCatalog {
    fn lesson(&self, lesson_id: i64) -> Option<LessonConfig> {
        self.lessons.get(&lesson_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id() {
        let mut lessons = HashMap::new();
        lessons.insert(
            42,
            LessonConfig {
                system_prompt: Some("Explain networking simply.".into()),
                ..LessonConfig::default()
            },
        );

        let catalog = ConfigLessonCatalog::new(lessons);
        assert_eq!(
            catalog.lesson(42).unwrap().system_prompt.as_deref(),
            Some("Explain networking simply.")
        );
        assert!(catalog.lesson(1).is_none());
    }
}
