//! Hand-off back to the lesson browser

use reqwest::Url;
use serde::Serialize;
use serde_json::json;

use crate::lesson::LessonKey;

/// Default page the player returns to after completing a lesson.
pub const DEFAULT_PRACTICE_PAGE: &str = "../Practice/practice.html";

/// Default page that hosts a game session.
pub const DEFAULT_GAME_PAGE: &str = "game.html";

/// Instruction for the lesson browser once a session is left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NavigationSignal {
    /// Go back to the practice page with the lesson marked done
    ReturnToPractice {
        /// Lesson that was completed
        key: LessonKey,
    },
    /// Start a fresh session for the same lesson
    Retry {
        /// Lesson to replay
        key: LessonKey,
    },
}

impl NavigationSignal {
    /// Lesson the signal refers to.
    #[must_use]
    pub const fn key(&self) -> &LessonKey {
        match self {
            Self::ReturnToPractice { key } | Self::Retry { key } => key,
        }
    }

    /// Query parameters, in page order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let key = self.key();
        let last = match self {
            Self::ReturnToPractice { .. } => "done",
            Self::Retry { .. } => "lesson",
        };
        vec![
            ("class", key.class.id().to_owned()),
            ("subject", key.subject.id().to_owned()),
            (last, key.lesson.clone()),
        ]
    }

    /// URL relative to `page`, with URL-encoded parameters.
    #[must_use]
    pub fn url(&self, page: &str) -> String {
        format!("{page}?{}", encode_query(&self.query_pairs()))
    }

    /// Message posted to the hosting lesson browser.
    #[must_use]
    pub fn message(&self, page: &str) -> serde_json::Value {
        let target = match self {
            Self::ReturnToPractice { .. } => "practice",
            Self::Retry { .. } => "game",
        };
        json!({
            "type": "SH_NAVIGATE",
            "page": target,
            "url": self.url(page),
        })
    }
}

fn encode_query(pairs: &[(&'static str, String)]) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return String::new();
    };
    url.query_pairs_mut()
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
    url.query().unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::{ClassId, SubjectId};

    fn key(lesson: &str) -> LessonKey {
        LessonKey::new(ClassId::Class10, SubjectId::Math, lesson).unwrap()
    }

    #[test]
    fn return_url_marks_lesson_done() {
        let signal = NavigationSignal::ReturnToPractice { key: key("bai-1") };
        assert_eq!(
            signal.url(DEFAULT_PRACTICE_PAGE),
            "../Practice/practice.html?class=class10&subject=math&done=bai-1"
        );
    }

    #[test]
    fn retry_url_rebuilds_triple() {
        let signal = NavigationSignal::Retry { key: key("bai 2&x") };
        assert_eq!(
            signal.url(DEFAULT_GAME_PAGE),
            "game.html?class=class10&subject=math&lesson=bai+2%26x"
        );
    }

    #[test]
    fn message_shape() {
        let signal = NavigationSignal::ReturnToPractice { key: key("l1") };
        let message = signal.message(DEFAULT_PRACTICE_PAGE);
        assert_eq!(message["type"], "SH_NAVIGATE");
        assert_eq!(message["page"], "practice");
        assert_eq!(
            message["url"],
            "../Practice/practice.html?class=class10&subject=math&done=l1"
        );
    }
}
