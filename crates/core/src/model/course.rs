use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, LectureId, SessionId};
use crate::model::media::MediaRef;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// An ordered grouping of lectures within a course (a "chapter").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub course_id: CourseId,
    pub title: String,
    pub position: u32,
}

impl Session {
    #[must_use]
    pub fn new(
        id: SessionId,
        course_id: CourseId,
        title: impl Into<String>,
        position: u32,
    ) -> Self {
        Self {
            id,
            course_id,
            title: title.into(),
            position,
        }
    }
}

//
// ─── LECTURE ───────────────────────────────────────────────────────────────────
//

/// The smallest schedulable unit of course content.
///
/// Structural data only; learner state lives in `Progress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: LectureId,
    pub session_id: SessionId,
    pub title: String,
    #[serde(default)]
    pub media: Option<MediaRef>,
    /// Length in minutes. Absent durations count as zero in every sum.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub position: u32,
}

impl Lecture {
    #[must_use]
    pub fn new(
        id: LectureId,
        session_id: SessionId,
        title: impl Into<String>,
        duration_minutes: Option<u32>,
        position: u32,
    ) -> Self {
        Self {
            id,
            session_id,
            title: title.into(),
            media: None,
            duration_minutes,
            position,
        }
    }

    /// Duration with absence folded to zero.
    #[must_use]
    pub fn duration_or_zero(&self) -> u32 {
        self.duration_minutes.unwrap_or(0)
    }
}
