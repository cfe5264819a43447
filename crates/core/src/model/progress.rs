use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, EnrollmentId, LectureId, ProgressId, StudentId};

/// A learner's registration in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub course_id: CourseId,
    pub student_id: StudentId,
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    #[must_use]
    pub fn new(id: EnrollmentId, course_id: CourseId, student_id: StudentId) -> Self {
        Self {
            id,
            course_id,
            student_id,
            enrolled_at: None,
        }
    }
}

/// Watch/completion state of one enrollment for one lecture.
///
/// At most one record exists per (enrollment, lecture); no record means "not started".
/// `lecture_id` is not guaranteed to resolve: the lecture may have been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: ProgressId,
    pub enrollment_id: EnrollmentId,
    pub lecture_id: LectureId,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub watched_minutes: u32,
    #[serde(default)]
    pub last_watched_at: Option<DateTime<Utc>>,
}

impl Progress {
    #[must_use]
    pub fn new(
        id: ProgressId,
        enrollment_id: EnrollmentId,
        lecture_id: LectureId,
        is_completed: bool,
        watched_minutes: u32,
    ) -> Self {
        Self {
            id,
            enrollment_id,
            lecture_id,
            is_completed,
            watched_minutes,
            last_watched_at: None,
        }
    }

    #[must_use]
    pub fn watched_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_watched_at = Some(at);
        self
    }
}
