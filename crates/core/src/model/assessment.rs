use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{
    AssignmentId, AttemptId, CourseId, EnrollmentId, LectureId, QuizId, SubmissionId,
};

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

/// A quiz attached to a lecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub lecture_id: LectureId,
    pub title: String,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub passing_score: Option<f64>,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

impl Quiz {
    #[must_use]
    pub fn new(id: QuizId, lecture_id: LectureId, title: impl Into<String>) -> Self {
        Self {
            id,
            lecture_id,
            title: title.into(),
            max_score: None,
            passing_score: None,
            time_limit_minutes: None,
        }
    }
}

/// A learner's single try at a quiz.
///
/// `score` is absent while the attempt is in progress or ungraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub enrollment_id: EnrollmentId,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl QuizAttempt {
    #[must_use]
    pub fn new(
        id: AttemptId,
        quiz_id: QuizId,
        enrollment_id: EnrollmentId,
        score: Option<f64>,
    ) -> Self {
        Self {
            id,
            quiz_id,
            enrollment_id,
            score,
            submitted_at: None,
        }
    }
}

//
// ─── ASSIGNMENTS ───────────────────────────────────────────────────────────────
//

/// A course-level assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_grade: Option<f64>,
}

impl Assignment {
    #[must_use]
    pub fn new(id: AssignmentId, course_id: CourseId, title: impl Into<String>) -> Self {
        Self {
            id,
            course_id,
            title: title.into(),
            due_at: None,
            max_grade: None,
        }
    }
}

/// A single handed-in assignment response. `grade` is absent until graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmission {
    pub id: SubmissionId,
    pub assignment_id: AssignmentId,
    pub enrollment_id: EnrollmentId,
    #[serde(default)]
    pub grade: Option<f64>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl AssignmentSubmission {
    #[must_use]
    pub fn new(
        id: SubmissionId,
        assignment_id: AssignmentId,
        enrollment_id: EnrollmentId,
        grade: Option<f64>,
    ) -> Self {
        Self {
            id,
            assignment_id,
            enrollment_id,
            grade,
            submitted_at: None,
        }
    }
}
