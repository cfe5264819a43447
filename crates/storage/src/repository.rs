use async_trait::async_trait;
use course_core::model::{
    Assignment, AssignmentId, AssignmentSubmission, CourseId, Enrollment, EnrollmentId, Lecture,
    LectureId, Progress, Quiz, QuizAttempt, QuizId, Session, SessionId,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// One fetchable collection, named by the key it is fetched with.
///
/// Used to describe what failed to load, and by the in-memory adapter to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "collection", content = "key", rename_all = "camelCase")]
pub enum Collection {
    Sessions(CourseId),
    Lectures(SessionId),
    Progress(EnrollmentId),
    Enrollments(CourseId),
    Quizzes(LectureId),
    Assignments(CourseId),
    QuizAttempts(QuizId),
    Submissions(AssignmentId),
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Sessions(id) => write!(f, "sessions of course {id}"),
            Collection::Lectures(id) => write!(f, "lectures of session {id}"),
            Collection::Progress(id) => write!(f, "progress of enrollment {id}"),
            Collection::Enrollments(id) => write!(f, "enrollments of course {id}"),
            Collection::Quizzes(id) => write!(f, "quizzes of lecture {id}"),
            Collection::Assignments(id) => write!(f, "assignments of course {id}"),
            Collection::QuizAttempts(id) => write!(f, "attempts of quiz {id}"),
            Collection::Submissions(id) => write!(f, "submissions of assignment {id}"),
        }
    }
}

/// Course structure: sessions and their lectures.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Sessions of a course, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the sessions cannot be loaded.
    async fn get_sessions(&self, course_id: CourseId) -> Result<Vec<Session>, StorageError>;

    /// Lectures of a session, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lectures cannot be loaded.
    async fn get_lectures(&self, session_id: SessionId) -> Result<Vec<Lecture>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Every progress record of an enrollment, across all sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be loaded.
    async fn get_progress(&self, enrollment_id: EnrollmentId)
    -> Result<Vec<Progress>, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the enrollments cannot be loaded.
    async fn get_enrollments(&self, course_id: CourseId) -> Result<Vec<Enrollment>, StorageError>;
}

/// Quizzes and assignments attached to the course hierarchy.
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the quizzes cannot be loaded.
    async fn get_quizzes(&self, lecture_id: LectureId) -> Result<Vec<Quiz>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the assignments cannot be loaded.
    async fn get_assignments(&self, course_id: CourseId) -> Result<Vec<Assignment>, StorageError>;
}

/// Learner attempts and submissions, fetched per quiz / assignment.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the attempts cannot be loaded.
    async fn get_quiz_attempts(&self, quiz_id: QuizId) -> Result<Vec<QuizAttempt>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the submissions cannot be loaded.
    async fn get_assignment_submissions(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Vec<AssignmentSubmission>, StorageError>;
}

/// Aggregates the fetcher contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    /// Wire every contract to the same repository value.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: CourseRepository
            + ProgressRepository
            + EnrollmentRepository
            + AssessmentRepository
            + AttemptRepository
            + Clone
            + 'static,
    {
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let enrollments: Arc<dyn EnrollmentRepository> = Arc::new(repo.clone());
        let assessments: Arc<dyn AssessmentRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            courses,
            progress,
            enrollments,
            assessments,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_display_names_the_key() {
        assert_eq!(
            Collection::QuizAttempts(QuizId::new(2)).to_string(),
            "attempts of quiz 2"
        );
        assert_eq!(
            Collection::Lectures(SessionId::new(5)).to_string(),
            "lectures of session 5"
        );
    }

    #[test]
    fn storage_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Storage>();
    }
}
