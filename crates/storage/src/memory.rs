use async_trait::async_trait;
use course_core::model::{
    Assignment, AssignmentId, AssignmentSubmission, CourseId, Enrollment, EnrollmentId, Lecture,
    LectureId, Progress, Quiz, QuizAttempt, QuizId, Session, SessionId,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::repository::{
    AssessmentRepository, AttemptRepository, Collection, CourseRepository, EnrollmentRepository,
    ProgressRepository, StorageError,
};
use crate::snapshot::CourseSnapshot;

#[derive(Default)]
struct Tables {
    sessions: Vec<Session>,
    lectures: Vec<Lecture>,
    progress: Vec<Progress>,
    enrollments: Vec<Enrollment>,
    quizzes: Vec<Quiz>,
    assignments: Vec<Assignment>,
    attempts: Vec<QuizAttempt>,
    submissions: Vec<AssignmentSubmission>,
}

/// Simple in-memory repository for testing, demos and snapshot-backed runs.
///
/// Any collection can be marked as failing; fetching it then returns
/// `StorageError::Unavailable` until it is healed.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
    failing: Arc<Mutex<HashSet<Collection>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository pre-filled with a snapshot's records.
    #[must_use]
    pub fn from_snapshot(snapshot: CourseSnapshot) -> Self {
        let tables = Tables {
            sessions: snapshot.sessions,
            lectures: snapshot.lectures,
            progress: snapshot.progress,
            enrollments: snapshot.enrollments,
            quizzes: snapshot.quizzes,
            assignments: snapshot.assignments,
            attempts: snapshot.quiz_attempts,
            submissions: snapshot.submissions,
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    fn check(&self, collection: Collection) -> Result<(), StorageError> {
        let failing = self
            .failing
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if failing.contains(&collection) {
            return Err(StorageError::Unavailable(collection.to_string()));
        }
        Ok(())
    }

    /// Make every fetch of `collection` fail until `heal` is called.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the fault table is poisoned.
    pub fn fail(&self, collection: Collection) -> Result<(), StorageError> {
        self.failing
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .insert(collection);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the fault table is poisoned.
    pub fn heal(&self, collection: Collection) -> Result<(), StorageError> {
        self.failing
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .remove(&collection);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn insert_session(&self, session: Session) -> Result<(), StorageError> {
        self.tables()?.sessions.push(session);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn insert_lecture(&self, lecture: Lecture) -> Result<(), StorageError> {
        self.tables()?.lectures.push(lecture);
        Ok(())
    }

    /// Insert or replace the progress record for (enrollment, lecture).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn upsert_progress(&self, progress: Progress) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        tables.progress.retain(|p| {
            !(p.enrollment_id == progress.enrollment_id && p.lecture_id == progress.lecture_id)
        });
        tables.progress.push(progress);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn insert_enrollment(&self, enrollment: Enrollment) -> Result<(), StorageError> {
        self.tables()?.enrollments.push(enrollment);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn insert_quiz(&self, quiz: Quiz) -> Result<(), StorageError> {
        self.tables()?.quizzes.push(quiz);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn insert_assignment(&self, assignment: Assignment) -> Result<(), StorageError> {
        self.tables()?.assignments.push(assignment);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn insert_attempt(&self, attempt: QuizAttempt) -> Result<(), StorageError> {
        self.tables()?.attempts.push(attempt);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the table lock is poisoned.
    pub fn insert_submission(&self, submission: AssignmentSubmission) -> Result<(), StorageError> {
        self.tables()?.submissions.push(submission);
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn get_sessions(&self, course_id: CourseId) -> Result<Vec<Session>, StorageError> {
        self.check(Collection::Sessions(course_id))?;
        let mut found: Vec<Session> = self
            .tables()?
            .sessions
            .iter()
            .filter(|s| s.course_id == course_id)
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.position, s.id));
        Ok(found)
    }

    async fn get_lectures(&self, session_id: SessionId) -> Result<Vec<Lecture>, StorageError> {
        self.check(Collection::Lectures(session_id))?;
        let mut found: Vec<Lecture> = self
            .tables()?
            .lectures
            .iter()
            .filter(|l| l.session_id == session_id)
            .cloned()
            .collect();
        found.sort_by_key(|l| (l.position, l.id));
        Ok(found)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Vec<Progress>, StorageError> {
        self.check(Collection::Progress(enrollment_id))?;
        Ok(self
            .tables()?
            .progress
            .iter()
            .filter(|p| p.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn get_enrollments(&self, course_id: CourseId) -> Result<Vec<Enrollment>, StorageError> {
        self.check(Collection::Enrollments(course_id))?;
        Ok(self
            .tables()?
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryRepository {
    async fn get_quizzes(&self, lecture_id: LectureId) -> Result<Vec<Quiz>, StorageError> {
        self.check(Collection::Quizzes(lecture_id))?;
        Ok(self
            .tables()?
            .quizzes
            .iter()
            .filter(|q| q.lecture_id == lecture_id)
            .cloned()
            .collect())
    }

    async fn get_assignments(&self, course_id: CourseId) -> Result<Vec<Assignment>, StorageError> {
        self.check(Collection::Assignments(course_id))?;
        Ok(self
            .tables()?
            .assignments
            .iter()
            .filter(|a| a.course_id == course_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn get_quiz_attempts(&self, quiz_id: QuizId) -> Result<Vec<QuizAttempt>, StorageError> {
        self.check(Collection::QuizAttempts(quiz_id))?;
        Ok(self
            .tables()?
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn get_assignment_submissions(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Vec<AssignmentSubmission>, StorageError> {
        self.check(Collection::Submissions(assignment_id))?;
        Ok(self
            .tables()?
            .submissions
            .iter()
            .filter(|s| s.assignment_id == assignment_id)
            .cloned()
            .collect())
    }
}
