use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{info, instrument};

use course_core::model::{CourseId, EnrollmentId, Session, SessionId};
use course_core::{
    Clock, CourseProgressSummary, EnrichedLecture, SessionSummary, join_lecture_progress,
    summarize_course, summarize_session,
};
use storage::repository::{CourseRepository, ProgressRepository};
use storage::{Collection, Storage};

use crate::error::{AggregationError, DataWarning, or_degraded};

/// Completion view of one session for one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgressView {
    pub session_id: SessionId,
    pub enrollment_id: EnrollmentId,
    pub lectures: Vec<EnrichedLecture>,
    pub summary: SessionSummary,
    pub warnings: Vec<DataWarning>,
    pub computed_at: DateTime<Utc>,
}

impl SessionProgressView {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// One session row inside a course view, in position order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgressRow {
    pub session: Session,
    pub lectures: Vec<EnrichedLecture>,
    pub summary: SessionSummary,
}

/// Completion view of a whole course for one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressView {
    pub course_id: CourseId,
    pub enrollment_id: EnrollmentId,
    pub sessions: Vec<SessionProgressRow>,
    pub summary: CourseProgressSummary,
    pub warnings: Vec<DataWarning>,
    pub computed_at: DateTime<Utc>,
}

impl CourseProgressView {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Fetches structure and progress, then runs the join and rollups.
///
/// Lecture and session fetches are primary: their failure fails the call. A failed
/// progress fetch degrades to "no progress" with a warning.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            progress,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.progress),
        )
    }

    /// Build the completion view of one session.
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::Primary` if the session's lectures cannot be loaded.
    #[instrument(skip(self))]
    pub async fn session_progress(
        &self,
        session_id: SessionId,
        enrollment_id: EnrollmentId,
    ) -> Result<SessionProgressView, AggregationError> {
        let (lectures, progress) = futures::join!(
            self.courses.get_lectures(session_id),
            self.progress.get_progress(enrollment_id),
        );
        let lectures =
            lectures.map_err(AggregationError::primary(Collection::Lectures(session_id)))?;

        let mut warnings = Vec::new();
        let progress = or_degraded(progress, Collection::Progress(enrollment_id), &mut warnings);

        let lectures = join_lecture_progress(&lectures, &progress);
        let summary = summarize_session(&lectures);
        info!(
            lectures = summary.lecture_count,
            completed = summary.completed_lecture_count,
            degraded = !warnings.is_empty(),
            "session progress computed"
        );

        Ok(SessionProgressView {
            session_id,
            enrollment_id,
            lectures,
            summary,
            warnings,
            computed_at: self.clock.now(),
        })
    }

    /// Build the completion view of a course.
    ///
    /// Progress is fetched once for the enrollment and shared by every session; lecture
    /// fetches for all sessions run concurrently.
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::Primary` if the sessions, or any session's lectures,
    /// cannot be loaded.
    #[instrument(skip(self))]
    pub async fn course_progress(
        &self,
        course_id: CourseId,
        enrollment_id: EnrollmentId,
    ) -> Result<CourseProgressView, AggregationError> {
        let (sessions, progress) = futures::join!(
            self.courses.get_sessions(course_id),
            self.progress.get_progress(enrollment_id),
        );
        let sessions =
            sessions.map_err(AggregationError::primary(Collection::Sessions(course_id)))?;

        let mut warnings = Vec::new();
        let progress = or_degraded(progress, Collection::Progress(enrollment_id), &mut warnings);

        let courses = self.courses.as_ref();
        let lecture_sets = try_join_all(sessions.iter().map(|session| {
            let session_id = session.id;
            async move {
                courses
                    .get_lectures(session_id)
                    .await
                    .map_err(AggregationError::primary(Collection::Lectures(session_id)))
            }
        }))
        .await?;

        let sessions: Vec<SessionProgressRow> = sessions
            .into_iter()
            .zip(lecture_sets)
            .map(|(session, lectures)| {
                let lectures = join_lecture_progress(&lectures, &progress);
                let summary = summarize_session(&lectures);
                SessionProgressRow {
                    session,
                    lectures,
                    summary,
                }
            })
            .collect();

        let summaries: Vec<SessionSummary> = sessions.iter().map(|row| row.summary).collect();
        let summary = summarize_course(&summaries);
        info!(
            sessions = summary.total_sessions,
            completed = summary.completed_sessions,
            rate = summary.completion_rate,
            degraded = !warnings.is_empty(),
            "course progress computed"
        );

        Ok(CourseProgressView {
            course_id,
            enrollment_id,
            sessions,
            summary,
            warnings,
            computed_at: self.clock.now(),
        })
    }
}
