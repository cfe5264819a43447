use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use course_core::model::{
    Assignment, AssignmentId, CourseId, Enrollment, EnrollmentId, Lecture, LectureId, Progress,
    Quiz, QuizId, SessionId,
};
use course_core::{
    AssignmentStat, Clock, CourseAnalytics, LearnerProgress, QuizStat, assignment_stat,
    course_analytics, learner_progress, quiz_stat,
};
use storage::repository::{
    AssessmentRepository, AttemptRepository, CourseRepository, EnrollmentRepository,
    ProgressRepository,
};
use storage::{Collection, Storage, StorageError};

use crate::config::StatsConfig;
use crate::error::{AggregationError, DataWarning, or_degraded};

/// Per-quiz statistics plus the fetches that had to be defaulted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatsReport {
    pub stats: BTreeMap<QuizId, QuizStat>,
    pub warnings: Vec<DataWarning>,
}

/// Per-assignment statistics plus the fetches that had to be defaulted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStatsReport {
    pub stats: BTreeMap<AssignmentId, AssignmentStat>,
    pub warnings: Vec<DataWarning>,
}

/// Instructor dashboard data for a course.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAnalyticsReport {
    pub course_id: CourseId,
    pub analytics: CourseAnalytics,
    pub quiz_stats: BTreeMap<QuizId, QuizStat>,
    pub assignment_stats: BTreeMap<AssignmentId, AssignmentStat>,
    pub learners: Vec<LearnerProgress>,
    pub warnings: Vec<DataWarning>,
    pub computed_at: DateTime<Utc>,
}

impl CourseAnalyticsReport {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Fetches attempt/submission data per entity and folds it into statistics.
///
/// Each per-entity fetch is isolated: a failure zeroes that entity's statistic and adds
/// a warning, but never fails the call.
#[derive(Clone)]
pub struct StatisticsService {
    clock: Clock,
    config: StatsConfig,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    assessments: Arc<dyn AssessmentRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl StatisticsService {
    #[must_use]
    pub fn from_storage(clock: Clock, config: StatsConfig, storage: &Storage) -> Self {
        Self {
            clock,
            config,
            courses: Arc::clone(&storage.courses),
            progress: Arc::clone(&storage.progress),
            enrollments: Arc::clone(&storage.enrollments),
            assessments: Arc::clone(&storage.assessments),
            attempts: Arc::clone(&storage.attempts),
        }
    }

    /// Run `fetch` for every key with bounded concurrency.
    ///
    /// Results come back sorted by key, whatever order the fetches completed in.
    async fn fetch_each<K, T, F, Fut>(
        &self,
        keys: Vec<K>,
        fetch: F,
    ) -> Vec<(K, Result<T, StorageError>)>
    where
        K: Ord + Copy,
        F: Fn(K) -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let mut results: Vec<(K, Result<T, StorageError>)> = stream::iter(keys)
            .map(|key| {
                let pending = fetch(key);
                async move { (key, pending.await) }
            })
            .buffer_unordered(self.config.fetch_concurrency.max(1))
            .collect()
            .await;
        results.sort_by_key(|(key, _)| *key);
        results
    }

    /// Compute statistics for each quiz.
    ///
    /// `enrollment_count` of `None` (enrollments unknown) yields 0% completion rates.
    #[instrument(skip(self, quizzes), fields(quizzes = quizzes.len()))]
    pub async fn compute_quiz_stats(
        &self,
        quizzes: &[Quiz],
        enrollment_count: Option<u32>,
    ) -> QuizStatsReport {
        let repo = self.attempts.as_ref();
        let ids: Vec<QuizId> = quizzes.iter().map(|q| q.id).collect();
        let fetched = self
            .fetch_each(ids, |quiz_id| repo.get_quiz_attempts(quiz_id))
            .await;

        let mut report = QuizStatsReport::default();
        for (quiz_id, attempts) in fetched {
            let stat = match attempts {
                Ok(attempts) => quiz_stat(&attempts, enrollment_count),
                Err(err) => {
                    warn!(%quiz_id, error = %err, "quiz attempts unavailable, using zeroed stat");
                    report.warnings.push(DataWarning {
                        collection: Collection::QuizAttempts(quiz_id),
                        reason: err.to_string(),
                    });
                    QuizStat::default()
                }
            };
            report.stats.insert(quiz_id, stat);
        }
        report
    }

    /// Compute statistics for each assignment.
    #[instrument(skip(self, assignments), fields(assignments = assignments.len()))]
    pub async fn compute_assignment_stats(
        &self,
        assignments: &[Assignment],
    ) -> AssignmentStatsReport {
        let repo = self.attempts.as_ref();
        let ids: Vec<AssignmentId> = assignments.iter().map(|a| a.id).collect();
        let fetched = self
            .fetch_each(ids, |assignment_id| repo.get_assignment_submissions(assignment_id))
            .await;

        let mut report = AssignmentStatsReport::default();
        for (assignment_id, submissions) in fetched {
            let stat = match submissions {
                Ok(submissions) => assignment_stat(&submissions),
                Err(err) => {
                    warn!(
                        %assignment_id,
                        error = %err,
                        "submissions unavailable, using zeroed stat"
                    );
                    report.warnings.push(DataWarning {
                        collection: Collection::Submissions(assignment_id),
                        reason: err.to_string(),
                    });
                    AssignmentStat::default()
                }
            };
            report.stats.insert(assignment_id, stat);
        }
        report
    }

    /// Gather everything the instructor dashboard needs for a course.
    ///
    /// Enrollments, quizzes, assignments and per-learner progress degrade to empty on
    /// failure (with a warning each).
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::Primary` if the course's sessions or any session's
    /// lectures cannot be loaded.
    #[instrument(skip(self))]
    pub async fn course_analytics(
        &self,
        course_id: CourseId,
    ) -> Result<CourseAnalyticsReport, AggregationError> {
        let (sessions, enrollments, assignments) = futures::join!(
            self.courses.get_sessions(course_id),
            self.enrollments.get_enrollments(course_id),
            self.assessments.get_assignments(course_id),
        );
        let sessions =
            sessions.map_err(AggregationError::primary(Collection::Sessions(course_id)))?;

        let mut warnings = Vec::new();
        let enrollment_count = match &enrollments {
            Ok(list) => Some(u32::try_from(list.len()).unwrap_or(u32::MAX)),
            Err(_) => None,
        };
        let enrollments: Vec<Enrollment> =
            or_degraded(enrollments, Collection::Enrollments(course_id), &mut warnings);
        let assignments: Vec<Assignment> =
            or_degraded(assignments, Collection::Assignments(course_id), &mut warnings);

        let courses = self.courses.as_ref();
        let session_ids: Vec<SessionId> = sessions.iter().map(|s| s.id).collect();
        let mut lectures: Vec<Lecture> = Vec::new();
        for (session_id, fetched) in self
            .fetch_each(session_ids, |session_id| courses.get_lectures(session_id))
            .await
        {
            lectures.extend(
                fetched.map_err(AggregationError::primary(Collection::Lectures(session_id)))?,
            );
        }

        let assessments = self.assessments.as_ref();
        let lecture_ids: Vec<LectureId> = lectures.iter().map(|l| l.id).collect();
        let mut quizzes: Vec<Quiz> = Vec::new();
        for (lecture_id, fetched) in self
            .fetch_each(lecture_ids, |lecture_id| assessments.get_quizzes(lecture_id))
            .await
        {
            quizzes.extend(or_degraded(
                fetched,
                Collection::Quizzes(lecture_id),
                &mut warnings,
            ));
        }

        let progress_repo = self.progress.as_ref();
        let enrollment_ids: Vec<EnrollmentId> = enrollments.iter().map(|e| e.id).collect();
        let (quiz_report, assignment_report, progress_sets) = futures::join!(
            self.compute_quiz_stats(&quizzes, enrollment_count),
            self.compute_assignment_stats(&assignments),
            self.fetch_each(enrollment_ids, |enrollment_id| {
                progress_repo.get_progress(enrollment_id)
            }),
        );

        let mut learners = Vec::with_capacity(progress_sets.len());
        for (enrollment_id, fetched) in progress_sets {
            let records: Vec<Progress> =
                or_degraded(fetched, Collection::Progress(enrollment_id), &mut warnings);
            learners.push(learner_progress(enrollment_id, &lectures, &records));
        }

        warnings.extend(quiz_report.warnings);
        warnings.extend(assignment_report.warnings);

        let analytics = course_analytics(
            &quiz_report.stats,
            &assignment_report.stats,
            &enrollments,
            &learners,
        );
        info!(
            quizzes = analytics.total_quizzes,
            assignments = analytics.total_assignments,
            students = analytics.total_students,
            active = analytics.active_students,
            warnings = warnings.len(),
            "course analytics computed"
        );

        Ok(CourseAnalyticsReport {
            course_id,
            analytics,
            quiz_stats: quiz_report.stats,
            assignment_stats: assignment_report.stats,
            learners,
            warnings,
            computed_at: self.clock.now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use course_core::model::{AssignmentSubmission, AttemptId, QuizAttempt, SubmissionId};
    use course_core::time::fixed_clock;
    use storage::InMemoryRepository;

    fn service(repo: &InMemoryRepository) -> StatisticsService {
        StatisticsService::from_storage(
            fixed_clock(),
            StatsConfig::default(),
            &Storage::from_repository(repo.clone()),
        )
    }

    fn quiz(id: u64) -> Quiz {
        Quiz::new(QuizId::new(id), LectureId::new(1), format!("Quiz {id}"))
    }

    #[tokio::test]
    async fn quiz_stats_scenario() {
        let repo = InMemoryRepository::new();
        for (id, score) in [(1, Some(80.0)), (2, Some(60.0)), (3, None)] {
            repo.insert_attempt(QuizAttempt::new(
                AttemptId::new(id),
                QuizId::new(1),
                EnrollmentId::new(id),
                score,
            ))
            .unwrap();
        }

        let report = service(&repo).compute_quiz_stats(&[quiz(1)], Some(10)).await;

        let stat = report.stats[&QuizId::new(1)];
        assert_eq!(stat.total_attempts, 3);
        assert!((stat.average_score - 70.0).abs() < 1e-9);
        assert!((stat.completion_rate - 30.0).abs() < 1e-9);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn unknown_enrollment_count_zeroes_completion_rate() {
        let repo = InMemoryRepository::new();
        repo.insert_attempt(QuizAttempt::new(
            AttemptId::new(1),
            QuizId::new(1),
            EnrollmentId::new(1),
            Some(50.0),
        ))
        .unwrap();

        let report = service(&repo).compute_quiz_stats(&[quiz(1)], None).await;

        assert!(report.stats[&QuizId::new(1)].completion_rate.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn assignment_stats_average_graded_only() {
        let repo = InMemoryRepository::new();
        for (id, grade) in [(1, Some(8.0)), (2, None), (3, Some(6.0))] {
            repo.insert_submission(AssignmentSubmission::new(
                SubmissionId::new(id),
                AssignmentId::new(4),
                EnrollmentId::new(id),
                grade,
            ))
            .unwrap();
        }
        let assignments = vec![
            Assignment::new(AssignmentId::new(4), CourseId::new(1), "Essay"),
            Assignment::new(AssignmentId::new(5), CourseId::new(1), "Unsubmitted"),
        ];

        let report = service(&repo).compute_assignment_stats(&assignments).await;

        let essay = report.stats[&AssignmentId::new(4)];
        assert_eq!(essay.graded_submissions, 2);
        assert!((essay.average_grade - 7.0).abs() < 1e-9);
        let empty = report.stats[&AssignmentId::new(5)];
        assert_eq!(empty, AssignmentStat::default());
    }

    #[tokio::test]
    async fn submission_failure_is_isolated() {
        let repo = InMemoryRepository::new();
        repo.fail(Collection::Submissions(AssignmentId::new(2)))
            .unwrap();
        let assignments: Vec<Assignment> = (1..=2)
            .map(|i| Assignment::new(AssignmentId::new(i), CourseId::new(1), format!("A{i}")))
            .collect();

        let report = service(&repo).compute_assignment_stats(&assignments).await;

        assert_eq!(report.stats.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            report.warnings[0].collection,
            Collection::Submissions(AssignmentId::new(2))
        );
    }
}
