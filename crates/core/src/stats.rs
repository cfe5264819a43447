//! Quiz and assignment statistics.
//!
//! Per-entity reductions over attempt/submission records, and the course-wide fold over
//! those per-entity results. Records without a score or grade are excluded from averages
//! entirely: they are neither zeros nor part of the denominator.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::model::{
    AssignmentId, AssignmentSubmission, Enrollment, EnrollmentId, QuizAttempt, QuizId,
};
use crate::percent::{mean_of_present, percent, ratio_percent};
use crate::rollup::LearnerProgress;

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

/// Statistics for one quiz.
///
/// `Default` is the zeroed value used when the quiz's attempts could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStat {
    pub total_attempts: u32,
    pub graded_attempts: u32,
    pub average_score: f64,
    pub best_score: Option<f64>,
    /// Attempts per enrolled learner, as a percentage. Not capped: retakes push it past 100.
    pub completion_rate: f64,
}

/// Reduce one quiz's attempts.
///
/// `enrollment_count` of `None` or 0 yields a completion rate of 0.
#[must_use]
pub fn quiz_stat(attempts: &[QuizAttempt], enrollment_count: Option<u32>) -> QuizStat {
    let total_attempts = u32::try_from(attempts.len()).unwrap_or(u32::MAX);
    let (graded_attempts, average_score) = mean_of_present(attempts.iter().map(|a| a.score));
    let best_score = attempts.iter().filter_map(|a| a.score).reduce(f64::max);
    let completion_rate = ratio_percent(
        f64::from(total_attempts),
        f64::from(enrollment_count.unwrap_or(0)),
    );

    QuizStat {
        total_attempts,
        graded_attempts,
        average_score,
        best_score,
        completion_rate,
    }
}

//
// ─── ASSIGNMENTS ───────────────────────────────────────────────────────────────
//

/// Statistics for one assignment. `Default` is the zeroed failure value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStat {
    pub total_submissions: u32,
    pub graded_submissions: u32,
    pub average_grade: f64,
    pub best_grade: Option<f64>,
}

/// Reduce one assignment's submissions.
#[must_use]
pub fn assignment_stat(submissions: &[AssignmentSubmission]) -> AssignmentStat {
    let total_submissions = u32::try_from(submissions.len()).unwrap_or(u32::MAX);
    let (graded_submissions, average_grade) =
        mean_of_present(submissions.iter().map(|s| s.grade));
    let best_grade = submissions.iter().filter_map(|s| s.grade).reduce(f64::max);

    AssignmentStat {
        total_submissions,
        graded_submissions,
        average_grade,
        best_grade,
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Course-wide rollup of quiz and assignment statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAnalytics {
    pub total_quizzes: u32,
    pub total_assignments: u32,
    pub total_quiz_attempts: u32,
    pub total_submissions: u32,
    /// Mean score over every graded attempt in the course (weighted by graded attempts).
    pub average_quiz_score: f64,
    /// Mean grade over every graded submission in the course.
    pub average_assignment_grade: f64,
    pub total_students: u32,
    pub active_students: u32,
    /// Attempts plus submissions over (students × activities), rounded and clamped.
    pub completion_rate: u8,
}

/// Weighted mean of per-entity means: `Σ(mean × count) / Σ count`.
fn weighted_mean(parts: impl IntoIterator<Item = (f64, u32)>) -> f64 {
    let mut weighted_sum = 0.0_f64;
    let mut weight = 0_u64;
    for (mean, count) in parts {
        weighted_sum += mean * f64::from(count);
        weight += u64::from(count);
    }
    if weight == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let weight = weight as f64;
    weighted_sum / weight
}

/// Fold per-entity statistics, enrollments and learner progress into course analytics.
///
/// A learner is active when their progress shows any coverage, however small; enrollments
/// without a progress entry count as inactive.
#[must_use]
pub fn course_analytics(
    quiz_stats: &BTreeMap<QuizId, QuizStat>,
    assignment_stats: &BTreeMap<AssignmentId, AssignmentStat>,
    enrollments: &[Enrollment],
    learners: &[LearnerProgress],
) -> CourseAnalytics {
    let total_quizzes = u32::try_from(quiz_stats.len()).unwrap_or(u32::MAX);
    let total_assignments = u32::try_from(assignment_stats.len()).unwrap_or(u32::MAX);
    let total_quiz_attempts = quiz_stats
        .values()
        .fold(0_u32, |acc, s| acc.saturating_add(s.total_attempts));
    let total_submissions = assignment_stats
        .values()
        .fold(0_u32, |acc, s| acc.saturating_add(s.total_submissions));

    let average_quiz_score = weighted_mean(
        quiz_stats
            .values()
            .map(|s| (s.average_score, s.graded_attempts)),
    );
    let average_assignment_grade = weighted_mean(
        assignment_stats
            .values()
            .map(|s| (s.average_grade, s.graded_submissions)),
    );

    let by_enrollment: HashMap<EnrollmentId, &LearnerProgress> =
        learners.iter().map(|l| (l.enrollment_id, l)).collect();
    let total_students = u32::try_from(enrollments.len()).unwrap_or(u32::MAX);
    let active_students = u32::try_from(
        enrollments
            .iter()
            .filter(|e| by_enrollment.get(&e.id).is_some_and(|l| l.is_active()))
            .count(),
    )
    .unwrap_or(u32::MAX);

    let total_activities = u64::from(total_quizzes) + u64::from(total_assignments);
    let total_completions = u64::from(total_quiz_attempts) + u64::from(total_submissions);
    #[allow(clippy::cast_precision_loss)]
    let completion_rate = percent(
        total_completions as f64,
        (u64::from(total_students) * total_activities) as f64,
    );

    CourseAnalytics {
        total_quizzes,
        total_assignments,
        total_quiz_attempts,
        total_submissions,
        average_quiz_score,
        average_assignment_grade,
        total_students,
        active_students,
        completion_rate,
    }
}
