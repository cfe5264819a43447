//! Progress join and hierarchical rollups.
//!
//! Structure (sessions, lectures) and learner state (progress records) are fetched
//! independently. Everything here is a pure function of those two collections: the
//! derived views are rebuilt on every input change and never mutated in place.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{EnrollmentId, Lecture, LectureId, Progress};
use crate::percent::{percent, ratio_percent};

//
// ─── LECTURE LEVEL ─────────────────────────────────────────────────────────────
//

/// A lecture joined with the learner's progress record, if one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedLecture {
    #[serde(flatten)]
    pub lecture: Lecture,
    pub is_completed: bool,
    pub watch_time_minutes: u32,
    pub last_watched_at: Option<DateTime<Utc>>,
}

impl EnrichedLecture {
    fn not_started(lecture: Lecture) -> Self {
        Self {
            lecture,
            is_completed: false,
            watch_time_minutes: 0,
            last_watched_at: None,
        }
    }

    fn with_progress(lecture: Lecture, progress: &Progress) -> Self {
        Self {
            lecture,
            is_completed: progress.is_completed,
            watch_time_minutes: progress.watched_minutes,
            last_watched_at: progress.last_watched_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> LectureId {
        self.lecture.id
    }
}

fn index_by_lecture(progress: &[Progress]) -> HashMap<LectureId, &Progress> {
    let mut index = HashMap::with_capacity(progress.len());
    for record in progress {
        // first record wins if the backend ever returns duplicates
        index.entry(record.lecture_id).or_insert(record);
    }
    index
}

/// Join a session's lectures with an enrollment's progress records.
///
/// Output order follows `lectures`. Progress records whose lecture is not in
/// `lectures` (other sessions, deleted lectures) are ignored. Lectures without a
/// record come back as not started.
#[must_use]
pub fn join_lecture_progress(lectures: &[Lecture], progress: &[Progress]) -> Vec<EnrichedLecture> {
    let index = index_by_lecture(progress);
    lectures
        .iter()
        .map(|lecture| match index.get(&lecture.id) {
            Some(record) => EnrichedLecture::with_progress(lecture.clone(), record),
            None => EnrichedLecture::not_started(lecture.clone()),
        })
        .collect()
}

//
// ─── SESSION LEVEL ─────────────────────────────────────────────────────────────
//

/// Rollup of one session's enriched lectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub lecture_count: u32,
    pub completed_lecture_count: u32,
    pub total_duration_minutes: u32,
    pub watched_minutes: u32,
    /// True iff the session has lectures and all of them are completed.
    pub is_completed: bool,
    /// First lecture (in the given order) not yet completed.
    pub next_lecture: Option<LectureId>,
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Summarize a session from its enriched lectures.
#[must_use]
pub fn summarize_session(lectures: &[EnrichedLecture]) -> SessionSummary {
    let lecture_count = count_u32(lectures.len());
    let mut completed_lecture_count = 0_u32;
    let mut total_duration_minutes = 0_u32;
    let mut watched_minutes = 0_u32;
    let mut next_lecture = None;

    for entry in lectures {
        total_duration_minutes =
            total_duration_minutes.saturating_add(entry.lecture.duration_or_zero());
        watched_minutes = watched_minutes.saturating_add(entry.watch_time_minutes);
        if entry.is_completed {
            completed_lecture_count += 1;
        } else if next_lecture.is_none() {
            next_lecture = Some(entry.id());
        }
    }

    SessionSummary {
        lecture_count,
        completed_lecture_count,
        total_duration_minutes,
        watched_minutes,
        is_completed: lecture_count > 0 && completed_lecture_count == lecture_count,
        next_lecture,
    }
}

//
// ─── COURSE LEVEL ──────────────────────────────────────────────────────────────
//

/// Rollup of a course's session summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressSummary {
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub total_lectures: u32,
    pub completed_lectures: u32,
    pub total_duration_minutes: u32,
    pub watched_minutes: u32,
    /// Completed sessions over total sessions, rounded percentage.
    pub completion_rate: u8,
}

/// Summarize a course from session summaries.
///
/// Callers pass sessions already in position order; nothing here depends on order,
/// but the summaries are typically rendered alongside the same slice.
#[must_use]
pub fn summarize_course(sessions: &[SessionSummary]) -> CourseProgressSummary {
    let total_sessions = count_u32(sessions.len());
    let mut summary = CourseProgressSummary {
        total_sessions,
        ..CourseProgressSummary::default()
    };

    for session in sessions {
        if session.is_completed {
            summary.completed_sessions += 1;
        }
        summary.total_lectures = summary.total_lectures.saturating_add(session.lecture_count);
        summary.completed_lectures = summary
            .completed_lectures
            .saturating_add(session.completed_lecture_count);
        summary.total_duration_minutes = summary
            .total_duration_minutes
            .saturating_add(session.total_duration_minutes);
        summary.watched_minutes = summary.watched_minutes.saturating_add(session.watched_minutes);
    }

    summary.completion_rate = percent(
        f64::from(summary.completed_sessions),
        f64::from(total_sessions),
    );
    summary
}

//
// ─── LEARNER LEVEL ─────────────────────────────────────────────────────────────
//

/// How far one enrollment has got through a course's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgress {
    pub enrollment_id: EnrollmentId,
    pub total_lectures: u32,
    pub completed_lectures: u32,
    pub watched_minutes: u32,
    /// Rounded for display; use `active` to decide whether any content was covered.
    pub watched_percentage: u8,
    /// Any coverage at all, before rounding. A completed lecture without a duration
    /// counts.
    pub active: bool,
}

impl LearnerProgress {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Measure an enrollment's progress over every lecture of a course.
///
/// Watch time counts up to each lecture's duration; a completed lecture counts as
/// fully watched. Courses without any duration fall back to the completed-lecture ratio.
#[must_use]
pub fn learner_progress(
    enrollment_id: EnrollmentId,
    lectures: &[Lecture],
    progress: &[Progress],
) -> LearnerProgress {
    let own: Vec<Progress> = progress
        .iter()
        .filter(|record| record.enrollment_id == enrollment_id)
        .cloned()
        .collect();
    let enriched = join_lecture_progress(lectures, &own);

    let mut completed_lectures = 0_u32;
    let mut watched_minutes = 0_u32;
    let mut covered_minutes = 0_u64;
    let mut total_minutes = 0_u64;

    for entry in &enriched {
        let duration = entry.lecture.duration_or_zero();
        total_minutes += u64::from(duration);
        watched_minutes = watched_minutes.saturating_add(entry.watch_time_minutes);
        if entry.is_completed {
            completed_lectures += 1;
            covered_minutes += u64::from(duration);
        } else {
            covered_minutes += u64::from(entry.watch_time_minutes.min(duration));
        }
    }

    let total_lectures = count_u32(enriched.len());
    #[allow(clippy::cast_precision_loss)]
    let (covered, whole) = if total_minutes > 0 {
        (covered_minutes as f64, total_minutes as f64)
    } else {
        (f64::from(completed_lectures), f64::from(total_lectures))
    };
    let watched_percentage = percent(covered, whole);
    let active = ratio_percent(covered, whole) > 0.0 || completed_lectures > 0;

    LearnerProgress {
        enrollment_id,
        total_lectures,
        completed_lectures,
        watched_minutes,
        watched_percentage,
        active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProgressId, SessionId};
    use crate::time::fixed_now;

    fn lecture(id: u64, session: u64, duration: Option<u32>, position: u32) -> Lecture {
        Lecture::new(
            LectureId::new(id),
            SessionId::new(session),
            format!("Lecture {id}"),
            duration,
            position,
        )
    }

    fn progress(id: u64, lecture: u64, completed: bool, watched: u32) -> Progress {
        Progress::new(
            ProgressId::new(id),
            EnrollmentId::new(1),
            LectureId::new(lecture),
            completed,
            watched,
        )
    }

    #[test]
    fn join_preserves_lecture_order_and_matches_by_id() {
        let lectures = vec![lecture(3, 1, Some(10), 0), lecture(1, 1, Some(5), 1)];
        let records = vec![
            progress(10, 1, true, 5).watched_at(fixed_now()),
            progress(11, 3, false, 4),
        ];

        let joined = join_lecture_progress(&lectures, &records);

        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].id(), LectureId::new(3));
        assert!(!joined[0].is_completed);
        assert_eq!(joined[0].watch_time_minutes, 4);
        assert_eq!(joined[1].id(), LectureId::new(1));
        assert!(joined[1].is_completed);
        assert_eq!(joined[1].last_watched_at, Some(fixed_now()));
    }

    #[test]
    fn join_with_no_progress_defaults_every_lecture() {
        let lectures = vec![lecture(1, 1, Some(10), 0), lecture(2, 1, None, 1)];

        let joined = join_lecture_progress(&lectures, &[]);

        assert!(
            joined
                .iter()
                .all(|entry| !entry.is_completed && entry.watch_time_minutes == 0)
        );
    }

    #[test]
    fn join_drops_progress_for_unknown_lectures() {
        let lectures = vec![lecture(1, 1, Some(10), 0)];
        let records = vec![progress(10, 99, true, 30)];

        let joined = join_lecture_progress(&lectures, &records);

        assert_eq!(joined.len(), 1);
        assert!(!joined[0].is_completed);
    }

    #[test]
    fn join_keeps_first_duplicate() {
        let lectures = vec![lecture(1, 1, Some(10), 0)];
        let records = vec![progress(10, 1, false, 2), progress(11, 1, true, 10)];

        let joined = join_lecture_progress(&lectures, &records);

        assert!(!joined[0].is_completed);
        assert_eq!(joined[0].watch_time_minutes, 2);
    }

    #[test]
    fn session_summary_counts_and_resume_point() {
        let lectures = vec![
            lecture(1, 1, Some(10), 0),
            lecture(2, 1, None, 1),
            lecture(3, 1, Some(7), 2),
        ];
        let records = vec![progress(10, 1, true, 10), progress(11, 3, true, 7)];

        let summary = summarize_session(&join_lecture_progress(&lectures, &records));

        assert_eq!(summary.lecture_count, 3);
        assert_eq!(summary.completed_lecture_count, 2);
        assert_eq!(summary.total_duration_minutes, 17);
        assert_eq!(summary.watched_minutes, 17);
        assert!(!summary.is_completed);
        assert_eq!(summary.next_lecture, Some(LectureId::new(2)));
    }

    #[test]
    fn empty_session_is_never_completed() {
        let summary = summarize_session(&[]);
        assert_eq!(summary.lecture_count, 0);
        assert!(!summary.is_completed);
        assert_eq!(summary.next_lecture, None);
    }

    #[test]
    fn two_session_course_scenario() {
        let first = vec![lecture(1, 1, Some(10), 0), lecture(2, 1, Some(10), 1)];
        let second = vec![
            lecture(3, 2, Some(5), 0),
            lecture(4, 2, Some(5), 1),
            lecture(5, 2, Some(5), 2),
        ];
        let records = vec![
            progress(1, 1, true, 10),
            progress(2, 2, true, 10),
            progress(3, 4, true, 5),
        ];

        let s1 = summarize_session(&join_lecture_progress(&first, &records));
        let s2 = summarize_session(&join_lecture_progress(&second, &records));
        let course = summarize_course(&[s1, s2]);

        assert!(s1.is_completed);
        assert!(!s2.is_completed);
        assert_eq!(course.completed_sessions, 1);
        assert_eq!(course.total_sessions, 2);
        assert_eq!(course.completion_rate, 50);
        assert_eq!(course.total_lectures, 5);
        assert_eq!(course.completed_lectures, 3);
        assert_eq!(course.total_duration_minutes, 35);
    }

    #[test]
    fn course_without_sessions_has_zero_rate() {
        let course = summarize_course(&[]);
        assert_eq!(course.total_sessions, 0);
        assert_eq!(course.completion_rate, 0);
    }

    #[test]
    fn completed_counts_never_exceed_totals() {
        let lectures: Vec<Lecture> = (1..=6).map(|i| lecture(i, i % 2, Some(3), 0)).collect();
        for completed_mask in 0_u32..64 {
            let records: Vec<Progress> = (1..=6_u64)
                .filter(|i| completed_mask & (1 << (i - 1)) != 0)
                .map(|i| progress(i, i, true, 3))
                .collect();
            let (a, b): (Vec<Lecture>, Vec<Lecture>) =
                lectures.iter().cloned().partition(|l| l.session_id == SessionId::new(0));
            let sa = summarize_session(&join_lecture_progress(&a, &records));
            let sb = summarize_session(&join_lecture_progress(&b, &records));
            let course = summarize_course(&[sa, sb]);

            assert!(sa.completed_lecture_count <= sa.lecture_count);
            assert!(sb.completed_lecture_count <= sb.lecture_count);
            assert!(course.completed_sessions <= course.total_sessions);
            assert!(course.completion_rate <= 100);
        }
    }

    #[test]
    fn learner_progress_caps_watch_time_per_lecture() {
        let lectures = vec![lecture(1, 1, Some(10), 0), lecture(2, 1, Some(10), 1)];
        let records = vec![progress(1, 1, false, 25), progress(2, 2, false, 5)];

        let learner = learner_progress(EnrollmentId::new(1), &lectures, &records);

        assert_eq!(learner.watched_minutes, 30);
        assert_eq!(learner.watched_percentage, 75);
        assert!(learner.is_active());
    }

    #[test]
    fn learner_progress_ignores_other_enrollments() {
        let lectures = vec![lecture(1, 1, Some(10), 0)];
        let mut foreign = progress(1, 1, true, 10);
        foreign.enrollment_id = EnrollmentId::new(2);

        let learner = learner_progress(EnrollmentId::new(1), &lectures, &[foreign]);

        assert_eq!(learner.completed_lectures, 0);
        assert!(!learner.is_active());
    }

    #[test]
    fn learner_progress_without_durations_uses_lecture_ratio() {
        let lectures = vec![lecture(1, 1, None, 0), lecture(2, 1, None, 1)];
        let records = vec![progress(1, 1, true, 0)];

        let learner = learner_progress(EnrollmentId::new(1), &lectures, &records);

        assert_eq!(learner.watched_percentage, 50);
    }

    #[test]
    fn tiny_watch_time_still_counts_as_active() {
        let lectures = vec![lecture(1, 1, Some(300), 0)];
        let records = vec![progress(1, 1, false, 1)];

        let learner = learner_progress(EnrollmentId::new(1), &lectures, &records);

        assert_eq!(learner.watched_minutes, 1);
        assert_eq!(learner.watched_percentage, 0);
        assert!(learner.is_active());
    }

    #[test]
    fn completed_lecture_without_duration_counts_as_active() {
        let lectures = vec![lecture(1, 1, Some(30), 0), lecture(2, 1, None, 1)];
        let records = vec![progress(1, 2, true, 0)];

        let learner = learner_progress(EnrollmentId::new(1), &lectures, &records);

        assert_eq!(learner.watched_percentage, 0);
        assert!(learner.is_active());
    }
}
