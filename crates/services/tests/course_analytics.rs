use course_core::QuizStat;
use course_core::model::{
    Assignment, AssignmentId, AssignmentSubmission, AttemptId, CourseId, Enrollment, EnrollmentId,
    Lecture, LectureId, Progress, ProgressId, Quiz, QuizAttempt, QuizId, Session, SessionId,
    StudentId, SubmissionId,
};
use course_core::time::{fixed_clock, fixed_now};
use services::{StatisticsService, StatsConfig};
use storage::{Collection, InMemoryRepository, Storage};

const COURSE: CourseId = CourseId::new(1);

fn seeded() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.insert_session(Session::new(SessionId::new(1), COURSE, "Intro", 0))
        .unwrap();
    for (id, position) in [(1, 0), (2, 1)] {
        repo.insert_lecture(Lecture::new(
            LectureId::new(id),
            SessionId::new(1),
            format!("Lecture {id}"),
            Some(10),
            position,
        ))
        .unwrap();
        repo.insert_quiz(Quiz::new(
            QuizId::new(id),
            LectureId::new(id),
            format!("Check {id}"),
        ))
        .unwrap();
    }
    for id in 1..=3 {
        repo.insert_enrollment(Enrollment::new(
            EnrollmentId::new(id),
            COURSE,
            StudentId::new(100 + id),
        ))
        .unwrap();
    }
    for (id, quiz, enrollment, score) in [(1, 1, 1, 80.0), (2, 1, 2, 60.0), (3, 2, 1, 90.0)] {
        repo.insert_attempt(QuizAttempt::new(
            AttemptId::new(id),
            QuizId::new(quiz),
            EnrollmentId::new(enrollment),
            Some(score),
        ))
        .unwrap();
    }
    repo.insert_assignment(Assignment::new(AssignmentId::new(1), COURSE, "Essay"))
        .unwrap();
    for (id, enrollment, grade) in [(1, 1, Some(70.0)), (2, 2, None)] {
        repo.insert_submission(AssignmentSubmission::new(
            SubmissionId::new(id),
            AssignmentId::new(1),
            EnrollmentId::new(enrollment),
            grade,
        ))
        .unwrap();
    }
    repo.upsert_progress(Progress::new(
        ProgressId::new(1),
        EnrollmentId::new(1),
        LectureId::new(1),
        true,
        10,
    ))
    .unwrap();
    repo.upsert_progress(Progress::new(
        ProgressId::new(2),
        EnrollmentId::new(2),
        LectureId::new(2),
        false,
        5,
    ))
    .unwrap();
    repo
}

fn service(repo: &InMemoryRepository, concurrency: usize) -> StatisticsService {
    let config = StatsConfig {
        fetch_concurrency: concurrency,
    };
    StatisticsService::from_storage(fixed_clock(), config, &Storage::from_repository(repo.clone()))
}

#[tokio::test]
async fn course_analytics_covers_the_whole_course() {
    let repo = seeded();

    let report = service(&repo, 8).course_analytics(COURSE).await.unwrap();

    let analytics = report.analytics;
    assert_eq!(analytics.total_quizzes, 2);
    assert_eq!(analytics.total_assignments, 1);
    assert_eq!(analytics.total_quiz_attempts, 3);
    assert_eq!(analytics.total_submissions, 2);
    assert!((analytics.average_quiz_score - 230.0 / 3.0).abs() < 1e-9);
    assert!((analytics.average_assignment_grade - 70.0).abs() < 1e-9);
    assert_eq!(analytics.total_students, 3);
    assert_eq!(analytics.active_students, 2);
    // 5 completions over 3 students x 3 activities
    assert_eq!(analytics.completion_rate, 56);

    let first_quiz = report.quiz_stats[&QuizId::new(1)];
    assert!((first_quiz.completion_rate - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(first_quiz.best_score, Some(80.0));

    let watched: Vec<u8> = report.learners.iter().map(|l| l.watched_percentage).collect();
    assert_eq!(watched, vec![50, 25, 0]);
    assert!(!report.is_degraded());
    assert_eq!(report.computed_at, fixed_now());
}

#[tokio::test]
async fn one_failing_quiz_does_not_fail_the_others() {
    let repo = seeded();
    repo.insert_quiz(Quiz::new(QuizId::new(3), LectureId::new(2), "Recap"))
        .unwrap();
    repo.insert_attempt(QuizAttempt::new(
        AttemptId::new(4),
        QuizId::new(3),
        EnrollmentId::new(3),
        Some(40.0),
    ))
    .unwrap();
    repo.fail(Collection::QuizAttempts(QuizId::new(2))).unwrap();

    let report = service(&repo, 1).course_analytics(COURSE).await.unwrap();

    assert_eq!(report.quiz_stats.len(), 3);
    assert_eq!(report.quiz_stats[&QuizId::new(1)].total_attempts, 2);
    assert_eq!(report.quiz_stats[&QuizId::new(2)], QuizStat::default());
    assert_eq!(report.quiz_stats[&QuizId::new(3)].total_attempts, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(
        report.warnings[0].collection,
        Collection::QuizAttempts(QuizId::new(2))
    );
}

#[tokio::test]
async fn missing_enrollments_degrade_to_zero_students() {
    let repo = seeded();
    repo.fail(Collection::Enrollments(COURSE)).unwrap();

    let report = service(&repo, 8).course_analytics(COURSE).await.unwrap();

    assert!(report.is_degraded());
    assert_eq!(report.analytics.total_students, 0);
    assert_eq!(report.analytics.completion_rate, 0);
    assert!(report.learners.is_empty());
    assert!(
        report
            .quiz_stats
            .values()
            .all(|s| s.completion_rate.abs() < f64::EPSILON)
    );
    assert_eq!(report.analytics.total_quiz_attempts, 3);
}

#[tokio::test]
async fn failing_learner_progress_marks_them_inactive() {
    let repo = seeded();
    repo.fail(Collection::Progress(EnrollmentId::new(1))).unwrap();

    let report = service(&repo, 2).course_analytics(COURSE).await.unwrap();

    assert_eq!(report.learners.len(), 3);
    assert_eq!(report.learners[0].watched_percentage, 0);
    assert_eq!(report.analytics.active_students, 1);
    assert_eq!(
        report.warnings[0].collection,
        Collection::Progress(EnrollmentId::new(1))
    );
}

#[tokio::test]
async fn session_failure_fails_the_call() {
    let repo = seeded();
    repo.fail(Collection::Sessions(COURSE)).unwrap();

    let err = service(&repo, 8).course_analytics(COURSE).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "failed to load sessions of course 1: backend unavailable: sessions of course 1"
    );
}

#[tokio::test]
async fn report_serializes_with_camel_case_keys() {
    let repo = seeded();

    let report = service(&repo, 8).course_analytics(COURSE).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["analytics"]["totalStudents"], 3);
    assert_eq!(json["quizStats"]["1"]["totalAttempts"], 2);
    assert!(json["warnings"].as_array().unwrap().is_empty());
}
