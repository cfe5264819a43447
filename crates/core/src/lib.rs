#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod percent;
pub mod rollup;
pub mod stats;
pub mod time;

pub use error::Error;
pub use time::Clock;

pub use rollup::{
    CourseProgressSummary, EnrichedLecture, LearnerProgress, SessionSummary,
    join_lecture_progress, learner_progress, summarize_course, summarize_session,
};
pub use stats::{
    AssignmentStat, CourseAnalytics, QuizStat, assignment_stat, course_analytics, quiz_stat,
};
