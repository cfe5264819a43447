#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod progress_service;
pub mod recompute;
pub mod stats_service;

pub use course_core::Clock;

pub use config::{FETCH_CONCURRENCY_ENV, StatsConfig};
pub use error::{AggregationError, ConfigError, DataWarning};
pub use progress_service::{
    CourseProgressView, ProgressService, SessionProgressRow, SessionProgressView,
};
pub use recompute::{Phase, Recompute, RecomputeOutcome, Ticket, ViewSnapshot};
pub use stats_service::{
    AssignmentStatsReport, CourseAnalyticsReport, QuizStatsReport, StatisticsService,
};
