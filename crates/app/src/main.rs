use std::fmt;
use std::path::PathBuf;

use course_core::model::{CourseId, EnrollmentId, SessionId};
use serde::Serialize;
use services::{Clock, ProgressService, StatisticsService, StatsConfig};
use storage::{CourseSnapshot, InMemoryRepository, Storage};
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

const DATA_ENV: &str = "COURSE_DATA";
const LOG_LEVEL_ENV: &str = "COURSE_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "COURSE_LOG_FORMAT";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    MissingData,
    UnknownArg(String),
    InvalidId {
        flag: &'static str,
        source: course_core::Error,
    },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::MissingData => write!(f, "no snapshot given: pass --data or set {DATA_ENV}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, source } => write!(f, "invalid {flag} value: {source}"),
        }
    }
}

impl std::error::Error for ArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgsError::InvalidId { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id<T>(raw: &str, flag: &'static str) -> Result<T, ArgsError>
where
    T: std::str::FromStr<Err = course_core::model::ParseIdError>,
{
    raw.parse::<T>().map_err(|e| ArgsError::InvalidId {
        flag,
        source: course_core::Error::from(e),
    })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- progress  --course-id <id> --enrollment-id <id>");
    eprintln!("  cargo run -p app -- session   --session-id <id> --enrollment-id <id>");
    eprintln!("  cargo run -p app -- analytics --course-id <id>");
    eprintln!();
    eprintln!("Every command also takes --data <file>.");
    eprintln!();
    eprintln!("The snapshot is a JSON file of course records; see demos/course.json.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DATA_ENV}                      snapshot path when --data is absent");
    eprintln!("  {LOG_LEVEL_ENV}                 log filter without RUST_LOG (default: info)");
    eprintln!("  {LOG_FORMAT_ENV}                pretty | json (default: pretty)");
    eprintln!("  COURSE_STATS_FETCH_CONCURRENCY  per-entity fetches in flight (default: 8)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Progress,
    Session,
    Analytics,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "progress" => Some(Self::Progress),
            "session" => Some(Self::Session),
            "analytics" => Some(Self::Analytics),
            _ => None,
        }
    }
}

struct Args {
    data: PathBuf,
    course_id: Option<CourseId>,
    session_id: Option<SessionId>,
    enrollment_id: Option<EnrollmentId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut data = std::env::var(DATA_ENV).ok().map(PathBuf::from);
        let mut course_id = None;
        let mut session_id = None;
        let mut enrollment_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data" => data = Some(PathBuf::from(require_value(args, "--data")?)),
                "--course-id" => {
                    let value = require_value(args, "--course-id")?;
                    course_id = Some(parse_id(&value, "--course-id")?);
                }
                "--session-id" => {
                    let value = require_value(args, "--session-id")?;
                    session_id = Some(parse_id(&value, "--session-id")?);
                }
                "--enrollment-id" => {
                    let value = require_value(args, "--enrollment-id")?;
                    enrollment_id = Some(parse_id(&value, "--enrollment-id")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            data: data.ok_or(ArgsError::MissingData)?,
            course_id,
            session_id,
            enrollment_id,
        })
    }
}

fn required<T>(value: Option<T>, flag: &'static str) -> Result<T, ArgsError> {
    value.ok_or(ArgsError::MissingFlag { flag })
}

fn init_logging() {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".into());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    // stdout carries the report; logs go to stderr.
    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => {
            let json_layer = log_fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true)
                .with_writer(std::io::stderr);
            subscriber.with(json_layer).init();
        }
        _ => {
            let pretty_layer = log_fmt::layer()
                .pretty()
                .with_target(true)
                .with_writer(std::io::stderr);
            subscriber.with(pretty_layer).init();
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut iter = argv.into_iter();

    let cmd = match iter.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = StatsConfig::from_env()?;
    let snapshot = CourseSnapshot::load(&parsed.data)?;
    info!(
        path = %parsed.data.display(),
        sessions = snapshot.sessions.len(),
        lectures = snapshot.lectures.len(),
        enrollments = snapshot.enrollments.len(),
        "snapshot loaded"
    );
    let storage = Storage::from_repository(InMemoryRepository::from_snapshot(snapshot));
    let clock = Clock::default();

    match cmd {
        Command::Progress => {
            let course_id = required(parsed.course_id, "--course-id")?;
            let enrollment_id = required(parsed.enrollment_id, "--enrollment-id")?;
            let view = ProgressService::from_storage(clock, &storage)
                .course_progress(course_id, enrollment_id)
                .await?;
            print_json(&view)
        }
        Command::Session => {
            let session_id = required(parsed.session_id, "--session-id")?;
            let enrollment_id = required(parsed.enrollment_id, "--enrollment-id")?;
            let view = ProgressService::from_storage(clock, &storage)
                .session_progress(session_id, enrollment_id)
                .await?;
            print_json(&view)
        }
        Command::Analytics => {
            let course_id = required(parsed.course_id, "--course-id")?;
            let report = StatisticsService::from_storage(clock, config, &storage)
                .course_analytics(course_id)
                .await?;
            print_json(&report)
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
