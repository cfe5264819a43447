use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an identifier from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl ParseIdError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

/// Declares a `u64`-backed identifier newtype.
///
/// Every id gets `new`/`value`, `Debug` as `Name(n)`, `Display` as the bare number,
/// `FromStr`, and a transparent serde representation.
macro_rules! define_ids {
    ($(
        $(#[$meta:meta])*
        $name:ident
    ),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(u64);

            impl $name {
                #[must_use]
                pub const fn new(id: u64) -> Self {
                    Self(id)
                }

                /// Returns the underlying u64 value
                #[must_use]
                pub const fn value(&self) -> u64 {
                    self.0
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = ParseIdError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.trim()
                        .parse::<u64>()
                        .map($name::new)
                        .map_err(|_| ParseIdError {
                            kind: stringify!($name),
                        })
                }
            }
        )*
    };
}

define_ids! {
    /// Unique identifier for a Course
    CourseId,
    /// Unique identifier for a Session (chapter) within a course
    SessionId,
    /// Unique identifier for a Lecture
    LectureId,
    /// Unique identifier for an Enrollment (one learner in one course)
    EnrollmentId,
    /// Unique identifier for a Progress record
    ProgressId,
    /// Unique identifier for a Student
    StudentId,
    /// Unique identifier for a Quiz
    QuizId,
    /// Unique identifier for an Assignment
    AssignmentId,
    /// Unique identifier for a single quiz attempt
    AttemptId,
    /// Unique identifier for a single assignment submission
    SubmissionId,
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
