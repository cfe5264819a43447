//! JSON snapshot of a course's raw records.
//!
//! A snapshot is what the remote read endpoints would return, captured in one file:
//! every collection as a flat array of records.

use std::path::Path;

use course_core::model::{
    Assignment, AssignmentSubmission, Enrollment, Lecture, Progress, Quiz, QuizAttempt, Session,
};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSnapshot {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
    #[serde(default)]
    pub progress: Vec<Progress>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub quiz_attempts: Vec<QuizAttempt>,
    #[serde(default)]
    pub submissions: Vec<AssignmentSubmission>,
}

impl CourseSnapshot {
    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` when the JSON is malformed or a record
    /// is missing a required field (including its identity).
    pub fn from_json_str(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Read and parse a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the file does not exist,
    /// `StorageError::Connection` for other I/O failures and
    /// `StorageError::Serialization` for invalid content.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::Connection(e.to_string()),
        })?;
        Self::from_json_str(&raw)
    }
}
