mod assessment;
mod course;
mod ids;
mod media;
mod progress;

pub use ids::{
    AssignmentId, AttemptId, CourseId, EnrollmentId, LectureId, ParseIdError, ProgressId,
    QuizId, SessionId, StudentId, SubmissionId,
};
pub use media::{MediaRef, MediaRefError};

pub use assessment::{Assignment, AssignmentSubmission, Quiz, QuizAttempt};
pub use course::{Lecture, Session};
pub use progress::{Enrollment, Progress};
