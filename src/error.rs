// ⚠️ Error taxonomy for the records core
//
// Every variant is a rejected operation: state is left untouched when one is
// returned. Lookups (find_by_id, enrollments_of, ...) never produce errors.

use crate::validation::Violation;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("identity must not be empty")]
    InvalidIdentity,

    #[error("an entity with identity '{identity}' already exists")]
    DuplicateIdentity { identity: String },

    #[error("student '{student_id}' is already enrolled in course '{course_id}'")]
    AlreadyEnrolled {
        student_id: String,
        course_id: String,
    },

    #[error("no enrollment for student '{student_id}' in course '{course_id}'")]
    EnrollmentNotFound {
        student_id: String,
        course_id: String,
    },

    #[error("grade {value} is outside the range [{min}, {max}]")]
    OutOfRange {
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("{kind} '{identity}' does not exist")]
    MissingReference { kind: &'static str, identity: String },

    #[error("{kind} '{identity}' is still referenced by {count} record(s)")]
    StillReferenced {
        kind: &'static str,
        identity: String,
        count: usize,
    },

    #[error("'{identity}' is not a {expected}")]
    RoleMismatch {
        identity: String,
        expected: &'static str,
    },

    #[error("validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("configuration error: {message}")]
    Config { message: String },
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, RecordsError>;
