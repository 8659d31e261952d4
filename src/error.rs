//! Error taxonomy for the data access helpers.
//!
//! Failures coming out of the ORM are classified into reference violations,
//! uniqueness violations or passed through untouched. Classification prefers
//! the structured [`SqlErr`] the driver exposes and only falls back to
//! scanning the diagnostic text when that is unavailable. The text patterns
//! are tied to the wording of specific drivers and will not cover all of them.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// No row with the requested identity.
    #[error("`{table}` object with id={id} not found")]
    NotFound { table: String, id: String },

    /// A write referenced a foreign row that does not exist.
    #[error("{key} Failed to write `{table}` object with data {data}")]
    ReferenceViolation { table: String, key: String, data: String },

    /// A write collided with a unique or primary key constraint.
    #[error("`{table}` object with data `{data}` already exists")]
    AlreadyExists { table: String, data: String },

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Constraint violation detected in a database failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Violation {
    Reference { key: String },
    Unique,
}

const REFERENCE_PATTERNS: &[&str] = &[
    "violates foreign key constraint",
    "foreign key constraint failed",
    "a foreign key constraint fails",
    "is not present in table",
    "отсутствует в таблице",
];

const UNIQUE_PATTERNS: &[&str] = &[
    "duplicate key value violates unique constraint",
    "unique constraint failed",
    "duplicate entry",
    "нарушает ограничение уникальности",
];

static KEY_DETAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Key|Ключ) \([^)]*\)=\([^)]*\)").expect("valid key detail regex"));

/// Classify a database failure as a constraint violation, if it is one.
pub(crate) fn classify(err: &DbErr) -> Option<Violation> {
    let display = err.to_string();
    // Debug output carries driver detail fields such as PostgreSQL's `Key (..)=(..)`
    let detail = format!("{display} {err:?}");

    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
            return Some(Violation::Reference {
                key: violated_key(&detail).unwrap_or(message),
            })
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => return Some(Violation::Unique),
        _ => {}
    }

    let lowered = display.to_lowercase();
    if REFERENCE_PATTERNS.iter().any(|pattern| lowered.contains(pattern)) {
        return Some(Violation::Reference {
            key: violated_key(&detail).unwrap_or(display),
        });
    }
    if UNIQUE_PATTERNS.iter().any(|pattern| lowered.contains(pattern)) {
        return Some(Violation::Unique);
    }

    None
}

fn violated_key(text: &str) -> Option<String> {
    KEY_DETAIL.find(text).map(|m| m.as_str().to_string())
}
