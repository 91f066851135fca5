use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Public operation that failed; its text is the message shown to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Response,
    CourseStructure,
    CourseContent,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operation::Response => "Failed to generate response",
            Operation::CourseStructure => "Failed to generate course structure",
            Operation::CourseContent => "Failed to generate course content",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ModelUnavailable,
    UnparsableOutput,
    SchemaMismatch,
    IncompleteBrief,
}

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("{operation}")]
    ModelUnavailable {
        operation: Operation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{operation}")]
    UnparsableOutput {
        operation: Operation,
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation}")]
    SchemaMismatch {
        operation: Operation,
        raw: String,
    },

    #[error("Course brief is missing: {}", .missing.join(", "))]
    IncompleteBrief {
        missing: Vec<&'static str>,
    },
}

impl CourseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourseError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            CourseError::UnparsableOutput { .. } => ErrorKind::UnparsableOutput,
            CourseError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            CourseError::IncompleteBrief { .. } => ErrorKind::IncompleteBrief,
        }
    }

    /// Model reply that could not be turned into a course, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            CourseError::UnparsableOutput { raw, .. } | CourseError::SchemaMismatch { raw, .. } =>
                Some(raw),
            _ => None,
        }
    }
}
