//! Error types for ferrite-sr.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while training or evaluating.
///
/// Only `PerFileEvaluation` is recovered from (inside a benchmark pass);
/// every other variant aborts the run.
#[derive(Debug, Error)]
pub enum SrError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Checkpoint not found: {}", .0.display())]
    CheckpointNotFound(PathBuf),

    #[error("Evaluation of {} failed: {reason}", file.display())]
    PerFileEvaluation { file: PathBuf, reason: String },

    #[error("Training error: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl SrError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    pub fn per_file(file: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::PerFileEvaluation {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures that a benchmark pass may skip over.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::PerFileEvaluation { .. })
    }
}

pub type Result<T> = std::result::Result<T, SrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_per_file_errors_are_recoverable() {
        assert!(SrError::per_file("a.png", "missing").is_per_file());
        assert!(!SrError::configuration("empty test dataset").is_per_file());
        assert!(!SrError::DirectoryNotFound(PathBuf::from("x")).is_per_file());
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = SrError::CheckpointNotFound(PathBuf::from("models/sr_0.json"));
        assert_eq!(err.to_string(), "Checkpoint not found: models/sr_0.json");
    }
}
