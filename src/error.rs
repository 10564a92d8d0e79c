use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Per-file extraction failures. None of these abort a batch.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type '.{extension}' for {filename}")]
    UnsupportedFileType { filename: String, extension: String },

    #[error("Could not read {filename}: {reason}")]
    UnreadableFile { filename: String, reason: String },

    #[error("OCR failed for {filename}: {reason}")]
    OcrFailed { filename: String, reason: String },
}

impl ExtractError {
    pub fn filename(&self) -> &str {
        match self {
            ExtractError::UnsupportedFileType { filename, .. }
            | ExtractError::UnreadableFile { filename, .. }
            | ExtractError::OcrFailed { filename, .. } => filename,
        }
    }

    pub fn kind(&self) -> SkipKind {
        match self {
            ExtractError::UnsupportedFileType { .. } => SkipKind::UnsupportedFileType,
            ExtractError::UnreadableFile { .. } | ExtractError::OcrFailed { .. } => {
                SkipKind::UnreadableFile
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    UnsupportedFileType,
    UnreadableFile,
}

/// A file left out of the batch, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub filename: String,
    pub kind: SkipKind,
    pub reason: String,
}

impl From<&ExtractError> for SkippedFile {
    fn from(err: &ExtractError) -> Self {
        Self {
            filename: err.filename().to_string(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

/// Whole-batch failures.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("No files were uploaded")]
    NoFiles,

    #[error("None of the {} uploaded file(s) could be processed", skipped.len())]
    NothingProcessed { skipped: Vec<SkippedFile> },
}

/// Environment problems, found at startup or by the health check.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{tool} not found at '{}': {reason}", path.display())]
    ToolUnavailable {
        tool: &'static str,
        path: PathBuf,
        reason: String,
    },
}

impl ConfigError {
    pub fn tool(&self) -> &'static str {
        match self {
            ConfigError::ToolUnavailable { tool, .. } => *tool,
        }
    }
}
