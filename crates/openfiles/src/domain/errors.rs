//! Domain-specific errors.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::domain::model::MarkdownReport;

/// Failure reported by a host editor API.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host service unavailable: {0}")]
    Unavailable(String),
    #[error("host I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file is not open in the host: {0}")]
    UnknownFile(PathBuf),
}

/// Failure reading the contents of a single file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("{path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: contents are not valid UTF-8", path = .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },
    #[error("{path}: {message}", path = .path.display())]
    Unavailable { path: PathBuf, message: String },
}

/// Failure producing a Markdown report.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing is open; callers surface this as an informational notice.
    #[error("no open files to preview")]
    EmptyInput,
    #[error("template '{name}' failed: {message}")]
    Template { name: String, message: String },
    #[error("failed to format export timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Failure of the preview pipeline after the report was requested.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Export(ExportError),
    /// The report was rendered but could not be written or handed to the host.
    #[error("failed to write preview: {source}")]
    Write {
        report: MarkdownReport,
        #[source]
        source: HostError,
    },
}
