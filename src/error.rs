//! Error types for elca-bridge.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading eLCA reports or IFC files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read an input file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The HTML report does not follow the eLCA report template.
    #[error("invalid eLCA HTML report: {message}")]
    InvalidHtml { message: String },

    /// The XML project export is ill-formed.
    #[error("invalid eLCA XML project: {message}")]
    InvalidXml { message: String },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format: {message}")]
    InvalidStep { message: String },
}

/// Errors from parsing a single thickness string.
///
/// These never abort a stage: callers fall back to
/// [`crate::parser::thickness::DEFAULT_LAYER_THICKNESS_M`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThicknessError {
    #[error("thickness text is empty")]
    Empty,

    #[error("'{text}' is not a number")]
    InvalidNumber { text: String },

    #[error("thickness {value} is negative or not finite")]
    OutOfRange { value: f64 },
}

/// Errors that can occur when reading or writing the session snapshot.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("session snapshot is not valid JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Snapshot was written by another tool or an incompatible version.
    #[error("incompatible session snapshot (format '{format}', version {version})")]
    Incompatible { format: String, version: u32 },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },

    /// Reading the library or project file failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The library could not be merged into the project file.
    #[error("cannot attach library: {message}")]
    Attach { message: String },
}

/// Precondition and stage failures of the load / create workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("no HTML results loaded, run load-html first")]
    HtmlNotLoaded,

    #[error("no XML project loaded, run load-xml first")]
    XmlNotLoaded,

    #[error("no processed building elements found, reload the XML file")]
    NoElements,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
