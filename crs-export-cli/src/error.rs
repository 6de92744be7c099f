//! Error types emitted by the `crs-export` CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use crs_export_batch::BatchError;
use crs_export_core::{ExportError, SqliteCrsSourceError, ValidationError};
use thiserror::Error;

/// Errors emitted by the `crs-export` CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option value could not be interpreted.
    #[error("invalid {field}: {source}")]
    InvalidOption {
        field: &'static str,
        #[source]
        source: ValidationError,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the CRS database failed.
    #[error(transparent)]
    OpenDatabase(#[from] SqliteCrsSourceError),
    /// Exporting a single SRID failed.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    /// A batch run failed.
    #[error("batch export failed: {0}")]
    Batch(#[from] BatchError),
    /// Writing an exported file failed.
    #[error("failed to write export to {path:?}: {source}")]
    WriteExport {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Serialising the batch report failed.
    #[error("failed to serialise batch report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
