//! Error types raised by batch exports.

use camino::Utf8PathBuf;
use crs_export_core::SourceError;
use thiserror::Error;

/// Errors that abort a whole batch run.
///
/// Failures tied to a single record or file are logged and counted in the
/// [`BatchReport`](crate::BatchReport) instead.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Another batch run panicked while holding the lock for this root.
    #[error("batch lock for {root} is poisoned")]
    LockPoisoned {
        /// Output root guarded by the lock.
        root: Utf8PathBuf,
    },
    /// The output root could not be created or canonicalised.
    #[error("failed to resolve output root {path}")]
    ResolveRoot {
        /// Output root as given by the caller.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Creating a directory of the output layout failed.
    #[error("failed to create directory {path}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Listing existing files in the live tree failed.
    #[error("failed to scan {path} for existing exports")]
    ScanTree {
        /// Root of the scanned tree.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Listing custom SRIDs from the source failed.
    #[error("failed to list custom coordinate systems")]
    ListRecords {
        /// Source error from the CRS source.
        #[source]
        source: SourceError,
    },
}
