//! Facade crate for the coordinate reference system exporter.
//!
//! This crate re-exports the core export types and exposes the SQLite
//! source and the batch exporter behind feature flags.

#![forbid(unsafe_code)]

pub use crs_export_core::{
    BoundingBox, CoordinateOrder, CrsRecord, CrsResolver, CrsSource, ExportEngine, ExportError,
    ExportFormat, ExportParams, GenerationError, OutputText, SourceError, Srid, TextEncoding,
    UtmZone, ValidationError,
};

#[cfg(feature = "store-sqlite")]
pub use crs_export_core::{SqliteCrsSource, SqliteCrsSourceError};

#[cfg(feature = "batch")]
pub use crs_export_batch::{BatchError, BatchReport, Bucket, export_batch};
