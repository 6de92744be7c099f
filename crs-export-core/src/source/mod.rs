//! Query interface over the CRS tables.
//!
//! The engine consumes rows through [`CrsSource`]; each lookup is a single
//! parameterised query and no transactions are needed. Implementations must
//! be safe for concurrent reads because reference tables are shared by every
//! export.

use thiserror::Error;

use crate::reference::{DatumEntry, EllipsoidInfo};
use crate::{BoundingBox, Srid};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "store-sqlite")))]
pub use sqlite::{SqliteCrsSource, SqliteCrsSourceError};

/// Row of the authoritative `spatial_ref_sys` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoritativeRow {
    /// Record identifier.
    pub srid: Srid,
    /// Authority name.
    pub authority: String,
    /// Identifier within the authority.
    pub authority_srid: i64,
    /// Stored WKT.
    pub wkt_text: Option<String>,
    /// Stored PROJ4 definition.
    pub proj4_text: Option<String>,
}

/// Row of the custom metadata table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomMetadata {
    /// Free-text description.
    pub description: Option<String>,
    /// Reliability marker.
    pub reliability: Option<String>,
    /// User-facing name.
    pub custom_name: Option<String>,
    /// Extent of the stored geometry, when it could be parsed.
    pub bounding_box: Option<BoundingBox>,
}

/// Failure of the underlying query interface.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A SQLite query failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to {operation}: {source}")]
    Sqlite {
        /// Description of the query.
        operation: &'static str,
        /// Error reported by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored row violated the schema's expectations.
    #[error("stored row for SRID {srid} is invalid: {reason}")]
    InvalidRow {
        /// Raw identifier of the row.
        srid: i64,
        /// What was wrong with it.
        reason: String,
    },
    /// The source could not be reached.
    #[error("CRS source unavailable: {message}")]
    Unavailable {
        /// Diagnostic message.
        message: String,
    },
}

/// Read-only access to CRS rows and reference tables.
pub trait CrsSource {
    /// Fetches the authoritative row for `srid`.
    fn authoritative(&self, srid: Srid) -> Result<Option<AuthoritativeRow>, SourceError>;

    /// Fetches custom metadata for `srid`.
    fn custom_metadata(&self, srid: Srid) -> Result<Option<CustomMetadata>, SourceError>;

    /// Lists the SRIDs whose authority is the custom marker, in ascending order.
    fn custom_srids(&self) -> Result<Vec<Srid>, SourceError>;

    /// Looks up an ellipsoid by case-insensitive short name.
    fn ellipsoid(&self, short_name: &str) -> Result<Option<EllipsoidInfo>, SourceError>;

    /// Returns every row of the datum reference table.
    fn datum_entries(&self) -> Result<Vec<DatumEntry>, SourceError>;
}

impl<T: CrsSource + ?Sized> CrsSource for &T {
    fn authoritative(&self, srid: Srid) -> Result<Option<AuthoritativeRow>, SourceError> {
        (**self).authoritative(srid)
    }

    fn custom_metadata(&self, srid: Srid) -> Result<Option<CustomMetadata>, SourceError> {
        (**self).custom_metadata(srid)
    }

    fn custom_srids(&self) -> Result<Vec<Srid>, SourceError> {
        (**self).custom_srids()
    }

    fn ellipsoid(&self, short_name: &str) -> Result<Option<EllipsoidInfo>, SourceError> {
        (**self).ellipsoid(short_name)
    }

    fn datum_entries(&self) -> Result<Vec<DatumEntry>, SourceError> {
        (**self).datum_entries()
    }
}
