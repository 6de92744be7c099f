//! Error taxonomy shared by the resolver, normalizer and generators.

use thiserror::Error;

use crate::Srid;
use crate::source::SourceError;

/// Input or source data that can never produce an export.
///
/// Always surfaced to the caller and never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The SRID was not a positive integer.
    #[error("invalid SRID {raw:?}: expected a positive integer")]
    InvalidSrid {
        /// Raw input as supplied by the caller.
        raw: String,
    },
    /// The record carries neither WKT nor PROJ4 text.
    #[error("SRID {srid} has neither WKT nor PROJ4 text")]
    MissingDefinition {
        /// Record identifier.
        srid: Srid,
    },
    /// A field required by the requested format is absent.
    #[error("SRID {srid} is missing required field `{field}`")]
    MissingField {
        /// Record identifier.
        srid: Srid,
        /// Column name of the missing field.
        field: &'static str,
    },
    /// A PROJ4 parameter was present but could not be parsed.
    #[error("malformed value {value:?} for PROJ4 parameter `{key}`")]
    MalformedParameters {
        /// Parameter key without the leading `+`.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },
    /// The format key does not name a supported export format.
    #[error("unknown export format {key:?} (expected civil3d, prj_GMv20 or prj_GMv25)")]
    UnknownFormat {
        /// Key as supplied by the caller.
        key: String,
    },
    /// An export parameter carried an unsupported value.
    #[error("invalid value {value:?} for export parameter `{name}` (expected {expected})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Human-readable list of accepted values.
        expected: String,
    },
}

/// Internal failure while assembling generated output.
///
/// The XML generator absorbs these into a stub document; the PRJ generators
/// propagate them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The XML writer rejected an event.
    #[error("failed to write XML for SRID {srid}: {message}")]
    Xml {
        /// Record identifier.
        srid: Srid,
        /// Writer error message.
        message: String,
    },
    /// A value contains a character that cannot appear in the output document.
    #[error("character {character:?} in <{element}> cannot be encoded")]
    InvalidCharacter {
        /// Offending character.
        character: char,
        /// Element or attribute owner that carried the value.
        element: String,
    },
    /// Datum parameters were required but the record has no PROJ4 text.
    #[error("SRID {srid} has no PROJ4 text to derive datum parameters from")]
    MissingProj4 {
        /// Record identifier.
        srid: Srid,
    },
}

/// Error returned by [`crate::ExportEngine::export`].
#[derive(Debug, Error)]
pub enum ExportError {
    /// Invalid input or incomplete source data.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No row exists for the SRID.
    #[error("SRID {srid} was not found")]
    NotFound {
        /// Requested identifier.
        srid: Srid,
    },
    /// Output assembly failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// The query interface failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}
