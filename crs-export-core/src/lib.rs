//! Core types and generators for exporting coordinate reference systems.
//!
//! A caller supplies an SRID and an [`ExportFormat`]. The
//! [`resolver::CrsResolver`] fetches the record through a [`CrsSource`], the
//! [`proj4`] normalizer extracts Helmert and projection parameters, the
//! [`reference`] module resolves ellipsoid and datum identities, the format's
//! generator produces the document and [`naming`] derives its filename.
//! [`ExportEngine`] composes these steps.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod engine;
mod error;
mod format;
pub mod generators;
pub mod naming;
pub mod proj4;
mod record;
pub mod reference;
pub mod resolver;
mod srid;
pub mod source;
pub mod wkt;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use engine::{Clock, ExportEngine, ExportStage};
pub use error::{ExportError, GenerationError, ValidationError};
pub use format::{CoordinateOrder, ExportFormat, ExportParams, OutputText, TextEncoding};
pub use proj4::{HelmertTransform, ProjectionParameters, TransformParameters};
pub use record::{BoundingBox, CUSTOM_AUTHORITY, CrsRecord};
pub use reference::{DatumMatch, EllipsoidInfo};
pub use resolver::CrsResolver;
pub use source::{CrsSource, SourceError};
#[cfg(feature = "store-sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "store-sqlite")))]
pub use source::{SqliteCrsSource, SqliteCrsSourceError};
pub use srid::{Hemisphere, UTM_NORTH_BASE, UTM_SOUTH_BASE, UtmZone, Srid};
