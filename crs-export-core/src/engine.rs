//! The export pipeline: validate, resolve, normalise, generate, name.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::generators::{GenerationContext, Geodesy};
use crate::naming::derive_filename;
use crate::proj4::TransformParameters;
use crate::reference::{DatumMatch, resolve_datum, resolve_ellipsoid};
use crate::resolver::CrsResolver;
use crate::source::CrsSource;
use crate::{CrsRecord, ExportError, ExportFormat, ExportParams, OutputText, Srid};

/// Stage of a single export call, reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    /// Nothing started.
    Idle,
    /// Checking the SRID and parameters.
    Validating,
    /// Fetching the record.
    Resolving,
    /// Normalising parameters and assembling output.
    Generating,
    /// Output produced.
    Done,
    /// The call failed.
    Failed,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Resolving => "resolving",
            Self::Generating => "generating",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Clock used for export timestamps.
pub type Clock = fn() -> DateTime<Utc>;

/// Stateless CRS export engine over a [`CrsSource`].
///
/// Calls share nothing but the read-only source, so one engine can serve
/// concurrent exports when `S` is `Sync`.
///
/// # Examples
///
/// ```
/// use crs_export_core::{ExportEngine, ExportFormat, source::SqliteCrsSource};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connection = rusqlite::Connection::open_in_memory()?;
/// SqliteCrsSource::create_schema(&connection)?;
/// let engine = ExportEngine::new(SqliteCrsSource::from_connection(connection));
/// let output = engine.export(32601, ExportFormat::PrjV1, None)?;
/// assert_eq!(output.filename, "UTM_zone_01N.prj");
/// assert!(output.content.contains("PROJCS"));
/// # Ok(())
/// # }
/// ```
pub struct ExportEngine<S> {
    source: S,
    clock: Clock,
}

impl<S: fmt::Debug> fmt::Debug for ExportEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportEngine")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<S: CrsSource> ExportEngine<S> {
    /// Creates an engine stamping output with the system clock.
    pub fn new(source: S) -> Self {
        Self {
            source,
            clock: Utc::now,
        }
    }

    /// Replaces the clock, typically with a fixed time in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Borrows the underlying source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Resolver over the engine's source.
    pub const fn resolver(&self) -> CrsResolver<'_, S> {
        CrsResolver::new(&self.source)
    }

    /// Exports one SRID in `format`.
    ///
    /// # Errors
    ///
    /// Validation errors for bad input or incomplete records,
    /// [`ExportError::NotFound`] for unknown SRIDs, PRJ generation errors and
    /// source failures. XML generation failures yield a stub instead.
    pub fn export(
        &self,
        srid: i64,
        format: ExportFormat,
        params: Option<&ExportParams>,
    ) -> Result<OutputText, ExportError> {
        let defaults = ExportParams::default();
        let effective = params.unwrap_or(&defaults);
        debug!("export {srid} as {format}: {}", ExportStage::Idle);

        let result = self.run(srid, format, effective);
        match &result {
            Ok(output) => debug!(
                "export {srid} as {format}: {} ({})",
                ExportStage::Done,
                output.filename
            ),
            Err(err) => warn!("export {srid} as {format}: {}: {err}", ExportStage::Failed),
        }
        result
    }

    fn run(
        &self,
        raw: i64,
        format: ExportFormat,
        params: &ExportParams,
    ) -> Result<OutputText, ExportError> {
        debug!("export {raw} as {format}: {}", ExportStage::Validating);
        let srid = Srid::new(raw)?;
        params.validate_for(format)?;

        debug!("export {srid} as {format}: {}", ExportStage::Resolving);
        let record = self.resolver().resolve(srid)?;
        self.export_record(&record, format, params, None)
    }

    /// Exports an already resolved record.
    ///
    /// `shared_datum` replaces the `Transformation-<srid>` fallback when the
    /// datum table has no match; batch runs pass the group's shared name.
    pub fn export_record(
        &self,
        record: &CrsRecord,
        format: ExportFormat,
        params: &ExportParams,
        shared_datum: Option<&str>,
    ) -> Result<OutputText, ExportError> {
        record.ensure_definition()?;
        debug!("export {} as {format}: {}", record.srid, ExportStage::Generating);
        let geodesy = self.geodesy(record, shared_datum)?;
        let context = GenerationContext {
            generated_at: (self.clock)(),
            params,
        };
        let content = format.generate(record, geodesy.as_ref(), &context)?;
        Ok(OutputText {
            content: params.encoding.prepare(content),
            filename: derive_filename(record, format),
            format,
            encoding: params.encoding,
        })
    }

    /// Normalises PROJ4 text and resolves ellipsoid and datum.
    ///
    /// Returns `None` when the record has no PROJ4 text.
    pub fn geodesy(
        &self,
        record: &CrsRecord,
        shared_datum: Option<&str>,
    ) -> Result<Option<Geodesy>, ExportError> {
        let Some(proj4) = record.proj4() else {
            return Ok(None);
        };
        let parameters = TransformParameters::from_proj4(proj4)?;
        let ellipsoid = resolve_ellipsoid(&self.source, &parameters.ellipsoid_key);
        let datum_name = resolve_datum(&self.source, &parameters.datum_query())
            .map(|found| found.canonical_name)
            .or_else(|| shared_datum.map(str::to_owned))
            .unwrap_or_else(|| DatumMatch::fallback(record.srid).canonical_name);
        Ok(Some(Geodesy {
            parameters,
            ellipsoid,
            datum_name,
        }))
    }
}
