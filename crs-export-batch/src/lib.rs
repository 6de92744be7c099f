//! Batch export of every custom coordinate system into a directory taxonomy.
//!
//! A run takes the per-root lock, creates the live and archive trees,
//! archives any previous exports (copy, then delete), assigns shared
//! `Transformation_<n>` names to records whose rounded Helmert parameters
//! are equal and have no datum-table match, and writes one file per record
//! into the bucket chosen by [`Bucket::classify`]. A record whose name is
//! already taken in this run gets its SRID appended to the file stem.
//! Failures of individual records or files are logged and counted in the
//! [`BatchReport`]; they never abort the run.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use crs_export_batch::export_batch;
//! use crs_export_core::{ExportEngine, ExportFormat, SqliteCrsSource};
//!
//! let source = SqliteCrsSource::open("artifacts/crs.sqlite").expect("open database");
//! let engine = ExportEngine::new(source);
//! let report = export_batch(&engine, ExportFormat::PrjV1, Utf8Path::new("out"))
//!     .expect("run batch");
//! println!("{} files written", report.generated);
//! ```

#![forbid(unsafe_code)]

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use crs_export_core::naming::custom_base_name;
use crs_export_core::reference::resolve_datum;
use crs_export_core::source::CrsSource;
use crs_export_core::{CrsRecord, ExportEngine, ExportError, ExportFormat, ExportParams, TransformParameters};
use log::{debug, info, warn};
use thiserror::Error;

mod classify;
mod error;
mod grouping;
mod layout;
mod lock;
mod report;

pub use classify::{Bucket, ZoneWidth};
pub use error::BatchError;
pub use grouping::{HelmertSignature, TransformationGroups};
pub use layout::{ArchiveOutcome, BatchLayout};
pub use report::BatchReport;

/// Exports every custom record in `format` below `output_root` with default parameters.
///
/// # Errors
/// Returns [`BatchError`] when the output root cannot be resolved, the lock
/// is poisoned, the layout cannot be created, the live tree cannot be scanned or the custom records cannot be
/// listed.
pub fn export_batch<S: CrsSource>(
    engine: &ExportEngine<S>,
    format: ExportFormat,
    output_root: &Utf8Path,
) -> Result<BatchReport, BatchError> {
    export_batch_with(engine, format, output_root, &ExportParams::default())
}

/// Exports every custom record in `format` below `output_root` using `params`.
///
/// # Errors
/// See [`export_batch`].
pub fn export_batch_with<S: CrsSource>(
    engine: &ExportEngine<S>,
    format: ExportFormat,
    output_root: &Utf8Path,
    params: &ExportParams,
) -> Result<BatchReport, BatchError> {
    lock::with_root_lock(output_root, || run(engine, format, output_root, params))
}

fn run<S: CrsSource>(
    engine: &ExportEngine<S>,
    format: ExportFormat,
    output_root: &Utf8Path,
    params: &ExportParams,
) -> Result<BatchReport, BatchError> {
    let layout = BatchLayout::new(output_root, format);
    layout.create()?;
    let archive = layout.archive_existing()?;
    let srids = engine
        .source()
        .custom_srids()
        .map_err(|source| BatchError::ListRecords { source })?;

    let mut report = BatchReport {
        archived: archive.archived,
        archive_failures: archive.failures,
        ..BatchReport::default()
    };
    let mut groups = TransformationGroups::new();
    let mut written = HashSet::new();
    for srid in srids {
        let record = match engine.resolver().resolve(srid) {
            Ok(record) => record,
            Err(err) => {
                warn!("skipping SRID {srid}: {err}");
                report.skipped += 1;
                continue;
            }
        };
        let job = RecordJob {
            record: &record,
            format,
            params,
            layout: &layout,
        };
        match job.write(engine, &mut groups, &mut written) {
            Ok(path) => {
                debug!("SRID {srid}: wrote {path}");
                report.generated += 1;
            }
            Err(err) => {
                warn!("skipping SRID {srid}: {err}");
                report.skipped += 1;
            }
        }
    }
    report.groups = groups.len();
    info!(
        "batch {format} into {}: {} generated, {} skipped, {} archived",
        layout.live_root(),
        report.generated,
        report.skipped,
        report.archived
    );
    Ok(report)
}

#[derive(Debug, Error)]
enum RecordError {
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{path} was already written by this run")]
    Collision { path: Utf8PathBuf },
    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

struct RecordJob<'a> {
    record: &'a CrsRecord,
    format: ExportFormat,
    params: &'a ExportParams,
    layout: &'a BatchLayout,
}

impl RecordJob<'_> {
    fn write<S: CrsSource>(
        &self,
        engine: &ExportEngine<S>,
        groups: &mut TransformationGroups,
        written: &mut HashSet<Utf8PathBuf>,
    ) -> Result<Utf8PathBuf, RecordError> {
        let shared_datum = self.shared_datum(engine, groups)?;
        let output =
            engine.export_record(self.record, self.format, self.params, shared_datum.as_deref())?;
        let path = self.target_path(written)?;
        crs_export_fs::write_file(&path, &output.to_bytes()).map_err(|source| {
            RecordError::Write {
                path: path.clone(),
                source,
            }
        })?;
        written.insert(path.clone());
        Ok(path)
    }

    /// Group name for records whose transform has no datum-table match.
    fn shared_datum<S: CrsSource>(
        &self,
        engine: &ExportEngine<S>,
        groups: &mut TransformationGroups,
    ) -> Result<Option<String>, RecordError> {
        let Some(proj4) = self.record.proj4() else {
            return Ok(None);
        };
        let parameters = TransformParameters::from_proj4(proj4).map_err(ExportError::from)?;
        if resolve_datum(engine.source(), &parameters.datum_query()).is_some() {
            return Ok(None);
        }
        Ok(Some(groups.assign(&parameters.helmert).to_owned()))
    }

    /// Live path of the record, suffixed with the SRID when an earlier record
    /// of this run already took the plain name.
    fn target_path(&self, written: &HashSet<Utf8PathBuf>) -> Result<Utf8PathBuf, RecordError> {
        let stem = custom_base_name(self.record)
            .unwrap_or_else(|| format!("custom_srid_{}", self.record.srid));
        let extension = self.format.extension();
        let plain = self.layout.live_path(&format!("{stem}.{extension}"));
        if !written.contains(&plain) {
            return Ok(plain);
        }
        let suffixed = plain.with_file_name(format!("{stem}_{}.{extension}", self.record.srid));
        if written.contains(&suffixed) {
            return Err(RecordError::Collision { path: suffixed });
        }
        warn!(
            "SRID {}: {plain} already written, using {suffixed}",
            self.record.srid
        );
        Ok(suffixed)
    }
}
