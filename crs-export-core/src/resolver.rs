//! Record resolution with the UTM short-circuit.

use log::debug;

use crate::source::CrsSource;
use crate::{CrsRecord, ExportError, Srid};

/// Fetches records from a [`CrsSource`].
///
/// UTM zone SRIDs never touch the custom metadata table: the check runs
/// before any custom query.
#[derive(Debug, Clone, Copy)]
pub struct CrsResolver<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: CrsSource + ?Sized> CrsResolver<'a, S> {
    /// Wraps a source.
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Resolves `srid` into a joined record.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NotFound`] when no authoritative row exists for
    /// a non-UTM SRID, and [`ExportError::Source`] when a query fails.
    pub fn resolve(&self, srid: Srid) -> Result<CrsRecord, ExportError> {
        if let Some(zone) = srid.utm_zone() {
            return Ok(match self.source.authoritative(srid)? {
                Some(row) => CrsRecord::from_parts(row, None),
                None => {
                    debug!("SRID {srid}: no stored row, using canonical UTM definition");
                    CrsRecord::canonical_utm(zone)
                }
            });
        }
        let row = self
            .source
            .authoritative(srid)?
            .ok_or(ExportError::NotFound { srid })?;
        let metadata = self.source.custom_metadata(srid)?;
        Ok(CrsRecord::from_parts(row, metadata))
    }

    /// Returns `true` when the stored authority is the custom marker.
    pub fn is_custom(&self, srid: Srid) -> Result<bool, ExportError> {
        Ok(self
            .source
            .authoritative(srid)?
            .is_some_and(|row| row.authority.trim().eq_ignore_ascii_case(crate::CUSTOM_AUTHORITY)))
    }

    /// Returns `true` for UTM zones and custom records.
    pub fn is_supported(&self, srid: Srid) -> Result<bool, ExportError> {
        if srid.utm_zone().is_some() {
            return Ok(true);
        }
        self.is_custom(srid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemorySource, custom_record};
    use rstest::{fixture, rstest};

    #[fixture]
    fn source() -> MemorySource {
        MemorySource::new()
            .with_record(
                CrsRecord::new(Srid::new(4326).expect("srid"), "EPSG", 4326)
                    .with_wkt("GEOGCS[\"WGS 84\"]"),
            )
            .with_record(
                custom_record(100_010, "MSK-01 zone 1", "+proj=tmerc +ellps=krass")
                    .with_description("Adygea"),
            )
    }

    #[rstest]
    fn joins_custom_metadata(source: MemorySource) {
        let record = CrsResolver::new(&source)
            .resolve(Srid::new(100_010).expect("srid"))
            .expect("record");
        assert!(record.is_custom());
        assert_eq!(record.description.as_deref(), Some("Adygea"));
        assert_eq!(record.custom_name.as_deref(), Some("MSK-01 zone 1"));
    }

    #[rstest]
    fn missing_rows_are_not_found(source: MemorySource) {
        let srid = Srid::new(12_345).expect("srid");
        let err = CrsResolver::new(&source).resolve(srid).expect_err("missing");
        assert!(matches!(err, ExportError::NotFound { srid: missing } if missing == srid));
    }

    #[rstest]
    fn utm_resolution_skips_custom_queries(source: MemorySource) {
        let resolver = CrsResolver::new(&source);
        let record = resolver
            .resolve(Srid::new(32760).expect("srid"))
            .expect("canonical record");
        assert_eq!(record.authority, "EPSG");
        assert!(record.wkt().is_some_and(|wkt| wkt.contains("UTM zone 60S")));
        assert!(resolver.is_supported(Srid::new(32601).expect("srid")).expect("supported"));
        assert_eq!(source.custom_queries(), 0);
    }

    #[rstest]
    #[case(100_010, true)]
    #[case(4326, false)]
    #[case(999, false)]
    fn reports_custom_support(source: MemorySource, #[case] raw: i64, #[case] expected: bool) {
        let resolver = CrsResolver::new(&source);
        let srid = Srid::new(raw).expect("srid");
        assert_eq!(resolver.is_custom(srid).expect("query"), expected);
        assert_eq!(resolver.is_supported(srid).expect("query"), expected);
    }

    #[rstest]
    fn source_failures_propagate() {
        let source = MemorySource::unavailable();
        let err = CrsResolver::new(&source)
            .resolve(Srid::new(4326).expect("srid"))
            .expect_err("unavailable");
        assert!(matches!(err, ExportError::Source(_)));
    }
}
