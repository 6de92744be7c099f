//! In-memory `CrsSource` and fixtures shared by unit and integration tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use crate::reference::{DatumEntry, EllipsoidInfo, fallback_ellipsoid};
use crate::source::{AuthoritativeRow, CrsSource, CustomMetadata, SourceError};
use crate::{BoundingBox, CrsRecord, Srid};

/// In-memory `CrsSource` implementation used in tests.
///
/// Lookups are linear scans or map reads over small fixtures. Custom
/// metadata queries are counted so tests can assert they were skipped.
#[derive(Debug, Default)]
pub struct MemorySource {
    authoritative: BTreeMap<Srid, AuthoritativeRow>,
    custom: BTreeMap<Srid, CustomMetadata>,
    ellipsoids: Vec<EllipsoidInfo>,
    datums: Vec<DatumEntry>,
    custom_queries: AtomicUsize,
    unavailable: bool,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source whose every query fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Adds a record, splitting it into authoritative and custom rows.
    #[must_use]
    pub fn with_record(mut self, record: CrsRecord) -> Self {
        let has_metadata = record.is_custom()
            || record.description.is_some()
            || record.reliability.is_some()
            || record.custom_name.is_some()
            || record.bounding_box.is_some();
        if has_metadata {
            self.custom.insert(
                record.srid,
                CustomMetadata {
                    description: record.description,
                    reliability: record.reliability,
                    custom_name: record.custom_name,
                    bounding_box: record.bounding_box,
                },
            );
        }
        self.authoritative.insert(
            record.srid,
            AuthoritativeRow {
                srid: record.srid,
                authority: record.authority,
                authority_srid: record.authority_srid,
                wkt_text: record.wkt_text,
                proj4_text: record.proj4_text,
            },
        );
        self
    }

    /// Adds records in order.
    #[must_use]
    pub fn with_records<I>(self, records: I) -> Self
    where
        I: IntoIterator<Item = CrsRecord>,
    {
        records.into_iter().fold(self, Self::with_record)
    }

    /// Adds an ellipsoid reference row.
    #[must_use]
    pub fn with_ellipsoid(mut self, ellipsoid: EllipsoidInfo) -> Self {
        self.ellipsoids.push(ellipsoid);
        self
    }

    /// Adds datum reference rows.
    #[must_use]
    pub fn with_datums<I>(mut self, datums: I) -> Self
    where
        I: IntoIterator<Item = DatumEntry>,
    {
        self.datums.extend(datums);
        self
    }

    /// Number of custom metadata queries served so far.
    pub fn custom_queries(&self) -> usize {
        self.custom_queries.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), SourceError> {
        if self.unavailable {
            return Err(SourceError::Unavailable {
                message: "memory source marked unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

impl CrsSource for MemorySource {
    fn authoritative(&self, srid: Srid) -> Result<Option<AuthoritativeRow>, SourceError> {
        self.check()?;
        Ok(self.authoritative.get(&srid).cloned())
    }

    fn custom_metadata(&self, srid: Srid) -> Result<Option<CustomMetadata>, SourceError> {
        self.custom_queries.fetch_add(1, Ordering::Relaxed);
        self.check()?;
        Ok(self.custom.get(&srid).cloned())
    }

    fn custom_srids(&self) -> Result<Vec<Srid>, SourceError> {
        self.check()?;
        Ok(self
            .authoritative
            .values()
            .filter(|row| row.authority.trim().eq_ignore_ascii_case(crate::CUSTOM_AUTHORITY))
            .map(|row| row.srid)
            .collect())
    }

    fn ellipsoid(&self, short_name: &str) -> Result<Option<EllipsoidInfo>, SourceError> {
        self.check()?;
        Ok(self
            .ellipsoids
            .iter()
            .find(|info| info.short_name.eq_ignore_ascii_case(short_name))
            .cloned())
    }

    fn datum_entries(&self) -> Result<Vec<DatumEntry>, SourceError> {
        self.check()?;
        Ok(self.datums.clone())
    }
}

/// Builds a custom record with a name, PROJ4 text and a fixed extent.
///
/// # Panics
///
/// Panics when `raw_srid` is not positive.
#[must_use]
pub fn custom_record(raw_srid: i64, name: &str, proj4: &str) -> CrsRecord {
    let srid = Srid::new(raw_srid).expect("fixture SRID must be positive");
    CrsRecord::new(srid, crate::CUSTOM_AUTHORITY, raw_srid)
        .with_proj4(proj4)
        .with_custom_name(name)
        .with_bounding_box(BoundingBox {
            west: 36.0,
            east: 42.0,
            south: 44.0,
            north: 48.0,
        })
}

/// Ellipsoid rows matching the built-in fallback values.
#[must_use]
pub fn sample_ellipsoids() -> Vec<EllipsoidInfo> {
    ["wgs84", "grs80", "bessel", "krass"]
        .into_iter()
        .map(fallback_ellipsoid)
        .collect()
}

/// Datum rows for Pulkovo 1942 and WGS 84.
#[must_use]
pub fn sample_datums() -> Vec<DatumEntry> {
    vec![
        DatumEntry {
            transform: "+towgs84=23.57,-140.95,-79.8,0,0.35,0.79,-0.22".to_owned(),
            canonical_name: "Pulkovo_1942".to_owned(),
        },
        DatumEntry {
            transform: "+towgs84=0,0,0,0,0,0,0".to_owned(),
            canonical_name: "WGS_1984".to_owned(),
        },
    ]
}

/// Clock fixed at 2024-01-02T03:04:05Z.
#[must_use]
pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
        .single()
        .unwrap_or_default()
}

/// Writes a SQLite database containing `records` and reference rows.
#[cfg(feature = "store-sqlite")]
pub fn write_sqlite_database(
    path: &std::path::Path,
    records: &[CrsRecord],
    ellipsoids: &[EllipsoidInfo],
    datums: &[DatumEntry],
) -> rusqlite::Result<()> {
    use rusqlite::{Connection, params};

    let mut connection = Connection::open(path)?;
    crate::source::SqliteCrsSource::create_schema(&connection)?;
    let tx = connection.transaction()?;
    for record in records {
        let srid = i64::from(record.srid);
        tx.execute(
            "INSERT INTO spatial_ref_sys (srid, auth_name, auth_srid, srtext, proj4text) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                srid,
                record.authority,
                record.authority_srid,
                record.wkt_text,
                record.proj4_text
            ],
        )?;
        if record.is_custom() {
            let geometry = record.bounding_box.map(|bbox| {
                format!(
                    "POLYGON(({w} {s}, {e} {s}, {e} {n}, {w} {n}, {w} {s}))",
                    w = bbox.west,
                    e = bbox.east,
                    s = bbox.south,
                    n = bbox.north
                )
            });
            tx.execute(
                "INSERT INTO custom_geom (srid, name, info, p, geom) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    srid,
                    record.custom_name,
                    record.description,
                    record.reliability,
                    geometry
                ],
            )?;
        }
    }
    for ellipsoid in ellipsoids {
        tx.execute(
            "INSERT INTO ellps_all (name_el, a, b, gm_ellipsoid_id, display_name, description) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ellipsoid.short_name,
                ellipsoid.semi_major_axis,
                ellipsoid.semi_minor_axis,
                ellipsoid.canonical_id,
                ellipsoid.display_name,
                ellipsoid.description
            ],
        )?;
    }
    for datum in datums {
        tx.execute(
            "INSERT INTO datum_all (datum, name_d) VALUES (?1, ?2)",
            params![datum.transform, datum.canonical_name],
        )?;
    }
    tx.commit()
}
