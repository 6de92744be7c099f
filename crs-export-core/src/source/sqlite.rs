//! SQLite-backed implementation of [`CrsSource`].

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Mutex,
};

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use thiserror::Error;

use crate::reference::{DatumEntry, EllipsoidInfo};
use crate::{BoundingBox, Srid};

use super::{AuthoritativeRow, CrsSource, CustomMetadata, SourceError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS spatial_ref_sys (
        srid INTEGER PRIMARY KEY,
        auth_name TEXT,
        auth_srid INTEGER,
        srtext TEXT,
        proj4text TEXT
    );
    CREATE TABLE IF NOT EXISTS custom_geom (
        srid INTEGER PRIMARY KEY,
        name TEXT,
        info TEXT,
        p TEXT,
        geom TEXT
    );
    CREATE TABLE IF NOT EXISTS ellps_all (
        name_el TEXT PRIMARY KEY,
        a REAL,
        b REAL,
        gm_ellipsoid_id TEXT,
        display_name TEXT,
        description TEXT
    );
    CREATE TABLE IF NOT EXISTS datum_all (
        datum TEXT,
        name_d TEXT
    );
";

/// Error raised when opening a SQLite CRS database.
#[derive(Debug, Error)]
pub enum SqliteCrsSourceError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// Read-only CRS source backed by a SQLite database.
///
/// The connection is guarded by a mutex so the source can be shared between
/// threads exporting different SRIDs.
pub struct SqliteCrsSource {
    connection: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl fmt::Debug for SqliteCrsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCrsSource")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteCrsSource {
    /// Opens the database at `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteCrsSourceError> {
        let db_path = path.as_ref();
        let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SqliteCrsSourceError::OpenDatabase {
                path: db_path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            connection: Mutex::new(connection),
            path: Some(db_path.to_path_buf()),
        })
    }

    /// Wraps an existing connection, for example an in-memory database.
    #[must_use]
    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
            path: None,
        }
    }

    /// Creates the four CRS tables when they do not exist.
    pub fn create_schema(connection: &Connection) -> rusqlite::Result<()> {
        connection.execute_batch(SCHEMA)
    }

    fn with_connection<T>(
        &self,
        operation: &'static str,
        query: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, SourceError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| SourceError::Unavailable {
                message: "SQLite connection lock poisoned".to_owned(),
            })?;
        query(&connection).map_err(|source| SourceError::Sqlite { operation, source })
    }
}

type RawAuthoritativeRow = (i64, Option<String>, Option<i64>, Option<String>, Option<String>);

impl CrsSource for SqliteCrsSource {
    fn authoritative(&self, srid: Srid) -> Result<Option<AuthoritativeRow>, SourceError> {
        let raw: Option<RawAuthoritativeRow> =
            self.with_connection("query spatial_ref_sys", |connection| {
                connection
                    .query_row(
                        "SELECT srid, auth_name, auth_srid, srtext, proj4text \
                         FROM spatial_ref_sys WHERE srid = ?1",
                        params![i64::from(srid)],
                        |row| {
                            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                        },
                    )
                    .optional()
            })?;

        raw.map(|(raw_srid, raw_authority, authority_srid, wkt_text, proj4_text)| {
            let row_srid = Srid::new(raw_srid).map_err(|err| SourceError::InvalidRow {
                srid: raw_srid,
                reason: err.to_string(),
            })?;
            let authority = raw_authority.filter(|name| !name.trim().is_empty()).ok_or_else(|| {
                SourceError::InvalidRow {
                    srid: raw_srid,
                    reason: "auth_name is empty".to_owned(),
                }
            })?;
            Ok(AuthoritativeRow {
                srid: row_srid,
                authority,
                authority_srid: authority_srid.unwrap_or(raw_srid),
                wkt_text,
                proj4_text,
            })
        })
        .transpose()
    }

    fn custom_metadata(&self, srid: Srid) -> Result<Option<CustomMetadata>, SourceError> {
        let raw: Option<(Option<String>, Option<String>, Option<String>, Option<String>)> = self
            .with_connection("query custom_geom", |connection| {
                connection
                    .query_row(
                        "SELECT info, p, name, geom FROM custom_geom WHERE srid = ?1",
                        params![i64::from(srid)],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()
            })?;

        Ok(raw.map(|(description, reliability, custom_name, geometry)| {
            let bounding_box = geometry.as_deref().and_then(|text| {
                let bbox = BoundingBox::from_geometry_text(text);
                if bbox.is_none() {
                    log::warn!("SRID {srid}: stored geometry has no usable extent");
                }
                bbox
            });
            CustomMetadata {
                description,
                reliability,
                custom_name,
                bounding_box,
            }
        }))
    }

    fn custom_srids(&self) -> Result<Vec<Srid>, SourceError> {
        let raw: Vec<i64> = self.with_connection("list custom SRIDs", |connection| {
            let mut statement = connection.prepare(
                "SELECT srid FROM spatial_ref_sys \
                 WHERE lower(trim(auth_name)) = 'custom' ORDER BY srid",
            )?;
            let rows = statement.query_map([], |row| row.get(0))?;
            rows.collect()
        })?;

        raw.into_iter()
            .map(|value| {
                Srid::new(value).map_err(|err| SourceError::InvalidRow {
                    srid: value,
                    reason: err.to_string(),
                })
            })
            .collect()
    }

    fn ellipsoid(&self, short_name: &str) -> Result<Option<EllipsoidInfo>, SourceError> {
        self.with_connection("query ellps_all", |connection| {
            connection
                .query_row(
                    "SELECT name_el, a, b, gm_ellipsoid_id, display_name, description \
                     FROM ellps_all WHERE lower(name_el) = lower(?1) LIMIT 1",
                    params![short_name],
                    |row| {
                        let stored_name: String = row.get(0)?;
                        let canonical_id: Option<String> = row.get(3)?;
                        let display_name: Option<String> = row.get(4)?;
                        let description: Option<String> = row.get(5)?;
                        Ok(EllipsoidInfo {
                            semi_major_axis: row.get(1)?,
                            semi_minor_axis: row.get(2)?,
                            canonical_id: canonical_id.unwrap_or_else(|| stored_name.to_uppercase()),
                            display_name: display_name.unwrap_or_else(|| stored_name.clone()),
                            description: description.unwrap_or_default(),
                            short_name: stored_name,
                        })
                    },
                )
                .optional()
        })
    }

    fn datum_entries(&self) -> Result<Vec<DatumEntry>, SourceError> {
        self.with_connection("query datum_all", |connection| {
            let mut statement = connection.prepare(
                "SELECT datum, name_d FROM datum_all \
                 WHERE datum IS NOT NULL AND name_d IS NOT NULL",
            )?;
            let rows = statement.query_map([], |row| {
                Ok(DatumEntry {
                    transform: row.get(0)?,
                    canonical_name: row.get(1)?,
                })
            })?;
            rows.collect()
        })
    }
}
