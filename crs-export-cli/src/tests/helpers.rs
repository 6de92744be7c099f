//! Fixture database shared by the command tests.

use camino::Utf8PathBuf;
use crs_export_core::test_support::{
    custom_record, sample_datums, sample_ellipsoids, write_sqlite_database,
};
use tempfile::TempDir;

pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
    pub(super) database: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let database = root.join("crs.sqlite");
        let records = [
            custom_record(
                100_001,
                "SK42 zone 7.3",
                "+proj=tmerc +lon_0=39 +x_0=7500000 +ellps=krass +towgs84=23.57,-140.95,-79.8,0,0.35,0.79,-0.22",
            ),
            custom_record(
                100_002,
                "Местная система",
                "+proj=tmerc +lon_0=45 +ellps=krass +towgs84=1,2,3",
            ),
        ];
        write_sqlite_database(
            database.as_std_path(),
            &records,
            &sample_ellipsoids(),
            &sample_datums(),
        )
        .expect("write fixture database");
        Self {
            _dir: dir,
            root,
            database,
        }
    }
}
