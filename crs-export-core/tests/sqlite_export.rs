//! End-to-end exports against an on-disk SQLite database.

use std::thread;

use crs_export_core::test_support::{
    custom_record, fixed_clock, sample_datums, sample_ellipsoids, write_sqlite_database,
};
use crs_export_core::{
    CrsRecord, ExportEngine, ExportError, ExportFormat, SqliteCrsSource, Srid, ValidationError,
};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const PULKOVO_ZONE_7: &str = "PROJCS[\"Pulkovo 1942 / Gauss-Kruger zone 7\",GEOGCS[\"Pulkovo 1942\",DATUM[\"Pulkovo_1942\",SPHEROID[\"Krassowsky 1940\",6378245,298.3]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433]],PROJECTION[\"Transverse_Mercator\"],PARAMETER[\"central_meridian\",39],UNIT[\"metre\",1]]";

/// Temporary database plus the engine reading it.
struct Fixture {
    _dir: TempDir,
    engine: ExportEngine<SqliteCrsSource>,
}

fn srid(raw: i64) -> Srid {
    Srid::new(raw).expect("positive SRID")
}

#[fixture]
fn database() -> Fixture {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("crs.sqlite");
    let records = vec![
        CrsRecord::new(srid(32601), "EPSG", 32601)
            .with_proj4("+proj=utm +zone=1 +datum=WGS84 +units=m +no_defs"),
        CrsRecord::new(srid(28407), "EPSG", 28407)
            .with_wkt(PULKOVO_ZONE_7)
            .with_proj4("+proj=tmerc +lat_0=0 +lon_0=39 +k=1 +x_0=7500000 +y_0=0 +ellps=krass +towgs84=23.57,-140.95,-79.8,0,0.35,0.79,-0.22 +units=m +no_defs"),
        custom_record(
            100_001,
            "MSK-50 zone 1",
            "+proj=tmerc +lat_0=0 +lon_0=35.48333333333 +k=1 +x_0=1250000 +y_0=-5412568.754 +ellps=krass +towgs84=23.57,-140.95,-79.8,0,0.35,0.79,-0.22 +units=m +no_defs",
        )
        .with_wkt("PROJCS[\"MSK-50 zone 1\"]")
        .with_description("Moscow region")
        .with_reliability("high"),
        custom_record(100_002, "Local grid", "+proj=tmerc +lon_0=45 +ellps=krass"),
        CrsRecord::new(srid(900_001), "custom", 900_001),
    ];
    write_sqlite_database(&path, &records, &sample_ellipsoids(), &sample_datums())
        .expect("write fixture database");
    let source = SqliteCrsSource::open(&path).expect("open database");
    Fixture {
        _dir: dir,
        engine: ExportEngine::new(source).with_clock(fixed_clock),
    }
}

fn towgs84_values(content: &str) -> Vec<f64> {
    let start = content.find("TOWGS84[").expect("TOWGS84 node") + "TOWGS84[".len();
    let rest = &content[start..];
    let end = rest.find(']').expect("closing bracket");
    rest[..end]
        .split(',')
        .map(|value| value.trim().parse().expect("numeric value"))
        .collect()
}

#[rstest]
#[case(28407, ExportFormat::XmlDictionary)]
#[case(28407, ExportFormat::PrjV1)]
#[case(28407, ExportFormat::PrjV2)]
#[case(100_001, ExportFormat::XmlDictionary)]
#[case(100_001, ExportFormat::PrjV1)]
#[case(100_001, ExportFormat::PrjV2)]
fn complete_records_export_in_every_format(
    database: Fixture,
    #[case] raw: i64,
    #[case] format: ExportFormat,
) {
    let output = database.engine.export(raw, format, None).expect("export");
    assert!(!output.content.is_empty());
    assert!(output.content.contains(&raw.to_string()));
    assert_eq!(output.format, format);
    assert!(output.filename.ends_with(format.extension()));
}

#[rstest]
fn utm_zone_one_exports_canonical_prj(database: Fixture) {
    let output = database
        .engine
        .export(32601, ExportFormat::PrjV1, None)
        .expect("export");
    assert_eq!(output.filename, "UTM_zone_01N.prj");
    assert!(output.content.contains("PROJCS"));
    assert!(output.content.contains("WGS 84 / UTM zone 1N"));
}

#[rstest]
fn utm_zone_one_xml_is_a_development_stub(database: Fixture) {
    let output = database
        .engine
        .export(32601, ExportFormat::XmlDictionary, None)
        .expect("export");
    assert!(output.content.contains("status=\"development\""));
    assert!(output.content.contains("srid=\"32601\""));
    assert!(!output.content.contains("ProjectedCoordinateSystem"));
}

#[rstest]
fn utm_zone_without_row_uses_canonical_definition(database: Fixture) {
    let output = database
        .engine
        .export(32760, ExportFormat::PrjV2, None)
        .expect("export");
    assert_eq!(output.filename, "UTM_zone_60S.prj");
    assert!(output.content.contains("10000000"));
}

#[rstest]
fn missing_towgs84_yields_zero_shift(database: Fixture) {
    let output = database
        .engine
        .export(100_002, ExportFormat::PrjV1, None)
        .expect("export");
    assert_eq!(towgs84_values(&output.content), vec![0.0; 7]);
}

#[rstest]
fn custom_metadata_reaches_the_header(database: Fixture) {
    let output = database
        .engine
        .export(100_001, ExportFormat::PrjV2, None)
        .expect("export");
    assert!(output.content.contains("Moscow region"));
    assert!(output.content.contains("high"));
    assert!(output.content.contains("# Bounds West: 36"));
    assert!(output.content.contains("DATUM[\"Pulkovo_1942\""));
}

#[rstest]
fn bare_custom_row_is_a_validation_error(database: Fixture) {
    let err = database
        .engine
        .export(900_001, ExportFormat::PrjV1, None)
        .expect_err("no definition");
    assert!(matches!(
        err,
        ExportError::Validation(ValidationError::MissingDefinition { .. })
    ));
}

#[rstest]
fn concurrent_exports_share_one_engine(database: Fixture) {
    let engine = &database.engine;
    let filenames: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = [28407, 100_001, 100_002, 32601]
            .into_iter()
            .map(|raw| {
                scope.spawn(move || {
                    engine
                        .export(raw, ExportFormat::PrjV1, None)
                        .expect("export")
                        .filename
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect()
    });
    assert_eq!(filenames.len(), 4);
    assert!(filenames.contains(&"UTM_zone_01N.prj".to_owned()));
    assert!(filenames.contains(&"Local_grid_v20.prj".to_owned()));
}
