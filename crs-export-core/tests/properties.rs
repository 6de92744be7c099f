//! Property tests for text cleanup, sanitisation and rotation signs.

use crs_export_core::naming::{FILENAME_MAX_LENGTH, sanitize};
use crs_export_core::test_support::{MemorySource, custom_record, fixed_clock};
use crs_export_core::wkt::{WktStyle, clean};
use crs_export_core::{ExportEngine, ExportFormat};
use proptest::prelude::*;

const ILLEGAL: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

fn wkt_like() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z_a-z0-9 \\t\\n\\[\\]\\(\\),.\"-]{0,96}")
        .expect("valid regex")
}

fn towgs84_values(output: &str) -> Vec<f64> {
    let start = output.find("TOWGS84[").expect("TOWGS84 node") + "TOWGS84[".len();
    let rest = &output[start..];
    let end = rest.find(']').expect("closing bracket");
    rest[..end]
        .split(',')
        .map(|value| value.trim().parse().expect("numeric value"))
        .collect()
}

proptest! {
    #[test]
    fn spaced_cleanup_is_idempotent(input in wkt_like()) {
        let once = clean(&input, WktStyle::Spaced);
        prop_assert_eq!(clean(&once, WktStyle::Spaced), once);
    }

    #[test]
    fn indented_cleanup_is_idempotent(input in wkt_like()) {
        let once = clean(&input, WktStyle::Indented);
        prop_assert_eq!(clean(&once, WktStyle::Indented), once);
    }

    #[test]
    fn cleanup_accepts_arbitrary_text(input in any::<String>()) {
        let once = clean(&input, WktStyle::Indented);
        prop_assert_eq!(clean(&once, WktStyle::Indented), once);
    }

    #[test]
    fn sanitize_is_deterministic_and_idempotent(input in any::<String>()) {
        let first = sanitize(&input, FILENAME_MAX_LENGTH);
        prop_assert_eq!(&sanitize(&input, FILENAME_MAX_LENGTH), &first);
        prop_assert_eq!(&sanitize(&first, FILENAME_MAX_LENGTH), &first);
        prop_assert!(first.chars().count() <= FILENAME_MAX_LENGTH);
        prop_assert!(!first.chars().any(|ch| ch.is_whitespace() || ILLEGAL.contains(&ch)));
    }

    #[test]
    fn prj_versions_negate_rotations(
        rx in -20.0_f64..20.0,
        ry in -20.0_f64..20.0,
        rz in -20.0_f64..20.0,
    ) {
        let proj4 = format!("+proj=tmerc +lon_0=39 +ellps=krass +towgs84=25,-141,-78.5,{rx},{ry},{rz},-0.22");
        let source = MemorySource::new().with_record(custom_record(100_050, "Zone", &proj4));
        let engine = ExportEngine::new(source).with_clock(fixed_clock);

        let v1 = engine.export(100_050, ExportFormat::PrjV1, None).expect("v1 export");
        let v2 = engine.export(100_050, ExportFormat::PrjV2, None).expect("v2 export");
        let v1_values = towgs84_values(&v1.content);
        let v2_values = towgs84_values(&v2.content);

        prop_assert_eq!(v1_values.len(), 7);
        prop_assert_eq!(&v1_values[..3], &v2_values[..3]);
        for (negated, stored) in v1_values[3..6].iter().zip(&v2_values[3..6]) {
            prop_assert_eq!(*negated, -*stored);
        }
        prop_assert_eq!(v1_values[6], v2_values[6]);
    }
}
