//! Ellipsoid and datum resolution against the reference tables.
//!
//! Neither resolver can fail: source errors and misses degrade to the static
//! fallback data below and are logged as default-data events.

use log::{debug, warn};

use crate::Srid;
use crate::source::CrsSource;

/// Canonical identifier of the synthetic entry returned for unknown ellipsoids.
pub const UNKNOWN_ELLIPSOID_ID: &str = "UNKNOWN";

/// Axis lengths and identifiers of a reference ellipsoid.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipsoidInfo {
    /// PROJ4 short name such as `wgs84` or `krass`.
    pub short_name: String,
    /// Semi-major axis in metres.
    pub semi_major_axis: f64,
    /// Semi-minor axis in metres.
    pub semi_minor_axis: f64,
    /// Identifier used by the XML dictionary.
    pub canonical_id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Free-text description.
    pub description: String,
}

impl EllipsoidInfo {
    /// Inverse flattening `a / (a - b)`; `0` for a sphere.
    #[must_use]
    pub fn inverse_flattening(&self) -> f64 {
        let difference = self.semi_major_axis - self.semi_minor_axis;
        if difference.abs() < f64::EPSILON {
            0.0
        } else {
            self.semi_major_axis / difference
        }
    }

    /// Returns `true` for the synthetic unknown entry.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.canonical_id == UNKNOWN_ELLIPSOID_ID
    }
}

struct KnownEllipsoid {
    names: &'static [&'static str],
    semi_major_axis: f64,
    semi_minor_axis: f64,
    canonical_id: &'static str,
    display_name: &'static str,
    description: &'static str,
}

impl KnownEllipsoid {
    fn matches(&self, short_name: &str) -> bool {
        self.names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(short_name))
    }

    fn to_info(&self, short_name: &str) -> EllipsoidInfo {
        EllipsoidInfo {
            short_name: short_name.to_owned(),
            semi_major_axis: self.semi_major_axis,
            semi_minor_axis: self.semi_minor_axis,
            canonical_id: self.canonical_id.to_owned(),
            display_name: self.display_name.to_owned(),
            description: self.description.to_owned(),
        }
    }
}

const WGS84: KnownEllipsoid = KnownEllipsoid {
    names: &["wgs84", "wgs_84"],
    semi_major_axis: 6_378_137.0,
    semi_minor_axis: 6_356_752.314_245_179,
    canonical_id: "WGS84",
    display_name: "WGS 84",
    description: "World Geodetic System of 1984",
};

static KNOWN_ELLIPSOIDS: [KnownEllipsoid; 4] = [
    WGS84,
    KnownEllipsoid {
        names: &["grs80", "grs1980"],
        semi_major_axis: 6_378_137.0,
        semi_minor_axis: 6_356_752.314_140_356,
        canonical_id: "GRS1980",
        display_name: "GRS 1980",
        description: "Geodetic Reference System of 1980",
    },
    KnownEllipsoid {
        names: &["bessel", "bessel1841"],
        semi_major_axis: 6_377_397.155,
        semi_minor_axis: 6_356_078.962_818_189,
        canonical_id: "BESSEL",
        display_name: "Bessel 1841",
        description: "Bessel 1841",
    },
    KnownEllipsoid {
        names: &["krass", "krassowsky", "krasovsky"],
        semi_major_axis: 6_378_245.0,
        semi_minor_axis: 6_356_863.018_773_047,
        canonical_id: "KRASOVSKY1940",
        display_name: "Krassowsky 1940",
        description: "Krassowsky 1940",
    },
];

/// Returns the built-in entry for `short_name`, or the synthetic unknown
/// entry with WGS 84 axes.
#[must_use]
pub fn fallback_ellipsoid(short_name: &str) -> EllipsoidInfo {
    KNOWN_ELLIPSOIDS
        .iter()
        .find(|known| known.matches(short_name))
        .map_or_else(
            || EllipsoidInfo {
                short_name: short_name.to_owned(),
                semi_major_axis: WGS84.semi_major_axis,
                semi_minor_axis: WGS84.semi_minor_axis,
                canonical_id: UNKNOWN_ELLIPSOID_ID.to_owned(),
                display_name: format!("Unknown ellipsoid ({short_name})"),
                description: "Unknown ellipsoid; WGS 84 axes assumed".to_owned(),
            },
            |known| known.to_info(short_name),
        )
}

/// Resolves an ellipsoid by short name, preferring the reference table.
pub fn resolve_ellipsoid<S: CrsSource + ?Sized>(source: &S, short_name: &str) -> EllipsoidInfo {
    match source.ellipsoid(short_name) {
        Ok(Some(info)) => info,
        Ok(None) => {
            let fallback = fallback_ellipsoid(short_name);
            if fallback.is_unknown() {
                warn!("ellipsoid {short_name:?} is unknown; using WGS 84 axes");
            } else {
                debug!("ellipsoid {short_name:?} not in reference table; using built-in values");
            }
            fallback
        }
        Err(err) => {
            warn!("ellipsoid lookup for {short_name:?} failed: {err}; using built-in values");
            fallback_ellipsoid(short_name)
        }
    }
}

/// Row of the datum reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatumEntry {
    /// Seven-parameter transform text, optionally prefixed with `+towgs84=`.
    pub transform: String,
    /// Canonical datum name.
    pub canonical_name: String,
}

/// Canonical datum name matched from the reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatumMatch {
    /// Canonical datum name.
    pub canonical_name: String,
}

impl DatumMatch {
    /// Deterministic name used when no reference entry matches.
    #[must_use]
    pub fn fallback(srid: Srid) -> Self {
        Self {
            canonical_name: format!("Transformation-{srid}"),
        }
    }
}

/// Strips whitespace and the `+towgs84=` prefix from a transform string.
///
/// # Examples
///
/// ```
/// use crs_export_core::reference::normalize_transform;
///
/// assert_eq!(normalize_transform("+towgs84= 1, 2 ,3"), "1,2,3");
/// ```
#[must_use]
pub fn normalize_transform(text: &str) -> String {
    let compact: String = text.chars().filter(|ch| !ch.is_whitespace()).collect();
    compact
        .strip_prefix("+towgs84=")
        .or_else(|| compact.strip_prefix("towgs84="))
        .unwrap_or(&compact)
        .to_owned()
}

/// Finds the entry whose normalized transform equals the normalized query.
#[must_use]
pub fn match_datum(entries: &[DatumEntry], towgs84: &str) -> Option<DatumMatch> {
    let query = normalize_transform(towgs84);
    entries
        .iter()
        .find(|entry| normalize_transform(&entry.transform) == query)
        .map(|entry| DatumMatch {
            canonical_name: entry.canonical_name.clone(),
        })
}

/// Resolves a datum by exact transform match; `None` on a miss.
pub fn resolve_datum<S: CrsSource + ?Sized>(source: &S, towgs84: &str) -> Option<DatumMatch> {
    match source.datum_entries() {
        Ok(entries) => {
            let found = match_datum(&entries, towgs84);
            if found.is_none() {
                debug!("no datum matches transform {towgs84:?}");
            }
            found
        }
        Err(err) => {
            warn!("datum lookup failed: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemorySource;
    use rstest::rstest;

    #[rstest]
    #[case("wgs84", "WGS84")]
    #[case("GRS80", "GRS1980")]
    #[case("bessel", "BESSEL")]
    #[case("krass", "KRASOVSKY1940")]
    fn falls_back_to_known_ellipsoids(#[case] name: &str, #[case] id: &str) {
        let info = resolve_ellipsoid(&MemorySource::new(), name);
        assert_eq!(info.canonical_id, id);
        assert_eq!(info.short_name, name);
    }

    #[rstest]
    fn unknown_ellipsoid_uses_wgs84_axes() {
        let info = resolve_ellipsoid(&MemorySource::new(), "clrk66");
        assert!(info.is_unknown());
        assert!((info.semi_major_axis - 6_378_137.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn unavailable_source_degrades_to_fallback() {
        let info = resolve_ellipsoid(&MemorySource::unavailable(), "bessel");
        assert_eq!(info.canonical_id, "BESSEL");
        assert!(resolve_datum(&MemorySource::unavailable(), "0,0,0,0,0,0,0").is_none());
    }

    #[rstest]
    fn table_entries_take_precedence() {
        let custom = EllipsoidInfo {
            short_name: "krass".to_owned(),
            semi_major_axis: 6_378_245.0,
            semi_minor_axis: 6_356_863.0188,
            canonical_id: "KRASSOVSKY".to_owned(),
            display_name: "Krassovsky".to_owned(),
            description: "table".to_owned(),
        };
        let source = MemorySource::new().with_ellipsoid(custom.clone());
        assert_eq!(resolve_ellipsoid(&source, "KRASS"), custom);
    }

    #[rstest]
    fn inverse_flattening_handles_spheres() {
        let mut sphere = fallback_ellipsoid("wgs84");
        sphere.semi_minor_axis = sphere.semi_major_axis;
        assert!(sphere.inverse_flattening().abs() < f64::EPSILON);
        let wgs84 = fallback_ellipsoid("wgs84");
        assert!((wgs84.inverse_flattening() - 298.257_223_563).abs() < 1e-6);
    }

    #[rstest]
    #[case("+towgs84=23.57,-140.95,-79.8,0,0.35,0.79,-0.22")]
    #[case("23.57, -140.95, -79.8, 0, 0.35, 0.79, -0.22")]
    fn matches_datum_after_normalisation(#[case] stored: &str) {
        let entries = vec![DatumEntry {
            transform: stored.to_owned(),
            canonical_name: "Pulkovo_1942".to_owned(),
        }];
        let found = match_datum(&entries, "23.57,-140.95,-79.8,0,0.35,0.79,-0.22");
        assert_eq!(found.map(|m| m.canonical_name).as_deref(), Some("Pulkovo_1942"));
    }

    #[rstest]
    fn datum_match_is_exact() {
        let entries = vec![DatumEntry {
            transform: "23.57,-140.95,-79.8,0,0.35,0.79,-0.22".to_owned(),
            canonical_name: "Pulkovo_1942".to_owned(),
        }];
        assert!(match_datum(&entries, "23.570,-140.95,-79.8,0,0.35,0.79,-0.22").is_none());
    }

    #[rstest]
    fn fallback_datum_name_is_deterministic() {
        let srid = Srid::new(100_200).expect("srid");
        assert_eq!(DatumMatch::fallback(srid).canonical_name, "Transformation-100200");
    }
}
