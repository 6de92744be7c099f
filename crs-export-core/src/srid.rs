//! SRID identifiers and the UTM zone ranges that short-circuit resolution.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::ValidationError;

/// First SRID of the WGS 84 / UTM northern-hemisphere range (zone 1 is 32601).
pub const UTM_NORTH_BASE: u32 = 32_600;
/// First SRID of the WGS 84 / UTM southern-hemisphere range (zone 1 is 32701).
pub const UTM_SOUTH_BASE: u32 = 32_700;
/// Highest UTM zone number.
pub const UTM_MAX_ZONE: u8 = 60;

/// Positive integer identifier of a coordinate reference system.
///
/// # Examples
///
/// ```
/// use crs_export_core::Srid;
///
/// let srid: Srid = "32601".parse().expect("valid SRID");
/// assert_eq!(srid.get(), 32601);
/// assert!(Srid::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "i64", into = "i64")
)]
pub struct Srid(NonZeroU32);

impl Srid {
    /// Validates a raw identifier; zero, negative and oversized values are rejected.
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        u32::try_from(raw)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidSrid {
                raw: raw.to_string(),
            })
    }

    /// Returns the numeric identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns the UTM zone this SRID denotes, if it falls in either UTM range.
    #[must_use]
    pub fn utm_zone(self) -> Option<UtmZone> {
        UtmZone::from_srid(self)
    }
}

impl fmt::Display for Srid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Srid {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidSrid { raw: s.to_owned() };
        let raw: i64 = s.trim().parse().map_err(|_| invalid())?;
        Self::new(raw).map_err(|_| invalid())
    }
}

impl TryFrom<i64> for Srid {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Srid> for i64 {
    fn from(value: Srid) -> Self {
        Self::from(value.get())
    }
}

/// Hemisphere of a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    /// Zones 32601–32660.
    North,
    /// Zones 32701–32760.
    South,
}

impl Hemisphere {
    /// Single-letter suffix used in zone labels.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::North => 'N',
            Self::South => 'S',
        }
    }
}

/// A WGS 84 / UTM zone recognised from its SRID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtmZone {
    zone: u8,
    hemisphere: Hemisphere,
}

impl UtmZone {
    /// Detects the zone encoded by `srid`.
    #[must_use]
    pub fn from_srid(srid: Srid) -> Option<Self> {
        let raw = srid.get();
        let (base, hemisphere) = if raw > UTM_SOUTH_BASE {
            (UTM_SOUTH_BASE, Hemisphere::South)
        } else if raw > UTM_NORTH_BASE {
            (UTM_NORTH_BASE, Hemisphere::North)
        } else {
            return None;
        };
        let zone = u8::try_from(raw - base).ok()?;
        (1..=UTM_MAX_ZONE)
            .contains(&zone)
            .then_some(Self { zone, hemisphere })
    }

    /// Zone number in `1..=60`.
    #[must_use]
    pub const fn zone(self) -> u8 {
        self.zone
    }

    /// Hemisphere of the zone.
    #[must_use]
    pub const fn hemisphere(self) -> Hemisphere {
        self.hemisphere
    }

    /// Zero-padded label such as `01N` or `60S`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{:02}{}", self.zone, self.hemisphere.letter())
    }

    /// Central meridian of the zone in degrees.
    #[must_use]
    pub fn central_meridian(self) -> i32 {
        i32::from(self.zone) * 6 - 183
    }

    /// False northing in metres.
    #[must_use]
    pub const fn false_northing(self) -> u32 {
        match self.hemisphere {
            Hemisphere::North => 0,
            Hemisphere::South => 10_000_000,
        }
    }

    /// The SRID of this zone.
    #[must_use]
    pub fn srid(self) -> Srid {
        let base = match self.hemisphere {
            Hemisphere::North => UTM_NORTH_BASE,
            Hemisphere::South => UTM_SOUTH_BASE,
        };
        // Zones are constructed from valid SRIDs, so the sum is never zero.
        Srid(NonZeroU32::MIN.saturating_add(base + u32::from(self.zone) - 1))
    }

    /// Canonical PROJ4 definition of the zone.
    #[must_use]
    pub fn canonical_proj4(self) -> String {
        let south = match self.hemisphere {
            Hemisphere::North => "",
            Hemisphere::South => " +south",
        };
        format!(
            "+proj=utm +zone={}{south} +datum=WGS84 +units=m +no_defs",
            self.zone
        )
    }

    /// Canonical EPSG-style WKT of the zone.
    #[must_use]
    pub fn canonical_wkt(self) -> String {
        format!(
            concat!(
                "PROJCS[\"WGS 84 / UTM zone {zone}{letter}\",",
                "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",",
                "SPHEROID[\"WGS 84\",6378137,298.257223563,AUTHORITY[\"EPSG\",\"7030\"]],",
                "AUTHORITY[\"EPSG\",\"6326\"]],",
                "PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],",
                "UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],",
                "AUTHORITY[\"EPSG\",\"4326\"]],",
                "PROJECTION[\"Transverse_Mercator\"],",
                "PARAMETER[\"latitude_of_origin\",0],",
                "PARAMETER[\"central_meridian\",{meridian}],",
                "PARAMETER[\"scale_factor\",0.9996],",
                "PARAMETER[\"false_easting\",500000],",
                "PARAMETER[\"false_northing\",{northing}],",
                "UNIT[\"metre\",1,AUTHORITY[\"EPSG\",\"9001\"]],",
                "AXIS[\"Easting\",EAST],AXIS[\"Northing\",NORTH],",
                "AUTHORITY[\"EPSG\",\"{srid}\"]]"
            ),
            zone = self.zone,
            letter = self.hemisphere.letter(),
            meridian = self.central_meridian(),
            northing = self.false_northing(),
            srid = self.srid(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0")]
    #[case("-4326")]
    #[case("abc")]
    #[case("12.5")]
    #[case("")]
    fn rejects_invalid_srids(#[case] raw: &str) {
        let err = raw.parse::<Srid>().expect_err("invalid SRID");
        assert_eq!(
            err,
            ValidationError::InvalidSrid {
                raw: raw.to_owned()
            }
        );
    }

    #[rstest]
    fn rejects_srids_beyond_u32() {
        assert!(Srid::new(i64::from(u32::MAX) + 1).is_err());
    }

    #[rstest]
    #[case(32601, 1, Hemisphere::North, "01N", -177)]
    #[case(32660, 60, Hemisphere::North, "60N", 177)]
    #[case(32701, 1, Hemisphere::South, "01S", -177)]
    #[case(32760, 60, Hemisphere::South, "60S", 177)]
    #[case(32637, 37, Hemisphere::North, "37N", 39)]
    fn detects_utm_zones(
        #[case] raw: i64,
        #[case] zone: u8,
        #[case] hemisphere: Hemisphere,
        #[case] label: &str,
        #[case] meridian: i32,
    ) {
        let srid = Srid::new(raw).expect("valid");
        let utm = srid.utm_zone().expect("utm zone");
        assert_eq!(utm.zone(), zone);
        assert_eq!(utm.hemisphere(), hemisphere);
        assert_eq!(utm.label(), label);
        assert_eq!(utm.central_meridian(), meridian);
        assert_eq!(utm.srid(), srid);
    }

    #[rstest]
    #[case(32600)]
    #[case(32661)]
    #[case(32700)]
    #[case(32761)]
    #[case(4326)]
    fn ignores_srids_outside_utm_ranges(#[case] raw: i64) {
        let srid = Srid::new(raw).expect("valid");
        assert!(srid.utm_zone().is_none());
    }

    #[rstest]
    fn canonical_definitions_describe_the_zone() {
        let zone = Srid::new(32737)
            .expect("valid")
            .utm_zone()
            .expect("utm zone");
        let wkt = zone.canonical_wkt();
        assert!(wkt.starts_with("PROJCS[\"WGS 84 / UTM zone 37S\""));
        assert!(wkt.contains("PARAMETER[\"central_meridian\",39]"));
        assert!(wkt.contains("PARAMETER[\"false_northing\",10000000]"));
        assert!(wkt.contains("AUTHORITY[\"EPSG\",\"32737\"]]"));
        assert_eq!(
            zone.canonical_proj4(),
            "+proj=utm +zone=37 +south +datum=WGS84 +units=m +no_defs"
        );
    }
}
