//! PROJ4 parameter parsing and Helmert/projection normalisation.
//!
//! Tokenising is tolerant: malformed tokens are skipped. Numeric fields are
//! strict: a present value that does not parse is
//! [`ValidationError::MalformedParameters`]; defaults apply only to absent
//! keys.

use std::collections::BTreeMap;

use log::debug;

use crate::ValidationError;

/// Value stored for bare `+flag` tokens.
pub const FLAG_VALUE: &str = "true";
/// Ellipsoid assumed when `+ellps` is absent.
pub const DEFAULT_ELLIPSOID: &str = "wgs84";
/// Number of Helmert components in `+towgs84`.
pub const HELMERT_COMPONENTS: usize = 7;

const ARCSECONDS_PER_DEGREE: f64 = 3600.0;
const PPM: f64 = 1_000_000.0;

/// Key/value view of a PROJ4 string.
///
/// # Examples
///
/// ```
/// use crs_export_core::proj4::Proj4Params;
///
/// let params = Proj4Params::parse("+proj=tmerc +lon_0=39 +no_defs junk +=x");
/// assert_eq!(params.get("lon_0"), Some("39"));
/// assert_eq!(params.get("no_defs"), Some("true"));
/// assert_eq!(params.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proj4Params {
    entries: BTreeMap<String, String>,
}

impl Proj4Params {
    /// Parses space-separated `+key=value` and `+flag` tokens.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for token in text.split_whitespace() {
            let Some(body) = token.strip_prefix('+') else {
                debug!("skipping PROJ4 token without '+': {token:?}");
                continue;
            };
            let (key, value) = body.split_once('=').unwrap_or((body, FLAG_VALUE));
            if key.is_empty() || value.is_empty() {
                debug!("skipping malformed PROJ4 token {token:?}");
                continue;
            }
            entries.insert(key.to_owned(), value.to_owned());
        }
        Self { entries }
    }

    /// Returns the raw value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns `true` when `key` was present, as a flag or with a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of parsed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn number(&self, key: &str) -> Result<Option<f64>, ValidationError> {
        self.get(key).map(|raw| parse_number(key, raw)).transpose()
    }

    fn number_or(&self, key: &str, default: f64) -> Result<f64, ValidationError> {
        Ok(self.number(key)?.unwrap_or(default))
    }
}

fn parse_number(key: &str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ValidationError::MalformedParameters {
            key: key.to_owned(),
            value: raw.to_owned(),
        })
}

/// Seven-parameter Helmert datum shift as stored in `+towgs84`.
///
/// Rotations are arcseconds and scale is parts per million.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HelmertTransform {
    /// X translation in metres.
    pub dx: f64,
    /// Y translation in metres.
    pub dy: f64,
    /// Z translation in metres.
    pub dz: f64,
    /// X rotation in arcseconds.
    pub rx: f64,
    /// Y rotation in arcseconds.
    pub ry: f64,
    /// Z rotation in arcseconds.
    pub rz: f64,
    /// Scale difference in ppm.
    pub scale_ppm: f64,
}

impl HelmertTransform {
    /// The zero transform.
    pub const IDENTITY: Self = Self {
        dx: 0.0,
        dy: 0.0,
        dz: 0.0,
        rx: 0.0,
        ry: 0.0,
        rz: 0.0,
        scale_ppm: 0.0,
    };

    /// Parses a comma-separated list, zero-padding to seven values.
    ///
    /// # Examples
    ///
    /// ```
    /// use crs_export_core::proj4::HelmertTransform;
    ///
    /// let shift = HelmertTransform::from_towgs84("24,-123,-94").expect("valid");
    /// assert_eq!(shift.components(), [24.0, -123.0, -94.0, 0.0, 0.0, 0.0, 0.0]);
    /// ```
    pub fn from_towgs84(value: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedParameters {
            key: "towgs84".to_owned(),
            value: value.to_owned(),
        };
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() > HELMERT_COMPONENTS {
            return Err(malformed());
        }
        let mut components = [0.0; HELMERT_COMPONENTS];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = parse_number("towgs84", part).map_err(|_| malformed())?;
        }
        let [dx, dy, dz, rx, ry, rz, scale_ppm] = components;
        Ok(Self {
            dx,
            dy,
            dz,
            rx,
            ry,
            rz,
            scale_ppm,
        })
    }

    /// Components in `towgs84` order.
    #[must_use]
    pub const fn components(&self) -> [f64; HELMERT_COMPONENTS] {
        [
            self.dx,
            self.dy,
            self.dz,
            self.rx,
            self.ry,
            self.rz,
            self.scale_ppm,
        ]
    }

    /// Translations in metres.
    #[must_use]
    pub const fn translations(&self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }

    /// Rotations converted from arcseconds to degrees, sign unchanged.
    #[must_use]
    pub fn rotation_degrees(&self) -> [f64; 3] {
        [self.rx, self.ry, self.rz].map(|arcseconds| arcseconds / ARCSECONDS_PER_DEGREE)
    }

    /// Scale difference as a unitless multiplier.
    #[must_use]
    pub fn scale_multiplier(&self) -> f64 {
        self.scale_ppm / PPM
    }

    /// Returns `true` when every component is zero.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.components().iter().all(|value| *value == 0.0)
    }

    /// Comma-separated components, formatted without trailing zeros.
    #[must_use]
    pub fn to_towgs84(&self) -> String {
        self.components()
            .iter()
            .map(|value| crate::generators::format_number(*value))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParameters {
    /// `lon_0` in degrees.
    pub central_meridian: f64,
    /// `lat_0` in degrees.
    pub origin_latitude: f64,
    /// `k`, unitless.
    pub scale_factor: f64,
    /// `x_0` in metres.
    pub false_easting: f64,
    /// `y_0` in metres.
    pub false_northing: f64,
}

impl Default for ProjectionParameters {
    fn default() -> Self {
        Self {
            central_meridian: 0.0,
            origin_latitude: 0.0,
            scale_factor: 1.0,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }
}

/// Parameters derived from one record's PROJ4 text.
///
/// Computed per export and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParameters {
    /// Datum shift to WGS 84.
    pub helmert: HelmertTransform,
    /// Projection parameters.
    pub projection: ProjectionParameters,
    /// Ellipsoid short name.
    pub ellipsoid_key: String,
    /// Raw `towgs84` value, when present.
    pub towgs84_text: Option<String>,
}

impl TransformParameters {
    /// Parses and normalises a PROJ4 string.
    ///
    /// # Examples
    ///
    /// ```
    /// use crs_export_core::proj4::TransformParameters;
    ///
    /// let params = TransformParameters::from_proj4("+proj=tmerc +lon_0=39 +x_0=7500000")
    ///     .expect("valid");
    /// assert_eq!(params.projection.scale_factor, 1.0);
    /// assert!(params.helmert.is_identity());
    /// assert_eq!(params.ellipsoid_key, "wgs84");
    /// ```
    pub fn from_proj4(text: &str) -> Result<Self, ValidationError> {
        Self::from_params(&Proj4Params::parse(text))
    }

    /// Normalises already-parsed parameters.
    pub fn from_params(params: &Proj4Params) -> Result<Self, ValidationError> {
        let towgs84_text = params.get("towgs84").map(str::to_owned);
        let helmert = towgs84_text
            .as_deref()
            .map(HelmertTransform::from_towgs84)
            .transpose()?
            .unwrap_or(HelmertTransform::IDENTITY);

        let defaults = utm_defaults(params)?.unwrap_or_default();
        let scale_factor = match params.number("k")? {
            Some(k) => k,
            None => params.number_or("k_0", defaults.scale_factor)?,
        };
        let projection = ProjectionParameters {
            central_meridian: params.number_or("lon_0", defaults.central_meridian)?,
            origin_latitude: params.number_or("lat_0", defaults.origin_latitude)?,
            scale_factor,
            false_easting: params.number_or("x_0", defaults.false_easting)?,
            false_northing: params.number_or("y_0", defaults.false_northing)?,
        };

        Ok(Self {
            helmert,
            projection,
            ellipsoid_key: params.get("ellps").unwrap_or(DEFAULT_ELLIPSOID).to_owned(),
            towgs84_text,
        })
    }

    /// Transform text used for datum lookup: the raw `towgs84` value, or the
    /// zero transform when absent.
    #[must_use]
    pub fn datum_query(&self) -> String {
        self.towgs84_text
            .clone()
            .unwrap_or_else(|| self.helmert.to_towgs84())
    }
}

/// Projection defaults implied by `+proj=utm +zone=N [+south]`.
fn utm_defaults(params: &Proj4Params) -> Result<Option<ProjectionParameters>, ValidationError> {
    if params.get("proj") != Some("utm") {
        return Ok(None);
    }
    let Some(raw_zone) = params.get("zone") else {
        return Ok(None);
    };
    let zone = raw_zone
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|zone| (1..=crate::srid::UTM_MAX_ZONE).contains(zone))
        .ok_or_else(|| ValidationError::MalformedParameters {
            key: "zone".to_owned(),
            value: raw_zone.to_owned(),
        })?;
    let false_northing = if params.contains("south") {
        10_000_000.0
    } else {
        0.0
    };
    Ok(Some(ProjectionParameters {
        central_meridian: f64::from(i32::from(zone) * 6 - 183),
        origin_latitude: 0.0,
        scale_factor: 0.9996,
        false_easting: 500_000.0,
        false_northing,
    }))
}
