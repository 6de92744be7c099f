//! Format generators.
//!
//! Each [`ExportFormat`] variant owns one generator; dispatch is a `match`
//! over the closed enum.

mod prj;
mod xml;

use chrono::{DateTime, Utc};

use crate::proj4::{HelmertTransform, TransformParameters};
use crate::reference::EllipsoidInfo;
use crate::{CrsRecord, ExportError, ExportFormat, ExportParams};

pub use prj::PrjVersion;
pub use xml::{STUB_STATUS_DEVELOPMENT, STUB_STATUS_ERROR, TRANSFORMATION_ACCURACY, XML_NAMESPACE};

/// Formats a number without a trailing decimal point when it is integral.
///
/// Negative zero prints as `0`; other values use the shortest representation
/// that round-trips.
///
/// # Examples
///
/// ```
/// use crs_export_core::generators::format_number;
///
/// assert_eq!(format_number(6.0), "6");
/// assert_eq!(format_number(-0.0), "0");
/// assert_eq!(format_number(0.9996), "0.9996");
/// ```
#[must_use]
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    format!("{value}")
}

/// Sign convention applied to Helmert rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationConvention {
    /// Rotations are negated relative to the stored values.
    Negated,
    /// Rotations keep the stored sign.
    AsStored,
}

impl RotationConvention {
    /// Convention used by `format`.
    #[must_use]
    pub const fn for_format(format: ExportFormat) -> Self {
        match format {
            ExportFormat::XmlDictionary | ExportFormat::PrjV1 => Self::Negated,
            ExportFormat::PrjV2 => Self::AsStored,
        }
    }

    /// Rotations in degrees with this convention's sign applied.
    #[must_use]
    pub fn rotations(self, helmert: &HelmertTransform) -> [f64; 3] {
        let degrees = helmert.rotation_degrees();
        match self {
            Self::Negated => degrees.map(|value| -value),
            Self::AsStored => degrees,
        }
    }
}

/// Datum and ellipsoid data resolved for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Geodesy {
    /// Normalised PROJ4 parameters.
    pub parameters: TransformParameters,
    /// Resolved ellipsoid.
    pub ellipsoid: EllipsoidInfo,
    /// Matched, shared or fallback datum name.
    pub datum_name: String,
}

/// Per-call inputs shared by every generator.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Timestamp written into headers.
    pub generated_at: DateTime<Utc>,
    /// Caller-supplied parameters.
    pub params: &'a ExportParams,
}

impl ExportFormat {
    /// Runs this format's generator.
    ///
    /// The XML generator never fails: internal errors become a stub document.
    /// The PRJ generators propagate missing-field and generation errors.
    pub fn generate(
        self,
        record: &CrsRecord,
        geodesy: Option<&Geodesy>,
        context: &GenerationContext<'_>,
    ) -> Result<String, ExportError> {
        match self {
            Self::XmlDictionary => Ok(xml::generate(record, geodesy, context)),
            Self::PrjV1 => prj::generate(PrjVersion::V1, record, geodesy, context),
            Self::PrjV2 => prj::generate(PrjVersion::V2, record, geodesy, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(500_000.0, "500000")]
    #[case(-183.0, "-183")]
    #[case(0.000_001, "0.000001")]
    #[case(23.57, "23.57")]
    #[case(1.0e20, "100000000000000000000")]
    fn formats_numbers(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value), expected);
    }

    #[rstest]
    fn conventions_differ_only_in_sign() {
        let shift = HelmertTransform::from_towgs84("0,0,0,0.35,-0.79,0.22,0").expect("valid");
        let negated = RotationConvention::Negated.rotations(&shift);
        let stored = RotationConvention::AsStored.rotations(&shift);
        for (a, b) in negated.iter().zip(stored) {
            assert_eq!(*a, -b);
        }
        assert!((stored[0] - 0.35 / 3600.0).abs() < f64::EPSILON);
    }
}
