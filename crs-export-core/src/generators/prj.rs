//! GlobalMapper PRJ generators.

use log::{debug, warn};

use super::{GenerationContext, Geodesy, RotationConvention, format_number};
use crate::wkt::{self, WktStyle};
use crate::{CrsRecord, ExportError, ExportFormat, ValidationError};

const DEGREE_IN_RADIANS: &str = "0.017453292519943295";

/// PRJ dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrjVersion {
    /// GlobalMapper v20: single-line WKT, negated rotations, no bounds.
    V1,
    /// GlobalMapper v25: indented WKT, stored rotation sign, bounds lines.
    V2,
}

impl PrjVersion {
    const fn format(self) -> ExportFormat {
        match self {
            Self::V1 => ExportFormat::PrjV1,
            Self::V2 => ExportFormat::PrjV2,
        }
    }

    const fn style(self) -> WktStyle {
        match self {
            Self::V1 => WktStyle::Spaced,
            Self::V2 => WktStyle::Indented,
        }
    }
}

pub(super) fn generate(
    version: PrjVersion,
    record: &CrsRecord,
    geodesy: Option<&Geodesy>,
    context: &GenerationContext<'_>,
) -> Result<String, ExportError> {
    let body = body(version, record, geodesy)?;
    let mut out = header(version, record, context);
    out.push_str(&wkt::clean(&body, version.style()));
    out.push('\n');
    Ok(out)
}

fn body(
    version: PrjVersion,
    record: &CrsRecord,
    geodesy: Option<&Geodesy>,
) -> Result<String, ExportError> {
    if record.is_custom() {
        if let Some(geodesy) = geodesy {
            debug!("SRID {}: synthesising custom WKT", record.srid);
            return Ok(custom_wkt(version, record, geodesy));
        }
        if let Some(stored) = record.wkt() {
            warn!(
                "SRID {}: custom record has no PROJ4 text; using stored WKT",
                record.srid
            );
            return Ok(stored.to_owned());
        }
        return Err(ValidationError::MissingField {
            srid: record.srid,
            field: "proj4text",
        }
        .into());
    }
    if let Some(stored) = record.wkt() {
        return Ok(stored.to_owned());
    }
    if let Some(zone) = record.utm_zone() {
        debug!("SRID {}: using canonical UTM WKT", record.srid);
        return Ok(zone.canonical_wkt());
    }
    Err(ValidationError::MissingField {
        srid: record.srid,
        field: "srtext",
    }
    .into())
}

fn custom_wkt(version: PrjVersion, record: &CrsRecord, geodesy: &Geodesy) -> String {
    let params = &geodesy.parameters;
    let helmert = &params.helmert;
    let projection = &params.projection;
    let ellipsoid = &geodesy.ellipsoid;
    let [dx, dy, dz] = helmert.translations();
    let [rx, ry, rz] = RotationConvention::for_format(version.format()).rotations(helmert);
    let name = record
        .custom_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("Transverse_Mercator");
    let datum = &geodesy.datum_name;

    format!(
        concat!(
            "PROJCS[\"{name}\",",
            "GEOGCS[\"{datum}\",",
            "DATUM[\"{datum}\",",
            "SPHEROID[\"{spheroid}\",{a},{invf}],",
            "TOWGS84[{dx},{dy},{dz},{rx},{ry},{rz},{scale}]],",
            "PRIMEM[\"Greenwich\",0],",
            "UNIT[\"Degree\",{degree}]],",
            "PROJECTION[\"Transverse_Mercator\"],",
            "PARAMETER[\"latitude_of_origin\",{lat_0}],",
            "PARAMETER[\"central_meridian\",{lon_0}],",
            "PARAMETER[\"scale_factor\",{k}],",
            "PARAMETER[\"false_easting\",{x_0}],",
            "PARAMETER[\"false_northing\",{y_0}],",
            "UNIT[\"Meter\",1]]"
        ),
        name = quote_safe(name),
        datum = quote_safe(datum),
        spheroid = quote_safe(&ellipsoid.canonical_id),
        a = format_number(ellipsoid.semi_major_axis),
        invf = format_number(ellipsoid.inverse_flattening()),
        dx = format_number(dx),
        dy = format_number(dy),
        dz = format_number(dz),
        rx = format_number(rx),
        ry = format_number(ry),
        rz = format_number(rz),
        scale = format_number(helmert.scale_multiplier()),
        degree = DEGREE_IN_RADIANS,
        lat_0 = format_number(projection.origin_latitude),
        lon_0 = format_number(projection.central_meridian),
        k = format_number(projection.scale_factor),
        x_0 = format_number(projection.false_easting),
        y_0 = format_number(projection.false_northing),
    )
}

/// Strips characters that would terminate a WKT string literal.
fn quote_safe(text: &str) -> String {
    text.chars()
        .filter(|ch| *ch != '"' && !ch.is_control())
        .collect()
}

fn header(version: PrjVersion, record: &CrsRecord, context: &GenerationContext<'_>) -> String {
    let mut lines = vec![
        format!("# SRID: {}", record.srid),
        format!("# Authority: {}", record.authority),
        format!("# Authority SRID: {}", record.authority_srid),
        format!(
            "# Description: {}",
            single_line(record.description().unwrap_or("Not available"))
        ),
        format!(
            "# Reliability: {}",
            single_line(record.reliability().unwrap_or("Unknown"))
        ),
        format!("# Export Date: {}", context.generated_at.to_rfc3339()),
        format!("# Format: {}", version.format().display_name()),
    ];
    if let (PrjVersion::V2, Some(bbox)) = (version, record.bounding_box) {
        lines.extend([
            format!("# Bounds West: {}", format_number(bbox.west)),
            format!("# Bounds East: {}", format_number(bbox.east)),
            format!("# Bounds South: {}", format_number(bbox.south)),
            format!("# Bounds North: {}", format_number(bbox.north)),
        ]);
    }
    let mut out = lines.join("\n");
    out.push_str("\n\n");
    out
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
