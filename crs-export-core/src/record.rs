//! CRS records as read from the source tables.

use geo::{BoundingRect, Coord, MultiPoint, Point};

use crate::source::{AuthoritativeRow, CustomMetadata};
use crate::{Srid, UtmZone, ValidationError};

/// Authority marker of user-defined records.
pub const CUSTOM_AUTHORITY: &str = "custom";

/// Geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// Western longitude.
    pub west: f64,
    /// Eastern longitude.
    pub east: f64,
    /// Southern latitude.
    pub south: f64,
    /// Northern latitude.
    pub north: f64,
}

impl BoundingBox {
    /// Domain of validity used when a record has no usable geometry.
    pub const DEFAULT_VALIDITY: Self = Self {
        west: 14.0,
        east: 180.0,
        south: 35.0,
        north: 89.0,
    };

    /// Builds a box when all four bounds are finite.
    #[must_use]
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Option<Self> {
        [west, east, south, north]
            .iter()
            .all(|value| value.is_finite())
            .then_some(Self {
                west,
                east,
                south,
                north,
            })
    }

    /// Derives the extent of a WKT-like geometry such as `POLYGON((...))`.
    ///
    /// Coordinates are read as `x y` pairs. An EWKT `SRID=...;` prefix is
    /// ignored. Returns `None` when the text holds no coordinates or a number
    /// fails to parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use crs_export_core::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_geometry_text("POLYGON((30 50, 40 50, 40 60, 30 50))")
    ///     .expect("extent");
    /// assert_eq!((bbox.west, bbox.east, bbox.south, bbox.north), (30.0, 40.0, 50.0, 60.0));
    /// ```
    #[must_use]
    pub fn from_geometry_text(text: &str) -> Option<Self> {
        let body = text.rsplit(';').next().unwrap_or(text);
        let numbers = numeric_tokens(body)
            .map(|token| token.parse::<f64>().ok().filter(|value| value.is_finite()))
            .collect::<Option<Vec<_>>>()?;
        if numbers.len() % 2 != 0 {
            return None;
        }
        let points: Vec<Point> = numbers
            .chunks_exact(2)
            .filter_map(|pair| match pair {
                [x, y] => Some(Point::from(Coord { x: *x, y: *y })),
                _ => None,
            })
            .collect();
        let rect = MultiPoint::new(points).bounding_rect()?;
        Self::new(rect.min().x, rect.max().x, rect.min().y, rect.max().y)
    }
}

/// Splits geometry text into candidate numeric tokens.
fn numeric_tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let start = rest.find(|ch: char| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.'))?;
        let tail = rest.get(start..)?;
        let len = tail
            .find(|ch: char| !(ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E')))
            .unwrap_or(tail.len());
        let (token, remainder) = tail.split_at(len);
        rest = remainder;
        Some(token)
    })
}

/// A coordinate reference system joined with its custom metadata.
///
/// Records are read-only from the engine's perspective.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrsRecord {
    /// Unique identifier.
    pub srid: Srid,
    /// Authority name such as `EPSG` or `custom`.
    pub authority: String,
    /// Identifier within the authority; may equal `srid`.
    pub authority_srid: i64,
    /// Stored WKT (`srtext`).
    pub wkt_text: Option<String>,
    /// Stored PROJ4 definition.
    pub proj4_text: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Reliability marker.
    pub reliability: Option<String>,
    /// Name of a user-defined system.
    pub custom_name: Option<String>,
    /// Extent derived from stored geometry.
    pub bounding_box: Option<BoundingBox>,
}

impl CrsRecord {
    /// Starts a record with only its identity set.
    #[must_use]
    pub fn new(srid: Srid, authority: impl Into<String>, authority_srid: i64) -> Self {
        Self {
            srid,
            authority: authority.into(),
            authority_srid,
            wkt_text: None,
            proj4_text: None,
            description: None,
            reliability: None,
            custom_name: None,
            bounding_box: None,
        }
    }

    /// Joins an authoritative row with optional custom metadata.
    #[must_use]
    pub fn from_parts(row: AuthoritativeRow, metadata: Option<CustomMetadata>) -> Self {
        let custom = metadata.unwrap_or_default();
        Self {
            srid: row.srid,
            authority: row.authority,
            authority_srid: row.authority_srid,
            wkt_text: row.wkt_text,
            proj4_text: row.proj4_text,
            description: custom.description,
            reliability: custom.reliability,
            custom_name: custom.custom_name,
            bounding_box: custom.bounding_box,
        }
    }

    /// Canonical record of a UTM zone with no stored row.
    #[must_use]
    pub fn canonical_utm(zone: UtmZone) -> Self {
        let srid = zone.srid();
        Self::new(srid, "EPSG", i64::from(srid))
            .with_wkt(zone.canonical_wkt())
            .with_proj4(zone.canonical_proj4())
    }

    /// Sets the stored WKT.
    #[must_use]
    pub fn with_wkt(mut self, wkt: impl Into<String>) -> Self {
        self.wkt_text = Some(wkt.into());
        self
    }

    /// Sets the stored PROJ4 definition.
    #[must_use]
    pub fn with_proj4(mut self, proj4: impl Into<String>) -> Self {
        self.proj4_text = Some(proj4.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the reliability marker.
    #[must_use]
    pub fn with_reliability(mut self, reliability: impl Into<String>) -> Self {
        self.reliability = Some(reliability.into());
        self
    }

    /// Sets the custom name.
    #[must_use]
    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = Some(name.into());
        self
    }

    /// Sets the bounding box.
    #[must_use]
    pub const fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    /// Returns `true` when the authority is the custom marker.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.authority.trim().eq_ignore_ascii_case(CUSTOM_AUTHORITY)
    }

    /// Stored WKT, ignoring blank values.
    #[must_use]
    pub fn wkt(&self) -> Option<&str> {
        non_blank(self.wkt_text.as_deref())
    }

    /// Stored PROJ4 definition, ignoring blank values.
    #[must_use]
    pub fn proj4(&self) -> Option<&str> {
        non_blank(self.proj4_text.as_deref())
    }

    /// Description, ignoring blank values.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    /// Reliability marker, ignoring blank values.
    #[must_use]
    pub fn reliability(&self) -> Option<&str> {
        non_blank(self.reliability.as_deref())
    }

    /// UTM zone of the record's SRID.
    #[must_use]
    pub fn utm_zone(&self) -> Option<UtmZone> {
        self.srid.utm_zone()
    }

    /// Fails when neither WKT nor PROJ4 text is present.
    pub fn ensure_definition(&self) -> Result<(), ValidationError> {
        if self.wkt().is_none() && self.proj4().is_none() {
            return Err(ValidationError::MissingDefinition { srid: self.srid });
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}
