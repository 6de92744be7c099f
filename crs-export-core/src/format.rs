//! Export formats, export parameters and generated output.

use std::fmt;
use std::str::FromStr;

use crate::ValidationError;
use crate::naming::transliterate;

/// Target application format.
///
/// # Examples
///
/// ```
/// use crs_export_core::ExportFormat;
///
/// assert_eq!("prj_gmv25".parse::<ExportFormat>().expect("known"), ExportFormat::PrjV2);
/// assert_eq!("xml".parse::<ExportFormat>().expect("alias"), ExportFormat::XmlDictionary);
/// assert!("shp".parse::<ExportFormat>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum ExportFormat {
    /// Civil 3D XML coordinate-system dictionary.
    XmlDictionary,
    /// GlobalMapper v20 PRJ.
    PrjV1,
    /// GlobalMapper v25 PRJ.
    PrjV2,
}

impl ExportFormat {
    /// Every supported format.
    pub const ALL: [Self; 3] = [Self::XmlDictionary, Self::PrjV1, Self::PrjV2];

    /// Canonical key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::XmlDictionary => "civil3d",
            Self::PrjV1 => "prj_GMv20",
            Self::PrjV2 => "prj_GMv25",
        }
    }

    /// Name of the target application.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::XmlDictionary => "Civil 3D",
            Self::PrjV1 => "GlobalMapper v20",
            Self::PrjV2 => "GlobalMapper v25",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::XmlDictionary => "xml",
            Self::PrjV1 | Self::PrjV2 => "prj",
        }
    }

    /// Suffix appended to custom filenames.
    #[must_use]
    pub const fn version_suffix(self) -> &'static str {
        match self {
            Self::XmlDictionary => "_civil3d",
            Self::PrjV1 => "_v20",
            Self::PrjV2 => "_v25",
        }
    }

    /// Folder name used by batch exports.
    #[must_use]
    pub const fn folder_name(self) -> &'static str {
        match self {
            Self::XmlDictionary => "Civil3D",
            Self::PrjV1 => "GMv20",
            Self::PrjV2 => "GMv25",
        }
    }

    /// Version accepted in [`ExportParams::version`].
    #[must_use]
    pub const fn version(self) -> Option<&'static str> {
        match self {
            Self::XmlDictionary => None,
            Self::PrjV1 => Some("20"),
            Self::PrjV2 => Some("25"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "civil3d" | "xml" => Ok(Self::XmlDictionary),
            "prj_gmv20" | "gmv20" => Ok(Self::PrjV1),
            "prj_gmv25" | "gmv25" => Ok(Self::PrjV2),
            _ => Err(ValidationError::UnknownFormat { key: s.to_owned() }),
        }
    }
}

impl TryFrom<String> for ExportFormat {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExportFormat> for String {
    fn from(value: ExportFormat) -> Self {
        value.key().to_owned()
    }
}

/// Character encoding of generated output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// UTF-8 without BOM.
    #[default]
    Utf8,
    /// UTF-16 little-endian with BOM.
    Utf16,
    /// Transliterated ASCII; remaining characters become `?`.
    Ascii,
}

impl TextEncoding {
    /// Label used in XML declarations and parameters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::Ascii => "ASCII",
        }
    }

    /// Rewrites `text` so that it is representable in this encoding.
    #[must_use]
    pub fn prepare(self, text: String) -> String {
        match self {
            Self::Utf8 | Self::Utf16 => text,
            Self::Ascii => transliterate(&text)
                .chars()
                .map(|ch| if ch.is_ascii() { ch } else { '?' })
                .collect(),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "UTF-8" | "UTF8" => Ok(Self::Utf8),
            "UTF-16" | "UTF16" => Ok(Self::Utf16),
            "ASCII" => Ok(Self::Ascii),
            _ => Err(ValidationError::InvalidParameter {
                name: "encoding",
                value: s.to_owned(),
                expected: "UTF-8, UTF-16 or ASCII".to_owned(),
            }),
        }
    }
}

/// Axis order of the XML dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CoordinateOrder {
    /// Easting first.
    #[default]
    EastingNorthing,
    /// Northing first.
    NorthingEasting,
}

impl CoordinateOrder {
    /// Short label, `EN` or `NE`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EastingNorthing => "EN",
            Self::NorthingEasting => "NE",
        }
    }
}

impl FromStr for CoordinateOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EN" => Ok(Self::EastingNorthing),
            "NE" => Ok(Self::NorthingEasting),
            _ => Err(ValidationError::InvalidParameter {
                name: "coordinate_order",
                value: s.to_owned(),
                expected: "EN or NE".to_owned(),
            }),
        }
    }
}

/// Optional parameters of an export call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportParams {
    /// Output encoding.
    pub encoding: TextEncoding,
    /// XML axis order.
    pub coordinate_order: CoordinateOrder,
    /// Expected format version, checked against the requested format.
    pub version: Option<String>,
}

impl ExportParams {
    /// Builds parameters from string pairs; unknown keys are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use crs_export_core::{CoordinateOrder, ExportParams, TextEncoding};
    ///
    /// let params = ExportParams::from_pairs([("encoding", "utf-16"), ("coordinate_order", "NE")])
    ///     .expect("valid");
    /// assert_eq!(params.encoding, TextEncoding::Utf16);
    /// assert_eq!(params.coordinate_order, CoordinateOrder::NorthingEasting);
    /// ```
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key {
                "encoding" => params.encoding = value.parse()?,
                "coordinate_order" => params.coordinate_order = value.parse()?,
                "version" => params.version = Some(value.trim().to_owned()),
                other => log::debug!("ignoring unknown export parameter {other:?}"),
            }
        }
        Ok(params)
    }

    /// Checks that the parameters apply to `format`.
    pub fn validate_for(&self, format: ExportFormat) -> Result<(), ValidationError> {
        let Some(requested) = self.version.as_deref() else {
            return Ok(());
        };
        match format.version() {
            Some(expected) if requested == expected => Ok(()),
            expected => Err(ValidationError::InvalidParameter {
                name: "version",
                value: requested.to_owned(),
                expected: expected.map_or_else(
                    || format!("no version for {format}"),
                    |version| format!("{version} for {format}"),
                ),
            }),
        }
    }
}

/// Serialized export result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputText {
    /// Generated document.
    pub content: String,
    /// Derived filename including extension.
    pub filename: String,
    /// Format that produced the content.
    pub format: ExportFormat,
    /// Encoding applied by [`OutputText::to_bytes`].
    pub encoding: TextEncoding,
}

impl OutputText {
    /// Encodes the content for writing to disk.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.encoding {
            TextEncoding::Utf8 => self.content.as_bytes().to_vec(),
            TextEncoding::Utf16 => {
                let mut bytes = vec![0xFF, 0xFE];
                for unit in self.content.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_le_bytes());
                }
                bytes
            }
            TextEncoding::Ascii => self
                .content
                .chars()
                .map(|ch| u8::try_from(ch).ok().filter(u8::is_ascii).unwrap_or(b'?'))
                .collect(),
        }
    }
}
