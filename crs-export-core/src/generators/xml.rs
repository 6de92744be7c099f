//! Civil 3D XML coordinate-system dictionary.
//!
//! Any [`GenerationError`] raised while assembling the document is absorbed
//! into a stub carrying the SRID and an error status; a partial document is
//! never returned. UTM zones always produce the development stub.

use log::{debug, warn};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{GenerationContext, Geodesy, RotationConvention, format_number};
use crate::naming::{IDENTIFIER_MAX_LENGTH, custom_base_name, sanitize, wkt_head_name};
use crate::{BoundingBox, CoordinateOrder, CrsRecord, ExportFormat, GenerationError, Srid};

/// Namespace of the dictionary schema.
pub const XML_NAMESPACE: &str = "http://www.osgeo.org/mapguide/coordinatesystem";
/// Accuracy, in metres, declared for every datum transformation.
pub const TRANSFORMATION_ACCURACY: u32 = 500;
/// Stub status for SRIDs whose XML export is not available yet.
pub const STUB_STATUS_DEVELOPMENT: &str = "development";
/// Stub status for documents that failed to assemble.
pub const STUB_STATUS_ERROR: &str = "error";

const TARGET_DATUM: &str = "WGS84";

pub(super) fn generate(
    record: &CrsRecord,
    geodesy: Option<&Geodesy>,
    context: &GenerationContext<'_>,
) -> String {
    let encoding = context.params.encoding.label();
    if record.utm_zone().is_some() {
        debug!("SRID {}: XML export of UTM zones is in development", record.srid);
        return stub(record.srid, STUB_STATUS_DEVELOPMENT, encoding);
    }
    match document(record, geodesy, context) {
        Ok(document) => document,
        Err(err) => {
            warn!("SRID {}: XML generation failed, emitting stub: {err}", record.srid);
            stub(record.srid, STUB_STATUS_ERROR, encoding)
        }
    }
}

fn stub(srid: Srid, status: &str, encoding: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"{encoding}\"?>\n\
         <Dictionary xmlns=\"{XML_NAMESPACE}\" version=\"1.0\">\n  \
         <ExportStub srid=\"{srid}\" status=\"{status}\"/>\n\
         </Dictionary>\n"
    )
}

/// Rejects characters outside the XML 1.0 `Char` production.
fn ensure_encodable(text: &str, element: &str) -> Result<(), GenerationError> {
    match text.chars().find(|ch| !is_xml_char(*ch)) {
        Some(character) => Err(GenerationError::InvalidCharacter {
            character,
            element: element.to_owned(),
        }),
        None => Ok(()),
    }
}

const fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

struct DictionaryWriter {
    writer: Writer<Vec<u8>>,
    srid: Srid,
}

impl DictionaryWriter {
    fn new(srid: Srid) -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
            srid,
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), GenerationError> {
        self.writer
            .write_event(event)
            .map_err(|err| GenerationError::Xml {
                srid: self.srid,
                message: err.to_string(),
            })
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), GenerationError> {
        let mut element = BytesStart::new(name);
        for &(key, value) in attributes {
            ensure_encodable(value, name)?;
            element.push_attribute((key, value));
        }
        self.event(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<(), GenerationError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, name: &str, text: &str) -> Result<(), GenerationError> {
        self.text_with(name, &[], text)
    }

    fn text_with(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<(), GenerationError> {
        ensure_encodable(text, name)?;
        self.start(name, attributes)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Result<String, GenerationError> {
        let srid = self.srid;
        let mut document = String::from_utf8(self.writer.into_inner()).map_err(|err| {
            GenerationError::Xml {
                srid,
                message: err.to_string(),
            }
        })?;
        document.push('\n');
        Ok(document)
    }
}

struct Identifiers {
    coordinate_system: String,
    datum: String,
    ellipsoid: String,
    transformation: String,
}

impl Identifiers {
    fn new(record: &CrsRecord, geodesy: &Geodesy) -> Self {
        let srid = record.srid;
        let coordinate_system = custom_base_name(record)
            .or_else(|| record.wkt().and_then(wkt_head_name).map(str::to_owned))
            .map(|name| sanitize(&name, IDENTIFIER_MAX_LENGTH))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("CS_{srid}"));
        let datum = Some(sanitize(&geodesy.datum_name, IDENTIFIER_MAX_LENGTH))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("DATUM_{srid}"));
        let ellipsoid = Some(sanitize(&geodesy.ellipsoid.canonical_id, IDENTIFIER_MAX_LENGTH))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("ELLIPSOID_{srid}"));
        let transformation = sanitize(&format!("{datum}_to_{TARGET_DATUM}"), IDENTIFIER_MAX_LENGTH);
        Self {
            coordinate_system,
            datum,
            ellipsoid,
            transformation,
        }
    }
}

fn document(
    record: &CrsRecord,
    geodesy: Option<&Geodesy>,
    context: &GenerationContext<'_>,
) -> Result<String, GenerationError> {
    let resolved = geodesy.ok_or(GenerationError::MissingProj4 { srid: record.srid })?;
    let ids = Identifiers::new(record, resolved);
    let mut xml = DictionaryWriter::new(record.srid);

    xml.event(Event::Decl(BytesDecl::new(
        "1.0",
        Some(context.params.encoding.label()),
        None,
    )))?;
    xml.start(
        "Dictionary",
        &[("xmlns", XML_NAMESPACE), ("version", "1.0")],
    )?;
    write_coordinate_system(&mut xml, record, &ids, resolved, context)?;
    write_datum(&mut xml, record, &ids, resolved)?;
    write_ellipsoid(&mut xml, &ids, resolved)?;
    write_transformation(&mut xml, record, &ids, resolved)?;
    xml.end("Dictionary")?;
    xml.finish()
}

fn authority_text(record: &CrsRecord) -> String {
    format!("{}:{}", record.authority, record.srid)
}

fn write_coordinate_system(
    xml: &mut DictionaryWriter,
    record: &CrsRecord,
    ids: &Identifiers,
    geodesy: &Geodesy,
    context: &GenerationContext<'_>,
) -> Result<(), GenerationError> {
    let projection = &geodesy.parameters.projection;
    xml.start(
        "ProjectedCoordinateSystem",
        &[("id", ids.coordinate_system.as_str())],
    )?;
    xml.text("Name", &ids.coordinate_system)?;
    xml.text(
        "Description",
        record
            .description()
            .or(record.custom_name.as_deref())
            .unwrap_or(&ids.coordinate_system),
    )?;
    xml.text("Authority", &authority_text(record))?;
    if let Some(reliability) = record.reliability() {
        xml.text("AdditionalInformation", &format!("Reliability: {reliability}"))?;
    }

    let bbox = record.bounding_box.unwrap_or(BoundingBox::DEFAULT_VALIDITY);
    xml.start("DomainOfValidity", &[])?;
    xml.start("Extent", &[])?;
    xml.start("GeographicElement", &[])?;
    xml.start("GeographicBoundingBox", &[])?;
    xml.text("WestBoundLongitude", &format_number(bbox.west))?;
    xml.text("EastBoundLongitude", &format_number(bbox.east))?;
    xml.text("SouthBoundLatitude", &format_number(bbox.south))?;
    xml.text("NorthBoundLatitude", &format_number(bbox.north))?;
    xml.end("GeographicBoundingBox")?;
    xml.end("GeographicElement")?;
    xml.end("Extent")?;
    xml.end("DomainOfValidity")?;

    xml.text("DatumId", &ids.datum)?;
    xml.start("Axis", &[("uom", "METER")])?;
    let axes = match context.params.coordinate_order {
        CoordinateOrder::EastingNorthing => [("Easting", "E", "east"), ("Northing", "N", "north")],
        CoordinateOrder::NorthingEasting => [("Northing", "N", "north"), ("Easting", "E", "east")],
    };
    for (order, (name, abbreviation, direction)) in ["1", "2"].into_iter().zip(axes) {
        xml.start("CoordinateSystemAxis", &[])?;
        xml.text("AxisOrder", order)?;
        xml.text("AxisName", name)?;
        xml.text("AxisAbbreviation", abbreviation)?;
        xml.text("AxisDirection", direction)?;
        xml.end("CoordinateSystemAxis")?;
    }
    xml.end("Axis")?;

    xml.start("Conversion", &[])?;
    xml.start("Projection", &[])?;
    xml.text("OperationMethodId", "Transverse Mercator")?;
    let parameters = [
        ("Longitude of natural origin", projection.central_meridian, "degree"),
        ("Latitude of natural origin", projection.origin_latitude, "degree"),
        ("Scaling factor for coord differences", projection.scale_factor, "unity"),
        ("False easting", projection.false_easting, "METER"),
        ("False northing", projection.false_northing, "METER"),
    ];
    for (name, value, uom) in parameters {
        write_parameter(xml, name, value, uom)?;
    }
    xml.end("Projection")?;
    xml.end("Conversion")?;
    xml.end("ProjectedCoordinateSystem")
}

fn write_parameter(
    xml: &mut DictionaryWriter,
    name: &str,
    value: f64,
    uom: &str,
) -> Result<(), GenerationError> {
    xml.start("ParameterValue", &[])?;
    xml.text("OperationParameterId", name)?;
    xml.text_with("Value", &[("uom", uom)], &format_number(value))?;
    xml.end("ParameterValue")
}

fn write_datum(
    xml: &mut DictionaryWriter,
    record: &CrsRecord,
    ids: &Identifiers,
    geodesy: &Geodesy,
) -> Result<(), GenerationError> {
    xml.start("GeodeticDatum", &[("id", ids.datum.as_str())])?;
    xml.text("Name", &ids.datum)?;
    xml.text("Description", &geodesy.datum_name)?;
    xml.text("Authority", &authority_text(record))?;
    xml.text("PrimeMeridianId", "Greenwich")?;
    xml.text("EllipsoidId", &ids.ellipsoid)?;
    xml.end("GeodeticDatum")
}

fn write_ellipsoid(
    xml: &mut DictionaryWriter,
    ids: &Identifiers,
    geodesy: &Geodesy,
) -> Result<(), GenerationError> {
    let ellipsoid = &geodesy.ellipsoid;
    xml.start("Ellipsoid", &[("id", ids.ellipsoid.as_str())])?;
    xml.text("Name", &ellipsoid.display_name)?;
    xml.text("Description", &ellipsoid.description)?;
    xml.text_with(
        "SemiMajorAxis",
        &[("uom", "meter")],
        &format_number(ellipsoid.semi_major_axis),
    )?;
    xml.text_with(
        "SecondDefiningParameter",
        &[("uom", "meter")],
        &format_number(ellipsoid.semi_minor_axis),
    )?;
    xml.end("Ellipsoid")
}

fn write_transformation(
    xml: &mut DictionaryWriter,
    record: &CrsRecord,
    ids: &Identifiers,
    geodesy: &Geodesy,
) -> Result<(), GenerationError> {
    let helmert = &geodesy.parameters.helmert;
    let [dx, dy, dz] = helmert.translations();
    let [rx, ry, rz] =
        RotationConvention::for_format(ExportFormat::XmlDictionary).rotations(helmert);

    xml.start("Transformation", &[("id", ids.transformation.as_str())])?;
    xml.text("Name", &ids.transformation)?;
    xml.text(
        "Description",
        &format!("{} to {TARGET_DATUM}", geodesy.datum_name),
    )?;
    xml.text("Authority", &authority_text(record))?;
    xml.text_with(
        "OperationAccuracy",
        &[("uom", "meter")],
        &TRANSFORMATION_ACCURACY.to_string(),
    )?;
    xml.text("SourceDatumId", &ids.datum)?;
    xml.text("TargetDatumId", TARGET_DATUM)?;
    xml.text("IsReversible", "true")?;
    xml.start("OperationMethod", &[])?;
    xml.start("GeocentricTransformation", &[])?;
    xml.text("OperationMethodId", "Seven Parameter Transformation")?;
    let parameters = [
        ("X-axis translation", dx, "meter"),
        ("Y-axis translation", dy, "meter"),
        ("Z-axis translation", dz, "meter"),
        ("X-axis rotation", rx, "degree"),
        ("Y-axis rotation", ry, "degree"),
        ("Z-axis rotation", rz, "degree"),
        ("Scale difference", helmert.scale_multiplier(), "unity"),
    ];
    for (name, value, uom) in parameters {
        write_parameter(xml, name, value, uom)?;
    }
    xml.end("GeocentricTransformation")?;
    xml.end("OperationMethod")?;
    xml.end("Transformation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj4::TransformParameters;
    use crate::reference::fallback_ellipsoid;
    use crate::{ExportParams, TextEncoding};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn context(params: &ExportParams) -> GenerationContext<'_> {
        GenerationContext {
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("time"),
            params,
        }
    }

    fn custom(name: &str) -> (CrsRecord, Geodesy) {
        let proj4 = "+proj=tmerc +lon_0=39 +x_0=7500000 +ellps=krass +towgs84=23.57,-140.95,-79.8,0,0.35,0.79,-0.22";
        let record = CrsRecord::new(Srid::new(100_070).expect("srid"), "custom", 100_070)
            .with_proj4(proj4)
            .with_custom_name(name);
        let geodesy = Geodesy {
            parameters: TransformParameters::from_proj4(proj4).expect("valid"),
            ellipsoid: fallback_ellipsoid("krass"),
            datum_name: "Pulkovo_1942".to_owned(),
        };
        (record, geodesy)
    }

    #[rstest]
    fn writes_full_dictionary() {
        let params = ExportParams::default();
        let (record, geodesy) = custom("SK42 zone 7");
        let doc = generate(&record, Some(&geodesy), &context(&params));
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(doc.contains(XML_NAMESPACE));
        assert!(doc.contains("<ProjectedCoordinateSystem id=\"SK42_zone_7\">"));
        assert!(doc.contains("<Authority>custom:100070</Authority>"));
        assert!(doc.contains("<WestBoundLongitude>14</WestBoundLongitude>"));
        assert!(doc.contains("<NorthBoundLatitude>89</NorthBoundLatitude>"));
        assert!(doc.contains("<OperationAccuracy uom=\"meter\">500</OperationAccuracy>"));
        assert!(doc.contains("<Value uom=\"METER\">7500000</Value>"));
        assert!(doc.contains("<Value uom=\"degree\">39</Value>"));
        assert!(doc.contains("<GeodeticDatum id=\"Pulkovo_1942\">"));
        assert!(doc.contains("<Ellipsoid id=\"KRASOVSKY1940\">"));
    }

    #[rstest]
    fn rotations_are_negated_degrees() {
        let params = ExportParams::default();
        let (record, geodesy) = custom("SK42 zone 7");
        let doc = generate(&record, Some(&geodesy), &context(&params));
        let expected = format!("<Value uom=\"degree\">{}</Value>", format_number(-0.35 / 3600.0));
        assert!(doc.contains(&expected));
    }

    #[rstest]
    fn scale_difference_is_unitless_ppm() {
        let params = ExportParams::default();
        let (record, geodesy) = custom("SK42 zone 7");
        let doc = generate(&record, Some(&geodesy), &context(&params));
        assert!(doc.contains("<Value uom=\"unity\">-0.00000022</Value>"));
    }

    #[rstest]
    fn axis_order_follows_parameters() {
        let params = ExportParams {
            coordinate_order: CoordinateOrder::NorthingEasting,
            encoding: TextEncoding::Utf16,
            ..ExportParams::default()
        };
        let (record, geodesy) = custom("SK42 zone 7");
        let doc = generate(&record, Some(&geodesy), &context(&params));
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-16\"?>"));
        let northing = doc.find("<AxisName>Northing</AxisName>").expect("northing axis");
        let easting = doc.find("<AxisName>Easting</AxisName>").expect("easting axis");
        assert!(northing < easting);
    }

    #[rstest]
    fn utm_zones_return_development_stub() {
        let params = ExportParams::default();
        let record = CrsRecord::canonical_utm(
            Srid::new(32601).expect("srid").utm_zone().expect("zone"),
        );
        let doc = generate(&record, None, &context(&params));
        assert!(doc.contains("<ExportStub srid=\"32601\" status=\"development\"/>"));
    }

    #[rstest]
    fn invalid_characters_become_error_stub() {
        let params = ExportParams::default();
        let (named, geodesy) = custom("bad\u{1}name");
        let record = named.with_description("bell \u{7}");
        let doc = generate(&record, Some(&geodesy), &context(&params));
        assert!(doc.contains("<ExportStub srid=\"100070\" status=\"error\"/>"));
        assert!(!doc.contains("ProjectedCoordinateSystem"));
    }

    #[rstest]
    fn missing_proj4_becomes_error_stub() {
        let params = ExportParams::default();
        let record = CrsRecord::new(Srid::new(100_071).expect("srid"), "custom", 100_071)
            .with_wkt("PROJCS[\"x\"]");
        let doc = generate(&record, None, &context(&params));
        assert!(doc.contains("status=\"error\""));
    }

    #[rstest]
    fn detects_xml_illegal_characters() {
        assert!(ensure_encodable("ok \t\n text", "Name").is_ok());
        assert_eq!(
            ensure_encodable("a\u{FFFE}", "Name"),
            Err(GenerationError::InvalidCharacter {
                character: '\u{FFFE}',
                element: "Name".to_owned(),
            })
        );
    }
}
