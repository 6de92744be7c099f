//! Filename derivation and sanitisation.

use crate::{CrsRecord, ExportFormat};

/// Default maximum length of sanitised filenames.
pub const FILENAME_MAX_LENGTH: usize = 100;
/// Maximum length of identifiers inside the XML dictionary.
pub const IDENTIFIER_MAX_LENGTH: usize = 64;

const ILLEGAL_CHARACTERS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces Cyrillic letters with Latin transliterations.
///
/// Characters without a mapping are returned unchanged.
#[must_use]
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match cyrillic_to_latin(ch) {
            Some(latin) => out.push_str(latin),
            None => out.push(ch),
        }
    }
    out
}

#[rustfmt::skip]
const fn cyrillic_to_latin(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'а' => "a", 'б' => "b", 'в' => "v", 'г' => "g", 'д' => "d", 'е' => "e",
        'ё' => "e", 'ж' => "zh", 'з' => "z", 'и' => "i", 'й' => "y", 'к' => "k",
        'л' => "l", 'м' => "m", 'н' => "n", 'о' => "o", 'п' => "p", 'р' => "r",
        'с' => "s", 'т' => "t", 'у' => "u", 'ф' => "f", 'х' => "kh", 'ц' => "ts",
        'ч' => "ch", 'ш' => "sh", 'щ' => "shch", 'ъ' => "", 'ы' => "y", 'ь' => "",
        'э' => "e", 'ю' => "yu", 'я' => "ya",
        'А' => "A", 'Б' => "B", 'В' => "V", 'Г' => "G", 'Д' => "D", 'Е' => "E",
        'Ё' => "E", 'Ж' => "Zh", 'З' => "Z", 'И' => "I", 'Й' => "Y", 'К' => "K",
        'Л' => "L", 'М' => "M", 'Н' => "N", 'О' => "O", 'П' => "P", 'Р' => "R",
        'С' => "S", 'Т' => "T", 'У' => "U", 'Ф' => "F", 'Х' => "Kh", 'Ц' => "Ts",
        'Ч' => "Ch", 'Ш' => "Sh", 'Щ' => "Shch", 'Ъ' => "", 'Ы' => "Y", 'Ь' => "",
        'Э' => "E", 'Ю' => "Yu", 'Я' => "Ya",
        'і' => "i", 'ї' => "yi", 'є' => "ye", 'ґ' => "g",
        'І' => "I", 'Ї' => "Yi", 'Є' => "Ye", 'Ґ' => "G",
        _ => return None,
    };
    Some(latin)
}

const fn is_separator(ch: char) -> bool {
    matches!(ch, '_' | '-')
}

fn needs_replacement(ch: char) -> bool {
    ch.is_whitespace()
        || ch.is_control()
        || ILLEGAL_CHARACTERS.contains(&ch)
        || ('\u{0400}'..='\u{052F}').contains(&ch)
}

/// Produces a filesystem-safe name of at most `max_length` characters.
///
/// Deterministic and idempotent. The result never contains whitespace,
/// Cyrillic letters or any of `\ / : * ? " < > |`.
///
/// # Examples
///
/// ```
/// use crs_export_core::naming::sanitize;
///
/// assert_eq!(sanitize("  МСК-50 / зона: 1  ", 100), "MSK-50_zona_1");
/// assert_eq!(sanitize("a___b--c", 100), "a_b-c");
/// ```
#[must_use]
pub fn sanitize(text: &str, max_length: usize) -> String {
    let transliterated = transliterate(text);
    let mut collapsed = String::with_capacity(transliterated.len());
    for ch in transliterated.chars() {
        let mapped = if needs_replacement(ch) { '_' } else { ch };
        if is_separator(mapped) && collapsed.ends_with(mapped) {
            continue;
        }
        collapsed.push(mapped);
    }
    let truncated: String = trim_separators(&collapsed)
        .chars()
        .take(max_length)
        .collect();
    trim_separators(&truncated).to_owned()
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(is_separator)
}

/// Extracts the quoted name of a `PROJCS[...]` or `GEOGCS[...]` head.
///
/// # Examples
///
/// ```
/// use crs_export_core::naming::wkt_head_name;
///
/// assert_eq!(wkt_head_name("PROJCS[\"Pulkovo 1942 / zone 7\",GEOGCS[...]]"), Some("Pulkovo 1942 / zone 7"));
/// assert_eq!(wkt_head_name("LOCAL_CS[\"x\"]"), None);
/// ```
#[must_use]
pub fn wkt_head_name(wkt: &str) -> Option<&str> {
    let text = wkt.trim_start();
    let keyword = text.get(..6)?;
    if !(keyword.eq_ignore_ascii_case("PROJCS") || keyword.eq_ignore_ascii_case("GEOGCS")) {
        return None;
    }
    let rest = text.get(6..)?.trim_start().strip_prefix('[')?;
    let quoted = rest.trim_start().strip_prefix('"')?;
    let (raw_name, _) = quoted.split_once('"')?;
    let name = raw_name.trim();
    (!name.is_empty()).then_some(name)
}

/// Sanitised base name of a custom record, without suffix or extension.
///
/// Prefers the WKT head name, then plain (non-WKT) text stored as WKT, then
/// the custom name.
#[must_use]
pub fn custom_base_name(record: &CrsRecord) -> Option<String> {
    let wkt = record.wkt();
    let candidates = [
        wkt.and_then(wkt_head_name),
        wkt.filter(|text| !text.contains('[')),
        record.custom_name.as_deref(),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|candidate| sanitize(candidate, FILENAME_MAX_LENGTH))
        .find(|name| !name.is_empty())
}

fn authoritative_base_name(record: &CrsRecord) -> Option<String> {
    let identifier = if record.authority_srid > 0 {
        record.authority_srid
    } else {
        i64::from(record.srid)
    };
    let from_wkt = record
        .wkt()
        .and_then(wkt_head_name)
        .map(|name| sanitize(name, FILENAME_MAX_LENGTH))
        .filter(|name| !name.is_empty());
    let stem = from_wkt.or_else(|| {
        Some(sanitize(&record.authority, FILENAME_MAX_LENGTH)).filter(|name| !name.is_empty())
    })?;
    Some(sanitize(&format!("{stem}_{identifier}"), FILENAME_MAX_LENGTH))
}

/// Derives the output filename of `record` in `format`.
///
/// Priority: UTM zone label, custom name plus the format's version suffix,
/// authoritative WKT name or `<authority>_<id>`, then `cs_<srid>`.
///
/// # Examples
///
/// ```
/// use crs_export_core::{naming::derive_filename, CrsRecord, ExportFormat, Srid};
///
/// let record = CrsRecord::new(Srid::new(32760).expect("srid"), "EPSG", 32760);
/// assert_eq!(derive_filename(&record, ExportFormat::PrjV1), "UTM_zone_60S.prj");
/// ```
#[must_use]
pub fn derive_filename(record: &CrsRecord, format: ExportFormat) -> String {
    let extension = format.extension();
    if let Some(zone) = record.utm_zone() {
        return format!("UTM_zone_{}.{extension}", zone.label());
    }
    if record.is_custom() {
        let base = custom_base_name(record)
            .unwrap_or_else(|| format!("custom_srid_{}", record.srid));
        return format!("{base}{}.{extension}", format.version_suffix());
    }
    authoritative_base_name(record).map_or_else(
        || format!("cs_{}.{extension}", record.srid),
        |base| format!("{base}.{extension}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Srid;
    use rstest::rstest;

    fn srid(raw: i64) -> Srid {
        Srid::new(raw).expect("srid")
    }

    #[rstest]
    #[case("Москва", "Moskva")]
    #[case("СК-42 зона 7", "SK-42_zona_7")]
    #[case("a:b*c?d\"e<f>g|h\\i/j", "a_b_c_d_e_f_g_h_i_j")]
    #[case("__lead and trail--", "lead_and_trail")]
    #[case("tab\tnew\nline", "tab_new_line")]
    #[case("MSK-50.1", "MSK-50.1")]
    #[case("ўзбек", "zbek")]
    fn sanitizes_text(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input, FILENAME_MAX_LENGTH), expected);
    }

    #[rstest]
    fn truncates_by_characters_then_trims() {
        let input = format!("{}_tail", "a".repeat(63));
        assert_eq!(sanitize(&input, 64), "a".repeat(63));
        assert_eq!(sanitize("Ёжик", 2), "Ez");
    }

    #[rstest]
    #[case("PROJCS[\"Pulkovo 1942 / zone 7\",GEOGCS[]]", Some("Pulkovo 1942 / zone 7"))]
    #[case("  geogcs [ \"WGS 84\" ]", Some("WGS 84"))]
    #[case("PROJCS[\"\"]", None)]
    #[case("PROJCS[name]", None)]
    #[case("COMPD_CS[\"x\"]", None)]
    fn extracts_wkt_head_names(#[case] wkt: &str, #[case] expected: Option<&str>) {
        assert_eq!(wkt_head_name(wkt), expected);
    }

    #[rstest]
    #[case(32601, ExportFormat::PrjV1, "UTM_zone_01N.prj")]
    #[case(32760, ExportFormat::PrjV2, "UTM_zone_60S.prj")]
    #[case(32637, ExportFormat::XmlDictionary, "UTM_zone_37N.xml")]
    fn utm_names_ignore_stored_wkt(
        #[case] raw: i64,
        #[case] format: ExportFormat,
        #[case] expected: &str,
    ) {
        let record = CrsRecord::new(srid(raw), "EPSG", raw).with_wkt("PROJCS[\"Something else\"]");
        assert_eq!(derive_filename(&record, format), expected);
    }

    #[rstest]
    #[case(ExportFormat::PrjV1, "MSK-50_zona_1_v20.prj")]
    #[case(ExportFormat::PrjV2, "MSK-50_zona_1_v25.prj")]
    #[case(ExportFormat::XmlDictionary, "MSK-50_zona_1_civil3d.xml")]
    fn custom_names_carry_version_suffix(#[case] format: ExportFormat, #[case] expected: &str) {
        let record =
            CrsRecord::new(srid(100_001), "custom", 100_001).with_custom_name("МСК-50 зона 1");
        assert_eq!(derive_filename(&record, format), expected);
    }

    #[rstest]
    fn custom_wkt_head_wins_over_custom_name() {
        let record = CrsRecord::new(srid(100_001), "custom", 100_001)
            .with_wkt("PROJCS[\"GSK11 zone 3\",GEOGCS[]]")
            .with_custom_name("ignored");
        assert_eq!(derive_filename(&record, ExportFormat::PrjV1), "GSK11_zone_3_v20.prj");
    }

    #[rstest]
    fn custom_without_names_uses_srid() {
        let record = CrsRecord::new(srid(100_002), "custom", 100_002).with_proj4("+proj=tmerc");
        assert_eq!(
            derive_filename(&record, ExportFormat::PrjV2),
            "custom_srid_100002_v25.prj"
        );
    }

    #[rstest]
    fn authoritative_names_use_wkt_head() {
        let record = CrsRecord::new(srid(28407), "EPSG", 28407)
            .with_wkt("PROJCS[\"Pulkovo 1942 / Gauss-Kruger zone 7\",GEOGCS[]]");
        assert_eq!(
            derive_filename(&record, ExportFormat::PrjV1),
            "Pulkovo_1942_Gauss-Kruger_zone_7_28407.prj"
        );
    }

    #[rstest]
    fn authoritative_without_wkt_name_uses_authority() {
        let record = CrsRecord::new(srid(3857), "EPSG", 3857).with_proj4("+proj=merc");
        assert_eq!(derive_filename(&record, ExportFormat::PrjV1), "EPSG_3857.prj");
    }

    #[rstest]
    fn falls_back_to_cs_srid() {
        let record = CrsRecord::new(srid(900_913), "//", 0).with_proj4("+proj=merc");
        assert_eq!(derive_filename(&record, ExportFormat::PrjV2), "cs_900913.prj");
    }
}
