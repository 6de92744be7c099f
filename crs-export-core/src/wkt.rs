//! Cosmetic WKT cleanup for PRJ output.
//!
//! Both styles are idempotent and never alter quoted text beyond collapsing
//! whitespace runs.

/// Layout applied by [`clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WktStyle {
    /// Single line with one space after every comma.
    Spaced,
    /// Nested nodes broken onto lines indented four spaces per depth.
    Indented,
}

const INDENT: &str = "    ";

/// Reformats WKT text in the given style.
///
/// # Examples
///
/// ```
/// use crs_export_core::wkt::{clean, WktStyle};
///
/// let raw = "GEOGCS[ \"WGS 84\" ,  DATUM[\"WGS_1984\"] ]";
/// assert_eq!(clean(raw, WktStyle::Spaced), "GEOGCS[\"WGS 84\", DATUM[\"WGS_1984\"]]");
/// assert_eq!(
///     clean(raw, WktStyle::Indented),
///     "GEOGCS[\"WGS 84\",\n    DATUM[\"WGS_1984\"]]"
/// );
/// ```
#[must_use]
pub fn clean(wkt: &str, style: WktStyle) -> String {
    let compact = compact(wkt);
    match style {
        WktStyle::Spaced => space_commas(&compact),
        WktStyle::Indented => indent_nodes(&compact),
    }
}

const fn is_structural(ch: char) -> bool {
    matches!(ch, '[' | ']' | '(' | ')' | ',')
}

/// Collapses whitespace runs and removes padding around structural characters.
fn compact(wkt: &str) -> String {
    let mut out = String::with_capacity(wkt.len());
    let mut in_quotes = false;
    let mut pending_space = false;
    for ch in wkt.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            pending_space = false;
            let after_structural = out.chars().next_back().is_some_and(is_structural);
            let keep = in_quotes || (!out.is_empty() && !after_structural && !is_structural(ch));
            if keep {
                out.push(' ');
            }
        }
        if ch == '"' {
            in_quotes = !in_quotes;
        }
        out.push(ch);
    }
    out
}

fn space_commas(compact: &str) -> String {
    let mut out = String::with_capacity(compact.len() + compact.len() / 8);
    let mut in_quotes = false;
    for ch in compact.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        }
        out.push(ch);
        if ch == ',' && !in_quotes {
            out.push(' ');
        }
    }
    out
}

fn indent_nodes(compact: &str) -> String {
    let mut out = String::with_capacity(compact.len() * 2);
    let mut in_quotes = false;
    let mut depth = 0_usize;
    for (index, ch) in compact.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        }
        if in_quotes {
            out.push(ch);
            continue;
        }
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        out.push(ch);
        let rest = compact.get(index + ch.len_utf8()..).unwrap_or_default();
        if ch == ',' && starts_node(rest) {
            out.push('\n');
            out.push_str(&INDENT.repeat(depth));
        }
    }
    out
}

/// Returns `true` when `text` begins with `KEYWORD[` or `KEYWORD(`.
fn starts_node(text: &str) -> bool {
    let keyword_len = text
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .unwrap_or(text.len());
    keyword_len > 0
        && text
            .chars()
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic())
        && text
            .get(keyword_len..)
            .is_some_and(|tail| tail.starts_with(['[', '(']))
}
