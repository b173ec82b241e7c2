//! Text clean-up for translated question files
//!
//! Upstream translation leaves two kinds of residue in the question JSON:
//! stray special symbols (underscores standing in for spaces, literal
//! braces) and HTML character references. This module removes both over a
//! whole `uid → string` map before masking runs.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// HTML character references: numeric (`&#8211;`) or named (`&ndash;`).
static HTML_ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(&#[0-9]{1,7};)|(&[a-z]+;)").expect("entity pattern compiles"));

/// Default symbol replacements applied to translated questions: the
/// underscore stands in for a space upstream, braces are noise.
pub const DEFAULT_SYMBOL_REPLACEMENTS: [(&str, &str); 3] = [("_", " "), ("{", ""), ("}", "")];

/// Referents of the named HTML entities used for typography, after the
/// W3C's common-entities table.
fn named_entity_referent(entity: &str) -> Option<&'static str> {
    Some(match entity {
        "&quot;" => "\"",
        "&amp;" => "&",
        "&cent;" => "¢",
        "&pound;" => "£",
        "&sect;" => "§",
        "&copy;" => "©",
        "&laquo;" => "«",
        "&raquo;" => "»",
        "&reg;" => "®",
        "&deg;" => "°",
        "&plusmn;" => "±",
        "&para;" => "¶",
        "&middot;" => "·",
        "&frac12;" => "½",
        "&ndash;" => "–",
        "&mdash;" => "—",
        "&lsquo;" => "‘",
        "&rsquo;" => "’",
        "&sbquo;" => "‚",
        "&ldquo;" => "“",
        "&rdquo;" => "”",
        "&bdquo;" => "„",
        "&dagger;" => "†",
        "&bull;" => "•",
        "&hellip;" => "…",
        "&prime;" => "′",
        "&euro;" => "€",
        "&trade;" => "™",
        "&asymp;" => "≈",
        "&ne;" => "≠",
        "&le;" => "≤",
        "&ge;" => "≥",
        "&lt;" => "<",
        "&gt;" => ">",
        _ => return None,
    })
}

/// Replace each `(pattern, replacement)` pair in order. Plain substring
/// replacement; order matters when patterns overlap.
#[must_use]
pub fn replace_symbols(text: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in replacements {
        out = out.replace(pattern, replacement);
    }
    out
}

/// Decode HTML character references to the symbols they refer to.
///
/// Named entities follow the typography table; numeric references decode
/// through their Unicode scalar value. Unknown names and invalid scalars
/// are left untouched.
///
/// # Examples
///
/// ```
/// use qamask::sanitize::decode_html_entities;
///
/// assert_eq!(decode_html_entities("Tom &amp; Jerry"), "Tom & Jerry");
/// assert_eq!(decode_html_entities("it&#39;s"), "it's");
/// ```
#[must_use]
pub fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0usize;
    for found in HTML_ENTITY_REGEX.find_iter(text) {
        out.push_str(&text[last..found.start()]);
        let entity = found.as_str();
        if let Some(referent) = named_entity_referent(entity) {
            out.push_str(referent);
        } else if let Some(code) = entity
            .strip_prefix("&#")
            .and_then(|rest| rest.strip_suffix(';'))
            .and_then(|digits| digits.parse::<u32>().ok())
            .and_then(char::from_u32)
        {
            out.push(code);
        } else {
            out.push_str(entity);
        }
        last = found.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Apply the default symbol replacements, then entity decoding.
#[must_use]
pub fn sanitise_text(text: &str) -> String {
    decode_html_entities(&replace_symbols(text, &DEFAULT_SYMBOL_REPLACEMENTS))
}

/// Sanitise every value of a `uid → text` map.
#[must_use]
pub fn sanitise_question_map(questions: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    questions
        .iter()
        .map(|(uid, text)| (uid.clone(), sanitise_text(text)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_replacements() {
        assert_eq!(
            replace_symbols("wie_regisseerde_{Inception}", &DEFAULT_SYMBOL_REPLACEMENTS),
            "wie regisseerde Inception"
        );
    }

    #[test]
    fn test_named_entities_decoded() {
        assert_eq!(decode_html_entities("1999&ndash;2010"), "1999–2010");
        assert_eq!(decode_html_entities("&laquo;cite&raquo;"), "«cite»");
    }

    #[test]
    fn test_numeric_entities_decoded_as_scalars() {
        assert_eq!(decode_html_entities("it&#39;s"), "it's");
        assert_eq!(decode_html_entities("&#955;"), "λ");
    }

    #[test]
    fn test_unknown_entities_left_alone() {
        assert_eq!(decode_html_entities("&nosuch; &#1114112;"), "&nosuch; &#1114112;");
    }

    #[test]
    fn test_sanitise_question_map() {
        let mut map = BTreeMap::new();
        map.insert("19".to_string(), "a_b &amp; c".to_string());
        let cleaned = sanitise_question_map(&map);
        assert_eq!(cleaned["19"], "a b & c");
    }
}
