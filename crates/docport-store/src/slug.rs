//! Section name normalization.

use crate::StoreError;

/// Longest accepted section name, counted after HTML escaping.
pub const MAX_NAME_LEN: usize = 255;

/// Slug used when a name has no letters or digits left after folding.
const FALLBACK_SLUG: &str = "section";

/// Derive a URL slug from a section name.
///
/// Latin letters with diacritics fold to their ASCII base and a few symbols
/// spell out (`&` becomes `and`). Whitespace runs become a single `-`; any
/// other character is dropped. The result is lowercase. Names with nothing
/// left map to `"section"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut separator = false;

    for c in name.chars() {
        if c.is_whitespace() {
            separator = true;
            continue;
        }

        let mut push = |ch: char| {
            if ch.is_ascii_alphanumeric() {
                if separator && !slug.is_empty() {
                    slug.push('-');
                }
                separator = false;
                slug.push(ch.to_ascii_lowercase());
            }
        };

        match transliterate(c) {
            Some(folded) => folded.chars().for_each(&mut push),
            None => push(c),
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug
    }
}

/// ASCII spelling for symbols and Latin-1 / Latin Extended-A letters.
fn transliterate(c: char) -> Option<&'static str> {
    let folded = match c {
        '&' => "and",
        '$' => "dollar",
        '%' => "percent",
        '<' => "less",
        '>' => "greater",
        '|' => "or",
        '\u{a2}' => "cent",
        '\u{a3}' => "pound",
        '\u{a4}' => "currency",
        '\u{a5}' => "yen",
        '\u{aa}' | '\u{c0}'..='\u{c5}' | '\u{e0}'..='\u{e5}' | '\u{100}'..='\u{105}' => "a",
        '\u{ba}'
        | '\u{d2}'..='\u{d6}'
        | '\u{d8}'
        | '\u{f2}'..='\u{f6}'
        | '\u{f8}'
        | '\u{14c}'..='\u{151}' => "o",
        '\u{c6}' | '\u{e6}' => "ae",
        '\u{a9}' | '\u{c7}' | '\u{e7}' | '\u{106}'..='\u{10d}' => "c",
        '\u{c8}'..='\u{cb}' | '\u{e8}'..='\u{eb}' | '\u{112}'..='\u{11b}' => "e",
        '\u{cc}'..='\u{cf}' | '\u{ec}'..='\u{ef}' | '\u{128}'..='\u{131}' => "i",
        '\u{d0}' | '\u{f0}' | '\u{10e}'..='\u{111}' => "d",
        '\u{d1}' | '\u{f1}' | '\u{143}'..='\u{14b}' => "n",
        '\u{d9}'..='\u{dc}' | '\u{f9}'..='\u{fc}' | '\u{168}'..='\u{173}' => "u",
        '\u{dd}' | '\u{fd}' | '\u{ff}' | '\u{176}'..='\u{178}' => "y",
        '\u{de}' | '\u{fe}' => "th",
        '\u{df}' => "ss",
        '\u{11c}'..='\u{123}' => "g",
        '\u{124}'..='\u{127}' => "h",
        '\u{132}' | '\u{133}' => "ij",
        '\u{134}' | '\u{135}' => "j",
        '\u{136}'..='\u{138}' => "k",
        '\u{139}'..='\u{142}' => "l",
        '\u{152}' | '\u{153}' => "oe",
        '\u{ae}' | '\u{154}'..='\u{159}' => "r",
        '\u{15a}'..='\u{161}' | '\u{17f}' => "s",
        '\u{162}'..='\u{167}' => "t",
        '\u{174}' | '\u{175}' => "w",
        '\u{179}'..='\u{17e}' => "z",
        '\u{20ac}' => "euro",
        '\u{2122}' => "tm",
        '\u{221e}' => "infinity",
        '\u{2665}' => "love",
        _ => return None,
    };
    Some(folded)
}

/// Trim and HTML-escape a section name for storage.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] when the name is blank or longer than
/// [`MAX_NAME_LEN`] characters once escaped.
pub fn sanitize_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("Section name is required".to_owned()));
    }

    let escaped = html_escape::encode_text(trimmed).into_owned();
    if escaped.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::Validation(format!(
            "Section name must be at most {MAX_NAME_LEN} characters long"
        )));
    }

    Ok(escaped)
}

/// Trim optional free text, mapping blank values to `None`.
pub(crate) fn trim_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
