//! String normalization shared by every extractor.
//!
//! All functions here are pure. Pattern tables are compiled once and shared
//! read-only across threads.

use std::borrow::Cow;
use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

use crate::config::default_author_suffix_max_len;

/// Unicode vulgar fractions and their ASCII spelling.
const FRACTIONS: &[(char, &str)] = &[
    ('½', "1/2"),
    ('¼', "1/4"),
    ('¾', "3/4"),
    ('⅓', "1/3"),
    ('⅔', "2/3"),
    ('⅛', "1/8"),
    ('⅜', "3/8"),
    ('⅝', "5/8"),
    ('⅞', "7/8"),
    ('⅕', "1/5"),
    ('⅖', "2/5"),
    ('⅗', "3/5"),
    ('⅘', "4/5"),
    ('⅙', "1/6"),
    ('⅚', "5/6"),
];

static RECIPE_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+recipe\s*$").expect("Invalid recipe suffix regex"));

static DOUBLE_PARENS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\(\s*([^()]*?)\s*\)\)").expect("Invalid double parenthesis regex")
});

static TRAILING_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s*]*\*[\s*]*$").expect("Invalid trailing marker regex"));

/// "Editor's note:", "Editors note:", "Editor note:" in any case.
static EDITOR_NOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\beditor(?:'s|’s|s)?\s+note\s*:").expect("Invalid editor note regex")
});

static ISO_DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("Invalid ISO duration regex")
});

/// Decode named, decimal and hexadecimal HTML entities.
pub fn decode_entities(text: &str) -> String {
    decode_html_entities(text).into_owned()
}

/// Replace Unicode vulgar fractions with `n/d`.
///
/// A fraction glued to a preceding digit is separated by a space so that
/// `1½` reads `1 1/2` rather than `11/2`.
pub fn normalize_fractions(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| fraction_for(c).is_some()) {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;
    for c in text.chars() {
        match fraction_for(c) {
            Some(ascii) => {
                if prev.is_some_and(|p| p.is_ascii_digit()) {
                    output.push(' ');
                }
                output.push_str(ascii);
            }
            None => output.push(c),
        }
        prev = Some(c);
    }
    Cow::Owned(output)
}

fn fraction_for(c: char) -> Option<&'static str> {
    FRACTIONS
        .iter()
        .find(|(fraction, _)| *fraction == c)
        .map(|(_, ascii)| *ascii)
}

/// Decode entities, normalize fractions and collapse whitespace runs.
pub fn clean_text(text: &str) -> String {
    let decoded = decode_entities(text);
    normalize_fractions(&decoded)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`clean_title_with`] using the default author-suffix threshold.
pub fn clean_title(title: &str) -> String {
    clean_title_with(title, default_author_suffix_max_len())
}

/// Remove a trailing " Recipe" and a trailing " - Author Name" from a title.
/// A " Recipe" left in front of the author suffix is removed as well.
///
/// The author suffix is only removed when it is non-empty, shorter than
/// `max_suffix_len` characters, and no comma appears anywhere from the
/// title's first dash onwards. A comma there means the dash is part of a
/// dish name such as "One-Pot Salmon, Spinach - and Rice".
pub fn clean_title_with(title: &str, max_suffix_len: usize) -> String {
    let title = RECIPE_SUFFIX_REGEX.replace(title.trim(), "");
    let title = title.trim();

    if let Some((head, suffix)) = title.rsplit_once(" - ") {
        let suffix = suffix.trim();
        let dash_span = title.find('-').map_or("", |pos| &title[pos..]);
        if !suffix.is_empty()
            && !dash_span.contains(',')
            && suffix.chars().count() < max_suffix_len
            && !head.trim().is_empty()
        {
            return RECIPE_SUFFIX_REGEX.replace(head.trim(), "").trim().to_string();
        }
    }

    title.to_string()
}

/// Collapse `((x))` to `(x)` and strip trailing `*` footnote markers.
pub fn normalize_ingredient_text(text: &str) -> String {
    let collapsed = DOUBLE_PARENS_REGEX.replace_all(text, "($1)");
    let stripped = TRAILING_MARKER_REGEX.replace(&collapsed, "");
    stripped.trim().to_string()
}

/// Drop editorial notes from a list of lines.
///
/// A line starting with an editor's note marker is dropped entirely. A line
/// with the marker later on keeps only the text before it. Lines left empty
/// are dropped.
pub fn filter_editorial_notes<I, S>(lines: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines.into_iter().filter_map(|line| {
        let line = line.as_ref().trim();
        let kept = match EDITOR_NOTE_REGEX.find(line) {
            Some(marker) if marker.start() == 0 => return None,
            Some(marker) => line[..marker.start()].trim(),
            None => line,
        };
        (!kept.is_empty()).then(|| kept.to_string())
    })
}

/// Parse an ISO 8601 duration such as `PT1H30M` into whole minutes.
///
/// Returns `None` for empty or unrecognized input; `PT0M` is `Some(0)`.
/// Seconds count towards whole minutes, rounding down.
pub fn parse_iso_duration_to_minutes(duration: &str) -> Option<u32> {
    let caps = ISO_DURATION_REGEX.captures(duration.trim())?;
    if (1..=4).all(|i| caps.get(i).is_none()) {
        return None;
    }

    let component = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
    };
    let days = component(1)?;
    let hours = component(2)?;
    let minutes = component(3)?;
    let seconds = caps
        .get(4)
        .map_or(Some(0.0), |m| m.as_str().parse::<f64>().ok())?;

    let total = days
        .checked_mul(24 * 60)?
        .checked_add(hours.checked_mul(60)?)?
        .checked_add(minutes)?
        .checked_add((seconds / 60.0).floor() as u64)?;
    u32::try_from(total).ok()
}
