//! Text sanitization for the paginated renderer.
//!
//! The PDF output is restricted to the Latin-1 range. [`sanitize`] first maps
//! typographic punctuation and common accented letters to ASCII, then folds
//! anything still outside Latin-1 either to its undecorated base letter or to
//! `?`. Every output character is ASCII or Latin-1 and none of them is a key
//! of the replacement table, which makes the function idempotent.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Character substituted for anything that cannot be represented.
pub const REPLACEMENT_CHAR: char = '?';

/// Fixed replacement table, applied before the Latin-1 fallback.
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{20AC}', "EUR"),
    ('\u{201D}', "\""),
    ('\u{201C}', "\""),
    ('\u{201E}', "\""),
    ('\u{2019}', "'"),
    ('\u{2018}', "'"),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{2022}', "-"),
    ('\u{00AB}', "\""),
    ('\u{00BB}', "\""),
    ('à', "a"),
    ('á', "a"),
    ('è', "e"),
    ('é', "e"),
    ('ì', "i"),
    ('í', "i"),
    ('ò', "o"),
    ('ó', "o"),
    ('ù', "u"),
    ('ú', "u"),
    ('À', "A"),
    ('Á', "A"),
    ('È', "E"),
    ('É', "E"),
    ('Í', "I"),
    ('Ì', "I"),
    ('Ó', "O"),
    ('Ò', "O"),
    ('Ú', "U"),
    ('Ù', "U"),
    ('ä', "a"),
    ('ö', "o"),
    ('ü', "u"),
    ('Ä', "A"),
    ('Ö', "O"),
    ('Ü', "U"),
    ('ß', "ss"),
    ('ñ', "n"),
    ('Ñ', "N"),
];

fn replacement_for(ch: char) -> Option<&'static str> {
    REPLACEMENTS
        .iter()
        .find(|(from, _)| *from == ch)
        .map(|(_, to)| *to)
}

fn is_latin1(ch: char) -> bool {
    (ch as u32) <= 0xFF
}

/// Normalize `text` into the paginated renderer's character set.
///
/// Total: never fails, and an empty input yields an empty string.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if let Some(rep) = replacement_for(ch) {
            out.push_str(rep);
        } else if is_latin1(ch) {
            out.push(ch);
        } else {
            fold_outside_latin1(ch, &mut out);
        }
    }
    out
}

/// Decompose `ch` and keep its Latin-1 base letters; `?` if nothing survives.
fn fold_outside_latin1(ch: char, out: &mut String) {
    let mut pushed = false;
    for part in std::iter::once(ch).nfd() {
        if is_combining_mark(part) {
            continue;
        }
        if let Some(rep) = replacement_for(part) {
            out.push_str(rep);
            pushed = true;
        } else if is_latin1(part) {
            out.push(part);
            pushed = true;
        }
    }
    if !pushed {
        out.push(REPLACEMENT_CHAR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typographic_quotes() {
        assert_eq!(sanitize("\u{201C}quoted\u{201D}"), "\"quoted\"");
        assert_eq!(sanitize("it\u{2019}s"), "it's");
    }

    #[test]
    fn test_ellipsis_and_dash() {
        assert_eq!(sanitize("wait\u{2026}"), "wait...");
        assert_eq!(sanitize("1990\u{2013}2000"), "1990-2000");
    }

    #[test]
    fn test_currency() {
        assert_eq!(sanitize("10\u{20AC}"), "10EUR");
    }

    #[test]
    fn test_accented_vowels() {
        assert_eq!(sanitize("perché città"), "perche citta");
        assert_eq!(sanitize("Straße über"), "Strasse uber");
        assert_eq!(sanitize("España"), "Espana");
    }

    #[test]
    fn test_latin1_passthrough() {
        // ç and Å are representable and not in the table.
        assert_eq!(sanitize("façade Ålesund"), "façade Ålesund");
    }

    #[test]
    fn test_outside_latin1_folds_to_base_letter() {
        assert_eq!(sanitize("Erdős"), "Erdos");
        assert_eq!(sanitize("Dvořák"), "Dvorak");
    }

    #[test]
    fn test_unrepresentable_replaced() {
        assert_eq!(sanitize("東京"), "??");
        assert_eq!(sanitize("a\u{1F600}b"), "a?b");
    }

    #[test]
    fn test_empty_and_plain() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("plain ascii text"), "plain ascii text");
    }

    #[test]
    fn test_idempotent_on_mixed_input() {
        let input = "\u{201C}Città\u{201D} \u{2014} 5\u{20AC}\u{2026} Łódź 東";
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
    }
}
