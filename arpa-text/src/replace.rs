//! Substitution of words in text with their pronunciations.
//!
//! Words are replaced one at a time, in token order. Each replacement targets
//! the first occurrence of the word which is not already inside a
//! brace-escaped region, so words that have been replaced (or were escaped
//! in the input) are never touched again.

use std::ops::Range;

use unicode_categories::UnicodeCategories;

/// Return true if `ch` is part of a word for the purposes of boundary checks.
///
/// This must agree with the letter and number classes of
/// [`WORD_REGEX`](crate::tokenizer::WORD_REGEX), so that every word token
/// can be found again in the text it came from.
fn is_word_char(ch: char) -> bool {
    ch.is_letter() || ch.is_number()
}

/// Return true if `ch` joins two word characters into one token, as in
/// "cat's" or "well-known".
fn is_joiner(ch: char) -> bool {
    ch == '\'' || ch == '-'
}

/// Return true if the match at `range` starts and ends on token boundaries.
fn on_boundaries(text: &str, range: &Range<usize>) -> bool {
    let mut before = text[..range.start].chars().rev();
    let start_ok = match (before.next(), before.next()) {
        (Some(ch), _) if is_word_char(ch) => false,
        (Some(ch), Some(prev)) if is_joiner(ch) && is_word_char(prev) => false,
        _ => true,
    };

    let mut after = text[range.end..].chars();
    let end_ok = match (after.next(), after.next()) {
        (Some(ch), _) if is_word_char(ch) => false,
        (Some(ch), Some(next)) if is_joiner(ch) && is_word_char(next) => false,
        _ => true,
    };

    start_ok && end_ok
}

/// Return the byte ranges of brace-escaped regions in `text`, including the
/// braces themselves.
///
/// An unterminated region extends to the end of the text.
fn braced_regions(text: &str) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut open = None;
    for (pos, ch) in text.char_indices() {
        match ch {
            '{' if open.is_none() => open = Some(pos),
            '}' => {
                if let Some(start) = open.take() {
                    regions.push(start..pos + 1);
                }
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        regions.push(start..text.len());
    }
    regions
}

/// Find the first occurrence of `target` in `text` which lies on token
/// boundaries and outside of any braced region.
///
/// Matching is case-sensitive.
pub fn find_first(text: &str, target: &str) -> Option<Range<usize>> {
    if target.is_empty() {
        return None;
    }
    let regions = braced_regions(text);
    text.match_indices(target)
        .map(|(start, matched)| start..start + matched.len())
        .filter(|range| {
            !regions
                .iter()
                .any(|region| range.start < region.end && region.start < range.end)
        })
        .find(|range| on_boundaries(text, range))
}

/// Replace the first unescaped occurrence of `target` in `text` with
/// `replacement`.
///
/// Returns `None` if there is no such occurrence.
pub fn replace_first(text: &str, target: &str, replacement: &str) -> Option<String> {
    let range = find_first(text, target)?;
    let mut output = String::with_capacity(text.len() + replacement.len());
    output.push_str(&text[..range.start]);
    output.push_str(replacement);
    output.push_str(&text[range.end..]);
    Some(output)
}

/// Remove the first unescaped occurrence of `target` from `text`, together
/// with one adjacent space so that no double spaces are left behind.
///
/// Returns `None` if there is no such occurrence.
pub fn remove_first(text: &str, target: &str) -> Option<String> {
    let mut range = find_first(text, target)?;
    if text[range.end..].starts_with(' ') {
        range.end += 1;
    } else if text[..range.start].ends_with(' ') {
        range.start -= 1;
    }
    let mut output = String::with_capacity(text.len());
    output.push_str(&text[..range.start]);
    output.push_str(&text[range.end..]);
    Some(output)
}
