// src/plate_text.rs
//
// Reduction of raw OCR character streams to a validated Indian registration
// identifier: strip, remap visually-confusable characters by position, then
// validate against the plate grammar.
//
// Grammar: two letters (state), 1-2 digits (district), 1-2 letters (series),
// exactly four digits (registration number), e.g. MH12AB3456.
//
// The letter/digit boundary in the middle of the plate is ambiguous from
// length alone, so correction is positional-approximate rather than parsed:
// digit remapping is pinned to offsets 2-3 and the last four characters.
// A stream the substitution table cannot resolve is dropped, never guessed at.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

const MIN_PLATE_LEN: usize = 6;

fn plate_pattern() -> &'static Regex {
    static PLATE_RE: OnceLock<Regex> = OnceLock::new();
    PLATE_RE.get_or_init(|| {
        Regex::new(r"[A-Z]{2}[0-9]{1,2}[A-Z]{1,2}[0-9]{4}").expect("plate pattern is valid")
    })
}

/// Digits an OCR pass mistakes for letters, at letter-expected positions.
fn digit_to_letter(c: char) -> char {
    match c {
        '0' => 'O',
        '1' => 'I',
        '2' => 'Z',
        '5' => 'S',
        '8' => 'B',
        _ => c,
    }
}

/// Letters an OCR pass mistakes for digits, at digit-expected positions.
fn letter_to_digit(c: char) -> char {
    match c {
        'O' | 'Q' | 'D' => '0',
        'I' | 'L' => '1',
        'H' => '4',
        'S' => '5',
        'B' => '8',
        _ => c,
    }
}

/// Concatenate multi-line OCR segments into one candidate stream.
pub fn concat_segments(segments: &[String]) -> String {
    segments.concat()
}

/// Normalize a raw OCR stream to a validated plate identifier.
///
/// Returns the matched plate substring, or `None` when the stream is too
/// short or does not resolve to a grammar-conformant string. Already-valid
/// input passes through unchanged.
pub fn normalize(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();

    if cleaned.len() < MIN_PLATE_LEN {
        return None;
    }

    let n = cleaned.len();
    let corrected: String = cleaned
        .char_indices()
        .map(|(i, c)| {
            if i < 2 {
                // State code
                digit_to_letter(c)
            } else if i == 2 || i == 3 || i >= n - 4 {
                // District code and registration number
                letter_to_digit(c)
            } else {
                // Series code
                digit_to_letter(c)
            }
        })
        .collect();

    match plate_pattern().find(&corrected) {
        Some(m) => Some(m.as_str().to_string()),
        None => {
            debug!("plate text rejected after correction: {:?}", corrected);
            None
        }
    }
}

/// Normalize OCR output delivered as separate text segments.
pub fn normalize_segments(segments: &[String]) -> Option<String> {
    if segments.is_empty() {
        return None;
    }
    normalize(&concat_segments(segments))
}
