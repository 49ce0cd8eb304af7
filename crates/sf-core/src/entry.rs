//! Parsing of free-form outcome entry.
//!
//! Players paste the last round results as digits, in whatever shape their
//! clipboard produced: `1 2 3`, `1,2,3`, `123`, or with emoji between them.
//! Only ASCII decimal digits matter; everything else is ignored.

use sf_common::{Error, Result};

/// Fewest digits that count as a batch entry.
pub const MIN_BATCH_DIGITS: usize = 2;

/// Every ASCII digit in `text`, in order, as raw values `0..=9`.
///
/// `8` and `9` are kept so the caller sees the length the player typed;
/// the engine skips them as out-of-range symbols.
pub fn extract_digits(text: &str) -> Vec<i64> {
    text.chars()
        .filter_map(|c| c.to_digit(10))
        .map(i64::from)
        .collect()
}

/// Interpret `text` as a batch of exactly `expected` outcomes.
///
/// Returns `Ok(None)` when the text holds fewer than two digits (not a batch
/// attempt at all), and `MalformedBatchInput` when the digit count is wrong.
pub fn parse_batch(text: &str, expected: usize) -> Result<Option<Vec<i64>>> {
    let digits = extract_digits(text);
    if digits.len() < MIN_BATCH_DIGITS {
        return Ok(None);
    }
    if digits.len() != expected {
        return Err(Error::MalformedBatchInput {
            expected,
            found: digits.len(),
        });
    }
    Ok(Some(digits))
}
