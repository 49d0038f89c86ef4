//! Normalisation, formatting and check-digit validation.

use crate::{CpfError, CpfResult, CPF_LEN};

/// Removes every character that is not an ASCII decimal digit.
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Applies the `DDD.DDD.DDD-DD` mask to however many digits `input` contains.
///
/// - 0–3 digits: as-is
/// - 4–6 digits: `DDD.DDD`
/// - 7–9 digits: `DDD.DDD.DDD`
/// - 10–11 digits: `DDD.DDD.DDD-DD`
///
/// Non-digits are dropped first and digits past the 11th are ignored, so formatting an
/// already-formatted value returns it unchanged.
pub fn format(input: &str) -> String {
    let digits: String = normalize(input).chars().take(CPF_LEN).collect();
    let len = digits.len();

    match len {
        0..=3 => digits,
        4..=6 => format!("{}.{}", &digits[..3], &digits[3..]),
        7..=9 => format!("{}.{}.{}", &digits[..3], &digits[3..6], &digits[6..]),
        _ => format!(
            "{}.{}.{}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..9],
            &digits[9..]
        ),
    }
}

/// Returns true if `input` normalises to a structurally valid CPF.
///
/// Registration status is not checked; this is purely the check-digit algorithm.
pub fn is_valid(input: &str) -> bool {
    inspect(input).is_ok()
}

/// Form-level validation.
///
/// Empty input (or input with no digits at all) passes: presence is a required-field concern
/// and is checked separately. Anything else must be a valid CPF, otherwise
/// [`CpfError::Invalid`] is returned carrying the raw value for display.
pub fn validate(input: &str) -> CpfResult<()> {
    if input.is_empty() || normalize(input).is_empty() {
        return Ok(());
    }

    if is_valid(input) {
        Ok(())
    } else {
        Err(CpfError::Invalid {
            value: input.to_string(),
        })
    }
}

/// Computes the two check digits for the first nine digits of `input`.
///
/// Returns `None` when `input` contains fewer than nine digits. Digits past the ninth are
/// ignored, so this can be applied to a complete CPF to see what its check digits should be.
pub fn check_digits(input: &str) -> Option<(u8, u8)> {
    let digits = digit_values(&normalize(input));
    if digits.len() < 9 {
        return None;
    }

    let first = check_digit(&digits[..9]);
    let mut with_first = digits[..9].to_vec();
    with_first.push(first);
    let second = check_digit(&with_first);

    Some((first, second))
}

/// Full structural check, reporting which rule failed.
///
/// Errors carry the raw `input`, not the normalised digits.
pub(crate) fn inspect(input: &str) -> CpfResult<String> {
    let normalized = normalize(input);
    let digits = digit_values(&normalized);

    if digits.len() != CPF_LEN {
        return Err(CpfError::WrongLength {
            value: input.to_string(),
            digits: digits.len(),
        });
    }

    if digits.iter().all(|d| *d == digits[0]) {
        return Err(CpfError::RepeatedDigits {
            value: input.to_string(),
        });
    }

    if check_digit(&digits[..9]) != digits[9] || check_digit(&digits[..10]) != digits[10] {
        return Err(CpfError::ChecksumMismatch {
            value: input.to_string(),
        });
    }

    Ok(normalized)
}

/// Weighted-sum modulo-11 check digit.
///
/// Weights run from `digits.len() + 1` down to 2. A remainder of 10 (or 11) maps to 0.
fn check_digit(digits: &[u8]) -> u8 {
    let top_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * (top_weight - i as u32))
        .sum();

    match (sum * 10) % 11 {
        10 | 11 => 0,
        r => r as u8,
    }
}

fn digit_values(normalized: &str) -> Vec<u8> {
    normalized.bytes().map(|b| b - b'0').collect()
}
