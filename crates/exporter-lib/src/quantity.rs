//! Kubernetes resource quantities
//!
//! Quantities such as `"1500m"`, `"2Gi"` or `"1e3"` are parsed into an integer
//! milli-value so that targets and observed values can be reported as plain
//! floating-point gauges.

use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing a quantity string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("invalid number in quantity {0:?}")]
    InvalidNumber(String),

    #[error("unknown suffix {suffix:?} in quantity {input:?}")]
    UnknownSuffix { input: String, suffix: String },

    #[error("quantity {0:?} does not fit in 128 bits")]
    OutOfRange(String),
}

/// A resource quantity held at milli-unit granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    milli: i64,
}

impl Quantity {
    /// Build a quantity directly from a milli-value
    pub const fn from_milli(milli: i64) -> Self {
        Self { milli }
    }

    /// Integer milli-value (1/1000 units)
    pub const fn milli_value(&self) -> i64 {
        self.milli
    }

    /// Decimal value, `milli / 1000.0`
    pub fn as_f64(&self) -> f64 {
        self.milli as f64 / 1000.0
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(QuantityError::Empty);
        }

        let number_end = input
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '+' || c == '-'))))
            .map(|(i, _)| i)
            .unwrap_or(input.len());
        let (number, suffix) = input.split_at(number_end);

        let parsed = parse_number(number)
            .ok_or_else(|| QuantityError::InvalidNumber(input.to_string()))?;
        let (binary_shift, decimal_exponent) =
            parse_suffix(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
                input: input.to_string(),
                suffix: suffix.to_string(),
            })?;

        let magnitude = scale_to_milli(&parsed, binary_shift, decimal_exponent)
            .ok_or_else(|| QuantityError::OutOfRange(input.to_string()))?;

        let milli = if parsed.negative {
            -(magnitude.min(i64::MAX as i128) as i64)
        } else {
            magnitude.min(i64::MAX as i128) as i64
        };

        Ok(Self { milli })
    }
}

/// Decimal number as `mantissa * 10^-fraction_digits`
#[derive(Debug)]
struct ParsedNumber {
    negative: bool,
    mantissa: i128,
    /// Negative when whole digits past i128 precision were dropped
    fraction_digits: i32,
    /// A nonzero digit was dropped, so the mantissa is below the true value
    inexact: bool,
}

/// Split `[+-]digits[.digits]` into sign, integer mantissa and fraction digit count
///
/// Digits beyond i128 precision are dropped; the scale is kept, so long
/// inputs lose precision instead of failing.
fn parse_number(number: &str) -> Option<ParsedNumber> {
    let (negative, unsigned) = match number.as_bytes().first()? {
        b'-' => (true, &number[1..]),
        b'+' => (false, &number[1..]),
        _ => (false, number),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (unsigned, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') {
        return None;
    }

    let mut parsed = ParsedNumber {
        negative,
        mantissa: 0,
        fraction_digits: 0,
        inexact: false,
    };
    for (i, c) in whole.chars().chain(fraction.chars()).enumerate() {
        let digit = c.to_digit(10)? as i128;
        let in_fraction = i >= whole.len();
        match parsed.mantissa.checked_mul(10).and_then(|m| m.checked_add(digit)) {
            Some(mantissa) => {
                parsed.mantissa = mantissa;
                if in_fraction {
                    parsed.fraction_digits = parsed.fraction_digits.checked_add(1)?;
                }
            }
            None => {
                if !in_fraction {
                    parsed.fraction_digits = parsed.fraction_digits.checked_sub(1)?;
                }
                parsed.inexact |= digit != 0;
            }
        }
    }

    Some(parsed)
}

/// Map a suffix to (power-of-two shift, power-of-ten exponent)
fn parse_suffix(suffix: &str) -> Option<(u32, i32)> {
    let scale = match suffix {
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "" => (0, 0),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            (0, exponent.parse::<i32>().ok()?)
        }
    };
    Some(scale)
}

/// Compute `ceil(mantissa * 2^shift * 10^(exponent + 3 - fraction_digits))`
///
/// Saturates at `i128::MAX`; the caller clamps into `i64`.
fn scale_to_milli(number: &ParsedNumber, binary_shift: u32, decimal_exponent: i32) -> Option<i128> {
    if number.mantissa == 0 {
        return Some(0);
    }

    let numerator = match number.mantissa.checked_mul(1i128 << binary_shift) {
        Some(n) => n,
        None => return Some(i128::MAX),
    };

    let exponent = decimal_exponent
        .checked_add(3)?
        .checked_sub(number.fraction_digits)?;
    if exponent >= 0 {
        let factor = match 10i128.checked_pow(exponent as u32) {
            Some(f) => f,
            None => return Some(i128::MAX),
        };
        Some(numerator.checked_mul(factor).unwrap_or(i128::MAX))
    } else {
        let divisor = match 10i128.checked_pow(exponent.unsigned_abs()) {
            Some(d) => d,
            // divisor exceeds i128::MAX, so the quotient is zero and rounds up to one
            None => return Some(1),
        };
        let quotient = numerator / divisor;
        if numerator % divisor == 0 && !number.inexact {
            Some(quotient)
        } else {
            Some(quotient + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milli(s: &str) -> i64 {
        s.parse::<Quantity>().unwrap().milli_value()
    }

    #[test]
    fn test_parse_plain_and_milli() {
        assert_eq!(milli("1500m"), 1500);
        assert_eq!(milli("1.5"), 1500);
        assert_eq!(milli("2"), 2000);
        assert_eq!(milli("0"), 0);
        assert_eq!(milli("+3"), 3000);
        assert_eq!(milli("-250m"), -250);
    }

    #[test]
    fn test_parse_si_suffixes() {
        assert_eq!(milli("1k"), 1_000_000);
        assert_eq!(milli("2M"), 2_000_000_000);
        assert_eq!(milli("1Ki"), 1_024_000);
        assert_eq!(milli("1Gi"), 1_073_741_824_000);
        assert_eq!(milli("500u"), 1);
        assert_eq!(milli("100n"), 1);
    }

    #[test]
    fn test_parse_exponent_and_exa() {
        assert_eq!(milli("1e3"), 1_000_000);
        assert_eq!(milli("1E-3"), 1);
        assert_eq!(milli("12e-1"), 1200);
        // Bare `E` is the exa suffix, saturating the milli-value
        assert_eq!(milli("10E"), i64::MAX);
    }

    #[test]
    fn test_milli_value_rounds_up() {
        assert_eq!(milli("1.0001"), 1001);
        assert_eq!(milli("0.1m"), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Quantity>(), Err(QuantityError::Empty));
        assert!(matches!(
            "abc".parse::<Quantity>(),
            Err(QuantityError::InvalidNumber(_))
        ));
        assert!(matches!(
            "1.2.3".parse::<Quantity>(),
            Err(QuantityError::InvalidNumber(_))
        ));
        assert!(matches!(
            "5Xi".parse::<Quantity>(),
            Err(QuantityError::UnknownSuffix { .. })
        ));
    }

    #[test]
    fn test_as_f64_uses_float_division() {
        assert_eq!(Quantity::from_milli(1500).as_f64(), 1.5);
        assert_eq!(Quantity::from_milli(1).as_f64(), 0.001);
        assert_eq!(Quantity::from_milli(-500).as_f64(), -0.5);
    }

    #[test]
    fn test_milli_round_trip() {
        for m in [0i64, 1, 7, 999, 1000, 1500, 123_456_789, -42] {
            let q = Quantity::from_milli(m);
            let recovered = (q.as_f64() * 1000.0).round() as i64;
            assert_eq!(recovered, m);
        }
    }

    #[test]
    fn test_long_mantissa_saturates() {
        let nines = "9".repeat(60);
        assert_eq!(milli(&nines), i64::MAX);
        assert_eq!(milli(&format!("-{}", nines)), -i64::MAX);
        assert_eq!(milli(&format!("{}n", nines)), i64::MAX);
    }

    #[test]
    fn test_long_mantissa_keeps_scale() {
        // 10^50 * 10^-50 is exactly one
        assert_eq!(milli(&format!("1{}e-50", "0".repeat(50))), 1000);
        // Trailing digits past i128 precision still round up
        assert_eq!(milli(&format!("1.{}1", "0".repeat(49))), 1001);
        assert_eq!(milli(&format!("0.{}", "3".repeat(60))), 334);
    }
}
