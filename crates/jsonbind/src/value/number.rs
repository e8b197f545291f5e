use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;

use super::decimal::Decimal;

/// A JSON number, retaining enough precision to reconstruct the lexical form.
///
/// Integral literals take the narrowest exact representation (`Int`, falling
/// back to `BigInt`); decimal and exponential literals become [`Decimal`].
/// `Float` is produced only by the encode path from native floats; the parser
/// never yields it.
#[derive(Debug, Clone)]
pub enum Number {
    Int(i64),
    BigInt(BigInt),
    Decimal(Decimal),
    Float(f64),
}

impl Number {
    /// Validates a raw number lexeme against the JSON number grammar and
    /// classifies it. Returns `None` for malformed lexemes, and for exponent
    /// magnitudes beyond `i64` (the scale domain of [`Decimal`]).
    pub(crate) fn from_lexeme(lexeme: &str) -> Option<Number> {
        let bytes = lexeme.as_bytes();
        let mut pos = usize::from(bytes.first() == Some(&b'-'));

        let int_start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        let int_digits = &lexeme[int_start..pos];
        if int_digits.is_empty() || (int_digits.len() > 1 && int_digits.starts_with('0')) {
            return None;
        }

        let mut frac = "";
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            let start = pos;
            while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
            frac = &lexeme[start..pos];
            if frac.is_empty() {
                return None;
            }
        }

        let mut exponent = 0i64;
        let mut has_exponent = false;
        if matches!(bytes.get(pos), Some(b'e' | b'E')) {
            has_exponent = true;
            pos += 1;
            let negative = match bytes.get(pos) {
                Some(b'+') => {
                    pos += 1;
                    false
                }
                Some(b'-') => {
                    pos += 1;
                    true
                }
                _ => false,
            };
            let start = pos;
            while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
            let magnitude: i64 = lexeme[start..pos].parse().ok()?;
            exponent = if negative { -magnitude } else { magnitude };
        }

        if pos != bytes.len() {
            return None;
        }

        if frac.is_empty() && !has_exponent {
            return match i64::from_str(lexeme) {
                Ok(value) => Some(Number::Int(value)),
                Err(_) => BigInt::from_str(lexeme).ok().map(Number::BigInt),
            };
        }

        let mut digits = String::with_capacity(lexeme.len());
        if lexeme.starts_with('-') {
            digits.push('-');
        }
        digits.push_str(int_digits);
        digits.push_str(frac);
        let digits = BigInt::from_str(&digits).ok()?;
        Some(Number::Decimal(Decimal::new(
            digits,
            exponent - frac.len() as i64,
        )))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Number::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::BigInt(a), Number::BigInt(b)) => a == b,
            (Number::Decimal(a), Number::Decimal(b)) => a == b,
            // Bit-pattern comparison keeps NaN == NaN, so deep-equality of
            // round-tripped trees holds.
            (Number::Float(a), Number::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Number {}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{value}"),
            Number::BigInt(value) => write!(f, "{value}"),
            Number::Decimal(value) => write!(f, "{value}"),
            Number::Float(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::BigInt(value)
    }
}
