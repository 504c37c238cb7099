use alloc::{format, string::ToString};
use core::{fmt, str::FromStr};

use super::Slice;
use crate::{
    Error, Result, ValueType,
    error::NumberRepr,
    format::{self, read_int, read_uint},
};

const NUMERIC: &[ValueType] = &[
    ValueType::Int,
    ValueType::UInt,
    ValueType::SmallInt,
    ValueType::Double,
];

const INTEGER_OR_STRING: &[ValueType] = &[
    ValueType::String,
    ValueType::Int,
    ValueType::UInt,
    ValueType::SmallInt,
];

enum Number {
    Int(i64),
    UInt(u64),
    Double(f64),
}

fn out_of_range(value: NumberRepr, target: &'static str) -> Error {
    Error::NumberOutOfRange { value, target }
}

fn small_int(head: u8) -> i64 {
    if head < format::SMALL_INT_MINUS_SIX {
        i64::from(head - format::SMALL_INT_ZERO)
    } else {
        // 0x3a..=0x3f encode -6..=-1
        i64::from(head) - 0x40
    }
}

impl Slice<'_> {
    fn number(&self) -> Result<Number> {
        let head = self.head();
        let (buffer, at) = (self.buffer(), self.start() + 1);
        match self.value_type() {
            ValueType::SmallInt => Ok(Number::Int(small_int(head))),
            ValueType::Int => Ok(Number::Int(read_int(
                buffer,
                at,
                usize::from(head - format::INT_BASE),
            )?)),
            ValueType::UInt => Ok(Number::UInt(read_uint(
                buffer,
                at,
                usize::from(head - format::UINT_BASE),
            )?)),
            ValueType::Double => Ok(Number::Double(f64::from_bits(read_uint(buffer, at, 8)?))),
            actual => Err(Error::mismatch(NUMERIC, actual)),
        }
    }

    /// The value as `i64`. Doubles are truncated towards zero (saturating).
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Result<i64> {
        match self.number()? {
            Number::Int(v) => Ok(v),
            Number::UInt(v) => {
                i64::try_from(v).map_err(|_| out_of_range(NumberRepr::Int(v.into()), "i64"))
            }
            Number::Double(v) => Ok(v as i64),
        }
    }

    pub fn as_i32(&self) -> Result<i32> {
        let v = self.as_i64()?;
        i32::try_from(v).map_err(|_| out_of_range(NumberRepr::Int(v.into()), "i32"))
    }

    /// The value as `u64`. Negative integers are rejected, doubles are
    /// truncated towards zero (saturating).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_u64(&self) -> Result<u64> {
        match self.number()? {
            Number::Int(v) => {
                u64::try_from(v).map_err(|_| out_of_range(NumberRepr::Int(v.into()), "u64"))
            }
            Number::UInt(v) => Ok(v),
            Number::Double(v) => Ok(v as u64),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Result<f64> {
        match self.number()? {
            Number::Int(v) => Ok(v as f64),
            Number::UInt(v) => Ok(v as f64),
            Number::Double(v) => Ok(v),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn as_f32(&self) -> Result<f32> {
        self.as_f64().map(|v| v as f32)
    }

    /// Integer value as `i128`. Also accepts strings holding a decimal integer,
    /// which is how values wider than 64 bits are usually stored.
    ///
    /// Strings are bounded by `i128`: anything outside
    /// `i128::MIN..=i128::MAX` (roughly 39 digits) is reported as
    /// [`Error::NotANumber`].
    pub fn as_big_integer(&self) -> Result<i128> {
        match self.value_type() {
            ValueType::String => {
                let text = self.as_str()?;
                text.parse::<i128>()
                    .map_err(|_| Error::NotANumber(text.to_string()))
            }
            actual => match self.number() {
                Ok(Number::Int(v)) => Ok(v.into()),
                Ok(Number::UInt(v)) => Ok(v.into()),
                Ok(Number::Double(_)) | Err(Error::ValueTypeMismatch { .. }) => {
                    Err(Error::mismatch(INTEGER_OR_STRING, actual))
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Exact decimal value of a number, or of a string holding one.
    ///
    /// The mantissa is an `i128`, so strings with more significant digits
    /// than it can hold are reported as [`Error::NotANumber`].
    pub fn as_big_decimal(&self) -> Result<Decimal> {
        match self.value_type() {
            ValueType::String => {
                let text = self.as_str()?;
                text.parse()
                    .map_err(|()| Error::NotANumber(text.to_string()))
            }
            ValueType::Double => Decimal::from_f64(self.as_f64()?),
            ValueType::SmallInt | ValueType::Int | ValueType::UInt => {
                Ok(Decimal::new(self.as_big_integer()?, 0))
            }
            actual => Err(Error::mismatch(
                &[
                    ValueType::String,
                    ValueType::Double,
                    ValueType::Int,
                    ValueType::UInt,
                    ValueType::SmallInt,
                ],
                actual,
            )),
        }
    }
}

/// An exact decimal number: `mantissa × 10^-scale`.
///
/// Equality is structural, so `1.5` and `1.50` differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    #[must_use]
    pub const fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    #[must_use]
    pub const fn mantissa(&self) -> i128 {
        self.mantissa
    }

    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    fn from_f64(v: f64) -> Result<Self> {
        if !v.is_finite() {
            return Err(out_of_range(NumberRepr::Double(v), "decimal"));
        }
        // shortest round-tripping representation, in scientific notation
        format!("{v:e}")
            .parse()
            .map_err(|()| out_of_range(NumberRepr::Double(v), "decimal"))
    }
}

impl FromStr for Decimal {
    type Err = ();

    fn from_str(s: &str) -> core::result::Result<Self, ()> {
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (digits, exp) = match rest.find(['e', 'E']) {
            Some(i) => (&rest[..i], rest[i + 1..].parse::<i32>().map_err(|_| ())?),
            None => (rest, 0),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(());
        }
        let mut mantissa: i128 = 0;
        for c in int_part.bytes().chain(frac_part.bytes()) {
            if !c.is_ascii_digit() {
                return Err(());
            }
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(c - b'0')))
                .ok_or(())?;
        }
        let mut scale = i64::try_from(frac_part.len()).map_err(|_| ())? - i64::from(exp);
        if scale < 0 {
            let shift = u32::try_from(-scale).map_err(|_| ())?;
            mantissa = 10i128
                .checked_pow(shift)
                .and_then(|p| mantissa.checked_mul(p))
                .ok_or(())?;
            scale = 0;
        }
        Ok(Self {
            mantissa: if negative { -mantissa } else { mantissa },
            scale: u32::try_from(scale).map_err(|_| ())?,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        if self.mantissa < 0 {
            f.write_str("-")?;
        }
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{int_part}.{frac_part}")
        } else {
            f.write_str("0.")?;
            for _ in digits.len()..scale {
                f.write_str("0")?;
            }
            f.write_str(&digits)
        }
    }
}
