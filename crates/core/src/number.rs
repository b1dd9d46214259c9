//! Numeric values and their kind tags
//!
//! The number repository stores values of eight representations. Each value
//! carries its own [`NumberKind`] so that it can be persisted with a type tag
//! and reconstructed exactly on reload. Readers ask for a *target*
//! representation and receive a converted value:
//!
//! | Source → target | Rule |
//! |-----------------|------|
//! | integer → narrower integer | two's-complement truncation |
//! | float → `i8`/`i16`/`i32` | truncate toward zero, saturate at the `i32` range, then narrow |
//! | float → `i64` | truncate toward zero, saturate |
//! | big integer → fixed integer | low-order bits |
//! | big decimal → fixed integer | drop the fraction, then low-order bits |
//! | any → `f32`/`f64` | nearest representable value |
//! | any → big integer | exact for integers, fraction dropped otherwise |
//! | any → big decimal | exact for integers, floats via their shortest decimal form |
//!
//! Non-finite floats cannot become big integers or big decimals; those
//! conversions fail with [`ConfigError::Conversion`].

use crate::error::{ConfigError, Result};
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// NumberKind
// ============================================================================

/// Tag naming one of the eight numeric representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberKind {
    /// 8-bit signed integer
    #[serde(rename = "i8")]
    I8,
    /// 16-bit signed integer
    #[serde(rename = "i16")]
    I16,
    /// 32-bit signed integer
    #[serde(rename = "i32")]
    I32,
    /// 64-bit signed integer
    #[serde(rename = "i64")]
    I64,
    /// IEEE-754 single precision
    #[serde(rename = "f32")]
    F32,
    /// IEEE-754 double precision
    #[serde(rename = "f64")]
    F64,
    /// Unbounded integer
    #[serde(rename = "bigint")]
    BigInt,
    /// Unbounded decimal
    #[serde(rename = "bigdecimal")]
    BigDecimal,
}

impl NumberKind {
    /// All kinds, narrowest integer first
    pub const ALL: [NumberKind; 8] = [
        NumberKind::I8,
        NumberKind::I16,
        NumberKind::I32,
        NumberKind::I64,
        NumberKind::F32,
        NumberKind::F64,
        NumberKind::BigInt,
        NumberKind::BigDecimal,
    ];

    /// Type tag written to canonical documents
    pub fn tag(&self) -> &'static str {
        match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
            NumberKind::BigInt => "bigint",
            NumberKind::BigDecimal => "bigdecimal",
        }
    }

    /// Alternate spelling accepted when reading documents
    fn alias(&self) -> &'static str {
        match self {
            NumberKind::I8 => "byte",
            NumberKind::I16 => "short",
            NumberKind::I32 => "int",
            NumberKind::I64 => "long",
            NumberKind::F32 => "float",
            NumberKind::F64 => "double",
            NumberKind::BigInt => "biginteger",
            NumberKind::BigDecimal => "bigdecimal",
        }
    }

    /// Resolve a type tag (or its alias, case-insensitively)
    pub fn from_tag(tag: &str) -> Result<NumberKind> {
        NumberKind::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag) || kind.alias().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ConfigError::UnknownNumberKind(tag.to_string()))
    }

    /// True for the two floating-point kinds
    pub fn is_float(&self) -> bool {
        matches!(self, NumberKind::F32 | NumberKind::F64)
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for NumberKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        NumberKind::from_tag(s)
    }
}

// ============================================================================
// Number
// ============================================================================

/// A numeric value in one of the eight supported representations
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    /// 8-bit signed integer
    I8(i8),
    /// 16-bit signed integer
    I16(i16),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// Single precision float
    F32(f32),
    /// Double precision float
    F64(f64),
    /// Unbounded integer
    BigInt(BigInt),
    /// Unbounded decimal
    BigDecimal(BigDecimal),
}

impl Number {
    /// The representation this value is stored in
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::I8(_) => NumberKind::I8,
            Number::I16(_) => NumberKind::I16,
            Number::I32(_) => NumberKind::I32,
            Number::I64(_) => NumberKind::I64,
            Number::F32(_) => NumberKind::F32,
            Number::F64(_) => NumberKind::F64,
            Number::BigInt(_) => NumberKind::BigInt,
            Number::BigDecimal(_) => NumberKind::BigDecimal,
        }
    }

    /// Parse the textual form of a value of the given kind
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if `text` is not a valid literal
    /// for `kind`.
    pub fn parse(text: &str, kind: NumberKind) -> Result<Number> {
        fn bad(text: &str, kind: NumberKind, err: impl fmt::Display) -> ConfigError {
            ConfigError::malformed(format!("\"{}\" is not a valid {}: {}", text, kind, err))
        }

        let number = match kind {
            NumberKind::I8 => Number::I8(text.parse().map_err(|e| bad(text, kind, e))?),
            NumberKind::I16 => Number::I16(text.parse().map_err(|e| bad(text, kind, e))?),
            NumberKind::I32 => Number::I32(text.parse().map_err(|e| bad(text, kind, e))?),
            NumberKind::I64 => Number::I64(text.parse().map_err(|e| bad(text, kind, e))?),
            NumberKind::F32 => Number::F32(text.parse().map_err(|e| bad(text, kind, e))?),
            NumberKind::F64 => Number::F64(text.parse().map_err(|e| bad(text, kind, e))?),
            NumberKind::BigInt => {
                Number::BigInt(BigInt::from_str(text).map_err(|e| bad(text, kind, e))?)
            }
            NumberKind::BigDecimal => {
                Number::BigDecimal(BigDecimal::from_str(text).map_err(|e| bad(text, kind, e))?)
            }
        };
        Ok(number)
    }

    /// Textual form written to canonical documents
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Convert to `i8`
    pub fn to_i8(&self) -> i8 {
        match self {
            Number::I8(v) => *v,
            Number::F32(v) => (*v as i32) as i8,
            Number::F64(v) => (*v as i32) as i8,
            _ => self.to_i64() as i8,
        }
    }

    /// Convert to `i16`
    pub fn to_i16(&self) -> i16 {
        match self {
            Number::I8(v) => i16::from(*v),
            Number::I16(v) => *v,
            Number::F32(v) => (*v as i32) as i16,
            Number::F64(v) => (*v as i32) as i16,
            _ => self.to_i64() as i16,
        }
    }

    /// Convert to `i32`
    pub fn to_i32(&self) -> i32 {
        match self {
            Number::I8(v) => i32::from(*v),
            Number::I16(v) => i32::from(*v),
            Number::I32(v) => *v,
            Number::F32(v) => *v as i32,
            Number::F64(v) => *v as i32,
            _ => self.to_i64() as i32,
        }
    }

    /// Convert to `i64`
    pub fn to_i64(&self) -> i64 {
        match self {
            Number::I8(v) => i64::from(*v),
            Number::I16(v) => i64::from(*v),
            Number::I32(v) => i64::from(*v),
            Number::I64(v) => *v,
            Number::F32(v) => *v as i64,
            Number::F64(v) => *v as i64,
            Number::BigInt(v) => low_bits(v),
            Number::BigDecimal(v) => truncated_low_bits(v),
        }
    }

    /// Convert to `f32`
    pub fn to_f32(&self) -> f32 {
        match self {
            Number::F32(v) => *v,
            Number::F64(v) => *v as f32,
            Number::BigInt(v) => v.to_f32().unwrap_or(f32::NAN),
            Number::BigDecimal(v) => v.to_f32().unwrap_or(f32::NAN),
            _ => self.to_i64() as f32,
        }
    }

    /// Convert to `f64`
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::F32(v) => f64::from(*v),
            Number::F64(v) => *v,
            Number::BigInt(v) => v.to_f64().unwrap_or(f64::NAN),
            Number::BigDecimal(v) => v.to_f64().unwrap_or(f64::NAN),
            _ => self.to_i64() as f64,
        }
    }

    /// Convert to an unbounded integer
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Conversion`] for NaN and infinities.
    pub fn to_big_int(&self) -> Result<BigInt> {
        match self {
            Number::BigInt(v) => Ok(v.clone()),
            Number::BigDecimal(v) => Ok(truncate(v)),
            Number::F32(v) => float_to_big_int(f64::from(*v)),
            Number::F64(v) => float_to_big_int(*v),
            _ => Ok(BigInt::from(self.to_i64())),
        }
    }

    /// Convert to an unbounded decimal
    ///
    /// Floats convert through their shortest decimal representation, not
    /// their binary expansion: `3.14f64` becomes exactly `3.14`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Conversion`] for NaN and infinities.
    pub fn to_big_decimal(&self) -> Result<BigDecimal> {
        match self {
            Number::BigDecimal(v) => Ok(v.clone()),
            Number::BigInt(v) => Ok(BigDecimal::new(v.clone(), 0)),
            Number::F32(v) => float_to_big_decimal(v.is_finite(), &v.to_string()),
            Number::F64(v) => float_to_big_decimal(v.is_finite(), &v.to_string()),
            _ => Ok(BigDecimal::new(BigInt::from(self.to_i64()), 0)),
        }
    }
}

/// Low 64 bits of a big integer in two's complement
fn low_bits(value: &BigInt) -> i64 {
    let bytes = value.to_signed_bytes_le();
    let fill = if value.sign() == Sign::Minus { 0xFF } else { 0x00 };
    let mut buf = [fill; 8];
    for (slot, byte) in buf.iter_mut().zip(bytes.iter()) {
        *slot = *byte;
    }
    i64::from_le_bytes(buf)
}

/// Integer part of a decimal, rounding toward zero
fn truncate(value: &BigDecimal) -> BigInt {
    if fraction_only(value) {
        return BigInt::from(0);
    }
    let (digits, _) = value.with_scale(0).as_bigint_and_exponent();
    digits
}

/// Low 64 bits of a decimal's integer part
///
/// Never materializes `10^k` for large exponents: with `k >= 64` the
/// product `m * 10^k` is a multiple of `2^64`.
fn truncated_low_bits(value: &BigDecimal) -> i64 {
    let (_, scale) = value.as_bigint_and_exponent();
    if scale <= -64 || fraction_only(value) {
        return 0;
    }
    low_bits(&truncate(value))
}

/// True if every significant digit sits right of the decimal point
fn fraction_only(value: &BigDecimal) -> bool {
    let (_, scale) = value.as_bigint_and_exponent();
    scale > 0 && scale as u64 > value.digits()
}

fn float_to_big_int(value: f64) -> Result<BigInt> {
    BigInt::from_f64(value).ok_or_else(|| {
        ConfigError::Conversion(format!("{} has no integer representation", value))
    })
}

fn float_to_big_decimal(finite: bool, text: &str) -> Result<BigDecimal> {
    if !finite {
        return Err(ConfigError::Conversion(format!(
            "{} has no decimal representation",
            text
        )));
    }
    BigDecimal::from_str(text).map_err(|e| ConfigError::Conversion(e.to_string()))
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I8(v) => write!(f, "{}", v),
            Number::I16(v) => write!(f, "{}", v),
            Number::I32(v) => write!(f, "{}", v),
            Number::I64(v) => write!(f, "{}", v),
            Number::F32(v) => write!(f, "{}", v),
            Number::F64(v) => write!(f, "{}", v),
            Number::BigInt(v) => write!(f, "{}", v),
            Number::BigDecimal(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from_number {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::$variant(value)
                }
            }
        )*
    };
}

impl_from_number! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    BigInt => BigInt,
    BigDecimal => BigDecimal,
}

// ============================================================================
// Typed reads
// ============================================================================

/// Types a stored [`Number`] can be read as
///
/// Implemented for every numeric representation so that generic readers
/// such as `get_number_as::<i32>(key)` select the target by type.
pub trait FromNumber: Sized {
    /// Convert a stored number to this representation
    fn from_number(number: &Number) -> Result<Self>;
}

macro_rules! impl_from_number_infallible {
    ($($ty:ty => $method:ident),* $(,)?) => {
        $(
            impl FromNumber for $ty {
                fn from_number(number: &Number) -> Result<Self> {
                    Ok(number.$method())
                }
            }
        )*
    };
}

impl_from_number_infallible! {
    i8 => to_i8,
    i16 => to_i16,
    i32 => to_i32,
    i64 => to_i64,
    f32 => to_f32,
    f64 => to_f64,
}

impl FromNumber for BigInt {
    fn from_number(number: &Number) -> Result<Self> {
        number.to_big_int()
    }
}

impl FromNumber for BigDecimal {
    fn from_number(number: &Number) -> Result<Self> {
        number.to_big_decimal()
    }
}

impl FromNumber for Number {
    fn from_number(number: &Number) -> Result<Self> {
        Ok(number.clone())
    }
}
