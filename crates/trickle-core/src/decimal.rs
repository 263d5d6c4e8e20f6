//! Arbitrary-precision fixed-point decimal.
//!
//! A [`Dec`] is a signed big integer mantissa with an implicit scale of
//! `10^18`. Addition and subtraction are exact; multiplication and division
//! round half-to-even at the 18th fractional digit. Conversions to whole
//! token units either round half-to-even ([`Dec::round_to_u128`]) or
//! truncate ([`Dec::truncate_to_u128`]).
//!
//! The canonical text form always carries all 18 fractional digits
//! (`"7.220000000000000000"`), and that text is what gets encoded, so two
//! equal values always produce identical bytes.

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{DEC_PLACES, DEC_SCALE};
use crate::error::DecimalError;

/// Signed fixed-point decimal with 18 fractional digits and no upper bound.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(BigInt);

fn scale() -> BigInt {
    BigInt::from(DEC_SCALE)
}

/// `n / d` rounded half-to-even. `d` must be non-zero.
fn div_round_half_even(n: &BigInt, d: &BigInt) -> BigInt {
    let (n, d) = if d.is_negative() { (-n, -d) } else { (n.clone(), d.clone()) };
    let quotient = &n / &d;
    let remainder = &n % &d;
    if remainder.is_zero() {
        return quotient;
    }

    let twice = remainder.abs() * BigInt::from(2);
    let round_away = match twice.cmp(&d) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => !(&quotient % BigInt::from(2)).is_zero(),
    };
    if !round_away {
        quotient
    } else if n.is_negative() {
        quotient - 1
    } else {
        quotient + 1
    }
}

impl Dec {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn one() -> Self {
        Self(scale())
    }

    /// Whole number `value` as a decimal.
    pub fn from_int(value: impl Into<BigInt>) -> Self {
        Self(value.into() * scale())
    }

    /// Raw mantissa, i.e. the value multiplied by `10^18`.
    pub fn mantissa(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// `self * other`, rounded half-to-even at 18 places.
    pub fn mul_dec(&self, other: &Dec) -> Dec {
        Self(div_round_half_even(&(&self.0 * &other.0), &scale()))
    }

    /// `self / other`, rounded half-to-even at 18 places.
    ///
    /// # Errors
    ///
    /// - [`DecimalError::OutOfRange`] when `other` is zero
    pub fn quo_dec(&self, other: &Dec) -> Result<Dec, DecimalError> {
        if other.is_zero() {
            return Err(DecimalError::OutOfRange(format!("{self} / 0")));
        }
        Ok(Self(div_round_half_even(&(&self.0 * scale()), &other.0)))
    }

    /// `self * value`, exact.
    pub fn mul_int(&self, value: u128) -> Dec {
        Self(&self.0 * BigInt::from(value))
    }

    /// Nearest whole number, ties to even.
    pub fn round_to_int(&self) -> BigInt {
        div_round_half_even(&self.0, &scale())
    }

    /// Whole part, discarding the fraction (toward zero).
    pub fn truncate_to_int(&self) -> BigInt {
        &self.0 / scale()
    }

    /// [`round_to_int`](Self::round_to_int) as a token amount.
    ///
    /// # Errors
    ///
    /// - [`DecimalError::OutOfRange`] if the result is negative or exceeds `u128`
    pub fn round_to_u128(&self) -> Result<u128, DecimalError> {
        self.round_to_int()
            .to_u128()
            .ok_or_else(|| DecimalError::OutOfRange(self.to_string()))
    }

    /// [`truncate_to_int`](Self::truncate_to_int) as a token amount.
    ///
    /// # Errors
    ///
    /// - [`DecimalError::OutOfRange`] if the result is negative or exceeds `u128`
    pub fn truncate_to_u128(&self) -> Result<u128, DecimalError> {
        self.truncate_to_int()
            .to_u128()
            .ok_or_else(|| DecimalError::OutOfRange(self.to_string()))
    }
}

impl From<u128> for Dec {
    fn from(value: u128) -> Self {
        Self::from_int(value)
    }
}

impl From<u64> for Dec {
    fn from(value: u64) -> Self {
        Self::from_int(value)
    }
}

impl Add for Dec {
    type Output = Dec;

    fn add(self, rhs: Dec) -> Dec {
        Dec(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Dec> for &'a Dec {
    type Output = Dec;

    fn add(self, rhs: &'a Dec) -> Dec {
        Dec(&self.0 + &rhs.0)
    }
}

impl Sub for Dec {
    type Output = Dec;

    fn sub(self, rhs: Dec) -> Dec {
        Dec(self.0 - rhs.0)
    }
}

impl<'a> Sub<&'a Dec> for &'a Dec {
    type Output = Dec;

    fn sub(self, rhs: &'a Dec) -> Dec {
        Dec(&self.0 - &rhs.0)
    }
}

impl Neg for Dec {
    type Output = Dec;

    fn neg(self) -> Dec {
        Dec(-self.0)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.abs();
        let whole = &abs / scale();
        let frac = (&abs % scale()).to_string();
        let sign = if self.0.is_negative() { "-" } else { "" };
        let pad = "0".repeat(DEC_PLACES - frac.len());
        write!(f, "{sign}{whole}.{pad}{frac}")
    }
}

impl FromStr for Dec {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DecimalError::Empty);
        }
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = match body.split_once('.') {
            Some((_, "")) => return Err(DecimalError::Invalid(s.to_string())),
            Some((whole, frac)) => (whole, frac),
            None => (body, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(DecimalError::Invalid(s.to_string()));
        }
        if frac.len() > DEC_PLACES {
            return Err(DecimalError::TooPrecise(frac.len()));
        }

        let digits = format!("{whole}{frac:0<width$}", width = DEC_PLACES);
        let mantissa = BigInt::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| DecimalError::Invalid(s.to_string()))?;
        Ok(Self(if negative { -mantissa } else { mantissa }))
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl bincode::Encode for Dec {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        bincode::Encode::encode(&self.to_string(), encoder)
    }
}

impl<Context> bincode::Decode<Context> for Dec {
    fn decode<D: bincode::de::Decoder<Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        let text: String = bincode::Decode::decode(decoder)?;
        text.parse()
            .map_err(|e: DecimalError| bincode::error::DecodeError::OtherString(e.to_string()))
    }
}

bincode::impl_borrow_decode!(Dec);
