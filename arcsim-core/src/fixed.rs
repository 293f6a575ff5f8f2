//! Fixed-point arithmetic for deterministic simulation.
//!
//! Every economic quantity in a tick (stock, price, income, attribute points,
//! efficiency multipliers) uses this type so that a replayed cycle produces
//! bit-identical ledgers. Floats only appear at the JSON boundary.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// Fixed-point value with scale 10000.
///
/// Represents decimal values as integers: 0.25 → 2500, 1.0 → 10000.
/// Uses i64 so that state-wide aggregates do not overflow.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(pub i64);

/// Error returned when a decimal string cannot be read as [`Fixed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal value: {0:?}")]
pub struct FixedParseError(pub String);

impl Fixed {
    /// Scale factor: 10000 = 1.0
    pub const SCALE: i64 = 10000;

    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(10000);
    pub const HALF: Fixed = Fixed(5000);

    /// Create from raw scaled value
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    /// Create from integer (e.g., 5 → 50_000)
    #[inline]
    pub const fn from_int(v: i64) -> Self {
        Fixed(v * Self::SCALE)
    }

    /// Like [`Fixed::from_int`], but out-of-range values saturate instead of
    /// overflowing.
    #[inline]
    pub const fn saturating_from_int(v: i64) -> Self {
        Fixed(v.saturating_mul(Self::SCALE))
    }

    /// Convert from f64 (parse layer only, not in sim logic).
    ///
    /// Uses `.round()` for cross-platform determinism. NaN/Inf map to zero,
    /// out-of-range values saturate.
    pub fn from_f64(v: f64) -> Self {
        if !v.is_finite() {
            return Fixed::ZERO;
        }
        let scaled = v * Self::SCALE as f64;
        if scaled >= i64::MAX as f64 {
            return Fixed(i64::MAX);
        }
        if scaled <= i64::MIN as f64 {
            return Fixed(i64::MIN);
        }
        Fixed(scaled.round() as i64)
    }

    /// Convert to f64 (display and serialization only)
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Raw integer value
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Truncate to integer (rounds toward zero)
    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 / Self::SCALE
    }

    /// Round toward negative infinity.
    #[inline]
    pub const fn floor(self) -> i64 {
        self.0.div_euclid(Self::SCALE)
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        self.0 % Self::SCALE == 0
    }

    #[inline]
    pub fn min(self, other: Fixed) -> Fixed {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    #[inline]
    pub fn max(self, other: Fixed) -> Fixed {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    #[inline]
    pub fn clamp(self, lo: Fixed, hi: Fixed) -> Fixed {
        self.max(lo).min(hi)
    }

    /// Saturating add (clamps at i64::MAX/MIN)
    #[inline]
    pub fn saturating_add(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(other.0))
    }

    /// Saturating subtract
    #[inline]
    pub fn saturating_sub(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(other.0))
    }

    /// Multiply two fixed-point values: (a × b) / SCALE
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: Fixed) -> Fixed {
        self * other
    }

    /// Divide two fixed-point values: (a × SCALE) / b
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, other: Fixed) -> Fixed {
        self / other
    }

    /// Multiply by a head count or land area.
    #[inline]
    pub fn mul_int(self, n: i64) -> Fixed {
        Fixed(self.0.saturating_mul(n))
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, other: Fixed) -> Fixed {
        Fixed(self.0 + other.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, other: Fixed) {
        self.0 += other.0;
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, other: Fixed) -> Fixed {
        Fixed(self.0 - other.0)
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, other: Fixed) {
        self.0 -= other.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, other: Fixed) -> Fixed {
        Fixed((self.0 as i128 * other.0 as i128 / Fixed::SCALE as i128) as i64)
    }
}

impl MulAssign for Fixed {
    #[inline]
    fn mul_assign(&mut self, other: Fixed) {
        *self = *self * other;
    }
}

impl Div for Fixed {
    type Output = Fixed;
    #[inline]
    fn div(self, other: Fixed) -> Fixed {
        if other.0 == 0 {
            return Fixed::ZERO; // Safe default for division by zero
        }
        Fixed((self.0 as i128 * Fixed::SCALE as i128 / other.0 as i128) as i64)
    }
}

impl DivAssign for Fixed {
    #[inline]
    fn div_assign(&mut self, other: Fixed) {
        *self = *self / other;
    }
}

impl std::iter::Sum for Fixed {
    fn sum<I: Iterator<Item = Fixed>>(iter: I) -> Fixed {
        iter.fold(Fixed::ZERO, |acc, v| acc + v)
    }
}

impl From<i64> for Fixed {
    fn from(v: i64) -> Self {
        Fixed::from_int(v)
    }
}

/// Parses plain decimal notation (`"3"`, `"-2.5"`, `"0.0001"`) without going
/// through floats. Digits beyond the fourth decimal place are truncated.
impl FromStr for Fixed {
    type Err = FixedParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FixedParseError(s.to_string());
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| err())?
        };
        let mut frac: i64 = 0;
        let mut scale = Self::SCALE / 10;
        for digit in frac_part.chars().take(4) {
            frac += (digit as i64 - '0' as i64) * scale;
            scale /= 10;
        }
        let raw = whole
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(err)?;
        Ok(Fixed(if negative { -raw } else { raw }))
    }
}

impl std::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fixed({} = {})", self.0, self)
    }
}

/// Shortest exact decimal form: `10`, `2.5`, `-0.0125`.
impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u64;
        let whole = abs / scale;
        let frac = abs % scale;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let digits = format!("{frac:04}");
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl Serialize for Fixed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_integer() {
            serializer.serialize_i64(self.to_int())
        } else {
            serializer.serialize_f64(self.to_f64())
        }
    }
}

struct FixedVisitor;

impl Visitor<'_> for FixedVisitor {
    type Value = Fixed;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Fixed, E> {
        Ok(Fixed::saturating_from_int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Fixed, E> {
        Ok(Fixed::saturating_from_int(
            i64::try_from(v).unwrap_or(i64::MAX),
        ))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Fixed, E> {
        Ok(Fixed::from_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Fixed, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Fixed, E> {
        Ok(Fixed::ZERO)
    }
}

impl<'de> Deserialize<'de> for Fixed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FixedVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(Fixed::ZERO.0, 0);
        assert_eq!(Fixed::ONE.0, 10000);
        assert_eq!(Fixed::HALF.0, 5000);
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Fixed::from_f64(0.25), Fixed(2500));
        assert_eq!(Fixed::from_f64(1.0), Fixed::ONE);
        assert_eq!(Fixed::from_f64(f64::NAN), Fixed::ZERO);
        assert_eq!(Fixed::from_f64(1e300), Fixed(i64::MAX));
    }

    #[test]
    fn test_multiply_and_divide() {
        assert_eq!(Fixed::from_int(2) * Fixed::from_int(3), Fixed::from_int(6));
        assert_eq!(Fixed::HALF * Fixed::HALF, Fixed(2500));
        assert_eq!(Fixed::from_int(6) / Fixed::from_int(2), Fixed::from_int(3));
        assert_eq!(Fixed::from_int(6) / Fixed::ZERO, Fixed::ZERO);
    }

    #[test]
    fn test_floor_rounds_down() {
        assert_eq!(Fixed::from_raw(25_000).floor(), 2);
        assert_eq!(Fixed::from_raw(-25_000).floor(), -3);
        assert_eq!(Fixed::from_int(7).floor(), 7);
    }

    #[test]
    fn test_parse_decimal_strings() {
        assert_eq!("3".parse::<Fixed>().unwrap(), Fixed::from_int(3));
        assert_eq!("2.5".parse::<Fixed>().unwrap(), Fixed(25_000));
        assert_eq!("-0.125".parse::<Fixed>().unwrap(), Fixed(-1250));
        assert_eq!(".5".parse::<Fixed>().unwrap(), Fixed::HALF);
        assert!("abc".parse::<Fixed>().is_err());
        assert!("".parse::<Fixed>().is_err());
        assert!("1.2.3".parse::<Fixed>().is_err());
    }

    #[test]
    fn test_display_is_shortest_exact() {
        assert_eq!(Fixed::from_int(10).to_string(), "10");
        assert_eq!(Fixed(25_000).to_string(), "2.5");
        assert_eq!(Fixed(-125).to_string(), "-0.0125");
        assert_eq!(Fixed::ZERO.to_string(), "0");
    }

    #[test]
    fn test_serde_json_numbers() {
        let v: Fixed = serde_json::from_str("12").unwrap();
        assert_eq!(v, Fixed::from_int(12));
        let v: Fixed = serde_json::from_str("0.75").unwrap();
        assert_eq!(v, Fixed(7500));
        let v: Fixed = serde_json::from_str("\"1.5\"").unwrap();
        assert_eq!(v, Fixed(15_000));

        assert_eq!(serde_json::to_string(&Fixed::from_int(4)).unwrap(), "4");
        assert_eq!(serde_json::to_string(&Fixed(7500)).unwrap(), "0.75");
    }

    #[test]
    fn test_serde_json_huge_numbers_saturate() {
        for text in ["1000000000000000", "1000000000000000.0", "18446744073709551615"] {
            let v: Fixed = serde_json::from_str(text).unwrap();
            assert_eq!(v, Fixed(i64::MAX), "{text}");
        }
        for text in ["-1000000000000000", "-1e15"] {
            let v: Fixed = serde_json::from_str(text).unwrap();
            assert_eq!(v, Fixed(i64::MIN), "{text}");
        }
        let v: Fixed = serde_json::from_str("922337203685477").unwrap();
        assert_eq!(v, Fixed::from_int(922_337_203_685_477));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn game_value() -> impl Strategy<Value = i64> {
            -1_000_000..=1_000_000i64
        }

        proptest! {
            #[test]
            fn mul_is_commutative(a in game_value(), b in game_value()) {
                let x = Fixed::from_int(a);
                let y = Fixed::from_int(b);
                prop_assert_eq!(x * y, y * x);
            }

            #[test]
            fn display_parses_back(raw in -10_000_000_000i64..=10_000_000_000i64) {
                let v = Fixed::from_raw(raw);
                prop_assert_eq!(v.to_string().parse::<Fixed>().unwrap(), v);
            }

            #[test]
            fn clamp_stays_in_range(v in game_value(), lo in -100i64..0, hi in 0i64..100) {
                let c = Fixed::from_int(v).clamp(Fixed::from_int(lo), Fixed::from_int(hi));
                prop_assert!(c >= Fixed::from_int(lo) && c <= Fixed::from_int(hi));
            }
        }
    }
}
