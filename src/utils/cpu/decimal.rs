use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, Zero};

use crate::errors::PiError;

const LOG10_2: f64 = std::f64::consts::LOG10_2;
/// Cached powers per thread before the cache is dropped.
const POWERS_CACHE_LIMIT: usize = 64;

thread_local! {
    // keyed by exponent
    static POWERS_OF_TEN: RefCell<HashMap<u64, BigUint>> = RefCell::new(HashMap::new());
}

/// How digits are dropped when a value is cut down to fewer digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    /// Toward zero.
    Down,
    /// Nearest, ties to an even last digit.
    HalfEven,
}

impl RoundingMode {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "down" | "truncate" => Some(RoundingMode::Down),
            "half-even" | "half_even" | "halfeven" => Some(RoundingMode::HalfEven),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoundingMode::Down => "down",
            RoundingMode::HalfEven => "half-even",
        }
    }
}

/// Arbitrary precision decimal: `int_val * 10^exp`.
///
/// Values built from integers are exact. Rounding only happens inside
/// [`Context`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    int_val: BigInt,
    exp: i64,
}

impl Decimal {
    pub fn new(int_val: BigInt, exp: i64) -> Self {
        Decimal { int_val, exp }
    }

    pub fn zero() -> Self {
        Decimal::new(BigInt::zero(), 0)
    }

    pub fn is_zero(&self) -> bool {
        self.int_val.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.int_val.is_negative()
    }

    /// Renders the value with exactly `places` fractional digits and returns
    /// `(integer_part, fractional_part)`. The integer part carries the sign.
    pub fn to_fixed(&self, places: u64, mode: RoundingMode) -> (String, String) {
        let target = -(places as i64);
        let mag = self.int_val.magnitude();

        let scaled = if self.exp >= target {
            mag * ten_to_the((self.exp - target) as u64)
        } else {
            let (kept, round_up) = shed_digits(mag.clone(), (target - self.exp) as u64, false, mode);
            if round_up { kept + 1u32 } else { kept }
        };
        let negative = self.is_negative() && !scaled.is_zero();

        let mut text = scaled.to_str_radix(10);
        let places = places as usize;
        if text.len() <= places {
            text = "0".repeat(places + 1 - text.len()) + &text;
        }
        let fraction = text.split_off(text.len() - places);
        if negative {
            text.insert(0, '-');
        }
        (text, fraction)
    }

    fn aligned(&self, exp: i64) -> BigInt {
        let shift = (self.exp - exp) as u64;
        if shift == 0 {
            self.int_val.clone()
        } else {
            &self.int_val * BigInt::from(ten_to_the(shift))
        }
    }
}

impl From<BigInt> for Decimal {
    fn from(value: BigInt) -> Self {
        Decimal::new(value, 0)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal::new(BigInt::from(value), 0)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(BigInt::from(value), 0)
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.exp >= 0 {
            return write!(f, "{}", self.aligned(0));
        }
        let (integer, fraction) = self.to_fixed((-self.exp) as u64, RoundingMode::Down);
        write!(f, "{}.{}", integer, fraction)
    }
}

/// Working precision, in significant decimal digits, for [`Decimal`] arithmetic.
///
/// Every operation returns the exact result rounded half-even to
/// `precision` digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    precision: u64,
}

impl Context {
    pub fn new(precision: u64) -> Self {
        Context { precision: precision.max(1) }
    }

    pub fn precision(&self) -> u64 {
        self.precision
    }

    pub fn round(&self, value: Decimal) -> Decimal {
        let (sign, mag) = value.int_val.into_parts();
        let (mag, exp) = round_to_precision(mag, value.exp, self.precision, false);
        Decimal::new(BigInt::from_biguint(sign, mag), exp)
    }

    pub fn add(&self, a: &Decimal, b: &Decimal) -> Decimal {
        let exp = a.exp.min(b.exp);
        let sum = a.aligned(exp) + b.aligned(exp);
        self.round(Decimal::new(sum, exp))
    }

    pub fn mul(&self, a: &Decimal, b: &Decimal) -> Decimal {
        self.round(Decimal::new(&a.int_val * &b.int_val, a.exp + b.exp))
    }

    pub fn div(&self, a: &Decimal, b: &Decimal) -> Result<Decimal, PiError> {
        if b.is_zero() {
            return Err(PiError::DomainError("division by zero"));
        }
        if a.is_zero() {
            return Ok(Decimal::zero());
        }

        let a_mag = a.int_val.magnitude();
        let b_mag = b.int_val.magnitude();

        // At least precision + 1 quotient digits, so the rounding digit is real.
        let shift = (self.precision + 1 + count_decimal_digits(b_mag))
            .saturating_sub(count_decimal_digits(a_mag));
        let numerator = a_mag * ten_to_the(shift);
        let quotient = &numerator / b_mag;
        let sticky = !(numerator - &quotient * b_mag).is_zero();

        let (mag, exp) = round_to_precision(
            quotient,
            a.exp - b.exp - shift as i64,
            self.precision,
            sticky,
        );
        let sign = a.int_val.sign() * b.int_val.sign();
        Ok(Decimal::new(BigInt::from_biguint(sign, mag), exp))
    }

    pub fn sqrt(&self, a: &Decimal) -> Result<Decimal, PiError> {
        if a.is_negative() {
            return Err(PiError::DomainError("square root of a negative value"));
        }
        if a.is_zero() {
            return Ok(Decimal::zero());
        }

        let mut mag = a.int_val.magnitude().clone();
        let mut exp = a.exp;
        if exp.rem_euclid(2) == 1 {
            mag *= 10u32;
            exp -= 1;
        }

        let wanted = 2 * (self.precision + 1);
        let mut shift = wanted.saturating_sub(count_decimal_digits(&mag));
        if shift % 2 == 1 {
            shift += 1;
        }
        mag *= ten_to_the(shift);
        exp -= shift as i64;

        let root = mag.sqrt();
        let sticky = &root * &root != mag;
        let (root, root_exp) = round_to_precision(root, exp / 2, self.precision, sticky);
        Ok(Decimal::new(BigInt::from_biguint(Sign::Plus, root), root_exp))
    }
}

pub(crate) fn ten_to_the(n: u64) -> BigUint {
    POWERS_OF_TEN.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(power) = cache.get(&n) {
            return power.clone();
        }
        if cache.len() >= POWERS_CACHE_LIMIT {
            cache.clear();
        }
        let power = BigUint::from(10u32).pow(n as u32);
        cache.insert(n, power.clone());
        power
    })
}

pub(crate) fn count_decimal_digits(n: &BigUint) -> u64 {
    if n.is_zero() {
        return 1;
    }
    // 2^(bits-1) <= n < 2^bits puts the digit count at `low` or `low + 1`.
    let low = ((n.bits() - 1) as f64 * LOG10_2) as u64 + 1;
    if n >= &ten_to_the(low) {
        low + 1
    } else {
        low
    }
}

/// Drops the lowest `count` digits of `mag`. Returns the kept digits and
/// whether they must be incremented. `sticky` marks a non-zero tail below
/// the dropped digits.
fn shed_digits(mag: BigUint, count: u64, sticky: bool, mode: RoundingMode) -> (BigUint, bool) {
    let divisor = ten_to_the(count);
    let kept = &mag / &divisor;
    let rest = mag - &kept * &divisor;

    let round_up = match mode {
        RoundingMode::Down => false,
        RoundingMode::HalfEven => match (&rest * 2u32).cmp(&divisor) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => sticky || !(&kept % 2u32).is_zero(),
        },
    };
    (kept, round_up)
}

fn round_to_precision(mag: BigUint, exp: i64, precision: u64, sticky: bool) -> (BigUint, i64) {
    let digits = count_decimal_digits(&mag);
    if digits <= precision {
        debug_assert!(!sticky, "inexact result without a rounding digit");
        return (mag, exp);
    }

    let drop = digits - precision;
    let (mut kept, round_up) = shed_digits(mag, drop, sticky, RoundingMode::HalfEven);
    let mut exp = exp + drop as i64;
    if round_up {
        kept += 1u32;
        // 99..9 + 1 grew a digit
        if count_decimal_digits(&kept) > precision {
            kept /= 10u32;
            exp += 1;
        }
    }
    (kept, exp)
}
