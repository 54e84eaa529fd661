use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_traits::{One, Zero};
use tracing::debug;

use crate::errors::PiError;
use crate::utils::cpu::{
    binary_split::chudnovsky_binary_split,
    decimal::{Context, Decimal, RoundingMode},
    precision::{Plan, DEFAULT_GUARD_DIGITS},
};

/// L_term of the zeroth term; also the seed of the running sum.
pub const L_SEED: u64 = 13_591_409;
pub(crate) const L_STEP: u64 = 545_140_134;
const K_SEED: u32 = 6;
const K_STEP: u32 = 12;

/// Largest request `Strategy::Auto` sums term by term.
pub const DIRECT_MAX_DIGITS: u64 = 10_000;
/// Guard doublings tried before an unsettled result is returned as is.
const MAX_WIDENINGS: u32 = 6;

lazy_static! {
    /// -640320^3
    static ref X_STEP: BigInt = BigInt::from(-262_537_412_640_768_000i64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Direct up to [`DIRECT_MAX_DIGITS`], binary splitting above.
    Auto,
    /// Term-by-term summation, rounding each term to working precision.
    Direct,
    /// Exact P/Q/T products over term ranges, one division at the end.
    BinarySplit,
}

impl Strategy {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "auto" => Some(Strategy::Auto),
            "direct" => Some(Strategy::Direct),
            "binary-split" | "binary_split" | "split" | "bs" => Some(Strategy::BinarySplit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::Direct => "direct",
            Strategy::BinarySplit => "binary-split",
        }
    }

    /// The evaluator actually used for `digits`; never `Auto`.
    pub fn resolve(self, digits: u64) -> Strategy {
        match self {
            Strategy::Auto if digits <= DIRECT_MAX_DIGITS => Strategy::Direct,
            Strategy::Auto => Strategy::BinarySplit,
            chosen => chosen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiOptions {
    pub strategy: Strategy,
    pub rounding: RoundingMode,
    pub guard: u64,
}

impl Default for PiOptions {
    fn default() -> Self {
        PiOptions {
            strategy: Strategy::Auto,
            rounding: RoundingMode::Down,
            guard: DEFAULT_GUARD_DIGITS,
        }
    }
}

/// One term of the series after the zeroth: contributes `numerator / denominator`.
#[derive(Debug, Clone)]
pub struct Term {
    pub index: u64,
    pub numerator: BigInt,
    pub denominator: BigInt,
}

/// Exact integer recurrence behind the direct summation.
///
/// Yields terms `1..terms`; the zeroth term is [`L_SEED`]. Stops after the
/// first error.
pub struct SeriesTerms {
    index: u64,
    end: u64,
    m: BigInt,
    l: BigInt,
    x: BigInt,
    k: BigInt,
}

impl SeriesTerms {
    pub fn new(terms: u64) -> Self {
        SeriesTerms {
            index: 0,
            end: terms,
            m: BigInt::one(),
            l: BigInt::from(L_SEED),
            x: BigInt::one(),
            k: BigInt::from(K_SEED),
        }
    }

    #[cfg(test)]
    pub(crate) fn resume(index: u64, end: u64, m: BigInt, l: BigInt, x: BigInt, k: BigInt) -> Self {
        SeriesTerms { index, end, m, l, x, k }
    }

    fn step(&mut self, i: u64) -> Result<Term, PiError> {
        // (K^3 - 16K) * M is a multiple of i^3 for every i.
        let numerator = (&self.k * &self.k * &self.k - &self.k * 16u32) * &self.m;
        let divisor = BigInt::from(i).pow(3u32);
        let m = &numerator / &divisor;
        let remainder = numerator - &m * &divisor;
        if !remainder.is_zero() {
            return Err(PiError::ArithmeticInvariantViolation {
                term: i,
                remainder: remainder.to_string(),
            });
        }

        self.m = m;
        self.l += L_STEP;
        self.x *= &*X_STEP;
        self.k += K_STEP;

        Ok(Term {
            index: i,
            numerator: &self.m * &self.l,
            denominator: self.x.clone(),
        })
    }
}

impl Iterator for SeriesTerms {
    type Item = Result<Term, PiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index + 1 >= self.end {
            return None;
        }
        self.index += 1;
        let result = self.step(self.index);
        if result.is_err() {
            self.index = self.end;
        }
        Some(result)
    }
}

/// 426880 * sqrt(10005) at the context's precision.
pub(crate) fn chudnovsky_constant(ctx: &Context) -> Result<Decimal, PiError> {
    let root = ctx.sqrt(&Decimal::from(10_005u64))?;
    Ok(ctx.mul(&Decimal::from(426_880u64), &root))
}

/// Compute π at `plan.precision` significant digits by summing the
/// Chudnovsky series term by term.
pub fn chudnovsky_direct(plan: &Plan) -> Result<Decimal, PiError> {
    let ctx = plan.context();
    let c = chudnovsky_constant(&ctx)?;

    let mut sum = Decimal::from(L_SEED);
    for term in SeriesTerms::new(plan.terms) {
        let term = term?;
        let quotient = ctx.div(&Decimal::from(term.numerator), &Decimal::from(term.denominator))?;
        sum = ctx.add(&sum, &quotient);
    }

    ctx.div(&c, &sum)
}

/// First `digits` fractional digits of π, without the leading "3.".
pub fn pi_digits(digits: u64) -> Result<String, PiError> {
    pi_digits_with(digits, &PiOptions::default())
}

pub fn pi_digits_with(digits: u64, options: &PiOptions) -> Result<String, PiError> {
    let plan = Plan::with_guard(digits, options.guard)?;
    evaluate(&plan, options)
}

/// Runs the chosen evaluator for an existing plan and extracts
/// `plan.digits` fractional digits.
///
/// When the working digits past the request cannot decide the final
/// rounding (a run of 9s or 0s), the guard is doubled and the value
/// recomputed.
pub fn evaluate(plan: &Plan, options: &PiOptions) -> Result<String, PiError> {
    let strategy = options.strategy.resolve(plan.digits);
    let mut plan = *plan;
    let mut widenings = 0;

    loop {
        let pi = match strategy {
            Strategy::Direct => chudnovsky_direct(&plan)?,
            _ => chudnovsky_binary_split(&plan)?,
        };

        let places = plan.precision.saturating_sub(1).max(plan.digits);
        let (_integer, fraction) = pi.to_fixed(places, RoundingMode::Down);
        let (head, tail) = fraction.split_at(plan.digits as usize);
        // the last working digit is off by a few units
        let tail = &tail[..tail.len().saturating_sub(1)];

        if widenings >= MAX_WIDENINGS || is_settled(tail, options.rounding) {
            return Ok(match options.rounding {
                RoundingMode::Down => head.to_string(),
                mode => fractional_digits(&pi, plan.digits, mode),
            });
        }

        debug!(
            digits = plan.digits,
            guard = plan.guard(),
            tail,
            "Guard digits unsettled, widening"
        );
        plan = plan.widened();
        widenings += 1;
    }
}

/// Whether `tail`, the digits right after the requested ones, decides how
/// the last requested digit comes out under `rounding`.
fn is_settled(tail: &str, rounding: RoundingMode) -> bool {
    let uniform = |text: &str, digit: char| text.chars().all(|c| c == digit);
    let Some(first) = tail.chars().next() else {
        return false;
    };
    match rounding {
        RoundingMode::Down => !(uniform(tail, '0') || uniform(tail, '9')),
        RoundingMode::HalfEven => {
            let rest = &tail[1..];
            !((first == '5' && uniform(rest, '0')) || (first == '4' && uniform(rest, '9')))
        }
    }
}

fn fractional_digits(value: &Decimal, digits: u64, rounding: RoundingMode) -> String {
    let (_integer, fraction) = value.to_fixed(digits, rounding);
    fraction
}

#[cfg(test)]
pub(crate) const PI_100: &str = "1415926535897932384626433832795028841971693993751058209749445923078164062862089986280348253421170679";
