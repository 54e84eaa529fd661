use crate::errors::PiError;
use crate::utils::cpu::decimal::Context;

/// Largest digit count accepted by the core.
pub const MAX_DIGITS: u64 = 1_000_000;

/// Extra working digits beyond the requested count. Also the floor for any
/// configured guard; evaluation widens it where the digits need more.
pub const DEFAULT_GUARD_DIGITS: u64 = 5;

/// Decimal digits contributed by each Chudnovsky term (~14.18, rounded down).
pub const DIGITS_PER_TERM: u64 = 14;

/// Working precision and term count for a digit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub digits: u64,
    pub precision: u64,
    /// Terms evaluated, the seeded zeroth term included.
    pub terms: u64,
}

impl Plan {
    pub fn new(digits: u64) -> Result<Self, PiError> {
        Self::with_guard(digits, DEFAULT_GUARD_DIGITS)
    }

    pub fn with_guard(digits: u64, guard: u64) -> Result<Self, PiError> {
        if digits == 0 || digits > MAX_DIGITS {
            return Err(PiError::InvalidDigitCount { digits, max: MAX_DIGITS });
        }

        let precision = digits + guard;
        let required = digits + DEFAULT_GUARD_DIGITS;
        if precision < required {
            return Err(PiError::PrecisionUnderflow { precision, required });
        }

        Ok(Plan {
            digits,
            precision,
            terms: digits / DIGITS_PER_TERM + 1,
        })
    }

    /// Working digits beyond the requested ones.
    pub fn guard(&self) -> u64 {
        self.precision.saturating_sub(self.digits)
    }

    /// The same request with twice the guard band.
    pub fn widened(&self) -> Plan {
        let guard = (2 * self.guard()).max(DEFAULT_GUARD_DIGITS);
        Plan {
            precision: self.digits + guard,
            ..*self
        }
    }

    pub fn context(&self) -> Context {
        Context::new(self.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_request_keeps_seed_term() {
        let plan = Plan::new(1).unwrap();
        assert_eq!(plan.precision, 6);
        assert_eq!(plan.terms, 1);
        assert_eq!(Plan::new(13).unwrap().terms, 1);
        assert_eq!(Plan::new(14).unwrap().terms, 2);
    }

    #[test]
    fn test_guard_band_holds_across_range() {
        for digits in [1, 14, 50, 999, 65_536, MAX_DIGITS] {
            let plan = Plan::new(digits).unwrap();
            assert!(plan.precision >= digits + 5);
            assert_eq!(plan.terms, digits / 14 + 1);
            assert_eq!(plan.context().precision(), plan.precision);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            Plan::new(0),
            Err(PiError::InvalidDigitCount { digits: 0, max: MAX_DIGITS })
        );
        assert!(matches!(
            Plan::new(MAX_DIGITS + 1),
            Err(PiError::InvalidDigitCount { .. })
        ));
    }

    #[test]
    fn test_widened_doubles_guard() {
        let plan = Plan::new(761).unwrap();
        assert_eq!(plan.guard(), 5);
        let wider = plan.widened();
        assert_eq!(wider.precision, 771);
        assert_eq!(wider.terms, plan.terms);
        assert_eq!(wider.widened().guard(), 20);
    }

    #[test]
    fn test_small_guard_underflows() {
        assert_eq!(
            Plan::with_guard(100, 2),
            Err(PiError::PrecisionUnderflow { precision: 102, required: 105 })
        );
        assert_eq!(Plan::with_guard(100, 12).unwrap().precision, 112);
    }
}
