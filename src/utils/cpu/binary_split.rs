use std::panic;
use std::thread;

use num_bigint::BigInt;
use num_traits::One;

use crate::errors::PiError;
use crate::utils::cpu::{
    decimal::Decimal,
    pi::{chudnovsky_constant, L_SEED, L_STEP},
    precision::Plan,
};

/// 640320^3 / 24
const C3_OVER_24: u64 = 10_939_058_860_032_000;

/// Ranges narrower than this are never handed to another thread.
const PARALLEL_MIN_TERMS: u64 = 256;
/// At most 2^3 concurrent leaves.
const MAX_PARALLEL_DEPTH: u32 = 3;

/// Products over a term range `[a, b)`:
///   P(a, b), Q(a, b), T(a, b) with π = 426880·sqrt(10005)·Q(0, N) / T(0, N)
#[derive(Debug, Clone, PartialEq, Eq)]
struct Split {
    p: BigInt,
    q: BigInt,
    t: BigInt,
}

fn leaf(k: u64) -> Split {
    if k == 0 {
        return Split {
            p: BigInt::one(),
            q: BigInt::one(),
            t: BigInt::from(L_SEED),
        };
    }

    // P_k = (6k - 5)(2k - 1)(6k - 1)
    let p = BigInt::from(6 * k - 5) * BigInt::from(2 * k - 1) * BigInt::from(6 * k - 1);
    // Q_k = k^3 * C^3 / 24
    let q = BigInt::from(k).pow(3u32) * BigInt::from(C3_OVER_24);
    // T_k = (-1)^k * (13591409 + 545140134 k) * P_k
    let t = BigInt::from(L_SEED + L_STEP * k) * &p;
    let t = if k % 2 == 1 { -t } else { t };

    Split { p, q, t }
}

fn split(a: u64, b: u64, depth: u32) -> Split {
    if b - a == 1 {
        return leaf(a);
    }

    let m = (a + b) / 2;
    let (left, right) = if depth > 0 && b - a >= PARALLEL_MIN_TERMS {
        thread::scope(|s| {
            let handle = s.spawn(|| split(a, m, depth - 1));
            let right = split(m, b, depth - 1);
            let left = handle.join().unwrap_or_else(|e| panic::resume_unwind(e));
            (left, right)
        })
    } else {
        (split(a, m, depth), split(m, b, depth))
    };

    // T(a, b) = Q(m, b) T(a, m) + P(a, m) T(m, b)
    let t = &right.q * &left.t + &left.p * &right.t;
    Split {
        p: left.p * right.p,
        q: left.q * right.q,
        t,
    }
}

fn parallel_depth() -> u32 {
    thread::available_parallelism()
        .map(|n| n.get().next_power_of_two().trailing_zeros())
        .unwrap_or(0)
        .min(MAX_PARALLEL_DEPTH)
}

/// Compute π at `plan.precision` significant digits over the same
/// `plan.terms` terms as the direct summation, via binary splitting.
pub fn chudnovsky_binary_split(plan: &Plan) -> Result<Decimal, PiError> {
    let ctx = plan.context();
    let c = chudnovsky_constant(&ctx)?;

    let total = split(0, plan.terms, parallel_depth());

    let numerator = ctx.mul(&c, &Decimal::from(total.q));
    ctx.div(&numerator, &Decimal::from(total.t))
}
