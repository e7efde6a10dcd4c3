//! Integer helpers for deriving minimal per-mode step sizes from a modal
//! split.  Setup math only; nothing in the engine state machine uses it.

/// Greatest common divisor (Euclid).  `gcd(a, 0) == a`.
pub fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Least common multiple.  `lcm(0, _) == 0`.
pub fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// GCD of every value in `values`; `None` for an empty slice.
pub fn gcd_of(values: &[u64]) -> Option<u64> {
    values.iter().copied().reduce(gcd)
}
