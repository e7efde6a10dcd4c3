//! Agent counts per sweep point.
//!
//! Every point is a `Vec<u32>` of agents per mode, in mode-table order.

use qs_core::math::{gcd_of, lcm};
use tracing::{debug, warn};

/// Points beyond the ring's bumper-to-bumper load, in PCU, still worth a run.
const OVERLOAD_PCU: f64 = 5.0;

/// Distribution grids larger than this get a warning.
const LARGE_GRID: u64 = 1_000;

/// Smallest integer agent mix whose PCU shares match `split_pcu`, scaled
/// by `reduce_factor`.
///
/// Shares are taken to a hundredth.  A mode heavier than one PCU whose
/// share does not divide by its PCU scales every mode up until it does;
/// then each share is turned into agents and the result reduced by the
/// common divisor.  A single mode steps one agent at a time.
pub fn modal_split_steps(pcu: &[f64], split_pcu: &[f64], reduce_factor: u32) -> Vec<u64> {
    let reduce = u64::from(reduce_factor.max(1));
    if pcu.len() == 1 {
        return vec![reduce];
    }

    let shares: Vec<u64> = split_pcu.iter().map(|s| (s * 100.0).round() as u64).collect();

    let mut mult = 1;
    for (&share, &p) in shares.iter().zip(pcu) {
        let whole = p as u64;
        if p > 1.0 && share > 0 && share % whole != 0 {
            mult *= lcm(whole, share) / share;
        }
    }

    let agents: Vec<u64> = shares
        .iter()
        .zip(pcu)
        .map(|(&share, &p)| ((share * mult) as f64 / p).round() as u64)
        .collect();
    let divisor = gcd_of(&agents).unwrap_or(1).max(1);

    let steps: Vec<u64> = agents.iter().map(|a| a / divisor * reduce).collect();
    if reduce != 1 {
        warn!(reduce, ?steps, "modal split steps scaled by reduce factor");
    }
    steps
}

/// `m × steps` for `m = 1, 2, …` up to a few PCU past `network_pcu`.
pub fn modal_split_points(steps: &[u64], pcu: &[f64], network_pcu: f64) -> Vec<Vec<u32>> {
    let per_multiple: f64 = steps.iter().zip(pcu).map(|(&s, &p)| s as f64 * p).sum();
    if per_multiple <= 0.0 {
        return Vec::new();
    }
    let last = (network_pcu / per_multiple).ceil() as u64 + OVERLOAD_PCU as u64;
    let points: Vec<Vec<u32>> =
        (1..last).map(|m| steps.iter().map(|&s| (m * s) as u32).collect()).collect();
    debug!(points = points.len(), ?steps, "modal split points");
    points
}

/// Every grid point `1, 1 + step, …` per mode, up to one past the ring's
/// capacity in that mode alone, keeping the points whose load stays within
/// `network_pcu` plus a small overload.  The last mode varies fastest.
pub fn distribution_points(pcu: &[f64], network_pcu: f64, reduce_factor: u32) -> Vec<Vec<u32>> {
    const START: u64 = 1;
    if pcu.is_empty() {
        return Vec::new();
    }
    let step = u64::from(reduce_factor.max(1));
    let maxima: Vec<u64> = pcu.iter().map(|&p| (network_pcu / p).floor() as u64 + 1).collect();

    let grid: u64 = maxima.iter().map(|&max| (max.saturating_sub(START)) / step + 1).product();
    if grid > LARGE_GRID {
        warn!(grid, step, "distribution sweep is large; raise reduce_factor to thin it");
    }

    let mut current = vec![START; pcu.len()];
    let mut points = Vec::new();
    loop {
        let load: f64 = current.iter().zip(pcu).map(|(&n, &p)| n as f64 * p).sum();
        if load <= network_pcu + OVERLOAD_PCU {
            points.push(current.iter().map(|&n| n as u32).collect());
        }

        let mut i = current.len();
        loop {
            if i == 0 {
                debug!(points = points.len(), grid, "distribution points");
                return points;
            }
            i -= 1;
            if current[i] + step <= maxima[i] {
                current[i] += step;
                break;
            }
            current[i] = START;
        }
    }
}
