//! Deterministic per-agent RNG.
//!
//! Each agent gets its own `SmallRng` seeded by
//!
//!   seed = global_seed XOR (agent_id * MIXING_CONSTANT)
//!
//! so departure jitter never depends on the order in which agents are
//! created, and adding agents at the end leaves earlier draws unchanged.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-agent deterministic RNG.
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed and an agent ID.
    pub fn new(global_seed: u64, agent: AgentId) -> Self {
        let seed = global_seed ^ (agent.0 as u64).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Whole second uniformly drawn from `[0, window_secs)`; 0 for an empty
    /// window.
    #[inline]
    pub fn secs_within(&mut self, window_secs: u32) -> u32 {
        if window_secs == 0 {
            return 0;
        }
        self.0.gen_range(0..window_secs)
    }
}
