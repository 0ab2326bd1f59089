//! Deterministic per-agent RNG wrapper.
//!
//! Behavior logic never touches a global or thread-local random source.
//! Each agent owns an `AgentRng` seeded from
//!
//!   seed = global_seed XOR (agent_id * MIXING_CONSTANT)
//!
//! and it is passed into every activity poll.  Break rolls, duration
//! variance and tie-breaking are therefore reproducible regardless of how
//! the decision phase is spread across threads.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG, owned by the agent's decision state.
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed and an agent ID.
    pub fn new(global_seed: u64, agent: AgentId) -> Self {
        let seed = global_seed ^ (agent.0 as u64).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).  `p <= 0` never
    /// consumes a value from the stream, so a zero probability leaves the
    /// sequence untouched.
    #[inline]
    pub fn roll(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        self.0.gen_bool(p.min(1.0))
    }

    /// `base` shifted by a uniform offset in `[-variance, +variance]`,
    /// never below 1.
    pub fn jitter(&mut self, base: u64, variance: u64) -> u64 {
        if variance == 0 {
            return base.max(1);
        }
        let offset = self.0.gen_range(0..=2 * variance) as i64 - variance as i64;
        (base as i64 + offset).max(1) as u64
    }

    /// Choose a random element from a slice.  `None` if empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
