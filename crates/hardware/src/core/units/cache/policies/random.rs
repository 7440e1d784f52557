//! Random Replacement Policy.
//!
//! Picks a uniformly distributed victim with a xorshift64 generator. Each cache
//! seeds its own generator so that harts do not evict in lock-step.

use super::ReplacementPolicy;

/// Random policy state.
#[derive(Clone, Debug)]
pub struct RandomPolicy {
    state: u64,
}

impl RandomPolicy {
    /// Seed used by [`Default`].
    pub const DEFAULT_SEED: u64 = 123_456_789;

    /// Creates a policy with the given seed. A zero seed is replaced by
    /// [`DEFAULT_SEED`](Self::DEFAULT_SEED) since xorshift never leaves zero.
    pub const fn with_seed(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::DEFAULT_SEED } else { seed },
        }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::with_seed(Self::DEFAULT_SEED)
    }
}

impl ReplacementPolicy for RandomPolicy {
    /// Access history does not influence random replacement.
    fn update(&mut self, _slot: usize) {}

    fn get_victim(&mut self, slots: usize) -> usize {
        (self.next() % slots as u64) as usize
    }
}
