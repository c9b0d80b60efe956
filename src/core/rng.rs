//! Seeded randomness for library shuffles.
//!
//! The generator belongs to the object manager and only shuffle commands
//! draw from it. A shuffle records a checkpoint before drawing and rewinds
//! to it on undo, so undo followed by redo deals the same order again.
//!
//! ```
//! use ccg_rules::core::{GameRng, ObjectId};
//!
//! let deck: Vec<ObjectId> = (0..8).map(ObjectId).collect();
//! let mut rng = GameRng::new(42);
//! let saved = rng.checkpoint();
//! let first = rng.permute(&deck);
//!
//! rng.rewind(&saved);
//! assert_eq!(rng.permute(&deck), first);
//! ```

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::entity::ObjectId;

/// ChaCha8 stream seeded from `EngineConfig::seed`.
#[derive(Clone, Debug)]
pub struct GameRng {
    stream: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { stream: ChaCha8Rng::seed_from_u64(seed), seed }
    }

    /// A random permutation of `order`.
    #[must_use]
    pub fn permute(&mut self, order: &[ObjectId]) -> Vec<ObjectId> {
        let mut out = order.to_vec();
        out.shuffle(&mut self.stream);
        out
    }

    /// Position in the stream. Capture is O(1) however far the stream ran.
    #[must_use]
    pub fn checkpoint(&self) -> GameRngState {
        GameRngState { seed: self.seed, word_pos: self.stream.get_word_pos() }
    }

    /// Return to a checkpoint taken from a generator with any seed.
    pub fn rewind(&mut self, state: &GameRngState) {
        if state.seed != self.seed {
            self.stream = ChaCha8Rng::seed_from_u64(state.seed);
            self.seed = state.seed;
        }
        self.stream.set_word_pos(state.word_pos);
    }
}

/// A `GameRng` checkpoint; part of manager snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameRngState {
    pub seed: u64,
    pub word_pos: u128,
}
