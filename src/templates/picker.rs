//! Random selection among alternative phrasings
//!
//! Selection goes through a [`PhrasePicker`] so tests and replays can swap the
//! entropy-backed picker for a seeded or scripted one.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses an index among `len` candidates
pub trait PhrasePicker: Send + Sync {
    /// Returns an index in `0..len`; only called with `len > 0`
    fn pick(&self, len: usize) -> usize;
}

/// Pick one item, `None` for an empty slice
pub fn pick_from<'a, T>(picker: &dyn PhrasePicker, items: &'a [T]) -> Option<&'a T> {
    match items.len() {
        0 => None,
        1 => items.first(),
        len => items.get(picker.pick(len).min(len - 1)),
    }
}

/// Uniform random picker
#[derive(Debug)]
pub struct RandomPicker {
    rng: Mutex<StdRng>,
}

impl RandomPicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl PhrasePicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(0..len)
    }
}

/// Replays a fixed list of indices, then keeps picking the first candidate
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    picks: Mutex<VecDeque<usize>>,
}

impl ScriptedPicker {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: Mutex::new(picks.into_iter().collect()),
        }
    }

    /// Always picks the first candidate
    pub fn first() -> Self {
        Self::default()
    }
}

impl PhrasePicker for ScriptedPicker {
    fn pick(&self, len: usize) -> usize {
        let next = self
            .picks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(0);
        next % len
    }
}
