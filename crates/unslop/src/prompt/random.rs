use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Index source used for every uniform choice the transformer makes.
///
/// Implementations must be safe to share across threads; the engine itself
/// holds no other mutable state.
pub trait RandomSource: Send + Sync {
    /// Returns an index in `0..len`. Callers never pass `len == 0`.
    fn pick(&self, len: usize) -> usize;

    /// Draws `count` distinct indices from `0..len` (partial Fisher-Yates).
    /// Never returns more than `len` indices.
    fn sample(&self, len: usize, count: usize) -> Vec<usize> {
        let count = count.min(len);
        let mut indices: Vec<usize> = (0..len).collect();
        for i in 0..count {
            let remaining = len - i;
            let j = i + self.pick(remaining).min(remaining - 1);
            indices.swap(i, j);
        }
        indices.truncate(count);
        indices
    }
}

pub fn choose<'a, S, T>(source: &S, items: &'a [T]) -> Option<&'a T>
where
    S: RandomSource + ?Sized,
{
    if items.is_empty() {
        return None;
    }
    let index = source.pick(items.len()).min(items.len() - 1);
    items.get(index)
}

pub fn choose_many<'a, S, T>(source: &S, items: &'a [T], count: usize) -> Vec<&'a T>
where
    S: RandomSource + ?Sized,
{
    source
        .sample(items.len(), count)
        .into_iter()
        .filter_map(|index| items.get(index))
        .collect()
}

/// Process-wide default: the thread-local `fastrand` generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        fastrand::usize(..len)
    }
}

/// Reproducible source seeded once; successive picks advance one generator.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<fastrand::Rng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick(&self, len: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .usize(..len)
    }
}

/// Replays a fixed index sequence (cycling), reduced modulo the requested range.
#[derive(Debug)]
pub struct ScriptedRandom {
    picks: Vec<usize>,
    cursor: AtomicUsize,
}

impl ScriptedRandom {
    pub fn new(picks: Vec<usize>) -> Self {
        Self {
            picks,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Always picks the first remaining candidate.
    pub fn first() -> Self {
        Self::new(vec![0])
    }
}

impl RandomSource for ScriptedRandom {
    fn pick(&self, len: usize) -> usize {
        if self.picks.is_empty() || len == 0 {
            return 0;
        }
        let position = self.cursor.fetch_add(1, Ordering::Relaxed) % self.picks.len();
        self.picks[position] % len
    }
}
