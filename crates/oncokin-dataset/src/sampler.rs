//! Injectable randomness for rejection sampling.
//!
//! The assembler never reaches for a global RNG: it draws through this
//! trait so production uses the thread RNG while tests supply a
//! deterministic sequence and get reproducible sample sets.

use rand::Rng;

/// A source of uniform index draws.
pub trait RandomSource {
    /// An index in `0..len`. `len` is never zero when called by the
    /// assembler.
    fn pick(&mut self, len: usize) -> usize;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn pick(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic source cycling over a fixed sequence, for tests.
#[derive(Debug, Clone)]
pub struct CycleSource {
    sequence: Vec<usize>,
    next: usize,
}

impl CycleSource {
    pub fn new(sequence: Vec<usize>) -> Self {
        assert!(!sequence.is_empty(), "CycleSource needs at least one value");
        Self { sequence, next: 0 }
    }
}

impl RandomSource for CycleSource {
    fn pick(&mut self, len: usize) -> usize {
        let value = self.sequence[self.next % self.sequence.len()];
        self.next += 1;
        value % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_rng_source_stays_in_range() {
        let mut source = ThreadRngSource;
        for _ in 0..100 {
            assert!(source.pick(7) < 7);
        }
    }

    #[test]
    fn test_cycle_source_is_deterministic() {
        let mut source = CycleSource::new(vec![0, 3, 5]);
        let draws: Vec<usize> = (0..6).map(|_| source.pick(10)).collect();
        assert_eq!(draws, vec![0, 3, 5, 0, 3, 5]);
        // Values wrap into range
        let mut source = CycleSource::new(vec![11]);
        assert_eq!(source.pick(10), 1);
    }
}
