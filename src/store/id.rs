//! Entry id generation
//!
//! Ids are short strings of uppercase letters drawn at random. A draw that
//! collides with an id already in the index is thrown away and drawn again.
//! With six letters there are 26^6 (about 3.09e8) possible ids, so retries
//! are rare in practice.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::StoreError;

/// Number of characters in a generated id
pub const DEFAULT_ID_LENGTH: usize = 6;

/// Characters ids are drawn from
pub const DEFAULT_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates entry ids by rejection sampling over a seeded random source
#[derive(Debug, Clone)]
pub struct IdGenerator {
    rng: StdRng,
    alphabet: Vec<char>,
    length: usize,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Creates a generator seeded from the operating system
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Creates a generator with a fixed seed, for reproducible ids
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Creates a generator over a custom alphabet and id length
    ///
    /// Small alphabets make collisions frequent, which is how the retry path
    /// is exercised in tests.
    pub fn with_alphabet(alphabet: &str, length: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            alphabet: alphabet.chars().collect(),
            length,
        }
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            alphabet: DEFAULT_ALPHABET.chars().collect(),
            length: DEFAULT_ID_LENGTH,
        }
    }

    /// Number of distinct ids this generator can produce
    pub fn capacity(&self) -> usize {
        u32::try_from(self.length)
            .ok()
            .and_then(|len| self.alphabet.len().checked_pow(len))
            .unwrap_or(usize::MAX)
    }

    /// Draws one candidate id without checking for collisions
    fn draw(&mut self) -> String {
        (0..self.length)
            .map(|_| self.alphabet[self.rng.random_range(0..self.alphabet.len())])
            .collect()
    }

    /// Draws ids until one is not taken
    ///
    /// # Arguments
    /// * `in_use` - How many ids are currently taken
    /// * `is_taken` - Returns true when a candidate collides
    ///
    /// # Returns
    /// * `Ok(String)` - A fresh id
    /// * `Err(StoreError::IdSpaceExhausted)` - If every possible id is taken
    pub fn generate<F>(&mut self, in_use: usize, is_taken: F) -> Result<String, StoreError>
    where
        F: Fn(&str) -> bool,
    {
        let capacity = self.capacity();
        if in_use >= capacity {
            return Err(StoreError::IdSpaceExhausted { capacity });
        }

        loop {
            let candidate = self.draw();
            if !is_taken(&candidate) {
                return Ok(candidate);
            }
            tracing::debug!(id = %candidate, "entry id collision, drawing again");
        }
    }
}
