//! Name supply: fresh identifier-like tokens and the other random draws the
//! pipelines make.
//!
//! The randomness source is injected so that a run can be replayed from a
//! seed. One supply serves one pipeline run and never hands out the same
//! identifier twice, whichever stage asks for it.

use crate::lexicon;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashSet;

/// Default generated-name length
pub const DEFAULT_NAME_LENGTH: usize = 8;

/// Draws at one length before generated names grow a character
const MAX_DRAWS: usize = 16;

const IDENT_START: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";
const IDENT_TAIL: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub struct NameSupply {
    rng: Box<dyn RngCore + Send>,
    length: usize,
    issued: HashSet<String>,
}

impl NameSupply {
    /// Wrap an arbitrary randomness source
    pub fn new(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Box::new(rng),
            length: DEFAULT_NAME_LENGTH,
            issued: HashSet::new(),
        }
    }

    /// Supply backed by a generator seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Deterministic supply for tests and reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Set the generated-name length (at least one character)
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length.max(1);
        self
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// A fresh identifier: a letter or underscore, then letters and digits.
    /// Never one this supply has issued before, and never a word any native
    /// language reserves.
    pub fn identifier(&mut self) -> String {
        self.identifier_except(|_| false)
    }

    /// Like [`NameSupply::identifier`], also skipping every name `reject`
    /// refuses. When draws at the configured length keep colliding, later
    /// draws are one character longer.
    pub fn identifier_except(&mut self, mut reject: impl FnMut(&str) -> bool) -> String {
        let issued = &self.issued;
        let mut taken = |name: &str| {
            issued.contains(name) || lexicon::is_reserved(name) || reject(name)
        };

        let mut length = self.length;
        let name = loop {
            let fresh = (0..MAX_DRAWS)
                .map(|_| draw(&mut self.rng, length))
                .find(|name| !taken(name.as_str()));
            match fresh {
                Some(name) => break name,
                None => length += 1,
            }
        };
        self.issued.insert(name.clone());
        name
    }

    /// Random lowercase word of the given length
    pub fn lowercase_word(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(b'a' + self.rng.random_range(0..26u8)))
            .collect()
    }

    pub fn flip(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// Uniform integer in `0..bound`; `0` when `bound` is zero
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.rng.random_range(0..bound)
    }

    /// Uniform index into a collection of `len` elements
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.random_range(0..len)
    }

    /// Uniform fraction in `[0, 1)`
    pub fn fraction(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

}

fn draw(rng: &mut impl Rng, length: usize) -> String {
    let mut name = String::with_capacity(length);
    name.push(pick(rng, IDENT_START));
    for _ in 1..length {
        name.push(pick(rng, IDENT_TAIL));
    }
    name
}

fn pick(rng: &mut impl Rng, alphabet: &[u8]) -> char {
    char::from(alphabet[rng.random_range(0..alphabet.len())])
}

impl Default for NameSupply {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for NameSupply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameSupply")
            .field("length", &self.length)
            .field("issued", &self.issued.len())
            .finish_non_exhaustive()
    }
}
