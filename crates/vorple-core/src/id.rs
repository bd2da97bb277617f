#![forbid(unsafe_code)]

//! Random element ids.
//!
//! Ids are alphanumeric and never start with a digit, so they are valid as
//! both HTML ids and CSS selectors.


const DEFAULT_LENGTH: usize = 32;

/// Produces random ids from a per-session hashing seed.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: ahash::RandomState,
    counter: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Generator with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: ahash::RandomState::new(),
            counter: 0,
        }
    }

    /// Generator whose output is reproducible across runs.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: ahash::RandomState::with_seeds(seed, seed ^ 0x9e37_79b9, 0x5be0_cd19, 0x1f83_d9ab),
            counter: 0,
        }
    }

    /// A 32-character id.
    pub fn generate(&mut self) -> String {
        self.generate_len(DEFAULT_LENGTH)
    }

    /// An id of the given length.
    pub fn generate_len(&mut self, length: usize) -> String {
        self.counter = self.counter.wrapping_add(1);
        let mut id = String::with_capacity(length);

        for i in 0..length {
            let roll = self.seed.hash_one((self.counter, i));
            // First character is a letter: skip the ten digits.
            let rnd = if i == 0 {
                (roll % 52) as u8 + 10
            } else {
                (roll % 62) as u8
            };

            let ch = match rnd {
                0..=9 => b'0' + rnd,
                10..=35 => b'A' + (rnd - 10),
                _ => b'a' + (rnd - 36),
            };
            id.push(char::from(ch));
        }

        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_requested_length() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.generate().len(), 32);
        assert_eq!(ids.generate_len(5).len(), 5);
        assert_eq!(ids.generate_len(0), "");
    }

    #[test]
    fn ids_never_start_with_a_digit() {
        let mut ids = IdGenerator::with_seed(7);
        for _ in 0..200 {
            let id = ids.generate_len(8);
            let first = id.chars().next().unwrap();
            assert!(first.is_ascii_alphabetic(), "{id}");
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn consecutive_ids_differ() {
        let mut ids = IdGenerator::with_seed(1);
        let a = ids.generate();
        let b = ids.generate();
        assert_ne!(a, b);
    }

    #[test]
    fn seeded_generators_agree() {
        let mut a = IdGenerator::with_seed(42);
        let mut b = IdGenerator::with_seed(42);
        assert_eq!(a.generate(), b.generate());
    }
}
