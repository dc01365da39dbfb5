//! Fake number generator.
//!
//! Candidates are `prefix` followed by uniformly random digits. A candidate
//! already in the caller's known set is rejected and retried; after
//! `max_attempts` rejections generation fails with [`GenerateError::Exhausted`]
//! instead of ever handing back a duplicate.
//!
//! The generator never mutates the known set. Callers generating a batch must
//! insert each returned number into the set before asking for the next one.

use crate::errors::GenerateError;
use rand::Rng;
use std::collections::HashSet;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;
pub const DEFAULT_FAKE_LENGTH: usize = 15;
pub const DEFAULT_FAKE_PREFIX: &str = "7";

/// Shape of generated numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeNumberSpec {
    pub length: usize,
    pub prefix: String,
    pub max_attempts: u32,
}

impl Default for FakeNumberSpec {
    fn default() -> Self {
        Self {
            length: DEFAULT_FAKE_LENGTH,
            prefix: DEFAULT_FAKE_PREFIX.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl FakeNumberSpec {
    pub fn new(length: usize, prefix: impl Into<String>) -> Self {
        Self {
            length,
            prefix: prefix.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    fn check(&self) -> Result<usize, GenerateError> {
        if !self.prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GenerateError::InvalidSpec {
                reason: format!("prefix '{}' must contain only digits", self.prefix),
            });
        }
        if self.prefix.len() > self.length {
            return Err(GenerateError::InvalidSpec {
                reason: format!(
                    "prefix '{}' is longer than length {}",
                    self.prefix, self.length
                ),
            });
        }
        if self.max_attempts == 0 {
            return Err(GenerateError::InvalidSpec {
                reason: "max_attempts must be at least 1".to_string(),
            });
        }
        Ok(self.length - self.prefix.len())
    }

    /// Generate with the thread-local RNG.
    pub fn generate(&self, existing: &HashSet<String>) -> Result<String, GenerateError> {
        self.generate_with(&mut rand::thread_rng(), existing)
    }

    /// Generate with an explicit RNG.
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        existing: &HashSet<String>,
    ) -> Result<String, GenerateError> {
        let remaining = self.check()?;

        for _ in 0..self.max_attempts {
            let mut candidate = String::with_capacity(self.length);
            candidate.push_str(&self.prefix);
            for _ in 0..remaining {
                candidate.push(char::from(b'0' + rng.gen_range(0..10u8)));
            }
            if !existing.contains(&candidate) {
                return Ok(candidate);
            }
        }

        Err(GenerateError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Generate one fake number of `length` digits starting with `prefix`.
pub fn generate(
    existing: &HashSet<String>,
    length: usize,
    prefix: &str,
) -> Result<String, GenerateError> {
    FakeNumberSpec::new(length, prefix).generate(existing)
}
