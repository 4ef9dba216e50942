//! Short code generation and code policy.
//!
//! Codes are base62 strings of a fixed length between [`MIN_CODE_LENGTH`] and
//! [`MAX_CODE_LENGTH`]. Two strategies sit behind [`CodeGenerator`]:
//!
//! - [`RandomCodeGenerator`] - seed picks characters at random; collisions are
//!   possible and handled by the allocator's retry loop
//! - [`SequenceCodeGenerator`] - seed is a store-owned counter value encoded in
//!   base62; collision-free until the code space wraps
//!
//! Generators are pure: the same seed always yields the same code.

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Base62 alphabet in ascending ASCII order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const MIN_CODE_LENGTH: usize = 6;
pub const MAX_CODE_LENGTH: usize = 8;

/// Codes that would shadow top-level routes.
const RESERVED_CODES: &[&str] = &["health", "static"];

/// How the allocator obtains seeds for a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Seeds come from the thread-local RNG.
    Random,
    /// Seeds come from the mapping store's counter.
    Sequence,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "sequence" => Ok(Self::Sequence),
            other => Err(format!(
                "unknown code strategy '{}', expected 'random' or 'sequence'",
                other
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Sequence => write!(f, "sequence"),
        }
    }
}

/// Maps a seed to a candidate short code.
///
/// Implementations must always return a code that satisfies
/// [`is_valid_code`] and must not touch any storage.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    /// Where the allocator should draw seeds from.
    fn strategy(&self) -> Strategy;

    /// Produces the candidate code for `seed`.
    fn generate(&self, seed: u64) -> String;
}

/// Samples `length` characters from [`ALPHABET`] using an RNG seeded with `seed`.
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    /// Creates a generator; `length` is clamped into the code policy range.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH),
        }
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Random
    }

    fn generate(&self, seed: u64) -> String {
        let mut rng = StdRng::seed_from_u64(seed);

        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Encodes a counter value in base62, left-padded with `0` to a fixed length.
///
/// Values beyond the code space of the configured length wrap around; the
/// resulting collisions are resolved by the allocator like any other.
#[derive(Debug, Clone)]
pub struct SequenceCodeGenerator {
    length: usize,
    capacity: u64,
}

impl SequenceCodeGenerator {
    /// Creates a generator; `length` is clamped into the code policy range.
    pub fn new(length: usize) -> Self {
        let length = length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH);
        Self {
            length,
            capacity: 62u64.pow(length as u32),
        }
    }
}

impl CodeGenerator for SequenceCodeGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Sequence
    }

    fn generate(&self, seed: u64) -> String {
        let encoded = encode_base62(seed % self.capacity);
        format!("{:0>width$}", encoded, width = self.length)
    }
}

/// Builds the generator for a configured strategy.
pub fn build_generator(strategy: Strategy, length: usize) -> Arc<dyn CodeGenerator> {
    match strategy {
        Strategy::Random => Arc::new(RandomCodeGenerator::new(length)),
        Strategy::Sequence => Arc::new(SequenceCodeGenerator::new(length)),
    }
}

/// Encodes `n` in base62 without padding.
pub fn encode_base62(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut buf = Vec::with_capacity(11);
    while n > 0 {
        buf.push(ALPHABET[(n % 62) as usize]);
        n /= 62;
    }
    buf.reverse();

    String::from_utf8(buf).unwrap_or_default()
}

/// Returns true if `code` satisfies the alphabet and length policy.
///
/// The check accepts every policy length so that links created under a
/// different `CODE_LENGTH` keep resolving.
pub fn is_valid_code(code: &str) -> bool {
    (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Returns true if `code` is reserved for system routes.
pub fn is_reserved(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_is_base62_and_unique() {
        let unique: HashSet<_> = ALPHABET.iter().collect();
        assert_eq!(unique.len(), 62);
        assert!(ALPHABET.iter().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_generator_has_configured_length() {
        for length in MIN_CODE_LENGTH..=MAX_CODE_LENGTH {
            let generator = RandomCodeGenerator::new(length);
            let code = generator.generate(42);
            assert_eq!(code.len(), length);
            assert!(is_valid_code(&code));
        }
    }

    #[test]
    fn test_random_generator_is_deterministic_per_seed() {
        let generator = RandomCodeGenerator::new(7);
        assert_eq!(generator.generate(1234), generator.generate(1234));
        assert_ne!(generator.generate(1234), generator.generate(1235));
    }

    #[test]
    fn test_random_generator_spreads_codes() {
        let generator = RandomCodeGenerator::new(7);
        let codes: HashSet<_> = (0..1000u64).map(|seed| generator.generate(seed)).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_length_is_clamped_to_policy() {
        assert_eq!(RandomCodeGenerator::new(2).generate(1).len(), MIN_CODE_LENGTH);
        assert_eq!(RandomCodeGenerator::new(40).generate(1).len(), MAX_CODE_LENGTH);
        assert_eq!(SequenceCodeGenerator::new(0).generate(1).len(), MIN_CODE_LENGTH);
    }

    #[test]
    fn test_sequence_generator_pads_and_encodes() {
        let generator = SequenceCodeGenerator::new(6);
        assert_eq!(generator.generate(0), "000000");
        assert_eq!(generator.generate(1), "000001");
        assert_eq!(generator.generate(61), "00000z");
        assert_eq!(generator.generate(62), "000010");
    }

    #[test]
    fn test_sequence_generator_is_collision_free_for_distinct_seeds() {
        let generator = SequenceCodeGenerator::new(6);
        let codes: HashSet<_> = (1..5000u64).map(|seed| generator.generate(seed)).collect();
        assert_eq!(codes.len(), 4999);
    }

    #[test]
    fn test_sequence_generator_wraps_within_policy() {
        let generator = SequenceCodeGenerator::new(6);
        let capacity = 62u64.pow(6);

        let code = generator.generate(u64::MAX);
        assert!(is_valid_code(&code));
        assert_eq!(generator.generate(capacity + 5), generator.generate(5));
    }

    #[test]
    fn test_encode_base62() {
        assert_eq!(encode_base62(0), "0");
        assert_eq!(encode_base62(61), "z");
        assert_eq!(encode_base62(62), "10");
        assert_eq!(encode_base62(3843), "zz");
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("abc123"));
        assert!(is_valid_code("AbC12345"));
        assert!(!is_valid_code("abc12"));
        assert!(!is_valid_code("abc123456"));
        assert!(!is_valid_code("abc-123"));
        assert!(!is_valid_code("abc_123"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn test_reserved_codes() {
        assert!(is_reserved("health"));
        assert!(is_reserved("static"));
        assert!(!is_reserved("abc123"));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("random".parse::<Strategy>().unwrap(), Strategy::Random);
        assert_eq!("SEQUENCE".parse::<Strategy>().unwrap(), Strategy::Sequence);
        assert!("snowflake".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Sequence.to_string(), "sequence");
    }

    #[test]
    fn test_build_generator_picks_strategy() {
        assert_eq!(build_generator(Strategy::Random, 7).strategy(), Strategy::Random);
        assert_eq!(
            build_generator(Strategy::Sequence, 7).strategy(),
            Strategy::Sequence
        );
    }
}
