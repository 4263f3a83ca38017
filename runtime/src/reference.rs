//! Booking reference generation.

use boxoffice_core::BookingReference;
use boxoffice_core::environment::ReferenceGenerator;
use rand::Rng;

/// Prefix of every booking reference.
pub const REFERENCE_PREFIX: &str = "TKT-";

/// Characters after the prefix. Excludes `0 O 1 I` so references can be read
/// back over the phone.
pub const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of random characters after the prefix.
pub const REFERENCE_LENGTH: usize = 8;

/// Draws references from the thread-local RNG.
///
/// With 32^8 possible suffixes collisions are rare but possible; the ledger's
/// unique constraint catches them and the booking engine retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReferenceGenerator;

impl ReferenceGenerator for RandomReferenceGenerator {
    fn next_reference(&self) -> BookingReference {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..REFERENCE_LENGTH)
            .map(|_| char::from(REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())]))
            .collect();
        BookingReference::new(format!("{REFERENCE_PREFIX}{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn references_have_prefix_and_alphabet() {
        let reference = RandomReferenceGenerator.next_reference();
        let suffix = reference
            .as_str()
            .strip_prefix(REFERENCE_PREFIX)
            .unwrap_or_default();

        assert_eq!(suffix.len(), REFERENCE_LENGTH);
        assert!(suffix.bytes().all(|b| REFERENCE_ALPHABET.contains(&b)));
    }

    #[test]
    fn consecutive_references_differ() {
        let references: HashSet<_> = (0..200)
            .map(|_| RandomReferenceGenerator.next_reference())
            .collect();
        assert!(references.len() > 190);
    }
}
