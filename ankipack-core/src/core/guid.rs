//! Content-derived note identity.
//!
//! Anki deduplicates imported notes by guid, so a note regenerated from the
//! same field values must always receive the same guid. The encoding here is
//! the one Anki's own tooling uses: a base-91 rendering of the leading eight
//! bytes of a SHA-256 digest.

use sha2::{Digest, Sha256};

/// Separator placed between field values before hashing.
pub const GUID_FIELD_SEPARATOR: &str = "__";

/// The 91-character base-91 alphabet, in digit order.
const BASE91_ALPHABET: &[u8; 91] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Computes the stable guid for a note with the given field values.
///
/// Identical field lists always produce identical guids. If the leading
/// eight digest bytes are all zero the result is the empty string; this
/// matches the reference encoding and is left as is.
pub fn guid_for<S: AsRef<str>>(fields: &[S]) -> String {
    let joined = fields
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(GUID_FIELD_SEPARATOR);
    let digest = Sha256::digest(joined.as_bytes());

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    base91(u64::from_be_bytes(prefix))
}

fn base91(mut value: u64) -> String {
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE91_ALPHABET[(value % 91) as usize]);
        value /= 91;
    }
    digits.reverse();
    // The alphabet is pure ASCII.
    digits.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for b in BASE91_ALPHABET {
            assert!(seen.insert(b), "duplicate alphabet char {}", *b as char);
        }
    }

    #[test]
    fn test_guid_is_deterministic() {
        assert_eq!(guid_for(&["a", "b"]), guid_for(&["a", "b"]));
        assert_ne!(guid_for(&["a", "b"]), guid_for(&["a", "c"]));
    }

    #[test]
    fn test_guid_known_values() {
        assert_eq!(guid_for(&["a", "b"]), "q/([o$8RAO");
        assert_eq!(guid_for(&["a", "c"]), "fl&a202|y!");
        assert_eq!(guid_for(&["Capital of France", "Paris"]), "hzBi7&,JaT");
        assert_eq!(guid_for(&[""]), "ME_YHw2?15");
    }

    #[test]
    fn test_guid_accepts_owned_strings() {
        let fields = vec!["a".to_string(), "b".to_string()];
        assert_eq!(guid_for(&fields), guid_for(&["a", "b"]));
    }

    #[test]
    fn test_base91_zero_is_empty() {
        assert_eq!(base91(0), "");
        assert_eq!(base91(90), "~");
        assert_eq!(base91(91), "ba");
    }
}
