use hex::encode;
use sha2::{Digest, Sha256};

/// Checksum of a field's textual content, stored alongside the field so
/// duplicate detection can use an indexed equality probe instead of
/// comparing full values.
///
/// SHA-256 over the UTF-8 bytes, hex-encoded. Deterministic: the same text
/// always yields the same checksum.
pub fn field_checksum(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_deterministic() {
        assert_eq!(field_checksum("bonjour"), field_checksum("bonjour"));
    }

    #[test]
    fn test_checksum_distinguishes_content() {
        assert_ne!(field_checksum("bonjour"), field_checksum("bonjour "));
        assert_ne!(field_checksum(""), field_checksum("a"));
    }

    #[test]
    fn test_checksum_is_hex_encoded_sha256() {
        let sum = field_checksum("");
        assert_eq!(sum.len(), 64);
        assert!(sum.chars().all(|c| c.is_ascii_hexdigit()));
        // SHA-256 of the empty string is a well-known constant
        assert_eq!(
            sum,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
