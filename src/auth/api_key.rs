//! API keys are random URL-safe strings. Only their SHA-256 digest is stored,
//! together with a short prefix so a user can tell keys apart.

use rand::Rng;
use sha2::{Digest, Sha256};

const KEY_LENGTH: usize = 43;
const PREFIX_LENGTH: usize = 8;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub struct GeneratedKey {
    pub plaintext: String,
    pub hash: String,
    pub prefix: String,
}

pub fn generate_api_key() -> GeneratedKey {
    let mut rng = rand::thread_rng();
    let plaintext: String = (0..KEY_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    GeneratedKey {
        hash: hash_api_key(&plaintext),
        prefix: plaintext[..PREFIX_LENGTH].to_string(),
        plaintext,
    }
}

pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// The key is the second space-separated word of the header, whatever the
/// scheme in front of it.
pub fn key_from_authorization(header: &str) -> Option<&str> {
    header.split(' ').nth(1).filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_shape() {
        let key = generate_api_key();
        assert_eq!(key.plaintext.len(), KEY_LENGTH);
        assert!(key.plaintext.bytes().all(|b| CHARSET.contains(&b)));
        assert!(key.plaintext.starts_with(&key.prefix));
        assert_eq!(key.hash, hash_api_key(&key.plaintext));
        assert_eq!(key.hash.len(), 64);
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(generate_api_key().plaintext, generate_api_key().plaintext);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_key_from_authorization() {
        assert_eq!(key_from_authorization("Api-Key abc123"), Some("abc123"));
        assert_eq!(key_from_authorization("Bearer abc123"), Some("abc123"));
        assert_eq!(key_from_authorization("abc123"), None);
        assert_eq!(key_from_authorization("Token "), None);
    }
}
