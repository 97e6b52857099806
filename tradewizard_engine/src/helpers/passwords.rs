//! Salted password digests.
//!
//! Stored credentials have the form `salt$digest`, where both parts are lowercase hex and the digest is
//! `Blake2b512(salt_bytes || password_bytes)`. Verification recomputes the digest with the stored salt and
//! compares in constant time.

use blake2::{Blake2b512, Digest};
use rand::RngCore;

const SALT_LEN: usize = 16;

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", hex_encode(&salt), hex_encode(&digest(&salt, password)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = hex_decode(salt_hex) else {
        return false;
    };
    let Some(expected) = hex_decode(digest_hex) else {
        return false;
    };
    let actual = digest(&salt, password);
    // Constant-time comparison over the full digest length.
    if expected.len() != actual.len() {
        return false;
    }
    expected.iter().zip(actual.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Blake2b512::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_stored_values_never_verify() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "nodollar"));
        assert!(!verify_password("pw", "nothex$nothex"));
    }
}
