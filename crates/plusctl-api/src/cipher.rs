// Password obfuscation as implemented by the switch firmware's login.js.
//
// The scheme is MD5 over an interleave of the password and a per-session
// seed served by the login page. It is not cryptographically meaningful;
// the firmware is the verifier, so the transform must match byte-for-byte.
// Do not substitute a stronger hash.

use md5::{Digest, Md5};

/// Interleave two strings byte-by-byte: `a[0] b[0] a[1] b[1] ...`,
/// continuing with the remaining tail once the shorter one runs out.
fn merge(password: &str, seed: &str) -> Vec<u8> {
    let pw = password.as_bytes();
    let sd = seed.as_bytes();
    let mut out = Vec::with_capacity(pw.len() + sd.len());
    for i in 0..pw.len().max(sd.len()) {
        if let Some(b) = pw.get(i) {
            out.push(*b);
        }
        if let Some(b) = sd.get(i) {
            out.push(*b);
        }
    }
    out
}

/// Obfuscate `password` with the login page's `seed`, producing the digest
/// the login form expects in place of the plaintext password.
///
/// Deterministic and order-sensitive: swapping the arguments generally
/// yields a different digest.
pub fn encrypt_password(password: &str, seed: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(merge(password, seed));
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(32);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_interleaves_with_longer_seed() {
        assert_eq!(merge("ab", "1234"), b"a1b234");
    }

    #[test]
    fn merge_interleaves_with_longer_password() {
        assert_eq!(merge("abcd", "1"), b"a1bcd");
    }

    #[test]
    fn merge_of_empty_inputs_is_empty() {
        assert_eq!(merge("", ""), b"");
    }

    #[test]
    fn empty_inputs_hash_to_md5_of_empty_string() {
        assert_eq!(encrypt_password("", ""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn encryption_is_deterministic() {
        let a = encrypt_password("secret", "1234567890");
        let b = encrypt_password("secret", "1234567890");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn argument_order_matters() {
        assert_ne!(
            encrypt_password("secret", "1234567890"),
            encrypt_password("1234567890", "secret"),
        );
    }
}
