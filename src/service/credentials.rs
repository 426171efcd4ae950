//! Password digests, registration input checks and session tokens.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::db::PasswordDigest;

const PASSWORD_SPECIALS: &str = "@$!%*?&";
const PASSWORD_MIN_LEN: usize = 8;

/// `local@domain.tld`: no whitespace, one `@`, dot-separated non-empty domain labels.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("Invalid email regex pattern")
});

/// Salted SHA-256 of a password.
fn hash_password(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

/// Digest a password under a fresh random salt.
pub fn digest_password(password: &str) -> PasswordDigest {
    let salt = uuid::Uuid::new_v4().into_bytes().to_vec();
    PasswordDigest {
        hash: hash_password(password, &salt),
        salt,
    }
}

/// Whether `password` matches the stored digest.
pub fn verify_password(password: &str, digest: &PasswordDigest) -> bool {
    digests_match(&hash_password(password, &digest.salt), &digest.hash)
}

/// Byte comparison whose running time depends only on the lengths.
fn digests_match(computed: &[u8], stored: &[u8]) -> bool {
    if computed.len() != stored.len() {
        return false;
    }
    computed
        .iter()
        .zip(stored)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Opaque bearer token for a new session.
pub fn new_session_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// At least eight characters drawn from letters, digits and `@$!%*?&`, with
/// one of each of: lowercase, uppercase, digit, special.
pub fn is_strong_password(password: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);

    password.chars().count() >= PASSWORD_MIN_LEN
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}
