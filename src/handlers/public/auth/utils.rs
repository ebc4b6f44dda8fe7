use sha2::{Digest, Sha256};

/// Salted password digest, hex-encoded.
pub fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(salt: &str, password: &str, digest: &str) -> bool {
    // Constant-time comparison to avoid leaking prefix matches
    let computed = password_digest(salt, password);
    computed.len() == digest.len()
        && computed
            .bytes()
            .zip(digest.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_per_salt() {
        let a = password_digest("salt1", "hunter2");
        let b = password_digest("salt1", "hunter2");
        let c = password_digest("salt2", "hunter2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn verify_accepts_correct_and_rejects_wrong_password() {
        let digest = password_digest("salt", "correct horse");
        assert!(verify_password("salt", "correct horse", &digest));
        assert!(!verify_password("salt", "battery staple", &digest));
        assert!(!verify_password("other", "correct horse", &digest));
    }
}
