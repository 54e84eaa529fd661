use sha2::{Sha256, Digest};

/// Hex SHA-256 of a digit string, logged and reported alongside the output file.
pub fn digest_digits(digits: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(digits.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}
