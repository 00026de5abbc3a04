use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 32 random bytes, hex encoded. Embedded in impersonation links.
pub fn generate_impersonation_token() -> String {
    random_hex(32)
}

/// 16 random bytes, hex encoded. Delivered to the user, never stored.
pub fn generate_sign_in_code() -> String {
    random_hex(16)
}

/// SHA-256 of a sign-in code, hex encoded. This is what the store keeps.
pub fn hash_sign_in_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}
