use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate an opaque admin access token to return to the client.
/// We store only a hash(token) in DB for safety.
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash token for DB storage (SHA-256 hex). Also used for the configured
/// admin passkey, which is stored as its hash in ADMIN_PASSKEY_HASH.
pub fn hash_access_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let out = hasher.finalize();
    hex::encode(out)
}

/// Admin gate: the portal has no password accounts; dashboard access is a
/// single shared passkey whose hash lives in config.
pub fn verify_admin_passkey(passkey: &str, stored_hash: &str) -> bool {
    hash_access_token(passkey.trim()).eq_ignore_ascii_case(stored_hash.trim())
}
