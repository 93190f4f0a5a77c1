use rand::Rng;
use rand::RngCore;

/// Alphabet for anti-forgery state tokens: unambiguous, URL-safe.
const STATE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of an anti-forgery state token.
pub const STATE_TOKEN_LEN: usize = 32;

/// Generate an anti-forgery state token for the login callback.
pub fn generate_state_token() -> String {
    let mut rng = rand::thread_rng();
    (0..STATE_TOKEN_LEN)
        .map(|_| STATE_ALPHABET[rng.gen_range(0..STATE_ALPHABET.len())] as char)
        .collect()
}

/// Generate an opaque visitor session id (64 hex characters).
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
