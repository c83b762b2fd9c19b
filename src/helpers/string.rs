//! Secret storage helpers.
//!
//! The API key is kept in the config file as base64 of `[nonce (12 bytes)][ciphertext]`
//! produced by AES-256-GCM.

use crate::error::Error;
use aes_gcm::{
    Aes256Gcm,
    aead::{Aead, AeadCore, KeyInit, Nonce, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

type Result<T, E = Error> = std::result::Result<T, E>;

const NONCE_LEN: usize = 12;

/// Obfuscation key for secrets at rest.
///
/// WARNING: this only keeps the key out of casual view of the config file; anyone
/// with the binary can recover it.
const STORAGE_KEY: &[u8; 32] = b"CloudConnectPanelStorageKey2026!";

fn invalid(message: String) -> Error {
    Error::Invalid { message }
}

/// Encrypt `plain_text` with a fresh random nonce and encode it as base64.
pub fn encrypt(plain_text: &str) -> Result<String> {
    let cipher = Aes256Gcm::new(STORAGE_KEY.into());
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(&nonce, plain_text.as_bytes())
        .map_err(|e| invalid(format!("Encryption failed: {e}")))?;

    let mut combined = nonce.to_vec();
    combined.extend_from_slice(&sealed);
    Ok(BASE64.encode(combined))
}

/// Reverse of [`encrypt`]. Fails on anything that was not produced by it,
/// which callers use to detect plaintext values.
pub fn decrypt(cipher_text: &str) -> Result<String> {
    let data = BASE64
        .decode(cipher_text.trim())
        .map_err(|e| invalid(format!("Base64 decode failed: {e}")))?;
    if data.len() <= NONCE_LEN {
        return Err(invalid("Ciphertext too short".to_string()));
    }

    let (nonce, sealed) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(STORAGE_KEY.into());
    let plain = cipher
        .decrypt(Nonce::<Aes256Gcm>::from_slice(nonce), sealed)
        .map_err(|e| invalid(format!("Decryption failed: {e}")))?;

    String::from_utf8(plain).map_err(|e| invalid(format!("UTF-8 decode failed: {e}")))
}
