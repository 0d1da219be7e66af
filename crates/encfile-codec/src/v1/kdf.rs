//! Key derivation: Argon2id(password, salt) → master key, HKDF-SHA256 →
//! independent cipher and MAC keys.

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use super::{KDF_PARAMS_SIZE, KEY_SIZE, SALT_SIZE};
use crate::error::{CodecError, CodecResult};

const CIPHER_INFO: &[u8] = b"encfile-v1 cipher";
const MAC_INFO: &[u8] = b"encfile-v1 mac";

/// Argon2id cost parameters, stored in the clear in the V1 header so
/// decryption can rederive the key without out-of-band configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    pub fn encode(&self) -> [u8; KDF_PARAMS_SIZE] {
        let mut out = [0u8; KDF_PARAMS_SIZE];
        out[..4].copy_from_slice(&self.mem_cost_kib.to_le_bytes());
        out[4..8].copy_from_slice(&self.time_cost.to_le_bytes());
        out[8..].copy_from_slice(&self.parallelism.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8; KDF_PARAMS_SIZE]) -> Self {
        Self {
            mem_cost_kib: u32::from_le_bytes(bytes[..4].try_into().unwrap()),
            time_cost: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            parallelism: u32::from_le_bytes(bytes[8..].try_into().unwrap()),
        }
    }
}

/// Call-local key material for one encrypt/decrypt/fingerprint pass.
///
/// Never persisted or cached; zeroized on drop.
pub(crate) struct StreamKeys {
    cipher_key: [u8; KEY_SIZE],
    mac_key: [u8; KEY_SIZE],
}

impl StreamKeys {
    pub(crate) fn cipher_key(&self) -> &[u8; KEY_SIZE] {
        &self.cipher_key
    }

    pub(crate) fn mac_key(&self) -> &[u8; KEY_SIZE] {
        &self.mac_key
    }
}

impl Drop for StreamKeys {
    fn drop(&mut self) {
        self.cipher_key.zeroize();
        self.mac_key.zeroize();
    }
}

impl std::fmt::Debug for StreamKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamKeys")
            .field("cipher_key", &"[REDACTED]")
            .field("mac_key", &"[REDACTED]")
            .finish()
    }
}

/// Derive the cipher and MAC keys for one streaming pass.
pub(crate) fn derive_stream_keys(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> CodecResult<StreamKeys> {
    let argon_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CodecError::KeyDerivation(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut master = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.expose_secret().as_bytes(), salt, &mut master)
        .map_err(|e| {
            master.zeroize();
            CodecError::KeyDerivation(format!("Argon2id KDF failed: {e}"))
        })?;

    let hkdf = Hkdf::<Sha256>::new(None, &master);
    let mut cipher_key = [0u8; KEY_SIZE];
    let mut mac_key = [0u8; KEY_SIZE];
    let expanded = hkdf
        .expand(CIPHER_INFO, &mut cipher_key)
        .and_then(|_| hkdf.expand(MAC_INFO, &mut mac_key));
    master.zeroize();
    expanded.map_err(|e| {
        cipher_key.zeroize();
        mac_key.zeroize();
        CodecError::KeyDerivation(format!("HKDF expand failed: {e}"))
    })?;

    Ok(StreamKeys {
        cipher_key,
        mac_key,
    })
}

/// Cheap Argon2id parameters for unit tests.
#[cfg(test)]
pub(crate) fn fast_params() -> KdfParams {
    KdfParams {
        mem_cost_kib: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}
