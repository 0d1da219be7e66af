//! V1 header: the public, non-secret framing metadata.

use rand::RngCore;

use super::kdf::KdfParams;
use super::{HEADER_SIZE, KDF_PARAMS_SIZE, NONCE_SIZE, SALT_SIZE};

/// Parsed V1 header. Fully recoverable from the [`HEADER_SIZE`] bytes that
/// follow the version tag; contains nothing secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub kdf: KdfParams,
}

impl Header {
    /// Generate a fresh header with a cryptographically random salt and
    /// nonce. Called once per encryption; salt/nonce pairs are never reused.
    pub fn generate(kdf: KdfParams) -> Self {
        let mut salt = [0u8; SALT_SIZE];
        let mut nonce = [0u8; NONCE_SIZE];
        let mut rng = rand::thread_rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);
        Self { salt, nonce, kdf }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..SALT_SIZE].copy_from_slice(&self.salt);
        out[SALT_SIZE..SALT_SIZE + NONCE_SIZE].copy_from_slice(&self.nonce);
        out[SALT_SIZE + NONCE_SIZE..].copy_from_slice(&self.kdf.encode());
        out
    }

    /// Parse a header from its wire form. Structurally infallible; cost
    /// parameter validation happens at key derivation, where out-of-range
    /// values surface as `KeyDerivation` errors.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut salt = [0u8; SALT_SIZE];
        let mut nonce = [0u8; NONCE_SIZE];
        let mut params = [0u8; KDF_PARAMS_SIZE];
        salt.copy_from_slice(&bytes[..SALT_SIZE]);
        nonce.copy_from_slice(&bytes[SALT_SIZE..SALT_SIZE + NONCE_SIZE]);
        params.copy_from_slice(&bytes[SALT_SIZE + NONCE_SIZE..]);
        Self {
            salt,
            nonce,
            kdf: KdfParams::decode(&params),
        }
    }
}
