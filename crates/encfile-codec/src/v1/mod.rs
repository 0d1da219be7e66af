//! V1 container format.
//!
//! Layout after the registry's 4-byte version tag:
//! ```text
//! [0:16)   salt        random per encryption
//! [16:40)  nonce       random per encryption (XChaCha20 IV)
//! [40:52)  kdf-params  mem_cost_kib ∥ time_cost ∥ parallelism, u32 LE each
//! [52:..)  ciphertext  XChaCha20 keystream XOR plaintext
//! [..]     tag         32-byte keyed BLAKE3, trailing
//! ```
//!
//! Key schedule: Argon2id(password, salt, kdf-params) → 32-byte master key,
//! HKDF-SHA256-expanded into independent cipher and MAC keys. The keyed MAC
//! runs over the 52 header bytes followed by every ciphertext byte in stream
//! order (encrypt-then-MAC), so tampering with the nonce or the KDF cost
//! parameters fails authentication even though neither changes the derived
//! MAC key. The version tag is not part of the keyed MAC: an altered tag
//! fails dispatch before key derivation.

mod decrypt;
mod encrypt;
mod fingerprint;
mod header;
mod kdf;

pub use decrypt::DecryptReader;
pub use encrypt::EncryptReader;
pub use header::Header;
pub use kdf::KdfParams;

use std::io::Read;

use digest::DynDigest;
use secrecy::SecretString;

use crate::error::CodecResult;
use crate::registry::ReadSeek;

/// Size of the random KDF salt.
pub const SALT_SIZE: usize = 16;

/// Size of the XChaCha20 nonce (192-bit).
pub const NONCE_SIZE: usize = 24;

/// Size of the encoded Argon2id cost parameters.
pub const KDF_PARAMS_SIZE: usize = 12;

/// Size of the V1 header: salt ∥ nonce ∥ kdf-params.
pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE + KDF_PARAMS_SIZE;

/// Size of the trailing keyed-BLAKE3 tag.
pub const TAG_SIZE: usize = 32;

/// Bytes V1 adds beyond the plaintext, excluding the registry's version tag.
pub const OVERHEAD: usize = HEADER_SIZE + TAG_SIZE;

/// Size of the derived cipher and MAC keys (256-bit).
pub const KEY_SIZE: usize = 32;

// Registry-facing constructors with the exact signatures the dispatch table
// stores.

pub(crate) fn new_encrypt_reader(
    source: Box<dyn Read>,
    password: &SecretString,
) -> CodecResult<Box<dyn Read>> {
    Ok(Box::new(EncryptReader::new(source, password)?))
}

pub(crate) fn new_decrypt_reader(
    source: Box<dyn ReadSeek>,
    password: &SecretString,
) -> CodecResult<Box<dyn Read>> {
    Ok(Box::new(DecryptReader::new(source, password)?))
}

pub(crate) fn fingerprint(
    candidate: &mut dyn Read,
    header_fragment: &mut dyn Read,
    password: &SecretString,
    hasher: &mut dyn DynDigest,
) -> CodecResult<Vec<u8>> {
    fingerprint::fingerprint(candidate, header_fragment, password, hasher)
}
