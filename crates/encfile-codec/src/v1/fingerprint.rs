//! Content-equivalence fingerprint.
//!
//! Lets a caller holding a local plaintext and the first
//! `MAX_HEADER_SIZE` bytes of a remote container decide whether the two
//! carry the same content, without downloading or decrypting the remote
//! body: the candidate plaintext is run through the same keystream the real
//! encryption used, and the caller's hash accumulates exactly the bytes of
//! the real container minus its trailing tag.

use std::io::Read;

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{Key, XChaCha20, XNonce};
use digest::DynDigest;
use secrecy::SecretString;

use super::header::Header;
use super::kdf::derive_stream_keys;
use super::HEADER_SIZE;
use crate::error::{CodecError, CodecResult};
use crate::ioutil::read_full;
use crate::registry::{MAX_HEADER_SIZE, VERSION_TAG_SIZE};

const FINGERPRINT_BUF_SIZE: usize = 64 * 1024;

/// Fingerprint `candidate` against a container's header.
///
/// `header_fragment` is positioned just past the version tag, which the
/// registry has already teed into `hasher`. The remaining header bytes are
/// fed to `hasher` as they are parsed, then the candidate plaintext is
/// encrypted under the header-derived keys and the resulting ciphertext fed
/// in as well. Deterministic for a fixed (header, password, plaintext)
/// triple; any change to the plaintext or password changes the result with
/// overwhelming probability. The output reveals nothing beyond the chosen
/// hash's preimage resistance.
pub(crate) fn fingerprint(
    candidate: &mut dyn Read,
    header_fragment: &mut dyn Read,
    password: &SecretString,
    hasher: &mut dyn DynDigest,
) -> CodecResult<Vec<u8>> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    let n = read_full(header_fragment, &mut header_bytes)?;
    if n < HEADER_SIZE {
        return Err(CodecError::TruncatedContainer {
            len: (VERSION_TAG_SIZE + n) as u64,
            min: MAX_HEADER_SIZE as u64,
        });
    }
    hasher.update(&header_bytes);
    let header = Header::parse(&header_bytes);

    let keys = derive_stream_keys(password, &header.salt, &header.kdf)?;
    let mut cipher = XChaCha20::new(
        Key::from_slice(keys.cipher_key()),
        XNonce::from_slice(&header.nonce),
    );

    let mut buf = vec![0u8; FINGERPRINT_BUF_SIZE];
    loop {
        let n = candidate.read(&mut buf)?;
        if n == 0 {
            break;
        }
        cipher.apply_keystream(&mut buf[..n]);
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize_reset().to_vec())
}
