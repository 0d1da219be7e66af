//! Streaming encrypt engine.

use std::io::{self, Read};

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{Key, XChaCha20, XNonce};
use secrecy::SecretString;

use super::header::Header;
use super::kdf::{derive_stream_keys, KdfParams};
use crate::error::CodecResult;

/// Encrypting wrapper around a forward-only plaintext source.
///
/// Draining the reader yields `header ∥ ciphertext ∥ tag`. Plaintext is read
/// directly into the caller's buffer, encrypted in place, and fed to the
/// keyed MAC, so nothing beyond the header and the deferred 32-byte tag is
/// ever buffered. The tag is finalized and emitted only after the source
/// reports end-of-input; a source read error propagates immediately and no
/// partial tag is ever produced.
pub struct EncryptReader<R> {
    source: R,
    cipher: XChaCha20,
    mac: blake3::Hasher,
    /// Queued output: the header at construction, the tag after EOF.
    pending: Vec<u8>,
    pending_pos: usize,
    source_done: bool,
    finished: bool,
}

impl<R: Read> EncryptReader<R> {
    /// Create an encrypting reader with the default Argon2id cost
    /// parameters. Generates a fresh salt/nonce pair and derives the keys
    /// eagerly, so KDF failures surface here rather than mid-stream.
    pub fn new(source: R, password: &SecretString) -> CodecResult<Self> {
        Self::with_params(source, password, KdfParams::default())
    }

    pub fn with_params(source: R, password: &SecretString, kdf: KdfParams) -> CodecResult<Self> {
        let header = Header::generate(kdf);
        let keys = derive_stream_keys(password, &header.salt, &header.kdf)?;
        let cipher = XChaCha20::new(
            Key::from_slice(keys.cipher_key()),
            XNonce::from_slice(&header.nonce),
        );
        let mut mac = blake3::Hasher::new_keyed(keys.mac_key());

        let encoded = header.encode();
        mac.update(&encoded);

        Ok(Self {
            source,
            cipher,
            mac,
            pending: encoded.to_vec(),
            pending_pos: 0,
            source_done: false,
            finished: false,
        })
    }
}

impl<R: Read> Read for EncryptReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.pending_pos < self.pending.len() {
                let n = buf.len().min(self.pending.len() - self.pending_pos);
                buf[..n].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                self.pending_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            if self.source_done {
                self.pending = self.mac.finalize().as_bytes().to_vec();
                self.pending_pos = 0;
                self.finished = true;
                continue;
            }
            let n = self.source.read(buf)?;
            if n == 0 {
                self.source_done = true;
                continue;
            }
            self.cipher.apply_keystream(&mut buf[..n]);
            self.mac.update(&buf[..n]);
            return Ok(n);
        }
    }
}
