//! Streaming decrypt engine.

use std::io::{self, Read, Seek, SeekFrom};

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{Key, XChaCha20, XNonce};
use secrecy::SecretString;

use super::header::Header;
use super::kdf::derive_stream_keys;
use super::{HEADER_SIZE, TAG_SIZE};
use crate::error::{CodecError, CodecResult};

/// Decrypting wrapper around a seekable container source, positioned just
/// past the 4-byte version tag.
///
/// `new` runs the open protocol: parse the header, locate the trailing tag
/// via seek-to-end, read it, seek back to the body, and derive the keys.
/// Reads then stream-decrypt the body while the keyed MAC replays the bytes
/// it was fed at encryption time (header, then ciphertext); once the body is
/// exhausted the finalized MAC is compared against the stored tag.
///
/// Disclosure contract: plaintext is released incrementally, *before* the
/// whole-stream tag check can complete. An authentication failure surfaces
/// as the stream's terminal read error, and every byte consumed before that
/// error must be discarded — callers must not persist any output until the
/// stream ends cleanly. A wrong password is indistinguishable from
/// corruption or tampering.
pub struct DecryptReader<R> {
    source: R,
    cipher: XChaCha20,
    mac: blake3::Hasher,
    /// Ciphertext bytes left in the body.
    remaining: u64,
    expected_tag: [u8; TAG_SIZE],
    verified: bool,
}

impl<R: Read + Seek> DecryptReader<R> {
    pub fn new(mut source: R, password: &SecretString) -> CodecResult<Self> {
        let header_start = source.stream_position()?;
        let total = source.seek(SeekFrom::End(0))?;

        let min = header_start + (HEADER_SIZE + TAG_SIZE) as u64;
        if total < min {
            return Err(CodecError::TruncatedContainer { len: total, min });
        }
        let body_len = total - min;

        let mut expected_tag = [0u8; TAG_SIZE];
        source.seek(SeekFrom::Start(total - TAG_SIZE as u64))?;
        source.read_exact(&mut expected_tag)?;

        let mut header_bytes = [0u8; HEADER_SIZE];
        source.seek(SeekFrom::Start(header_start))?;
        source.read_exact(&mut header_bytes)?;
        let header = Header::parse(&header_bytes);

        let keys = derive_stream_keys(password, &header.salt, &header.kdf)?;
        let cipher = XChaCha20::new(
            Key::from_slice(keys.cipher_key()),
            XNonce::from_slice(&header.nonce),
        );
        let mut mac = blake3::Hasher::new_keyed(keys.mac_key());
        mac.update(&header_bytes);

        // Source is now positioned at the first body byte.
        Ok(Self {
            source,
            cipher,
            mac,
            remaining: body_len,
            expected_tag,
            verified: false,
        })
    }

    /// Terminal check: all body bytes have streamed through the MAC.
    fn verify(&mut self) -> io::Result<()> {
        if !self.verified {
            if self.mac.finalize() != blake3::Hash::from(self.expected_tag) {
                return Err(CodecError::AuthenticationFailed.into());
            }
            self.verified = true;
        }
        Ok(())
    }
}

impl<R: Read + Seek> Read for DecryptReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            self.verify()?;
            return Ok(0);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(self.remaining) as usize;
        let n = self.source.read(&mut buf[..want])?;
        if n == 0 {
            // The open protocol sized the body from the source's length, so
            // this only happens if the source shrank after open.
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "container body ended before its framed length",
            ));
        }
        self.mac.update(&buf[..n]);
        self.cipher.apply_keystream(&mut buf[..n]);
        self.remaining -= n as u64;
        if self.remaining == 0 {
            // Fail closed: if the tag does not match, suppress the final
            // chunk as well instead of handing it out alongside the error.
            self.verify()?;
        }
        Ok(n)
    }
}
