//! Version dispatch for the container codec.
//!
//! Every container starts with a 4-byte little-endian version tag. The tag
//! selects an entry in [`CODECS`], a static table of
//! `{ encrypt, decrypt, fingerprint }` function triples. The table is built
//! at compile time and never mutated, so concurrent lookups need no
//! synchronization. An unregistered tag is a typed error
//! ([`CodecError::UnknownVersion`]), never a panic.

use std::fmt;
use std::io::{Cursor, Read, Seek};

use digest::DynDigest;
use secrecy::SecretString;

use crate::error::{CodecError, CodecResult};
use crate::ioutil::read_full;
use crate::v1;

/// Codec format identifier, stored little-endian in the container's first
/// four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version(pub u32);

impl Version {
    pub const V1: Version = Version(0);

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Version(u32::from_le_bytes(bytes))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version used for all newly encrypted containers.
pub const PREFERRED_VERSION: Version = Version::V1;

/// Width of the version tag preceding every header.
pub const VERSION_TAG_SIZE: usize = 4;

/// Leading bytes of any container, across all registered versions, that are
/// sufficient to parse a header for fingerprinting without touching the body.
pub const MAX_HEADER_SIZE: usize = v1::HEADER_SIZE + VERSION_TAG_SIZE;

/// Total bytes the preferred version adds beyond the plaintext length.
pub const OVERHEAD: usize = v1::OVERHEAD + VERSION_TAG_SIZE;

/// A readable, seekable source. Decryption must locate the trailing tag
/// before any plaintext streams out, so a pure forward stream is not enough.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

type EncrypterFn = fn(Box<dyn Read>, &SecretString) -> CodecResult<Box<dyn Read>>;
type DecrypterFn = fn(Box<dyn ReadSeek>, &SecretString) -> CodecResult<Box<dyn Read>>;
type FingerprinterFn =
    fn(&mut dyn Read, &mut dyn Read, &SecretString, &mut dyn DynDigest) -> CodecResult<Vec<u8>>;

struct Codec {
    encrypt: EncrypterFn,
    decrypt: DecrypterFn,
    fingerprint: FingerprinterFn,
}

static CODECS: &[(Version, Codec)] = &[(
    Version::V1,
    Codec {
        encrypt: v1::new_encrypt_reader,
        decrypt: v1::new_decrypt_reader,
        fingerprint: v1::fingerprint,
    },
)];

fn lookup(version: Version) -> Option<&'static Codec> {
    CODECS.iter().find(|(v, _)| *v == version).map(|(_, c)| c)
}

/// Wrap `source` in an encrypting stream using [`PREFERRED_VERSION`].
///
/// Draining the returned reader yields the complete container:
/// version tag, header, ciphertext, trailing tag.
pub fn new_encrypter<R: Read + 'static>(
    source: R,
    password: &SecretString,
) -> CodecResult<Box<dyn Read>> {
    let codec = lookup(PREFERRED_VERSION)
        .ok_or(CodecError::PreferredVersionUnavailable(PREFERRED_VERSION))?;
    let inner = (codec.encrypt)(Box::new(source), password)?;
    let tag = Cursor::new(PREFERRED_VERSION.to_le_bytes().to_vec());
    Ok(Box::new(tag.chain(inner)))
}

/// Wrap `source` in a decrypting stream, dispatching on the version tag in
/// its first four bytes.
///
/// The returned reader releases plaintext incrementally and authenticates
/// the whole stream against the trailing tag; see
/// [`v1::DecryptReader`](crate::v1::DecryptReader) for the disclosure
/// contract.
pub fn new_decrypter<R: Read + Seek + 'static>(
    mut source: R,
    password: &SecretString,
) -> CodecResult<Box<dyn Read>> {
    let version = read_version(&mut source)?;
    let codec = lookup(version).ok_or(CodecError::UnknownVersion(version.0))?;
    (codec.decrypt)(Box::new(source), password)
}

/// Fingerprint a candidate plaintext against a container's leading bytes.
///
/// `header_fragment` must supply at least [`MAX_HEADER_SIZE`] bytes of the
/// container. The version tag is teed into `hasher` as it is parsed, so the
/// tag itself contributes to the result; the dispatched codec then feeds the
/// header bytes and a password-bound transform of `candidate` into the same
/// accumulator. The finalized digest equals `hasher` run over the real
/// container minus its trailing tag whenever the candidate plaintext and
/// password match.
pub fn fingerprint<P: Read, H: Read>(
    candidate: &mut P,
    header_fragment: &mut H,
    password: &SecretString,
    hasher: &mut dyn DynDigest,
) -> CodecResult<Vec<u8>> {
    let mut tag = [0u8; VERSION_TAG_SIZE];
    let n = read_full(header_fragment, &mut tag)?;
    if n < VERSION_TAG_SIZE {
        return Err(CodecError::TruncatedContainer {
            len: n as u64,
            min: MAX_HEADER_SIZE as u64,
        });
    }
    hasher.update(&tag);
    let version = Version::from_le_bytes(tag);
    let codec = lookup(version).ok_or(CodecError::UnknownVersion(version.0))?;
    (codec.fingerprint)(candidate, header_fragment, password, hasher)
}

fn read_version(source: &mut dyn Read) -> CodecResult<Version> {
    let mut tag = [0u8; VERSION_TAG_SIZE];
    let n = read_full(source, &mut tag)?;
    if n < VERSION_TAG_SIZE {
        return Err(CodecError::TruncatedContainer {
            len: n as u64,
            min: OVERHEAD as u64,
        });
    }
    Ok(Version::from_le_bytes(tag))
}
