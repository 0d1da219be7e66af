//! encfile-codec: versioned streaming file-encryption container codec
//!
//! Container layout (offsets from start of file):
//! ```text
//! [0:4)              version   u32 little-endian
//! [4:4+HEADER_SIZE)  header    version-defined (V1: salt ∥ nonce ∥ kdf-params)
//! [.. : N-TAG_SIZE)  body      ciphertext, arbitrary length
//! [N-TAG_SIZE : N)   tag       version-defined fixed width
//! ```
//!
//! Three entry points, dispatched through a static version table:
//! [`new_encrypter`] wraps a forward-only plaintext source and yields the
//! full container as a stream; [`new_decrypter`] takes a seekable container
//! source and yields plaintext, authenticating the whole stream against the
//! trailing tag; [`fingerprint`] decides content-equivalence between a local
//! plaintext and a remote container from the container's leading
//! [`MAX_HEADER_SIZE`] bytes alone.

pub mod error;
mod ioutil;
pub mod registry;
pub mod v1;

pub use error::{CodecError, CodecResult};
pub use registry::{
    fingerprint, new_decrypter, new_encrypter, ReadSeek, Version, MAX_HEADER_SIZE, OVERHEAD,
    PREFERRED_VERSION,
};
