use thiserror::Error;

use crate::registry::Version;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The container's version tag matched no registered codec.
    #[error("unknown container version {0}")]
    UnknownVersion(u32),

    /// The preferred version is missing from the codec table. This is a
    /// build configuration error, not a property of the input.
    #[error("preferred codec version {0} is not registered")]
    PreferredVersionUnavailable(Version),

    /// The source ended before the fixed framing (header + tag) could fit.
    #[error("truncated container: {len} bytes, minimum {min}")]
    TruncatedContainer { len: u64, min: u64 },

    /// Whole-stream tag mismatch. Deliberately does not distinguish wrong
    /// password from corruption or tampering.
    #[error("authentication failed: wrong password or corrupted container")]
    AuthenticationFailed,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mid-stream failures surface through `Read::read` as `std::io::Error`.
/// The codec error stays downcastable via [`std::error::Error::source`] /
/// `get_ref`; an underlying I/O error passes through unwrapped.
impl From<CodecError> for std::io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
