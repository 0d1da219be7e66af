use std::io::{ErrorKind, Read};

/// Read until `buf` is full or the source is exhausted, returning the number
/// of bytes actually read. Unlike `read_exact` a short read is not an error,
/// so callers can report how much framing was really present.
pub(crate) fn read_full(r: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
