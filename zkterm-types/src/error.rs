//! Errors raised while reading or building payload structures

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Value cannot be represented in the terminal's layout
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payload does not hold the expected structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Payload shorter than the structure it should carry
    #[error("{what}: expected {expected} bytes, got {actual}")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Fail with [`Error::Truncated`] unless `buf` holds at least `expected` bytes
pub(crate) fn ensure_len(what: &'static str, buf: &[u8], expected: usize) -> Result<()> {
    if buf.len() < expected {
        return Err(Error::Truncated {
            what,
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Read a NUL-padded ASCII field
pub(crate) fn ascii_field(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .replace('\0', "")
}

/// Write `value` into a fixed-width NUL-padded field
pub(crate) fn put_ascii_field(dst: &mut [u8], what: &'static str, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > dst.len() {
        return Err(Error::Validation(format!(
            "{} is {} bytes long, the field holds {}",
            what,
            bytes.len(),
            dst.len()
        )));
    }
    dst[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}
