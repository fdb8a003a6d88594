use std::fmt;

/// A fixed size byte string buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteStr<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> ByteStr<N> {
    pub fn new() -> Self {
        ByteStr { bytes: [0; N], len: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Only ASCII is ever written here, an empty string means a caller broke that.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    /// Append the given bytes, truncating once the buffer is full.
    pub fn extend_from_slice<T: AsRef<[u8]>>(&mut self, slice: T) {
        let bytes = slice.as_ref();
        let room = N - self.len;
        let take = bytes.len().min(room);

        self.bytes[self.len..self.len + take].copy_from_slice(&bytes[..take]);
        self.len += take;
    }
}

// Capture the output of `write!` into fixed size buffer.
impl<const N: usize> fmt::Write for ByteStr<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.extend_from_slice(s);
        Ok(())
    }
}
