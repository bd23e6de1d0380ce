//! Reads lines from stdin for the Feed phase (§4.4 phase 5, §6).

use std::io::{self, BufRead};

/// §4.1's line contract: no embedded newline, at most this many bytes.
pub const MAX_LINE_LEN: usize = 1024;

/// One line read from stdin, with its trailing newline already stripped.
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Reads one line. Returns `Ok(None)` at end of input, `Ok(Some(line))`
    /// with the trailing `\n` (and `\r`, if present) stripped, or an error
    /// if the underlying read fails or the line exceeds [`MAX_LINE_LEN`].
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.buf.clear();
        let read = self.inner.read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        if self.buf.len() > MAX_LINE_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {MAX_LINE_LEN} bytes"),
            ));
        }

        Ok(Some(std::mem::take(&mut self.buf)))
    }
}
