//! Bounded line reader
//!
//! Reads newline-delimited lines of at most `max_len` bytes. Input longer than
//! the bound is cut at the bound and the remaining bytes come back as the next
//! line; pieces are never reassembled.

use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

pub struct LineReader<R> {
    inner: BufReader<R>,
    max_len: usize,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_len: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_len: max_len.max(1),
            buf: Vec::with_capacity(max_len.max(1)),
        }
    }

    /// Next line with its `\n` or `\r\n` stripped, or `None` at EOF.
    ///
    /// Invalid UTF-8 (including a character split by the bound) is replaced
    /// with U+FFFD.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();

        let n = (&mut self.inner)
            .take(self.max_len as u64)
            .read_until(b'\n', &mut self.buf)
            .await?;
        if n == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
