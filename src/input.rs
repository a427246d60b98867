use std::io::{self, BufRead};

/// Represents a line of text read from the child.
pub struct Line<'a> {
    /// The full line, including the line terminator.
    full: &'a [u8],
    /// The content of the line, excluding `\n` or `\r\n`.
    content: &'a [u8],
}

impl<'a> Line<'a> {
    /// Create a new Line from a byte slice, expected to be a complete line.
    #[inline]
    pub fn new(full: &'a [u8]) -> Line<'a> {
        let mut content = full;
        if let Some(rest) = content.strip_suffix(b"\n") {
            content = rest;
            if let Some(rest) = content.strip_suffix(b"\r") {
                content = rest;
            }
        }
        Line { full, content }
    }

    /// Get the full line, including the line terminator if present.
    #[inline]
    pub fn full(&self) -> &'a [u8] {
        self.full
    }

    /// Get the content of the line, excluding the line terminator.
    #[inline]
    pub fn content(&self) -> &'a [u8] {
        self.content
    }
}

/// Reads lines one at a time from a buffered stream.
pub struct LineReader<R> {
    rdr: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(rdr: R) -> Self {
        Self {
            rdr,
            buf: Vec::with_capacity(1024),
        }
    }

    /// Process each byte line from the input.
    ///
    /// The provided function is called for each line, including a final line
    /// with no terminator. If it returns `Ok(true)`, processing continues. If
    /// it returns `Ok(false)`, processing stops. Errors from either the
    /// stream or the callback stop processing and are returned.
    pub fn for_byte_line<F>(&mut self, mut f: F) -> io::Result<()>
    where
        F: FnMut(Line<'_>) -> io::Result<bool>,
    {
        loop {
            self.buf.clear();
            let n = self.rdr.read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                break;
            }
            if !f(Line::new(&self.buf))? {
                break;
            }
        }
        Ok(())
    }
}
