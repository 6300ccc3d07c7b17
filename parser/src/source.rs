//! A pull-based byte source with buffering and look-ahead.
//!
//! The parser state machine peeks element headers before committing to
//! them, so the source keeps an internal buffer which can be inspected
//! with [`ByteSource::peek`] and consumed with [`ByteSource::take`].

use std::io::Read;

const READ_SIZE: usize = 8192;

/// A buffered reader driven by the parser's demand.
#[derive(Debug)]
pub struct ByteSource<R> {
    inner: R,
    buffer: Vec<u8>,
    offset: usize,
    position: u64,
    closed: bool,
}

impl<R: Read> ByteSource<R> {
    /// Wrap the given reader.
    pub fn new(inner: R) -> Self {
        ByteSource {
            inner,
            buffer: Vec::new(),
            offset: 0,
            position: 0,
            closed: false,
        }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the upstream reader has reported end of stream.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The number of bytes currently buffered.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Fill the buffer until at least `n` bytes are available or the
    /// upstream closes. Returns whether `n` bytes are available.
    pub fn ensure(&mut self, n: usize) -> std::io::Result<bool> {
        if self.offset > 0 && self.remaining() < n {
            self.buffer.drain(..self.offset);
            self.offset = 0;
        }
        while self.remaining() < n && !self.closed {
            let len = self.buffer.len();
            self.buffer.resize(len + READ_SIZE.max(n), 0);
            let read = match self.inner.read(&mut self.buffer[len..]) {
                Ok(read) => read,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                    self.buffer.truncate(len);
                    continue;
                }
                Err(e) => {
                    self.buffer.truncate(len);
                    return Err(e);
                }
            };
            self.buffer.truncate(len + read);
            if read == 0 {
                self.closed = true;
            }
        }
        Ok(self.remaining() >= n)
    }

    /// Look at up to `n` buffered bytes without consuming them.
    pub fn peek(&self, n: usize) -> &[u8] {
        let end = (self.offset + n).min(self.buffer.len());
        &self.buffer[self.offset..end]
    }

    /// Consume and return up to `n` bytes.
    pub fn take(&mut self, n: usize) -> Vec<u8> {
        let end = (self.offset + n).min(self.buffer.len());
        let out = self.buffer[self.offset..end].to_vec();
        self.offset = end;
        self.position += out.len() as u64;
        if self.offset == self.buffer.len() {
            self.buffer.clear();
            self.offset = 0;
        }
        out
    }

    /// Release the source, returning the unconsumed buffered bytes and
    /// the inner reader.
    pub fn into_parts(self) -> (Vec<u8>, R) {
        let ByteSource {
            inner,
            mut buffer,
            offset,
            ..
        } = self;
        buffer.drain(..offset);
        (buffer, inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_peek_take() {
        let data = (0u8..100).collect::<Vec<_>>();
        let mut source = ByteSource::new(&data[..]);
        assert!(source.ensure(10).unwrap());
        assert_eq!(source.peek(4), &[0, 1, 2, 3]);
        assert_eq!(source.take(4), vec![0, 1, 2, 3]);
        assert_eq!(source.position(), 4);
        assert_eq!(source.peek(2), &[4, 5]);
    }

    #[test]
    fn ensure_reports_short_streams() {
        let data = [1u8, 2, 3];
        let mut source = ByteSource::new(&data[..]);
        assert!(!source.ensure(8).unwrap());
        assert!(source.is_closed());
        assert_eq!(source.remaining(), 3);
        assert_eq!(source.take(8), vec![1, 2, 3]);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn into_parts_returns_leftover() {
        let data = (0u8..20).collect::<Vec<_>>();
        let mut source = ByteSource::new(&data[..]);
        source.ensure(20).unwrap();
        source.take(5);
        let (rest, _reader) = source.into_parts();
        assert_eq!(rest, (5u8..20).collect::<Vec<_>>());
    }
}
