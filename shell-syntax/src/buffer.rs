//! The source buffer: a re-fillable byte window over a file descriptor, a
//! static byte slice, or a caller-owned buffer.
//!
//! This is the Rust counterpart of `mrsh_parser_with_fd` /
//! `mrsh_parser_with_data` / `mrsh_parser_with_buffer` and the raw
//! `mrsh_buffer`. Per spec §5, this core is single-threaded and
//! synchronous: a file-backed buffer blocks on `Read::read` when it needs
//! more bytes, and the static/shared variants never block because their
//! bytes are already available.

use std::io::{self, Read};
use std::rc::Rc;
use std::cell::RefCell;

/// Shared byte buffer that a caller tops up between parser calls.
///
/// Wrapping it in `Rc<RefCell<_>>` lets the same buffer be handed to
/// multiple [`SourceBuffer`]s (e.g. one per nested `$(...)` parse) the way
/// `mrsh_parser_with_buffer` lets several parsers observe the same
/// `mrsh_buffer`.
pub type SharedBuffer = Rc<RefCell<Vec<u8>>>;

/// Where a [`SourceBuffer`] gets its bytes from.
enum Producer {
    /// A file descriptor (or any blocking `Read`), read lazily in chunks.
    Reader(Box<dyn Read>),
    /// A fixed, already fully available byte slice.
    Static(Vec<u8>),
    /// A buffer the caller fills from the outside between parser calls.
    Shared(SharedBuffer),
    /// Bytes have run out and no more will ever arrive.
    Exhausted,
}

/// The re-fillable byte window described by spec §4.A.
///
/// Bytes already read are kept in `data` rather than dropped, since a
/// `Shared` producer may still be referenced by another [`SourceBuffer`]
/// reading the same underlying bytes from a different cursor position.
pub struct SourceBuffer {
    producer: Producer,
    /// All bytes read so far from `producer`, including ones already
    /// consumed.
    data: Vec<u8>,
    /// Index of the next unread byte in `data`.
    cursor: usize,
}

impl SourceBuffer {
    /// Creates a buffer that reads lazily from a blocking reader (a file
    /// descriptor, in the typical case).
    #[must_use]
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        SourceBuffer {
            producer: Producer::Reader(Box::new(reader)),
            data: Vec::new(),
            cursor: 0,
        }
    }

    /// Creates a buffer over a byte slice that is already fully available.
    #[must_use]
    pub fn from_static(bytes: impl Into<Vec<u8>>) -> Self {
        SourceBuffer {
            producer: Producer::Static(Vec::new()),
            data: bytes.into(),
            cursor: 0,
        }
    }

    /// Creates a buffer over a buffer the caller fills from the outside.
    #[must_use]
    pub fn from_shared(buffer: SharedBuffer) -> Self {
        SourceBuffer {
            producer: Producer::Shared(buffer),
            data: Vec::new(),
            cursor: 0,
        }
    }

    /// Makes sure at least `n` unread bytes are available, reading more
    /// from the underlying producer if necessary. Returns the number of
    /// unread bytes actually available (which may be less than `n` at
    /// end of input).
    fn fill(&mut self, n: usize) -> io::Result<usize> {
        loop {
            let available = self.data.len() - self.cursor;
            if available >= n {
                return Ok(available);
            }
            match &mut self.producer {
                Producer::Reader(reader) => {
                    let mut chunk = [0u8; 4096];
                    let read = reader.read(&mut chunk)?;
                    if read == 0 {
                        self.producer = Producer::Exhausted;
                        return Ok(self.data.len() - self.cursor);
                    }
                    self.data.extend_from_slice(&chunk[..read]);
                }
                Producer::Static(_) | Producer::Exhausted => {
                    return Ok(self.data.len() - self.cursor);
                }
                Producer::Shared(shared) => {
                    let shared_data = shared.borrow();
                    if shared_data.len() <= self.data.len() {
                        // The caller has not supplied any more bytes yet.
                        return Ok(self.data.len() - self.cursor);
                    }
                    self.data.extend_from_slice(&shared_data[self.data.len()..]);
                }
            }
        }
    }

    /// Returns up to `n` bytes starting at the read cursor without
    /// consuming them, growing the internal buffer on demand.
    pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        let available = self.fill(n)?;
        let end = self.cursor + available.min(n);
        Ok(&self.data[self.cursor..end])
    }

    /// Returns the single next byte without consuming it, or `None` at end
    /// of input.
    pub fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.peek(1)?.first().copied())
    }

    /// Consumes and returns the next byte, or `None` at end of input.
    pub fn advance(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.cursor += 1;
        }
        Ok(byte)
    }

    /// Whether the buffer is known to be at end of input (no more bytes
    /// are, or ever will be, available).
    pub fn at_eof(&mut self) -> io::Result<bool> {
        Ok(self.peek(1)?.is_empty())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_buffer_yields_all_bytes() {
        let mut buf = SourceBuffer::from_static(*b"abc");
        assert_eq!(buf.advance().unwrap(), Some(b'a'));
        assert_eq!(buf.advance().unwrap(), Some(b'b'));
        assert_eq!(buf.advance().unwrap(), Some(b'c'));
        assert_eq!(buf.advance().unwrap(), None);
        assert!(buf.at_eof().unwrap());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut buf = SourceBuffer::from_static(*b"xy");
        assert_eq!(buf.peek(2).unwrap(), b"xy");
        assert_eq!(buf.peek_byte().unwrap(), Some(b'x'));
        assert_eq!(buf.advance().unwrap(), Some(b'x'));
        assert_eq!(buf.peek_byte().unwrap(), Some(b'y'));
    }

    #[test]
    fn reader_backed_buffer_blocks_until_data_arrives() {
        let mut buf = SourceBuffer::from_reader(std::io::Cursor::new(b"fd-data".to_vec()));
        let mut collected = Vec::new();
        while let Some(b) = buf.advance().unwrap() {
            collected.push(b);
        }
        assert_eq!(collected, b"fd-data");
    }

    #[test]
    fn shared_buffer_observes_caller_top_ups() {
        let shared: SharedBuffer = Rc::new(RefCell::new(b"part1".to_vec()));
        let mut buf = SourceBuffer::from_shared(Rc::clone(&shared));
        assert_eq!(buf.peek(10).unwrap(), b"part1");
        assert!(!buf.at_eof().unwrap());
        shared.borrow_mut().extend_from_slice(b"part2");
        assert_eq!(buf.peek(10).unwrap(), b"part1part2");
    }
}
