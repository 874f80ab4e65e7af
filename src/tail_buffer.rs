//! Bounded capture of child stderr.

use std::collections::VecDeque;
use std::fmt;

/// A fixed-cap byte buffer that keeps the newest bytes written to it.
///
/// Used to retain a tail of the child's stderr for exit reporting without
/// letting a chatty child grow memory without bound.
#[derive(Debug, Clone)]
pub struct TailBuffer {
    buffer: VecDeque<u8>,
    max_bytes: usize,
    total_bytes_written: usize,
}

impl TailBuffer {
    /// Create a buffer retaining at most `max_bytes`.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(max_bytes.min(8192)),
            max_bytes,
            total_bytes_written: 0,
        }
    }

    /// Append bytes, dropping the oldest data once the cap is exceeded.
    pub fn write(&mut self, data: &[u8]) {
        self.total_bytes_written += data.len();

        if data.len() >= self.max_bytes {
            self.buffer.clear();
            self.buffer
                .extend(&data[data.len() - self.max_bytes..]);
            return;
        }

        let overflow = (self.buffer.len() + data.len()).saturating_sub(self.max_bytes);
        self.buffer.drain(..overflow);
        self.buffer.extend(data);
    }

    /// Total bytes ever written, including dropped ones.
    #[must_use]
    pub const fn total_bytes_written(&self) -> usize {
        self.total_bytes_written
    }

    /// Whether any data was dropped to honor the cap.
    #[must_use]
    pub const fn was_truncated(&self) -> bool {
        self.total_bytes_written > self.max_bytes
    }

    /// Current number of retained bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl fmt::Display for TailBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (front, back) = self.buffer.as_slices();
        write!(f, "{}", String::from_utf8_lossy(front))?;
        write!(f, "{}", String::from_utf8_lossy(back))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retains_everything_under_cap() {
        let mut tail = TailBuffer::new(16);
        tail.write(b"hello ");
        tail.write(b"world");
        assert_eq!(tail.to_string(), "hello world");
        assert!(!tail.was_truncated());
        assert_eq!(tail.total_bytes_written(), 11);
    }

    #[test]
    fn test_drops_oldest_bytes_over_cap() {
        let mut tail = TailBuffer::new(4);
        tail.write(b"abcdef");
        assert_eq!(tail.to_string(), "cdef");
        assert!(tail.was_truncated());
        assert_eq!(tail.total_bytes_written(), 6);
    }

    #[test]
    fn test_incremental_writes_keep_newest() {
        let mut tail = TailBuffer::new(4);
        tail.write(b"ab");
        tail.write(b"cd");
        tail.write(b"ef");
        assert_eq!(tail.to_string(), "cdef");
        assert_eq!(tail.len(), 4);
    }

    #[test]
    fn test_single_write_larger_than_cap() {
        let mut tail = TailBuffer::new(3);
        tail.write(b"0123456789");
        assert_eq!(tail.to_string(), "789");
    }

    #[test]
    fn test_empty_buffer() {
        let tail = TailBuffer::new(8);
        assert!(tail.is_empty());
        assert_eq!(tail.to_string(), "");
    }
}
