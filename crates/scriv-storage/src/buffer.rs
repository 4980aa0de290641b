//! Bounded FIFO byte buffer for writes that have no open stream

use bytes::{Buf, Bytes, BytesMut};

/// Capacity of the pending buffer (2 MiB)
pub const MAX_BUFFER_BYTES: usize = 2 * 1024 * 1024;

/// Byte buffer that drops its oldest bytes once full
#[derive(Debug)]
pub struct PendingBuffer {
    data: BytesMut,
    capacity: usize,
    dropped: u64,
}

impl Default for PendingBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_BUFFER_BYTES)
    }
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Append `bytes`, evicting the oldest data that no longer fits.
    ///
    /// Returns how many bytes were evicted.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        if bytes.len() >= self.capacity {
            let evicted = self.data.len() + bytes.len() - self.capacity;
            self.data.clear();
            self.data
                .extend_from_slice(&bytes[bytes.len() - self.capacity..]);
            self.dropped += evicted as u64;
            return evicted;
        }

        let evicted = (self.data.len() + bytes.len()).saturating_sub(self.capacity);
        if evicted > 0 {
            self.data.advance(evicted);
            self.dropped += evicted as u64;
        }
        self.data.extend_from_slice(bytes);
        evicted
    }

    /// Put bytes that failed to flush back in front of newer data
    pub fn requeue(&mut self, bytes: &[u8]) -> usize {
        let newer = self.data.split();
        self.data.extend_from_slice(bytes);
        // Re-pushing the newer data trims from the requeued (older) end
        self.push(&newer)
    }

    /// Remove and return everything buffered, oldest first
    pub fn take(&mut self) -> Bytes {
        self.data.split().freeze()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total bytes evicted over the buffer's lifetime
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut buffer = PendingBuffer::with_capacity(16);
        buffer.push(b"abc");
        buffer.push(b"def");
        assert_eq!(buffer.len(), 6);
        assert_eq!(&buffer.take()[..], b"abcdef");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_evicts_oldest() {
        let mut buffer = PendingBuffer::with_capacity(8);
        buffer.push(b"12345");
        let evicted = buffer.push(b"6789");
        assert_eq!(evicted, 1);
        assert_eq!(&buffer.take()[..], b"23456789");
        assert_eq!(buffer.dropped_bytes(), 1);
    }

    #[test]
    fn test_oversized_write_keeps_tail() {
        let mut buffer = PendingBuffer::with_capacity(4);
        buffer.push(b"ab");
        let evicted = buffer.push(b"cdefgh");
        assert_eq!(evicted, 4);
        assert_eq!(&buffer.take()[..], b"efgh");
    }

    #[test]
    fn test_requeue_goes_first() {
        let mut buffer = PendingBuffer::with_capacity(6);
        buffer.push(b"new");
        buffer.requeue(b"old");
        assert_eq!(&buffer.take()[..], b"oldnew");

        buffer.push(b"newer");
        buffer.requeue(b"older");
        assert_eq!(&buffer.take()[..], b"rnewer");
    }

    #[test]
    fn test_default_capacity() {
        let mut buffer = PendingBuffer::new();
        buffer.push(&vec![b'x'; 2 * 1024 * 1024]);
        assert_eq!(buffer.dropped_bytes(), 0);
        buffer.push(b"y");
        assert_eq!(buffer.dropped_bytes(), 1);
        assert_eq!(buffer.len(), 2 * 1024 * 1024);
    }
}
