//! A growable byte buffer with a processed-up-to cursor, used for both the
//! recv and send side of a connection.
//!
//! Data accumulates at the tail; a reader consumes from `cursor` onward and
//! calls [`Buffer::consume`] to advance it. Once the consumed prefix exceeds
//! half the soft cap the buffer is compacted (the consumed bytes are
//! dropped and the cursor reset to zero) rather than left to grow forever.

use std::io::{self, Read, Write};

/// Default soft cap per direction (8 KiB), matching the framing layer's
/// expectation that single frames are modest in size.
pub const DEFAULT_SOFT_CAP: usize = 8 * 1024;

pub struct Buffer {
    data: Vec<u8>,
    cursor: usize,
    soft_cap: usize,
}

impl Buffer {
    #[inline]
    pub fn new(soft_cap: usize) -> Buffer {
        Buffer {
            data: Vec::with_capacity(soft_cap),
            cursor: 0,
            soft_cap,
        }
    }

    /// Bytes available to be consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - self.cursor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The unconsumed slice of the buffer.
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.data[self.cursor..]
    }

    /// Advances the cursor past `count` consumed bytes, compacting the
    /// buffer if the consumed prefix has grown past half the soft cap.
    #[inline]
    pub fn consume(&mut self, count: usize) {
        debug_assert!(self.cursor + count <= self.data.len());
        self.cursor += count;
        self.compact_if_needed();
    }

    #[inline]
    fn compact_if_needed(&mut self) {
        if self.cursor > self.soft_cap / 2 {
            self.data.drain(..self.cursor);
            self.cursor = 0;
        }
    }

    /// Appends raw bytes to the tail, for queuing outgoing data that
    /// couldn't be written immediately.
    #[inline]
    pub fn push(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Reads from `reader` until it would block or signals EOF, appending
    /// everything read to the tail. Returns the number of bytes read and
    /// whether the peer closed the connection (a `read` that returned `Ok(0)`).
    pub fn ingress<R: Read>(&mut self, mut reader: R) -> io::Result<(usize, bool)> {
        let mut total = 0usize;
        let mut chunk = [0u8; 4096];

        loop {
            match reader.read(&mut chunk) {
                Ok(0) => return Ok((total, true)),
                Ok(n) => {
                    self.data.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok((total, false)),
                Err(e) => return Err(e),
            }
        }
    }

    /// Writes the pending slice to `writer` until it would block or the
    /// buffer empties. Returns the number of bytes written.
    pub fn egress<W: Write>(&mut self, mut writer: W) -> io::Result<usize> {
        let mut total = 0usize;

        while !self.is_empty() {
            match writer.write(self.pending()) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.consume(n);
                    total += n;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(total),
                Err(e) => return Err(e),
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::min;

    struct MockChannel {
        data: Vec<u8>,
        cursor: usize,
        chunk: usize,
        max_size: usize,
    }

    impl MockChannel {
        fn new(data: Vec<u8>, chunk: usize, max_size: usize) -> MockChannel {
            MockChannel {
                data,
                cursor: 0,
                chunk,
                max_size,
            }
        }

        fn clear(&mut self) {
            self.data.clear();
            self.cursor = 0;
        }
    }

    impl Read for MockChannel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.cursor == self.data.len() {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let offset = min(min(self.chunk, buf.len()), self.data.len() - self.cursor);
            buf[..offset].copy_from_slice(&self.data[self.cursor..(self.cursor + offset)]);
            self.cursor += offset;
            Ok(offset)
        }
    }

    impl Write for MockChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.data.len() == self.max_size {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let count = min(self.chunk, buf.len());
            self.data.extend(&buf[..count]);
            Ok(count)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn roundtrip() {
        let mock_data: Vec<_> = (0..200u16).map(|i| i as u8).collect();
        let mut channel = MockChannel::new(mock_data.clone(), 17, mock_data.len());

        let mut buffer = Buffer::new(DEFAULT_SOFT_CAP);
        let (read, closed) = buffer.ingress(&mut channel).unwrap();

        assert_eq!(read, mock_data.len());
        assert!(!closed);
        assert_eq!(buffer.pending(), &mock_data[..]);

        channel.clear();
        let written = buffer.egress(&mut channel).unwrap();

        assert_eq!(written, mock_data.len());
        assert!(buffer.is_empty());
        assert_eq!(channel.data, mock_data);
    }

    #[test]
    fn ingress_zero_read_means_closed() {
        let mut buffer = Buffer::new(DEFAULT_SOFT_CAP);
        let closed: &[u8] = &[];
        let (read, peer_closed) = buffer.ingress(closed).unwrap();
        assert_eq!(read, 0);
        assert!(peer_closed);
    }

    #[test]
    fn egress_write_zero_is_an_error() {
        let mut buffer = Buffer::new(DEFAULT_SOFT_CAP);
        buffer.push(&[1, 2, 3]);

        struct ZeroWriter;
        impl Write for ZeroWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = buffer.egress(ZeroWriter).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn compacts_past_half_soft_cap() {
        let mut buffer = Buffer::new(16);
        buffer.push(&[0u8; 16]);
        buffer.consume(9);
        // cursor (9) > soft_cap/2 (8) triggers compaction
        assert_eq!(buffer.len(), 7);
        assert_eq!(buffer.pending().len(), 7);
    }
}
