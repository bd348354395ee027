//! Fixed transfer buffers and the decode-side carry-over buffer.
//!
//! A [`TransferBuffer`] is allocated once and never resized. It carries a
//! `(next, available)` cursor pair that the codec engine advances:
//!
//! - as an **input** buffer, `data[next..next + available]` holds bytes the
//!   engine has not consumed yet;
//! - as an **output** buffer, `data[..next]` holds bytes the engine has
//!   produced and `available` is the space left after them.
//!
//! The invariant `next + available <= capacity` must hold after every engine
//! call; [`TransferBuffer::check_bounds`] is how adapters verify it.

use std::io::{self, Read};

use crate::error::{Result, StreamError};

/// Fixed-capacity scratch buffer shared between a stream and a codec engine.
#[derive(Debug)]
pub struct TransferBuffer {
    data: Box<[u8]>,
    next: usize,
    available: usize,
}

impl TransferBuffer {
    /// Allocate a buffer of exactly `capacity` bytes.
    ///
    /// Allocation failure is reported as [`StreamError::InstanceCreation`]
    /// instead of aborting the process.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(StreamError::invalid_parameter(
                "buffer capacity",
                0,
                1,
                usize::MAX as u64,
            ));
        }
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|e| StreamError::instance_creation("transfer buffer", e.to_string()))?;
        data.resize(capacity, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
            next: 0,
            available: 0,
        })
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Cursor position.
    pub fn next(&self) -> usize {
        self.next
    }

    /// Unconsumed input bytes, or free output space.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Whether the cursor pair still lies inside the buffer.
    pub fn check_bounds(&self) -> bool {
        self.next
            .checked_add(self.available)
            .is_some_and(|end| end <= self.data.len())
    }

    // ------------------------------------------------------------------
    // Input side
    // ------------------------------------------------------------------

    /// Replace the contents with the head of `src`, returning how many bytes fit.
    pub fn fill_from_slice(&mut self, src: &[u8]) -> usize {
        let len = src.len().min(self.data.len());
        self.data[..len].copy_from_slice(&src[..len]);
        self.next = 0;
        self.available = len;
        len
    }

    /// Move unconsumed bytes to the front and read more from `reader` behind them.
    ///
    /// Returns the number of bytes read; `0` means the reader is exhausted.
    /// Callers must make sure [`has_input_space`](Self::has_input_space)
    /// holds first, since a zero-length read would be indistinguishable
    /// from end of file.
    pub fn refill_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<usize> {
        if self.next > 0 {
            self.data
                .copy_within(self.next..self.next + self.available, 0);
            self.next = 0;
        }
        let start = self.available;
        loop {
            match reader.read(&mut self.data[start..]) {
                Ok(read) => {
                    self.available += read;
                    return Ok(read);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Whether any room is left behind the unconsumed input.
    pub fn has_input_space(&self) -> bool {
        self.available < self.data.len()
    }

    /// Bytes not yet consumed by the engine.
    pub fn pending(&self) -> &[u8] {
        &self.data[self.next..self.next + self.available]
    }

    // ------------------------------------------------------------------
    // Output side
    // ------------------------------------------------------------------

    /// Make the whole buffer available for engine output again.
    pub fn reset_output(&mut self) {
        self.next = 0;
        self.available = self.data.len();
    }

    /// Bytes produced by the engine since the last reset.
    pub fn produced(&self) -> &[u8] {
        &self.data[..self.next]
    }

    /// Whether the engine has produced anything since the last reset.
    pub fn has_produced(&self) -> bool {
        self.next > 0
    }

    /// Whether the engine has filled all remaining output space.
    pub fn is_full(&self) -> bool {
        self.available == 0
    }

    // ------------------------------------------------------------------
    // Engine side
    // ------------------------------------------------------------------

    /// Raw `(bytes, next, available)` view for an engine reading input.
    pub fn input_cursor(&mut self) -> (&[u8], &mut usize, &mut usize) {
        (&self.data[..], &mut self.next, &mut self.available)
    }

    /// Raw `(bytes, next, available)` view for an engine writing output.
    pub fn output_cursor(&mut self) -> (&mut [u8], &mut usize, &mut usize) {
        (&mut self.data[..], &mut self.next, &mut self.available)
    }
}

/// Decoded bytes waiting to be handed to the caller.
///
/// `offset` marks how much of the front has been served. Whenever a read
/// leaves bytes behind, the served prefix is removed so the buffer never
/// grows past one read request plus one output buffer.
#[derive(Debug, Default)]
pub struct CarryOver {
    buffer: Vec<u8>,
    offset: usize,
}

impl CarryOver {
    /// Create an empty carry-over buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes not yet served.
    pub fn unread(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.unread() == 0
    }

    /// Physical length, including any served prefix not yet compacted.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Current read offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Allocated capacity.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Append freshly decoded bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Copy up to `out.len()` unread bytes into `out`.
    ///
    /// A full drain truncates the buffer; a partial one compacts it so the
    /// offset returns to zero.
    pub fn serve_into(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.unread());
        out[..count].copy_from_slice(&self.buffer[self.offset..self.offset + count]);
        self.offset += count;

        if self.offset == self.buffer.len() {
            self.buffer.clear();
        } else if self.offset > 0 {
            self.buffer.copy_within(self.offset.., 0);
            self.buffer.truncate(self.buffer.len() - self.offset);
        }
        self.offset = 0;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            TransferBuffer::new(0),
            Err(StreamError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_impossible_allocation_is_instance_creation() {
        assert!(matches!(
            TransferBuffer::new(usize::MAX),
            Err(StreamError::InstanceCreation { .. })
        ));
    }

    #[test]
    fn test_fill_from_slice_truncates_to_capacity() {
        let mut buf = TransferBuffer::new(4).unwrap();
        assert_eq!(buf.fill_from_slice(b"abcdef"), 4);
        assert_eq!(buf.pending(), b"abcd");
        assert_eq!(buf.next(), 0);
        assert_eq!(buf.available(), 4);
    }

    #[test]
    fn test_refill_keeps_unconsumed_tail() {
        let mut buf = TransferBuffer::new(8).unwrap();
        let mut source = Cursor::new(b"0123456789".to_vec());

        assert_eq!(buf.refill_from(&mut source).unwrap(), 8);
        // Pretend the engine consumed five bytes.
        {
            let (_, next, available) = buf.input_cursor();
            *next += 5;
            *available -= 5;
        }
        assert_eq!(buf.pending(), b"567");

        assert_eq!(buf.refill_from(&mut source).unwrap(), 2);
        assert_eq!(buf.pending(), b"56789");
        assert_eq!(buf.next(), 0);

        assert_eq!(buf.refill_from(&mut source).unwrap(), 0);
    }

    #[test]
    fn test_output_cursor_tracks_production() {
        let mut buf = TransferBuffer::new(6).unwrap();
        buf.reset_output();
        assert!(!buf.has_produced());
        {
            let (data, next, available) = buf.output_cursor();
            data[*next..*next + 3].copy_from_slice(b"xyz");
            *next += 3;
            *available -= 3;
        }
        assert!(buf.check_bounds());
        assert_eq!(buf.produced(), b"xyz");
        assert!(!buf.is_full());

        buf.reset_output();
        assert_eq!(buf.available(), 6);
        assert!(buf.produced().is_empty());
    }

    #[test]
    fn test_check_bounds_detects_overrun() {
        let mut buf = TransferBuffer::new(4).unwrap();
        {
            let (_, next, available) = buf.output_cursor();
            *next = 3;
            *available = 2;
        }
        assert!(!buf.check_bounds());
    }

    #[test]
    fn test_carry_over_full_drain_truncates() {
        let mut carry = CarryOver::new();
        carry.extend(b"hello");
        let mut out = [0u8; 8];
        assert_eq!(carry.serve_into(&mut out), 5);
        assert_eq!(&out[..5], b"hello");
        assert_eq!(carry.len(), 0);
        assert!(carry.is_empty());
    }

    #[test]
    fn test_carry_over_partial_drain_compacts() {
        let mut carry = CarryOver::new();
        carry.extend(b"abcdefgh");
        let mut out = [0u8; 3];
        assert_eq!(carry.serve_into(&mut out), 3);
        assert_eq!(&out, b"abc");
        assert_eq!(carry.offset(), 0);
        assert_eq!(carry.len(), 5);

        assert_eq!(carry.serve_into(&mut out), 3);
        assert_eq!(&out, b"def");
        assert_eq!(carry.serve_into(&mut out), 2);
        assert_eq!(&out[..2], b"gh");
        assert!(carry.is_empty());
    }

    #[test]
    fn test_carry_over_empty_output_is_noop() {
        let mut carry = CarryOver::new();
        carry.extend(b"abc");
        assert_eq!(carry.serve_into(&mut []), 0);
        assert_eq!(carry.unread(), 3);
    }
}
