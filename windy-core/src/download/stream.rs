//! Per-byte receive step

use windy_protocol::HeaderScanner;

/// Splits a response into header and body, writing body bytes in order
/// into a destination slice
pub struct StreamReceiver<'d> {
    scanner: HeaderScanner,
    destination: &'d mut [u8],
    expected: usize,
    written: usize,
}

impl<'d> StreamReceiver<'d> {
    /// Returns `None` when `expected` is zero or exceeds the destination
    ///
    /// A zero expectation would count as complete before any header byte.
    pub fn new(destination: &'d mut [u8], expected: usize) -> Option<Self> {
        if expected == 0 || expected > destination.len() {
            return None;
        }
        Some(Self {
            scanner: HeaderScanner::new(),
            destination,
            expected,
            written: 0,
        })
    }

    /// Consume one received byte
    ///
    /// Returns `true` once `expected` body bytes are in place. Bytes past
    /// that point are ignored.
    #[inline]
    pub fn push(&mut self, byte: u8) -> bool {
        if !self.scanner.is_complete() {
            self.scanner.feed(byte);
        } else if self.written < self.expected {
            self.destination[self.written] = byte;
            self.written += 1;
        }
        self.is_complete()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.written >= self.expected
    }

    /// Whether the header terminator has been seen
    pub fn in_body(&self) -> bool {
        self.scanner.is_complete()
    }

    /// Header length including the terminator, once known
    pub fn header_len(&self) -> Option<usize> {
        self.scanner
            .is_complete()
            .then(|| self.scanner.header_len())
    }

    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn expected(&self) -> usize {
        self.expected
    }
}
