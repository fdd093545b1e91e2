//! `+IPD` de-framing
//!
//! Outside transparent mode the modem wraps every received TCP segment as
//! `+IPD,<len>:<payload>` (or `+IPD,<id>,<len>:<payload>` with multiple
//! connections), interleaved with status lines such as `SEND OK` and
//! `CLOSED`. The decoder recovers the payload bytes and drops the rest.

const IPD_PREFIX: &[u8] = b"+IPD,";

/// Longest length field accepted before the frame is treated as garbage
const MAX_LENGTH_DIGITS: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Matching the `+IPD,` prefix; holds the number of prefix bytes matched
    Prefix(usize),
    /// Reading the decimal length field
    Length { value: usize, digits: u8 },
    /// Passing payload bytes through
    Payload(usize),
}

/// State machine recovering payload bytes from `+IPD` frames
#[derive(Debug, Clone)]
pub struct IpdDecoder {
    state: DecodeState,
}

impl Default for IpdDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl IpdDecoder {
    /// Create a decoder waiting for a frame prefix
    pub const fn new() -> Self {
        Self {
            state: DecodeState::Prefix(0),
        }
    }

    /// Reset the decoder state
    pub fn reset(&mut self) {
        self.state = DecodeState::Prefix(0);
    }

    /// Feed one byte from the link
    ///
    /// Returns `Some(byte)` for payload bytes, `None` for framing and status
    /// text.
    pub fn feed(&mut self, byte: u8) -> Option<u8> {
        match self.state {
            DecodeState::Prefix(matched) => {
                if byte == IPD_PREFIX[matched] {
                    let matched = matched + 1;
                    self.state = if matched == IPD_PREFIX.len() {
                        DecodeState::Length {
                            value: 0,
                            digits: 0,
                        }
                    } else {
                        DecodeState::Prefix(matched)
                    };
                } else if byte == IPD_PREFIX[0] {
                    self.state = DecodeState::Prefix(1);
                } else {
                    self.state = DecodeState::Prefix(0);
                }
                None
            }
            DecodeState::Length { value, digits } => {
                match byte {
                    b'0'..=b'9' if digits < MAX_LENGTH_DIGITS => {
                        self.state = DecodeState::Length {
                            value: value * 10 + usize::from(byte - b'0'),
                            digits: digits + 1,
                        };
                    }
                    // Link id came first; the length follows
                    b',' if digits > 0 => {
                        self.state = DecodeState::Length {
                            value: 0,
                            digits: 0,
                        };
                    }
                    b':' if digits > 0 && value > 0 => {
                        self.state = DecodeState::Payload(value);
                    }
                    _ => self.reset(),
                }
                None
            }
            DecodeState::Payload(remaining) => {
                self.state = if remaining > 1 {
                    DecodeState::Payload(remaining - 1)
                } else {
                    DecodeState::Prefix(0)
                };
                Some(byte)
            }
        }
    }

    /// Decode a buffered block into `out`
    ///
    /// Returns the number of payload bytes written. Payload that does not fit
    /// is dropped.
    pub fn decode(&mut self, input: &[u8], out: &mut [u8]) -> usize {
        let mut written = 0;
        for &byte in input {
            if let Some(payload) = self.feed(byte) {
                if written < out.len() {
                    out[written] = payload;
                    written += 1;
                }
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut decoder = IpdDecoder::new();
        let mut out = [0u8; 32];
        let n = decoder.decode(b"\r\nRecv 10 bytes\r\nSEND OK\r\n\r\n+IPD,5:hello\r\nCLOSED\r\n", &mut out);
        assert_eq!(&out[..n], b"hello");
    }

    #[test]
    fn test_multiple_frames() {
        let mut decoder = IpdDecoder::new();
        let mut out = [0u8; 32];
        let n = decoder.decode(b"+IPD,3:abc\r\n+IPD,4:defg\r\nCLOSED", &mut out);
        assert_eq!(&out[..n], b"abcdefg");
    }

    #[test]
    fn test_link_id_form() {
        let mut decoder = IpdDecoder::new();
        let mut out = [0u8; 8];
        let n = decoder.decode(b"+IPD,0,2:ok", &mut out);
        assert_eq!(&out[..n], b"ok");
    }

    #[test]
    fn test_payload_may_contain_prefix() {
        let mut decoder = IpdDecoder::new();
        let mut out = [0u8; 16];
        let n = decoder.decode(b"+IPD,7:+IPD,1:", &mut out);
        assert_eq!(&out[..n], b"+IPD,1:");
    }

    #[test]
    fn test_restart_on_repeated_plus() {
        let mut decoder = IpdDecoder::new();
        let mut out = [0u8; 8];
        let n = decoder.decode(b"++IPD,1:x", &mut out);
        assert_eq!(&out[..n], b"x");
    }

    #[test]
    fn test_malformed_length_resets() {
        let mut decoder = IpdDecoder::new();
        let mut out = [0u8; 8];
        let n = decoder.decode(b"+IPD,x:zz+IPD,:yy", &mut out);
        assert_eq!(n, 0);
    }

    #[test]
    fn test_output_bound() {
        let mut decoder = IpdDecoder::new();
        let mut out = [0u8; 3];
        let n = decoder.decode(b"+IPD,6:abcdef", &mut out);
        assert_eq!(n, 3);
        assert_eq!(&out, b"abc");
    }
}
