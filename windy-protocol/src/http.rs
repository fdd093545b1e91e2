//! HTTP request lines and response header detection
//!
//! Image downloads use HTTP/1.0 with `Connection: close` so the server ends
//! the body by closing the connection instead of switching to chunked
//! framing. The body is never length-checked against the response headers;
//! the caller counts bytes.

use core::fmt::Write;

use heapless::String;

use crate::command::CommandError;

/// Longest request the builder produces
pub const MAX_REQUEST_LEN: usize = 512;

/// A complete GET request including the terminating blank line
pub type RequestLine = String<MAX_REQUEST_LEN>;

/// Byte sequence that ends a response header
pub const HEADER_TERMINATOR: [u8; 4] = *b"\r\n\r\n";

/// Protocol version used in the request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpVersion {
    /// Server closes after the body; used for binary streaming
    Http10,
    /// Used for small text responses read in command mode
    Http11,
}

impl HttpVersion {
    fn as_str(self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
        }
    }
}

/// Build `GET <path> <version>\r\nHost: <host>\r\nConnection: close\r\n\r\n`
pub fn get_request(
    path: &str,
    host: &str,
    version: HttpVersion,
) -> Result<RequestLine, CommandError> {
    let mut request = RequestLine::new();
    write!(
        request,
        "GET {} {}\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path,
        version.as_str(),
        host
    )?;
    Ok(request)
}

/// Detects the end of a response header one byte at a time
///
/// Keeps a rolling window of the last four bytes. The window starts zeroed,
/// so a terminator is only recognised once all four of its bytes have been
/// seen.
#[derive(Debug, Clone)]
pub struct HeaderScanner {
    window: [u8; 4],
    consumed: usize,
    complete: bool,
}

impl Default for HeaderScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderScanner {
    /// Create a scanner positioned at the start of a response
    pub const fn new() -> Self {
        Self {
            window: [0; 4],
            consumed: 0,
            complete: false,
        }
    }

    /// Feed one header byte
    ///
    /// Returns `true` exactly once, for the byte that completes the
    /// terminator. Bytes fed after that are ignored and return `false`.
    #[inline]
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.complete {
            return false;
        }
        self.window = [self.window[1], self.window[2], self.window[3], byte];
        self.consumed += 1;
        self.complete = self.window == HEADER_TERMINATOR;
        self.complete
    }

    /// Whether the header terminator has been seen
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Header length in bytes, terminator included
    pub fn header_len(&self) -> usize {
        self.consumed
    }
}

/// Offset of the body in a fully buffered response
///
/// Looks for `\r\n\r\n` first and falls back to a bare `\n\n`.
pub fn find_body(response: &[u8]) -> Option<usize> {
    if let Some(pos) = find(response, &HEADER_TERMINATOR) {
        return Some(pos + HEADER_TERMINATOR.len());
    }
    find(response, b"\n\n").map(|pos| pos + 2)
}

/// Position of the first occurrence of `needle` in `haystack`
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_request_http10() {
        let request = get_request("/windy.bin", "172.20.2.5", HttpVersion::Http10).unwrap();
        assert_eq!(
            request.as_str(),
            "GET /windy.bin HTTP/1.0\r\nHost: 172.20.2.5\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn test_get_request_http11() {
        let request = get_request("/v1/forecast", "api.example", HttpVersion::Http11).unwrap();
        assert!(request.starts_with("GET /v1/forecast HTTP/1.1\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_get_request_too_long() {
        let path = [b'a'; MAX_REQUEST_LEN];
        let path = core::str::from_utf8(&path).unwrap();
        assert_eq!(
            get_request(path, "h", HttpVersion::Http10),
            Err(CommandError::TooLong)
        );
    }

    #[test]
    fn test_scanner_detects_terminator() {
        let mut scanner = HeaderScanner::new();
        let response = b"HTTP/1.0 200 OK\r\nContent-Type: x\r\n\r\nBODY";
        let mut hits = 0;
        let mut body_at = None;
        for (i, &b) in response.iter().enumerate() {
            if scanner.feed(b) {
                hits += 1;
                body_at = Some(i + 1);
            }
        }
        assert_eq!(hits, 1);
        assert_eq!(body_at, Some(response.len() - 4));
        assert_eq!(scanner.header_len(), response.len() - 4);
    }

    #[test]
    fn test_scanner_ignores_single_crlf() {
        let mut scanner = HeaderScanner::new();
        for &b in b"A\r\nB\r\n\rC\n\r\n" {
            assert!(!scanner.feed(b));
        }
        assert!(!scanner.is_complete());
    }

    #[test]
    fn test_scanner_starts_zeroed() {
        // A response that starts with the terminator still needs all four bytes
        let mut scanner = HeaderScanner::new();
        assert!(!scanner.feed(b'\r'));
        assert!(!scanner.feed(b'\n'));
        assert!(!scanner.feed(b'\r'));
        assert!(scanner.feed(b'\n'));
        assert_eq!(scanner.header_len(), 4);
    }

    #[test]
    fn test_find_body_fallback() {
        assert_eq!(find_body(b"H: 1\r\n\r\n{}"), Some(9));
        assert_eq!(find_body(b"H: 1\n\n{}"), Some(7));
        assert_eq!(find_body(b"H: 1\r\n"), None);
    }

    proptest! {
        #[test]
        fn prop_terminator_found_once(
            header in "[A-Za-z0-9:/. -]{1,40}(\r\n[A-Za-z0-9:/. -]{1,40}){0,4}",
            body in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let mut stream = std::vec::Vec::new();
            stream.extend_from_slice(header.as_bytes());
            stream.extend_from_slice(&HEADER_TERMINATOR);
            stream.extend_from_slice(&body);

            let mut scanner = HeaderScanner::new();
            let hits: std::vec::Vec<usize> = stream
                .iter()
                .enumerate()
                .filter_map(|(i, &b)| scanner.feed(b).then_some(i + 1))
                .collect();
            prop_assert_eq!(hits, std::vec![header.len() + 4]);
        }
    }
}
