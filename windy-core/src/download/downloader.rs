//! Streaming HTTP/1.0 downloader
//!
//! Sequence per attempt:
//!
//! 1. single connection, transparent mode on
//! 2. open TCP connection
//! 3. raw send prompt, then the GET request
//! 4. stream: header scan, body written straight into the destination
//! 5. unwind: escape, transparent mode off, close
//!
//! Every exit after step 1 leaves the modem back in command mode.

use windy_hal::{Clock, SerialPort};
use windy_protocol::command::{
    self, marker, CLOSE_CONNECTION, ESCAPE_SEQUENCE, RAW_SEND, SINGLE_CONNECTION,
    TRANSPARENT_ENTER, TRANSPARENT_EXIT,
};
use windy_protocol::http::{get_request, HttpVersion};

use super::stream::StreamReceiver;
use crate::engine::CommandEngine;
use crate::session::Deadline;

pub const MODE_TIMEOUT_MS: u32 = 2_000;
pub const CONNECT_TIMEOUT_MS: u32 = 10_000;
pub const PROMPT_TIMEOUT_MS: u32 = 5_000;
/// Close after a refused prompt; no marker is awaited
pub const ABORT_CLOSE_TIMEOUT_MS: u32 = 2_000;
/// Streaming budget when the request carries no deadline
pub const DEFAULT_STREAM_DEADLINE_MS: u32 = 90_000;
/// Sleep between empty polls while streaming
///
/// The receive FIFO must hold at least this long at line rate.
pub const STREAM_POLL_MS: u32 = 2;
/// Guard silence around the escape sequence
pub const ESCAPE_GUARD_MS: u32 = 1_020;
pub const EXIT_TIMEOUT_MS: u32 = 3_000;
pub const CLOSE_TIMEOUT_MS: u32 = 1_000;

/// One download attempt
pub struct DownloadRequest<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
    /// Region the body is written into; must not be on screen
    pub destination: &'a mut [u8],
    /// Body length that counts as success
    pub expected_len: usize,
    /// End of the streaming phase; defaults to the downloader's stream
    /// budget counted from when the request is sent
    pub deadline: Option<Deadline>,
}

impl<'a> DownloadRequest<'a> {
    /// Request for a body filling the whole destination
    pub fn new(host: &'a str, port: u16, path: &'a str, destination: &'a mut [u8]) -> Self {
        let expected_len = destination.len();
        Self {
            host,
            port,
            path,
            destination,
            expected_len,
            deadline: None,
        }
    }

    pub fn with_expected_len(mut self, expected_len: usize) -> Self {
        self.expected_len = expected_len;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Summary of a completed download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DownloadReport {
    pub bytes_written: usize,
    pub header_len: usize,
    /// Duration of the streaming phase
    pub stream_ms: u64,
    /// Receive errors (overruns, framing) seen while streaming
    pub rx_errors: u32,
}

/// Download failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DownloadError {
    /// Host or path do not fit in a command or request
    RequestTooLong,
    /// Expected length exceeds the destination region
    DestinationTooSmall,
    /// Expected length is zero
    NothingExpected,
    /// Transparent mode refused
    ModeRejected,
    /// TCP connection not established
    ConnectFailed,
    /// No raw send prompt
    PromptMissing,
    /// Request could not be written
    Transport,
    /// Stream ended or stalled early; the destination holds a partial body
    Incomplete {
        bytes_written: usize,
        header_complete: bool,
    },
}

impl DownloadError {
    /// Body bytes written before the failure
    pub fn bytes_written(&self) -> usize {
        match self {
            DownloadError::Incomplete { bytes_written, .. } => *bytes_written,
            _ => 0,
        }
    }
}

/// Streams fixed-size binary bodies into caller-provided regions
pub struct StreamingDownloader<'e, 's, P, C> {
    engine: &'e mut CommandEngine<'s, P, C>,
    stream_budget_ms: u32,
}

impl<'e, 's, P: SerialPort, C: Clock> StreamingDownloader<'e, 's, P, C> {
    pub fn new(engine: &'e mut CommandEngine<'s, P, C>) -> Self {
        Self {
            engine,
            stream_budget_ms: DEFAULT_STREAM_DEADLINE_MS,
        }
    }

    /// Streaming time allowed for requests without an explicit deadline
    pub fn with_stream_budget(mut self, ms: u32) -> Self {
        self.stream_budget_ms = ms;
        self
    }

    /// Run one attempt
    ///
    /// Succeeds iff `expected_len` body bytes were written. On failure the
    /// destination contents are indeterminate.
    pub fn download(&mut self, request: DownloadRequest<'_>) -> Result<DownloadReport, DownloadError> {
        let DownloadRequest {
            host,
            port,
            path,
            destination,
            expected_len,
            deadline,
        } = request;

        if expected_len == 0 {
            return Err(DownloadError::NothingExpected);
        }
        let mut receiver =
            StreamReceiver::new(destination, expected_len).ok_or(DownloadError::DestinationTooSmall)?;
        let open = command::open_tcp(host, port).map_err(|_| DownloadError::RequestTooLong)?;
        let get = get_request(path, host, HttpVersion::Http10)
            .map_err(|_| DownloadError::RequestTooLong)?;

        info!("GET {}:{}{} ({} bytes)", host, port, path, expected_len);

        // Only mode 0 is valid for transparent transmission
        self.engine
            .execute(Some(SINGLE_CONNECTION), Some(marker::OK), MODE_TIMEOUT_MS);
        if !self
            .engine
            .execute(Some(TRANSPARENT_ENTER), Some(marker::OK), MODE_TIMEOUT_MS)
            .succeeded
        {
            return Err(DownloadError::ModeRejected);
        }

        if !self
            .engine
            .execute(Some(open.as_str()), Some(marker::CONNECTED), CONNECT_TIMEOUT_MS)
            .succeeded
        {
            self.engine
                .execute(Some(TRANSPARENT_EXIT), Some(marker::OK), MODE_TIMEOUT_MS);
            return Err(DownloadError::ConnectFailed);
        }

        if !self
            .engine
            .execute(Some(RAW_SEND), Some(marker::PROMPT), PROMPT_TIMEOUT_MS)
            .succeeded
        {
            self.engine
                .execute(Some(CLOSE_CONNECTION), None, ABORT_CLOSE_TIMEOUT_MS);
            self.engine
                .execute(Some(TRANSPARENT_EXIT), Some(marker::OK), MODE_TIMEOUT_MS);
            return Err(DownloadError::PromptMissing);
        }

        let budget = self.stream_budget_ms;
        let session = self.engine.session();
        let sent = session.send(get.as_bytes());
        let deadline = deadline.unwrap_or_else(|| session.deadline(budget));

        let started = session.now_ms();
        let errors_before = session.rx_errors();
        if sent.is_ok() {
            self.stream(&mut receiver, deadline);
        }
        let session = self.engine.session();
        let stream_ms = session.now_ms().saturating_sub(started);
        let rx_errors = session.rx_errors().wrapping_sub(errors_before);

        self.leave_transparent();

        if let Err(e) = sent {
            warn!("request not sent: {}", e);
            return Err(DownloadError::Transport);
        }

        let bytes_written = receiver.bytes_written();
        if receiver.is_complete() {
            let header_len = receiver.header_len().unwrap_or(0);
            info!(
                "download complete: {} bytes in {} ms, header {} bytes, {} rx errors",
                bytes_written, stream_ms, header_len, rx_errors
            );
            Ok(DownloadReport {
                bytes_written,
                header_len,
                stream_ms,
                rx_errors,
            })
        } else {
            warn!(
                "download incomplete: {}/{} bytes after {} ms, {} rx errors",
                bytes_written,
                receiver.expected(),
                stream_ms,
                rx_errors
            );
            Err(DownloadError::Incomplete {
                bytes_written,
                header_complete: receiver.in_body(),
            })
        }
    }

    /// Receive loop
    ///
    /// Each iteration costs one clock read and one non-blocking byte read.
    /// At 115200 baud a byte arrives every ~87 us, so nothing else may run
    /// here.
    fn stream(&mut self, receiver: &mut StreamReceiver<'_>, deadline: Deadline) {
        let session = self.engine.session();
        while !receiver.is_complete() {
            if deadline.is_expired(session.now_ms()) {
                break;
            }
            match session.try_read() {
                Some(byte) => {
                    receiver.push(byte);
                }
                None => session.delay_ms(STREAM_POLL_MS),
            }
        }
    }

    /// Return the modem to command mode and drop the connection
    fn leave_transparent(&mut self) {
        let session = self.engine.session();
        session.delay_ms(ESCAPE_GUARD_MS);
        let _ = session.send(ESCAPE_SEQUENCE);
        session.delay_ms(ESCAPE_GUARD_MS);

        self.engine
            .execute(Some(TRANSPARENT_EXIT), Some(marker::OK), EXIT_TIMEOUT_MS);
        self.engine
            .execute(Some(CLOSE_CONNECTION), Some(marker::OK), CLOSE_TIMEOUT_MS);
    }
}
