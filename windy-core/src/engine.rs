//! AT command/response exchange
//!
//! [`CommandEngine::execute`] sends one command line and accumulates the
//! modem's reply until an expected marker shows up or the deadline passes.
//! Replies are kept in a bounded scratch buffer owned by the engine; bytes
//! beyond its capacity are dropped.

use heapless::{String, Vec};
use windy_hal::{Clock, SerialPort};

use crate::session::{Deadline, Session};

/// Capacity of the response scratch buffer
pub const RESPONSE_CAPACITY: usize = 2048;

/// Silence that ends one accumulation round
pub const IDLE_ROUND_MS: u32 = 200;

/// Sleep between empty polls of the link
pub const POLL_INTERVAL_MS: u32 = 1;

/// Characters shown in a failure preview
pub const PREVIEW_LEN: usize = 80;

/// Printable rendering of the start of a response
pub type Preview = String<PREVIEW_LEN>;

/// Outcome of one command exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResult<'a> {
    /// Marker seen (or, with no marker, a reply was received) in time
    pub succeeded: bool,
    /// Everything received, up to [`RESPONSE_CAPACITY`] bytes
    pub captured: &'a [u8],
}

impl CommandResult<'_> {
    /// First [`PREVIEW_LEN`] received bytes, non-printables as `.`
    pub fn preview(&self) -> Preview {
        preview(self.captured)
    }
}

/// Render bytes for a log line
pub fn preview(bytes: &[u8]) -> Preview {
    bytes
        .iter()
        .take(PREVIEW_LEN)
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

/// Issues commands over a borrowed [`Session`]
pub struct CommandEngine<'s, P, C> {
    session: &'s mut Session<P, C>,
    scratch: Vec<u8, RESPONSE_CAPACITY>,
}

impl<'s, P: SerialPort, C: Clock> CommandEngine<'s, P, C> {
    pub fn new(session: &'s mut Session<P, C>) -> Self {
        Self {
            session,
            scratch: Vec::new(),
        }
    }

    /// Underlying session, for raw writes and streaming
    pub fn session(&mut self) -> &mut Session<P, C> {
        self.session
    }

    /// Send `command` (if any) and wait for `marker`
    ///
    /// Pending input is drained first so stale replies cannot satisfy the
    /// marker. The marker may appear anywhere in the accumulated reply.
    /// Without a marker the exchange succeeds at the end of the first idle
    /// round that follows at least one received byte. Either way the
    /// exchange fails once `timeout_ms` has passed since the command was
    /// sent.
    pub fn execute(
        &mut self,
        command: Option<&str>,
        marker: Option<&str>,
        timeout_ms: u32,
    ) -> CommandResult<'_> {
        self.session.drain();
        self.scratch.clear();

        if let Some(command) = command {
            trace!("AT> {}", command);
            if let Err(e) = self.session.send_line(command) {
                warn!("AT! send failed: {}", e);
                return CommandResult {
                    succeeded: false,
                    captured: &self.scratch,
                };
            }
        }

        let deadline = self.session.deadline(timeout_ms);
        let markers = marker.map(str::as_bytes);
        let succeeded = self.collect(markers.as_slice(), marker.is_none(), deadline);
        if !succeeded {
            warn!(
                "AT! no '{}' within {} ms, got: {}",
                marker.unwrap_or("<reply>"),
                timeout_ms,
                preview(&self.scratch).as_str()
            );
        }

        CommandResult {
            succeeded,
            captured: &self.scratch,
        }
    }

    /// Keep accumulating, without draining or sending, until any of
    /// `markers` appears or `timeout_ms` passes
    ///
    /// Used after a raw write, where the reply follows data the engine did
    /// not send itself.
    pub fn receive_until(&mut self, markers: &[&str], timeout_ms: u32) -> CommandResult<'_> {
        self.scratch.clear();
        let deadline = self.session.deadline(timeout_ms);

        let mut wanted: Vec<&[u8], 4> = Vec::new();
        for marker in markers.iter().take(4) {
            // capacity checked by take()
            let _ = wanted.push(marker.as_bytes());
        }
        let succeeded = self.collect(&wanted, false, deadline);

        CommandResult {
            succeeded,
            captured: &self.scratch,
        }
    }

    fn collect(&mut self, markers: &[&[u8]], reply_is_enough: bool, deadline: Deadline) -> bool {
        // Time the current round last saw a byte; None between rounds
        let mut last_rx: Option<u64> = None;

        loop {
            let now = self.session.now_ms();
            if deadline.is_expired(now) {
                return false;
            }

            match self.session.try_read() {
                Some(byte) => {
                    if self.scratch.push(byte).is_ok()
                        && markers.iter().any(|m| self.scratch.ends_with(m))
                    {
                        return true;
                    }
                    last_rx = Some(now);
                }
                None => {
                    if let Some(seen) = last_rx {
                        if now.saturating_sub(seen) >= IDLE_ROUND_MS as u64 {
                            if reply_is_enough {
                                return true;
                            }
                            last_rx = None;
                        }
                    }
                    self.session.delay_ms(POLL_INTERVAL_MS);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimModem};
    use proptest::prelude::*;

    #[test]
    fn test_marker_found() {
        let clock = SimClock::new();
        let modem = SimModem::new(&clock).on("AT", b"AT\r\n\r\nOK\r\n");
        let mut session = Session::new(modem, &clock);
        let mut engine = CommandEngine::new(&mut session);

        let result = engine.execute(Some("AT"), Some("OK"), 2000);
        assert!(result.succeeded);
        assert!(result.captured.ends_with(b"OK"));
        assert!(clock.now() < 10);
    }

    #[test]
    fn test_marker_in_later_chunk() {
        let clock = SimClock::new();
        let modem = SimModem::new(&clock).on_chunks(
            "AT+CWJAP=",
            vec![
                (10, b"WIFI CONNECTED\r\n".to_vec()),
                (900, b"WIFI GOT IP\r\n".to_vec()),
            ],
        );
        let mut session = Session::new(modem, &clock);
        let mut engine = CommandEngine::new(&mut session);

        let result = engine.execute(Some("AT+CWJAP=\"a\",\"b\""), Some("WIFI GOT IP"), 20_000);
        assert!(result.succeeded);
        assert!(clock.now() >= 900 && clock.now() < 1000);
    }

    #[test]
    fn test_stale_input_is_drained() {
        let clock = SimClock::new();
        let mut modem = SimModem::new(&clock);
        modem.inject(b"OK\r\n");
        let mut session = Session::new(modem, &clock);
        let mut engine = CommandEngine::new(&mut session);

        let result = engine.execute(Some("AT"), Some("OK"), 500);
        assert!(!result.succeeded);
        assert!(result.captured.is_empty());
    }

    #[test]
    fn test_no_marker_succeeds_after_idle_round() {
        let clock = SimClock::new();
        let modem = SimModem::new(&clock).on_chunks("AT+CIPCLOSE", vec![(50, b"CLOSED\r\n".to_vec())]);
        let mut session = Session::new(modem, &clock);
        let mut engine = CommandEngine::new(&mut session);

        let result = engine.execute(Some("AT+CIPCLOSE"), None, 2000);
        assert!(result.succeeded);
        assert_eq!(result.captured, b"CLOSED\r\n");
        assert!(clock.now() >= 250 && clock.now() <= 252);
    }

    #[test]
    fn test_no_marker_fails_on_silence() {
        let clock = SimClock::new();
        let mut session = Session::new(SimModem::new(&clock), &clock);
        let mut engine = CommandEngine::new(&mut session);

        let result = engine.execute(Some("AT+CIPCLOSE"), None, 2000);
        assert!(!result.succeeded);
        assert_eq!(clock.now(), 2000);
    }

    #[test]
    fn test_idle_round_does_not_end_marker_wait() {
        let clock = SimClock::new();
        let modem = SimModem::new(&clock).on_chunks(
            "AT+CIPSTART=",
            vec![(5, b"busy p...\r\n".to_vec()), (1500, b"CONNECT\r\n".to_vec())],
        );
        let mut session = Session::new(modem, &clock);
        let mut engine = CommandEngine::new(&mut session);

        let result = engine.execute(Some("AT+CIPSTART=\"TCP\",\"h\",80"), Some("CONNECT"), 10_000);
        assert!(result.succeeded);
    }

    #[test]
    fn test_overflow_keeps_first_bytes() {
        let clock = SimClock::new();
        let noise = [b'x'; RESPONSE_CAPACITY + 100];
        let modem = SimModem::new(&clock).on("AT", &noise);
        let mut session = Session::new(modem, &clock);
        let mut engine = CommandEngine::new(&mut session);

        let result = engine.execute(Some("AT"), Some("OK"), 300);
        assert!(!result.succeeded);
        assert_eq!(result.captured.len(), RESPONSE_CAPACITY);
    }

    #[test]
    fn test_receive_until_any_marker() {
        let clock = SimClock::new();
        let mut modem = SimModem::new(&clock);
        modem.inject(b"+IPD,2:hi\r\nCLOSED");
        let mut session = Session::new(modem, &clock);
        let mut engine = CommandEngine::new(&mut session);

        let result = engine.receive_until(&["CLOSED", "ERROR"], 15_000);
        assert!(result.succeeded);
        assert_eq!(result.captured, b"+IPD,2:hi\r\nCLOSED");
    }

    #[test]
    fn test_preview_masks_control_bytes() {
        let p = preview(b"AT\r\nERROR\x00\xff");
        assert_eq!(p.as_str(), "AT..ERROR..");
    }

    #[test]
    fn test_preview_truncates() {
        let long = [b'a'; 200];
        assert_eq!(preview(&long).len(), PREVIEW_LEN);
    }

    proptest! {
        #[test]
        fn prop_silent_modem_fails_at_timeout(timeout in 1u32..5_000) {
            let clock = SimClock::new();
            let mut session = Session::new(SimModem::new(&clock), &clock);
            let mut engine = CommandEngine::new(&mut session);

            let start = clock.now();
            let result = engine.execute(Some("AT"), Some("OK"), timeout);
            let elapsed = clock.now() - start;

            prop_assert!(!result.succeeded);
            prop_assert!(elapsed >= timeout as u64);
            prop_assert!(elapsed <= timeout as u64 + POLL_INTERVAL_MS as u64);
        }
    }
}
