//! Modem session
//!
//! A [`Session`] exclusively owns the serial link to the modem and the
//! monotonic clock. Every higher layer borrows it mutably for the duration of
//! one operation, so the link is never shared.

use windy_hal::{Clock, SerialPort, UartError};
use windy_protocol::command::LINE_END;

/// Upper bound on bytes discarded by a single [`Session::drain`]
///
/// Keeps draining bounded even if the modem streams without pause.
pub const DRAIN_LIMIT: usize = 4096;

/// Transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// Writing to the modem failed
    Transmit(UartError),
}

impl From<UartError> for SessionError {
    fn from(e: UartError) -> Self {
        SessionError::Transmit(e)
    }
}

/// Absolute point in time on the session clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    at_ms: u64,
}

impl Deadline {
    /// Deadline at an absolute clock reading
    pub const fn at(at_ms: u64) -> Self {
        Self { at_ms }
    }

    /// Deadline `timeout_ms` after `now_ms`
    pub const fn after(now_ms: u64, timeout_ms: u32) -> Self {
        Self {
            at_ms: now_ms.saturating_add(timeout_ms as u64),
        }
    }

    /// Clock reading at which the deadline passes
    pub const fn instant_ms(&self) -> u64 {
        self.at_ms
    }

    #[inline]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.at_ms
    }

    /// Milliseconds left, zero once expired
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.at_ms.saturating_sub(now_ms)
    }
}

/// Exclusive owner of the modem link and clock
pub struct Session<P, C> {
    port: P,
    clock: C,
    rx_errors: u32,
}

impl<P: SerialPort, C: Clock> Session<P, C> {
    pub fn new(port: P, clock: C) -> Self {
        Self {
            port,
            clock,
            rx_errors: 0,
        }
    }

    /// Write raw bytes and wait until they have left the transmitter
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.port.write_blocking(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    /// Write a command line terminated by CR LF
    pub fn send_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.port.write_blocking(line.as_bytes())?;
        self.port.write_blocking(LINE_END)?;
        self.port.flush()?;
        Ok(())
    }

    /// Take one received byte if one is pending
    ///
    /// Never waits. Line errors (framing, overrun, noise) drop the affected
    /// byte and are counted in [`Session::rx_errors`].
    #[inline]
    pub fn try_read(&mut self) -> Option<u8> {
        match self.port.try_read_byte() {
            Ok(byte) => byte,
            Err(_) => {
                self.rx_errors = self.rx_errors.wrapping_add(1);
                None
            }
        }
    }

    /// Discard everything currently pending on the link, without waiting
    ///
    /// Returns the number of bytes thrown away.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while dropped < DRAIN_LIMIT {
            match self.port.try_read_byte() {
                Ok(Some(_)) => dropped += 1,
                Ok(None) => break,
                Err(_) => self.rx_errors = self.rx_errors.wrapping_add(1),
            }
        }
        if dropped > 0 {
            trace!("drained {} stale bytes", dropped);
        }
        dropped
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }

    /// Deadline `timeout_ms` from now
    pub fn deadline(&self, timeout_ms: u32) -> Deadline {
        Deadline::after(self.clock.now_ms(), timeout_ms)
    }

    /// Receive errors seen since the session was created
    pub fn rx_errors(&self) -> u32 {
        self.rx_errors
    }

    pub fn into_parts(self) -> (P, C) {
        (self.port, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimModem};

    #[test]
    fn test_deadline_expiry() {
        let d = Deadline::after(100, 50);
        assert_eq!(d.instant_ms(), 150);
        assert!(!d.is_expired(149));
        assert!(d.is_expired(150));
        assert_eq!(d.remaining_ms(120), 30);
        assert_eq!(d.remaining_ms(200), 0);
    }

    #[test]
    fn test_deadline_saturates() {
        let d = Deadline::after(u64::MAX - 1, 10);
        assert_eq!(d.instant_ms(), u64::MAX);
    }

    #[test]
    fn test_send_line_appends_crlf() {
        let clock = SimClock::new();
        let mut session = Session::new(SimModem::new(&clock), &clock);
        session.send_line("AT").unwrap();
        let (modem, _) = session.into_parts();
        assert_eq!(modem.lines(), ["AT"]);
    }

    #[test]
    fn test_drain_discards_pending_bytes() {
        let clock = SimClock::new();
        let mut modem = SimModem::new(&clock);
        modem.inject(b"garbage\r\n");
        let mut session = Session::new(modem, &clock);
        assert_eq!(session.drain(), 9);
        assert_eq!(session.try_read(), None);
        assert_eq!(session.drain(), 0);
    }

    #[test]
    fn test_read_errors_are_counted() {
        let clock = SimClock::new();
        let mut modem = SimModem::new(&clock);
        modem.inject_error(UartError::Framing);
        modem.inject(b"A");
        let mut session = Session::new(modem, &clock);
        assert_eq!(session.try_read(), None);
        assert_eq!(session.try_read(), Some(b'A'));
        assert_eq!(session.rx_errors(), 1);
    }
}
