//! Drives the join state machine against a live modem

use windy_hal::{Clock, SerialPort};
use windy_protocol::command::{self, marker, PROBE, QUERY_ASSOCIATION, RESET, STATION_MODE};

use super::machine::{Association, JoinEvent, JoinFailure, JoinState};
use crate::engine::CommandEngine;

/// Pause after the wake-up line before draining
pub const WAKE_SETTLE_MS: u32 = 100;
/// Gap between unanswered probes
pub const PROBE_GAP_MS: u32 = 300;
pub const PROBE_TIMEOUT_MS: u32 = 2_000;
pub const QUERY_TIMEOUT_MS: u32 = 2_000;
/// Time the modem needs to boot after `AT+RST`
pub const RESET_SETTLE_MS: u32 = 3_000;
pub const RESET_PROBE_TIMEOUT_MS: u32 = 3_000;
pub const MODE_TIMEOUT_MS: u32 = 3_000;
pub const JOIN_TIMEOUT_MS: u32 = 20_000;

/// Access point credentials
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub ssid: &'a str,
    pub passphrase: &'a str,
}

/// Establishes network connectivity, reusing a remembered association when
/// the modem still has one
pub struct JoinSequencer<'a> {
    credentials: Credentials<'a>,
    state: JoinState,
}

impl<'a> JoinSequencer<'a> {
    pub fn new(credentials: Credentials<'a>) -> Self {
        Self {
            credentials,
            state: JoinState::start(),
        }
    }

    /// Last state reached
    pub fn state(&self) -> JoinState {
        self.state
    }

    /// Run the sequence to a terminal state
    pub fn run<P: SerialPort, C: Clock>(
        &mut self,
        engine: &mut CommandEngine<'_, P, C>,
    ) -> Result<Association, JoinFailure> {
        self.state = JoinState::start();
        wake(engine);

        loop {
            match self.state {
                JoinState::Connected(how) => {
                    info!("network up ({})", how);
                    return Ok(how);
                }
                JoinState::Failed(failure) => {
                    warn!("join failed: {}", failure.reason());
                    return Err(failure);
                }
                state => {
                    let next = match self.perform(engine, state) {
                        Ok(event) => state.transition(event),
                        Err(failure) => JoinState::Failed(failure),
                    };
                    debug!("join {} -> {}", state, next);
                    self.state = next;
                }
            }
        }
    }

    fn perform<P: SerialPort, C: Clock>(
        &mut self,
        engine: &mut CommandEngine<'_, P, C>,
        state: JoinState,
    ) -> Result<JoinEvent, JoinFailure> {
        let responded = match state {
            JoinState::Probe { attempt } => {
                if attempt > 0 {
                    engine.session().delay_ms(PROBE_GAP_MS);
                }
                engine
                    .execute(Some(PROBE), Some(marker::OK), PROBE_TIMEOUT_MS)
                    .succeeded
            }
            JoinState::CheckExisting => {
                engine
                    .execute(Some(QUERY_ASSOCIATION), Some(marker::ASSOCIATED), QUERY_TIMEOUT_MS)
                    .succeeded
            }
            JoinState::Reset => {
                info!("resetting modem");
                // The reset banner is noise; it is drained by the probe below
                let _ = engine.session().send_line(RESET);
                engine.session().delay_ms(RESET_SETTLE_MS);
                engine.session().drain();
                engine
                    .execute(Some(PROBE), Some(marker::OK), RESET_PROBE_TIMEOUT_MS)
                    .succeeded
            }
            JoinState::ModeSet => {
                engine
                    .execute(Some(STATION_MODE), Some(marker::OK), MODE_TIMEOUT_MS)
                    .succeeded
            }
            JoinState::Join => {
                let line = command::join(self.credentials.ssid, self.credentials.passphrase)
                    .map_err(|_| JoinFailure::CredentialsTooLong)?;
                info!("joining '{}'", self.credentials.ssid);
                engine
                    .execute(Some(line.as_str()), Some(marker::GOT_IP), JOIN_TIMEOUT_MS)
                    .succeeded
            }
            JoinState::Connected(_) | JoinState::Failed(_) => true,
        };

        Ok(if responded {
            JoinEvent::Responded
        } else {
            JoinEvent::NoResponse
        })
    }
}

/// Terminate any half-typed command in the modem's line buffer
fn wake<P: SerialPort, C: Clock>(engine: &mut CommandEngine<'_, P, C>) {
    let session = engine.session();
    let _ = session.send_line("");
    session.delay_ms(WAKE_SETTLE_MS);
    session.drain();
}
