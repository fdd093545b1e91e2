//! Network association
//!
//! The sequence is modelled as a pure state machine ([`JoinState`]) driven by
//! [`JoinSequencer`], which performs the modem exchange for each state and
//! feeds the outcome back as a [`JoinEvent`].

pub mod machine;
pub mod sequencer;

pub use machine::{Association, JoinEvent, JoinFailure, JoinState, PROBE_ATTEMPTS};
pub use sequencer::{Credentials, JoinSequencer};
