//! Board-agnostic core logic for the Windy tile firmware
//!
//! This crate contains everything between the raw serial link and the
//! application loop:
//!
//! - [`session::Session`]: exclusive owner of the modem link and clock
//! - [`engine::CommandEngine`]: AT command/response exchange with deadlines
//! - [`join::JoinSequencer`]: network association state machine
//! - [`download::StreamingDownloader`]: transparent-mode image streaming
//! - [`fetch`]: small buffered HTTP responses in command mode
//! - [`buffers`]: front/back frame buffer hand-off and view bookkeeping
//! - [`schedule`]: view rotation and refresh timing
//! - [`config`]: tile configuration types and parser
//! - [`tile::Tile`]: the application loop tying it all together
//!
//! Everything runs on a single thread, one operation after another. All
//! waits are polling loops bounded by an explicit [`session::Deadline`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod buffers;
pub mod config;
pub mod download;
pub mod engine;
pub mod fetch;
pub mod join;
pub mod schedule;
pub mod session;
pub mod tile;

#[cfg(test)]
pub(crate) mod sim;

pub use buffers::{BufferError, BufferSwapCoordinator, RegionId, ViewTable};
pub use download::{DownloadError, DownloadReport, DownloadRequest, StreamingDownloader};
pub use engine::{CommandEngine, CommandResult};
pub use join::{Association, Credentials, JoinFailure, JoinSequencer};
pub use session::{Deadline, Session, SessionError};
pub use tile::Tile;
