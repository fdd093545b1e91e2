//! Windy Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the tile logic is written against.
//! Chip-specific HALs implement them so the command engine, downloader and
//! buffer coordinator can run unchanged on the board or inside host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (windy-firmware)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  windy-core (session, engine, buffers)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  windy-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  windy-hal-   │
//!             │    stm32f7    │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialTx`], [`uart::SerialRx`] - Modem serial link
//! - [`time::Clock`] - Monotonic millisecond tick and busy delays
//! - [`scanout::ScanoutController`] - Display controller frame address

#![no_std]
#![deny(unsafe_code)]

pub mod scanout;
pub mod time;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use scanout::ScanoutController;
pub use time::Clock;
pub use uart::{SerialPort, SerialRx, SerialTx, UartError};
