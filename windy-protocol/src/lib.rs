//! Modem wire protocol
//!
//! This crate describes everything that crosses the serial link between the
//! MCU and the WiFi modem, without touching the link itself:
//!
//! - AT command lines and the response markers that complete them
//! - Credential escaping for quoted command arguments
//! - HTTP request lines and the byte-wise response header scanner
//! - `+IPD` de-framing for the non-transparent receive path
//!
//! # Link discipline
//!
//! ```text
//! command mode      MCU ──"AT+...\r\n"──▶ modem ──"...OK\r\n"──▶ MCU
//! transparent mode  MCU ──raw bytes────▶ modem ──raw TCP payload──▶ MCU
//!                   (left by 1 s idle, "+++", 1 s idle)
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod escape;
pub mod http;
pub mod ipd;

pub use command::{CommandError, CommandLine, MAX_COMMAND_LEN};
pub use escape::{escape, unescape, MAX_ESCAPED_LEN};
pub use http::{get_request, HeaderScanner, HttpVersion, RequestLine};
pub use ipd::IpdDecoder;
