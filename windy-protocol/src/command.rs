//! AT command vocabulary
//!
//! Commands are case-sensitive and terminated with CR LF on the wire. The
//! builders below return the command text without the terminator; the
//! command engine appends it when sending.

use core::fmt::Write;

use heapless::String;

use crate::escape::{escape, MAX_ESCAPED_LEN};

/// Longest command line the builders produce
pub const MAX_COMMAND_LEN: usize = 288;

/// A complete command line, without terminator
pub type CommandLine = String<MAX_COMMAND_LEN>;

/// Line terminator appended to every command
pub const LINE_END: &[u8] = b"\r\n";

/// Out-of-band sequence leaving transparent mode
///
/// Only recognised when surrounded by at least one second of line silence.
pub const ESCAPE_SEQUENCE: &[u8] = b"+++";

// Fixed commands
pub const PROBE: &str = "AT";
pub const RESET: &str = "AT+RST";
pub const SINGLE_CONNECTION: &str = "AT+CIPMUX=0";
pub const STATION_MODE: &str = "AT+CWMODE=1";
pub const QUERY_ASSOCIATION: &str = "AT+CWJAP?";
pub const RAW_SEND: &str = "AT+CIPSEND";
pub const CLOSE_CONNECTION: &str = "AT+CIPCLOSE";
pub const TRANSPARENT_ENTER: &str = "AT+CIPMODE=1";
pub const TRANSPARENT_EXIT: &str = "AT+CIPMODE=0";

/// Response markers
pub mod marker {
    /// Generic command acknowledgement
    pub const OK: &str = "OK";
    /// Association query reports a remembered access point
    pub const ASSOCIATED: &str = "+CWJAP:";
    /// DHCP lease acquired after a join
    pub const GOT_IP: &str = "WIFI GOT IP";
    /// TCP connection established
    pub const CONNECTED: &str = "CONNECT";
    /// Raw send prompt
    pub const PROMPT: &str = ">";
    /// Remote closed the connection
    pub const CLOSED: &str = "CLOSED";
    /// Command rejected
    pub const ERROR: &str = "ERROR";
}

/// Command construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Arguments do not fit in the command buffer
    TooLong,
}

impl From<core::fmt::Error> for CommandError {
    fn from(_: core::fmt::Error) -> Self {
        CommandError::TooLong
    }
}

/// Build `AT+CWJAP="<ssid>","<passphrase>"`
///
/// Both arguments are escaped. Credentials longer than the escape buffer are
/// truncated there, never split inside an escape pair.
pub fn join(ssid: &str, passphrase: &str) -> Result<CommandLine, CommandError> {
    let ssid: String<MAX_ESCAPED_LEN> = escape(ssid);
    let passphrase: String<MAX_ESCAPED_LEN> = escape(passphrase);

    let mut line = CommandLine::new();
    write!(line, "AT+CWJAP=\"{}\",\"{}\"", ssid, passphrase)?;
    Ok(line)
}

/// Build `AT+CIPSTART="TCP","<host>",<port>`
pub fn open_tcp(host: &str, port: u16) -> Result<CommandLine, CommandError> {
    let mut line = CommandLine::new();
    write!(line, "AT+CIPSTART=\"TCP\",\"{}\",{}", host, port)?;
    Ok(line)
}

/// Build `AT+CIPSEND=<len>` for a fixed-length send
pub fn send_length(len: usize) -> Result<CommandLine, CommandError> {
    let mut line = CommandLine::new();
    write!(line, "AT+CIPSEND={}", len)?;
    Ok(line)
}
