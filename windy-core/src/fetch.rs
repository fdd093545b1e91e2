//! Buffered HTTP GET in command mode
//!
//! For small text responses. The whole reply is collected in the engine's
//! scratch buffer, `+IPD` framing is stripped and the body is copied out.

use windy_hal::{Clock, SerialPort};
use windy_protocol::command::{self, marker, CLOSE_CONNECTION};
use windy_protocol::http::{find, find_body, get_request, HttpVersion};
use windy_protocol::IpdDecoder;

use crate::engine::CommandEngine;

pub const CONNECT_TIMEOUT_MS: u32 = 10_000;
pub const PROMPT_TIMEOUT_MS: u32 = 5_000;
pub const CLOSE_TIMEOUT_MS: u32 = 2_000;
/// Budget for the whole response
pub const RESPONSE_TIMEOUT_MS: u32 = 15_000;

/// Text fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchError {
    /// Host or path do not fit in a command or request
    RequestTooLong,
    ConnectFailed,
    PromptMissing,
    /// Request could not be written
    Transport,
    /// No blank line ending the header, or nothing after it
    EmptyBody,
}

/// Fetch `http://<host>:<port><path>` and copy the body into `out`
///
/// Returns the body length. Bodies longer than `out` are truncated.
pub fn fetch_text<P: SerialPort, C: Clock>(
    engine: &mut CommandEngine<'_, P, C>,
    host: &str,
    port: u16,
    path: &str,
    out: &mut [u8],
) -> Result<usize, FetchError> {
    let open = command::open_tcp(host, port).map_err(|_| FetchError::RequestTooLong)?;
    let request =
        get_request(path, host, HttpVersion::Http11).map_err(|_| FetchError::RequestTooLong)?;
    let send = command::send_length(request.len()).map_err(|_| FetchError::RequestTooLong)?;

    if !engine
        .execute(Some(open.as_str()), Some(marker::CONNECTED), CONNECT_TIMEOUT_MS)
        .succeeded
    {
        return Err(FetchError::ConnectFailed);
    }

    if !engine
        .execute(Some(send.as_str()), Some(marker::PROMPT), PROMPT_TIMEOUT_MS)
        .succeeded
    {
        engine.execute(Some(CLOSE_CONNECTION), None, CLOSE_TIMEOUT_MS);
        return Err(FetchError::PromptMissing);
    }

    engine
        .session()
        .send(request.as_bytes())
        .map_err(|_| FetchError::Transport)?;

    // The server closes the connection; a timeout still leaves usable text
    let reply = engine.receive_until(&[marker::CLOSED, marker::ERROR], RESPONSE_TIMEOUT_MS);
    let captured = reply.captured;
    debug!("fetch reply {} bytes", captured.len());

    let mut payload = [0u8; crate::engine::RESPONSE_CAPACITY];
    let mut len = IpdDecoder::new().decode(captured, &mut payload);
    if let Some(end) = find(&payload[..len], b"\r\nCLOSED") {
        len = end;
    }

    let start = find_body(&payload[..len]).ok_or(FetchError::EmptyBody)?;
    let body = &payload[start..len];
    if body.is_empty() {
        return Err(FetchError::EmptyBody);
    }

    let n = body.len().min(out.len());
    out[..n].copy_from_slice(&body[..n]);
    Ok(n)
}
