//! Simple TOML parser for tile configuration
//!
//! Handles only the subset the tile needs. It does NOT support the full TOML
//! spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer)
//! - [section] and [view.<name>] headers
//! - Basic strings with `\"` and `\\` escapes
//! - Comments (# ...), also after a value
//!
//! Unknown keys are ignored; `build.rs` rejects them before they get here.

use heapless::String;

use super::types::{TileConfig, ViewConfig, MAX_LABEL_LEN};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// String longer than its field
    ValueTooLong,
    /// Required field absent or empty
    MissingField(&'static str),
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Wifi,
    Server,
    View,
    Panel,
    Timing,
}

/// Parse TOML configuration into TileConfig
pub fn parse_config(input: &str) -> Result<TileConfig, ParseError> {
    let mut config = TileConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1], &mut config)?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    validate(&config)?;
    Ok(config)
}

/// Parse a header like "wifi" or "view.temperature"
fn parse_section_header(header: &str, config: &mut TileConfig) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some(name) = header.strip_prefix("view.") {
        if name.is_empty() || name.contains('.') {
            return Err(ParseError::InvalidSection);
        }
        let name: String<MAX_LABEL_LEN> =
            String::try_from(name).map_err(|_| ParseError::InvalidSection)?;
        config
            .views
            .push(ViewConfig {
                name,
                path: String::new(),
            })
            .map_err(|_| ParseError::TooManyItems)?;
        return Ok(Section::View);
    }

    match header {
        "wifi" => Ok(Section::Wifi),
        "server" => Ok(Section::Server),
        "panel" => Ok(Section::Panel),
        "timing" => Ok(Section::Timing),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut TileConfig,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Wifi, "ssid") => config.wifi.ssid = parse_string(value)?,
        (Section::Wifi, "passphrase") => config.wifi.passphrase = parse_string(value)?,

        (Section::Server, "host") => config.server.host = parse_string(value)?,
        (Section::Server, "port") => config.server.port = parse_int(value)?,

        (Section::View, "path") => {
            if let Some(view) = config.views.last_mut() {
                view.path = parse_string(value)?;
            }
        }

        (Section::Panel, "width") => config.panel.width = parse_int(value)?,
        (Section::Panel, "height") => config.panel.height = parse_int(value)?,

        (Section::Timing, "refresh_s") => config.timing.refresh_s = parse_int(value)?,
        (Section::Timing, "flip_s") => config.timing.flip_s = parse_int(value)?,
        (Section::Timing, "retry_backoff_s") => config.timing.retry_backoff_s = parse_int(value)?,
        (Section::Timing, "download_deadline_s") => {
            config.timing.download_deadline_s = parse_int(value)?
        }

        _ => {}
    }
    Ok(())
}

fn validate(config: &TileConfig) -> Result<(), ParseError> {
    if config.wifi.ssid.is_empty() {
        return Err(ParseError::MissingField("wifi.ssid"));
    }
    if config.server.host.is_empty() {
        return Err(ParseError::MissingField("server.host"));
    }
    if config.views.is_empty() {
        return Err(ParseError::MissingField("view"));
    }
    if config.views.iter().any(|v| v.path.is_empty()) {
        return Err(ParseError::MissingField("view.path"));
    }
    if config.panel.width == 0 || config.panel.height == 0 {
        return Err(ParseError::InvalidValue);
    }
    Ok(())
}

/// Cut a trailing `# comment` that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value into a bounded string
///
/// Quoted values have `\"` and `\\` unescaped. Unquoted values are taken
/// as-is.
fn parse_string<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    let inner = match value.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').ok_or(ParseError::InvalidValue)?,
        None => return String::try_from(value).map_err(|_| ParseError::ValueTooLong),
    };

    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        let c = match c {
            '\\' => match chars.next() {
                Some(e @ ('"' | '\\')) => e,
                _ => return Err(ParseError::InvalidValue),
            },
            c => c,
        };
        out.push(c).map_err(|_| ParseError::ValueTooLong)?;
    }
    Ok(out)
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}
