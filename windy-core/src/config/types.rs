//! Configuration type definitions

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest SSID accepted by the modem
pub const MAX_SSID_LEN: usize = 32;

/// Longest WPA2 passphrase
pub const MAX_PASSPHRASE_LEN: usize = 64;

pub const MAX_HOST_LEN: usize = 64;

pub const MAX_PATH_LEN: usize = 64;

/// Maximum view name length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum number of views
pub const MAX_VIEWS: usize = 2;

/// Access point credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WifiConfig {
    pub ssid: String<MAX_SSID_LEN>,
    pub passphrase: String<MAX_PASSPHRASE_LEN>,
}

/// Image server
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServerConfig {
    pub host: String<MAX_HOST_LEN>,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8080,
        }
    }
}

/// One image shown on the tile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewConfig {
    /// Name from the section header, e.g. `temperature`
    pub name: String<MAX_LABEL_LEN>,
    /// Request path of the raw RGB565 image
    pub path: String<MAX_PATH_LEN>,
}

/// Panel geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelConfig {
    pub width: u16,
    pub height: u16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 272,
        }
    }
}

impl PanelConfig {
    /// Bytes in one RGB565 frame
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 2
    }
}

/// Refresh and retry timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Period between downloads of every view
    pub refresh_s: u32,
    /// Time each view stays on screen
    pub flip_s: u32,
    /// Wait after a failed join or download
    pub retry_backoff_s: u32,
    /// Streaming budget per image
    pub download_deadline_s: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_s: 600,
            flip_s: 10,
            retry_backoff_s: 30,
            download_deadline_s: 90,
        }
    }
}

impl TimingConfig {
    pub fn refresh_ms(&self) -> u64 {
        self.refresh_s as u64 * 1000
    }

    pub fn flip_ms(&self) -> u64 {
        self.flip_s as u64 * 1000
    }

    pub fn retry_backoff_ms(&self) -> u64 {
        self.retry_backoff_s as u64 * 1000
    }

    pub fn download_deadline_ms(&self) -> u32 {
        self.download_deadline_s.saturating_mul(1000)
    }
}

/// Complete tile configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileConfig {
    pub wifi: WifiConfig,
    pub server: ServerConfig,
    pub views: Vec<ViewConfig, MAX_VIEWS>,
    pub panel: PanelConfig,
    pub timing: TimingConfig,
}

impl TileConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
