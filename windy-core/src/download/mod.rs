//! Transparent-mode image streaming
//!
//! Bodies of several hundred kilobytes arrive at line rate with no flow
//! control, so the receive loop copies each byte straight into its final
//! place in the destination region and does nothing else per byte.

pub mod downloader;
pub mod stream;

pub use downloader::{DownloadError, DownloadReport, DownloadRequest, StreamingDownloader};
pub use stream::StreamReceiver;
