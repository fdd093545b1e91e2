//! Display controller scan-out address
//!
//! The controller reads a frame buffer continuously. Changing the address is
//! latched by the hardware at the next vertical blank, so a caller never sees
//! a frame stitched from two buffers.

/// Display controller that scans a frame buffer autonomously
pub trait ScanoutController {
    /// Request scan-out from `address` starting at the next vertical blank
    fn set_scan_address(&mut self, address: usize);
}
