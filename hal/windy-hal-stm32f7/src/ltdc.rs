//! LTDC scan-out address
//!
//! The frame buffer address register is shadowed. Writing it and requesting a
//! vertical-blank reload makes the controller switch buffers between two
//! frames.

use embassy_stm32::pac::ltdc::vals::Vbr;
use embassy_stm32::pac::LTDC;
use windy_hal::ScanoutController;

/// LTDC layer used for the tile image
pub const IMAGE_LAYER: usize = 0;

/// Scan-out control of one LTDC layer
///
/// Construct only after the LTDC and the layer have been configured.
pub struct LtdcScanout {
    layer: usize,
}

impl LtdcScanout {
    pub fn new() -> Self {
        Self { layer: IMAGE_LAYER }
    }
}

impl Default for LtdcScanout {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanoutController for LtdcScanout {
    fn set_scan_address(&mut self, address: usize) {
        LTDC.layer(self.layer)
            .cfbar()
            .write(|w| w.set_cfbadd(address as u32));
        LTDC.srcr().write(|w| w.set_vbr(Vbr::RELOAD));
    }
}
