//! STM32F746G-DISCO bring-up
//!
//! Clock tree, SDRAM chip description and LCD panel timing. Everything here
//! runs once at boot.

use embassy_stm32::ltdc::{LtdcConfiguration, PolarityActive, PolarityEdge};
use embassy_stm32::pac::gpio::vals;
use embassy_stm32::pac::GPIOK;
use embassy_stm32::rcc::{
    AHBPrescaler, APBPrescaler, Hse, HseMode, Pll, PllMul, PllPDiv, PllPreDiv, PllQDiv, PllRDiv,
    PllSource, Sysclk,
};
use embassy_stm32::time::Hertz;
use embassy_stm32::Config;
use stm32_fmc::{SdramChip, SdramConfiguration, SdramTiming};
use windy_core::config::PanelConfig;

/// FMC SDRAM bank 1
pub const SDRAM_BASE: usize = 0xC000_0000;

/// Usable SDRAM with the 16-bit bus wired on the board
pub const SDRAM_SIZE: usize = 8 * 1024 * 1024;

/// 216 MHz system clock from the 25 MHz crystal; PLLSAI/R at 9.6 MHz pixel
/// clock for the LTDC
pub fn clock_config() -> Config {
    let mut config = Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(25_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll_src = PllSource::HSE;
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::DIV25,
        mul: PllMul::MUL432,
        divp: Some(PllPDiv::DIV2),
        divq: Some(PllQDiv::DIV9),
        divr: None,
    });
    config.rcc.pllsai = Some(Pll {
        prediv: PllPreDiv::DIV25,
        mul: PllMul::MUL192,
        divp: None,
        divq: None,
        divr: Some(PllRDiv::DIV5),
    });
    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV4;
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config
}

// SDRAM mode register fields
const BURST_LENGTH_1: u16 = 0x0000;
const BURST_TYPE_SEQUENTIAL: u16 = 0x0000;
const CAS_LATENCY_3: u16 = 0x0030;
const OPERATING_MODE_STANDARD: u16 = 0x0000;
const WRITEBURST_MODE_SINGLE: u16 = 0x0200;

/// ISSI IS42S32400F, used on the 16-bit bus (4 banks, 12 row, 8 column bits)
pub struct Is42s32400f;

impl SdramChip for Is42s32400f {
    const MODE_REGISTER: u16 = BURST_LENGTH_1
        | BURST_TYPE_SEQUENTIAL
        | CAS_LATENCY_3
        | OPERATING_MODE_STANDARD
        | WRITEBURST_MODE_SINGLE;

    const CONFIG: SdramConfiguration = SdramConfiguration {
        column_bits: 8,
        row_bits: 12,
        memory_data_width: 16,
        internal_banks: 4,
        cas_latency: 3,
        write_protection: false,
        read_burst: true,
        read_pipe_delay_cycles: 0,
    };

    // Cycle counts at SDCLK = HCLK / 2 = 108 MHz
    const TIMING: SdramTiming = SdramTiming {
        startup_delay_ns: 100_000,
        max_sd_clock_hz: 108_000_000,
        refresh_period_ns: 15_625,
        mode_register_to_active: 2,
        exit_self_refresh: 7,
        active_to_precharge: 4,
        row_cycle: 7,
        row_precharge: 2,
        row_to_column: 2,
    };
}

/// RK043FN48H panel timing
pub fn panel_timing(panel: &PanelConfig) -> LtdcConfiguration {
    LtdcConfiguration {
        active_width: panel.width,
        active_height: panel.height,
        h_back_porch: 13,
        h_front_porch: 32,
        v_back_porch: 2,
        v_front_porch: 2,
        h_sync: 41,
        v_sync: 10,
        h_sync_polarity: PolarityActive::ActiveLow,
        v_sync_polarity: PolarityActive::ActiveLow,
        data_enable_polarity: PolarityActive::ActiveLow,
        pixel_clock_polarity: PolarityEdge::FallingEdge,
    }
}

/// Put PK7 on LCD_DE (AF14); the LTDC constructor does not take that pin
pub fn route_lcd_data_enable() {
    const PIN: usize = 7;
    GPIOK.moder().modify(|w| w.set_moder(PIN, vals::Moder::ALTERNATE));
    GPIOK.afr(PIN / 8).modify(|w| w.set_afr(PIN % 8, 14));
    GPIOK
        .ospeedr()
        .modify(|w| w.set_ospeedr(PIN, vals::Ospeedr::VERYHIGHSPEED));
}
