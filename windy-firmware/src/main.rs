//! Windy - weather map tile firmware
//!
//! Main firmware binary for the STM32F746G-DISCO. An ESP32 running the AT
//! firmware on USART6 provides the network; rendered maps are streamed as
//! raw RGB565 straight into SDRAM frame buffers scanned by the LTDC.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::fmc::Fmc;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::ltdc::{self, Ltdc, LtdcLayer, LtdcLayerConfig, PixelFormat};
use embassy_stm32::usart::{self, BufferedUart};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use windy_core::config::{parse_config, TileConfig};
use windy_core::{BufferSwapCoordinator, Session, Tile};
use windy_hal::uart::UartConfig;
use windy_hal_stm32f7::{usart_config, EmbassyClock, LtdcScanout, ModemUart};

mod board;

/// Embedded configuration (compiled into firmware)
/// Edit tile.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../tile.toml");

/// Frame regions in SDRAM: boot screen plus one per view
const REGIONS: usize = 3;

bind_interrupts!(struct Irqs {
    USART6 => usart::BufferedInterruptHandler<peripherals::USART6>;
    LTDC => ltdc::InterruptHandler<peripherals::LTDC>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
// Holds ~170 ms of line-rate data
static RX_BUF: StaticCell<[u8; 2048]> = StaticCell::new();

static TILE_CONFIG: StaticCell<TileConfig> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Windy tile starting...");

    let p = embassy_stm32::init(board::clock_config());
    info!("Peripherals initialized");

    let config: &'static TileConfig = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => TILE_CONFIG.init(config),
        Err(e) => defmt::panic!("tile.toml rejected: {}", e),
    };
    let frame = config.panel.frame_bytes();
    info!(
        "Config: {} views, {}x{} panel, server {}:{}",
        config.views.len(),
        config.panel.width,
        config.panel.height,
        config.server.host.as_str(),
        config.server.port
    );

    // SDRAM
    let mut sdram = Fmc::sdram_a12bits_d16bits_4banks_bank1(
        p.FMC,
        // A0-A11
        p.PF0, p.PF1, p.PF2, p.PF3, p.PF4, p.PF5, p.PF12, p.PF13, p.PF14, p.PF15, p.PG0, p.PG1,
        // BA0-BA1
        p.PG4, p.PG5,
        // D0-D15
        p.PD14, p.PD15, p.PD0, p.PD1, p.PE7, p.PE8, p.PE9, p.PE10, p.PE11, p.PE12, p.PE13,
        p.PE14, p.PE15, p.PD8, p.PD9, p.PD10,
        // NBL0-NBL1
        p.PE0, p.PE1,
        p.PC3,  // SDCKE0
        p.PG8,  // SDCLK
        p.PG15, // SDNCAS
        p.PH3,  // SDNE0
        p.PF11, // SDNRAS
        p.PH5,  // SDNWE
        board::Is42s32400f,
    );
    let ram = sdram.init(&mut Delay) as *mut u8;
    if ram as usize != board::SDRAM_BASE || REGIONS * frame > board::SDRAM_SIZE {
        defmt::panic!("SDRAM too small for {} frames of {} bytes", REGIONS, frame);
    }
    info!("SDRAM ready at {:#x}", ram as usize);

    // SAFETY: the FMC maps the initialised device at `ram`, the span fits
    // inside it (checked above) and nothing else in the program refers to
    // this memory
    let memory: &'static mut [u8] = unsafe { core::slice::from_raw_parts_mut(ram, REGIONS * frame) };
    memory.fill(0);
    let (region0, rest) = memory.split_at_mut(frame);
    let (region1, region2) = rest.split_at_mut(frame);

    // LCD
    let _display_on = Output::new(p.PI12, Level::High, Speed::Low);
    let _backlight = Output::new(p.PK3, Level::High, Speed::Low);
    let mut lcd = Ltdc::new_with_pins(
        p.LTDC, Irqs, p.PI14, p.PI10, p.PI9,
        // B0-B7
        p.PE4, p.PJ13, p.PJ14, p.PJ15, p.PG12, p.PK4, p.PK5, p.PK6,
        // G0-G7
        p.PJ7, p.PJ8, p.PJ9, p.PJ10, p.PJ11, p.PK0, p.PK1, p.PK2,
        // R0-R7
        p.PI15, p.PJ0, p.PJ1, p.PJ2, p.PJ3, p.PJ4, p.PJ5, p.PJ6,
    );
    board::route_lcd_data_enable();
    lcd.init(&board::panel_timing(&config.panel));
    lcd.init_layer(
        &LtdcLayerConfig {
            layer: LtdcLayer::Layer1,
            pixel_format: PixelFormat::RGB565,
            window_x0: 0,
            window_x1: config.panel.width,
            window_y0: 0,
            window_y1: config.panel.height,
        },
        None,
    );

    let buffers = match BufferSwapCoordinator::new([region0, region1, region2], 0, LtdcScanout::new()) {
        Ok(buffers) => buffers,
        Err(e) => defmt::panic!("frame regions rejected: {}", e),
    };
    info!("Display running");

    // Modem link
    let link = UartConfig::default();
    info!(
        "Modem link {} baud, {} ns per byte",
        link.baudrate,
        link.byte_period_ns()
    );
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 2048]);
    let uart = match BufferedUart::new(
        p.USART6,
        p.PC7,
        p.PC6,
        tx_buf,
        rx_buf,
        Irqs,
        usart_config(&link),
    ) {
        Ok(uart) => uart,
        Err(_) => defmt::panic!("USART6 configuration rejected"),
    };
    let session = Session::new(ModemUart::new(uart), EmbassyClock);

    let mut tile = Tile::new(session, buffers, config);
    info!("Entering tile loop");
    loop {
        tile.step();
    }
}
