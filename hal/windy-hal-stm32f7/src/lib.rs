//! STM32F7-specific HAL for the Windy tile firmware
//!
//! This crate provides STM32F7 implementations of the `windy-hal` traits on
//! top of embassy-stm32:
//!
//! - [`uart::ModemUart`] - modem link over a `BufferedUart`
//! - [`time::EmbassyClock`] - millisecond clock from the embassy time driver
//! - [`ltdc::LtdcScanout`] - LTDC layer 1 frame buffer address
//!
//! # Features
//!
//! - `stm32f746ng` - STM32F746NGH6 (STM32F746G-DISCO)
//! - `stm32f769ni` - STM32F769NIH6 (STM32F769I-DISCO)
//! - `defmt` - Enable debug formatting support

#![no_std]

pub mod ltdc;
pub mod time;
pub mod uart;

pub use ltdc::LtdcScanout;
pub use time::EmbassyClock;
pub use uart::{usart_config, ModemUart};
