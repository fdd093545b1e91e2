//! Modem UART for STM32F7
//!
//! Wraps an embassy `BufferedUart`. The interrupt-driven ring buffer absorbs
//! bytes while the receive loop polls, so a byte is only lost if the poller
//! stalls for longer than the buffer takes to fill.

use embassy_stm32::usart::{self, BufferedUart, Error as UsartError};
use embedded_io::{Read, ReadReady, Write};
use windy_hal::uart::{DataBits, Parity, StopBits, UartConfig};
use windy_hal::{SerialRx, SerialTx, UartError};

/// Convert a tile UART configuration to the embassy one
pub fn usart_config(config: &UartConfig) -> usart::Config {
    let mut out = usart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Seven => usart::DataBits::DataBits7,
        DataBits::Eight => usart::DataBits::DataBits8,
        DataBits::Nine => usart::DataBits::DataBits9,
    };
    out.parity = match config.parity {
        Parity::None => usart::Parity::ParityNone,
        Parity::Even => usart::Parity::ParityEven,
        Parity::Odd => usart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => usart::StopBits::STOP1,
        StopBits::Two => usart::StopBits::STOP2,
    };
    out
}

fn map_error(e: UsartError) -> UartError {
    match e {
        UsartError::Framing => UartError::Framing,
        UsartError::Noise => UartError::Noise,
        UsartError::Overrun => UartError::Overrun,
        UsartError::Parity => UartError::Parity,
        _ => UartError::Other,
    }
}

/// Modem link on a buffered USART
pub struct ModemUart<'d> {
    uart: BufferedUart<'d>,
}

impl<'d> ModemUart<'d> {
    pub fn new(uart: BufferedUart<'d>) -> Self {
        Self { uart }
    }
}

impl SerialTx for ModemUart<'_> {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), UartError> {
        self.uart.write_all(data).map_err(map_error)
    }

    fn flush(&mut self) -> Result<(), UartError> {
        Write::flush(&mut self.uart).map_err(map_error)
    }
}

impl SerialRx for ModemUart<'_> {
    #[inline]
    fn try_read_byte(&mut self) -> Result<Option<u8>, UartError> {
        if !self.uart.read_ready().map_err(map_error)? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte).map_err(map_error)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}
