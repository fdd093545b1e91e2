//! UART serial communication abstractions
//!
//! The modem link is driven by polling: transmit blocks until the bytes are
//! queued, receive never blocks and reports whether a byte was pending.

/// Errors reported by a UART peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Framing error
    Framing,
    /// Noise error
    Noise,
    /// Receive overrun, at least one byte was lost
    Overrun,
    /// Parity error
    Parity,
    /// Transmit did not complete in time
    Timeout,
    /// Other error
    Other,
}

/// UART transmitter
pub trait SerialTx {
    /// Write data to the UART
    ///
    /// Blocks until all data has been accepted by the peripheral or an error
    /// occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), UartError>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), UartError>;
}

/// UART receiver
pub trait SerialRx {
    /// Read one byte if one is pending
    ///
    /// Must return immediately: `Ok(None)` when nothing has arrived. This is
    /// called once per byte while streaming, so implementations must not
    /// block, log or otherwise spend more than a fraction of a byte period.
    fn try_read_byte(&mut self) -> Result<Option<u8>, UartError>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait SerialPort: SerialTx + SerialRx {}

// Blanket implementation
impl<T: SerialTx + SerialRx> SerialPort for T {}

/// UART configuration
#[derive(Debug, Clone, Copy)]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Duration of one character on the wire in nanoseconds
    ///
    /// The streaming receive loop must finish each iteration well inside
    /// this budget.
    pub fn byte_period_ns(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        let bits: u64 = 1 + data + parity + stop;
        ((bits * 1_000_000_000) / u64::from(self.baudrate.max(1))) as u32
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_115200_8n1() {
        let config = UartConfig::default();
        assert_eq!(config.baudrate, 115200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
    }

    #[test]
    fn test_byte_period() {
        // 10 bits at 115200 baud is ~86.8 us
        let period = UartConfig::default().byte_period_ns();
        assert_eq!(period, 86_805);

        let slow = UartConfig {
            baudrate: 9600,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            ..UartConfig::default()
        };
        // 12 bits at 9600 baud
        assert_eq!(slow.byte_period_ns(), 1_250_000);
    }
}
