//! Clock backed by the embassy time driver

use embassy_time::{block_for, Duration, Instant};
use windy_hal::Clock;

/// Millisecond clock from the embassy time driver
///
/// Delays busy-wait; the tile logic runs on a single thread and has nothing
/// else to do while it waits for the modem.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(ms as u64));
    }
}
