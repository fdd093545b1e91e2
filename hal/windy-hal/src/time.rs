//! Monotonic time source
//!
//! All waits in the tile logic are bounded polling loops measured against
//! this clock.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin; never goes backwards
    fn now_ms(&self) -> u64;

    /// Busy-wait for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
