//! Frame buffer hand-off
//!
//! The display controller scans one region on its own; the firmware fills
//! the others. The coordinator is the only place that knows which region is
//! on screen, and it never hands that one out for writing.

pub mod coordinator;
pub mod views;

pub use coordinator::{BufferError, BufferSwapCoordinator, RegionId};
pub use views::ViewTable;
