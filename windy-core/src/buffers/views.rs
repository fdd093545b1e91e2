//! Which region holds which view
//!
//! Each configured view (temperature map, humidity map, ...) owns at most one
//! region: the one holding its last complete image. A region being
//! downloaded into belongs to no view until the download succeeds.

use windy_hal::ScanoutController;

use super::coordinator::{BufferError, BufferSwapCoordinator, RegionId};

/// Maps `V` views onto frame regions
#[derive(Debug, Clone)]
pub struct ViewTable<const V: usize> {
    slots: [Option<RegionId>; V],
}

impl<const V: usize> Default for ViewTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const V: usize> ViewTable<V> {
    pub const fn new() -> Self {
        Self { slots: [None; V] }
    }

    /// Region holding the view's last complete image
    pub fn region(&self, view: usize) -> Option<RegionId> {
        self.slots.get(view).copied().flatten()
    }

    pub fn is_ready(&self, view: usize) -> bool {
        self.region(view).is_some()
    }

    fn held_by_any(&self, region: RegionId) -> bool {
        self.slots.iter().any(|slot| *slot == Some(region))
    }

    /// Pick the region to download `view` into
    ///
    /// Prefers a region that is neither on screen nor holding any view, so
    /// the old image stays presentable if the download fails. Falls back to
    /// the view's own region when that is off screen. Returns `None` when
    /// every off-screen region holds another view.
    pub fn download_target(&self, view: usize, front: RegionId, regions: usize) -> Option<RegionId> {
        if view >= V {
            return None;
        }
        (0..regions)
            .find(|&r| r != front && !self.held_by_any(r))
            .or_else(|| self.region(view).filter(|&own| own != front))
    }

    /// Forget the view's image, e.g. before overwriting its region
    pub fn invalidate(&mut self, view: usize) {
        if let Some(slot) = self.slots.get_mut(view) {
            *slot = None;
        }
    }

    /// Record a completed download
    pub fn commit(&mut self, view: usize, region: RegionId) -> Result<(), BufferError> {
        if view >= V {
            return Err(BufferError::NoSuchView);
        }
        for slot in self.slots.iter_mut() {
            if *slot == Some(region) {
                *slot = None;
            }
        }
        self.slots[view] = Some(region);
        Ok(())
    }

    /// Put a view on screen
    pub fn present<S: ScanoutController, const N: usize>(
        &self,
        view: usize,
        buffers: &mut BufferSwapCoordinator<'_, S, N>,
    ) -> Result<(), BufferError> {
        if view >= V {
            return Err(BufferError::NoSuchView);
        }
        let region = self.region(view).ok_or(BufferError::ViewNotReady)?;
        buffers.present(region)
    }

    /// Put any ready view other than `view` on screen
    ///
    /// Frees `view`'s own region for writing when it is on screen and no
    /// other region is available.
    pub fn present_other<S: ScanoutController, const N: usize>(
        &self,
        view: usize,
        buffers: &mut BufferSwapCoordinator<'_, S, N>,
    ) -> Result<usize, BufferError> {
        let other = (0..V)
            .filter(|&v| v != view)
            .find(|&v| self.is_ready(v))
            .ok_or(BufferError::ViewNotReady)?;
        self.present(other, buffers)?;
        Ok(other)
    }
}
