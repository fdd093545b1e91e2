//! Front/back region tracking

use windy_hal::ScanoutController;

/// Index of a frame region
pub type RegionId = usize;

/// Frame buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Index out of range
    NoSuchRegion,
    /// The region is being scanned out
    RegionIsFront,
    /// Regions differ in length
    SizeMismatch,
    /// View index out of range
    NoSuchView,
    /// View has no complete image yet
    ViewNotReady,
}

/// Owns `N` equally sized frame regions and the scan-out address
pub struct BufferSwapCoordinator<'a, S, const N: usize> {
    regions: [&'a mut [u8]; N],
    front: RegionId,
    back: RegionId,
    scanout: S,
}

impl<'a, S: ScanoutController, const N: usize> BufferSwapCoordinator<'a, S, N> {
    const AT_LEAST_TWO: () = assert!(N >= 2, "double buffering needs two regions");

    /// Take ownership of the regions and put `front` on screen
    pub fn new(
        regions: [&'a mut [u8]; N],
        front: RegionId,
        mut scanout: S,
    ) -> Result<Self, BufferError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::AT_LEAST_TWO;

        if front >= N {
            return Err(BufferError::NoSuchRegion);
        }
        let len = regions[0].len();
        if regions.iter().any(|r| r.len() != len) {
            return Err(BufferError::SizeMismatch);
        }

        scanout.set_scan_address(regions[front].as_ptr() as usize);
        Ok(Self {
            regions,
            front,
            back: (front + 1) % N,
            scanout,
        })
    }

    /// Region currently on screen
    pub fn front_region(&self) -> RegionId {
        self.front
    }

    /// Region [`swap`](Self::swap) would put on screen
    pub fn back_region(&self) -> RegionId {
        self.back
    }

    /// Address of the region on screen
    pub fn front(&self) -> usize {
        self.address(self.front)
    }

    /// Address of the back region
    pub fn back(&self) -> usize {
        self.address(self.back_region())
    }

    pub fn region_len(&self) -> usize {
        self.regions[0].len()
    }

    pub fn region_count(&self) -> usize {
        N
    }

    fn address(&self, region: RegionId) -> usize {
        self.regions[region].as_ptr() as usize
    }

    /// Exchange front and back
    ///
    /// Only call after the back region has been completely filled. The
    /// controller latches the new address at the next vertical blank.
    pub fn swap(&mut self) {
        self.scanout.set_scan_address(self.address(self.back));
        core::mem::swap(&mut self.front, &mut self.back);
    }

    /// Put an explicit region on screen
    ///
    /// The region that was on screen becomes the back region.
    pub fn present(&mut self, region: RegionId) -> Result<(), BufferError> {
        if region >= N {
            return Err(BufferError::NoSuchRegion);
        }
        if region != self.front {
            self.scanout.set_scan_address(self.address(region));
            self.back = self.front;
            self.front = region;
        }
        Ok(())
    }

    /// Read-only view of any region
    pub fn region(&self, region: RegionId) -> Result<&[u8], BufferError> {
        self.regions
            .get(region)
            .map(|r| &**r)
            .ok_or(BufferError::NoSuchRegion)
    }

    /// Writable view of a region that is not on screen
    pub fn write_target(&mut self, region: RegionId) -> Result<&mut [u8], BufferError> {
        if region >= N {
            return Err(BufferError::NoSuchRegion);
        }
        if region == self.front {
            return Err(BufferError::RegionIsFront);
        }
        Ok(&mut *self.regions[region])
    }

    /// Writable view of the back region
    pub fn back_mut(&mut self) -> &mut [u8] {
        let back = self.back_region();
        &mut *self.regions[back]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockScanout {
        address: usize,
        writes: usize,
    }

    impl ScanoutController for &mut MockScanout {
        fn set_scan_address(&mut self, address: usize) {
            self.address = address;
            self.writes += 1;
        }
    }

    #[test]
    fn test_new_programs_front() {
        let (mut a, mut b) = ([0u8; 8], [0u8; 8]);
        let mut scanout = MockScanout::default();
        let fb = BufferSwapCoordinator::new([&mut a, &mut b], 1, &mut scanout).unwrap();
        let front = fb.front();
        drop(fb);
        assert_eq!(scanout.address, front);
        assert_eq!(scanout.writes, 1);
    }

    #[test]
    fn test_swap_is_involution() {
        let (mut a, mut b) = ([0u8; 8], [0u8; 8]);
        let mut scanout = MockScanout::default();
        let mut fb = BufferSwapCoordinator::new([&mut a, &mut b], 0, &mut scanout).unwrap();

        let (front, back) = (fb.front(), fb.back());
        assert_ne!(front, back);
        fb.swap();
        assert_eq!((fb.front(), fb.back()), (back, front));
        fb.swap();
        assert_eq!((fb.front(), fb.back()), (front, back));
    }

    #[test]
    fn test_swap_is_involution_with_three_regions() {
        let (mut a, mut b, mut c) = ([0u8; 8], [0u8; 8], [0u8; 8]);
        let mut scanout = MockScanout::default();
        let mut fb =
            BufferSwapCoordinator::new([&mut a, &mut b, &mut c], 0, &mut scanout).unwrap();

        let start = (fb.front_region(), fb.back_region());
        assert_eq!(start, (0, 1));
        fb.swap();
        assert_eq!((fb.front_region(), fb.back_region()), (1, 0));
        fb.swap();
        assert_eq!((fb.front_region(), fb.back_region()), start);
    }

    #[test]
    fn test_present_makes_old_front_the_back() {
        let (mut a, mut b, mut c) = ([0u8; 8], [0u8; 8], [0u8; 8]);
        let mut scanout = MockScanout::default();
        let mut fb =
            BufferSwapCoordinator::new([&mut a, &mut b, &mut c], 0, &mut scanout).unwrap();

        fb.present(2).unwrap();
        assert_eq!((fb.front_region(), fb.back_region()), (2, 0));
        // Presenting the front again changes nothing
        fb.present(2).unwrap();
        assert_eq!((fb.front_region(), fb.back_region()), (2, 0));
        fb.swap();
        assert_eq!((fb.front_region(), fb.back_region()), (0, 2));
        let back = fb.back_mut().as_ptr() as usize;
        assert_ne!(back, fb.front());
    }

    #[test]
    fn test_swap_moves_scanout() {
        let (mut a, mut b) = ([0u8; 8], [0u8; 8]);
        let mut scanout = MockScanout::default();
        let mut fb = BufferSwapCoordinator::new([&mut a, &mut b], 0, &mut scanout).unwrap();
        let back = fb.back();
        fb.swap();
        drop(fb);
        assert_eq!(scanout.address, back);
        assert_eq!(scanout.writes, 2);
    }

    #[test]
    fn test_front_never_writable() {
        let (mut a, mut b, mut c) = ([0u8; 4], [0u8; 4], [0u8; 4]);
        let mut scanout = MockScanout::default();
        let mut fb =
            BufferSwapCoordinator::new([&mut a, &mut b, &mut c], 2, &mut scanout).unwrap();

        assert_eq!(fb.write_target(2).err(), Some(BufferError::RegionIsFront));
        assert_eq!(fb.write_target(3).err(), Some(BufferError::NoSuchRegion));
        fb.write_target(1).unwrap().fill(0x5A);
        fb.present(1).unwrap();
        assert_eq!(fb.write_target(1).err(), Some(BufferError::RegionIsFront));
        assert!(fb.write_target(2).is_ok());
        drop(fb);
        assert_eq!(b, [0x5A; 4]);
    }

    #[test]
    fn test_back_mut_is_back() {
        let (mut a, mut b) = ([0u8; 4], [0u8; 4]);
        let mut scanout = MockScanout::default();
        let mut fb = BufferSwapCoordinator::new([&mut a, &mut b], 0, &mut scanout).unwrap();
        let back = fb.back();
        assert_eq!(fb.back_mut().as_ptr() as usize, back);
    }

    #[test]
    fn test_present_front_is_noop() {
        let (mut a, mut b) = ([0u8; 4], [0u8; 4]);
        let mut scanout = MockScanout::default();
        let mut fb = BufferSwapCoordinator::new([&mut a, &mut b], 0, &mut scanout).unwrap();
        fb.present(0).unwrap();
        assert_eq!(fb.present(2), Err(BufferError::NoSuchRegion));
        drop(fb);
        assert_eq!(scanout.writes, 1);
    }

    #[test]
    fn test_rejects_bad_setup() {
        let (mut a, mut b) = ([0u8; 4], [0u8; 5]);
        let mut scanout = MockScanout::default();
        assert_eq!(
            BufferSwapCoordinator::new([&mut a, &mut b], 0, &mut scanout).err(),
            Some(BufferError::SizeMismatch)
        );
        let (mut a, mut b) = ([0u8; 4], [0u8; 4]);
        assert_eq!(
            BufferSwapCoordinator::new([&mut a, &mut b], 2, &mut scanout).err(),
            Some(BufferError::NoSuchRegion)
        );
    }
}
