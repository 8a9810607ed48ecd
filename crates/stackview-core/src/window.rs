use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const DEFAULT_OFFSET: u32 = 1;

/// The current slice cursor and the depth band shown around it.
///
/// The visible band is `[z - offset, z + offset]` clamped to `[0, max_z]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceWindow {
    z: i64,
    offset: u32,
    max_z: i64,
}

impl SliceWindow {
    pub fn new(max_z: i64, offset: u32) -> Self {
        Self {
            z: 0,
            offset,
            max_z: max_z.max(0),
        }
    }

    pub fn z(&self) -> i64 {
        self.z
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn max_z(&self) -> i64 {
        self.max_z
    }

    /// Moves the cursor, clamping into `[0, max_z]`. Returns the clamped slice.
    pub fn set_z(&mut self, z: i64) -> i64 {
        self.z = self.clamp(z);
        self.z
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.offset = offset;
    }

    pub fn clamp(&self, z: i64) -> i64 {
        z.clamp(0, self.max_z)
    }

    pub fn lower(&self) -> i64 {
        (self.z - i64::from(self.offset)).max(0)
    }

    pub fn upper(&self) -> i64 {
        (self.z + i64::from(self.offset)).min(self.max_z)
    }

    pub fn range(&self) -> RangeInclusive<i64> {
        self.lower()..=self.upper()
    }

    pub fn contains(&self, z: i64) -> bool {
        self.range().contains(&z)
    }

    /// Slice just below the band, which drops out when scrolling forward.
    pub fn previous_boundary(&self) -> Option<i64> {
        let prev = self.z - i64::from(self.offset) - 1;
        (0..=self.max_z).contains(&prev).then_some(prev)
    }

    /// Slice just above the band, which drops out when scrolling backward.
    pub fn next_boundary(&self) -> Option<i64> {
        let next = self.z + i64::from(self.offset) + 1;
        (0..=self.max_z).contains(&next).then_some(next)
    }
}

impl Default for SliceWindow {
    fn default() -> Self {
        Self::new(0, DEFAULT_OFFSET)
    }
}
