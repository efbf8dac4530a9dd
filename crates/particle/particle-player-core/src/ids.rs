//! Identifiers for pooled playback instances.

use serde::{Deserialize, Serialize};

/// Slot of a playback instance inside its pool.
/// Stable for the lifetime of one pool build; a rebuild reuses the same dense range.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

impl InstanceId {
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
