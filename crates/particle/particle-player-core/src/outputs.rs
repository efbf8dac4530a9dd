//! Output contracts from the player.
//!
//! Transforms go straight to the visual groups; Outputs only carries the
//! lifecycle signals raised since the previous update, for adapters to forward
//! as host events.

use serde::{Deserialize, Serialize};

use crate::ids::InstanceId;

/// Discrete lifecycle signals.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum CoreEvent {
    /// An instance was armed; `preempted` is true if it was still playing another run.
    Started {
        instance: InstanceId,
        preempted: bool,
    },
    /// A pass completed and the instance starts pass `loop_count`.
    Loop {
        instance: InstanceId,
        loop_count: u32,
    },
    /// The final pass completed; the instance is idle again.
    Finished { instance: InstanceId },
}

/// Outputs returned by ParticlePlayer::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn loops(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CoreEvent::Loop { .. }))
            .count()
    }

    pub fn finished(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CoreEvent::Finished { .. }))
            .count()
    }
}
