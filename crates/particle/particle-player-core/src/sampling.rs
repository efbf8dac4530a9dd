//! Frame sampling for the per-tick driver.
//!
//! Model:
//! - An instance's elapsed time maps linearly onto `[0, num_frames)`; the integer part
//!   picks the frame, the fractional part blends toward the next frame.
//! - Positions interpolate linearly; rotations always snap to the current frame.
//! - Interpolation is skipped when a frame lasts no longer than the tick.
//!
//! API:
//! - should_interpolate(requested, duration_ms, num_frames, delta_ms)
//! - frame_cursor(elapsed_ms, duration_ms, num_frames, interpolate)
//! - sample_particle(&FrameDataStore, &FrameCursor, particle)

use crate::data::{FrameDataStore, ParticleFrameState};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

/// Where an instance sits in the frame table this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCursor {
    pub index: usize,
    /// Frame to blend toward; `None` when not interpolating or at the last frame.
    pub next: Option<usize>,
    /// Blend factor in `[0, 1)`.
    pub blend: f32,
}

/// Interpolate only if asked to and a frame outlasts the tick.
#[inline]
pub fn should_interpolate(requested: bool, duration_ms: f32, num_frames: usize, delta_ms: f32) -> bool {
    requested && num_frames > 0 && duration_ms / num_frames as f32 > delta_ms
}

/// Map elapsed time to a frame index, clamped into `[0, num_frames - 1]`.
///
/// Non-finite or negative positions land on frame 0; `elapsed == duration` lands on
/// the last frame.
pub fn frame_cursor(
    elapsed_ms: f32,
    duration_ms: f32,
    num_frames: usize,
    interpolate: bool,
) -> FrameCursor {
    let last = num_frames.saturating_sub(1);
    let frame = if duration_ms > 0.0 {
        elapsed_ms / duration_ms * num_frames as f32
    } else {
        0.0
    };
    if !frame.is_finite() || frame <= 0.0 {
        return FrameCursor {
            index: 0,
            next: (interpolate && last > 0).then_some(1),
            blend: 0.0,
        };
    }
    let floor = frame.floor();
    let index = (floor as usize).min(last);
    let next = if interpolate && index < last {
        Some(index + 1)
    } else {
        None
    };
    FrameCursor {
        index,
        next,
        blend: (frame - floor).clamp(0.0, 1.0),
    }
}

/// Evaluate one particle at `cursor`. Returns `None` when it is dead in the current frame.
pub fn sample_particle(
    store: &FrameDataStore,
    cursor: &FrameCursor,
    particle: usize,
) -> Option<ParticleFrameState> {
    let current = store.state(cursor.index, particle)?;
    let position = match cursor.next.and_then(|n| store.state(n, particle)) {
        Some(next) => lerp_vec3(current.position, next.position, cursor.blend),
        None => current.position,
    };
    Some(ParticleFrameState {
        position,
        rotation: current.rotation,
    })
}
