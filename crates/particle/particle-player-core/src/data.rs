//! Decoded frame table (FrameDataStore) and the small transform types shared with
//! the visual layer.

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;
use crate::stored_animation::{
    parse_particle_animation_json, FrameEntry, ParticleAnimation, SpriteRotation,
};

/// Position + Euler rotation (radians). Defaults to identity.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: [0.0; 3],
        rotation: [0.0; 3],
    };
}

/// State of one alive particle in one frame. Dead particles are stored as `None`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParticleFrameState {
    pub position: [f32; 3],
    /// Present only when the animation declares rotation data.
    pub rotation: Option<[f32; 3]>,
}

/// Immutable per-animation table of particle states across frames.
///
/// Invariants: `num_frames >= 1`, every frame holds exactly `num_particles` entries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDataStore {
    num_frames: usize,
    num_particles: usize,
    /// Row-major: `states[frame * num_particles + particle]`.
    states: Vec<Option<ParticleFrameState>>,
    /// State at each particle's first alive frame.
    rest: Vec<Option<ParticleFrameState>>,
    uses_rotation: bool,
    sprite_rotation: Option<[f32; 3]>,
}

impl FrameDataStore {
    /// Parse and decode in one step.
    pub fn from_json(s: &str, scale: f32) -> Result<Self, PlayerError> {
        let doc = parse_particle_animation_json(s)?;
        Self::decode(&doc, scale)
    }

    /// Decode a raw document: divide every component by `precision`, multiply positions
    /// by `scale`, and capture each particle's rest state on its first alive frame.
    pub fn decode(doc: &ParticleAnimation, scale: f32) -> Result<Self, PlayerError> {
        if doc.frames.is_empty() {
            return Err(PlayerError::malformed("animation has no frames"));
        }
        if !doc.precision.is_finite() || doc.precision == 0.0 {
            return Err(PlayerError::malformed(format!(
                "precision must be a non-zero number, got {}",
                doc.precision
            )));
        }

        let precision = doc.precision;
        let num_frames = doc.frames.len();
        let num_particles = doc.frames[0].len();
        let arity = if doc.rotation { 6 } else { 3 };

        let mut states = Vec::with_capacity(num_frames * num_particles);
        let mut rest: Vec<Option<ParticleFrameState>> = vec![None; num_particles];

        for (f, frame) in doc.frames.iter().enumerate() {
            if frame.len() != num_particles {
                return Err(PlayerError::malformed(format!(
                    "frame {f} has {} particles, expected {num_particles}",
                    frame.len()
                )));
            }
            for (p, entry) in frame.iter().enumerate() {
                let state = match entry {
                    FrameEntry::Marker(m) if *m == 0.0 => None,
                    FrameEntry::Marker(m) => {
                        return Err(PlayerError::malformed(format!(
                            "frame {f} particle {p}: unexpected marker {m}"
                        )));
                    }
                    FrameEntry::Values(v) => {
                        if v.len() < arity {
                            return Err(PlayerError::malformed(format!(
                                "frame {f} particle {p}: expected {arity} components, got {}",
                                v.len()
                            )));
                        }
                        let q = |i: usize| (v[i] / precision) as f32;
                        Some(ParticleFrameState {
                            position: [q(0) * scale, q(1) * scale, q(2) * scale],
                            rotation: doc.rotation.then(|| [q(3), q(4), q(5)]),
                        })
                    }
                };
                if state.is_some() && rest[p].is_none() {
                    rest[p] = state;
                }
                states.push(state);
            }
        }

        let sprite_rotation = match &doc.sprite_rotation {
            SpriteRotation::Flag(false) => None,
            SpriteRotation::Flag(true) => {
                return Err(PlayerError::malformed(
                    "sprite_rotation must be false or a 3-tuple",
                ));
            }
            SpriteRotation::Angles(a) => Some([
                (a[0] / precision) as f32,
                (a[1] / precision) as f32,
                (a[2] / precision) as f32,
            ]),
        };

        Ok(Self {
            num_frames,
            num_particles,
            states,
            rest,
            uses_rotation: doc.rotation,
            sprite_rotation,
        })
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    #[inline]
    pub fn num_particles(&self) -> usize {
        self.num_particles
    }

    #[inline]
    pub fn uses_rotation(&self) -> bool {
        self.uses_rotation
    }

    /// Decoded quad orientation offset carried by the document, if any.
    #[inline]
    pub fn sprite_rotation(&self) -> Option<[f32; 3]> {
        self.sprite_rotation
    }

    /// All particle entries of one frame.
    pub fn frame(&self, frame: usize) -> &[Option<ParticleFrameState>] {
        let start = frame * self.num_particles;
        &self.states[start..start + self.num_particles]
    }

    /// State of `particle` in `frame`; `None` if dead or out of range.
    #[inline]
    pub fn state(&self, frame: usize, particle: usize) -> Option<&ParticleFrameState> {
        if frame >= self.num_frames || particle >= self.num_particles {
            return None;
        }
        self.states[frame * self.num_particles + particle].as_ref()
    }

    /// State at the particle's first alive frame; `None` if it never appears.
    #[inline]
    pub fn rest_state(&self, particle: usize) -> Option<&ParticleFrameState> {
        self.rest.get(particle).and_then(Option::as_ref)
    }
}
