//! Particle Player Core (engine-agnostic)
//!
//! Replays precomputed particle animations: a decoded frame table is sampled over
//! time and driven onto a bounded pool of playback instances. Each instance owns
//! a group of externally rendered handles (see [`visual`]), its own timer, loop
//! counter and the random subset of particles it shows.
//!
//! Typical flow: parse a document with [`parse_particle_animation_json`], build a
//! [`ParticlePlayer`] with a [`VisualFactory`], call [`ParticlePlayer::activate`]
//! when the host wants a burst and [`ParticlePlayer::update`] once per tick.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod ids;
pub mod outputs;
pub mod pool;
pub mod sampling;
pub mod scratch;
pub mod stored_animation;
pub mod visual;

// Re-exports for consumers (adapters)
pub use config::{Blending, ImageInfo, LoopSetting, ParticleCount, PlayerConfig, Shader};
pub use data::{FrameDataStore, ParticleFrameState, Transform};
pub use engine::{Activation, ParticlePlayer};
pub use error::PlayerError;
pub use ids::InstanceId;
pub use outputs::{CoreEvent, Outputs};
pub use pool::{select_slot, InstanceState, PlaybackInstance, PlaybackPool};
pub use sampling::{frame_cursor, sample_particle, should_interpolate, FrameCursor};
pub use scratch::Scratch;
pub use stored_animation::{parse_particle_animation_json, FrameEntry, ParticleAnimation};
pub use visual::{RetainedFactory, RetainedGroup, VisualFactory, VisualGroup, VisualStyle};
