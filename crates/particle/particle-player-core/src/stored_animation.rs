use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Public API: parse a particle animation JSON document into its raw (still quantized) form.
///
/// Notes:
/// - `frames[f][p]` is either a coordinate tuple `[x,y,z]` / `[x,y,z,rx,ry,rz]` or the
///   number `0`, meaning particle `p` is not alive in frame `f`.
/// - Every numeric component is an integer scaled by `precision`; decoding happens in
///   [`crate::data::FrameDataStore::decode`].
/// - `sprite_rotation` is either `false` or a 3-tuple scaled by `precision`.
pub fn parse_particle_animation_json(s: &str) -> Result<ParticleAnimation, PlayerError> {
    let doc: ParticleAnimation = serde_json::from_str(s)?;
    Ok(doc)
}

/// Raw animation document as exported by the particle baking tools.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParticleAnimation {
    pub frames: Vec<Vec<FrameEntry>>,
    /// Divisor applied to every numeric component.
    pub precision: f64,
    /// Whether frame tuples carry Euler rotation after the position.
    #[serde(default)]
    pub rotation: bool,
    #[serde(default)]
    pub sprite_rotation: SpriteRotation,
}

/// One particle in one frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FrameEntry {
    Values(Vec<f64>),
    /// Only `0` ("not alive") is meaningful; other markers are rejected on decode.
    Marker(f64),
}

impl FrameEntry {
    pub const DEAD: FrameEntry = FrameEntry::Marker(0.0);
}

/// Fixed orientation offset of the particle quad, or `false` when absent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SpriteRotation {
    Flag(bool),
    Angles([f64; 3]),
}

impl Default for SpriteRotation {
    fn default() -> Self {
        SpriteRotation::Flag(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_markers_tuples_and_sprite_rotation() {
        let doc = parse_particle_animation_json(
            r#"{"frames":[[0,[10,20,30]]],"precision":10,"rotation":false,"sprite_rotation":[0,5,0]}"#,
        )
        .expect("parse");
        assert_eq!(doc.frames.len(), 1);
        assert_eq!(doc.frames[0][0], FrameEntry::DEAD);
        assert_eq!(doc.frames[0][1], FrameEntry::Values(vec![10.0, 20.0, 30.0]));
        assert_eq!(doc.sprite_rotation, SpriteRotation::Angles([0.0, 5.0, 0.0]));
    }

    #[test]
    fn optional_flags_default_to_false() {
        let doc = parse_particle_animation_json(r#"{"frames":[[[1,2,3]]],"precision":1}"#)
            .expect("parse");
        assert!(!doc.rotation);
        assert_eq!(doc.sprite_rotation, SpriteRotation::Flag(false));
    }

    #[test]
    fn schema_mismatch_is_malformed() {
        let err = parse_particle_animation_json(r#"{"frames":"nope","precision":1}"#)
            .expect_err("frames must be a list");
        assert!(matches!(err, PlayerError::MalformedAnimationData { .. }));
    }
}
