//! Player configuration.
//!
//! Keys mirror the markup attributes hosts already use (`dur`, `loop`, `count: "50%"`),
//! so a config can be deserialized straight from an attribute map. The loose forms
//! (`count`, `loop`) are normalized into [`ParticleCount`] and [`LoopSetting`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Trigger name that makes the player activate once after each (re)configuration.
pub const INIT_TRIGGER: &str = "init";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub blending: Blending,
    /// Number of simultaneously playing instances.
    pub cache: usize,
    /// Hex colour (`#rgb` or `#rrggbb`).
    pub color: String,
    /// Particles shown per run.
    pub count: ParticleCount,
    /// Start delay in milliseconds.
    #[serde(rename = "delay")]
    pub delay_ms: u32,
    /// Duration of one pass in milliseconds.
    #[serde(rename = "dur")]
    pub duration_ms: u32,
    pub image: Option<ImageInfo>,
    pub interpolate: bool,
    #[serde(rename = "loop")]
    pub loop_setting: LoopSetting,
    /// Activation trigger name; only [`INIT_TRIGGER`] is acted on by the engine.
    pub on: String,
    /// Quad rotation in degrees, used when the animation carries no sprite rotation.
    pub protation: [f32; 3],
    /// Quad size multiplier.
    pub pscale: f32,
    /// Position multiplier applied while decoding.
    pub scale: f32,
    pub shader: Shader,
    pub opacity: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            blending: Blending::Additive,
            cache: 5,
            color: "#fff".to_string(),
            count: ParticleCount::Percent(100),
            delay_ms: 0,
            duration_ms: 1000,
            image: None,
            interpolate: false,
            loop_setting: LoopSetting::Count(0),
            on: INIT_TRIGGER.to_string(),
            protation: [0.0; 3],
            pscale: 1.0,
            scale: 1.0,
            shader: Shader::Flat,
            opacity: 1.0,
        }
    }
}

impl PlayerConfig {
    /// Reject values with no safe clamped fallback.
    pub fn validate(&self) -> Result<(), PlayerError> {
        if self.duration_ms == 0 {
            return Err(PlayerError::invalid_config("dur must be > 0 ms"));
        }
        if !self.scale.is_finite() {
            return Err(PlayerError::invalid_config("scale must be finite"));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Blending {
    Normal,
    Additive,
    Multiply,
    #[serde(rename = "substractive", alias = "subtractive")]
    Subtractive,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Shader {
    Flat,
    Lambert,
    Phong,
    Standard,
}

/// Texture used by the particle quad; dimensions drive the quad aspect ratio.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ImageInfo {
    pub src: String,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// How many particles a run shows: absolute, or a percentage of the animation's particles.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawCount", into = "RawCount")]
pub enum ParticleCount {
    Absolute(i64),
    Percent(i64),
}

impl ParticleCount {
    /// Requested particles before clamping; percentages are floored.
    pub fn requested(self, num_particles: usize) -> i64 {
        match self {
            ParticleCount::Absolute(k) => k,
            ParticleCount::Percent(pct) => {
                (pct as f64 * num_particles as f64 / 100.0).floor() as i64
            }
        }
    }

    /// Resolve against the available particles, clamped to `[0, num_particles]`.
    pub fn resolve(self, num_particles: usize) -> usize {
        self.requested(num_particles).clamp(0, num_particles as i64) as usize
    }
}

impl FromStr for ParticleCount {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (digits, percent) = match trimmed.strip_suffix('%') {
            Some(rest) => (rest.trim(), true),
            None => (trimmed, false),
        };
        let value = leading_int(digits)
            .ok_or_else(|| PlayerError::invalid_config(format!("invalid particle count '{s}'")))?;
        Ok(if percent {
            ParticleCount::Percent(value)
        } else {
            ParticleCount::Absolute(value)
        })
    }
}

impl fmt::Display for ParticleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleCount::Absolute(k) => write!(f, "{k}"),
            ParticleCount::Percent(p) => write!(f, "{p}%"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawCount> for ParticleCount {
    type Error = PlayerError;

    fn try_from(raw: RawCount) -> Result<Self, Self::Error> {
        match raw {
            RawCount::Number(n) => Ok(ParticleCount::Absolute(n)),
            RawCount::Float(x) => Ok(ParticleCount::Absolute(truncate(x))),
            RawCount::Text(s) => s.parse(),
        }
    }
}

impl From<ParticleCount> for RawCount {
    fn from(count: ParticleCount) -> Self {
        match count {
            ParticleCount::Absolute(k) => RawCount::Number(k),
            ParticleCount::Percent(_) => RawCount::Text(count.to_string()),
        }
    }
}

/// Number of passes per activation.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawLoop", into = "RawLoop")]
pub enum LoopSetting {
    /// `0` and `1` both play a single pass.
    Count(u32),
    Forever,
}

impl LoopSetting {
    /// Whether an instance that just finished pass `loop_count` should start another.
    #[inline]
    pub fn continues_after(self, loop_count: u32) -> bool {
        match self {
            LoopSetting::Count(total) => loop_count < total,
            LoopSetting::Forever => true,
        }
    }
}

impl FromStr for LoopSetting {
    type Err = std::convert::Infallible;

    /// Numeric prefixes win; otherwise `"true"` loops forever and anything else plays once.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match leading_int(trimmed) {
            Some(n) => LoopSetting::Count(n.clamp(0, u32::MAX as i64) as u32),
            None if trimmed == "true" => LoopSetting::Forever,
            None => LoopSetting::Count(0),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLoop {
    Flag(bool),
    Number(i64),
    Float(f64),
    Text(String),
}

impl From<RawLoop> for LoopSetting {
    fn from(raw: RawLoop) -> Self {
        match raw {
            RawLoop::Flag(true) => LoopSetting::Forever,
            RawLoop::Flag(false) => LoopSetting::Count(0),
            RawLoop::Number(n) => LoopSetting::Count(n.clamp(0, u32::MAX as i64) as u32),
            RawLoop::Float(x) => LoopSetting::Count(truncate(x).clamp(0, u32::MAX as i64) as u32),
            RawLoop::Text(s) => s.parse().unwrap_or(LoopSetting::Count(0)),
        }
    }
}

impl From<LoopSetting> for RawLoop {
    fn from(setting: LoopSetting) -> Self {
        match setting {
            LoopSetting::Count(n) => RawLoop::Number(n as i64),
            LoopSetting::Forever => RawLoop::Flag(true),
        }
    }
}

/// Drop the fractional part of a JSON float (`2.9` -> 2, `-1.5` -> -1); NaN becomes 0.
fn truncate(x: f64) -> i64 {
    if x.is_nan() {
        0
    } else {
        x.trunc() as i64
    }
}

/// Parse an optionally signed integer prefix, ignoring trailing text (`"12.5"` -> 12).
fn leading_int(s: &str) -> Option<i64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_component_defaults() {
        let cfg: PlayerConfig = serde_json::from_str("{}").expect("empty config");
        assert_eq!(cfg, PlayerConfig::default());
        assert_eq!(cfg.cache, 5);
        assert_eq!(cfg.duration_ms, 1000);
        assert_eq!(cfg.count, ParticleCount::Percent(100));
        assert_eq!(cfg.on, INIT_TRIGGER);
    }

    #[test]
    fn count_forms() {
        assert_eq!("50%".parse::<ParticleCount>().unwrap(), ParticleCount::Percent(50));
        assert_eq!("12".parse::<ParticleCount>().unwrap(), ParticleCount::Absolute(12));
        assert_eq!(" 7.9 ".parse::<ParticleCount>().unwrap(), ParticleCount::Absolute(7));
        assert!("lots".parse::<ParticleCount>().is_err());

        let cfg: PlayerConfig = serde_json::from_str(r#"{"count": 3}"#).unwrap();
        assert_eq!(cfg.count, ParticleCount::Absolute(3));
        let cfg: PlayerConfig = serde_json::from_str(r#"{"count": "25%"}"#).unwrap();
        assert_eq!(cfg.count, ParticleCount::Percent(25));
        assert!(serde_json::from_str::<PlayerConfig>(r#"{"count": "many"}"#).is_err());
    }

    #[test]
    fn float_count_and_loop_are_truncated() {
        let cfg: PlayerConfig = serde_json::from_str(r#"{"count": 2.5}"#).expect("float count");
        assert_eq!(cfg.count, ParticleCount::Absolute(2));
        let cfg: PlayerConfig = serde_json::from_str(r#"{"count": -1.5}"#).expect("negative float");
        assert_eq!(cfg.count, ParticleCount::Absolute(-1));

        let cfg: PlayerConfig = serde_json::from_str(r#"{"loop": 2.0}"#).expect("float loop");
        assert_eq!(cfg.loop_setting, LoopSetting::Count(2));
        let cfg: PlayerConfig = serde_json::from_str(r#"{"loop": 3.7}"#).expect("float loop");
        assert_eq!(cfg.loop_setting, LoopSetting::Count(3));
        let cfg: PlayerConfig = serde_json::from_str(r#"{"loop": -0.5}"#).expect("float loop");
        assert_eq!(cfg.loop_setting, LoopSetting::Count(0));
    }

    #[test]
    fn count_resolution_floors_and_clamps() {
        assert_eq!(ParticleCount::Percent(50).resolve(5), 2);
        assert_eq!(ParticleCount::Percent(100).resolve(5), 5);
        assert_eq!(ParticleCount::Percent(250).resolve(5), 5);
        assert_eq!(ParticleCount::Absolute(-3).resolve(5), 0);
        assert_eq!(ParticleCount::Absolute(9).resolve(5), 5);
        assert_eq!(ParticleCount::Absolute(3).resolve(0), 0);
    }

    #[test]
    fn requested_count_is_unclamped() {
        assert_eq!(ParticleCount::Percent(250).requested(4), 10);
        assert_eq!(ParticleCount::Percent(-10).requested(20), -2);
        assert_eq!(ParticleCount::Percent(50).requested(5), 2);
        assert_eq!(ParticleCount::Absolute(9).requested(5), 9);
    }

    #[test]
    fn loop_forms() {
        let parse = |json: &str| -> LoopSetting {
            let cfg: PlayerConfig =
                serde_json::from_str(&format!(r#"{{"loop": {json}}}"#)).expect("loop value");
            cfg.loop_setting
        };
        assert_eq!(parse("false"), LoopSetting::Count(0));
        assert_eq!(parse("true"), LoopSetting::Forever);
        assert_eq!(parse(r#""true""#), LoopSetting::Forever);
        assert_eq!(parse(r#""false""#), LoopSetting::Count(0));
        assert_eq!(parse(r#""3""#), LoopSetting::Count(3));
        assert_eq!(parse("4"), LoopSetting::Count(4));
        assert_eq!(parse("-2"), LoopSetting::Count(0));
        assert_eq!(parse(r#""sometimes""#), LoopSetting::Count(0));
    }

    #[test]
    fn loop_continuation() {
        assert!(!LoopSetting::Count(0).continues_after(1));
        assert!(LoopSetting::Count(2).continues_after(1));
        assert!(!LoopSetting::Count(2).continues_after(2));
        assert!(LoopSetting::Forever.continues_after(u32::MAX));
    }

    #[test]
    fn enums_use_markup_names() {
        let cfg: PlayerConfig =
            serde_json::from_str(r#"{"blending":"substractive","shader":"phong"}"#).unwrap();
        assert_eq!(cfg.blending, Blending::Subtractive);
        assert_eq!(cfg.shader, Shader::Phong);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let cfg = PlayerConfig {
            duration_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PlayerError::InvalidConfig { .. })
        ));
    }
}
