//! Error types for particle playback.

use serde::{Deserialize, Serialize};

/// Errors surfaced while decoding animation data or applying configuration.
///
/// Runtime sampling never fails; out-of-range conditions there are clamped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlayerError {
    /// The animation document does not match the expected schema or is inconsistent.
    #[error("Malformed animation data: {reason}")]
    MalformedAnimationData { reason: String },

    /// A configuration value has no safe clamped fallback.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl PlayerError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAnimationData {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedAnimationData { .. } => "data",
            Self::InvalidConfig { .. } => "config",
        }
    }
}

impl From<serde_json::Error> for PlayerError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedAnimationData {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(PlayerError::malformed("x").category(), "data");
        assert_eq!(PlayerError::invalid_config("x").category(), "config");
    }

    #[test]
    fn json_errors_map_to_malformed_data() {
        let err: PlayerError = serde_json::from_str::<Vec<u8>>("{")
            .map_err(PlayerError::from)
            .unwrap_err();
        assert!(matches!(err, PlayerError::MalformedAnimationData { .. }));
    }

    #[test]
    fn display_includes_reason() {
        let err = PlayerError::invalid_config("dur must be > 0 ms");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: dur must be > 0 ms"
        );
    }
}
