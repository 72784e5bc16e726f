#![forbid(unsafe_code)]

//! Error types for configuration and config-file loading.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SwipeError>;

/// A configuration value that cannot drive a row controller.
///
/// Detected when a controller or registry is constructed; never coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_offset must be finite and negative, got {value}")]
    MinOffset { value: f64 },

    #[error("threshold_offset {value} lies outside [{min_offset}, 0]")]
    ThresholdOutOfRange { value: f64, min_offset: f64 },

    #[error("engagement_offset {value} lies outside [{min_offset}, 0]")]
    EngagementOutOfRange { value: f64, min_offset: f64 },

    #[error("reveal_offset {value} lies outside [{min_offset}, 0]")]
    RevealOutOfRange { value: f64, min_offset: f64 },

    #[error("fling_velocity_threshold must be finite and positive, got {value}")]
    FlingVelocity { value: f64 },

    #[error("{spring} spring {param} must be finite and positive, got {value}")]
    SpringParam {
        spring: &'static str,
        param: &'static str,
        value: f64,
    },

    #[error("settle_epsilon must lie in (0, 1), got {value}")]
    SettleEpsilon { value: f64 },
}

#[derive(Debug, Error)]
pub enum SwipeError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[cfg(feature = "config-file")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config-file")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config-file")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SwipeError {
    /// The underlying configuration error, if this is one.
    #[must_use]
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::InvalidConfiguration(err) => Some(err),
            #[cfg(feature = "config-file")]
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_wraps_into_swipe_error() {
        let err: SwipeError = ConfigError::SettleEpsilon { value: 2.0 }.into();
        assert_eq!(
            err.as_config(),
            Some(&ConfigError::SettleEpsilon { value: 2.0 })
        );
        assert_eq!(
            err.to_string(),
            "invalid configuration: settle_epsilon must lie in (0, 1), got 2"
        );
    }

    #[test]
    fn spring_param_message_names_spring_and_param() {
        let err = ConfigError::SpringParam {
            spring: "commit",
            param: "mass",
            value: 0.0,
        };
        assert_eq!(
            err.to_string(),
            "commit spring mass must be finite and positive, got 0"
        );
    }
}
