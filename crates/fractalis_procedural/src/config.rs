//! Configuration for function transitions.

use fractalis_core::{check_duration, ConfigError};
use serde::{Deserialize, Serialize};

use crate::functions::FunctionName;

/// How the next function is chosen when a transition starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionMode {
    /// Next catalog entry, wrapping.
    #[default]
    Cycle,
    /// Uniformly random entry other than the current one.
    Random,
}

/// Timing and selection for a [`TransitionController`](crate::TransitionController).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Function shown first.
    pub function: FunctionName,
    /// Next-function policy.
    pub mode: TransitionMode,
    /// Seconds each function is shown before a transition starts.
    pub function_duration: f32,
    /// Seconds a crossfade takes.
    pub transition_duration: f32,
    /// Seed for the `Random` policy. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            function: FunctionName::Wave,
            mode: TransitionMode::Cycle,
            function_duration: 1.0,
            transition_duration: 1.0,
            seed: None,
        }
    }
}

impl TransitionConfig {
    /// Checks both durations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] for negative or non-finite
    /// durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration("function_duration", self.function_duration)?;
        check_duration("transition_duration", self.transition_duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TransitionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_duration_rejected() {
        let config = TransitionConfig { transition_duration: -0.5, ..Default::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDuration { name: "transition_duration", value: -0.5 })
        );
    }

    #[test]
    fn test_partial_toml() {
        let config: TransitionConfig = toml::from_str("mode = \"Random\"\nseed = 9").unwrap();
        assert_eq!(config.mode, TransitionMode::Random);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.function_duration, 1.0);
    }
}
