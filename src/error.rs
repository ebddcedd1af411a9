//! Error types for the mixed-layer crate.
use thiserror::Error;

/// Error type for the crate.
///
/// Configuration errors are detected before any integration starts. The numerical errors abort a
/// run as soon as they are detected, so no output from a failed run is ever observable.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ModelError {
    /// A setting is out of its valid range or inconsistent with the other settings.
    #[error("Invalid setting `{key}`: {reason}.")]
    InvalidSetting {
        /// The configuration key.
        key: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The configuration record could not be parsed, usually a missing key or a bad value.
    #[error("Unable to parse settings: {0}")]
    ParseSettings(String),

    /// The virtual potential temperature jump at the top of the mixed layer became zero, so the
    /// entrainment velocity is undefined.
    #[error("Zero virtual potential temperature jump at t = {time} s.")]
    DivisionByZero {
        /// Model time in seconds.
        time: f64,
    },
    /// The mixed layer depth is no longer positive.
    #[error("Non-positive mixed layer depth h = {h} m at t = {time} s.")]
    NonPositiveDepth {
        /// Model time in seconds.
        time: f64,
        /// The offending depth in meters.
        h: f64,
    },
    /// A prognostic variable overflowed or became NaN.
    #[error("Non-finite value of `{variable}` at t = {time} s.")]
    NonFiniteState {
        /// Name of the prognostic variable.
        variable: &'static str,
        /// Model time in seconds.
        time: f64,
    },
}

impl ModelError {
    /// Is this a problem with the configuration, detected before integration?
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ModelError::InvalidSetting { .. } | ModelError::ParseSettings(_)
        )
    }

    /// Is this a numerical singularity encountered during integration?
    pub fn is_numerical(&self) -> bool {
        !self.is_configuration()
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::ParseSettings(err.to_string())
    }
}

/// Shorthand for results.
pub type Result<T> = ::std::result::Result<T, ModelError>;
