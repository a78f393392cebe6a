use thiserror::Error;

/// Errors surfaced at registration time, before any request is served.
///
/// Dispatch itself never produces a `ConfigError`: a request that matches
/// nothing is a not-found *outcome*, and handler/middleware failures
/// propagate as plain [`anyhow::Error`] values. Keeping setup mistakes in
/// their own type lets an integrator fail fast during startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A module with the same name already exists on this application.
    #[error("module `{0}` is already registered")]
    DuplicateModule(String),

    /// The named module does not exist (e.g. `set_domain` on a typo).
    #[error("no module named `{0}` is registered")]
    UnknownModule(String),

    /// The route pattern is malformed.
    ///
    /// `*` is only valid as the final segment and `:` must be followed by a
    /// parameter name.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: &str) -> Self {
        ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}
