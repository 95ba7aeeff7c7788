use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field, reason: reason.into() }
    }
}
