use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlamebornError {
    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("roster file not found: {0}")]
    RosterNotFound(String),

    #[error("roster parse error: {0}")]
    RosterParse(String),

    #[error("invalid donation amount: {0}")]
    InvalidAmount(String),

    #[error("donation of {amount} is below the minimum of {minimum}")]
    DonationBelowMinimum { amount: f64, minimum: f64 },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlamebornError>;
