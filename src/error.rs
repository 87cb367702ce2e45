use reqwest::StatusCode;
use thiserror::Error;

/// Problems with the environment, detected before any network I/O.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("URL is required: SLACK_WEBHOOK is unset or empty")]
    MissingWebhook,

    #[error("SLACK_WEBHOOK is not a valid URL: {0}")]
    InvalidWebhook(String),

    #[error("Malformed git reference {0:?}: expected refs/heads/<branch> or refs/tags/<tag>")]
    MalformedRef(String),
}

/// Failures of the single delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Unable to encode message: {0}")]
    Serialize(#[from] serde_json::Error),

    // Built from `reqwest::Error::without_url` so the webhook never reaches the logs
    #[error("Error sending message: {0}")]
    Transport(reqwest::Error),

    #[error("Error on message: {0}")]
    Status(StatusCode),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => 1,
            Error::Delivery(_) => 2,
        }
    }
}
