use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("MyGES authentication failed: {0}")]
    Auth(String),

    #[error("Agenda request failed: {0}")]
    Agenda(#[from] reqwest::Error),

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("Discord API error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("State store error: {0}")]
    State(#[from] std::io::Error),
}
