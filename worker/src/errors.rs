use thiserror::Error;

#[derive(Debug, Error)]
pub enum StewardError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("github api error: status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("github graphql error: {0}")]
    Query(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("cli error: {0}")]
    Cli(String),
}
