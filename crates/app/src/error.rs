use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Client(#[from] client::ClientError),
    #[error("{0}")]
    Staging(#[from] staging::StagingError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid script: {0}")]
    Script(#[from] serde_json::Error),
    #[error("no account selected, pass --account or set account_id")]
    NoAccount,
    #[error("{0} partition(s) failed to import")]
    Incomplete(usize),
}
