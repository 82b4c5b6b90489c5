// CLI error types and the guidance printed for them

use cabinet_store::StoreError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message with guidance
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!(
                    "Invalid argument: {}\n\nRun 'cabinet --help' for usage information.",
                    message
                )
            }
            CliError::Io(e) => {
                format!("File operation failed: {}", e)
            }
            CliError::Config(msg) => {
                format!(
                    "Configuration error: {}\n\nRun 'cabinet config path' to locate your configuration.",
                    msg
                )
            }
            CliError::Store(StoreError::ValidationError { field, message }) => {
                format!(
                    "Missing or invalid settings: {} ({})\n\nAdd them to your configuration file (see 'cabinet config path'),\nor set remote_enabled to false to use the local data file.",
                    field, message
                )
            }
            CliError::Store(StoreError::BackendUnavailable { backend, message }) => {
                format!(
                    "Could not connect to the remote store at {}: {}\n\nCheck remote_url and the credentials in your configuration,\nand that the server is reachable.",
                    backend, message
                )
            }
            CliError::Store(StoreError::MalformedDocument { path, message }) => {
                format!(
                    "{} is not valid JSON: {}\n\nFix the file by hand, or replace its contents with {{}} to start over.",
                    path.display(),
                    message
                )
            }
            CliError::Store(e) => e.to_string(),
            CliError::Internal(msg) => {
                format!("Internal error: {}\n\nPlease report this issue.", msg)
            }
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;
