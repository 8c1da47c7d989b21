use docsign_core::{AssetError, AuthError, WorkspaceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Already logged in as {0}")]
    AlreadyLoggedIn(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("png_base64 is not valid base64: {0}")]
    InvalidImageData(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
