use thiserror::Error;

/// Asset that must be present before placement or signing can start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingAsset {
    Document,
    Signature,
}

impl std::fmt::Display for MissingAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingAsset::Document => f.write_str("no document uploaded"),
            MissingAsset::Signature => f.write_str("no signature uploaded"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("Precondition failed: {0}")]
    Precondition(MissingAsset),

    #[error("Validation failed: no regions placed")]
    NoRegionsPlaced,

    #[error("A signing operation is already in progress")]
    Busy,

    #[error("Document is already signed")]
    AlreadySigned,

    #[error("Document has not been signed yet")]
    NotSigned,

    #[error("Signing backend failed: {0}")]
    Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Unsupported document type: {0}")]
    UnsupportedDocumentType(String),

    #[error("Document name must not be empty")]
    EmptyDocumentName,

    #[error("Invalid signature image: {0}")]
    InvalidSignatureImage(&'static str),

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

/// Anything a workspace operation can report back to the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("No credentials configured for the authenticator")]
    NotConfigured,
}
