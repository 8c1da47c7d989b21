//! Document signing core logic
//!
//! This crate provides the signature-box placement and signing state
//! machine, the async driver that runs a signing operation against a
//! backend, asset intake, and the per-user workspace tying them together.
//!
//! The machine itself ([`DocumentSigner`]) is plain synchronous data; all
//! waiting (uploads, signing latency) happens behind the [`AssetUploader`]
//! and [`SigningBackend`] traits.

pub mod assets;
pub mod auth;
pub mod backend;
pub mod config;
pub mod coords;
pub mod error;
pub mod export;
pub mod gesture;
pub mod machine;
pub mod render;
pub mod session;
pub mod workspace;

pub use assets::{
    AssetUploader, DocumentAsset, DocumentKind, SignatureAsset, SignatureRef, SimulatedUploader,
    UploadProgress,
};
pub use auth::{AuthSession, Authenticator, SessionToken, StaticAuthenticator};
pub use backend::{SignedReceipt, SigningBackend, SigningJob, SimulatedSigningBackend};
pub use config::DocsignConfig;
pub use error::{AssetError, AuthError, MissingAsset, SigningError, WorkspaceError};
pub use export::{artifact_name, ExportArtifact};
pub use gesture::{PlacementSession, SurfaceOrigin};
pub use machine::{DocumentSigner, SigningState};
pub use render::{BoxStyle, Cursor, RegionView, RenderFrame};
pub use session::SigningSession;
pub use workspace::{Step, Workspace};

pub use shared_types::{Notice, Point, Region, Severity};
