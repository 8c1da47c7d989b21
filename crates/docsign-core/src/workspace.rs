//! Per-user signing context
//!
//! A `Workspace` is created from an authenticated session at login and
//! dropped at logout. It holds the acquired assets, the open signer, the
//! pending user notices and the activity log.

use serde::{Deserialize, Serialize};
use shared_types::{AuditAction, AuditChain, Notice, Point, Region};
use std::sync::Arc;
use tokio::sync::watch;

use crate::assets::{AssetUploader, DocumentAsset, SignatureAsset, UploadProgress};
use crate::auth::AuthSession;
use crate::backend::{SignedReceipt, SigningBackend};
use crate::config::DocsignConfig;
use crate::error::{MissingAsset, SigningError, WorkspaceError};
use crate::export::ExportArtifact;
use crate::gesture::SurfaceOrigin;
use crate::machine::{DocumentSigner, SigningState};
use crate::render::RenderFrame;
use crate::session::SigningSession;

/// Where the user should be sent next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    UploadDocument,
    UploadSignature,
    SignDocument,
}

pub struct Workspace {
    session: AuthSession,
    config: DocsignConfig,
    uploader: Arc<dyn AssetUploader>,
    backend: Arc<dyn SigningBackend>,
    document: Option<DocumentAsset>,
    signature: Option<SignatureAsset>,
    signer: Option<SigningSession>,
    audit: AuditChain,
    notices: Vec<Notice>,
}

impl Workspace {
    pub fn new(
        session: AuthSession,
        config: DocsignConfig,
        uploader: Arc<dyn AssetUploader>,
        backend: Arc<dyn SigningBackend>,
    ) -> Self {
        let mut audit = AuditChain::new(&session.username);
        audit.append(AuditAction::Login, None);
        tracing::info!(user = %session.username, "Workspace opened");

        Self {
            session,
            config,
            uploader,
            backend,
            document: None,
            signature: None,
            signer: None,
            audit,
            notices: Vec::new(),
        }
    }

    pub fn auth_session(&self) -> &AuthSession {
        &self.session
    }

    pub fn document(&self) -> Option<&DocumentAsset> {
        self.document.as_ref()
    }

    pub fn signature(&self) -> Option<&SignatureAsset> {
        self.signature.as_ref()
    }

    pub fn audit(&self) -> &AuditChain {
        &self.audit
    }

    /// Handle to the open signer, for callers that drive it concurrently
    pub fn signer(&self) -> Option<&SigningSession> {
        self.signer.as_ref()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn next_step(&self) -> Step {
        match (&self.document, &self.signature) {
            (None, _) => Step::UploadDocument,
            (Some(_), None) => Step::UploadSignature,
            (Some(_), Some(_)) => Step::SignDocument,
        }
    }

    fn document_name(&self) -> Option<String> {
        self.document.as_ref().map(|d| d.name.clone())
    }

    fn record(&mut self, action: AuditAction) {
        let document = self.document_name();
        self.audit.append(action, document.as_deref());
    }

    pub async fn upload_document(
        &mut self,
        document: DocumentAsset,
        progress: Option<watch::Sender<UploadProgress>>,
    ) -> Result<(), WorkspaceError> {
        self.ensure_assets_replaceable().await?;

        let stored = match self.uploader.upload_document(document, progress).await {
            Ok(stored) => stored,
            Err(e) => {
                self.notices.push(Notice::critical(
                    "Upload failed",
                    "There was an error uploading your document",
                ));
                return Err(e.into());
            }
        };

        let name = stored.name.clone();
        self.document = Some(stored);
        self.record(AuditAction::DocumentUploaded { name });
        self.notices.push(Notice::info(
            "Document uploaded",
            "Your document has been uploaded successfully",
        ));
        self.refresh_signer_assets().await;
        Ok(())
    }

    pub async fn upload_signature(
        &mut self,
        signature: SignatureAsset,
        progress: Option<watch::Sender<UploadProgress>>,
    ) -> Result<(), WorkspaceError> {
        if self.document.is_none() {
            self.notices.push(Notice::critical(
                "No document found",
                "Please upload a document first",
            ));
            return Err(SigningError::Precondition(MissingAsset::Document).into());
        }
        self.ensure_assets_replaceable().await?;

        let stored = match self.uploader.upload_signature(signature, progress).await {
            Ok(stored) => stored,
            Err(e) => {
                self.notices.push(Notice::critical(
                    "Upload failed",
                    "There was an error uploading your signature",
                ));
                return Err(e.into());
            }
        };

        self.signature = Some(stored);
        self.record(AuditAction::SignatureUploaded);
        self.notices.push(Notice::info(
            "Signature uploaded",
            "Your signature has been uploaded successfully",
        ));
        self.refresh_signer_assets().await;
        Ok(())
    }

    /// Uploads may only swap assets while the open signer is still placing boxes
    async fn ensure_assets_replaceable(&mut self) -> Result<(), WorkspaceError> {
        let Some(signer) = &self.signer else {
            return Ok(());
        };

        match signer.state().await {
            SigningState::Signing => {
                self.notices.push(Notice::warning(
                    "Signing in progress",
                    "Please wait for the current signing operation to finish",
                ));
                Err(SigningError::Busy.into())
            }
            SigningState::Signed => {
                self.notices.push(Notice::warning(
                    "Already signed",
                    "Start a new signing session to upload another file",
                ));
                Err(SigningError::AlreadySigned.into())
            }
            _ => Ok(()),
        }
    }

    /// Point an already-open signer at freshly uploaded assets, keeping its regions
    async fn refresh_signer_assets(&mut self) {
        let (Some(signer), Some(document), Some(signature)) =
            (&self.signer, &self.document, &self.signature)
        else {
            return;
        };

        if let Err(e) = signer
            .attach_assets(document.clone(), signature.clone())
            .await
        {
            tracing::warn!(error = %e, "Open signer kept its current assets");
        }
    }

    /// Open the signing surface; both assets must have been uploaded
    pub async fn open_signer(&mut self) -> Result<SigningSession, WorkspaceError> {
        if let Some(signer) = &self.signer {
            return Ok(signer.clone());
        }

        let (document, signature) = match (&self.document, &self.signature) {
            (Some(d), Some(s)) => (d.clone(), s.clone()),
            (None, _) => {
                self.notices.push(Notice::critical(
                    "No document found",
                    "Please upload a document first",
                ));
                return Err(SigningError::Precondition(MissingAsset::Document).into());
            }
            (Some(_), None) => {
                self.notices.push(Notice::critical(
                    "No signature found",
                    "Please upload your signature first",
                ));
                return Err(SigningError::Precondition(MissingAsset::Signature).into());
            }
        };

        let signer = SigningSession::new(
            DocumentSigner::from_config(&self.config),
            Arc::clone(&self.backend),
        );
        signer.attach_assets(document, signature).await?;
        self.signer = Some(signer.clone());
        Ok(signer)
    }

    pub async fn frame(&self) -> Option<RenderFrame> {
        match &self.signer {
            Some(signer) => Some(signer.frame().await),
            None => None,
        }
    }

    pub async fn toggle_drawing_mode(&mut self) -> Result<bool, WorkspaceError> {
        let signer = self.open_signer().await?;
        Ok(signer.toggle_drawing_mode().await?)
    }

    /// Pointer down at a client-space position
    pub async fn start_gesture(&mut self, client: Point, origin: SurfaceOrigin) -> bool {
        match &self.signer {
            Some(signer) => signer.start_gesture(origin.to_local(client)).await,
            None => false,
        }
    }

    /// Pointer move at a client-space position
    pub async fn update_gesture(&mut self, client: Point, origin: SurfaceOrigin) -> Option<Region> {
        match &self.signer {
            Some(signer) => signer.update_gesture(origin.to_local(client)).await,
            None => None,
        }
    }

    /// Pointer up or pointer leaving the surface
    pub async fn end_gesture(&mut self) -> Option<Region> {
        let region = match &self.signer {
            Some(signer) => signer.end_gesture().await,
            None => None,
        }?;
        self.record(AuditAction::RegionPlaced { region });
        Some(region)
    }

    pub async fn request_sign(&mut self) -> Result<SignedReceipt, WorkspaceError> {
        let signer = self.open_signer().await?;
        let region_count = signer.regions().await.len();
        self.record(AuditAction::SignRequested { region_count });

        let result = signer.request_sign().await;
        match &result {
            Ok(receipt) => {
                self.record(AuditAction::Signed {
                    region_count: receipt.region_count,
                });
                self.notices.push(Notice::info(
                    "Document signed",
                    "Your document has been signed successfully",
                ));
            }
            Err(SigningError::NoRegionsPlaced) => self.notices.push(Notice::critical(
                "No signature boxes",
                "Please place at least one signature box on the document",
            )),
            Err(SigningError::Busy) => self.notices.push(Notice::warning(
                "Signing in progress",
                "Please wait for the current signing operation to finish",
            )),
            Err(SigningError::AlreadySigned) => self.notices.push(Notice::warning(
                "Already signed",
                "This document has already been signed",
            )),
            Err(_) => self.notices.push(Notice::critical(
                "Signing failed",
                "There was an error signing your document",
            )),
        }
        Ok(result?)
    }

    pub async fn request_export(&mut self) -> Result<ExportArtifact, WorkspaceError> {
        let signer = self.open_signer().await?;
        let artifact = signer.request_export().await?;

        self.record(AuditAction::Exported {
            file_name: artifact.file_name.clone(),
        });
        self.notices.push(Notice::info(
            "Document downloaded",
            &format!(
                "Your signed document has been downloaded as {}",
                self.config.signing.export_extension.to_uppercase()
            ),
        ));
        Ok(artifact)
    }

    /// "Sign another document": forget the signer and both assets
    pub async fn reset_session(&mut self) -> Result<(), WorkspaceError> {
        if let Some(signer) = &self.signer {
            if signer.state().await == SigningState::Signing {
                self.notices.push(Notice::warning(
                    "Signing in progress",
                    "Please wait for the current signing operation to finish",
                ));
                return Err(SigningError::Busy.into());
            }
            signer.reset().await?;
        }

        self.record(AuditAction::SessionReset);
        self.signer = None;
        self.document = None;
        self.signature = None;
        tracing::info!(user = %self.session.username, "Signing session reset");
        Ok(())
    }

    /// Close the workspace, returning its activity log
    pub fn logout(mut self) -> AuditChain {
        self.audit.append(AuditAction::Logout, None);
        tracing::info!(user = %self.session.username, "Logged out");
        self.audit
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("user", &self.session.username)
            .field("document", &self.document)
            .field("step", &self.next_step())
            .finish_non_exhaustive()
    }
}
