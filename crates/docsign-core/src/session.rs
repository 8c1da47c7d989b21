//! Async driver for one document's signer
//!
//! Inputs are serialized through a mutex. The lock is released while the
//! backend signs, so a second sign request sees `Signing` and is refused
//! with `Busy`: at most one signing operation is in flight per document.

use std::sync::Arc;
use tokio::sync::Mutex;

use shared_types::{Point, Region};

use crate::assets::{DocumentAsset, SignatureAsset};
use crate::backend::{SignedReceipt, SigningBackend};
use crate::error::SigningError;
use crate::export::ExportArtifact;
use crate::machine::{DocumentSigner, SigningState};
use crate::render::RenderFrame;

#[derive(Clone)]
pub struct SigningSession {
    signer: Arc<Mutex<DocumentSigner>>,
    backend: Arc<dyn SigningBackend>,
}

impl SigningSession {
    pub fn new(signer: DocumentSigner, backend: Arc<dyn SigningBackend>) -> Self {
        Self {
            signer: Arc::new(Mutex::new(signer)),
            backend,
        }
    }

    pub async fn state(&self) -> SigningState {
        self.signer.lock().await.state()
    }

    pub async fn regions(&self) -> Vec<Region> {
        self.signer.lock().await.regions().to_vec()
    }

    pub async fn frame(&self) -> RenderFrame {
        self.signer.lock().await.frame()
    }

    pub async fn attach_assets(
        &self,
        document: DocumentAsset,
        signature: SignatureAsset,
    ) -> Result<(), SigningError> {
        self.signer.lock().await.attach_assets(document, signature)
    }

    pub async fn toggle_drawing_mode(&self) -> Result<bool, SigningError> {
        self.signer.lock().await.toggle_drawing_mode()
    }

    pub async fn start_gesture(&self, at: Point) -> bool {
        self.signer.lock().await.start_gesture(at)
    }

    pub async fn update_gesture(&self, to: Point) -> Option<Region> {
        self.signer.lock().await.update_gesture(to)
    }

    pub async fn end_gesture(&self) -> Option<Region> {
        self.signer.lock().await.end_gesture()
    }

    /// Run the signing operation to completion
    pub async fn request_sign(&self) -> Result<SignedReceipt, SigningError> {
        let job = {
            let mut signer = self.signer.lock().await;
            match signer.begin_signing() {
                Ok(job) => job,
                Err(e) => {
                    tracing::warn!(error = %e, "Sign request rejected");
                    return Err(e);
                }
            }
        };

        let outcome = self.backend.sign(&job).await;

        self.signer.lock().await.finish_signing(outcome.clone())?;
        outcome
    }

    pub async fn request_export(&self) -> Result<ExportArtifact, SigningError> {
        self.signer.lock().await.request_export()
    }

    pub async fn reset(&self) -> Result<(), SigningError> {
        self.signer.lock().await.reset()
    }
}

impl std::fmt::Debug for SigningSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSession").finish_non_exhaustive()
    }
}
