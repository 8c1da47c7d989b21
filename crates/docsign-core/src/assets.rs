//! Document and signature assets, and the uploader that acquires them

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::config::UploadConfig;
use crate::error::AssetError;

const PDF_MIME: &str = "application/pdf";
const DOC_MIME: &str = "application/msword";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// PNG magic bytes: 89 50 4E 47 0D 0A 1A 0A
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            PDF_MIME => Some(DocumentKind::Pdf),
            DOC_MIME => Some(DocumentKind::Doc),
            DOCX_MIME => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "doc" => Some(DocumentKind::Doc),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MIME,
            DocumentKind::Doc => DOC_MIME,
            DocumentKind::Docx => DOCX_MIME,
        }
    }

    /// Only PDFs get an inline preview; Word documents show a placeholder
    pub fn has_preview(&self) -> bool {
        matches!(self, DocumentKind::Pdf)
    }
}

/// The document being signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAsset {
    pub name: String,
    pub kind: DocumentKind,
}

impl DocumentAsset {
    /// Accept a selected file as a signable document.
    ///
    /// The MIME type wins when present; otherwise the extension decides.
    pub fn from_upload(name: &str, mime: Option<&str>) -> Result<Self, AssetError> {
        if name.trim().is_empty() {
            return Err(AssetError::EmptyDocumentName);
        }

        let kind = match mime {
            Some(mime) if !mime.is_empty() => DocumentKind::from_mime(mime)
                .ok_or_else(|| AssetError::UnsupportedDocumentType(mime.to_string()))?,
            _ => DocumentKind::from_file_name(name)
                .ok_or_else(|| AssetError::UnsupportedDocumentType(name.to_string()))?,
        };

        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }
}

/// Opaque handle to a signature image (a data URL or any renderer-resolvable reference)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureRef(String);

impl SignatureRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignatureRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureAsset {
    pub reference: SignatureRef,
}

impl SignatureAsset {
    /// Build a signature from raw PNG bytes, referenced as a base64 data URL
    pub fn from_png(bytes: &[u8]) -> Result<Self, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::InvalidSignatureImage(
                "image data must not be empty",
            ));
        }
        if bytes.len() < PNG_MAGIC.len() {
            return Err(AssetError::InvalidSignatureImage("PNG data too short"));
        }
        if !bytes.starts_with(&PNG_MAGIC) {
            return Err(AssetError::InvalidSignatureImage("not a PNG image"));
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self {
            reference: SignatureRef(format!("data:image/png;base64,{}", encoded)),
        })
    }

    /// Wrap an already-stored signature handle
    pub fn from_reference(reference: &str) -> Result<Self, AssetError> {
        if reference.trim().is_empty() {
            return Err(AssetError::InvalidSignatureImage(
                "signature reference must not be empty",
            ));
        }
        Ok(Self {
            reference: SignatureRef(reference.to_string()),
        })
    }
}

/// Upload completion, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct UploadProgress(pub u8);

impl UploadProgress {
    pub fn is_complete(&self) -> bool {
        self.0 >= 100
    }
}

/// Stores acquired assets. Progress, when requested, is published on a watch channel.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload_document(
        &self,
        document: DocumentAsset,
        progress: Option<watch::Sender<UploadProgress>>,
    ) -> Result<DocumentAsset, AssetError>;

    async fn upload_signature(
        &self,
        signature: SignatureAsset,
        progress: Option<watch::Sender<UploadProgress>>,
    ) -> Result<SignatureAsset, AssetError>;
}

/// Uploader that only waits: progress advances in fixed steps and the upload
/// always succeeds once the latency has elapsed.
#[derive(Debug, Clone)]
pub struct SimulatedUploader {
    latency: Duration,
    step: u8,
    interval: Duration,
}

impl SimulatedUploader {
    pub fn new(latency: Duration, step: u8, interval: Duration) -> Self {
        Self {
            latency,
            step,
            interval,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.latency(),
            config.progress_step,
            config.progress_interval(),
        )
    }

    async fn simulate(&self, progress: Option<watch::Sender<UploadProgress>>) {
        let started = Instant::now();
        let deadline = started + self.latency;
        let publish = |percent: u8| {
            if let Some(tx) = &progress {
                // receivers may have gone away; the upload carries on regardless
                let _ = tx.send(UploadProgress(percent));
            }
        };

        publish(0);

        if self.step > 0 && !self.interval.is_zero() {
            let mut percent = 0u8;
            let mut next_tick = started + self.interval;
            while next_tick < deadline {
                sleep_until(next_tick).await;
                percent = percent.saturating_add(self.step).min(100);
                publish(percent);
                next_tick += self.interval;
            }
        }

        sleep_until(deadline).await;
        publish(100);
    }
}

#[async_trait]
impl AssetUploader for SimulatedUploader {
    async fn upload_document(
        &self,
        document: DocumentAsset,
        progress: Option<watch::Sender<UploadProgress>>,
    ) -> Result<DocumentAsset, AssetError> {
        tracing::info!(document = %document.name, "Uploading document");
        self.simulate(progress).await;
        tracing::info!(document = %document.name, "Document upload complete");
        Ok(document)
    }

    async fn upload_signature(
        &self,
        signature: SignatureAsset,
        progress: Option<watch::Sender<UploadProgress>>,
    ) -> Result<SignatureAsset, AssetError> {
        tracing::info!("Uploading signature image");
        self.simulate(progress).await;
        tracing::info!("Signature upload complete");
        Ok(signature)
    }
}
