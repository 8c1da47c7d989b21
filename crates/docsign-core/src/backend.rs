//! The signing operation behind the state machine

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::Region;
use std::time::Duration;

use crate::assets::{DocumentAsset, SignatureAsset};
use crate::config::SigningConfig;
use crate::error::SigningError;

/// Snapshot of everything a signer needs, taken when signing starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningJob {
    pub document: DocumentAsset,
    pub signature: SignatureAsset,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedReceipt {
    pub signed_at: DateTime<Utc>,
    pub region_count: usize,
}

/// Performs the actual signing. Implementations define their own failure
/// and retry policy; a failed job leaves the placed regions untouched.
#[async_trait]
pub trait SigningBackend: Send + Sync {
    async fn sign(&self, job: &SigningJob) -> Result<SignedReceipt, SigningError>;
}

/// Waits a fixed latency and always succeeds
#[derive(Debug, Clone)]
pub struct SimulatedSigningBackend {
    latency: Duration,
}

impl SimulatedSigningBackend {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn from_config(config: &SigningConfig) -> Self {
        Self::new(config.latency())
    }
}

#[async_trait]
impl SigningBackend for SimulatedSigningBackend {
    async fn sign(&self, job: &SigningJob) -> Result<SignedReceipt, SigningError> {
        tracing::debug!(
            document = %job.document.name,
            regions = job.regions.len(),
            latency_ms = self.latency.as_millis() as u64,
            "Simulating signature"
        );
        tokio::time::sleep(self.latency).await;
        Ok(SignedReceipt {
            signed_at: Utc::now(),
            region_count: job.regions.len(),
        })
    }
}
