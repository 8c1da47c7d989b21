//! Tamper-evident activity log for a signing workspace

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::types::Region;

/// Types of auditable events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    Logout,
    DocumentUploaded { name: String },
    SignatureUploaded,
    RegionPlaced { region: Region },
    SignRequested { region_count: usize },
    Signed { region_count: usize },
    Exported { file_name: String },
    SessionReset,
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Chain broken at event {index}: expected prev {expected:?}, got {actual:?}")]
    BrokenLink {
        index: usize,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("Failed to (de)serialize audit chain: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: String,
    pub action: AuditAction,
    pub actor: String,
    pub document: Option<String>,
    pub previous_hash: Option<String>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        actor: &str,
        document: Option<&str>,
        previous_hash: Option<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            action,
            actor: actor.to_string(),
            document: document.map(str::to_string),
            previous_hash,
        }
    }

    /// Compute the hash of this event (for chain linking)
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.event_id.as_bytes());
        hasher.update(self.timestamp.as_bytes());
        hasher.update(format!("{:?}", self.action).as_bytes());
        hasher.update(self.actor.as_bytes());
        if let Some(ref document) = self.document {
            hasher.update(document.as_bytes());
        }
        if let Some(ref prev) = self.previous_hash {
            hasher.update(prev.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Chain of audit events with hash linking
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AuditChain {
    pub events: Vec<AuditEvent>,
    pub actor: String,
    pub created_at: String,
}

impl AuditChain {
    /// Create a new audit chain for one user's workspace
    pub fn new(actor: &str) -> Self {
        Self {
            events: Vec::new(),
            actor: actor.to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Get the hash of the last event (for linking)
    pub fn last_hash(&self) -> Option<String> {
        self.events.last().map(|e| e.compute_hash())
    }

    /// Append an event, automatically linking to previous hash
    pub fn append(&mut self, action: AuditAction, document: Option<&str>) -> &AuditEvent {
        let previous_hash = self.last_hash();
        let event = AuditEvent::new(action, &self.actor, document, previous_hash);
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Verify the integrity of the chain
    pub fn verify(&self) -> Result<(), AuditError> {
        let mut expected_prev: Option<String> = None;

        for (index, event) in self.events.iter().enumerate() {
            if event.previous_hash != expected_prev {
                return Err(AuditError::BrokenLink {
                    index,
                    expected: expected_prev,
                    actual: event.previous_hash.clone(),
                });
            }
            expected_prev = Some(event.compute_hash());
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AuditError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Generate a summary for display
    pub fn summary(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|e| {
                format!(
                    "[{}] {} - {:?}",
                    e.timestamp.split('T').next().unwrap_or(&e.timestamp),
                    e.actor,
                    e.action
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_integrity() {
        let mut chain = AuditChain::new("jackson");

        chain.append(AuditAction::Login, None);
        chain.append(
            AuditAction::DocumentUploaded {
                name: "contract.pdf".to_string(),
            },
            Some("contract.pdf"),
        );
        chain.append(
            AuditAction::RegionPlaced {
                region: Region::new(50.0, 50.0, 100.0, 40.0),
            },
            Some("contract.pdf"),
        );
        chain.append(AuditAction::Signed { region_count: 1 }, Some("contract.pdf"));

        assert!(chain.verify().is_ok());
        assert_eq!(chain.events.len(), 4);
        assert!(chain.events.iter().all(|e| e.actor == "jackson"));
    }

    #[test]
    fn test_chain_tamper_detection() {
        let mut chain = AuditChain::new("jackson");

        chain.append(AuditAction::Login, None);
        chain.append(AuditAction::SignatureUploaded, None);

        chain.events[0].actor = "mallory".to_string();

        let err = chain.verify().unwrap_err();
        assert!(matches!(err, AuditError::BrokenLink { index: 1, .. }));
    }

    #[test]
    fn test_summary_uses_date_only() {
        let mut chain = AuditChain::new("jackson");
        chain.append(AuditAction::Logout, None);

        let summary = chain.summary();
        assert_eq!(summary.len(), 1);
        assert!(summary[0].contains("jackson - Logout"));
        assert!(!summary[0].contains('T'));
    }
}
