//! Signed artifact naming

use serde::{Deserialize, Serialize};

/// Name of the signed artifact: the document name cut at its first `.`,
/// suffixed with `_signed` and the export extension.
pub fn artifact_name(document_name: &str, extension: &str) -> String {
    let base = document_name.split('.').next().unwrap_or(document_name);
    format!("{}_signed.{}", base, extension)
}

fn media_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// What a download action hands to the browser (or any sink)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub media_type: String,
}

impl ExportArtifact {
    pub fn for_document(document_name: &str, extension: &str) -> Self {
        Self {
            file_name: artifact_name(document_name, extension),
            media_type: media_type_for(extension).to_string(),
        }
    }

    /// Placeholder payload; no real signed document is produced
    pub fn data_url(&self) -> String {
        format!("data:{};charset=utf-8,", self.media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_artifact_name() {
        assert_eq!(artifact_name("contract.pdf", "pdf"), "contract_signed.pdf");
        assert_eq!(artifact_name("lease.docx", "pdf"), "lease_signed.pdf");
        assert_eq!(artifact_name("README", "pdf"), "README_signed.pdf");
    }

    #[test]
    fn test_artifact_name_cuts_at_first_dot() {
        assert_eq!(artifact_name("q3.report.final.pdf", "pdf"), "q3_signed.pdf");
        assert_eq!(artifact_name(".hidden.pdf", "pdf"), "_signed.pdf");
    }

    #[test]
    fn test_export_artifact() {
        let artifact = ExportArtifact::for_document("contract.pdf", "pdf");
        assert_eq!(
            artifact,
            ExportArtifact {
                file_name: "contract_signed.pdf".to_string(),
                media_type: "application/pdf".to_string(),
            }
        );
        assert_eq!(artifact.data_url(), "data:application/pdf;charset=utf-8,");
    }

    #[test]
    fn test_unknown_extension_media_type() {
        let artifact = ExportArtifact::for_document("contract.pdf", "bin");
        assert_eq!(artifact.media_type, "application/octet-stream");
    }
}
