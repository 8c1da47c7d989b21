//! What the renderer draws for one moment of the signing surface

use serde::{Deserialize, Serialize};
use shared_types::Region;

use crate::assets::SignatureRef;
use crate::machine::SigningState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    Default,
    Crosshair,
}

/// How a box is outlined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxStyle {
    /// Committed, awaiting signature (solid outline)
    Placed,
    /// Committed and signed; the signature image is drawn scaled-to-fit
    Signed,
    /// Gesture in progress, not yet committed (dashed outline)
    Draft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionView {
    pub region: Region,
    pub style: BoxStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub state: SigningState,
    pub document_name: Option<String>,
    pub drawing_mode: bool,
    pub cursor: Cursor,
    /// Committed boxes in insertion (stacking) order
    pub regions: Vec<RegionView>,
    pub draft: Option<RegionView>,
    pub can_sign: bool,
    pub can_export: bool,
}

impl RenderFrame {
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}
