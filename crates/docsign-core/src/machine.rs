//! Signature-box placement and document-signing state machine
//!
//! `NotReady -> Ready -> AwaitingBoxes -> Signing -> Signed`
//!
//! `DocumentSigner` is plain synchronous state. The asynchronous signing
//! operation is split into `begin_signing` (snapshot a job, enter `Signing`)
//! and `finish_signing` (apply the outcome), so any runtime can drive it.

use serde::{Deserialize, Serialize};
use shared_types::{Point, Region};

use crate::assets::{DocumentAsset, SignatureAsset};
use crate::backend::{SignedReceipt, SigningJob};
use crate::config::DocsignConfig;
use crate::error::{MissingAsset, SigningError};
use crate::export::ExportArtifact;
use crate::gesture::PlacementSession;
use crate::render::{BoxStyle, Cursor, RegionView, RenderFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningState {
    NotReady,
    Ready,
    AwaitingBoxes,
    Signing,
    Signed,
}

#[derive(Debug, Clone)]
pub struct DocumentSigner {
    state: SigningState,
    document: Option<DocumentAsset>,
    signature: Option<SignatureAsset>,
    regions: Vec<Region>,
    drawing: bool,
    gesture: Option<PlacementSession>,
    receipt: Option<SignedReceipt>,
    min_size: f64,
    export_extension: String,
}

impl DocumentSigner {
    pub fn new(min_size: f64, export_extension: &str) -> Self {
        Self {
            state: SigningState::NotReady,
            document: None,
            signature: None,
            regions: Vec::new(),
            drawing: false,
            gesture: None,
            receipt: None,
            min_size,
            export_extension: export_extension.to_string(),
        }
    }

    pub fn from_config(config: &DocsignConfig) -> Self {
        Self::new(config.placement.min_size, &config.signing.export_extension)
    }

    pub fn state(&self) -> SigningState {
        self.state
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn draft(&self) -> Option<Region> {
        self.gesture.map(|g| g.draft())
    }

    pub fn drawing_mode(&self) -> bool {
        self.drawing
    }

    pub fn document(&self) -> Option<&DocumentAsset> {
        self.document.as_ref()
    }

    pub fn signature(&self) -> Option<&SignatureAsset> {
        self.signature.as_ref()
    }

    pub fn receipt(&self) -> Option<&SignedReceipt> {
        self.receipt.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.state == SigningState::Signed
    }

    fn transition(&mut self, to: SigningState, reason: &'static str) {
        tracing::info!(from = ?self.state, to = ?to, reason, "Signing state transition");
        self.state = to;
    }

    /// Attach the document and signature; this is what makes the signer ready.
    ///
    /// Attaching again before signing swaps the asset references and keeps
    /// every placed region.
    pub fn attach_assets(
        &mut self,
        document: DocumentAsset,
        signature: SignatureAsset,
    ) -> Result<(), SigningError> {
        match self.state {
            SigningState::Signing => return Err(SigningError::Busy),
            SigningState::Signed => return Err(SigningError::AlreadySigned),
            _ => {}
        }

        self.document = Some(document);
        self.signature = Some(signature);

        if self.state == SigningState::NotReady {
            self.transition(SigningState::Ready, "assets attached");
            self.transition(SigningState::AwaitingBoxes, "placement open");
        } else {
            tracing::info!(regions = self.regions.len(), "Assets replaced, regions kept");
        }
        Ok(())
    }

    fn missing_asset(&self) -> Option<MissingAsset> {
        if self.document.is_none() {
            Some(MissingAsset::Document)
        } else if self.signature.is_none() {
            Some(MissingAsset::Signature)
        } else {
            None
        }
    }

    /// Flip drawing mode. Turning it off drops any in-progress draft.
    /// Refused while a signing operation is pending or once signed.
    pub fn toggle_drawing_mode(&mut self) -> Result<bool, SigningError> {
        if let Some(missing) = self.missing_asset() {
            return Err(SigningError::Precondition(missing));
        }
        match self.state {
            SigningState::Signing => return Err(SigningError::Busy),
            SigningState::Signed => return Err(SigningError::AlreadySigned),
            _ => {}
        }

        self.drawing = !self.drawing;
        if !self.drawing {
            self.gesture = None;
        }
        tracing::debug!(drawing = self.drawing, "Drawing mode toggled");
        Ok(self.drawing)
    }

    fn accepts_gestures(&self) -> bool {
        self.drawing && self.state == SigningState::AwaitingBoxes
    }

    /// Begin a drag at a surface-local point. A new start replaces any
    /// in-progress drag. Returns false when gestures are not accepted.
    pub fn start_gesture(&mut self, at: Point) -> bool {
        if !self.accepts_gestures() {
            return false;
        }
        if self.gesture.is_some() {
            tracing::debug!("Gesture restarted, previous draft replaced");
        }
        self.gesture = Some(PlacementSession::start(at));
        true
    }

    /// Move the active drag; returns the recomputed draft
    pub fn update_gesture(&mut self, to: Point) -> Option<Region> {
        if !self.accepts_gestures() {
            return None;
        }
        let gesture = self.gesture.as_mut()?;
        gesture.update(to);
        Some(gesture.draft())
    }

    /// End the active drag (pointer up or pointer leaving the surface).
    ///
    /// Commits the draft when both sides exceed the minimum size; smaller
    /// drafts are dropped silently. The drag is cleared either way.
    pub fn end_gesture(&mut self) -> Option<Region> {
        let gesture = self.gesture.take()?;
        if !self.accepts_gestures() {
            return None;
        }

        match gesture.finish(self.min_size) {
            Some(region) => {
                self.regions.push(region);
                tracing::debug!(?region, count = self.regions.len(), "Region committed");
                Some(region)
            }
            None => {
                tracing::debug!(draft = ?gesture.draft(), "Draft below minimum size discarded");
                None
            }
        }
    }

    /// Validate and enter `Signing`, returning the job to hand to a backend
    pub fn begin_signing(&mut self) -> Result<SigningJob, SigningError> {
        match self.state {
            SigningState::Signing => return Err(SigningError::Busy),
            SigningState::Signed => return Err(SigningError::AlreadySigned),
            _ => {}
        }

        let (document, signature) = match (&self.document, &self.signature) {
            (Some(document), Some(signature)) => (document.clone(), signature.clone()),
            _ => {
                let missing = self.missing_asset().unwrap_or(MissingAsset::Document);
                return Err(SigningError::Precondition(missing));
            }
        };

        if self.regions.is_empty() {
            return Err(SigningError::NoRegionsPlaced);
        }

        self.gesture = None;
        self.transition(SigningState::Signing, "sign requested");

        Ok(SigningJob {
            document,
            signature,
            regions: self.regions.clone(),
        })
    }

    /// Apply the outcome of the pending signing operation.
    ///
    /// Success freezes the regions in `Signed`; failure returns to
    /// `AwaitingBoxes` with the regions untouched and hands the error back.
    pub fn finish_signing(
        &mut self,
        outcome: Result<SignedReceipt, SigningError>,
    ) -> Result<(), SigningError> {
        if self.state != SigningState::Signing {
            tracing::warn!(state = ?self.state, "Signing outcome with no pending operation ignored");
            return Ok(());
        }

        match outcome {
            Ok(receipt) => {
                self.receipt = Some(receipt);
                self.drawing = false;
                self.transition(SigningState::Signed, "signing completed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Signing failed");
                self.transition(SigningState::AwaitingBoxes, "signing failed");
                Err(e)
            }
        }
    }

    /// Derive the downloadable artifact. Read-only, so repeat calls agree.
    pub fn request_export(&self) -> Result<ExportArtifact, SigningError> {
        match (&self.state, &self.document) {
            (SigningState::Signed, Some(document)) => Ok(ExportArtifact::for_document(
                &document.name,
                &self.export_extension,
            )),
            _ => Err(SigningError::NotSigned),
        }
    }

    /// Drop everything, including the assets. Not allowed mid-signing.
    pub fn reset(&mut self) -> Result<(), SigningError> {
        if self.state == SigningState::Signing {
            return Err(SigningError::Busy);
        }

        self.document = None;
        self.signature = None;
        self.regions.clear();
        self.drawing = false;
        self.gesture = None;
        self.receipt = None;
        self.transition(SigningState::NotReady, "session reset");
        Ok(())
    }

    pub fn frame(&self) -> RenderFrame {
        let signed = self.is_signed();
        let signature_ref = self.signature.as_ref().map(|s| s.reference.clone());

        let regions = self
            .regions
            .iter()
            .map(|region| RegionView {
                region: *region,
                style: if signed {
                    BoxStyle::Signed
                } else {
                    BoxStyle::Placed
                },
                signature: if signed { signature_ref.clone() } else { None },
            })
            .collect();

        let draft = self.draft().map(|region| RegionView {
            region,
            style: BoxStyle::Draft,
            signature: None,
        });

        RenderFrame {
            state: self.state,
            document_name: self.document.as_ref().map(|d| d.name.clone()),
            drawing_mode: self.drawing,
            cursor: if self.accepts_gestures() {
                Cursor::Crosshair
            } else {
                Cursor::Default
            },
            regions,
            draft,
            can_sign: self.state == SigningState::AwaitingBoxes && !self.regions.is_empty(),
            can_export: signed,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn coordinate() -> impl Strategy<Value = f64> {
        0.0f64..1200.0
    }

    fn drawing_signer() -> DocumentSigner {
        let mut signer = DocumentSigner::new(20.0, "pdf");
        signer
            .attach_assets(
                DocumentAsset::from_upload("contract.pdf", None).unwrap(),
                SignatureAsset::from_reference("blob:sig").unwrap(),
            )
            .unwrap();
        signer.toggle_drawing_mode().unwrap();
        signer
    }

    proptest! {
        /// Property: a committed region is exactly the normalized rectangle of the drag end-points
        #[test]
        fn committed_region_matches_endpoints(
            x1 in coordinate(), y1 in coordinate(),
            x2 in coordinate(), y2 in coordinate(),
        ) {
            let mut signer = drawing_signer();
            signer.start_gesture(Point::new(x1, y1));
            signer.update_gesture(Point::new(x2, y2));
            let committed = signer.end_gesture();

            let width = (x2 - x1).abs();
            let height = (y2 - y1).abs();
            if width > 20.0 && height > 20.0 {
                let region = committed.unwrap();
                prop_assert_eq!(region.x, x1.min(x2));
                prop_assert_eq!(region.y, y1.min(y2));
                prop_assert_eq!(region.width, width);
                prop_assert_eq!(region.height, height);
                prop_assert_eq!(signer.regions().len(), 1);
            } else {
                prop_assert!(committed.is_none());
                prop_assert!(signer.regions().is_empty());
            }
        }

        /// Property: intermediate moves never influence the committed region
        #[test]
        fn intermediate_moves_do_not_accumulate(
            start in (coordinate(), coordinate()),
            moves in prop::collection::vec((coordinate(), coordinate()), 1..10),
            end in (coordinate(), coordinate()),
        ) {
            let mut signer = drawing_signer();
            signer.start_gesture(Point::new(start.0, start.1));
            for (x, y) in moves {
                signer.update_gesture(Point::new(x, y));
            }
            signer.update_gesture(Point::new(end.0, end.1));

            let expected = Region::from_corners(Point::new(start.0, start.1), Point::new(end.0, end.1));
            prop_assert_eq!(signer.draft(), Some(expected));
        }

        /// Property: once signed, no sequence of gestures changes the region list
        #[test]
        fn signed_regions_are_frozen(
            drags in prop::collection::vec(
                (coordinate(), coordinate(), coordinate(), coordinate()), 1..8
            ),
        ) {
            let mut signer = drawing_signer();
            signer.start_gesture(Point::new(0.0, 0.0));
            signer.update_gesture(Point::new(100.0, 100.0));
            signer.end_gesture();
            signer.begin_signing().unwrap();
            signer.finish_signing(Ok(SignedReceipt {
                signed_at: chrono::Utc::now(),
                region_count: 1,
            })).unwrap();

            let frozen = signer.regions().to_vec();
            for (x1, y1, x2, y2) in drags {
                signer.start_gesture(Point::new(x1, y1));
                signer.update_gesture(Point::new(x2, y2));
                signer.end_gesture();
                let _ = signer.toggle_drawing_mode();
            }
            prop_assert_eq!(signer.regions(), frozen.as_slice());
            prop_assert_eq!(signer.state(), SigningState::Signed);
        }
    }
}
