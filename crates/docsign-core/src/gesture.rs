//! Pointer-drag rectangle drawing

use serde::{Deserialize, Serialize};
use shared_types::{Point, Region};

/// Top-left corner of the document surface in pointer (client) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceOrigin {
    pub left: f64,
    pub top: f64,
}

impl SurfaceOrigin {
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }

    /// Translate a client-space pointer position into surface-local coordinates
    pub fn to_local(&self, client: Point) -> Point {
        Point::new(client.x - self.left, client.y - self.top)
    }
}

/// An in-progress drag, alive between gesture start and gesture end
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSession {
    start: Point,
    draft: Region,
}

impl PlacementSession {
    pub fn start(at: Point) -> Self {
        Self {
            start: at,
            draft: Region::new(at.x, at.y, 0.0, 0.0),
        }
    }

    /// Recompute the draft from the start point; never accumulates
    pub fn update(&mut self, current: Point) {
        self.draft = Region::from_corners(self.start, current);
    }

    pub fn start_point(&self) -> Point {
        self.start
    }

    pub fn draft(&self) -> Region {
        self.draft
    }

    /// Consume the session, yielding the draft only if it clears `min_size` on both sides
    pub fn finish(self, min_size: f64) -> Option<Region> {
        self.draft.exceeds(min_size).then_some(self.draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_local() {
        let origin = SurfaceOrigin::new(120.0, 64.0);
        assert_eq!(origin.to_local(Point::new(170.0, 114.0)), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_start_has_empty_draft() {
        let session = PlacementSession::start(Point::new(10.0, 20.0));
        assert_eq!(session.draft(), Region::new(10.0, 20.0, 0.0, 0.0));
        assert_eq!(session.finish(20.0), None);
    }

    #[test]
    fn test_update_is_not_accumulated() {
        let mut session = PlacementSession::start(Point::new(100.0, 100.0));
        session.update(Point::new(200.0, 180.0));
        session.update(Point::new(60.0, 40.0));
        assert_eq!(session.draft(), Region::new(60.0, 40.0, 40.0, 60.0));
        assert_eq!(session.start_point(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_finish_threshold() {
        let mut session = PlacementSession::start(Point::new(0.0, 0.0));
        session.update(Point::new(21.0, 20.0));
        assert_eq!(session.finish(20.0), None);

        session.update(Point::new(21.0, 21.0));
        assert_eq!(session.finish(20.0), Some(Region::new(0.0, 0.0, 21.0, 21.0)));
    }
}
