//! Coordinate transformation between the signing surface and PDF page space

use serde::{Deserialize, Serialize};
use shared_types::{Point, Region};

/// Rendered size of the document surface, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

/// A rectangle in PDF space (bottom-left origin, points)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Convert surface coordinates (top-left origin, pixels) to PDF coordinates (bottom-left origin, points)
pub fn surface_to_pdf(point: Point, surface: SurfaceSize, media_box: [f64; 4]) -> Point {
    let [mb_x, mb_y, mb_width, mb_height] = media_box;

    let x_pct = point.x / surface.width;
    let y_pct = point.y / surface.height;

    // flip Y axis
    Point::new(mb_x + x_pct * mb_width, mb_y + (mb_height - y_pct * mb_height))
}

/// Convert PDF coordinates to surface coordinates
pub fn pdf_to_surface(point: Point, surface: SurfaceSize, media_box: [f64; 4]) -> Point {
    let [mb_x, mb_y, mb_width, mb_height] = media_box;

    let x_pct = (point.x - mb_x) / mb_width;
    let y_pct = 1.0 - ((point.y - mb_y) / mb_height);

    Point::new(x_pct * surface.width, y_pct * surface.height)
}

/// The PDF rectangle a placed region covers; its PDF origin is the region's bottom-left corner
pub fn region_to_pdf_rect(region: &Region, surface: SurfaceSize, media_box: [f64; 4]) -> PdfRect {
    let top_left = surface_to_pdf(Point::new(region.x, region.y), surface, media_box);
    let bottom_right = surface_to_pdf(
        Point::new(region.right(), region.bottom()),
        surface,
        media_box,
    );

    PdfRect {
        x: top_left.x,
        y: bottom_right.y,
        width: bottom_right.x - top_left.x,
        height: top_left.y - bottom_right.y,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..2000.0
    }

    fn percentage() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    proptest! {
        /// Property: surface -> PDF -> surface returns the original point
        #[test]
        fn roundtrip_surface_pdf_surface(
            surface_w in dimension(),
            surface_h in dimension(),
            pdf_w in dimension(),
            pdf_h in dimension(),
            offset_x in 0.0f64..100.0,
            offset_y in 0.0f64..100.0,
            x_pct in percentage(),
            y_pct in percentage(),
        ) {
            let surface = SurfaceSize { width: surface_w, height: surface_h };
            let media_box = [offset_x, offset_y, pdf_w, pdf_h];
            let point = Point::new(x_pct * surface_w, y_pct * surface_h);

            let back = pdf_to_surface(surface_to_pdf(point, surface, media_box), surface, media_box);

            prop_assert!((back.x - point.x).abs() < 0.0001);
            prop_assert!((back.y - point.y).abs() < 0.0001);
        }

        /// Property: moving down on the surface moves down in PDF space
        #[test]
        fn y_axis_movement_direction(
            surface_w in dimension(),
            surface_h in dimension(),
            pdf_w in dimension(),
            pdf_h in dimension(),
            y1_pct in 0.0f64..0.5,
        ) {
            let surface = SurfaceSize { width: surface_w, height: surface_h };
            let media_box = [0.0, 0.0, pdf_w, pdf_h];

            let upper = surface_to_pdf(Point::new(0.0, y1_pct * surface_h), surface, media_box);
            let lower = surface_to_pdf(Point::new(0.0, (y1_pct + 0.1) * surface_h), surface, media_box);

            prop_assert!(lower.y < upper.y);
        }

        /// Property: region size scales by the page/surface ratio
        #[test]
        fn region_rect_scales(
            surface_w in 100.0f64..2000.0,
            surface_h in 100.0f64..2000.0,
            pdf_w in dimension(),
            pdf_h in dimension(),
            w_pct in 0.01f64..0.5,
            h_pct in 0.01f64..0.5,
        ) {
            let surface = SurfaceSize { width: surface_w, height: surface_h };
            let region = Region::new(0.0, 0.0, w_pct * surface_w, h_pct * surface_h);
            let rect = region_to_pdf_rect(&region, surface, [0.0, 0.0, pdf_w, pdf_h]);

            prop_assert!((rect.width - w_pct * pdf_w).abs() < 0.0001);
            prop_assert!((rect.height - h_pct * pdf_h).abs() < 0.0001);
        }
    }
}
