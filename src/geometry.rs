// src/geometry.rs

use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, x1 < x2 and y1 < y2 for valid boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        self.width().max(0) as i64 * self.height().max(0) as i64
    }

    /// Integer-truncated midpoint.
    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Clip to frame bounds. May produce a degenerate (zero-area) box when the
    /// original lies entirely outside the frame.
    pub fn clamp_to(&self, frame_width: usize, frame_height: usize) -> Self {
        let w = frame_width as i32;
        let h = frame_height as i32;
        Self {
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
            x2: self.x2.clamp(0, w),
            y2: self.y2.clamp(0, h),
        }
    }
}

/// True iff the center of `inner` lies within the closed rectangle of `outer`
/// (inclusive on all four sides).
pub fn contains_center(inner: &BoundingBox, outer: &BoundingBox) -> bool {
    let (cx, cy) = inner.center();
    cx >= outer.x1 && cx <= outer.x2 && cy >= outer.y1 && cy <= outer.y2
}

/// Width over height, height floored at 1.
pub fn aspect_ratio(bbox: &BoundingBox) -> f32 {
    bbox.width() as f32 / bbox.height().max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_truncates() {
        let b = BoundingBox::new(0, 0, 5, 5);
        assert_eq!(b.center(), (2, 2));
    }

    #[test]
    fn test_contains_center_reflexive() {
        let b = BoundingBox::new(10, 20, 110, 80);
        assert!(contains_center(&b, &b));
    }

    #[test]
    fn test_contains_center_inclusive_bounds() {
        // Center of inner lands exactly on the outer's right edge.
        let inner = BoundingBox::new(90, 40, 110, 60);
        let outer = BoundingBox::new(0, 0, 100, 100);
        assert!(contains_center(&inner, &outer));
    }

    #[test]
    fn test_contains_center_monotonic_under_shrink() {
        let inner = BoundingBox::new(40, 40, 60, 60); // center (50, 50)
        let outer = BoundingBox::new(0, 0, 100, 100);
        assert!(contains_center(&inner, &outer));

        // Shrinking the outer box can only lose containment, never gain it.
        let shrunk = BoundingBox::new(0, 0, 49, 100);
        assert!(!contains_center(&inner, &shrunk));
        let still_holds = BoundingBox::new(0, 0, 50, 100);
        assert!(contains_center(&inner, &still_holds));
    }

    #[test]
    fn test_aspect_ratio() {
        let b = BoundingBox::new(0, 0, 200, 100);
        assert!((aspect_ratio(&b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_aspect_ratio_zero_height_floored() {
        let b = BoundingBox::new(0, 0, 50, 0);
        assert!((aspect_ratio(&b) - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_to_frame() {
        let b = BoundingBox::new(-10, -5, 700, 500);
        let c = b.clamp_to(640, 480);
        assert_eq!(c, BoundingBox::new(0, 0, 640, 480));
    }

    #[test]
    fn test_is_valid_rejects_inverted() {
        assert!(!BoundingBox::new(10, 0, 5, 20).is_valid());
        assert!(BoundingBox::new(0, 0, 5, 20).is_valid());
    }
}
