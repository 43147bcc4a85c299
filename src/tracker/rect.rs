use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Center of the screen in normalized coordinates.
#[inline]
pub fn screen_center() -> Point2<f32> {
    Point2::new(0.5, 0.5)
}

/// Normalized bounding box, top-left origin, all values in `[0, 1]` of the
/// video frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from its center point and dimensions.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Whether `point` lies inside the box, edges included.
    pub fn contains(&self, point: Point2<f32>) -> bool {
        let [x1, y1, x2, y2] = self.to_tlbr();
        point.x >= x1 && point.x <= x2 && point.y >= y1 && point.y <= y2
    }

    /// Euclidean distance from the box center to the screen center.
    pub fn distance_from_screen_center(&self) -> f32 {
        nalgebra::distance(&self.center(), &screen_center())
    }

    /// Whether every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Clamp into the unit square so that the box never extends past a frame edge.
    pub fn clamped(&self) -> Self {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        Self {
            x,
            y,
            width: self.width.clamp(0.0, 1.0 - x),
            height: self.height.clamp(0.0, 1.0 - y),
        }
    }

    /// Scale to pixel space for a surface of the given size.
    pub fn to_pixels(&self, surface_width: f32, surface_height: f32) -> Rect {
        Rect {
            x: self.x * surface_width,
            y: self.y * surface_height,
            width: self.width * surface_width,
            height: self.height * surface_height,
        }
    }
}
