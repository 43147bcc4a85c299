//! Builder for creating Detection records from pixel or normalized boxes.

use crate::tracker::{Detection, Rect, VEHICLE_CLASS_IDS, object_type_for_class};

/// Builder for creating `Detection` records from various box formats.
///
/// Pixel boxes are normalized against the frame size given to
/// [`DetectionBuilder::frame_size`].
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    frame: u32,
    id: String,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    frame_width: Option<f32>,
    frame_height: Option<f32>,
    class_id: Option<u32>,
    is_vehicle: Option<bool>,
    object_type: Option<String>,
    score: f32,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new(frame: u32, id: impl Into<String>) -> Self {
        Self {
            frame,
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.x1 = l;
        self.y1 = t;
        self.x2 = l + w;
        self.y2 = t + h;
        self
    }

    /// Treat the box as pixels of a frame with this size.
    pub fn frame_size(mut self, width: f32, height: f32) -> Self {
        self.frame_width = Some(width);
        self.frame_height = Some(height);
        self
    }

    /// Set the COCO class id; also decides vehicle/person unless overridden.
    pub fn class_id(mut self, class_id: u32) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn vehicle(mut self, is_vehicle: bool) -> Self {
        self.is_vehicle = Some(is_vehicle);
        self
    }

    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        let (sx, sy) = match (self.frame_width, self.frame_height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => (w, h),
            _ => (1.0, 1.0),
        };
        let rect = Rect::new(
            self.x1 / sx,
            self.y1 / sy,
            (self.x2 - self.x1) / sx,
            (self.y2 - self.y1) / sy,
        );

        let is_vehicle = self
            .is_vehicle
            .or_else(|| self.class_id.map(|c| VEHICLE_CLASS_IDS.contains(&c)))
            .unwrap_or(false);
        let object_type = self
            .object_type
            .or_else(|| self.class_id.map(|c| object_type_for_class(c).to_string()));

        let mut detection = Detection::new(self.frame, self.id, rect, is_vehicle, self.score);
        detection.class_id = self.class_id;
        if object_type.is_some() {
            detection.object_type = object_type;
        }
        detection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new(4, "7")
            .tlbr(0.1, 0.2, 0.5, 0.8)
            .score(0.95)
            .build();

        assert_eq!(det.frame, 4);
        assert_eq!(det.id, "7");
        assert_eq!(det.score, 0.95);
        assert!((det.w - 0.4).abs() < 1e-6);
        assert!((det.h - 0.6).abs() < 1e-6);
        assert!(!det.is_vehicle());
    }

    #[test]
    fn test_pixel_boxes_are_normalized() {
        let det = DetectionBuilder::new(0, "1")
            .tlwh(320.0, 180.0, 640.0, 360.0)
            .frame_size(1280.0, 720.0)
            .build();
        assert_eq!(det.rect(), Rect::new(0.25, 0.25, 0.5, 0.5));
    }

    #[test]
    fn test_class_id_decides_kind() {
        let truck = DetectionBuilder::new(0, "1")
            .xywh(0.5, 0.5, 0.2, 0.1)
            .class_id(7)
            .build();
        assert!(truck.is_vehicle());
        assert_eq!(truck.object_type(), "truck");

        let overridden = DetectionBuilder::new(0, "2")
            .class_id(0)
            .vehicle(true)
            .object_type("cart")
            .build();
        assert!(overridden.is_vehicle());
        assert_eq!(overridden.object_type(), "cart");
    }
}
