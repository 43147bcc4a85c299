//! Per-frame detection record produced by the external detector.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::tracker::rect::Rect;

/// COCO class ids the detector reports for vehicles (car, motorcycle, bus, truck).
pub const VEHICLE_CLASS_IDS: [u32; 4] = [2, 3, 5, 7];

/// Object type name for a COCO class id.
pub fn object_type_for_class(class_id: u32) -> &'static str {
    match class_id {
        0 => "person",
        2 => "car",
        3 => "motorcycle",
        5 => "bus",
        7 => "truck",
        _ => "unknown",
    }
}

/// A single tracked object in a single frame.
///
/// Coordinates are normalized to the source video size, with `x`/`y` the
/// top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Processed frame index
    pub frame: u32,
    /// Tracker identity, stable across frames while the tracker holds it
    #[serde(deserialize_with = "deserialize_track_id")]
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Whether the object is a vehicle (otherwise a person)
    #[serde(default, alias = "is_vehicle")]
    pub is_vehicle: Option<bool>,
    /// Human-readable class name, e.g. "car"
    #[serde(default, alias = "object_type")]
    pub object_type: Option<String>,
    /// Source class id, when the detector reports one
    #[serde(default, alias = "class_id", skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u32>,
    /// Detector confidence
    #[serde(default)]
    pub score: f32,
}

impl Detection {
    /// Create a person or vehicle detection with a normalized TLWH box.
    pub fn new(frame: u32, id: impl Into<String>, rect: Rect, is_vehicle: bool, score: f32) -> Self {
        let object_type = if is_vehicle { "car" } else { "person" };
        Self {
            frame,
            id: id.into(),
            x: rect.x,
            y: rect.y,
            w: rect.width,
            h: rect.height,
            is_vehicle: Some(is_vehicle),
            object_type: Some(object_type.to_string()),
            class_id: None,
            score,
        }
    }

    /// Normalized bounding box.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Whether this detection is a vehicle. Falls back to the class id when the
    /// payload did not say.
    pub fn is_vehicle(&self) -> bool {
        match (self.is_vehicle, self.class_id) {
            (Some(flag), _) => flag,
            (None, Some(class_id)) => VEHICLE_CLASS_IDS.contains(&class_id),
            (None, None) => false,
        }
    }

    /// Class name to display.
    pub fn object_type(&self) -> &str {
        match (&self.object_type, self.class_id) {
            (Some(name), _) => name,
            (None, Some(class_id)) => object_type_for_class(class_id),
            (None, None) => "unknown",
        }
    }

    /// Fill in derived fields and clamp the box into the frame.
    ///
    /// Returns `None` when any coordinate is not a finite number.
    pub fn sanitized(mut self) -> Option<Self> {
        let rect = self.rect();
        if !rect.is_finite() {
            return None;
        }
        let rect = rect.clamped();
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.width;
        self.h = rect.height;
        self.is_vehicle = Some(self.is_vehicle());
        self.object_type = Some(self.object_type().to_string());
        if !self.score.is_finite() {
            self.score = 0.0;
        }
        Some(self)
    }
}

/// Track ids arrive as integers from the detector but are strings elsewhere.
fn deserialize_track_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct TrackIdVisitor;

    impl Visitor<'_> for TrackIdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or integer track id")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(TrackIdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_detector_output() {
        let json = r#"{"frame":3,"id":17,"x":0.1,"y":0.2,"w":0.3,"h":0.4,
            "score":0.8,"class_id":5,"object_type":"bus","is_vehicle":true}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.id, "17");
        assert_eq!(det.frame, 3);
        assert!(det.is_vehicle());
        assert_eq!(det.object_type(), "bus");
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"frame":0,"id":"p-1","x":0.1,"y":0.2,"w":0.3,"h":0.4,
            "score":0.5,"isVehicle":false,"objectType":"person"}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.id, "p-1");
        assert!(!det.is_vehicle());
        assert_eq!(det.object_type(), "person");
    }

    #[test]
    fn test_class_fallbacks() {
        let json = r#"{"frame":0,"id":4,"x":0.1,"y":0.2,"w":0.3,"h":0.4,"classId":7}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert!(det.is_vehicle());
        assert_eq!(det.object_type(), "truck");
        assert_eq!(det.score, 0.0);
    }

    #[test]
    fn test_sanitized() {
        let det = Detection::new(0, "a", Rect::new(0.9, -0.2, 0.3, 0.5), false, 0.9);
        let clean = det.sanitized().unwrap();
        assert_eq!(clean.x, 0.9);
        assert_eq!(clean.y, 0.0);
        assert!((clean.x + clean.w - 1.0).abs() < 1e-6);

        let bad = Detection::new(0, "b", Rect::new(f32::NAN, 0.0, 0.1, 0.1), false, 0.9);
        assert!(bad.sanitized().is_none());
    }
}
