//! Result payload produced by the detection service.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{OverlayError, OverlayResult};
use crate::render::Mode;
use crate::tracker::Detection;

/// Frame rate assumed when the payload does not carry a usable one.
pub const FALLBACK_FPS: f32 = 30.0;

/// Video metadata attached to a result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Rate of the processed (possibly subsampled) frame indices
    #[serde(default)]
    pub fps: f32,
    /// Number of processed frames
    #[serde(default)]
    pub frames: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
}

impl Default for VideoMeta {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fps: FALLBACK_FPS,
            frames: 0,
            duration_s: None,
        }
    }
}

impl VideoMeta {
    /// Frame rate used for timestamp conversion.
    pub fn effective_fps(&self) -> f32 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            FALLBACK_FPS
        }
    }

    /// Processed-frame index shown at `current_time_s`.
    pub fn frame_index(&self, current_time_s: f64) -> u32 {
        if !current_time_s.is_finite() || current_time_s <= 0.0 {
            return 0;
        }
        let index = (current_time_s * self.effective_fps() as f64).floor();
        if index >= u32::MAX as f64 {
            u32::MAX
        } else {
            index as u32
        }
    }
}

/// Full detector output for one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub meta: VideoMeta,
    pub tracks: Vec<Detection>,
    /// Mode the job was processed for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

impl ResultPayload {
    pub fn new(meta: VideoMeta, tracks: Vec<Detection>) -> Self {
        Self {
            meta,
            tracks,
            mode: None,
        }
    }

    pub fn from_json_str(json: &str) -> OverlayResult<Self> {
        let payload: Self = serde_json::from_str(json)?;
        payload.validated()
    }

    pub fn from_reader<R: Read>(reader: R) -> OverlayResult<Self> {
        let payload: Self = serde_json::from_reader(reader)?;
        payload.validated()
    }

    pub fn from_path(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let payload = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!(
            path = %path.display(),
            tracks = payload.tracks.len(),
            "Loaded result payload"
        );
        Ok(payload)
    }

    fn validated(self) -> OverlayResult<Self> {
        if self.meta.fps.is_nan() || self.meta.fps < 0.0 {
            return Err(OverlayError::invalid_payload(format!(
                "meta.fps must be a non-negative number, got {}",
                self.meta.fps
            )));
        }
        if let Some(bad) = self.tracks.iter().find(|d| d.id.trim().is_empty()) {
            return Err(OverlayError::invalid_payload(format!(
                "detection in frame {} has an empty id",
                bad.frame
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "meta": {"fps": 10.0, "width": 1280, "height": 720, "frames": 3, "duration_s": 0.3},
        "tracks": [
            {"frame": 0, "id": 1, "x": 0.1, "y": 0.2, "w": 0.1, "h": 0.3, "score": 0.9, "class_id": 0},
            {"frame": 2, "id": "7", "x": 0.4, "y": 0.4, "w": 0.2, "h": 0.1, "isVehicle": true, "objectType": "bus"}
        ],
        "mode": "hawkeye"
    }"#;

    #[test]
    fn test_parse_payload() {
        let payload = ResultPayload::from_json_str(SAMPLE).unwrap();
        assert_eq!(payload.meta.width, 1280);
        assert_eq!(payload.meta.duration_s, Some(0.3));
        assert_eq!(payload.mode, Some(Mode::Hawkeye));
        assert_eq!(payload.tracks.len(), 2);
        assert_eq!(payload.tracks[0].id, "1");
        assert!(!payload.tracks[0].is_vehicle());
        assert_eq!(payload.tracks[0].object_type(), "person");
        assert!(payload.tracks[1].is_vehicle());
        assert_eq!(payload.tracks[1].object_type(), "bus");
    }

    #[test]
    fn test_frame_index() {
        let meta = VideoMeta {
            fps: 10.0,
            ..Default::default()
        };
        assert_eq!(meta.frame_index(0.0), 0);
        assert_eq!(meta.frame_index(0.25), 2);
        assert_eq!(meta.frame_index(-1.0), 0);
        assert_eq!(meta.frame_index(f64::NAN), 0);

        let broken = VideoMeta {
            fps: 0.0,
            ..Default::default()
        };
        assert_eq!(broken.frame_index(1.0), 30);
    }

    #[test]
    fn test_rejects_bad_payloads() {
        assert!(matches!(
            ResultPayload::from_json_str("{"),
            Err(OverlayError::JsonParse(_))
        ));
        let empty_id = r#"{"tracks": [{"frame": 0, "id": " ", "x": 0, "y": 0, "w": 0.1, "h": 0.1}]}"#;
        assert!(matches!(
            ResultPayload::from_json_str(empty_id),
            Err(OverlayError::InvalidPayload(_))
        ));
        let negative_fps = r#"{"meta": {"fps": -1}, "tracks": []}"#;
        assert!(ResultPayload::from_json_str(negative_fps).is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let payload = ResultPayload::from_path(file.path()).unwrap();
        assert_eq!(payload.tracks.len(), 2);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            ResultPayload::from_path(missing),
            Err(OverlayError::Io(_))
        ));
    }
}
