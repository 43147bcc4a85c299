//! Frame-synchronized tracking overlay.
//!
//! Takes a pre-computed list of per-frame detections and, for any playback
//! timestamp, resolves the detections to show, keeps a sticky priority target
//! across frames and paints styled boxes, labels, markers and a crosshair onto
//! a host-provided [`Surface`].
//!
//! # Example
//!
//! ```ignore
//! use target_overlay_rs::{Compositor, DisplayList, Mode, ResultPayload};
//! use std::time::Duration;
//!
//! let payload = ResultPayload::from_path("results.json")?;
//! let mut compositor = Compositor::<DisplayList>::new(payload, Mode::Hawkeye);
//! let mut surface = DisplayList::new(1280.0, 720.0);
//! let report = compositor.tick(&mut surface, 2.5, Duration::from_millis(2500));
//! ```

pub mod error;
pub mod integration;
pub mod render;
pub mod tracker;

pub use error::{OverlayError, OverlayResult};
pub use integration::{
    DetectionBuilder, FrameScheduler, PlaybackEvent, PlaybackPosition, RenderLoop, ResultPayload,
    VideoMeta,
};
pub use render::{
    AssetCache, AssetState, Color, Compositor, CompositorConfig, DisplayList, FrameReport, Mode,
    Surface, VisualSettings, VisualState, classify,
};
pub use tracker::{
    Detection, PrioritySelector, PriorityTarget, Rect, SelectorConfig, SelectorPhase, TrackStore,
    estimate_distance,
};
