//! Integration module for feeding detector output into the overlay and
//! driving it from a host video player.
//!
//! This module provides the result payload loader, a builder for detections
//! coming from other sources and the playback-driven render loop.

mod builder;
mod payload;
mod playback;

pub use builder::DetectionBuilder;
pub use payload::{FALLBACK_FPS, ResultPayload, VideoMeta};
pub use playback::{FrameScheduler, PlaybackEvent, PlaybackPosition, RenderLoop};
