//! Frame-indexed, read-only store of detections for one job.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::tracker::detection::Detection;

/// How many frames back `detections_near` will look for data.
pub const DEFAULT_LOOKBACK: u32 = 20;

/// Detections chosen for a requested frame.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFrame<'a> {
    /// Frame whose detections were returned (the requested one when `exact`)
    pub frame: Option<u32>,
    pub detections: &'a [Detection],
    /// Whether `frame` is the requested frame
    pub exact: bool,
}

/// Immutable sequence of detections grouped by frame.
///
/// Populated once from the result payload; there are no mutation methods.
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    frames: BTreeMap<u32, Vec<Detection>>,
    len: usize,
}

impl TrackStore {
    /// Build a store from raw detections. Detections whose geometry is not
    /// finite are dropped; everything else is clamped into the frame.
    pub fn new(detections: Vec<Detection>) -> Self {
        let mut frames: BTreeMap<u32, Vec<Detection>> = BTreeMap::new();
        let mut len = 0;
        let mut dropped = 0;

        for det in detections {
            let frame = det.frame;
            match det.sanitized() {
                Some(det) => {
                    frames.entry(frame).or_default().push(det);
                    len += 1;
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(dropped, "Dropped detections with non-finite geometry");
        }
        info!(
            detections = len,
            frames = frames.len(),
            "Track store loaded"
        );

        Self { frames, len }
    }

    /// Detections recorded for exactly frame `n`; empty when there are none.
    pub fn detections_at_frame(&self, n: u32) -> &[Detection] {
        self.frames.get(&n).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Detections of the most recent frame `f` with `n - lookback <= f <= n`
    /// that has any entry; empty when no such frame exists.
    pub fn detections_near(&self, n: u32, lookback: u32) -> &[Detection] {
        self.nearest_frame(n, lookback)
            .map(|(_, dets)| dets.as_slice())
            .unwrap_or(&[])
    }

    /// Exact match when available, otherwise the look-back fallback.
    pub fn resolve(&self, n: u32) -> ResolvedFrame<'_> {
        self.resolve_with_lookback(n, DEFAULT_LOOKBACK)
    }

    /// Like [`TrackStore::resolve`] with an explicit look-back window.
    pub fn resolve_with_lookback(&self, n: u32, lookback: u32) -> ResolvedFrame<'_> {
        match self.nearest_frame(n, lookback) {
            Some((&frame, dets)) => ResolvedFrame {
                frame: Some(frame),
                detections: dets.as_slice(),
                exact: frame == n,
            },
            None => ResolvedFrame {
                frame: None,
                detections: &[],
                exact: false,
            },
        }
    }

    fn nearest_frame(&self, n: u32, lookback: u32) -> Option<(&u32, &Vec<Detection>)> {
        self.frames
            .range(n.saturating_sub(lookback)..=n)
            .rev()
            .find(|(_, dets)| !dets.is_empty())
    }

    /// Total number of detections.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct frames with detections.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn first_frame(&self) -> Option<u32> {
        self.frames.keys().next().copied()
    }

    pub fn last_frame(&self) -> Option<u32> {
        self.frames.keys().next_back().copied()
    }
}
