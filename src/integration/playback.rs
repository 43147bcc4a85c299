//! Render loop driven by playback events and host frame callbacks.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render::{Compositor, FrameReport, Surface};

/// Host hook that schedules one future call to [`RenderLoop::on_frame`].
///
/// Implement this on top of whatever frame callback the host has (an
/// animation-frame request, a vsync channel, a timer).
///
/// # Example
///
/// ```ignore
/// use target_overlay_rs::FrameScheduler;
///
/// struct VsyncScheduler {
///     tx: std::sync::mpsc::Sender<()>,
/// }
///
/// impl FrameScheduler for VsyncScheduler {
///     fn request_frame(&mut self) {
///         let _ = self.tx.send(());
///     }
/// }
/// ```
pub trait FrameScheduler {
    /// Ask the host for exactly one frame callback.
    fn request_frame(&mut self);
}

/// Video element events the loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Play,
    Pause,
    Seeked,
    Ended,
}

/// Playback clock sampled by the host at frame time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub current_time_s: f64,
    pub playing: bool,
}

impl PlaybackPosition {
    pub fn playing(current_time_s: f64) -> Self {
        Self {
            current_time_s,
            playing: true,
        }
    }

    pub fn paused(current_time_s: f64) -> Self {
        Self {
            current_time_s,
            playing: false,
        }
    }
}

/// Single-threaded render loop around a [`Compositor`].
///
/// At most one frame request is outstanding at a time. While playing, every
/// frame re-arms the next one; pausing or ending lets the loop lapse after the
/// pending frame, and a seek paints one frame even while paused.
pub struct RenderLoop<S: Surface, F: FrameScheduler> {
    compositor: Compositor<S>,
    scheduler: F,
    armed: bool,
    torn_down: bool,
}

impl<S: Surface, F: FrameScheduler> RenderLoop<S, F> {
    pub fn new(compositor: Compositor<S>, scheduler: F) -> Self {
        Self {
            compositor,
            scheduler,
            armed: false,
            torn_down: false,
        }
    }

    pub fn on_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Play | PlaybackEvent::Seeked => self.arm(),
            PlaybackEvent::Pause | PlaybackEvent::Ended => {
                debug!(?event, "Render loop will lapse after the pending frame");
            }
        }
    }

    /// Host frame callback. Paints one frame and re-arms while playing.
    ///
    /// Returns `None` once the loop has been torn down.
    pub fn on_frame(
        &mut self,
        surface: &mut S,
        position: PlaybackPosition,
        now: Duration,
    ) -> Option<FrameReport> {
        self.armed = false;
        if self.torn_down {
            return None;
        }

        let report = self
            .compositor
            .tick(surface, position.current_time_s, now);
        if position.playing {
            self.arm();
        }
        Some(report)
    }

    /// Stop scheduling and discard session state.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            debug!("Tearing down render loop");
        }
        self.torn_down = true;
        self.armed = false;
        self.compositor.reset_session();
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn compositor(&self) -> &Compositor<S> {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut Compositor<S> {
        &mut self.compositor
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    fn arm(&mut self) {
        if self.armed || self.torn_down {
            return;
        }
        self.armed = true;
        self.scheduler.request_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{ResultPayload, VideoMeta};
    use crate::render::{DisplayList, Mode};
    use crate::tracker::{Detection, Rect};

    #[derive(Default)]
    struct CountingScheduler {
        requests: usize,
    }

    impl FrameScheduler for CountingScheduler {
        fn request_frame(&mut self) {
            self.requests += 1;
        }
    }

    fn render_loop() -> RenderLoop<DisplayList, CountingScheduler> {
        let tracks = vec![Detection::new(
            0,
            "v1",
            Rect::from_center(0.5, 0.5, 0.3, 0.2),
            true,
            0.9,
        )];
        let payload = ResultPayload::new(VideoMeta::default(), tracks);
        RenderLoop::new(
            Compositor::new(payload, Mode::Hawkeye),
            CountingScheduler::default(),
        )
    }

    #[test]
    fn test_play_arms_once() {
        let mut lp = render_loop();
        lp.on_event(PlaybackEvent::Play);
        lp.on_event(PlaybackEvent::Play);
        assert!(lp.is_armed());
        assert_eq!(lp.scheduler().requests, 1);
    }

    #[test]
    fn test_playing_frames_rearm() {
        let mut lp = render_loop();
        let mut surface = DisplayList::new(640.0, 360.0);
        lp.on_event(PlaybackEvent::Play);
        for i in 0..3u64 {
            let t = i as f64 / 30.0;
            let report = lp
                .on_frame(&mut surface, PlaybackPosition::playing(t), Duration::from_millis(i * 33))
                .unwrap();
            assert_eq!(report.priority_id.as_deref(), Some("v1"));
        }
        assert_eq!(lp.scheduler().requests, 4);
        assert!(lp.is_armed());
    }

    #[test]
    fn test_pause_lapses_and_seek_paints_once() {
        let mut lp = render_loop();
        let mut surface = DisplayList::new(640.0, 360.0);
        lp.on_event(PlaybackEvent::Play);
        lp.on_event(PlaybackEvent::Pause);
        lp.on_frame(&mut surface, PlaybackPosition::paused(0.0), Duration::ZERO);
        assert!(!lp.is_armed());
        assert_eq!(lp.scheduler().requests, 1);

        lp.on_event(PlaybackEvent::Seeked);
        assert_eq!(lp.scheduler().requests, 2);
        lp.on_frame(&mut surface, PlaybackPosition::paused(0.0), Duration::ZERO);
        assert!(!lp.is_armed());
    }

    #[test]
    fn test_teardown_stops_loop() {
        let mut lp = render_loop();
        let mut surface = DisplayList::new(640.0, 360.0);
        lp.on_event(PlaybackEvent::Play);
        lp.on_frame(&mut surface, PlaybackPosition::playing(0.0), Duration::ZERO);
        assert_eq!(lp.compositor().selector().current_id(), Some("v1"));

        lp.teardown();
        assert!(lp.is_torn_down());
        assert_eq!(lp.compositor().selector().current_id(), None);
        assert!(
            lp.on_frame(&mut surface, PlaybackPosition::playing(0.1), Duration::ZERO)
                .is_none()
        );
        lp.on_event(PlaybackEvent::Play);
        assert!(!lp.is_armed());
    }
}
