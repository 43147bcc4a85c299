//! Sticky priority-target selection with lock and challenge hysteresis.
//!
//! One candidate at a time holds "priority". A freshly chosen target is locked
//! for a fixed window during which only an overwhelming challenger can take
//! over. After the window a challenger has to stay better for a sustained
//! period before priority moves, so the overlay does not flicker between
//! near-equal candidates.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::tracker::detection::Detection;
use crate::tracker::distance::estimate_distance;
use crate::tracker::scoring::{self, ScoreWeights, ScoredCandidate};
use crate::tracker::track_state::SelectorPhase;

/// Configuration for the PrioritySelector.
///
/// The weights and thresholds are hand-tuned and pending product validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Weight of closeness to the screen center
    pub center_weight: f32,
    /// Weight of accumulated tracking history
    pub history_weight: f32,
    /// History count at which the history term stops growing
    pub history_saturation: u32,
    /// How long a new target is protected from ordinary challengers
    pub lock_window_ms: u64,
    /// How long a challenger must stay better before it takes over
    pub challenge_ms: u64,
    /// Score ratio a challenger needs to break a lock
    pub immediate_switch_ratio: f32,
    /// History ratio a challenger needs to break a lock
    pub immediate_history_factor: f32,
    /// Fraction of the frame width on each side in which targets are not held
    pub edge_margin: f32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            center_weight: 0.6,
            history_weight: 0.4,
            history_saturation: 100,
            lock_window_ms: 5000,
            challenge_ms: 2000,
            immediate_switch_ratio: 1.4,
            immediate_history_factor: 2.0,
            edge_margin: 0.15,
        }
    }
}

impl SelectorConfig {
    pub fn lock_window(&self) -> Duration {
        Duration::from_millis(self.lock_window_ms)
    }

    pub fn challenge_window(&self) -> Duration {
        Duration::from_millis(self.challenge_ms)
    }

    fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            center_weight: self.center_weight,
            history_weight: self.history_weight,
            history_saturation: self.history_saturation,
        }
    }

    /// Whether the detection's center-x lies inside the valid screen region.
    pub fn in_bounds(&self, detection: &Detection) -> bool {
        let cx = detection.rect().center().x;
        cx >= self.edge_margin && cx <= 1.0 - self.edge_margin
    }
}

/// Mutable selector state for one playback session.
///
/// When a priority id is set it is always present in the tracking history
/// with a count of at least one, and the lock timestamp is set.
#[derive(Debug, Clone, Default)]
pub struct SelectorState {
    current_priority_id: Option<String>,
    priority_lock_timestamp: Option<Duration>,
    tracking_history: HashMap<String, u32>,
    challenger_first_seen: HashMap<String, Duration>,
}

impl SelectorState {
    pub fn current_priority_id(&self) -> Option<&str> {
        self.current_priority_id.as_deref()
    }

    pub fn priority_lock_timestamp(&self) -> Option<Duration> {
        self.priority_lock_timestamp
    }

    /// Consecutive ticks `id` has been a candidate.
    pub fn history(&self, id: &str) -> u32 {
        self.tracking_history.get(id).copied().unwrap_or(0)
    }

    /// When `id` started its current uninterrupted challenge.
    pub fn challenger_since(&self, id: &str) -> Option<Duration> {
        self.challenger_first_seen.get(id).copied()
    }

    pub fn challenger_count(&self) -> usize {
        self.challenger_first_seen.len()
    }

    /// Whether every field is cleared.
    pub fn is_empty(&self) -> bool {
        self.current_priority_id.is_none()
            && self.priority_lock_timestamp.is_none()
            && self.tracking_history.is_empty()
            && self.challenger_first_seen.is_empty()
    }

    fn clear(&mut self) {
        self.current_priority_id = None;
        self.priority_lock_timestamp = None;
        self.tracking_history.clear();
        self.challenger_first_seen.clear();
    }
}

/// The candidate currently holding priority.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityTarget {
    pub detection: Detection,
    /// Estimated distance in meters
    pub distance_m: f32,
    /// Selection score on this tick
    pub score: f32,
}

/// Chooses and holds a single priority target across ticks.
#[derive(Debug, Clone, Default)]
pub struct PrioritySelector {
    config: SelectorConfig,
    state: SelectorState,
}

impl PrioritySelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            state: SelectorState::default(),
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    pub fn current_id(&self) -> Option<&str> {
        self.state.current_priority_id()
    }

    /// Discard all state, as on unmount or mode change.
    pub fn reset(&mut self) {
        self.state.clear();
    }

    /// Phase at time `now`.
    pub fn phase(&self, now: Duration) -> SelectorPhase {
        let Some(locked_at) = self.state.priority_lock_timestamp else {
            return SelectorPhase::NoTarget;
        };
        if self.state.current_priority_id.is_none() {
            return SelectorPhase::NoTarget;
        }
        if now.saturating_sub(locked_at) < self.config.lock_window() {
            SelectorPhase::Locked
        } else if self.state.challenger_first_seen.is_empty() {
            SelectorPhase::Tracking
        } else {
            SelectorPhase::Challenged
        }
    }

    /// Advance one tick with this tick's candidates and return the target.
    ///
    /// Never fails: an empty candidate list is an ordinary `NoTarget` tick.
    pub fn update(&mut self, candidates: &[Detection], now: Duration) -> Option<PriorityTarget> {
        if candidates.is_empty() {
            if !self.state.is_empty() {
                debug!("No candidates, clearing priority state");
            }
            self.state.clear();
            return None;
        }

        self.drop_invalid_priority(candidates);
        self.record_history(candidates);

        let weights = self.config.weights();
        let scored: Vec<ScoredCandidate> = candidates
            .iter()
            .filter(|d| self.config.in_bounds(d))
            .map(|d| {
                let history = self.state.history(&d.id);
                ScoredCandidate {
                    detection: d,
                    score: scoring::candidate_score(d, history, &weights),
                    history,
                }
            })
            .collect();

        let current = self
            .state
            .current_priority_id
            .as_deref()
            .and_then(|id| scored.iter().find(|c| c.detection.id == id).copied());

        let chosen = match current {
            Some(current) => self.hold_or_switch(current, &scored, now),
            None => {
                let best = scoring::best(scored.iter())?;
                self.take_priority(&best, now, "selected");
                best
            }
        };

        Some(PriorityTarget {
            detection: chosen.detection.clone(),
            distance_m: estimate_distance(chosen.detection.h, chosen.detection.is_vehicle()),
            score: chosen.score,
        })
    }

    /// Reset when the held target vanished or drifted into the edge margin.
    fn drop_invalid_priority(&mut self, candidates: &[Detection]) {
        let Some(id) = self.state.current_priority_id.as_deref() else {
            return;
        };
        match candidates.iter().find(|d| d.id == id) {
            None => {
                debug!(id, "Priority target left the candidate set");
                self.state.clear();
            }
            Some(d) if !self.config.in_bounds(d) => {
                debug!(id, "Priority target left the screen region");
                self.state.clear();
            }
            Some(_) => {}
        }
    }

    /// Count consecutive ticks for every candidate and forget absent ids.
    fn record_history(&mut self, candidates: &[Detection]) {
        let present: HashSet<&str> = candidates.iter().map(|d| d.id.as_str()).collect();
        self.state
            .tracking_history
            .retain(|id, _| present.contains(id.as_str()));
        for id in present {
            *self.state.tracking_history.entry(id.to_string()).or_insert(0) += 1;
        }
    }

    fn hold_or_switch<'a>(
        &mut self,
        current: ScoredCandidate<'a>,
        scored: &[ScoredCandidate<'a>],
        now: Duration,
    ) -> ScoredCandidate<'a> {
        let locked_at = self.state.priority_lock_timestamp.unwrap_or(now);
        let challengers = scored
            .iter()
            .filter(|c| c.detection.id != current.detection.id);

        if now.saturating_sub(locked_at) < self.config.lock_window() {
            self.state.challenger_first_seen.clear();
            let score_bar = current.score * self.config.immediate_switch_ratio;
            let history_bar = current.history as f32 * self.config.immediate_history_factor;
            let overwhelming = challengers
                .filter(|c| c.score > score_bar && c.history as f32 > history_bar)
                .copied()
                .collect::<Vec<_>>();
            return match scoring::best(overwhelming.iter()) {
                Some(winner) => {
                    self.take_priority(&winner, now, "lock broken");
                    winner
                }
                None => current,
            };
        }

        let better: Vec<ScoredCandidate> = challengers
            .filter(|c| c.score > current.score)
            .copied()
            .collect();

        if better.is_empty() {
            if !self.state.challenger_first_seen.is_empty() {
                debug!(
                    id = %current.detection.id,
                    "Challenge ended, incumbent holds priority"
                );
            }
            self.state.challenger_first_seen.clear();
            return current;
        }

        self.state
            .challenger_first_seen
            .retain(|id, _| better.iter().any(|c| &c.detection.id == id));
        for c in &better {
            self.state
                .challenger_first_seen
                .entry(c.detection.id.clone())
                .or_insert(now);
        }

        let challenge_window = self.config.challenge_window();
        let ripe: Vec<ScoredCandidate> = better
            .iter()
            .filter(|c| {
                self.state
                    .challenger_since(&c.detection.id)
                    .is_some_and(|since| now.saturating_sub(since) >= challenge_window)
            })
            .copied()
            .collect();

        match scoring::best(ripe.iter()) {
            Some(winner) => {
                self.take_priority(&winner, now, "challenge won");
                winner
            }
            None => current,
        }
    }

    fn take_priority(&mut self, winner: &ScoredCandidate<'_>, now: Duration, reason: &str) {
        debug!(
            id = %winner.detection.id,
            score = winner.score,
            previous = ?self.state.current_priority_id,
            reason,
            "Priority target changed"
        );
        self.state.current_priority_id = Some(winner.detection.id.clone());
        self.state.priority_lock_timestamp = Some(now);
        self.state.challenger_first_seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::rect::Rect;

    fn vehicle(id: &str, cx: f32) -> Detection {
        Detection::new(0, id, Rect::from_center(cx, 0.5, 0.1, 0.1), true, 0.9)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_selects_most_central_candidate() {
        let mut selector = PrioritySelector::default();
        let target = selector
            .update(&[vehicle("a", 0.3), vehicle("b", 0.55)], ms(0))
            .unwrap();
        assert_eq!(target.detection.id, "b");
        assert_eq!(selector.phase(ms(0)), SelectorPhase::Locked);
        assert_eq!(selector.state().history("b"), 1);
        assert_eq!(selector.state().priority_lock_timestamp(), Some(ms(0)));
    }

    #[test]
    fn test_equal_scores_break_ties_by_id() {
        let mut forward = PrioritySelector::default();
        let mut backward = PrioritySelector::default();
        let a = forward.update(&[vehicle("b", 0.5), vehicle("a", 0.5)], ms(0));
        let b = backward.update(&[vehicle("a", 0.5), vehicle("b", 0.5)], ms(0));
        assert_eq!(a.unwrap().detection.id, "a");
        assert_eq!(b.unwrap().detection.id, "a");
    }

    #[test]
    fn test_lock_holds_against_moderate_challenger() {
        let mut selector = PrioritySelector::default();
        selector.update(&[vehicle("a", 0.5), vehicle("b", 0.8)], ms(0));

        // b becomes clearly more central, but not overwhelmingly so
        for t in (100..5000).step_by(100) {
            let target = selector
                .update(&[vehicle("a", 0.65), vehicle("b", 0.5)], ms(t))
                .unwrap();
            assert_eq!(target.detection.id, "a", "switched at {t}ms");
        }
    }

    #[test]
    fn test_lock_holds_without_history_advantage() {
        let mut selector = PrioritySelector::default();
        // b sits in the edge margin, so only a is eligible
        selector.update(&[vehicle("a", 0.84), vehicle("b", 0.9)], ms(0));
        assert_eq!(selector.current_id(), Some("a"));

        // b now scores > 1.4x a but has the same history
        let target = selector
            .update(&[vehicle("a", 0.84), vehicle("b", 0.5)], ms(100))
            .unwrap();
        assert_eq!(target.detection.id, "a");
    }

    #[test]
    fn test_overwhelming_challenger_breaks_lock() {
        let mut selector = PrioritySelector::default();
        // b is seen for a while in the edge margin before a appears
        for t in 0..50 {
            assert!(selector.update(&[vehicle("b", 0.9)], ms(t * 100)).is_none());
        }
        selector.update(&[vehicle("a", 0.75), vehicle("b", 0.9)], ms(5000));
        assert_eq!(selector.current_id(), Some("a"));

        let target = selector
            .update(&[vehicle("a", 0.75), vehicle("b", 0.5)], ms(5100))
            .unwrap();
        assert_eq!(target.detection.id, "b");
        assert_eq!(selector.state().priority_lock_timestamp(), Some(ms(5100)));
    }

    #[test]
    fn test_challenger_switches_at_boundary() {
        let mut selector = PrioritySelector::default();
        selector.update(&[vehicle("a", 0.5), vehicle("b", 0.7)], ms(0));

        let mut t = 100;
        while t < 5000 {
            selector.update(&[vehicle("a", 0.5), vehicle("b", 0.7)], ms(t));
            t += 100;
        }

        // b becomes better after the lock window
        let frame = [vehicle("a", 0.6), vehicle("b", 0.5)];
        selector.update(&frame, ms(5000));
        assert_eq!(selector.phase(ms(5000)), SelectorPhase::Challenged);
        assert_eq!(selector.state().challenger_since("b"), Some(ms(5000)));

        selector.update(&frame, ms(6900));
        assert_eq!(selector.current_id(), Some("a"));

        let target = selector.update(&frame, ms(7000)).unwrap();
        assert_eq!(target.detection.id, "b");
        assert_eq!(selector.state().challenger_count(), 0);
        assert_eq!(selector.phase(ms(7000)), SelectorPhase::Locked);
    }

    #[test]
    fn test_challenge_resets_when_challenger_falls_behind() {
        let mut selector = PrioritySelector::default();
        selector.update(&[vehicle("a", 0.5), vehicle("b", 0.7)], ms(0));

        let better = [vehicle("a", 0.6), vehicle("b", 0.5)];
        let worse = [vehicle("a", 0.5), vehicle("b", 0.7)];

        selector.update(&better, ms(5000));
        selector.update(&better, ms(6000));
        selector.update(&worse, ms(6100));
        assert_eq!(selector.state().challenger_since("b"), None);
        assert_eq!(selector.phase(ms(6100)), SelectorPhase::Tracking);

        selector.update(&better, ms(6200));
        selector.update(&better, ms(7000));
        assert_eq!(selector.current_id(), Some("a"));
        selector.update(&better, ms(8200));
        assert_eq!(selector.current_id(), Some("b"));
    }

    #[test]
    fn test_ties_never_switch() {
        let mut selector = PrioritySelector::default();
        selector.update(&[vehicle("b", 0.4), vehicle("a", 0.7)], ms(0));
        assert_eq!(selector.current_id(), Some("b"));

        // same box and same history: identical score
        let frame = [vehicle("b", 0.5), vehicle("a", 0.5)];
        for t in (5000..10000).step_by(100) {
            selector.update(&frame, ms(t));
            assert_eq!(selector.current_id(), Some("b"));
        }
        assert_eq!(selector.state().challenger_count(), 0);
    }

    #[test]
    fn test_empty_candidates_clear_state() {
        let mut selector = PrioritySelector::default();
        for t in 0..10 {
            selector.update(&[vehicle("a", 0.5), vehicle("b", 0.6)], ms(t * 100));
        }
        assert!(selector.update(&[], ms(1000)).is_none());
        assert!(selector.state().is_empty());
        assert_eq!(selector.phase(ms(1000)), SelectorPhase::NoTarget);

        let target = selector.update(&[vehicle("b", 0.6)], ms(1100)).unwrap();
        assert_eq!(target.detection.id, "b");
        assert_eq!(selector.state().history("b"), 1);
        assert_eq!(selector.state().priority_lock_timestamp(), Some(ms(1100)));
    }

    #[test]
    fn test_target_in_edge_margin_is_dropped() {
        let mut selector = PrioritySelector::default();
        selector.update(&[vehicle("a", 0.5), vehicle("b", 0.3)], ms(0));
        assert_eq!(selector.current_id(), Some("a"));

        let target = selector
            .update(&[vehicle("a", 0.9), vehicle("b", 0.3)], ms(100))
            .unwrap();
        assert_eq!(target.detection.id, "b");
        // history was cleared and rebuilt on the same tick
        assert_eq!(selector.state().history("b"), 1);
    }

    #[test]
    fn test_history_counts_consecutive_ticks() {
        let mut selector = PrioritySelector::default();
        selector.update(&[vehicle("a", 0.5), vehicle("b", 0.3)], ms(0));
        selector.update(&[vehicle("a", 0.5), vehicle("b", 0.3)], ms(100));
        selector.update(&[vehicle("a", 0.5)], ms(200));
        assert_eq!(selector.state().history("a"), 3);
        assert_eq!(selector.state().history("b"), 0);
    }

    #[test]
    fn test_distance_annotation() {
        let mut selector = PrioritySelector::default();
        let det = Detection::new(0, "a", Rect::from_center(0.5, 0.5, 0.2, 0.3), true, 0.9);
        let target = selector.update(&[det], ms(0)).unwrap();
        assert_eq!(target.distance_m, estimate_distance(0.3, true));
    }
}
