//! Charge timers for the tracking marker on the person under the crosshair.

use std::collections::HashMap;
use std::time::Duration;

/// Sub-state of the tracking marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeState {
    /// Still charging; `progress` runs from 0.0 to 1.0
    Charging { progress: f32 },
    Ready,
}

impl ChargeState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ChargeState::Ready)
    }
}

#[derive(Debug, Clone, Copy)]
struct LockEntry {
    first_locked: Duration,
    last_active: Duration,
}

/// Per-id lock timers.
///
/// An id charges for `charge` after it first comes under the crosshair and is
/// then ready. Entries that are not the active lock and have been idle for
/// longer than `purge_after` are dropped, so an id that returns later starts
/// charging again.
#[derive(Debug, Clone)]
pub struct LockTimers {
    entries: HashMap<String, LockEntry>,
    charge: Duration,
    purge_after: Duration,
}

impl Default for LockTimers {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(10))
    }
}

impl LockTimers {
    pub fn new(charge: Duration, purge_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            charge,
            purge_after,
        }
    }

    /// Record that `active` (if any) is locked at `now`, purge idle entries and
    /// return the marker state for `active`.
    pub fn update(&mut self, active: Option<&str>, now: Duration) -> Option<ChargeState> {
        let purge_after = self.purge_after;
        self.entries.retain(|id, entry| {
            Some(id.as_str()) == active || now.saturating_sub(entry.last_active) <= purge_after
        });

        let id = active?;
        let entry = self.entries.entry(id.to_string()).or_insert(LockEntry {
            first_locked: now,
            last_active: now,
        });
        entry.last_active = now;

        let held = now.saturating_sub(entry.first_locked);
        if held >= self.charge {
            Some(ChargeState::Ready)
        } else {
            Some(ChargeState::Charging {
                progress: held.as_secs_f32() / self.charge.as_secs_f32(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
