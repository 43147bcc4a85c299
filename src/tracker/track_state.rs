use serde::Serialize;

/// Phase of the priority selector, derived from its state and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectorPhase {
    /// No candidate holds priority
    #[default]
    NoTarget,
    /// Priority was just taken and is inside the lock window
    Locked,
    /// Past the lock window with no better candidate
    Tracking,
    /// Past the lock window while a better candidate accumulates time
    Challenged,
}

impl SelectorPhase {
    /// Short label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            SelectorPhase::NoTarget => "NO TARGET",
            SelectorPhase::Locked => "LOCKED",
            SelectorPhase::Tracking => "TRACKING",
            SelectorPhase::Challenged => "CHALLENGED",
        }
    }
}
