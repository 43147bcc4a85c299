//! Detection data, frame lookup and priority-target selection.

mod detection;
mod distance;
mod priority_selector;
mod rect;
mod scoring;
mod track_state;
mod track_store;

pub use detection::{Detection, VEHICLE_CLASS_IDS, object_type_for_class};
pub use distance::{
    MAX_DISPLAY_DISTANCE_M, MIN_DISPLAY_DISTANCE_M, PERSON_REFERENCE_HEIGHT_M,
    VEHICLE_REFERENCE_HEIGHT_M, estimate_distance, format_distance,
};
pub use priority_selector::{PrioritySelector, PriorityTarget, SelectorConfig, SelectorState};
pub use rect::{Rect, screen_center};
pub use scoring::{ScoreWeights, ScoredCandidate, candidate_score};
pub use track_state::SelectorPhase;
pub use track_store::{DEFAULT_LOOKBACK, ResolvedFrame, TrackStore};
