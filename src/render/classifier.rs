//! Per-object visual state classification.

use crate::render::settings::Mode;
use crate::render::style::{Pursuit, VisualState};
use crate::tracker::Detection;

/// Beyond this a person under the crosshair is drawn as far.
pub const PERSON_FAR_THRESHOLD_M: f32 = 15.0;
/// Beyond this a vehicle under the crosshair is drawn as far.
pub const VEHICLE_FAR_THRESHOLD_M: f32 = 20.0;
/// At or within this a selected vehicle is drawn as near.
pub const SELECTED_NEAR_THRESHOLD_M: f32 = 5.0;

/// Everything the classifier looks at for one detection.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    pub detection: &'a Detection,
    pub distance_m: f32,
    pub mode: Mode,
    /// Box contains the screen center
    pub under_crosshair: bool,
    /// Detection is the current sticky priority target
    pub is_priority: bool,
}

/// Map a detection and its context to a visual state.
///
/// Pure: the same input always yields the same state.
pub fn classify(input: &ClassifyInput<'_>) -> VisualState {
    let is_vehicle = input.detection.is_vehicle();
    if !input.mode.is_priority_class(is_vehicle) {
        return VisualState::Background;
    }

    if is_vehicle {
        if input.is_priority {
            return if input.distance_m <= SELECTED_NEAR_THRESHOLD_M {
                VisualState::Selected(Pursuit::Near)
            } else {
                VisualState::Selected(Pursuit::Far)
            };
        }
        return crosshair_state(input, VEHICLE_FAR_THRESHOLD_M);
    }

    crosshair_state(input, PERSON_FAR_THRESHOLD_M)
}

fn crosshair_state(input: &ClassifyInput<'_>, far_threshold: f32) -> VisualState {
    if !input.under_crosshair {
        VisualState::Unlocked
    } else if input.distance_m > far_threshold {
        VisualState::Far
    } else {
        VisualState::Locked
    }
}
