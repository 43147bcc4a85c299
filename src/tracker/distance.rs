//! Distance heuristic from normalized box height.
//!
//! This is a proportional model, not a calibrated measurement: an assumed
//! real-world height divided by the fraction of the frame the box occupies,
//! scaled by a per-bucket multiplier that shrinks as the box grows. The bucket
//! boundaries and multipliers are derived together; changing one without the
//! other breaks monotonicity.

/// Assumed standing height of a person, in meters.
pub const PERSON_REFERENCE_HEIGHT_M: f32 = 1.7;
/// Assumed height of a vehicle, in meters.
pub const VEHICLE_REFERENCE_HEIGHT_M: f32 = 1.5;

/// Box-height fractions at which the multiplier steps down, largest first.
const PERSON_BUCKETS: [f32; 4] = [0.8, 0.4, 0.2, 0.1];
const VEHICLE_BUCKETS: [f32; 4] = [0.6, 0.3, 0.15, 0.08];

/// Multipliers for boxes at/above each bucket boundary; the last applies below
/// the smallest boundary.
const BUCKET_MULTIPLIERS: [f32; 5] = [0.6, 0.9, 1.2, 1.6, 2.0];

/// Distances at or above this are displayed as "100+ m".
pub const MAX_DISPLAY_DISTANCE_M: f32 = 100.0;
/// Displayed distances never go below this.
pub const MIN_DISPLAY_DISTANCE_M: f32 = 1.0;

/// Estimate the distance to an object, in whole meters.
///
/// Returns `f32::INFINITY` for a non-positive or non-finite height.
pub fn estimate_distance(box_height: f32, is_vehicle: bool) -> f32 {
    if !box_height.is_finite() || box_height <= 0.0 {
        return f32::INFINITY;
    }

    let (reference, buckets) = if is_vehicle {
        (VEHICLE_REFERENCE_HEIGHT_M, &VEHICLE_BUCKETS)
    } else {
        (PERSON_REFERENCE_HEIGHT_M, &PERSON_BUCKETS)
    };

    let bucket = buckets
        .iter()
        .position(|&boundary| box_height >= boundary)
        .unwrap_or(buckets.len());

    (reference / box_height * BUCKET_MULTIPLIERS[bucket]).round()
}

/// Format a distance for a label, capped at "100+ m" and floored at 1 m.
pub fn format_distance(meters: f32) -> String {
    if meters.is_nan() || meters >= MAX_DISPLAY_DISTANCE_M {
        return format!("{}+ m", MAX_DISPLAY_DISTANCE_M as u32);
    }
    format!("{} m", meters.max(MIN_DISPLAY_DISTANCE_M).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_half_frame_is_close() {
        let d = estimate_distance(0.5, false);
        assert!((1.0..=5.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_monotonic_in_height() {
        for is_vehicle in [false, true] {
            let mut previous = f32::INFINITY;
            for step in 1..=1000 {
                let h = step as f32 / 1000.0;
                let d = estimate_distance(h, is_vehicle);
                assert!(
                    d <= previous,
                    "distance rose at h={h} (vehicle={is_vehicle}): {previous} -> {d}"
                );
                previous = d;
            }
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        // At a boundary the smaller multiplier applies.
        assert_eq!(estimate_distance(0.8, false), (1.7f32 / 0.8 * 0.6).round());
        assert_eq!(estimate_distance(0.6, true), (1.5f32 / 0.6 * 0.6).round());
        // Below every boundary the largest multiplier applies.
        assert_eq!(estimate_distance(0.05, false), (1.7f32 / 0.05 * 2.0).round());
    }

    #[test]
    fn test_degenerate_height() {
        assert!(estimate_distance(0.0, false).is_infinite());
        assert!(estimate_distance(-0.1, true).is_infinite());
        assert!(estimate_distance(f32::NAN, true).is_infinite());
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "1 m");
        assert_eq!(format_distance(12.0), "12 m");
        assert_eq!(format_distance(100.0), "100+ m");
        assert_eq!(format_distance(f32::INFINITY), "100+ m");
    }
}
