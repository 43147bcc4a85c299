//! Operating mode and the flat visual settings map.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{OverlayError, OverlayResult};
use crate::render::color::Color;

/// Which object class the overlay treats as primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// People are primary targets; vehicles are background
    Taser,
    /// Vehicles are primary and hold sticky priority; people are background
    Hawkeye,
    /// Every object is primary
    #[default]
    All,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Taser => "taser",
            Mode::Hawkeye => "hawkeye",
            Mode::All => "all",
        }
    }

    /// Whether objects of this class are primary targets in this mode.
    pub fn is_priority_class(&self, is_vehicle: bool) -> bool {
        match self {
            Mode::Taser => !is_vehicle,
            Mode::Hawkeye => is_vehicle,
            Mode::All => true,
        }
    }

    /// Whether the sticky priority selector runs in this mode.
    pub fn uses_sticky_priority(&self) -> bool {
        matches!(self, Mode::Hawkeye)
    }

    /// Whether the crosshair is drawn in this mode.
    pub fn shows_crosshair(&self) -> bool {
        !matches!(self, Mode::All)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taser" => Ok(Mode::Taser),
            "hawkeye" => Ok(Mode::Hawkeye),
            "all" => Ok(Mode::All),
            _ => Err(OverlayError::InvalidMode(s.to_string())),
        }
    }
}

/// Toggle and asset keys recognized besides the per-state style keys.
pub mod keys {
    pub const SHOW_CROSSHAIR: &str = "showCrosshair";
    pub const SHOW_STATUS_PANEL: &str = "showStatusPanel";
    /// Older name of [`SHOW_CROSSHAIR`], still written by design exports
    pub const ENABLE_CROSSHAIR: &str = "enableCrosshair";
    /// Older name of [`SHOW_STATUS_PANEL`]
    pub const SHOW_STATUS_SQUARE: &str = "showStatusSquare";
    pub const SHOW_ID: &str = "showId";
    pub const SHOW_OBJECT_TYPE: &str = "showObjectType";
    pub const SHOW_DISTANCE: &str = "showDistance";
    pub const SHOW_TRACKING_DOT: &str = "showTrackingDot";

    pub const CROSSHAIR_COLOR: &str = "crosshairColor";
    pub const CROSSHAIR_ACTIVE_COLOR: &str = "crosshairActiveColor";
    pub const CROSSHAIR_SIZE: &str = "crosshairSize";
    pub const CROSSHAIR_ACTIVE_SIZE: &str = "crosshairActiveSize";
    pub const CROSSHAIR_STROKE_WIDTH: &str = "crosshairStrokeWidth";
    pub const CROSSHAIR_IMAGE: &str = "crosshairImage";
    pub const CROSSHAIR_ACTIVE_IMAGE: &str = "crosshairActiveImage";

    pub const TRACKING_DOT_CHARGING_COLOR: &str = "trackingDotChargingColor";
    pub const TRACKING_DOT_READY_COLOR: &str = "trackingDotReadyColor";
    pub const TRACKING_DOT_SIZE: &str = "trackingDotSize";
    pub const TRACKING_DOT_CHARGING_IMAGE: &str = "trackingDotChargingImage";
    pub const TRACKING_DOT_READY_IMAGE: &str = "trackingDotReadyImage";

    pub const STATUS_PANEL_COLOR: &str = "statusPanelColor";
    pub const STATUS_PANEL_BACKGROUND_COLOR: &str = "statusPanelBackgroundColor";
    pub const STATUS_PANEL_TEXT_SIZE: &str = "statusPanelTextSize";
}

/// Flat, externally mutable map of visual options.
///
/// Values are kept as raw JSON so that unknown keys survive a round trip.
/// Every mutation bumps a revision counter so that derived style tables can be
/// rebuilt only after a change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualSettings {
    values: HashMap<String, Value>,
    #[serde(skip)]
    revision: u64,
}

impl VisualSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a settings object from JSON text.
    pub fn from_json_str(json: &str) -> OverlayResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Monotonic counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
        self.revision += 1;
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Apply every entry of `other` on top of these settings.
    pub fn merge(&mut self, other: VisualSettings) {
        self.values.extend(other.values);
        self.revision += 1;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String value; empty strings count as missing.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric value from a JSON number or a string such as `"12"` or `"12px"`.
    pub fn number(&self, key: &str) -> Option<f32> {
        let parsed = match self.values.get(key)? {
            Value::Number(n) => n.as_f64().map(|v| v as f32),
            Value::String(s) => s.trim().trim_end_matches("px").trim().parse::<f32>().ok(),
            _ => None,
        };
        match parsed {
            Some(v) if v.is_finite() => Some(v),
            _ => {
                warn!(key, "Ignoring non-numeric visual setting");
                None
            }
        }
    }

    /// Boolean value; accepts JSON booleans and `"true"`/`"false"`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Flag with a fallback when unset.
    pub fn flag_or(&self, key: &str, default: bool) -> bool {
        self.flag(key).unwrap_or(default)
    }

    /// First flag set among `names`, in order, with a fallback when none is.
    pub fn flag_any(&self, names: &[&str], default: bool) -> bool {
        names
            .iter()
            .find_map(|key| self.flag(key))
            .unwrap_or(default)
    }

    /// Color value. Unparseable colors are logged and treated as missing.
    pub fn color(&self, key: &str) -> Option<Color> {
        let raw = self.text(key)?;
        match raw.parse::<Color>() {
            Ok(color) => Some(color),
            Err(err) => {
                warn!(key, error = %err, "Ignoring invalid color setting");
                None
            }
        }
    }

    /// Font weight from `normal`, `bold` or a number in `100..=900`.
    pub fn weight(&self, key: &str) -> Option<u16> {
        match self.values.get(key)? {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u16::try_from(v).ok())
                .and_then(valid_weight),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "normal" => Some(400),
                "bold" => Some(700),
                other => other.parse::<u16>().ok().and_then(valid_weight),
            },
            _ => None,
        }
    }
}

fn valid_weight(weight: u16) -> Option<u16> {
    (100..=900).contains(&weight).then_some(weight)
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for VisualSettings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values,
            revision: 0,
        }
    }
}
