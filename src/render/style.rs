//! Visual states and the (state, element) style lookup table.
//!
//! Every style attribute resolves in three steps: the state-specific key in the
//! [`VisualSettings`] map, then the built-in default for that state and
//! element, then a single global default for the attribute. Boxes are further
//! keyed by object class, so persons and vehicles in the same state can be
//! styled apart.

use serde::Serialize;

use crate::render::color::Color;
use crate::render::settings::VisualSettings;
use crate::tracker::Detection;

/// Style sub-state of a selected (priority) vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pursuit {
    /// Within close range
    Near,
    /// Beyond close range
    Far,
}

/// Per-object visual state, recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    Locked,
    Far,
    Unlocked,
    Background,
    Selected(Pursuit),
}

impl VisualState {
    pub fn style_key(&self) -> StyleKey {
        match self {
            VisualState::Locked => StyleKey::Locked,
            VisualState::Far => StyleKey::Far,
            VisualState::Unlocked => StyleKey::Unlocked,
            VisualState::Background => StyleKey::Background,
            VisualState::Selected(Pursuit::Near) => StyleKey::SelectedNear,
            VisualState::Selected(Pursuit::Far) => StyleKey::SelectedFar,
        }
    }
}

/// Object class a box style is looked up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Person,
    Vehicle,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 2] = [ObjectClass::Person, ObjectClass::Vehicle];

    pub fn of(detection: &Detection) -> Self {
        if detection.is_vehicle() {
            ObjectClass::Vehicle
        } else {
            ObjectClass::Person
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Row of the style table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKey {
    Locked,
    Far,
    Unlocked,
    Background,
    SelectedNear,
    SelectedFar,
}

impl StyleKey {
    pub const ALL: [StyleKey; 6] = [
        StyleKey::Locked,
        StyleKey::Far,
        StyleKey::Unlocked,
        StyleKey::Background,
        StyleKey::SelectedNear,
        StyleKey::SelectedFar,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Box key prefix. Grey boxes carry no `Box` infix; selected states only
    /// exist for vehicles.
    fn box_prefix(self, class: ObjectClass) -> &'static str {
        match (class, self) {
            (_, StyleKey::SelectedNear) => "vehicleSelectedBox",
            (_, StyleKey::SelectedFar) => "vehiclePursuitBox",
            (ObjectClass::Person, StyleKey::Locked) => "personLockedBox",
            (ObjectClass::Person, StyleKey::Far) => "personFarBox",
            (ObjectClass::Person, StyleKey::Unlocked) => "personUnlockedBox",
            (ObjectClass::Person, StyleKey::Background) => "personGrey",
            (ObjectClass::Vehicle, StyleKey::Locked) => "vehicleLockedBox",
            (ObjectClass::Vehicle, StyleKey::Far) => "vehicleFarBox",
            (ObjectClass::Vehicle, StyleKey::Unlocked) => "vehicleUnlockedBox",
            (ObjectClass::Vehicle, StyleKey::Background) => "vehicleGrey",
        }
    }

    /// State infix for label keys; unlocked labels use the bare element keys.
    fn label_token(self) -> &'static str {
        match self {
            StyleKey::Locked => "Locked",
            StyleKey::Far => "Far",
            StyleKey::Unlocked => "",
            StyleKey::Background => "Grey",
            StyleKey::SelectedNear => "Selected",
            StyleKey::SelectedFar => "Pursuit",
        }
    }
}

/// The three text labels drawn around a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Id,
    ObjectType,
    Distance,
}

impl LabelKind {
    pub const ALL: [LabelKind; 3] = [LabelKind::Id, LabelKind::ObjectType, LabelKind::Distance];

    fn index(self) -> usize {
        self as usize
    }

    fn key_prefix(self) -> &'static str {
        match self {
            LabelKind::Id => "personId",
            LabelKind::ObjectType => "objectType",
            LabelKind::Distance => "distance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxAttr {
    Color,
    StrokeWidth,
    BorderRadius,
    BackgroundColor,
    BackgroundOpacity,
}

impl BoxAttr {
    fn suffix(self) -> &'static str {
        match self {
            BoxAttr::Color => "Color",
            BoxAttr::StrokeWidth => "StrokeWidth",
            BoxAttr::BorderRadius => "BorderRadius",
            BoxAttr::BackgroundColor => "BackgroundColor",
            BoxAttr::BackgroundOpacity => "BackgroundOpacity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAttr {
    TextColor,
    TextSize,
    TextFamily,
    TextWeight,
    BackgroundColor,
    BackgroundOpacity,
    Padding,
}

impl LabelAttr {
    fn suffix(self) -> &'static str {
        match self {
            LabelAttr::TextColor => "TextColor",
            LabelAttr::TextSize => "TextSize",
            LabelAttr::TextFamily => "TextFamily",
            LabelAttr::TextWeight => "TextWeight",
            LabelAttr::BackgroundColor => "BackgroundColor",
            LabelAttr::BackgroundOpacity => "BackgroundOpacity",
            LabelAttr::Padding => "Padding",
        }
    }
}

/// Settings key for a box attribute, e.g. `personLockedBoxColor` or
/// `vehicleGreyStrokeWidth`.
pub fn box_setting_key(class: ObjectClass, key: StyleKey, attr: BoxAttr) -> String {
    format!("{}{}", key.box_prefix(class), attr.suffix())
}

/// Settings keys consulted for a box attribute, most specific first.
///
/// Vehicle boxes fall back to the person keys, which carry the full attribute
/// set.
fn box_setting_keys(class: ObjectClass, key: StyleKey, attr: BoxAttr) -> Vec<String> {
    let mut keys = vec![box_setting_key(class, key, attr)];
    if class == ObjectClass::Vehicle {
        let shared = box_setting_key(ObjectClass::Person, key, attr);
        if shared != keys[0] {
            keys.push(shared);
        }
    }
    keys
}

/// Settings key for a label attribute, e.g. `objectTypeFarTextSize`.
pub fn label_setting_key(key: StyleKey, kind: LabelKind, attr: LabelAttr) -> String {
    format!("{}{}{}", kind.key_prefix(), key.label_token(), attr.suffix())
}

/// Single global fallbacks, used when neither the settings map nor the
/// per-state defaults define an attribute.
pub mod global {
    use crate::render::color::Color;

    pub const STROKE_COLOR: Color = Color::WHITE;
    pub const STROKE_WIDTH: f32 = 2.0;
    pub const BORDER_RADIUS: f32 = 0.0;
    pub const BACKGROUND_OPACITY: f32 = 1.0;
    pub const TEXT_COLOR: Color = Color::WHITE;
    pub const TEXT_SIZE: f32 = 12.0;
    pub const TEXT_FAMILY: &str = "monospace";
    pub const TEXT_WEIGHT: u16 = 400;
    pub const PADDING: f32 = 2.0;
}

/// Resolved box appearance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStyle {
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub radius: f32,
    /// Interior fill, already multiplied by its opacity
    pub fill: Option<Color>,
}

/// Resolved text-label appearance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelStyle {
    pub color: Color,
    pub size: f32,
    pub family: String,
    pub weight: u16,
    /// Badge behind the text, already multiplied by its opacity
    pub background: Option<Color>,
    pub padding: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct BoxDefaults {
    stroke_color: Option<Color>,
    stroke_width: Option<f32>,
    radius: Option<f32>,
    fill: Option<Color>,
    fill_opacity: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default)]
struct LabelDefaults {
    color: Option<Color>,
    size: Option<f32>,
    family: Option<&'static str>,
    weight: Option<u16>,
    background: Option<Color>,
    background_opacity: Option<f32>,
    padding: Option<f32>,
}

const RED: Color = Color::rgb(255, 59, 48);
const AMBER: Color = Color::rgb(255, 204, 0);
const CYAN: Color = Color::rgb(0, 229, 255);
const GREY: Color = Color::rgb(128, 128, 128);
const LIGHT_GREY: Color = Color::rgb(158, 158, 158);
const ORANGE: Color = Color::rgb(255, 149, 0);

fn class_box_defaults(class: ObjectClass, key: StyleKey) -> BoxDefaults {
    match key {
        StyleKey::Far if class == ObjectClass::Vehicle => BoxDefaults {
            stroke_color: Some(ORANGE),
            ..Default::default()
        },
        StyleKey::Locked => BoxDefaults {
            stroke_color: Some(RED),
            stroke_width: Some(3.0),
            fill: Some(RED),
            fill_opacity: Some(0.15),
            ..Default::default()
        },
        StyleKey::Far => BoxDefaults {
            stroke_color: Some(AMBER),
            ..Default::default()
        },
        StyleKey::Unlocked => BoxDefaults {
            stroke_color: Some(CYAN),
            ..Default::default()
        },
        StyleKey::Background => BoxDefaults {
            stroke_color: Some(GREY),
            stroke_width: Some(1.0),
            ..Default::default()
        },
        StyleKey::SelectedNear => BoxDefaults {
            stroke_color: Some(RED),
            stroke_width: Some(4.0),
            radius: Some(4.0),
            fill: Some(RED),
            fill_opacity: Some(0.2),
        },
        StyleKey::SelectedFar => BoxDefaults {
            stroke_color: Some(ORANGE),
            stroke_width: Some(3.0),
            radius: Some(4.0),
            ..Default::default()
        },
    }
}

fn class_label_defaults(key: StyleKey, kind: LabelKind) -> LabelDefaults {
    let size = match kind {
        LabelKind::Id => 12.0,
        LabelKind::ObjectType => 11.0,
        LabelKind::Distance => 12.0,
    };
    let weight = (kind == LabelKind::Id).then_some(700);

    match key {
        StyleKey::Locked | StyleKey::SelectedNear => LabelDefaults {
            size: Some(size),
            weight,
            background: Some(RED),
            background_opacity: Some(0.85),
            ..Default::default()
        },
        StyleKey::Far => LabelDefaults {
            color: Some(Color::BLACK),
            size: Some(size),
            weight,
            background: Some(AMBER),
            background_opacity: Some(0.85),
            ..Default::default()
        },
        StyleKey::SelectedFar => LabelDefaults {
            color: Some(Color::BLACK),
            size: Some(size),
            weight,
            background: Some(ORANGE),
            background_opacity: Some(0.85),
            ..Default::default()
        },
        StyleKey::Unlocked => LabelDefaults {
            color: Some(CYAN),
            size: Some(size),
            weight,
            ..Default::default()
        },
        StyleKey::Background => LabelDefaults {
            color: Some(LIGHT_GREY),
            size: Some(size - 2.0),
            ..Default::default()
        },
    }
}

fn resolve_box(settings: &VisualSettings, class: ObjectClass, key: StyleKey) -> BoxStyle {
    let defaults = class_box_defaults(class, key);
    let number = |attr| {
        box_setting_keys(class, key, attr)
            .iter()
            .find_map(|k| settings.number(k))
    };
    let color = |attr| {
        box_setting_keys(class, key, attr)
            .iter()
            .find_map(|k| settings.color(k))
    };

    let opacity = number(BoxAttr::BackgroundOpacity)
        .or(defaults.fill_opacity)
        .unwrap_or(global::BACKGROUND_OPACITY);
    let fill = color(BoxAttr::BackgroundColor)
        .or(defaults.fill)
        .map(|c| c.with_opacity(opacity))
        .filter(|c| !c.is_transparent());

    BoxStyle {
        stroke_color: color(BoxAttr::Color)
            .or(defaults.stroke_color)
            .unwrap_or(global::STROKE_COLOR),
        stroke_width: number(BoxAttr::StrokeWidth)
            .or(defaults.stroke_width)
            .unwrap_or(global::STROKE_WIDTH)
            .max(0.0),
        radius: number(BoxAttr::BorderRadius)
            .or(defaults.radius)
            .unwrap_or(global::BORDER_RADIUS)
            .max(0.0),
        fill,
    }
}

fn resolve_label(settings: &VisualSettings, key: StyleKey, kind: LabelKind) -> LabelStyle {
    let defaults = class_label_defaults(key, kind);
    let setting = |attr| label_setting_key(key, kind, attr);

    let opacity = settings
        .number(&setting(LabelAttr::BackgroundOpacity))
        .or(defaults.background_opacity)
        .unwrap_or(global::BACKGROUND_OPACITY);
    let background = settings
        .color(&setting(LabelAttr::BackgroundColor))
        .or(defaults.background)
        .map(|c| c.with_opacity(opacity))
        .filter(|c| !c.is_transparent());

    LabelStyle {
        color: settings
            .color(&setting(LabelAttr::TextColor))
            .or(defaults.color)
            .unwrap_or(global::TEXT_COLOR),
        size: settings
            .number(&setting(LabelAttr::TextSize))
            .or(defaults.size)
            .unwrap_or(global::TEXT_SIZE)
            .max(1.0),
        family: settings
            .text(&setting(LabelAttr::TextFamily))
            .or(defaults.family)
            .unwrap_or(global::TEXT_FAMILY)
            .to_string(),
        weight: settings
            .weight(&setting(LabelAttr::TextWeight))
            .or(defaults.weight)
            .unwrap_or(global::TEXT_WEIGHT),
        background,
        padding: settings
            .number(&setting(LabelAttr::Padding))
            .or(defaults.padding)
            .unwrap_or(global::PADDING)
            .max(0.0),
    }
}

/// Fully resolved styles for every (class, state) box and (state, element)
/// label.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    boxes: [[BoxStyle; 6]; 2],
    labels: [[LabelStyle; 3]; 6],
}

impl StyleTable {
    /// Resolve every entry against `settings`.
    pub fn resolve(settings: &VisualSettings) -> Self {
        Self {
            boxes: std::array::from_fn(|c| {
                std::array::from_fn(|i| {
                    resolve_box(settings, ObjectClass::ALL[c], StyleKey::ALL[i])
                })
            }),
            labels: std::array::from_fn(|i| {
                std::array::from_fn(|j| resolve_label(settings, StyleKey::ALL[i], LabelKind::ALL[j]))
            }),
        }
    }

    pub fn box_style(&self, class: ObjectClass, key: StyleKey) -> &BoxStyle {
        &self.boxes[class.index()][key.index()]
    }

    pub fn label_style(&self, key: StyleKey, kind: LabelKind) -> &LabelStyle {
        &self.labels[key.index()][kind.index()]
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::resolve(&VisualSettings::default())
    }
}
