//! Visual settings, style resolution, classification and compositing.

mod assets;
mod classifier;
mod color;
mod compositor;
mod lock_timer;
mod settings;
mod style;
mod surface;

pub use assets::{AssetCache, AssetError, AssetState, LoadTicket};
pub use classifier::{
    ClassifyInput, PERSON_FAR_THRESHOLD_M, SELECTED_NEAR_THRESHOLD_M, VEHICLE_FAR_THRESHOLD_M,
    classify,
};
pub use color::Color;
pub use compositor::{Compositor, CompositorConfig, FrameReport};
pub use lock_timer::{ChargeState, LockTimers};
pub use settings::{Mode, VisualSettings, keys};
pub use style::{
    BoxAttr, BoxStyle, LabelAttr, LabelKind, LabelStyle, ObjectClass, Pursuit, StyleKey,
    StyleTable, VisualState, box_setting_key, global, label_setting_key,
};
pub use surface::{DisplayList, DrawCommand, Font, Surface, SurfaceError, SurfaceResult};
