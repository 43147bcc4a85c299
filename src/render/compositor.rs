//! Per-tick overlay compositing.
//!
//! The compositor owns everything needed to paint one job: the track store,
//! video metadata, mode, visual settings with their resolved style table, the
//! priority selector, lock timers and asset cache. Each tick resolves the
//! detections for the playback time, updates the selector, classifies every
//! detection and paints it. A tick never fails; draw errors are logged and
//! counted per object.

use std::time::Duration;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::integration::{ResultPayload, VideoMeta};
use crate::render::assets::AssetCache;
use crate::render::classifier::{ClassifyInput, classify};
use crate::render::color::Color;
use crate::render::lock_timer::{ChargeState, LockTimers};
use crate::render::settings::{Mode, VisualSettings, keys};
use crate::render::style::{self, LabelKind, LabelStyle, ObjectClass, StyleTable, VisualState};
use crate::render::surface::{Font, Surface, SurfaceResult};
use crate::tracker::{
    DEFAULT_LOOKBACK, Detection, PrioritySelector, PriorityTarget, Rect, SelectorConfig,
    SelectorPhase, TrackStore, estimate_distance, format_distance, screen_center,
};

const CROSSHAIR_ACTIVE_COLOR: Color = Color::rgb(255, 59, 48);
const MARKER_CHARGING_COLOR: Color = Color::rgb(255, 204, 0);
const MARKER_READY_COLOR: Color = Color::rgb(255, 59, 48);
const PANEL_BACKGROUND: Color = Color::rgba(0, 0, 0, 0.6);
const PANEL_TEXT_SIZE: f32 = 12.0;

/// Configuration for the Compositor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Frames searched backwards when the exact frame has no detections
    pub lookback: u32,
    /// Idle crosshair size in pixels
    pub crosshair_size: f32,
    /// Crosshair size while something is under it
    pub crosshair_active_size: f32,
    pub crosshair_stroke_width: f32,
    /// Tracking marker radius in pixels
    pub marker_radius: f32,
    /// Time a person must stay under the crosshair before the marker is ready
    pub charge_ms: u64,
    /// Idle time after which a lock timer is forgotten
    pub lock_purge_ms: u64,
    /// Gap between a box and its labels, in pixels
    pub label_gap: f32,
    /// Status panel offset from the top-left corner, in pixels
    pub panel_margin: f32,
    pub selector: SelectorConfig,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            crosshair_size: 24.0,
            crosshair_active_size: 32.0,
            crosshair_stroke_width: 2.0,
            marker_radius: 6.0,
            charge_ms: 5000,
            lock_purge_ms: 10_000,
            label_gap: 2.0,
            panel_margin: 12.0,
            selector: SelectorConfig::default(),
        }
    }
}

/// Summary of one painted frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    /// Frame index derived from the playback time
    pub frame_index: u32,
    /// Frame whose detections were drawn, if any
    pub source_frame: Option<u32>,
    /// Whether `source_frame == frame_index`
    pub exact: bool,
    pub detections: usize,
    /// Objects painted without error
    pub painted: usize,
    /// Objects and overlays whose painting failed
    pub failed: usize,
    pub priority_id: Option<String>,
    pub phase: SelectorPhase,
    /// Visual state per detection id, in paint order
    pub states: Vec<(String, VisualState)>,
    /// Person carrying the tracking marker
    pub marker_id: Option<String>,
}

impl FrameReport {
    pub fn state_of(&self, id: &str) -> Option<VisualState> {
        self.states
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, state)| *state)
    }
}

#[derive(Debug, Clone, Copy)]
struct LabelToggles {
    id: bool,
    object_type: bool,
    distance: bool,
}

impl LabelToggles {
    fn from_settings(settings: &VisualSettings) -> Self {
        Self {
            id: settings.flag_or(keys::SHOW_ID, true),
            object_type: settings.flag_or(keys::SHOW_OBJECT_TYPE, true),
            distance: settings.flag_or(keys::SHOW_DISTANCE, true),
        }
    }
}

/// Paints the overlay for one job onto a host surface.
pub struct Compositor<S: Surface> {
    config: CompositorConfig,
    store: TrackStore,
    meta: VideoMeta,
    mode: Mode,
    settings: VisualSettings,
    styles: StyleTable,
    styles_revision: Option<u64>,
    selector: PrioritySelector,
    lock_timers: LockTimers,
    assets: AssetCache<S::Image>,
}

impl<S: Surface> Compositor<S> {
    pub fn new(payload: ResultPayload, mode: Mode) -> Self {
        Self::with_config(payload, mode, CompositorConfig::default())
    }

    pub fn with_config(payload: ResultPayload, mode: Mode, config: CompositorConfig) -> Self {
        let lock_timers = LockTimers::new(
            Duration::from_millis(config.charge_ms),
            Duration::from_millis(config.lock_purge_ms),
        );
        let selector = PrioritySelector::new(config.selector.clone());
        info!(%mode, tracks = payload.tracks.len(), "Creating compositor");

        Self {
            store: TrackStore::new(payload.tracks),
            meta: payload.meta,
            mode,
            settings: VisualSettings::default(),
            styles: StyleTable::default(),
            styles_revision: None,
            selector,
            lock_timers,
            assets: AssetCache::new(),
            config,
        }
    }

    /// Replace the job data and start a fresh session.
    pub fn load_job(&mut self, payload: ResultPayload) {
        info!(
            tracks = payload.tracks.len(),
            frames = payload.meta.frames,
            "Loading job"
        );
        self.store = TrackStore::new(payload.tracks);
        self.meta = payload.meta;
        self.reset_session();
    }

    /// Switch mode. Session state does not carry across modes.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            debug!(from = %self.mode, to = %mode, "Mode changed");
            self.mode = mode;
            self.reset_session();
        }
    }

    /// Discard selector and lock-timer state.
    pub fn reset_session(&mut self) {
        self.selector.reset();
        self.lock_timers.clear();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    pub fn selector(&self) -> &PrioritySelector {
        &self.selector
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn settings(&self) -> &VisualSettings {
        &self.settings
    }

    /// Mutable settings. Changes are picked up on the next tick.
    ///
    /// Use [`Compositor::set_settings`] to replace the map wholesale.
    pub fn settings_mut(&mut self) -> &mut VisualSettings {
        &mut self.settings
    }

    pub fn set_settings(&mut self, settings: VisualSettings) {
        self.settings = settings;
        self.styles_revision = None;
    }

    pub fn assets(&self) -> &AssetCache<S::Image> {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetCache<S::Image> {
        &mut self.assets
    }

    fn refresh_styles(&mut self) {
        let revision = self.settings.revision();
        if self.styles_revision != Some(revision) {
            debug!(revision, "Resolving style table");
            self.styles = StyleTable::resolve(&self.settings);
            self.styles_revision = Some(revision);
        }
    }

    /// Paint the overlay for playback time `current_time_s` at clock `now`.
    pub fn tick(&mut self, surface: &mut S, current_time_s: f64, now: Duration) -> FrameReport {
        self.refresh_styles();

        let mode = self.mode;
        let frame_index = self.meta.frame_index(current_time_s);
        let resolved = self
            .store
            .resolve_with_lookback(frame_index, self.config.lookback);
        let detections = resolved.detections;

        let target = if mode.uses_sticky_priority() {
            let selector_config = self.selector.config();
            let candidates: Vec<Detection> = detections
                .iter()
                .filter(|d| d.is_vehicle() && selector_config.in_bounds(d))
                .cloned()
                .collect();
            self.selector.update(&candidates, now)
        } else {
            None
        };

        let marker = marker_person(detections, mode);
        let charge = self
            .lock_timers
            .update(marker.map(|d| d.id.as_str()), now);

        let mut report = FrameReport {
            frame_index,
            source_frame: resolved.frame,
            exact: resolved.exact,
            detections: detections.len(),
            ..Default::default()
        };

        if let Err(err) = surface.clear() {
            warn!(error = %err, "Failed to clear surface");
            report.failed += 1;
        }

        let center = screen_center();
        let toggles = LabelToggles::from_settings(&self.settings);
        for detection in detections {
            let is_vehicle = detection.is_vehicle();
            let distance_m = estimate_distance(detection.h, is_vehicle);
            let state = classify(&ClassifyInput {
                detection,
                distance_m,
                mode,
                under_crosshair: detection.rect().contains(center),
                is_priority: target
                    .as_ref()
                    .is_some_and(|t| t.detection.id == detection.id),
            });
            report.states.push((detection.id.clone(), state));

            match paint_object(
                surface,
                &self.styles,
                &self.config,
                toggles,
                detection,
                state,
                distance_m,
            ) {
                Ok(()) => report.painted += 1,
                Err(err) => {
                    warn!(id = %detection.id, error = %err, "Failed to paint object, skipping");
                    report.failed += 1;
                }
            }
        }

        if let (Some(person), Some(charge)) = (marker, charge) {
            if self.settings.flag_or(keys::SHOW_TRACKING_DOT, true) {
                if let Err(err) = paint_marker(
                    surface,
                    &mut self.assets,
                    &self.settings,
                    &self.config,
                    person,
                    charge,
                ) {
                    warn!(id = %person.id, error = %err, "Failed to paint tracking marker");
                    report.failed += 1;
                }
            }
        }
        report.marker_id = marker.map(|d| d.id.clone());

        let show_crosshair = self
            .settings
            .flag_any(&[keys::SHOW_CROSSHAIR, keys::ENABLE_CROSSHAIR], true);
        if mode.shows_crosshair() && show_crosshair {
            let active = detections
                .iter()
                .any(|d| mode.is_priority_class(d.is_vehicle()) && d.rect().contains(center));
            if let Err(err) = paint_crosshair(
                surface,
                &mut self.assets,
                &self.settings,
                &self.config,
                active,
            ) {
                warn!(error = %err, "Failed to paint crosshair");
                report.failed += 1;
            }
        }

        let phase = self.selector.phase(now);
        if self
            .settings
            .flag_any(&[keys::SHOW_STATUS_PANEL, keys::SHOW_STATUS_SQUARE], false)
        {
            let lines = status_lines(mode, &report, detections, target.as_ref(), phase);
            if let Err(err) = paint_status_panel(surface, &self.settings, &self.config, &lines) {
                warn!(error = %err, "Failed to paint status panel");
                report.failed += 1;
            }
        }

        report.priority_id = target.map(|t| t.detection.id);
        report.phase = phase;
        report
    }
}

/// The single person under the crosshair that carries the tracking marker.
///
/// Closest center wins; equal distances go to the smaller id.
fn marker_person(detections: &[Detection], mode: Mode) -> Option<&Detection> {
    if !mode.is_priority_class(false) {
        return None;
    }
    let center = screen_center();
    detections
        .iter()
        .filter(|d| !d.is_vehicle() && d.rect().contains(center))
        .min_by(|a, b| {
            a.rect()
                .distance_from_screen_center()
                .total_cmp(&b.rect().distance_from_screen_center())
                .then_with(|| a.id.cmp(&b.id))
        })
}

fn paint_object<S: Surface>(
    surface: &mut S,
    styles: &StyleTable,
    config: &CompositorConfig,
    toggles: LabelToggles,
    detection: &Detection,
    state: VisualState,
    distance_m: f32,
) -> SurfaceResult<()> {
    let (width, height) = surface.size();
    let key = state.style_key();
    let rect = detection.rect().to_pixels(width, height);

    let box_style = styles.box_style(ObjectClass::of(detection), key);
    if let Some(fill) = box_style.fill {
        surface.fill_rect(rect, fill, box_style.radius)?;
    }
    surface.stroke_rect(
        rect,
        box_style.stroke_color,
        box_style.stroke_width,
        box_style.radius,
    )?;

    // id nearest the box, class name stacked above it, distance below the box
    let above = [
        (LabelKind::Id, toggles.id.then(|| format!("ID {}", detection.id))),
        (
            LabelKind::ObjectType,
            toggles
                .object_type
                .then(|| detection.object_type().to_uppercase()),
        ),
    ];
    let mut bottom = rect.y - config.label_gap;
    for (kind, text) in above {
        let Some(text) = text else { continue };
        let label_height = paint_label(
            surface,
            styles.label_style(key, kind),
            &text,
            Point2::new(rect.x, bottom),
            true,
        )?;
        bottom -= label_height + config.label_gap;
    }

    if toggles.distance {
        paint_label(
            surface,
            styles.label_style(key, LabelKind::Distance),
            &format_distance(distance_m),
            Point2::new(rect.x, rect.y + rect.height + config.label_gap),
            false,
        )?;
    }
    Ok(())
}

/// Draw one text badge and return its height. With `above` set, `anchor` is
/// the badge's bottom-left corner, otherwise its top-left.
fn paint_label<S: Surface>(
    surface: &mut S,
    style: &LabelStyle,
    text: &str,
    anchor: Point2<f32>,
    above: bool,
) -> SurfaceResult<f32> {
    let font = Font {
        family: &style.family,
        size: style.size,
        weight: style.weight,
    };
    let height = style.size + style.padding * 2.0;
    let top = if above { anchor.y - height } else { anchor.y };

    if let Some(background) = style.background {
        let width = surface.measure_text(text, font) + style.padding * 2.0;
        surface.fill_rect(Rect::new(anchor.x, top, width, height), background, 2.0)?;
    }
    surface.draw_text(
        text,
        Point2::new(anchor.x + style.padding, top + style.padding),
        style.color,
        font,
    )?;
    Ok(height)
}

fn paint_marker<S: Surface>(
    surface: &mut S,
    assets: &mut AssetCache<S::Image>,
    settings: &VisualSettings,
    config: &CompositorConfig,
    person: &Detection,
    charge: ChargeState,
) -> SurfaceResult<()> {
    let (width, height) = surface.size();
    let center = person.rect().to_pixels(width, height).center();
    let radius = settings
        .number(keys::TRACKING_DOT_SIZE)
        .map(|size| size / 2.0)
        .unwrap_or(config.marker_radius);

    let (image_key, color_key, default_color) = if charge.is_ready() {
        (
            keys::TRACKING_DOT_READY_IMAGE,
            keys::TRACKING_DOT_READY_COLOR,
            MARKER_READY_COLOR,
        )
    } else {
        (
            keys::TRACKING_DOT_CHARGING_IMAGE,
            keys::TRACKING_DOT_CHARGING_COLOR,
            MARKER_CHARGING_COLOR,
        )
    };

    if let Some(image) = settings.text(image_key).and_then(|src| assets.request(src)) {
        let bounds = Rect::from_center(center.x, center.y, radius * 2.0, radius * 2.0);
        return surface.draw_image(image, bounds);
    }

    let color = settings.color(color_key).unwrap_or(default_color);
    match charge {
        ChargeState::Ready => surface.draw_circle(center, radius, color, true),
        ChargeState::Charging { progress } => {
            surface.draw_circle(center, radius, color, false)?;
            let inner = radius * progress.clamp(0.0, 1.0);
            if inner > 0.0 {
                surface.draw_circle(center, inner, color, true)?;
            }
            Ok(())
        }
    }
}

fn paint_crosshair<S: Surface>(
    surface: &mut S,
    assets: &mut AssetCache<S::Image>,
    settings: &VisualSettings,
    config: &CompositorConfig,
    active: bool,
) -> SurfaceResult<()> {
    let (width, height) = surface.size();
    let center = Point2::new(width / 2.0, height / 2.0);

    let (size, color, image_key) = if active {
        (
            settings
                .number(keys::CROSSHAIR_ACTIVE_SIZE)
                .unwrap_or(config.crosshair_active_size),
            settings
                .color(keys::CROSSHAIR_ACTIVE_COLOR)
                .unwrap_or(CROSSHAIR_ACTIVE_COLOR),
            keys::CROSSHAIR_ACTIVE_IMAGE,
        )
    } else {
        (
            settings
                .number(keys::CROSSHAIR_SIZE)
                .unwrap_or(config.crosshair_size),
            settings
                .color(keys::CROSSHAIR_COLOR)
                .unwrap_or(Color::WHITE),
            keys::CROSSHAIR_IMAGE,
        )
    };

    // the idle image stands in when no active image is configured
    let source = settings
        .text(image_key)
        .or_else(|| settings.text(keys::CROSSHAIR_IMAGE));
    if let Some(image) = source.and_then(|src| assets.request(src)) {
        return surface.draw_image(image, Rect::from_center(center.x, center.y, size, size));
    }

    let stroke = settings
        .number(keys::CROSSHAIR_STROKE_WIDTH)
        .unwrap_or(config.crosshair_stroke_width);
    let half = size / 2.0;
    let gap = size / 6.0;
    for (dx, dy) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
        let from = Point2::new(center.x + dx * gap, center.y + dy * gap);
        let to = Point2::new(center.x + dx * half, center.y + dy * half);
        surface.draw_line(from, to, color, stroke)?;
    }
    if active {
        surface.draw_circle(center, half, color, false)?;
    }
    Ok(())
}

fn status_lines(
    mode: Mode,
    report: &FrameReport,
    detections: &[Detection],
    target: Option<&PriorityTarget>,
    phase: SelectorPhase,
) -> Vec<String> {
    let vehicles = detections.iter().filter(|d| d.is_vehicle()).count();
    let frame = match report.source_frame {
        Some(source) if !report.exact => format!("FRAME: {} (from {})", report.frame_index, source),
        _ => format!("FRAME: {}", report.frame_index),
    };
    let target = match target {
        Some(t) => format!(
            "TARGET: {} @ {}",
            t.detection.id,
            format_distance(t.distance_m)
        ),
        None => "TARGET: NONE".to_string(),
    };

    vec![
        format!("MODE: {}", mode.as_str().to_uppercase()),
        frame,
        format!(
            "OBJECTS: {} ({} vehicles, {} persons)",
            detections.len(),
            vehicles,
            detections.len() - vehicles
        ),
        target,
        format!("STATE: {}", phase.label()),
    ]
}

fn paint_status_panel<S: Surface>(
    surface: &mut S,
    settings: &VisualSettings,
    config: &CompositorConfig,
    lines: &[String],
) -> SurfaceResult<()> {
    let size = settings
        .number(keys::STATUS_PANEL_TEXT_SIZE)
        .unwrap_or(PANEL_TEXT_SIZE);
    let color = settings
        .color(keys::STATUS_PANEL_COLOR)
        .unwrap_or(Color::WHITE);
    let background = settings
        .color(keys::STATUS_PANEL_BACKGROUND_COLOR)
        .unwrap_or(PANEL_BACKGROUND);
    let font = Font {
        family: style::global::TEXT_FAMILY,
        size,
        weight: style::global::TEXT_WEIGHT,
    };

    let padding = size / 2.0;
    let line_height = size * 1.4;
    let text_width = lines
        .iter()
        .map(|line| surface.measure_text(line, font))
        .fold(0.0, f32::max);
    let origin = config.panel_margin;

    surface.fill_rect(
        Rect::new(
            origin,
            origin,
            text_width + padding * 2.0,
            line_height * lines.len() as f32 + padding * 2.0,
        ),
        background,
        4.0,
    )?;
    for (i, line) in lines.iter().enumerate() {
        let position = Point2::new(origin + padding, origin + padding + line_height * i as f32);
        surface.draw_text(line, position, color, font)?;
    }
    Ok(())
}
