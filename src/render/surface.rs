//! Output surface abstraction and a recording implementation.
//!
//! All coordinates passed to a [`Surface`] are in surface pixels with a
//! top-left origin. Every draw call is fallible so that the compositor can
//! isolate a failure to the object being painted.

use std::fmt;

use nalgebra::Point2;
use serde::Serialize;
use thiserror::Error;

use crate::error::OverlayResult;
use crate::render::color::Color;
use crate::tracker::Rect;

pub type SurfaceResult<T> = Result<T, SurfaceError>;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Draw call rejected: {0}")]
    Rejected(String),

    #[error("Image not drawable: {0}")]
    Image(String),

    #[error("Surface backend error: {0}")]
    Backend(String),
}

/// Font request for a text draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font<'a> {
    pub family: &'a str,
    pub size: f32,
    pub weight: u16,
}

/// A 2D drawing target provided by the host.
pub trait Surface {
    /// Host handle for a decoded image.
    type Image;

    /// Width and height in pixels.
    fn size(&self) -> (f32, f32);

    fn clear(&mut self) -> SurfaceResult<()>;

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32, radius: f32)
    -> SurfaceResult<()>;

    fn fill_rect(&mut self, rect: Rect, color: Color, radius: f32) -> SurfaceResult<()>;

    /// Draw `text` with its top-left corner at `origin`.
    fn draw_text(
        &mut self,
        text: &str,
        origin: Point2<f32>,
        color: Color,
        font: Font<'_>,
    ) -> SurfaceResult<()>;

    /// Approximate advance width of `text`.
    fn measure_text(&self, text: &str, font: Font<'_>) -> f32 {
        text.chars().count() as f32 * font.size * 0.6
    }

    fn draw_circle(
        &mut self,
        center: Point2<f32>,
        radius: f32,
        color: Color,
        filled: bool,
    ) -> SurfaceResult<()>;

    fn draw_line(
        &mut self,
        from: Point2<f32>,
        to: Point2<f32>,
        color: Color,
        width: f32,
    ) -> SurfaceResult<()>;

    fn draw_image(&mut self, image: &Self::Image, rect: Rect) -> SurfaceResult<()>;
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f32,
        radius: f32,
    },
    FillRect {
        rect: Rect,
        color: Color,
        radius: f32,
    },
    Text {
        text: String,
        origin: [f32; 2],
        color: Color,
        family: String,
        size: f32,
        weight: u16,
    },
    Circle {
        center: [f32; 2],
        radius: f32,
        color: Color,
        filled: bool,
    },
    Line {
        from: [f32; 2],
        to: [f32; 2],
        color: Color,
        width: f32,
    },
    Image {
        source: String,
        rect: Rect,
    },
}

type FailurePredicate = Box<dyn Fn(&DrawCommand) -> bool + Send>;

/// Surface that records every draw call instead of rasterizing.
///
/// Images are identified by their source string. Hosts can serialize the
/// recorded commands and replay them on their own canvas; tests use the
/// failure hook to simulate a backend rejecting particular calls.
pub struct DisplayList {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
    fail_when: Option<FailurePredicate>,
}

impl DisplayList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            fail_when: None,
        }
    }

    /// Reject every draw call matching `predicate`.
    pub fn fail_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&DrawCommand) -> bool + Send + 'static,
    {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Text of every recorded text draw, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Recorded box outlines.
    pub fn stroked_rects(&self) -> impl Iterator<Item = (&Rect, &Color)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::StrokeRect { rect, color, .. } => Some((rect, color)),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Image { source, .. } => Some(source.as_str()),
            _ => None,
        })
    }

    pub fn to_json(&self) -> OverlayResult<String> {
        Ok(serde_json::to_string(&self.commands)?)
    }

    fn record(&mut self, command: DrawCommand) -> SurfaceResult<()> {
        if let Some(predicate) = &self.fail_when {
            if predicate(&command) {
                return Err(SurfaceError::Rejected(format!("{command:?}")));
            }
        }
        self.commands.push(command);
        Ok(())
    }
}

impl fmt::Debug for DisplayList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayList")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("commands", &self.commands.len())
            .field("fail_when", &self.fail_when.is_some())
            .finish()
    }
}

impl Surface for DisplayList {
    type Image = String;

    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn clear(&mut self) -> SurfaceResult<()> {
        self.commands.clear();
        self.record(DrawCommand::Clear)
    }

    fn stroke_rect(
        &mut self,
        rect: Rect,
        color: Color,
        width: f32,
        radius: f32,
    ) -> SurfaceResult<()> {
        self.record(DrawCommand::StrokeRect {
            rect,
            color,
            width,
            radius,
        })
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, radius: f32) -> SurfaceResult<()> {
        self.record(DrawCommand::FillRect {
            rect,
            color,
            radius,
        })
    }

    fn draw_text(
        &mut self,
        text: &str,
        origin: Point2<f32>,
        color: Color,
        font: Font<'_>,
    ) -> SurfaceResult<()> {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            origin: [origin.x, origin.y],
            color,
            family: font.family.to_string(),
            size: font.size,
            weight: font.weight,
        })
    }

    fn draw_circle(
        &mut self,
        center: Point2<f32>,
        radius: f32,
        color: Color,
        filled: bool,
    ) -> SurfaceResult<()> {
        self.record(DrawCommand::Circle {
            center: [center.x, center.y],
            radius,
            color,
            filled,
        })
    }

    fn draw_line(
        &mut self,
        from: Point2<f32>,
        to: Point2<f32>,
        color: Color,
        width: f32,
    ) -> SurfaceResult<()> {
        self.record(DrawCommand::Line {
            from: [from.x, from.y],
            to: [to.x, to.y],
            color,
            width,
        })
    }

    fn draw_image(&mut self, image: &String, rect: Rect) -> SurfaceResult<()> {
        self.record(DrawCommand::Image {
            source: image.clone(),
            rect,
        })
    }
}
