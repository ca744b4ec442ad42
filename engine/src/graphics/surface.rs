//! Per-frame drawing surface
//!
//! A `Surface` records drawing primitives as a display list. The platform
//! consumes the list when the frame is presented, so states only ever see
//! an append-only target for the frame they are drawing.

use super::{Color, Font};
use crate::io::BitmapId;
use tracing::trace;

/// Clip rectangle in surface coordinates, inclusive on both corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// Parameters for copying a region of a cached bitmap onto the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blit {
    pub bitmap: BitmapId,
    pub dx: i32,
    pub dy: i32,
    pub sx: i32,
    pub sy: i32,
    pub w: i32,
    pub h: i32,
    /// Pixels of this color are skipped
    pub mask: Option<Color>,
}

/// A single recorded primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Clear,
    Pixel { x: i32, y: i32 },
    Line { x0: i32, y0: i32, x1: i32, y1: i32 },
    Rect { x0: i32, y0: i32, x1: i32, y1: i32 },
    FillRect { x0: i32, y0: i32, x1: i32, y1: i32 },
    Circle { x: i32, y: i32, r: i32 },
    FillCircle { x: i32, y: i32, r: i32 },
    Ellipse { x0: i32, y0: i32, x1: i32, y1: i32 },
    RoundRect { x0: i32, y0: i32, x1: i32, y1: i32, r: i32 },
    FillRoundRect { x0: i32, y0: i32, x1: i32, y1: i32, r: i32 },
    /// Quadratic bezier from `(x0, y0)` to `(x2, y2)` through control `(x1, y1)`
    Curve { x0: i32, y0: i32, x1: i32, y1: i32, x2: i32, y2: i32 },
    Text { x: i32, y: i32, text: String, font: Font },
    Blit(Blit),
}

/// A recorded primitive with the drawing state in effect when it was issued
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub shape: Shape,
    pub color: Color,
    pub clip: ClipRect,
}

/// Drawing target handed to a game state for one frame
#[derive(Debug, Clone)]
pub struct Surface {
    width: i32,
    height: i32,
    color: Color,
    font: Font,
    clips: Vec<ClipRect>,
    commands: Vec<DrawCommand>,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(320, 240)
    }
}

impl Surface {
    /// Create an empty surface of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            color: Color::WHITE,
            font: Font::Normal,
            clips: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Current drawing color
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Current font
    pub fn font(&self) -> Font {
        self.font
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    /// Active clip rectangle; the full surface when nothing is pushed
    pub fn clip(&self) -> ClipRect {
        self.clips.last().copied().unwrap_or(ClipRect {
            x0: 0,
            y0: 0,
            x1: self.width - 1,
            y1: self.height - 1,
        })
    }

    /// Push a clip rectangle, clamped to the surface bounds
    pub fn push_clip(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        let (x0, x1) = (x0.min(x1), x0.max(x1));
        let (y0, y1) = (y0.min(y1), y0.max(y1));
        let clamped = ClipRect {
            x0: x0.clamp(0, self.width - 1),
            y0: y0.clamp(0, self.height - 1),
            x1: x1.clamp(0, self.width - 1),
            y1: y1.clamp(0, self.height - 1),
        };
        if clamped.x0 != x0 || clamped.y0 != y0 || clamped.x1 != x1 || clamped.y1 != y1 {
            trace!(?clamped, "Clip rect clamped to surface");
        }
        self.clips.push(clamped);
    }

    /// Pop the most recent clip rectangle; no-op when none is pushed
    pub fn pop_clip(&mut self) {
        self.clips.pop();
    }

    /// Recorded commands for this frame
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Remove and return the recorded commands, keeping color/font/clip state
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Resize, discarding clip rectangles that may no longer fit
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width as i32;
        self.height = height as i32;
        self.clips.clear();
    }

    fn record(&mut self, shape: Shape) {
        let command = DrawCommand {
            shape,
            color: self.color,
            clip: self.clip(),
        };
        self.commands.push(command);
    }

    /// Fill the whole surface with `color`, discarding earlier commands
    pub fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand {
            shape: Shape::Clear,
            color,
            clip: ClipRect {
                x0: 0,
                y0: 0,
                x1: self.width - 1,
                y1: self.height - 1,
            },
        });
    }

    pub fn pixel(&mut self, x: i32, y: i32) {
        self.record(Shape::Pixel { x, y });
    }

    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.record(Shape::Line { x0, y0, x1, y1 });
    }

    pub fn rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.record(Shape::Rect { x0, y0, x1, y1 });
    }

    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.record(Shape::FillRect { x0, y0, x1, y1 });
    }

    pub fn circle(&mut self, x: i32, y: i32, r: i32) {
        self.record(Shape::Circle { x, y, r });
    }

    pub fn fill_circle(&mut self, x: i32, y: i32, r: i32) {
        self.record(Shape::FillCircle { x, y, r });
    }

    pub fn ellipse(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.record(Shape::Ellipse { x0, y0, x1, y1 });
    }

    pub fn round_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, r: i32) {
        self.record(Shape::RoundRect { x0, y0, x1, y1, r });
    }

    pub fn fill_round_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, r: i32) {
        self.record(Shape::FillRoundRect { x0, y0, x1, y1, r });
    }

    pub fn curve(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.record(Shape::Curve {
            x0,
            y0,
            x1,
            y1,
            x2,
            y2,
        });
    }

    /// Draw text with its top-left corner at `(x, y)` in the current font
    pub fn puts(&mut self, x: i32, y: i32, text: &str) {
        let font = self.font;
        self.record(Shape::Text {
            x,
            y,
            text: text.to_string(),
            font,
        });
    }

    pub fn blit(&mut self, blit: Blit) {
        self.record(Shape::Blit(blit));
    }

    /// Width in pixels of the longest line of `text` in the current font
    pub fn text_width(&self, text: &str) -> i32 {
        let (w, _) = self.font.cell();
        text.split('\n')
            .map(|line| line.chars().count() as i32)
            .max()
            .unwrap_or(0)
            * w
    }

    /// Height in pixels of `text` in the current font
    pub fn text_height(&self, text: &str) -> i32 {
        let (_, h) = self.font.cell();
        text.split('\n').count() as i32 * h
    }
}
