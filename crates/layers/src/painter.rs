use foundation::math::Vec2;

use crate::symbology::Hsl;

/// Path-based 2D drawing surface, shaped after the canvas 2D context.
pub trait Painter {
    /// Erase the whole surface and set its pixel size.
    fn clear(&mut self, width: f64, height: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, p: Vec2);
    fn line_to(&mut self, p: Vec2);
    fn close_path(&mut self);
    fn fill(&mut self, color: Hsl);
    fn stroke(&mut self, color: &str, width: f64);
}

/// One recorded painter call.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Clear { width: f64, height: f64 },
    BeginPath,
    MoveTo(Vec2),
    LineTo(Vec2),
    ClosePath,
    Fill(Hsl),
    Stroke { color: String, width: f64 },
}

/// Painter that only records what it was asked to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingPainter {
    pub ops: Vec<PaintOp>,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fills(&self) -> Vec<Hsl> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Fill(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn clears(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Clear { .. }))
            .count()
    }
}

impl Painter for RecordingPainter {
    fn clear(&mut self, width: f64, height: f64) {
        self.ops.push(PaintOp::Clear { width, height });
    }

    fn begin_path(&mut self) {
        self.ops.push(PaintOp::BeginPath);
    }

    fn move_to(&mut self, p: Vec2) {
        self.ops.push(PaintOp::MoveTo(p));
    }

    fn line_to(&mut self, p: Vec2) {
        self.ops.push(PaintOp::LineTo(p));
    }

    fn close_path(&mut self) {
        self.ops.push(PaintOp::ClosePath);
    }

    fn fill(&mut self, color: Hsl) {
        self.ops.push(PaintOp::Fill(color));
    }

    fn stroke(&mut self, color: &str, width: f64) {
        self.ops.push(PaintOp::Stroke {
            color: color.to_string(),
            width,
        });
    }
}
