use std::fmt::Write as _;

use foundation::math::Vec2;

use crate::painter::Painter;
use crate::symbology::Hsl;

/// Painter that serializes a frame as a standalone SVG document.
///
/// Each filled or stroked path becomes one `<path>` element, in paint order.
#[derive(Debug, Clone, Default)]
pub struct SvgPainter {
    width: f64,
    height: f64,
    path: String,
    body: String,
}

impl SvgPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element_count(&self) -> usize {
        self.body.matches("<path").count()
    }

    pub fn finish(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }

    fn emit(&mut self, attrs: &str) {
        if self.path.is_empty() {
            return;
        }
        let _ = writeln!(self.body, "<path d=\"{}\" {attrs}/>", self.path.trim_end());
    }
}

impl Painter for SvgPainter {
    fn clear(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.path.clear();
        self.body.clear();
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: Vec2) {
        let _ = write!(self.path, "M{:.2} {:.2} ", p.x, p.y);
    }

    fn line_to(&mut self, p: Vec2) {
        let _ = write!(self.path, "L{:.2} {:.2} ", p.x, p.y);
    }

    fn close_path(&mut self) {
        self.path.push_str("Z ");
    }

    fn fill(&mut self, color: Hsl) {
        self.emit(&format!("fill=\"{}\" stroke=\"none\"", color.to_hex()));
    }

    fn stroke(&mut self, color: &str, width: f64) {
        self.emit(&format!("fill=\"none\" stroke=\"{color}\" stroke-width=\"{width}\""));
    }
}
