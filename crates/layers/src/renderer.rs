use foundation::math::{FitProjector, Vec2};
use scene::{MapModel, Region};

use crate::painter::Painter;
use crate::symbology::{OUTLINE_COLOR, OUTLINE_WIDTH, value_color};

/// Heights at or below this are drawn flat.
pub const EXTRUDE_THRESHOLD: f64 = 0.1;

/// Two-pass low-poly map renderer.
///
/// Pass one fills and outlines every ring. Pass two lifts each region whose
/// height is above [`EXTRUDE_THRESHOLD`]: one darker copy per whole pixel of
/// height from the top down, then a lighter top face at the full height.
#[derive(Debug, Default, Copy, Clone)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Paint one frame. Returns `false` (and paints nothing) while the model has
    /// no extent, i.e. before a load has completed.
    pub fn render<P: Painter + ?Sized>(&self, painter: &mut P, model: &MapModel, width: f64, height: f64) -> bool {
        let Some(projector) = model.extent().and_then(|e| FitProjector::new(e, width, height)) else {
            return false;
        };
        painter.clear(width, height);

        for region in model.regions() {
            let color = value_color(region.value);
            for ring in &region.polygons {
                trace_ring(painter, &projector, ring, 0.0);
                painter.fill(color);
                painter.stroke(OUTLINE_COLOR, OUTLINE_WIDTH);
            }
        }

        for region in model.regions() {
            if region.current_height > EXTRUDE_THRESHOLD {
                extrude(painter, &projector, region);
            }
        }
        true
    }
}

fn extrude<P: Painter + ?Sized>(painter: &mut P, projector: &FitProjector, region: &Region) {
    let color = value_color(region.value);
    let side = color.side();
    let steps = region.current_height.floor() as u32;
    for ring in &region.polygons {
        for i in (1..=steps).rev() {
            trace_ring(painter, projector, ring, f64::from(i));
            painter.fill(side);
        }
    }
    let top = color.top();
    for ring in &region.polygons {
        trace_ring(painter, projector, ring, region.current_height);
        painter.fill(top);
    }
}

fn trace_ring<P: Painter + ?Sized>(painter: &mut P, projector: &FitProjector, ring: &[Vec2], lift: f64) {
    painter.begin_path();
    for (i, p) in ring.iter().enumerate() {
        let q = projector.project_point(*p);
        let q = Vec2::new(q.x, q.y - lift);
        if i == 0 {
            painter.move_to(q);
        } else {
            painter.line_to(q);
        }
    }
    painter.close_path();
}
