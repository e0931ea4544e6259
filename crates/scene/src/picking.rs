use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{FitProjector, Vec2, point_in_ring};

use crate::region::{MapModel, Region};
use crate::value::PressureBand;

/// Tooltip offset from the pointer, in CSS pixels.
pub const TOOLTIP_OFFSET: Vec2 = Vec2 { x: 48.0, y: -38.0 };

/// Displayed position and size of the canvas element (CSS pixels).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Viewport (client) coordinates to canvas-internal pixels.
///
/// The canvas backing store may be larger or smaller than its displayed size
/// (high-DPI, CSS scaling), so each axis is scaled by internal / displayed.
/// A collapsed rect maps everything to its origin.
pub fn viewport_to_canvas(client: Vec2, rect: CanvasRect, pixel_width: f64, pixel_height: f64) -> Vec2 {
    let sx = if rect.width > 0.0 { pixel_width / rect.width } else { 0.0 };
    let sy = if rect.height > 0.0 { pixel_height / rect.height } else { 0.0 };
    Vec2::new((client.x - rect.left) * sx, (client.y - rect.top) * sy)
}

/// Region under a canvas point.
///
/// Candidates are tried smallest area first and the first ring containing the
/// point wins, so an enclave beats the region that surrounds it. Equal areas
/// keep load order.
pub fn pick_region<'a>(model: &'a MapModel, projector: &FitProjector, point: Vec2) -> Option<&'a Region> {
    let mut order: Vec<&Region> = model.regions().iter().collect();
    order.sort_by(|a, b| stable_total_cmp_f64(a.area, b.area));

    order.into_iter().find(|region| {
        region.polygons.iter().any(|ring| {
            let projected: Vec<Vec2> = ring.iter().map(|p| projector.project_point(*p)).collect();
            point_in_ring(point, &projected)
        })
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub name: String,
    pub value: u32,
    /// CSS class for the value band.
    pub band_label: &'static str,
    /// Viewport position of the tooltip's top-left corner.
    pub left: f64,
    pub top: f64,
}

impl Tooltip {
    pub fn for_region(region: &Region, client: Vec2, offset: Vec2) -> Self {
        Self {
            name: region.id.clone(),
            value: region.value,
            band_label: PressureBand::for_value(region.value).label(),
            left: client.x + offset.x,
            top: client.y + offset.y,
        }
    }

    pub fn text(&self) -> String {
        format!("수용 상태 : {}% 사용중", self.value)
    }

    /// Tooltip body markup. The region name comes from the boundary file and
    /// is escaped.
    pub fn html(&self) -> String {
        format!(
            "<strong>{}</strong><br><span class=\"{}\">{}</span>",
            escape_html(&self.name),
            self.band_label,
            self.text()
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
