use super::Vec2;
use crate::bounds::Aabb2;

/// Fraction of the canvas the fitted extent may occupy.
pub const FIT_MARGIN: f64 = 0.9;

/// Fits a planar (lon, lat) extent into a canvas of `width` x `height` pixels.
///
/// One uniform scale is used for both axes, so the extent keeps its aspect
/// ratio and is centered (letterboxed) in the remaining space. Canvas Y grows
/// downward, geographic Y grows upward, so Y is flipped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FitProjector {
    pub extent: Aabb2,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub offset: Vec2,
}

impl FitProjector {
    /// Returns `None` when the extent is empty (nothing has been loaded).
    pub fn new(extent: Aabb2, width: f64, height: f64) -> Option<Self> {
        if !extent.is_valid() {
            return None;
        }
        let ew = extent.width();
        let eh = extent.height();
        // A zero-sized axis does not constrain the scale.
        let sx = if ew > 0.0 { width / ew } else { f64::INFINITY };
        let sy = if eh > 0.0 { height / eh } else { f64::INFINITY };
        let fit = sx.min(sy);
        let scale = if fit.is_finite() { fit * FIT_MARGIN } else { 1.0 };
        let offset = Vec2::new((width - ew * scale) / 2.0, (height - eh * scale) / 2.0);
        Some(Self {
            extent,
            width,
            height,
            scale,
            offset,
        })
    }

    /// Geographic (lng, lat) to canvas pixels.
    pub fn project(&self, lng: f64, lat: f64) -> Vec2 {
        let x = (lng - self.extent.min[0]) * self.scale + self.offset.x;
        let y = self.height - ((lat - self.extent.min[1]) * self.scale + self.offset.y);
        Vec2::new(x, y)
    }

    pub fn project_point(&self, p: Vec2) -> Vec2 {
        self.project(p.x, p.y)
    }
}
