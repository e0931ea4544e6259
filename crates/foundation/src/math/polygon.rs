//! Planar ring helpers.
//!
//! Rings are open vertex lists; the closing edge from the last vertex back to
//! the first is implied. A duplicated closing vertex is harmless for both
//! helpers (it contributes a zero-length edge).

use super::Vec2;

/// Unsigned shoelace area of one ring.
pub fn ring_area(ring: &[Vec2]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[j], ring[i]);
        twice += (a.x + b.x) * (a.y - b.y);
        j = i;
    }
    (twice * 0.5).abs()
}

/// Sum of [`ring_area`] over every ring.
pub fn rings_area(rings: &[Vec<Vec2>]) -> f64 {
    rings.iter().map(|r| ring_area(r)).sum()
}

/// Even-odd crossing test against the implicitly closed ring.
///
/// Rings with fewer than three vertices never contain anything.
pub fn point_in_ring(p: Vec2, ring: &[Vec2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::{point_in_ring, ring_area, rings_area};
    use crate::math::Vec2;

    fn square(x0: f64, y0: f64, side: f64) -> Vec<Vec2> {
        vec![
            Vec2::new(x0, y0),
            Vec2::new(x0 + side, y0),
            Vec2::new(x0 + side, y0 + side),
            Vec2::new(x0, y0 + side),
        ]
    }

    #[test]
    fn area_ignores_winding() {
        let mut ring = square(0.0, 0.0, 2.0);
        assert_eq!(ring_area(&ring), 4.0);
        ring.reverse();
        assert_eq!(ring_area(&ring), 4.0);
    }

    #[test]
    fn area_tolerates_explicit_closing_vertex() {
        let mut ring = square(1.0, 1.0, 3.0);
        ring.push(ring[0]);
        assert_eq!(ring_area(&ring), 9.0);
    }

    #[test]
    fn degenerate_rings_have_no_area() {
        assert_eq!(ring_area(&[]), 0.0);
        assert_eq!(ring_area(&[Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn combined_area_sums_rings() {
        let rings = vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 2.0)];
        assert_eq!(rings_area(&rings), 5.0);
    }

    #[test]
    fn point_in_ring_inside_and_outside() {
        let ring = square(0.0, 0.0, 10.0);
        assert!(point_in_ring(Vec2::new(5.0, 5.0), &ring));
        assert!(!point_in_ring(Vec2::new(15.0, 5.0), &ring));
        assert!(!point_in_ring(Vec2::new(5.0, -0.1), &ring));
    }

    #[test]
    fn concave_notch_is_outside() {
        // U shape: notch between x in (4, 6) above y = 4.
        let ring = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(6.0, 10.0),
            Vec2::new(6.0, 4.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(4.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        assert!(!point_in_ring(Vec2::new(5.0, 8.0), &ring));
        assert!(point_in_ring(Vec2::new(2.0, 8.0), &ring));
        assert!(point_in_ring(Vec2::new(5.0, 2.0), &ring));
    }

    #[test]
    fn empty_ring_contains_nothing() {
        assert!(!point_in_ring(Vec2::new(0.0, 0.0), &[]));
    }
}
