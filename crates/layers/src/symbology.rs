use scene::PressureBand;

/// Outline drawn around every base polygon.
pub const OUTLINE_COLOR: &str = "#e3e3e3";
pub const OUTLINE_WIDTH: f64 = 0.4;

/// Lightness shift for extrusion side walls.
pub const SIDE_SHADE: i32 = -15;
/// Lightness shift for the extrusion top face.
pub const TOP_SHADE: i32 = 8;

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Hsl {
    pub h: i32,
    pub s: i32,
    pub l: i32,
}

impl Hsl {
    pub const fn new(h: i32, s: i32, l: i32) -> Self {
        Self { h, s, l }
    }

    /// Same hue and saturation, lightness shifted and clamped to 0..=100.
    pub fn shade(self, delta: i32) -> Self {
        Self {
            l: (self.l + delta).clamp(0, 100),
            ..self
        }
    }

    pub fn side(self) -> Self {
        self.shade(SIDE_SHADE)
    }

    pub fn top(self) -> Self {
        self.shade(TOP_SHADE)
    }

    pub fn to_css(self) -> String {
        format!("hsl({}, {}%, {}%)", self.h, self.s, self.l)
    }

    /// `#rrggbb`, for outputs that do not understand `hsl()`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_rgb(self) -> [u8; 3] {
        let h = f64::from(self.h.rem_euclid(360)) / 360.0;
        let s = f64::from(self.s) / 100.0;
        let l = f64::from(self.l) / 100.0;
        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return [v, v, v];
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f64| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round() as u8
        };
        [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
    }
}

pub fn band_color(band: PressureBand) -> Hsl {
    match band {
        PressureBand::Red => Hsl::new(343, 100, 47),
        PressureBand::Yellow => Hsl::new(39, 100, 46),
        PressureBand::Empty => Hsl::new(0, 0, 50),
        PressureBand::Green => Hsl::new(145, 93, 40),
    }
}

pub fn value_color(value: u32) -> Hsl {
    band_color(PressureBand::for_value(value))
}

#[cfg(test)]
mod tests {
    use super::{Hsl, value_color};
    use pretty_assertions::assert_eq;

    #[test]
    fn value_thresholds_pick_palette() {
        assert_eq!(value_color(94), Hsl::new(343, 100, 47));
        assert_eq!(value_color(38), Hsl::new(39, 100, 46));
        assert_eq!(value_color(0), Hsl::new(0, 0, 50));
        assert_eq!(value_color(25), Hsl::new(145, 93, 40));
    }

    #[test]
    fn shades_shift_lightness_only() {
        let red = value_color(94);
        assert_eq!(red.side(), Hsl::new(343, 100, 32));
        assert_eq!(red.top(), Hsl::new(343, 100, 55));
        assert_eq!(Hsl::new(0, 0, 5).side().l, 0);
    }

    #[test]
    fn css_and_hex() {
        assert_eq!(value_color(0).to_css(), "hsl(0, 0%, 50%)");
        assert_eq!(value_color(0).to_hex(), "#808080");
        assert_eq!(Hsl::new(0, 100, 50).to_hex(), "#ff0000");
        assert_eq!(Hsl::new(120, 100, 50).to_hex(), "#00ff00");
    }
}
