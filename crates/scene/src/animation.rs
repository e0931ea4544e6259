use crate::region::Region;

/// Fraction of the remaining distance covered per tick.
pub const EASE: f64 = 0.5;
/// Below this distance a height snaps to its target.
pub const SETTLE: f64 = 0.1;
/// Lowest lift for a hovered region, in pixels.
pub const MIN_LIFT: f64 = 10.0;
/// Lift of a region at 100%.
pub const MAX_LIFT: f64 = 25.0;

/// What the frame driver should do after a tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Something is still moving; render and schedule another frame.
    Continue,
    /// Everything sits on its target; render once more and go idle.
    Stop,
}

pub fn target_height(value: u32, hovered: bool) -> f64 {
    if hovered {
        MIN_LIFT.max(f64::from(value) / 100.0 * MAX_LIFT)
    } else {
        0.0
    }
}

/// Eases extrusion heights toward their targets.
///
/// Stateless apart from its tuning; the heights live on the regions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimationLoop {
    pub ease: f64,
    pub settle: f64,
}

impl Default for AnimationLoop {
    fn default() -> Self {
        Self {
            ease: EASE,
            settle: SETTLE,
        }
    }
}

impl AnimationLoop {
    /// Advance every region by one frame.
    ///
    /// A region further than `settle` from its target moves by `ease` of the
    /// gap; a region within `settle` snaps onto the target.
    pub fn step(&self, regions: &mut [Region], hovered: Option<&str>) -> Tick {
        let mut moving = false;
        for region in regions.iter_mut() {
            let target = target_height(region.value, hovered == Some(region.id.as_str()));
            let diff = target - region.current_height;
            if diff.abs() > self.settle {
                region.current_height += diff * self.ease;
                moving = true;
            } else {
                region.current_height = target;
            }
        }
        if moving { Tick::Continue } else { Tick::Stop }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimationLoop, MAX_LIFT, MIN_LIFT, Tick, target_height};
    use crate::region::Region;
    use pretty_assertions::assert_eq;

    fn region(id: &str, value: u32) -> Region {
        Region::new(id, value, Vec::new())
    }

    #[test]
    fn targets_follow_value_with_a_floor() {
        assert_eq!(target_height(100, true), MAX_LIFT);
        assert_eq!(target_height(20, true), MIN_LIFT);
        assert_eq!(target_height(0, true), MIN_LIFT);
        assert_eq!(target_height(80, true), 20.0);
        assert_eq!(target_height(100, false), 0.0);
    }

    #[test]
    fn converges_exactly_and_stops() {
        let anim = AnimationLoop::default();
        let mut regions = vec![region("포천시", 100), region("가평군", 5)];
        let mut ticks = 0;
        while anim.step(&mut regions, Some("포천시")) == Tick::Continue {
            ticks += 1;
            assert!(ticks < 20, "animation did not settle");
        }
        assert_eq!(regions[0].current_height, 25.0);
        assert_eq!(regions[1].current_height, 0.0);

        // Settled: further ticks change nothing.
        assert_eq!(anim.step(&mut regions, Some("포천시")), Tick::Stop);
        assert_eq!(regions[0].current_height, 25.0);
    }

    #[test]
    fn unhovered_region_sinks_back() {
        let anim = AnimationLoop::default();
        let mut regions = vec![region("수원시", 85)];
        regions[0].current_height = 21.25;
        assert_eq!(anim.step(&mut regions, None), Tick::Continue);
        assert!(regions[0].current_height < 21.25);
        while anim.step(&mut regions, None) == Tick::Continue {}
        assert_eq!(regions[0].current_height, 0.0);
    }

    #[test]
    fn nothing_hovered_at_rest_stops_immediately() {
        let anim = AnimationLoop::default();
        let mut regions = vec![region("a", 50), region("b", 0)];
        assert_eq!(anim.step(&mut regions, None), Tick::Stop);
    }
}
