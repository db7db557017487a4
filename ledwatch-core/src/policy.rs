//! Color policies: pure mappings from probe results to strip colors

use crate::color::{Color, Palette};
use crate::probe::ProbeResult;

/// Maps a probe result to the color shown on the monitor's slot
pub trait ColorPolicy: Send + Sync {
    /// Color written before each probe invocation, if the policy has a
    /// "checking" phase
    fn checking(&self) -> Option<Color>;

    /// Color for a probe result; `None` when the result kind is not one this
    /// policy understands
    fn color_for(&self, result: &ProbeResult) -> Option<Color>;

    /// Color shown when the probe itself failed; `None` clears the slot
    fn color_for_error(&self) -> Option<Color> {
        None
    }
}

/// Three-state policy for reachability checks: checking, healthy, unhealthy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryPolicy {
    palette: Palette,
}

impl BinaryPolicy {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

impl ColorPolicy for BinaryPolicy {
    fn checking(&self) -> Option<Color> {
        Some(self.palette.checking)
    }

    fn color_for(&self, result: &ProbeResult) -> Option<Color> {
        match result {
            ProbeResult::Boolean(true) => Some(self.palette.healthy),
            ProbeResult::Boolean(false) => Some(self.palette.unhealthy),
            ProbeResult::Numeric(_) => None,
        }
    }

    fn color_for_error(&self) -> Option<Color> {
        Some(self.palette.unhealthy)
    }
}

/// Green-to-red blend over a closed interval of readings.
///
/// Readings at or below `low` are pure green, at or above `high` pure red,
/// and linearly interpolated in between. Both channels are capped at
/// `max_brightness`; blue is always off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientPolicy {
    low: f64,
    high: f64,
    max_brightness: u8,
}

impl GradientPolicy {
    /// Create a gradient policy.
    ///
    /// Callers validate `low < high` (see `AgentConfig::validate`). If the
    /// bounds are degenerate every reading maps to one of the two ends.
    pub fn new(low: f64, high: f64, max_brightness: u8) -> Self {
        Self {
            low,
            high,
            max_brightness,
        }
    }

    /// Color for a numeric reading
    pub fn color_for_value(&self, value: f64) -> Color {
        let max = f64::from(self.max_brightness);
        let span = self.high - self.low;

        let fraction = if !(span > 0.0) || value.is_nan() {
            if value >= self.high { 1.0 } else { 0.0 }
        } else {
            (value.clamp(self.low, self.high) - self.low) / span
        };

        let red = (fraction * max).round();
        let green = ((1.0 - fraction) * max).round();

        Color::new(red as u8, green as u8, 0)
    }
}

impl Default for GradientPolicy {
    fn default() -> Self {
        Self::new(60.0, 80.0, 10)
    }
}

impl ColorPolicy for GradientPolicy {
    fn checking(&self) -> Option<Color> {
        None
    }

    fn color_for(&self, result: &ProbeResult) -> Option<Color> {
        match result {
            ProbeResult::Numeric(value) => Some(self.color_for_value(*value)),
            ProbeResult::Boolean(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> GradientPolicy {
        GradientPolicy::new(60.0, 80.0, 10)
    }

    #[test]
    fn test_gradient_clamps_low() {
        for v in [-40.0, 0.0, 59.9, 60.0] {
            assert_eq!(policy().color_for_value(v), Color::new(0, 10, 0), "v = {}", v);
        }
    }

    #[test]
    fn test_gradient_clamps_high() {
        for v in [80.0, 80.1, 95.0, 1_000.0] {
            assert_eq!(policy().color_for_value(v), Color::new(10, 0, 0), "v = {}", v);
        }
    }

    #[test]
    fn test_gradient_midpoint_balanced() {
        assert_eq!(policy().color_for_value(70.0), Color::new(5, 5, 0));

        // Odd brightness: channels may differ by one after rounding
        let odd = GradientPolicy::new(60.0, 80.0, 255);
        let color = odd.color_for_value(70.0);
        assert!((i16::from(color.red) - i16::from(color.green)).abs() <= 1);
        assert_eq!(color.blue, 0);
    }

    #[test]
    fn test_gradient_monotonic() {
        let policy = GradientPolicy::new(60.0, 80.0, 255);
        let mut previous = policy.color_for_value(60.0);

        let mut v = 60.0;
        while v <= 80.0 {
            let color = policy.color_for_value(v);
            assert!(color.red >= previous.red, "red decreased at {}", v);
            assert!(color.green <= previous.green, "green increased at {}", v);
            assert_eq!(color.blue, 0);
            previous = color;
            v += 0.25;
        }
    }

    #[test]
    fn test_gradient_respects_brightness_cap() {
        let dim = GradientPolicy::new(60.0, 80.0, 3);
        for v in [50.0, 65.0, 70.0, 75.0, 90.0] {
            let color = dim.color_for_value(v);
            assert!(color.red <= 3 && color.green <= 3);
        }
    }

    #[test]
    fn test_gradient_degenerate_bounds() {
        let flat = GradientPolicy::new(70.0, 70.0, 10);
        assert_eq!(flat.color_for_value(69.0), Color::new(0, 10, 0));
        assert_eq!(flat.color_for_value(70.0), Color::new(10, 0, 0));
        assert_eq!(policy().color_for_value(f64::NAN), Color::new(0, 10, 0));
    }

    #[test]
    fn test_gradient_has_no_checking_phase() {
        assert_eq!(policy().checking(), None);
        assert_eq!(policy().color_for(&ProbeResult::Boolean(true)), None);
        assert_eq!(policy().color_for_error(), None);
    }

    #[test]
    fn test_binary_policy() {
        let palette = Palette::default();
        let policy = BinaryPolicy::new(palette);

        assert_eq!(policy.checking(), Some(palette.checking));
        assert_eq!(policy.color_for(&ProbeResult::Boolean(true)), Some(palette.healthy));
        assert_eq!(policy.color_for(&ProbeResult::Boolean(false)), Some(palette.unhealthy));
        assert_eq!(policy.color_for(&ProbeResult::Numeric(1.0)), None);
        assert_eq!(policy.color_for_error(), Some(palette.unhealthy));
    }
}
