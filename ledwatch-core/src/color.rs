//! RGB colors and the binary-monitor palette

use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGB color with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// All channels off
    pub const OFF: Color = Color::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// True when every channel is zero
    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }
}

impl From<[u8; 3]> for Color {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self { red, green, blue }
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        [color.red, color.green, color.blue]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.red, self.green, self.blue)
    }
}

/// Colors shown by binary (healthy/unhealthy) monitors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Shown while a probe is in flight
    #[serde(default = "default_checking")]
    pub checking: Color,

    /// Shown after a successful probe
    #[serde(default = "default_healthy")]
    pub healthy: Color,

    /// Shown after a failed probe
    #[serde(default = "default_unhealthy")]
    pub unhealthy: Color,
}

fn default_checking() -> Color {
    Color::new(0, 0, 16)
}

fn default_healthy() -> Color {
    Color::new(0, 8, 0)
}

fn default_unhealthy() -> Color {
    Color::new(255, 0, 0)
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            checking: default_checking(),
            healthy: default_healthy(),
            unhealthy: default_unhealthy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_serializes_as_array() {
        let json = serde_json::to_string(&Color::new(1, 2, 3)).unwrap();
        assert_eq!(json, "[1,2,3]");

        let color: Color = serde_json::from_str("[255,0,16]").unwrap();
        assert_eq!(color, Color::new(255, 0, 16));
    }

    #[test]
    fn test_palette_defaults_fill_missing_fields() {
        let palette: Palette = serde_json::from_str(r#"{"healthy":[0,32,0]}"#).unwrap();
        assert_eq!(palette.healthy, Color::new(0, 32, 0));
        assert_eq!(palette.checking, Color::new(0, 0, 16));
        assert_eq!(palette.unhealthy, Color::new(255, 0, 0));
    }

    #[test]
    fn test_off() {
        assert!(Color::OFF.is_off());
        assert!(!Color::new(0, 0, 1).is_off());
    }
}
