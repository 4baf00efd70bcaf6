//! Percentage gradient used to color ranked values
//!
//! Piecewise-linear interpolation in plain sRGB across fixed stop tables.
//! Low percentages are cyan, high percentages red.

use std::fmt;

/// 8-bit RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        self.to_string()
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// A gradient stop at `percent` (0-100)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub percent: f64,
    pub color: Rgb,
}

const fn stop(percent: f64, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop {
        percent,
        color: Rgb(r, g, b),
    }
}

/// Palette stops
pub mod stops {
    use super::{stop, ColorStop};

    pub const LINEAR: &[ColorStop] = &[
        stop(0.0, 0x1D, 0xF7, 0xEF),   // #1DF7EF
        stop(20.0, 0x76, 0xED, 0xA0),  // #76EDA0
        stop(50.0, 0xFF, 0xDF, 0x27),  // #FFDF27
        stop(70.0, 0xFF, 0x9B, 0x47),  // #FF9B47
        stop(100.0, 0xFE, 0x54, 0x68), // #FE5468
    ];

    /// Compresses the cool end so small differences near 0 stand out
    pub const WEIGHTED: &[ColorStop] = &[
        stop(0.0, 0x1D, 0xF7, 0xEF),   // #1DF7EF
        stop(2.0, 0x76, 0xED, 0xA0),   // #76EDA0
        stop(10.0, 0xFF, 0xDF, 0x27),  // #FFDF27
        stop(40.0, 0xFF, 0x9B, 0x47),  // #FF9B47
        stop(80.0, 0xFE, 0x54, 0x68),  // #FE5468
        stop(100.0, 0xFE, 0x54, 0x68), // #FE5468
    ];
}

/// Interpolated color for `percentage` within a stop table.
pub fn interpolate(table: &[ColorStop], percentage: f64) -> Rgb {
    let pct = if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    };

    for pair in table.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if pct >= lower.percent && pct <= upper.percent {
            let span = upper.percent - lower.percent;
            if span <= 0.0 {
                return upper.color;
            }
            return lower.color.lerp(upper.color, (pct - lower.percent) / span);
        }
    }

    // Tables cover 0..=100, only reachable with a malformed table
    table
        .last()
        .map(|s| s.color)
        .unwrap_or(Rgb(0xFF, 0xFF, 0xFF))
}

/// `#RRGGBB` for a 0-100 percentage.
pub fn gradient_color(percentage: f64, weighted: bool) -> String {
    let table = if weighted { stops::WEIGHTED } else { stops::LINEAR };
    interpolate(table, percentage).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(gradient_color(0.0, false), "#1DF7EF");
        assert_eq!(gradient_color(100.0, false), "#FE5468");
        assert_eq!(gradient_color(0.0, true), "#1DF7EF");
        assert_eq!(gradient_color(100.0, true), "#FE5468");
    }

    #[test]
    fn test_exact_stops() {
        assert_eq!(gradient_color(20.0, false), "#76EDA0");
        assert_eq!(gradient_color(50.0, false), "#FFDF27");
        assert_eq!(gradient_color(70.0, false), "#FF9B47");
        assert_eq!(gradient_color(10.0, true), "#FFDF27");
        assert_eq!(gradient_color(90.0, true), "#FE5468");
    }

    #[test]
    fn test_midpoint_interpolation() {
        // Halfway between #76EDA0 (20) and #FFDF27 (50)
        // R: 0x76 + (0xFF-0x76)/2 = 118 + 68.5 -> 187 (0xBB)
        // G: 0xED + (0xDF-0xED)/2 = 237 - 7    -> 230 (0xE6)
        // B: 0xA0 + (0x27-0xA0)/2 = 160 - 60.5 -> 99.5 -> 100 (0x64)
        assert_eq!(gradient_color(35.0, false), "#BBE664");
        // Halfway between #1DF7EF (0) and #76EDA0 (2) in the weighted table
        assert_eq!(gradient_color(1.0, true), gradient_color(10.0, false));
    }

    #[test]
    fn test_clamps_input() {
        assert_eq!(gradient_color(-5.0, false), "#1DF7EF");
        assert_eq!(gradient_color(250.0, false), "#FE5468");
        assert_eq!(gradient_color(f64::NAN, false), "#1DF7EF");
    }

    #[test]
    fn test_hex_is_zero_padded_upper_case() {
        assert_eq!(Rgb(0x1D, 0xF7, 0xEF).to_hex(), "#1DF7EF");
        assert_eq!(Rgb(0x00, 0x0A, 0xFF).to_hex(), "#000AFF");
    }
}
