// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe values, colours and easing curves.

use crate::error::{ConfigurationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Easing curve applied to the local fraction between two breakpoints
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// Constant speed
    #[default]
    Linear,
    /// `cubic-bezier(0.42, 0, 1, 1)`
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`
    EaseInOut,
    /// Slight overshoot at the end
    BackOut,
    /// Custom `cubic-bezier(x1, y1, x2, y2)`
    CubicBezier([f32; 4]),
}

impl Easing {
    /// Check that custom control points describe a function of time
    pub fn validate(&self) -> Result<()> {
        if let Easing::CubicBezier([x1, y1, x2, y2]) = *self {
            for value in [x1, y1, x2, y2] {
                crate::error::ensure_finite("cubic-bezier control point", value)?;
            }
            if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                return Err(ConfigurationError::InvalidEasing);
            }
        }
        Ok(())
    }

    /// Map a fraction in `[0, 1]` through the curve.
    ///
    /// The input is clamped; the endpoints map to exactly 0 and 1.
    pub fn apply(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }

        match *self {
            Easing::Linear => t,
            Easing::EaseIn => Interpolation::cubic_bezier([0.42, 0.0, 1.0, 1.0], t),
            Easing::EaseOut => Interpolation::cubic_bezier([0.0, 0.0, 0.58, 1.0], t),
            Easing::EaseInOut => Interpolation::cubic_bezier([0.42, 0.0, 0.58, 1.0], t),
            Easing::BackOut => Interpolation::cubic_bezier([0.33, 1.53, 0.69, 0.99], t),
            Easing::CubicBezier(points) => Interpolation::cubic_bezier(points, t),
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Component-wise interpolation of RGBA
    pub fn lerp_rgba(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
            Self::lerp(a[3], b[3], t),
        ]
    }

    /// One-dimensional cubic bezier through `p0..p3`
    pub fn bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        p0 * mt3 + 3.0 * p1 * mt2 * t + 3.0 * p2 * mt * t2 + p3 * t3
    }

    /// CSS-style `cubic-bezier(x1, y1, x2, y2)` evaluated at time `x`
    pub fn cubic_bezier([x1, y1, x2, y2]: [f32; 4], x: f32) -> f32 {
        if x1 == y1 && x2 == y2 {
            return x;
        }

        // x(t) is monotonic for x1, x2 in [0, 1], so bisection converges
        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        let mut t = x;
        for _ in 0..48 {
            let current = Self::bezier(0.0, x1, x2, 1.0, t);
            if (current - x).abs() < 1e-6 {
                break;
            }
            if current < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) * 0.5;
        }

        Self::bezier(0.0, y1, y2, 1.0, t)
    }
}

/// A colour keyframe.
///
/// Channels are stored as fractions in `[0, 1]`; hue in degrees. Serialized
/// as a CSS colour string that parses back to the same channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    /// Red, green, blue, alpha
    Rgba([f32; 4]),
    /// Hue (degrees), saturation, lightness, alpha
    Hsla([f32; 4]),
}

impl Color {
    /// Opaque colour from 8-bit channels
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Color::Rgba([channel8(r), channel8(g), channel8(b), 1.0])
    }

    /// Resolve to RGBA fractions
    pub fn to_rgba(&self) -> [f32; 4] {
        match *self {
            Color::Rgba(rgba) => rgba,
            Color::Hsla([h, s, l, a]) => {
                let [r, g, b] = hsl_to_rgb(h, s, l);
                [r, g, b, a]
            }
        }
    }

    /// CSS `rgba(...)` representation with 8-bit channels
    pub fn to_css(&self) -> String {
        let [r, g, b, a] = self.to_rgba();
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("rgba({}, {}, {}, {})", channel(r), channel(g), channel(b), round3(a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f32 * 255 and f32 * 100 are exact in f64, so parsing divides back exactly
        match *self {
            Color::Rgba([r, g, b, a]) => write!(
                f,
                "rgba({}, {}, {}, {a})",
                f64::from(r) * 255.0,
                f64::from(g) * 255.0,
                f64::from(b) * 255.0
            ),
            Color::Hsla([h, s, l, a]) => write!(
                f,
                "hsla({h}, {}%, {}%, {a})",
                f64::from(s) * 100.0,
                f64::from(l) * 100.0
            ),
        }
    }
}

fn channel8(v: u8) -> f32 {
    (f64::from(v) / 255.0) as f32
}

fn round3(v: f32) -> f32 {
    (v.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(360.0) / 360.0;
    if s <= 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let hue = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    [hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0)]
}

impl FromStr for Color {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        let invalid = || ConfigurationError::InvalidColor(input.to_string());

        if let Some(hex) = input.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        let (name, args) = input
            .strip_suffix(')')
            .and_then(|rest| rest.split_once('('))
            .ok_or_else(invalid)?;
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();

        let color = match (name.trim().to_ascii_lowercase().as_str(), parts.len()) {
            ("rgb", 3) | ("rgba", 4) => {
                let mut rgba = [0.0, 0.0, 0.0, 1.0];
                for (i, part) in parts.iter().enumerate() {
                    rgba[i] = if i < 3 {
                        let value: f64 = part.parse().map_err(|_| invalid())?;
                        (value / 255.0) as f32
                    } else {
                        part.parse().map_err(|_| invalid())?
                    };
                }
                Color::Rgba(rgba)
            }
            ("hsl", 3) | ("hsla", 4) => {
                let mut hsla = [0.0, 0.0, 0.0, 1.0];
                for (i, part) in parts.iter().enumerate() {
                    hsla[i] = match i {
                        0 => part.trim_end_matches("deg").parse().map_err(|_| invalid())?,
                        1 | 2 => {
                            let pct: f64 = part
                                .strip_suffix('%')
                                .ok_or_else(invalid)?
                                .parse()
                                .map_err(|_| invalid())?;
                            (pct / 100.0) as f32
                        }
                        _ => part.parse().map_err(|_| invalid())?,
                    };
                }
                Color::Hsla(hsla)
            }
            _ => return Err(invalid()),
        };

        match color {
            Color::Rgba(channels) | Color::Hsla(channels) if channels.iter().all(|c| c.is_finite()) => Ok(color),
            _ => Err(invalid()),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;

    let channels: Vec<u8> = match digits.len() {
        3 | 4 => digits.iter().map(|d| d * 17).collect(),
        6 | 8 => digits.chunks(2).map(|pair| pair[0] * 16 + pair[1]).collect(),
        _ => return None,
    };

    let alpha = channels.get(3).map_or(1.0, |a| channel8(*a));
    Some(Color::Rgba([channel8(channels[0]), channel8(channels[1]), channel8(channels[2]), alpha]))
}

impl TryFrom<String> for Color {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Output values of a range mapping, one per breakpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Keyframes {
    /// Linearly interpolated numbers
    Numeric(Vec<f32>),
    /// Colours interpolated in RGBA
    Color(Vec<Color>),
    /// Stepped values, never interpolated
    Discrete(Vec<String>),
}

impl Keyframes {
    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            Keyframes::Numeric(v) => v.len(),
            Keyframes::Color(v) => v.len(),
            Keyframes::Discrete(v) => v.len(),
        }
    }

    /// Whether there are no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single value produced by a range mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyframeValue {
    /// Number
    Numeric(f32),
    /// RGBA fractions
    Color([f32; 4]),
    /// Stepped value
    Discrete(String),
}

impl KeyframeValue {
    /// Get as number if possible
    pub fn as_numeric(&self) -> Option<f32> {
        match self {
            KeyframeValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as RGBA if possible
    pub fn as_color(&self) -> Option<[f32; 4]> {
        match self {
            KeyframeValue::Color(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as discrete value if possible
    pub fn as_discrete(&self) -> Option<&str> {
        match self {
            KeyframeValue::Discrete(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let orange: Color = "#F97316".parse().unwrap();
        assert_eq!(orange, Color::rgb8(0xF9, 0x73, 0x16));

        let short: Color = "#fff".parse().unwrap();
        assert_eq!(short.to_rgba(), [1.0, 1.0, 1.0, 1.0]);

        assert!("#12345".parse::<Color>().is_err());
    }

    #[test]
    fn test_parse_rgba_and_hsl() {
        let clear: Color = "rgba(255,255,255,0)".parse().unwrap();
        assert_eq!(clear.to_rgba(), [1.0, 1.0, 1.0, 0.0]);

        let red: Color = "hsl(0, 100%, 50%)".parse().unwrap();
        let [r, g, b, a] = red.to_rgba();
        assert!((r - 1.0).abs() < 1e-5);
        assert!(g.abs() < 1e-5);
        assert!(b.abs() < 1e-5);
        assert_eq!(a, 1.0);

        assert!(matches!(
            "cmyk(0,0,0,0)".parse::<Color>(),
            Err(ConfigurationError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_css_output() {
        assert_eq!(Color::rgb8(249, 115, 22).to_css(), "rgba(249, 115, 22, 1)");
    }

    #[test]
    fn test_non_finite_channels_rejected() {
        for input in ["rgb(NaN, 0, 0)", "rgba(0, 0, 0, inf)", "hsl(NaN, 50%, 50%)", "hsla(0, -inf%, 50%, 1)", "rgb(1e400, 0, 0)"] {
            assert_eq!(input.parse::<Color>(), Err(ConfigurationError::InvalidColor(input.to_string())));
        }
    }

    #[test]
    fn test_string_form_is_exact() {
        let colors = [
            Color::Rgba([0.5, 0.5, 0.5, 1.0]),
            Color::rgb8(249, 115, 22),
            Color::Rgba([0.1, 0.2, 0.3, 0.35]),
            Color::Hsla([200.0, 0.5, 0.5, 1.0]),
            Color::Hsla([212.3, 0.123, 0.777, 0.35]),
        ];
        for color in colors {
            let text = String::from(color);
            assert_eq!(text.parse::<Color>(), Ok(color), "{text}");
        }
        assert_eq!(String::from(Color::Hsla([200.0, 0.5, 0.5, 1.0])), "hsla(200, 50%, 50%, 1)");
        assert_eq!(String::from(Color::Rgba([0.5, 0.5, 0.5, 1.0])), "rgba(127.5, 127.5, 127.5, 1)");
    }

    #[test]
    fn test_easing_endpoints_exact() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut, Easing::BackOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(-3.0), 0.0);
            assert_eq!(easing.apply(7.0), 1.0);
        }
    }

    #[test]
    fn test_ease_in_out_symmetric() {
        let mid = Easing::EaseInOut.apply(0.5);
        assert!((mid - 0.5).abs() < 1e-3);
        assert!(Easing::EaseIn.apply(0.25) < 0.25);
        assert!(Easing::EaseOut.apply(0.25) > 0.25);
    }

    #[test]
    fn test_back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Easing::BackOut.apply(i as f32 / 100.0))
            .fold(0.0_f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_invalid_bezier_rejected() {
        assert_eq!(
            Easing::CubicBezier([1.5, 0.0, 0.5, 1.0]).validate(),
            Err(ConfigurationError::InvalidEasing)
        );
        assert!(Easing::CubicBezier([0.33, 1.0, 0.68, 1.0]).validate().is_ok());
    }
}
