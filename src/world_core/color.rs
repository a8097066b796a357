use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A color as written in the scene config: either `#rrggbb` (stored as
/// linear RGB) or `oklch(l c h)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    Rgb(Vec3),
    Oklch { l: f32, c: f32, h: f32 },
}

impl Color {
    pub const WHITE: Self = Self::Rgb(Vec3::ONE);

    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).with_context(|| format!("invalid hex color {s:?}"));
        }
        if s.starts_with("oklch") {
            return parse_oklch(s).with_context(|| format!("invalid oklch color {s:?}"));
        }
        match s.to_ascii_lowercase().as_str() {
            "white" => Ok(Self::WHITE),
            "black" => Ok(Self::Rgb(Vec3::ZERO)),
            _ => Err(anyhow!("unsupported color {s:?}")),
        }
    }

    pub fn from_srgb(r: f32, g: f32, b: f32) -> Self {
        Self::Rgb(Vec3::new(
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
        ))
    }

    /// `0xrrggbb` in sRGB.
    pub fn from_hex(value: u32) -> Self {
        let channel = |shift: u32| ((value >> shift) & 0xff) as f32 / 255.0;
        Self::from_srgb(channel(16), channel(8), channel(0))
    }

    pub fn to_linear_rgb(self) -> Vec3 {
        match self {
            Self::Rgb(rgb) => rgb,
            Self::Oklch { l, c, h } => oklch_to_linear_srgb(l, c, h),
        }
    }

    /// OKLCH pairs keep their encoding and take the shortest hue arc;
    /// anything else blends in linear RGB.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        if t <= 0.0 {
            return self;
        }
        match (self, other) {
            (Self::Oklch { l: la, c: ca, h: ha }, Self::Oklch { l: lb, c: cb, h: hb }) => {
                let mut dh = hb - ha;
                if dh.abs() > 180.0 {
                    dh -= dh.signum() * 360.0;
                }
                Self::Oklch {
                    l: lerp(la, lb, t).clamp(0.0, 1.0),
                    c: lerp(ca, cb, t).max(0.0),
                    h: wrap_hue(ha + dh * t),
                }
            }
            (a, b) => Self::Rgb(a.to_linear_rgb().lerp(b.to_linear_rgb(), t)),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        match color {
            Color::Rgb(rgb) => {
                let to_byte = |v: f32| (linear_to_srgb(v).clamp(0.0, 1.0) * 255.0).round() as u8;
                format!(
                    "#{:02x}{:02x}{:02x}",
                    to_byte(rgb.x),
                    to_byte(rgb.y),
                    to_byte(rgb.z)
                )
            }
            Color::Oklch { l, c, h } => format!("oklch({l} {c} {h})"),
        }
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn wrap_hue(h: f32) -> f32 {
    if h < 0.0 {
        h + 360.0
    } else if h >= 360.0 {
        h - 360.0
    } else {
        h
    }
}

fn parse_hex(hex: &str) -> Result<Color> {
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        n => bail!("expected 3 or 6 hex digits, got {n}"),
    };
    let value = u32::from_str_radix(&expanded, 16)?;
    Ok(Color::from_hex(value))
}

fn parse_oklch(s: &str) -> Result<Color> {
    let body = s
        .strip_prefix("oklch(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| anyhow!("expected oklch(l c h)"))?;
    // Alpha after '/' is ignored.
    let channels = body.split('/').next().unwrap_or_default();
    let parts: Vec<&str> = channels.split_whitespace().collect();
    let [l, c, h] = parts.as_slice() else {
        bail!("expected three channels, got {}", parts.len());
    };

    let l = match l.strip_suffix('%') {
        Some(percent) => percent.parse::<f32>()? / 100.0,
        None => l.parse::<f32>()?,
    };
    let c: f32 = c.parse()?;
    let h: f32 = h.trim_end_matches("deg").parse()?;

    Ok(Color::Oklch {
        l: l.clamp(0.0, 1.0),
        c: c.max(0.0),
        h: h.rem_euclid(360.0),
    })
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn oklch_to_linear_srgb(l: f32, c: f32, h: f32) -> Vec3 {
    let (sin_h, cos_h) = h.to_radians().sin_cos();
    let a = c * cos_h;
    let b = c * sin_h;

    let l_ = l + 0.396_337_78 * a + 0.215_803_76 * b;
    let m_ = l - 0.105_561_35 * a - 0.063_854_17 * b;
    let s_ = l - 0.089_484_18 * a - 1.291_485_5 * b;

    let l3 = l_ * l_ * l_;
    let m3 = m_ * m_ * m_;
    let s3 = s_ * s_ * s_;

    Vec3::new(
        4.076_741_7 * l3 - 3.307_711_6 * m3 + 0.230_969_94 * s3,
        -1.268_438 * l3 + 2.609_757_4 * m3 - 0.341_319_38 * s3,
        -0.004_196_086_3 * l3 - 0.703_418_6 * m3 + 1.707_614_7 * s3,
    )
    .clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::Color;
    use glam::Vec3;

    #[test]
    fn hex_literals_match_parsed_strings() {
        assert_eq!(Color::from_hex(0x589941), Color::parse("#589941").unwrap());
        let white = Color::from_hex(0xffffff).to_linear_rgb();
        assert!((white - Vec3::ONE).abs().max_element() < 1e-5);
        assert_eq!(Color::from_hex(0x000000), Color::parse("black").unwrap());
    }

    #[test]
    fn parses_hex_into_linear_rgb() {
        let white = Color::parse("#FFFFFF").unwrap();
        assert_eq!(white, Color::Rgb(Vec3::ONE));

        let short = Color::parse("#fff").unwrap();
        assert_eq!(short, white);

        let Color::Rgb(tip) = Color::parse("#589941").unwrap() else {
            panic!("hex should parse to rgb");
        };
        // 0x99 = 153 -> ~0.318 linear
        assert!((tip.y - 0.318).abs() < 1e-3);
    }

    #[test]
    fn parses_oklch_with_optional_alpha() {
        let sky = Color::parse("oklch(0.83 0.10 230)").unwrap();
        assert_eq!(
            sky,
            Color::Oklch {
                l: 0.83,
                c: 0.10,
                h: 230.0
            }
        );

        let with_alpha = Color::parse("oklch(83% 0.10 230 / 0.5)").unwrap();
        let Color::Oklch { l, .. } = with_alpha else {
            panic!("expected oklch");
        };
        assert!((l - 0.83).abs() < 1e-6);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("oklch(0.5 0.1)").is_err());
        assert!(Color::parse("rebeccapurple").is_err());
    }

    #[test]
    fn oklch_hue_takes_the_shortest_arc() {
        let a = Color::Oklch {
            l: 0.5,
            c: 0.1,
            h: 350.0,
        };
        let b = Color::Oklch {
            l: 0.5,
            c: 0.1,
            h: 10.0,
        };
        let Color::Oklch { h, .. } = a.lerp(b, 0.5) else {
            panic!("oklch pair should stay oklch");
        };
        assert!(h.abs() < 1e-3 || (h - 360.0).abs() < 1e-3, "hue was {h}");

        let Color::Oklch { h, .. } = a.lerp(b, 0.25) else {
            panic!("oklch pair should stay oklch");
        };
        assert!((h - 355.0).abs() < 1e-3, "hue was {h}");
    }

    #[test]
    fn mixed_encodings_blend_in_rgb() {
        let a = Color::parse("#000000").unwrap();
        let b = Color::parse("oklch(1 0 0)").unwrap();
        let Color::Rgb(mid) = a.lerp(b, 0.5) else {
            panic!("mixed pair should fall back to rgb");
        };
        assert!((mid - Vec3::splat(0.5)).abs().max_element() < 1e-2);
    }

    #[test]
    fn hex_round_trips_through_serde() {
        let color: Color = serde_json::from_str("\"#2e5f36\"").unwrap();
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#2e5f36\"");
    }
}
