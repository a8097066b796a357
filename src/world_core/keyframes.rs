use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::world_core::color::{lerp, Color};

/// Seconds spent blending from one keyframe into the next.
pub const DEFAULT_KEYFRAME_DURATION: f32 = 20.0;

/// Largest `f32` strictly below 1.0.
const MAX_BLEND: f32 = 1.0 - f32::EPSILON / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightKeyframe {
    pub color: Color,
    pub intensity: f32,
}

impl LightKeyframe {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            color: self.color.lerp(other.color, t),
            intensity: lerp(self.intensity, other.intensity, t),
        }
    }
}

/// Environment snapshot: lights, backdrop brightness and sky color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub ambient_light: LightKeyframe,
    pub directional_light: LightKeyframe,
    pub clouds_brightness: f32,
    pub mountains_brightness: f32,
    pub sky_color: Color,
}

impl Keyframe {
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            ambient_light: self.ambient_light.lerp(&other.ambient_light, t),
            directional_light: self.directional_light.lerp(&other.directional_light, t),
            clouds_brightness: lerp(self.clouds_brightness, other.clouds_brightness, t),
            mountains_brightness: lerp(self.mountains_brightness, other.mountains_brightness, t),
            sky_color: self.sky_color.lerp(other.sky_color, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframePosition {
    pub index: usize,
    pub next: usize,
    pub blend: f32,
}

/// Maps elapsed seconds onto the cyclic keyframe sequence.
///
/// `count` must be non-zero and `duration` positive; [`KeyframeCycle`]
/// enforces both.
pub fn keyframe_position(elapsed: f64, duration: f32, count: usize) -> KeyframePosition {
    if count == 0 || duration <= 0.0 {
        return KeyframePosition {
            index: 0,
            next: 0,
            blend: 0.0,
        };
    }

    let duration = f64::from(duration);
    let total = count as f64 * duration;
    let time = elapsed.rem_euclid(total);

    let index = ((time / duration).floor() as usize).min(count - 1);
    let next = (index + 1) % count;
    let blend = ((time % duration) / duration) as f32;

    KeyframePosition {
        index,
        next,
        blend: blend.clamp(0.0, MAX_BLEND),
    }
}

#[derive(Debug, Clone)]
pub struct KeyframeCycle {
    frames: Vec<Keyframe>,
    duration: f32,
}

impl KeyframeCycle {
    pub fn new(frames: Vec<Keyframe>, duration: f32) -> Result<Self> {
        if frames.is_empty() {
            bail!("keyframe cycle needs at least one keyframe");
        }
        if !(duration.is_finite() && duration > 0.0) {
            bail!("keyframe duration must be positive, got {duration}");
        }
        Ok(Self { frames, duration })
    }

    pub fn position(&self, elapsed: f64) -> KeyframePosition {
        keyframe_position(elapsed, self.duration, self.frames.len())
    }

    pub fn sample(&self, elapsed: f64) -> Keyframe {
        let p = self.position(elapsed);
        self.frames[p.index].lerp(&self.frames[p.next], p.blend)
    }

    #[cfg(test)]
    pub fn frames(&self) -> &[Keyframe] {
        &self.frames
    }
}

impl Default for KeyframeCycle {
    fn default() -> Self {
        Self {
            frames: default_keyframes(),
            duration: DEFAULT_KEYFRAME_DURATION,
        }
    }
}

fn light(hex: &str, intensity: f32) -> LightKeyframe {
    LightKeyframe {
        color: Color::parse(hex).unwrap_or(Color::WHITE),
        intensity,
    }
}

fn sky(l: f32, c: f32, h: f32) -> Color {
    Color::Oklch { l, c, h }
}

/// Mid-day, sunset, night, sunrise.
pub fn default_keyframes() -> Vec<Keyframe> {
    vec![
        Keyframe {
            ambient_light: light("#FFFFFF", 0.5),
            directional_light: light("#FFFFFF", 5.0),
            clouds_brightness: 1.0,
            mountains_brightness: 1.0,
            sky_color: sky(0.83, 0.10, 230.0),
        },
        Keyframe {
            ambient_light: light("#FFD1A1", 0.38),
            directional_light: light("#FF8C42", 2.0),
            clouds_brightness: 0.4,
            mountains_brightness: 0.4,
            sky_color: sky(0.72, 0.17, 13.0),
        },
        Keyframe {
            ambient_light: light("#335577", 0.2),
            directional_light: light("#6CA0DC", 1.0),
            clouds_brightness: 0.05,
            mountains_brightness: 0.05,
            sky_color: sky(0.26, 0.09, 281.0),
        },
        Keyframe {
            ambient_light: light("#FFE4B2", 0.45),
            directional_light: light("#FFD580", 2.5),
            clouds_brightness: 0.4,
            mountains_brightness: 0.4,
            sky_color: sky(0.42, 0.18, 266.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::{default_keyframes, keyframe_position, KeyframeCycle};
    use crate::world_core::color::Color;

    #[test]
    fn blend_stays_in_unit_interval() {
        let mut t = 0.0f64;
        while t < 400.0 {
            let p = keyframe_position(t, 20.0, 4);
            assert!((0.0..1.0).contains(&p.blend), "blend {} at t={t}", p.blend);
            assert!(p.index < 4);
            assert_eq!(p.next, (p.index + 1) % 4);
            t += 0.37;
        }

        // Just below a boundary, where the division can round up.
        let p = keyframe_position(80.0 - 1e-12, 20.0, 4);
        assert!(p.blend < 1.0);
        assert_eq!(p.index, 3);
    }

    #[test]
    fn boundaries_land_exactly_on_keyframes() {
        let cycle = KeyframeCycle::new(default_keyframes(), 20.0).unwrap();
        for k in 0..12u32 {
            let t = f64::from(k) * 20.0;
            let sampled = cycle.sample(t);
            assert_eq!(sampled, cycle.frames()[k as usize % 4], "k={k}");
        }
    }

    #[test]
    fn midpoint_blends_scalars_linearly() {
        let cycle = KeyframeCycle::default();
        let mid = cycle.sample(10.0);
        // Mid-day -> sunset
        assert!((mid.clouds_brightness - 0.7).abs() < 1e-6);
        assert!((mid.directional_light.intensity - 3.5).abs() < 1e-6);

        // Hue 230 -> 13 wraps through 301.5
        let Color::Oklch { h, .. } = mid.sky_color else {
            panic!("sky should stay oklch");
        };
        assert!((h - 301.5).abs() < 1e-3, "hue was {h}");
    }

    #[test]
    fn wraps_after_a_full_cycle() {
        let cycle = KeyframeCycle::default();
        let p = cycle.position(85.0);
        assert_eq!((p.index, p.next), (0, 1));
        assert!((p.blend - 0.25).abs() < 1e-6);

        let last = cycle.position(70.0);
        assert_eq!((last.index, last.next), (3, 0));
    }

    #[test]
    fn rejects_empty_or_zero_duration() {
        assert!(KeyframeCycle::new(Vec::new(), 20.0).is_err());
        assert!(KeyframeCycle::new(default_keyframes(), 0.0).is_err());
    }
}
