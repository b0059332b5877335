//! Tints for figures, territory rings, and feed lines.
//!
//! Status, category, and theme tints are fixed total mappings so every
//! enum value renders somehow. Group tints are derived from the group
//! name's hash, which keeps a tribe's color stable across sessions
//! without any registry of known tribes.

use lifescope_types::{AgentStatus, EventCategory, EventTheme, GroupName};
use serde::{Deserialize, Serialize};

use crate::hash::{hash_bytes, unit};

/// An RGB color with unit-range channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    /// Red channel, `0..=1`.
    pub r: f64,
    /// Green channel, `0..=1`.
    pub g: f64,
    /// Blue channel, `0..=1`.
    pub b: f64,
}

impl Tint {
    /// Create a tint from unit-range channels.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// CSS hex form, `#rrggbb`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // channels are clamped to the unit range before the byte casts
    pub fn css(self) -> String {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

/// Figure tint for an agent's activity status.
pub const fn status_tint(status: AgentStatus) -> Tint {
    match status {
        AgentStatus::Active => Tint::new(0.36, 0.78, 0.44),
        AgentStatus::Resting => Tint::new(0.88, 0.69, 0.32),
        AgentStatus::Exploring => Tint::new(0.38, 0.60, 0.92),
        AgentStatus::Unknown => Tint::new(0.62, 0.62, 0.64),
    }
}

/// Feed-line tint for an event category.
pub const fn category_tint(category: EventCategory) -> Tint {
    match category {
        EventCategory::Birth => Tint::new(0.95, 0.84, 0.48),
        EventCategory::Conflict => Tint::new(0.87, 0.33, 0.30),
        EventCategory::Celebration => Tint::new(0.92, 0.52, 0.72),
        EventCategory::Discovery => Tint::new(0.33, 0.76, 0.72),
    }
}

/// Accent tint for a deep-life theme.
pub const fn theme_tint(theme: EventTheme) -> Tint {
    match theme {
        EventTheme::Romance => Tint::new(0.93, 0.45, 0.58),
        EventTheme::Family => Tint::new(0.89, 0.66, 0.37),
        EventTheme::Emotional => Tint::new(0.64, 0.48, 0.88),
        EventTheme::Purpose => Tint::new(0.90, 0.78, 0.34),
    }
}

/// Territory tint for a group, derived from the group name's hash.
pub fn group_tint(group: &GroupName) -> Tint {
    let hue = unit(hash_bytes(group.as_str().as_bytes()));
    hsv(hue, 0.55, 0.85)
}

/// Convert a hue-saturation-value triple (all unit range) to RGB.
fn hsv(h: f64, s: f64, v: f64) -> Tint {
    let sector = (h * 6.0).rem_euclid(6.0);
    let c = v * s;
    let x = c * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = if sector < 1.0 {
        (c, x, 0.0)
    } else if sector < 2.0 {
        (x, c, 0.0)
    } else if sector < 3.0 {
        (0.0, c, x)
    } else if sector < 4.0 {
        (0.0, x, c)
    } else if sector < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };
    Tint::new(r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_formats_clamped_bytes() {
        assert_eq!(Tint::new(1.0, 0.0, 0.5).css(), "#ff0080");
        assert_eq!(Tint::new(2.0, -1.0, 0.0).css(), "#ff0000");
    }

    #[test]
    fn group_tints_are_stable_and_distinct() {
        let storm = GroupName::from("Storm Tribe");
        let river = GroupName::from("River Clan");
        assert_eq!(group_tint(&storm), group_tint(&storm));
        assert_ne!(group_tint(&storm), group_tint(&river));
    }

    #[test]
    fn group_tints_stay_in_range() {
        for name in ["Storm Tribe", "River Clan", "Ash Walkers", "Independent"] {
            let tint = group_tint(&GroupName::from(name));
            for channel in [tint.r, tint.g, tint.b] {
                assert!((0.0..=1.0).contains(&channel), "{name}: {channel}");
            }
        }
    }

    #[test]
    fn status_tints_are_distinct() {
        let tints = [
            status_tint(AgentStatus::Active),
            status_tint(AgentStatus::Resting),
            status_tint(AgentStatus::Exploring),
            status_tint(AgentStatus::Unknown),
        ];
        for (i, a) in tints.iter().enumerate() {
            for b in tints.iter().skip(i.saturating_add(1)) {
                assert_ne!(a, b);
            }
        }
    }
}
