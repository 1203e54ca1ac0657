use serde::{Deserialize, Serialize};

// ── Newtypes ────────────────────────────────────────────────────────

/// Spin energy ("RPM") — the depleting vitality of a top. Always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Rpm(pub f32);

impl Rpm {
    pub fn new(v: f32) -> Self {
        debug_assert!(v.is_finite(), "Rpm must be finite");
        Self(v.max(0.0))
    }

    pub fn add_clamped(self, delta: f32, max: f32) -> Self {
        let v = (self.0 + delta).clamp(0.0, max);
        debug_assert!(v.is_finite());
        Self(v)
    }

    pub fn sub_clamped(self, delta: f32) -> Self {
        let v = (self.0 - delta).max(0.0);
        debug_assert!(v.is_finite());
        Self(v)
    }

    pub fn is_spinning(self) -> bool {
        self.0 > 0.0
    }
}

/// Duration in seconds. Always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Seconds(pub f32);

impl Seconds {
    pub fn new(v: f32) -> Self {
        Self(v.max(0.0))
    }

    /// Decrement by dt, clamped to 0.
    pub fn dec(self, dt: f32) -> Self {
        Self((self.0 - dt).max(0.0))
    }

    pub fn is_expired(self) -> bool {
        self.0 <= 0.0
    }
}

// ── Archetypes ──────────────────────────────────────────────────────

/// Chassis archetype. Fixes the speed-cap table at profile level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Attack,
    Defense,
    Agility,
    Balanced,
}

/// Horizontal speed ceilings per archetype, plus the rate at which an
/// over-cap body is blended back under its ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedCaps {
    /// Baseline ceiling for normal movement.
    pub normal: f32,
    /// Temporary ceiling after a dash.
    pub dash: f32,
    /// Temporary ceiling after an attack.
    pub attack: f32,
    /// Blend rate for the over-cap velocity correction.
    pub decay: f32,
}

impl Archetype {
    pub fn speed_caps(self) -> SpeedCaps {
        match self {
            Archetype::Agility => SpeedCaps {
                normal: 10.0,
                dash: 18.0,
                attack: 14.0,
                decay: 3.0,
            },
            Archetype::Attack => SpeedCaps {
                normal: 8.0,
                dash: 15.0,
                attack: 13.0,
                decay: 2.0,
            },
            Archetype::Defense => SpeedCaps {
                normal: 6.0,
                dash: 12.0,
                attack: 10.0,
                decay: 1.5,
            },
            Archetype::Balanced => SpeedCaps {
                normal: 7.0,
                dash: 14.0,
                attack: 11.0,
                decay: 2.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpm_never_negative() {
        let rpm = Rpm::new(5.0).sub_clamped(10.0);
        assert_eq!(rpm, Rpm(0.0));
        assert!(!rpm.is_spinning());
    }

    #[test]
    fn rpm_add_respects_max() {
        let rpm = Rpm::new(90.0).add_clamped(50.0, 100.0);
        assert_eq!(rpm, Rpm(100.0));
        let rpm = rpm.add_clamped(-150.0, 100.0);
        assert_eq!(rpm, Rpm(0.0));
    }

    #[test]
    fn seconds_countdown() {
        let t = Seconds::new(0.25);
        let t = t.dec(0.1);
        assert!(!t.is_expired());
        let t = t.dec(0.2);
        assert!(t.is_expired());
        assert_eq!(t.0, 0.0);
    }

    #[test]
    fn archetype_caps_are_ordered() {
        for archetype in [
            Archetype::Attack,
            Archetype::Defense,
            Archetype::Agility,
            Archetype::Balanced,
        ] {
            let caps = archetype.speed_caps();
            assert!(caps.normal < caps.attack);
            assert!(caps.attack < caps.dash);
            assert!(caps.decay > 0.0);
        }
    }
}
