use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{Archetype, SpeedCaps};

/// Immutable per-top configuration. Shared read-only by the body that
/// carries it; runtime state (rpm, charges, caps) lives on components.
///
/// Presets deserialize from RON; `validate` runs after deserialization
/// and before any body is spawned from the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatProfile {
    pub name: String,
    pub archetype: Archetype,
    pub mass: f32,
    pub radius: f32,
    pub max_rpm: f32,
    /// Baseline energy lost per second. 0 for non-attrition modes.
    pub rpm_decay_rate: f32,
    pub attack_power: f32,
    pub defense: f32,
    pub max_attack_charges: u32,
    /// Seconds to recover one attack charge.
    pub charge_recovery_time: f32,
    pub movement_speed: f32,
    pub dash_power: f32,
    /// Rpm deducted per dash.
    pub dash_cost: f32,
}

impl Default for StatProfile {
    fn default() -> Self {
        Self {
            name: "standard".into(),
            archetype: Archetype::Balanced,
            mass: 1.0,
            radius: 0.5,
            max_rpm: 1000.0,
            rpm_decay_rate: 10.0,
            attack_power: 8.0,
            defense: 30.0,
            max_attack_charges: 3,
            charge_recovery_time: 2.0,
            movement_speed: 10.0,
            dash_power: 10.0,
            dash_cost: 50.0,
        }
    }
}

/// Rejected profile construction. Out-of-range values are a caller bug,
/// so spawning refuses rather than clamping.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    NonPositive { field: &'static str, value: f32 },
    Negative { field: &'static str, value: f32 },
    NoAttackCharges,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::NonPositive { field, value } => {
                write!(f, "profile field `{field}` must be > 0, got {value}")
            }
            ProfileError::Negative { field, value } => {
                write!(f, "profile field `{field}` must be >= 0, got {value}")
            }
            ProfileError::NoAttackCharges => {
                write!(f, "profile must allow at least one attack charge")
            }
        }
    }
}

impl Error for ProfileError {}

impl StatProfile {
    pub fn validate(&self) -> Result<(), ProfileError> {
        let positive = [
            ("mass", self.mass),
            ("radius", self.radius),
            ("max_rpm", self.max_rpm),
            ("charge_recovery_time", self.charge_recovery_time),
        ];
        for (field, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ProfileError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("rpm_decay_rate", self.rpm_decay_rate),
            ("attack_power", self.attack_power),
            ("defense", self.defense),
            ("movement_speed", self.movement_speed),
            ("dash_power", self.dash_power),
            ("dash_cost", self.dash_cost),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ProfileError::Negative { field, value });
            }
        }

        if self.max_attack_charges < 1 {
            return Err(ProfileError::NoAttackCharges);
        }

        Ok(())
    }

    /// Speed-cap table for this profile's archetype. Fixed at profile
    /// level; instance-level caps are copies.
    pub fn speed_caps(&self) -> SpeedCaps {
        self.archetype.speed_caps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        assert_eq!(StatProfile::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_mass() {
        let profile = StatProfile {
            mass: 0.0,
            ..Default::default()
        };
        assert_eq!(
            profile.validate(),
            Err(ProfileError::NonPositive {
                field: "mass",
                value: 0.0
            })
        );
    }

    #[test]
    fn rejects_nan_fields() {
        let profile = StatProfile {
            max_rpm: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::NonPositive { field: "max_rpm", .. })
        ));
    }

    #[test]
    fn rejects_negative_decay() {
        let profile = StatProfile {
            rpm_decay_rate: -1.0,
            ..Default::default()
        };
        assert_eq!(
            profile.validate(),
            Err(ProfileError::Negative {
                field: "rpm_decay_rate",
                value: -1.0
            })
        );
    }

    #[test]
    fn rejects_zero_charges() {
        let profile = StatProfile {
            max_attack_charges: 0,
            ..Default::default()
        };
        assert_eq!(profile.validate(), Err(ProfileError::NoAttackCharges));
    }

    #[test]
    fn zero_decay_is_allowed() {
        let profile = StatProfile {
            rpm_decay_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(profile.validate(), Ok(()));
    }

    #[test]
    fn caps_follow_archetype() {
        let profile = StatProfile {
            archetype: Archetype::Agility,
            ..Default::default()
        };
        assert_eq!(profile.speed_caps(), Archetype::Agility.speed_caps());
    }
}
