use bevy::math::FloatExt;
use bevy::prelude::*;

use super::stats::profile::StatProfile;
use super::stats::types::{Rpm, Seconds, SpeedCaps};

// ── Marker components ───────────────────────────────────────────────

#[derive(Component)]
pub struct Top;

/// Registration order within the match. Drives deterministic tie-breaks.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantIndex(pub usize);

/// Shared, read-only configuration for this body.
#[derive(Component, Debug, Clone)]
pub struct TopProfile(pub StatProfile);

// ── Top runtime state ───────────────────────────────────────────────

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct SpinRpm(pub Rpm);

/// Special-power meter in [0, 1]. Charges from charges spent attacking
/// and from rpm damage taken.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SpecialMeter(pub f32);

/// Consumable attack resource. Fractional while recovering.
#[derive(Component, Debug, Clone, Copy)]
pub struct AttackCharges {
    pub current: f32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopState {
    Active,
    Charging,
    Attacking,
    Defeated,
}

impl TopState {
    pub fn accepts_movement(self) -> bool {
        matches!(self, TopState::Active | TopState::Charging)
    }

    /// Begin holding a charged attack. Only valid from Active.
    pub fn begin_charging(&mut self) -> bool {
        if *self == TopState::Active {
            *self = TopState::Charging;
            true
        } else {
            false
        }
    }

    /// Release a held charge without attacking.
    pub fn release_charge(&mut self) -> bool {
        if *self == TopState::Charging {
            *self = TopState::Active;
            true
        } else {
            false
        }
    }
}

/// Countdown from the Attacking state back to Active.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AttackRecovery(pub Seconds);

/// Instantaneous horizontal speed ceiling with a re-triggerable,
/// eased boost. A new boost overwrites the old one outright.
#[derive(Component, Debug, Clone, Copy)]
pub struct SpeedCap {
    pub current: f32,
    pub baseline: f32,
    boosted: f32,
    boost_remaining: Seconds,
    boost_duration: f32,
}

impl SpeedCap {
    pub fn from_caps(caps: &SpeedCaps) -> Self {
        Self {
            current: caps.normal,
            baseline: caps.normal,
            boosted: caps.normal,
            boost_remaining: Seconds::default(),
            boost_duration: 0.0,
        }
    }

    /// Raise the ceiling for `duration` seconds. Last write wins.
    pub fn trigger_boost(&mut self, ceiling: f32, duration: f32) {
        self.boosted = ceiling;
        self.current = ceiling;
        self.boost_remaining = Seconds::new(duration);
        self.boost_duration = duration.max(f32::EPSILON);
    }

    /// Ease the ceiling back toward baseline; snap on expiry.
    pub fn tick(&mut self, dt: f32) {
        if self.boost_remaining.is_expired() {
            return;
        }
        self.boost_remaining = self.boost_remaining.dec(dt);
        if self.boost_remaining.is_expired() {
            self.current = self.baseline;
        } else {
            let progress = 1.0 - self.boost_remaining.0 / self.boost_duration;
            let eased = progress * progress * (3.0 - 2.0 * progress);
            self.current = self.boosted.lerp(self.baseline, eased);
        }
    }

    pub fn boost_active(&self) -> bool {
        !self.boost_remaining.is_expired()
    }
}

/// Rigid-body mass. `base` is the profile mass and is the restore
/// target: bumps set `current` absolutely, so overlapping bumps cannot
/// drift the restored value.
#[derive(Component, Debug, Clone, Copy)]
pub struct BodyMass {
    pub current: f32,
    pub base: f32,
}

impl BodyMass {
    pub fn new(base: f32) -> Self {
        Self {
            current: base,
            base,
        }
    }
}

/// Countdown for a temporary attack mass bump.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MassBump {
    pub remaining: Seconds,
}

impl MassBump {
    pub fn trigger(&mut self, window: f32) {
        self.remaining = Seconds::new(window);
    }

    /// Tick down; on expiry restore the exact base mass.
    pub fn tick(&mut self, mass: &mut BodyMass, dt: f32) {
        if self.remaining.is_expired() {
            return;
        }
        self.remaining = self.remaining.dec(dt);
        if self.remaining.is_expired() {
            mass.current = mass.base;
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Velocity(pub Vec3);

#[derive(Component, Debug, Clone, Copy)]
pub struct AngularVelocity(pub Vec3);

/// Display-side spin speed smoothed toward actual rpm. Not gameplay
/// relevant.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct VisualSpin(pub f32);

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Invulnerability {
    pub remaining: Seconds,
}

impl Invulnerability {
    pub fn is_active(&self) -> bool {
        !self.remaining.is_expired()
    }
}

/// Input intent: written by the input collaborator in Update, consumed
/// once per FixedUpdate tick, then cleared.
#[derive(Component, Debug, Clone, Default)]
pub struct Intent {
    /// Desired movement direction (normalized or zero).
    pub move_dir: Vec2,
    /// Attack request with charge fraction in [0, 1].
    pub attack: Option<f32>,
    /// Dash request; zero direction dashes along current forward.
    pub dash: Option<Vec2>,
    /// Spend a full special meter.
    pub special: bool,
}

// ── Contact rate limiting ───────────────────────────────────────────

/// Tracks per-opponent contact cooldowns so one physical contact that
/// spans several substeps resolves only once.
#[derive(Component, Default)]
pub struct ContactCooldowns {
    /// (opponent entity, time until contact may re-trigger)
    pub cooldowns: Vec<(Entity, f32)>,
}

impl ContactCooldowns {
    pub fn can_contact(&self, other: Entity) -> bool {
        !self.cooldowns.iter().any(|(e, t)| *e == other && *t > 0.0)
    }

    pub fn register_contact(&mut self, other: Entity, cooldown: f32) {
        self.cooldowns.push((other, cooldown));
    }

    pub fn tick(&mut self, dt: f32) {
        for (_, t) in &mut self.cooldowns {
            *t -= dt;
        }
        self.cooldowns.retain(|(_, t)| *t > 0.0);
    }
}

// ── Shared state mutation helpers ───────────────────────────────────

/// Terminal defeat transition. Idempotent: a body that is already
/// Defeated is left untouched and the call reports false.
pub fn apply_defeat(
    state: &mut TopState,
    rpm: &mut SpinRpm,
    velocity: &mut Velocity,
    angular: &mut AngularVelocity,
    cap: &mut SpeedCap,
) -> bool {
    if *state == TopState::Defeated {
        return false;
    }
    *state = TopState::Defeated;
    rpm.0 = Rpm(0.0);
    velocity.0 *= 0.1;
    angular.0 *= 0.1;
    cap.current = 0.0;
    cap.baseline = 0.0;
    cap.boosted = 0.0;
    cap.boost_remaining = Seconds::default();
    true
}

/// Damage-path rpm mutation: clamps to [0, max] and charges the special
/// meter from damage taken. Returns true when the change depleted the
/// body (caller performs the defeat transition). Plain drains (decay,
/// dash cost) use `Rpm::sub_clamped` directly and skip the meter.
pub fn modify_rpm(
    rpm: &mut SpinRpm,
    meter: &mut SpecialMeter,
    max_rpm: f32,
    delta: f32,
    meter_per_damage: f32,
) -> bool {
    if delta < 0.0 {
        meter.0 = (meter.0 + (-delta) * meter_per_damage).min(1.0);
    }
    rpm.0 = rpm.0.add_clamped(delta, max_rpm);
    !rpm.0.is_spinning()
}

/// Current forward direction projected onto the horizontal plane.
pub fn forward_on_plane(transform: &Transform) -> Vec3 {
    let forward = transform.rotation * Vec3::NEG_Z;
    let flat = Vec3::new(forward.x, 0.0, forward.z);
    if flat.length_squared() > 1e-6 {
        flat.normalize()
    } else {
        Vec3::X
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::stats::types::Archetype;

    #[test]
    fn speed_cap_boost_eases_back_and_snaps() {
        let caps = Archetype::Balanced.speed_caps();
        let mut cap = SpeedCap::from_caps(&caps);
        cap.trigger_boost(caps.dash, 1.0);
        assert_eq!(cap.current, caps.dash);

        cap.tick(0.5);
        assert!(cap.current < caps.dash);
        assert!(cap.current > caps.normal);

        cap.tick(0.6);
        assert_eq!(cap.current, caps.normal);
        assert!(!cap.boost_active());
    }

    #[test]
    fn speed_cap_retrigger_is_last_write_wins() {
        let caps = Archetype::Balanced.speed_caps();
        let mut cap = SpeedCap::from_caps(&caps);
        cap.trigger_boost(caps.dash, 3.0);
        cap.tick(2.5);
        cap.trigger_boost(caps.attack, 3.0);
        assert_eq!(cap.current, caps.attack);
        cap.tick(2.5);
        // The new timer replaced the old one, so the boost is still live.
        assert!(cap.boost_active());
    }

    #[test]
    fn mass_bump_restores_exact_base() {
        let mut mass = BodyMass::new(1.5);
        let mut bump = MassBump::default();
        bump.trigger(0.25);
        mass.current = mass.base + 2.4;

        bump.tick(&mut mass, 0.1);
        assert!(mass.current > mass.base);

        // Overlapping bump resets the window and the absolute value.
        bump.trigger(0.25);
        mass.current = mass.base + 3.1;
        bump.tick(&mut mass, 0.3);
        assert_eq!(mass.current, 1.5);
    }

    #[test]
    fn defeat_is_idempotent() {
        let mut state = TopState::Active;
        let mut rpm = SpinRpm(Rpm::new(500.0));
        let mut vel = Velocity(Vec3::new(10.0, 0.0, 0.0));
        let mut ang = AngularVelocity(Vec3::new(0.0, 4.0, 0.0));
        let mut cap = SpeedCap::from_caps(&Archetype::Attack.speed_caps());

        assert!(apply_defeat(&mut state, &mut rpm, &mut vel, &mut ang, &mut cap));
        assert_eq!(state, TopState::Defeated);
        assert_eq!(rpm.0, Rpm(0.0));
        assert!((vel.0.x - 1.0).abs() < 1e-5);
        assert_eq!(cap.current, 0.0);

        // Second call must not rescale velocity again.
        let settled = vel.0.x;
        assert!(!apply_defeat(&mut state, &mut rpm, &mut vel, &mut ang, &mut cap));
        assert_eq!(vel.0.x, settled);
    }

    #[test]
    fn defeated_state_is_terminal_for_charging() {
        let mut state = TopState::Defeated;
        assert!(!state.begin_charging());
        assert!(!state.release_charge());
        assert_eq!(state, TopState::Defeated);
    }

    #[test]
    fn damage_charges_special_meter() {
        let mut rpm = SpinRpm(Rpm::new(100.0));
        let mut meter = SpecialMeter(0.0);
        let depleted = modify_rpm(&mut rpm, &mut meter, 100.0, -30.0, 0.01);
        assert!(!depleted);
        assert_eq!(rpm.0, Rpm(70.0));
        assert!((meter.0 - 0.3).abs() < 1e-6);

        // Healing does not charge the meter.
        modify_rpm(&mut rpm, &mut meter, 100.0, 10.0, 0.01);
        assert!((meter.0 - 0.3).abs() < 1e-6);
    }

    #[test]
    fn depleting_damage_reports_defeat() {
        let mut rpm = SpinRpm(Rpm::new(5.0));
        let mut meter = SpecialMeter(0.9);
        let depleted = modify_rpm(&mut rpm, &mut meter, 100.0, -20.0, 0.01);
        assert!(depleted);
        assert_eq!(rpm.0, Rpm(0.0));
        assert_eq!(meter.0, 1.0);
    }

    #[test]
    fn contact_cooldowns_gate_and_expire() {
        let mut world = World::new();
        let other = world.spawn_empty().id();
        let mut tracker = ContactCooldowns::default();
        assert!(tracker.can_contact(other));
        tracker.register_contact(other, 0.1);
        assert!(!tracker.can_contact(other));
        tracker.tick(0.2);
        assert!(tracker.can_contact(other));
    }
}
