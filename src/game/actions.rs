use bevy::prelude::*;

use super::components::*;
use super::events::{AttackMessage, DashMessage, DefeatMessage, SpecialMessage};
use super::stats::types::Seconds;
use crate::config::tuning::Tuning;

/// Force factor for movement near the speed cap: full force within the
/// cap, fading linearly to zero as the projected speed approaches twice
/// the cap. Smooth approach instead of an abrupt clip.
pub(crate) fn movement_force_scale(projected_speed: f32, cap: f32) -> f32 {
    if cap <= f32::EPSILON {
        return 0.0;
    }
    if projected_speed <= cap {
        1.0
    } else {
        (2.0 - projected_speed / cap).clamp(0.0, 1.0)
    }
}

/// ActionSet: steer bodies from movement intent.
pub fn apply_movement(
    tuning: Res<Tuning>,
    mut query: Query<(&Intent, &TopState, &mut Velocity, &SpeedCap, &TopProfile), With<Top>>,
) {
    let dt = tuning.dt;
    for (intent, state, mut velocity, cap, profile) in &mut query {
        if !state.accepts_movement() {
            continue;
        }
        let dir = intent.move_dir.normalize_or_zero();
        if dir == Vec2::ZERO {
            continue;
        }

        let force = Vec3::new(dir.x, 0.0, dir.y) * profile.0.movement_speed;
        let target = velocity.0 + force * dt;
        let projected = Vec3::new(target.x, 0.0, target.z).length();
        let scale = movement_force_scale(projected, cap.current);
        velocity.0 += force * scale * dt;
    }
}

/// ActionSet: execute charged attacks.
pub fn apply_attacks(
    tuning: Res<Tuning>,
    mut query: Query<
        (
            Entity,
            &Intent,
            &Transform,
            &TopProfile,
            &mut TopState,
            &mut AttackCharges,
            &mut SpecialMeter,
            &mut Velocity,
            &mut SpeedCap,
            &mut BodyMass,
            &mut MassBump,
            &mut AttackRecovery,
        ),
        With<Top>,
    >,
    mut attacks: MessageWriter<AttackMessage>,
) {
    for (
        entity,
        intent,
        transform,
        profile,
        mut state,
        mut charges,
        mut meter,
        mut velocity,
        mut cap,
        mut mass,
        mut bump,
        mut recovery,
    ) in &mut query
    {
        let Some(charge) = intent.attack else {
            continue;
        };
        if *state != TopState::Active {
            continue;
        }
        let whole_charges = charges.current.floor();
        if whole_charges < 1.0 {
            continue;
        }

        let charge = charge.clamp(0.0, 1.0);
        let consumed = (charge * charges.current).round().clamp(1.0, whole_charges);
        let power = profile.0.attack_power * (1.0 + charge);

        // Heavier for the duration of the swing. Absolute set against
        // the base mass token, restored exactly when the bump expires.
        mass.current = mass.base + profile.0.attack_power * 0.2 * (1.0 + charge);
        bump.trigger(tuning.mass_bump_window);

        let dir = forward_on_plane(transform);
        velocity.0 += dir * (power / mass.current);

        let caps = profile.0.speed_caps();
        cap.trigger_boost(caps.attack * (1.0 + charge * 0.5), tuning.attack_boost_secs);

        charges.current -= consumed;
        meter.0 = (meter.0 + consumed * tuning.special_per_charge).min(1.0);

        *state = TopState::Attacking;
        recovery.0 = Seconds::new(tuning.attack_recovery_secs);

        attacks.write(AttackMessage {
            body: entity,
            charge,
        });
    }
}

/// ActionSet: execute dashes. The rpm cost is deducted up front; a dash
/// that spends the last of it defeats the body.
pub fn apply_dashes(
    tuning: Res<Tuning>,
    mut query: Query<
        (
            Entity,
            &Intent,
            &Transform,
            &TopProfile,
            &mut TopState,
            &mut SpinRpm,
            &mut Velocity,
            &mut AngularVelocity,
            &mut SpeedCap,
            &BodyMass,
        ),
        With<Top>,
    >,
    mut dashes: MessageWriter<DashMessage>,
    mut defeats: MessageWriter<DefeatMessage>,
) {
    for (
        entity,
        intent,
        transform,
        profile,
        mut state,
        mut rpm,
        mut velocity,
        mut angular,
        mut cap,
        mass,
    ) in &mut query
    {
        let Some(dash_dir) = intent.dash else {
            continue;
        };
        if *state != TopState::Active || rpm.0.0 < profile.0.dash_cost {
            continue;
        }

        rpm.0 = rpm.0.sub_clamped(profile.0.dash_cost);

        let dir = if dash_dir == Vec2::ZERO {
            forward_on_plane(transform)
        } else {
            let d = dash_dir.normalize();
            Vec3::new(d.x, 0.0, d.y)
        };
        velocity.0 += dir * (profile.0.dash_power / mass.current);

        let caps = profile.0.speed_caps();
        cap.trigger_boost(caps.dash, tuning.dash_boost_secs);

        dashes.write(DashMessage { body: entity });

        if !rpm.0.is_spinning()
            && apply_defeat(&mut state, &mut rpm, &mut velocity, &mut angular, &mut cap)
        {
            info!("top {entity} spent its last rpm on a dash");
            defeats.write(DefeatMessage { body: entity });
        }
    }
}

/// ActionSet: spend a full special meter on a burst impulse plus a
/// short invulnerability window.
pub fn apply_specials(
    tuning: Res<Tuning>,
    mut query: Query<
        (
            Entity,
            &Intent,
            &Transform,
            &TopState,
            &mut SpecialMeter,
            &mut Velocity,
            &mut Invulnerability,
            &BodyMass,
        ),
        With<Top>,
    >,
    mut specials: MessageWriter<SpecialMessage>,
) {
    for (entity, intent, transform, state, mut meter, mut velocity, mut invuln, mass) in &mut query
    {
        if !intent.special || *state != TopState::Active || meter.0 < 1.0 {
            continue;
        }

        meter.0 = 0.0;
        let dir = forward_on_plane(transform);
        velocity.0 += dir * (tuning.special_burst_power / mass.current);
        invuln.remaining = Seconds::new(tuning.special_invuln_secs);

        specials.write(SpecialMessage { body: entity });
    }
}

/// ActionSet: drop consumed intents so stale input never repeats.
pub fn clear_intents(mut query: Query<&mut Intent, With<Top>>) {
    for mut intent in &mut query {
        *intent = Intent::default();
    }
}
