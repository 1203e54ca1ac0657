use bevy::prelude::*;

use super::components::*;
use super::events::DefeatMessage;
use crate::config::tuning::Tuning;

/// PhysicsSet: gravity + damping, velocity → translation, angular
/// velocity → rotation. This is the integrator step the rest of the
/// tick builds on.
pub fn integrate_bodies(
    tuning: Res<Tuning>,
    mut query: Query<(&mut Transform, &mut Velocity, &mut AngularVelocity), With<Top>>,
) {
    let dt = tuning.dt;
    for (mut transform, mut velocity, mut angular) in &mut query {
        velocity.0.y -= tuning.gravity * dt;
        velocity.0 *= 1.0 / (1.0 + tuning.linear_damping * dt);
        angular.0 *= 1.0 / (1.0 + tuning.angular_damping * dt);

        transform.translation += velocity.0 * dt;
        if angular.0.length_squared() > 1e-10 {
            transform.rotation = (Quat::from_scaled_axis(angular.0 * dt) * transform.rotation)
                .normalize();
        }
    }
}

/// PhysicsSet: gyroscopic resistance proportional to spin energy.
/// A stopped top gets no gyroscopic help.
pub fn apply_gyroscopic_torque(
    tuning: Res<Tuning>,
    mut query: Query<(&SpinRpm, &mut AngularVelocity), With<Top>>,
) {
    let dt = tuning.dt;
    for (rpm, mut angular) in &mut query {
        if !rpm.0.is_spinning() {
            continue;
        }
        let angular_momentum = Vec3::Y * rpm.0.0;
        let mut torque = angular.0.cross(angular_momentum) * tuning.gyro_force * 0.01;
        // Never fight the spin axis itself.
        torque.y = 0.0;
        angular.0 += torque * dt;
    }
}

/// PhysicsSet: corrective torque once tilt exceeds the deadband, scaled
/// by how far past the threshold the body leans. Intentional tilts from
/// collisions inside the deadband are left alone.
pub fn apply_tilt_correction(
    tuning: Res<Tuning>,
    mut query: Query<(&Transform, &mut AngularVelocity), With<Top>>,
) {
    let dt = tuning.dt;
    for (transform, mut angular) in &mut query {
        let up = transform.rotation * Vec3::Y;
        let tilt_degrees = up.angle_between(Vec3::Y).to_degrees();
        if tilt_degrees <= tuning.max_tilt_degrees {
            continue;
        }

        let mut axis = up.cross(Vec3::Y);
        axis.y = 0.0;
        if axis.length_squared() < 1e-10 {
            continue;
        }

        let excess = (tilt_degrees - tuning.max_tilt_degrees).to_radians();
        let torque =
            axis.normalize() * (excess * tuning.stabilization_force * tuning.stabilization_smoothing);
        angular.0 += torque * dt;
    }
}

/// PhysicsSet: natural spin drain. Crossing zero defeats the body.
pub fn spin_decay(
    tuning: Res<Tuning>,
    mut query: Query<
        (
            Entity,
            &TopProfile,
            &mut SpinRpm,
            &mut TopState,
            &mut Velocity,
            &mut AngularVelocity,
            &mut SpeedCap,
        ),
        With<Top>,
    >,
    mut defeats: MessageWriter<DefeatMessage>,
) {
    let dt = tuning.dt;
    for (entity, profile, mut rpm, mut state, mut velocity, mut angular, mut cap) in &mut query {
        if *state == TopState::Defeated {
            continue;
        }
        rpm.0 = rpm.0.sub_clamped(profile.0.rpm_decay_rate * dt);
        if !rpm.0.is_spinning()
            && apply_defeat(&mut state, &mut rpm, &mut velocity, &mut angular, &mut cap)
        {
            info!("top {entity} spun out");
            defeats.write(DefeatMessage { body: entity });
        }
    }
}

/// PhysicsSet: blend the display-side spin speed toward actual rpm.
pub fn smooth_visual_spin(
    tuning: Res<Tuning>,
    mut query: Query<(&SpinRpm, &mut VisualSpin), With<Top>>,
) {
    let blend = (tuning.dt * tuning.visual_spin_smoothing).min(1.0);
    for (rpm, mut visual) in &mut query {
        visual.0 += (rpm.0.0 - visual.0) * blend;
    }
}

/// PhysicsSet: blend over-cap horizontal velocity back under the
/// ceiling. Vertical velocity is never touched.
pub fn limit_speed(
    tuning: Res<Tuning>,
    mut query: Query<(&mut Velocity, &SpeedCap, &TopProfile), With<Top>>,
) {
    let dt = tuning.dt;
    for (mut velocity, cap, profile) in &mut query {
        let horizontal = Vec3::new(velocity.0.x, 0.0, velocity.0.z);
        let speed = horizontal.length();
        if speed <= cap.current {
            continue;
        }

        let capped = if cap.current > 0.0 {
            horizontal * (cap.current / speed)
        } else {
            Vec3::ZERO
        };
        let target = Vec3::new(capped.x, velocity.0.y, capped.z);
        let blend = (dt * profile.0.speed_caps().decay).min(1.0);
        velocity.0 = velocity.0.lerp(target, blend);
    }
}

/// PhysicsSet: countdown timers for speed boosts, mass bumps,
/// invulnerability, and attack recovery.
pub fn tick_effect_timers(
    tuning: Res<Tuning>,
    mut query: Query<
        (
            &mut SpeedCap,
            &mut MassBump,
            &mut BodyMass,
            &mut Invulnerability,
            &mut AttackRecovery,
            &mut TopState,
        ),
        With<Top>,
    >,
) {
    let dt = tuning.dt;
    for (mut cap, mut bump, mut mass, mut invuln, mut recovery, mut state) in &mut query {
        cap.tick(dt);
        bump.tick(&mut mass, dt);
        invuln.remaining = invuln.remaining.dec(dt);

        if *state == TopState::Attacking {
            recovery.0 = recovery.0.dec(dt);
            if recovery.0.is_expired() {
                *state = TopState::Active;
            }
        }
    }
}

/// PhysicsSet: gradual attack-charge recovery up to the profile cap.
pub fn recover_charges(
    tuning: Res<Tuning>,
    mut query: Query<(&mut AttackCharges, &TopProfile, &TopState), With<Top>>,
) {
    let dt = tuning.dt;
    for (mut charges, profile, state) in &mut query {
        if *state == TopState::Defeated {
            continue;
        }
        let max = profile.0.max_attack_charges as f32;
        charges.current = (charges.current + dt / profile.0.charge_recovery_time).min(max);
    }
}

/// PhysicsSet: tick contact rate-limit windows.
pub fn tick_contact_cooldowns(
    tuning: Res<Tuning>,
    mut query: Query<&mut ContactCooldowns, With<Top>>,
) {
    let dt = tuning.dt;
    for mut tracker in &mut query {
        tracker.tick(dt);
    }
}
