use bevy::prelude::*;

use crate::config::tuning::Tuning;
use crate::game::components::*;
use crate::game::events::{BoundaryHitMessage, DefeatMessage, KnockoutMessage};

/// BoundarySet: ring-wall and knockout-plane checks, both evaluated
/// every tick for every live body.
///
/// Wall: bounce the body back toward the center, charge the fixed rpm
/// penalty, and reposition it just inside the ring so the same
/// excursion cannot re-trigger next tick.
///
/// Knockout: falling below the knockout plane defeats the body outright
/// regardless of remaining spin energy.
pub fn enforce_boundary(
    tuning: Res<Tuning>,
    mut query: Query<
        (
            Entity,
            &mut Transform,
            &mut Velocity,
            &mut AngularVelocity,
            &mut SpinRpm,
            &mut SpecialMeter,
            &mut TopState,
            &mut SpeedCap,
            &BodyMass,
            &Invulnerability,
            &TopProfile,
        ),
        With<Top>,
    >,
    mut boundary_hits: MessageWriter<BoundaryHitMessage>,
    mut knockouts: MessageWriter<KnockoutMessage>,
    mut defeats: MessageWriter<DefeatMessage>,
) {
    for (
        entity,
        mut transform,
        mut velocity,
        mut angular,
        mut rpm,
        mut meter,
        mut state,
        mut cap,
        mass,
        invuln,
        profile,
    ) in &mut query
    {
        if *state == TopState::Defeated {
            continue;
        }

        let horizontal = Vec2::new(transform.translation.x, transform.translation.z);
        let dist = horizontal.length();

        // Floor support inside the ring. Only shallow penetration is
        // caught; a body already deep under the surface keeps falling.
        if dist <= tuning.arena_radius
            && transform.translation.y < 0.0
            && transform.translation.y >= -profile.0.radius
        {
            transform.translation.y = 0.0;
            velocity.0.y = velocity.0.y.max(0.0);
        }

        if dist > tuning.arena_radius {
            let outward = Vec3::new(horizontal.x / dist, 0.0, horizontal.y / dist);
            let bounce = (outward + Vec3::Y * tuning.wall_pop) * tuning.bounce_force;
            velocity.0 += bounce / mass.current;

            if !invuln.is_active()
                && modify_rpm(
                    &mut rpm,
                    &mut meter,
                    profile.0.max_rpm,
                    -tuning.boundary_damage,
                    tuning.special_from_damage,
                )
                && apply_defeat(&mut state, &mut rpm, &mut velocity, &mut angular, &mut cap)
            {
                info!("top {entity} shattered against the wall");
                defeats.write(DefeatMessage { body: entity });
            }

            let position = transform.translation;
            let inside = tuning.arena_radius - tuning.boundary_epsilon;
            transform.translation.x = outward.x * inside;
            transform.translation.z = outward.z * inside;

            boundary_hits.write(BoundaryHitMessage {
                body: entity,
                position,
            });
        }

        if tuning.knockout_enabled
            && transform.translation.y < tuning.knockout_height
            && *state != TopState::Defeated
            && apply_defeat(&mut state, &mut rpm, &mut velocity, &mut angular, &mut cap)
        {
            info!("top {entity} was knocked out of the arena");
            knockouts.write(KnockoutMessage { body: entity });
            defeats.write(DefeatMessage { body: entity });
        }
    }
}
