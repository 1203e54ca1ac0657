use bevy::math::FloatExt;
use bevy::prelude::*;

use super::components::*;
use super::events::{ContactMessage, DefeatMessage, ImpactMessage};
use super::stats::types::Rpm;
use crate::config::tuning::Tuning;

/// Mutable slice of one body's combat-relevant state, decoupled from
/// the ECS so resolution stays a pure function of its inputs.
pub struct BodyView<'a> {
    pub entity: Entity,
    pub index: usize,
    pub position: Vec3,
    pub mass: f32,
    pub invulnerable: bool,
    pub velocity: &'a mut Vec3,
    pub rpm: &'a mut Rpm,
    pub meter: &'a mut f32,
}

/// What a resolved contact did, for callers and effect collaborators.
#[derive(Debug, Clone, Copy)]
pub struct ImpactOutcome {
    pub stronger: Entity,
    pub weaker: Entity,
    pub damage: f32,
    pub weaker_recoil: f32,
    pub stronger_recoil: f32,
    /// Relative speed normalized for effect scaling.
    pub intensity: f32,
    /// The weaker body's rpm reached zero; caller finishes the defeat.
    pub weaker_depleted: bool,
}

/// Resolve one contact: rank the pair by power (speed × mass), damage
/// the weaker side by the power difference, and recoil both bodies.
///
/// The pair is ordered by participant index before comparison and the
/// comparison is strict, so an exact power tie designates the
/// lower-indexed body as weaker — independent of argument order.
pub fn resolve_contact(
    tuning: &Tuning,
    a: BodyView<'_>,
    b: BodyView<'_>,
    relative_velocity: Vec3,
) -> ImpactOutcome {
    let (first, second) = if a.index <= b.index { (a, b) } else { (b, a) };

    let power_first = first.velocity.length() * first.mass;
    let power_second = second.velocity.length() * second.mass;
    let (stronger, weaker, power_diff) = if power_first > power_second {
        (first, second, power_first - power_second)
    } else {
        (second, first, power_second - power_first)
    };

    let relative_speed = relative_velocity.length();
    let damage = power_diff * tuning.rpm_loss_multiplier / tuning.damage_normalizer;

    // Power difference only punishes the loser.
    let mut weaker_depleted = false;
    if damage > 0.0 && !weaker.invulnerable {
        *weaker.meter = (*weaker.meter + damage * tuning.special_from_damage).min(1.0);
        *weaker.rpm = weaker.rpm.sub_clamped(damage);
        weaker_depleted = !weaker.rpm.is_spinning();
    }

    // Recoil both bodies away from each other along the horizontal line
    // between their centers, the stronger side at 0.6 strength.
    let mut dir = weaker.position - stronger.position;
    dir.y = 0.0;
    let dir = if dir.length_squared() > 1e-10 {
        dir.normalize()
    } else {
        Vec3::X
    };

    let base = tuning.min_recoil.lerp(
        tuning.max_recoil,
        (relative_speed / tuning.recoil_speed_normalizer).clamp(0.0, 1.0),
    );
    let weaker_force =
        base * tuning.recoil_multiplier * (1.0 + tuning.mass_influence / weaker.mass);
    let stronger_force =
        base * tuning.recoil_multiplier * 0.6 * (1.0 + tuning.mass_influence / stronger.mass);

    let mut weaker_impulse = dir * weaker_force;
    weaker_impulse.y = weaker_force * tuning.vertical_recoil_factor;
    let mut stronger_impulse = -dir * stronger_force;
    stronger_impulse.y = stronger_force * tuning.vertical_recoil_factor * 0.5;

    *weaker.velocity += weaker_impulse / weaker.mass;
    *stronger.velocity += stronger_impulse / stronger.mass;

    ImpactOutcome {
        stronger: stronger.entity,
        weaker: weaker.entity,
        damage,
        weaker_recoil: weaker_force,
        stronger_recoil: stronger_force,
        intensity: relative_speed / tuning.impact_normalizer,
        weaker_depleted,
    }
}

/// CombatSet: resolve this tick's contacts against the settled
/// post-integration state.
pub fn resolve_contacts(
    tuning: Res<Tuning>,
    mut contacts: MessageReader<ContactMessage>,
    mut tops: Query<
        (
            &mut Transform,
            &mut Velocity,
            &mut AngularVelocity,
            &mut SpinRpm,
            &mut SpecialMeter,
            &mut TopState,
            &mut SpeedCap,
            &BodyMass,
            &TopProfile,
            &Invulnerability,
            &ParticipantIndex,
        ),
        With<Top>,
    >,
    mut impacts: MessageWriter<ImpactMessage>,
    mut defeats: MessageWriter<DefeatMessage>,
) {
    for contact in contacts.read() {
        // A stale contact against a despawned body is a silent no-op.
        let Ok(
            [
                (
                    mut tf_a,
                    mut vel_a,
                    mut ang_a,
                    mut rpm_a,
                    mut meter_a,
                    mut state_a,
                    mut cap_a,
                    mass_a,
                    profile_a,
                    invuln_a,
                    index_a,
                ),
                (
                    mut tf_b,
                    mut vel_b,
                    mut ang_b,
                    mut rpm_b,
                    mut meter_b,
                    mut state_b,
                    mut cap_b,
                    mass_b,
                    profile_b,
                    invuln_b,
                    index_b,
                ),
            ],
        ) = tops.get_many_mut([contact.a, contact.b])
        else {
            continue;
        };

        if *state_a == TopState::Defeated || *state_b == TopState::Defeated {
            continue;
        }

        let outcome = resolve_contact(
            &tuning,
            BodyView {
                entity: contact.a,
                index: index_a.0,
                position: tf_a.translation,
                mass: mass_a.current,
                invulnerable: invuln_a.is_active(),
                velocity: &mut vel_a.0,
                rpm: &mut rpm_a.0,
                meter: &mut meter_a.0,
            },
            BodyView {
                entity: contact.b,
                index: index_b.0,
                position: tf_b.translation,
                mass: mass_b.current,
                invulnerable: invuln_b.is_active(),
                velocity: &mut vel_b.0,
                rpm: &mut rpm_b.0,
                meter: &mut meter_b.0,
            },
            contact.relative_velocity,
        );

        // Separate overlap so the pair does not stay interlocked
        // (heavier body moves less).
        let delta = tf_b.translation - tf_a.translation;
        let dist = delta.length();
        let min_dist = profile_a.0.radius + profile_b.0.radius;
        if dist < min_dist && dist > 0.0 {
            let overlap = min_dist - dist;
            let sep_n = delta / dist;
            let inv_mass_a = 1.0 / mass_a.current;
            let inv_mass_b = 1.0 / mass_b.current;
            let inv_sum = inv_mass_a + inv_mass_b;
            tf_a.translation -= sep_n * (overlap * inv_mass_a / inv_sum);
            tf_b.translation += sep_n * (overlap * inv_mass_b / inv_sum);
        }

        if outcome.weaker_depleted {
            let defeated = if outcome.weaker == contact.a {
                apply_defeat(&mut state_a, &mut rpm_a, &mut vel_a, &mut ang_a, &mut cap_a)
            } else {
                apply_defeat(&mut state_b, &mut rpm_b, &mut vel_b, &mut ang_b, &mut cap_b)
            };
            if defeated {
                info!("top {} was ground down in a clash", outcome.weaker);
                defeats.write(DefeatMessage {
                    body: outcome.weaker,
                });
            }
        }

        impacts.write(ImpactMessage {
            a: contact.a,
            b: contact.b,
            point: contact.point,
            intensity: outcome.intensity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entities() -> (Entity, Entity) {
        let mut world = World::new();
        (world.spawn_empty().id(), world.spawn_empty().id())
    }

    struct BodyState {
        position: Vec3,
        velocity: Vec3,
        rpm: Rpm,
        meter: f32,
        mass: f32,
        invulnerable: bool,
    }

    impl BodyState {
        fn new(position: Vec3, velocity: Vec3, mass: f32) -> Self {
            Self {
                position,
                velocity,
                rpm: Rpm::new(100.0),
                meter: 0.0,
                mass,
                invulnerable: false,
            }
        }

        fn view<'a>(&'a mut self, entity: Entity, index: usize) -> BodyView<'a> {
            BodyView {
                entity,
                index,
                position: self.position,
                mass: self.mass,
                invulnerable: self.invulnerable,
                velocity: &mut self.velocity,
                rpm: &mut self.rpm,
                meter: &mut self.meter,
            }
        }
    }

    #[test]
    fn heavier_faster_body_wins_the_exchange() {
        let (ea, eb) = entities();
        let mut a = BodyState::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), 2.0);
        let mut b = BodyState::new(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO, 1.0);

        let tuning = Tuning::default();
        let outcome = resolve_contact(
            &tuning,
            a.view(ea, 0),
            b.view(eb, 1),
            Vec3::new(5.0, 0.0, 0.0),
        );

        // power_a = 10, power_b = 0 → b is weaker and loses 1.0 rpm.
        assert_eq!(outcome.weaker, eb);
        assert_eq!(outcome.stronger, ea);
        assert!((outcome.damage - 1.0).abs() < 1e-5);
        assert!((b.rpm.0 - 99.0).abs() < 1e-4);
        assert_eq!(a.rpm.0, 100.0);
        assert!(outcome.weaker_recoil > outcome.stronger_recoil);
        assert!(!outcome.weaker_depleted);
        // The weaker body is pushed away from the stronger one.
        assert!(b.velocity.x > 0.0);
        assert!(a.velocity.x < 5.0);
        // Both get vertical pop, the weaker more.
        assert!(b.velocity.y > a.velocity.y);
    }

    #[test]
    fn outcome_is_independent_of_argument_order() {
        let (ea, eb) = entities();
        let tuning = Tuning::default();
        let rel = Vec3::new(5.0, 0.0, 0.0);

        let mut a1 = BodyState::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), 2.0);
        let mut b1 = BodyState::new(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO, 1.0);
        let forward = resolve_contact(&tuning, a1.view(ea, 0), b1.view(eb, 1), rel);

        let mut a2 = BodyState::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), 2.0);
        let mut b2 = BodyState::new(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO, 1.0);
        let swapped = resolve_contact(&tuning, b2.view(eb, 1), a2.view(ea, 0), rel);

        assert_eq!(forward.weaker, swapped.weaker);
        assert_eq!(forward.stronger, swapped.stronger);
        assert!((forward.damage - swapped.damage).abs() < 1e-6);
        assert!((a1.velocity - a2.velocity).length() < 1e-5);
        assert!((b1.velocity - b2.velocity).length() < 1e-5);
        assert!((b1.rpm.0 - b2.rpm.0).abs() < 1e-5);
    }

    #[test]
    fn exact_power_tie_designates_lower_index_as_weaker() {
        let (ea, eb) = entities();
        let tuning = Tuning::default();
        let mut a = BodyState::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0), 1.0);
        let mut b = BodyState::new(Vec3::new(0.5, 0.0, 0.0), Vec3::new(-3.0, 0.0, 0.0), 1.0);

        let outcome = resolve_contact(
            &tuning,
            b.view(eb, 1),
            a.view(ea, 0),
            Vec3::new(6.0, 0.0, 0.0),
        );
        assert_eq!(outcome.weaker, ea);
        // A tie carries no power difference, so no rpm is lost.
        assert_eq!(outcome.damage, 0.0);
        assert_eq!(a.rpm.0, 100.0);
        assert_eq!(b.rpm.0, 100.0);
    }

    #[test]
    fn invulnerable_weaker_body_recoils_without_damage() {
        let (ea, eb) = entities();
        let tuning = Tuning::default();
        let mut a = BodyState::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), 2.0);
        let mut b = BodyState::new(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO, 1.0);
        b.invulnerable = true;

        let outcome = resolve_contact(
            &tuning,
            a.view(ea, 0),
            b.view(eb, 1),
            Vec3::new(5.0, 0.0, 0.0),
        );
        assert_eq!(b.rpm.0, 100.0);
        assert_eq!(b.meter, 0.0);
        assert!(b.velocity.x > 0.0);
        assert!(!outcome.weaker_depleted);
    }

    #[test]
    fn damage_charges_the_weaker_special_meter() {
        let (ea, eb) = entities();
        let tuning = Tuning::default();
        let mut a = BodyState::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0), 2.0);
        let mut b = BodyState::new(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO, 1.0);

        let outcome = resolve_contact(
            &tuning,
            a.view(ea, 0),
            b.view(eb, 1),
            Vec3::new(10.0, 0.0, 0.0),
        );
        assert!((b.meter - outcome.damage * tuning.special_from_damage).abs() < 1e-6);
    }

    #[test]
    fn depleting_hit_reports_it() {
        let (ea, eb) = entities();
        let tuning = Tuning::default();
        let mut a = BodyState::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(30.0, 0.0, 0.0), 2.0);
        let mut b = BodyState::new(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO, 1.0);
        b.rpm = Rpm::new(1.0);

        let outcome = resolve_contact(
            &tuning,
            a.view(ea, 0),
            b.view(eb, 1),
            Vec3::new(30.0, 0.0, 0.0),
        );
        assert!(outcome.weaker_depleted);
        assert_eq!(b.rpm, Rpm(0.0));
    }

    proptest! {
        #[test]
        fn rpm_stays_in_domain(
            speed_a in 0.0f32..40.0,
            speed_b in 0.0f32..40.0,
            mass_a in 0.2f32..5.0,
            mass_b in 0.2f32..5.0,
            rpm_b in 0.0f32..100.0,
        ) {
            let (ea, eb) = entities();
            let tuning = Tuning::default();
            let mut a = BodyState::new(
                Vec3::new(-0.5, 0.0, 0.0),
                Vec3::new(speed_a, 0.0, 0.0),
                mass_a,
            );
            let mut b = BodyState::new(
                Vec3::new(0.5, 0.0, 0.0),
                Vec3::new(-speed_b, 0.0, 0.0),
                mass_b,
            );
            b.rpm = Rpm::new(rpm_b);
            a.rpm = Rpm::new(50.0);

            let rel = Vec3::new(speed_a + speed_b, 0.0, 0.0);
            resolve_contact(&tuning, a.view(ea, 0), b.view(eb, 1), rel);

            prop_assert!(a.rpm.0 >= 0.0 && a.rpm.0 <= 100.0);
            prop_assert!(b.rpm.0 >= 0.0 && b.rpm.0 <= 100.0);
            prop_assert!(a.meter >= 0.0 && a.meter <= 1.0);
            prop_assert!(b.meter >= 0.0 && b.meter <= 1.0);
        }

        #[test]
        fn weaker_never_recoils_less_at_equal_mass(
            speed_a in 0.0f32..40.0,
            speed_b in 0.0f32..40.0,
            mass in 0.2f32..5.0,
        ) {
            let (ea, eb) = entities();
            let tuning = Tuning::default();
            let mut a = BodyState::new(
                Vec3::new(-0.5, 0.0, 0.0),
                Vec3::new(speed_a, 0.0, 0.0),
                mass,
            );
            let mut b = BodyState::new(
                Vec3::new(0.5, 0.0, 0.0),
                Vec3::new(-speed_b, 0.0, 0.0),
                mass,
            );

            let rel = Vec3::new(speed_a + speed_b, 0.0, 0.0);
            let outcome = resolve_contact(&tuning, a.view(ea, 0), b.view(eb, 1), rel);
            prop_assert!(outcome.weaker_recoil >= outcome.stronger_recoil);
        }
    }
}
