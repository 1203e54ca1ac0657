use bevy::prelude::*;

use super::components::*;
use super::events::AbortMessage;
use super::stats::profile::{ProfileError, StatProfile};
use super::stats::types::Rpm;
use crate::config::tuning::Tuning;

/// Match phases. Linear and terminal: once Ended, the combat system
/// sets stop running and nothing mutates participant state again.
#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BattlePhase {
    #[default]
    Preparing,
    Active,
    Ended,
}

/// Outcome of a finished match. `winner == None` is a draw or an abort.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub winner: Option<Entity>,
}

/// Owns the registered participant set (registration order is the
/// deterministic tie-break order) and the match clock.
#[derive(Resource, Debug, Default)]
pub struct Battle {
    pub participants: Vec<Entity>,
    pub elapsed: f32,
    pub time_limit: Option<f32>,
    pub verdict: Option<Verdict>,
}

/// Spawn a fully initialized top and register it with the match.
/// Refuses invalid profiles outright — nothing is spawned on error.
pub fn spawn_top(
    world: &mut World,
    profile: StatProfile,
    position: Vec3,
) -> Result<Entity, ProfileError> {
    profile.validate()?;

    let caps = profile.speed_caps();
    let index = world.resource::<Battle>().participants.len();
    let entity = world
        .spawn((
            (
                Top,
                ParticipantIndex(index),
                SpinRpm(Rpm::new(profile.max_rpm)),
                SpecialMeter::default(),
                AttackCharges {
                    current: profile.max_attack_charges as f32,
                },
                TopState::Active,
                AttackRecovery::default(),
                SpeedCap::from_caps(&caps),
                BodyMass::new(profile.mass),
                MassBump::default(),
            ),
            (
                Transform::from_translation(position),
                Velocity(Vec3::ZERO),
                AngularVelocity(Vec3::ZERO),
                VisualSpin(profile.max_rpm),
                Invulnerability::default(),
                Intent::default(),
                ContactCooldowns::default(),
                TopProfile(profile),
            ),
        ))
        .id();

    world.resource_mut::<Battle>().participants.push(entity);
    Ok(entity)
}

/// Begin the match once every participant is registered. Returns false
/// (and does nothing) with fewer than two participants.
pub fn start_battle(world: &mut World) -> bool {
    if world.resource::<Battle>().participants.len() < 2 {
        return false;
    }
    let time_limit = world.resource::<Tuning>().time_limit;
    let mut battle = world.resource_mut::<Battle>();
    battle.time_limit = time_limit;
    battle.elapsed = 0.0;
    world
        .resource_mut::<NextState<BattlePhase>>()
        .set(BattlePhase::Active);
    true
}

/// Time-limit winner: highest rpm among the living, earliest
/// registration wins exact ties. `alive` is in registration order.
pub(crate) fn decide_by_rpm(alive: &[(Entity, f32)]) -> Option<Entity> {
    let mut best: Option<(Entity, f32)> = None;
    for &(entity, rpm) in alive {
        match best {
            Some((_, best_rpm)) if rpm > best_rpm => best = Some((entity, rpm)),
            None => best = Some((entity, rpm)),
            _ => {}
        }
    }
    best.map(|(entity, _)| entity)
}

/// EvaluateSet: advance the match clock and settle the verdict when
/// one or zero tops remain, or when time runs out.
pub fn evaluate_match(
    tuning: Res<Tuning>,
    mut battle: ResMut<Battle>,
    tops: Query<(&TopState, &SpinRpm), With<Top>>,
    mut next_phase: ResMut<NextState<BattlePhase>>,
) {
    battle.elapsed += tuning.dt;

    let alive: Vec<(Entity, f32)> = battle
        .participants
        .iter()
        .filter_map(|&entity| {
            let (state, rpm) = tops.get(entity).ok()?;
            (*state != TopState::Defeated).then_some((entity, rpm.0.0))
        })
        .collect();

    if alive.len() <= 1 {
        let winner = alive.first().map(|&(entity, _)| entity);
        battle.verdict = Some(Verdict { winner });
        next_phase.set(BattlePhase::Ended);
        match winner {
            Some(entity) => info!("match over: top {entity} is the last one spinning"),
            None => info!("match over: mutual destruction, no winner"),
        }
        return;
    }

    if let Some(limit) = battle.time_limit
        && battle.elapsed > limit
    {
        let winner = decide_by_rpm(&alive);
        battle.verdict = Some(Verdict { winner });
        next_phase.set(BattlePhase::Ended);
        info!("match over: time limit reached");
    }
}

/// Always-on: an external abort ends the match immediately with no
/// winner. Countdown timers are simply abandoned with the phase gates.
pub fn handle_abort(
    mut aborts: MessageReader<AbortMessage>,
    phase: Res<State<BattlePhase>>,
    mut battle: ResMut<Battle>,
    mut next_phase: ResMut<NextState<BattlePhase>>,
) {
    if aborts.read().next().is_none() {
        return;
    }
    if *phase.get() == BattlePhase::Ended {
        return;
    }
    battle.verdict = Some(Verdict { winner: None });
    next_phase.set(BattlePhase::Ended);
    info!("match aborted");
}
