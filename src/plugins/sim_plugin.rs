use bevy::prelude::*;
use bevy::state::state::StateTransition;

use crate::config::tuning::Tuning;
use crate::game::{
    actions, arena::boundary, battle, battle::Battle, battle::BattlePhase, collision, combat,
    events::*, physics,
};

/// Strict FixedUpdate ordering. Actions inject forces, the integrator
/// settles the state, then collisions resolve against the settled
/// state, then boundary corrections, then the match verdict. Resolving
/// in any other order changes outcomes.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    Actions,
    Physics,
    CollisionDetect,
    CombatResolve,
    Boundary,
    Evaluate,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Tuning>();
        app.init_resource::<Battle>();
        app.init_state::<BattlePhase>();

        app.add_message::<ContactMessage>();
        app.add_message::<ImpactMessage>();
        app.add_message::<DefeatMessage>();
        app.add_message::<AttackMessage>();
        app.add_message::<DashMessage>();
        app.add_message::<SpecialMessage>();
        app.add_message::<BoundaryHitMessage>();
        app.add_message::<KnockoutMessage>();
        app.add_message::<AbortMessage>();

        // Every combat set is gated to the Active phase; Ended freezes
        // the simulation structurally.
        app.configure_sets(
            FixedUpdate,
            (
                SimSet::Actions.run_if(in_state(BattlePhase::Active)),
                SimSet::Physics.run_if(in_state(BattlePhase::Active)),
                SimSet::CollisionDetect.run_if(in_state(BattlePhase::Active)),
                SimSet::CombatResolve.run_if(in_state(BattlePhase::Active)),
                SimSet::Boundary.run_if(in_state(BattlePhase::Active)),
                SimSet::Evaluate.run_if(in_state(BattlePhase::Active)),
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                actions::apply_movement,
                actions::apply_attacks,
                actions::apply_dashes,
                actions::apply_specials,
                actions::clear_intents,
            )
                .chain()
                .in_set(SimSet::Actions),
        );

        app.add_systems(
            FixedUpdate,
            (
                physics::integrate_bodies,
                physics::apply_gyroscopic_torque,
                physics::apply_tilt_correction,
                physics::spin_decay,
                physics::smooth_visual_spin,
                physics::limit_speed,
                physics::tick_effect_timers,
                physics::recover_charges,
                physics::tick_contact_cooldowns,
            )
                .chain()
                .in_set(SimSet::Physics),
        );

        app.add_systems(
            FixedUpdate,
            collision::detect_contacts.in_set(SimSet::CollisionDetect),
        );

        app.add_systems(
            FixedUpdate,
            combat::resolve_contacts.in_set(SimSet::CombatResolve),
        );

        app.add_systems(
            FixedUpdate,
            boundary::enforce_boundary.in_set(SimSet::Boundary),
        );

        app.add_systems(
            FixedUpdate,
            battle::evaluate_match.in_set(SimSet::Evaluate),
        );

        // Abort works from any phase.
        app.add_systems(FixedUpdate, battle::handle_abort);
    }
}

/// Advance the simulation by exactly one fixed tick, independent of the
/// wall clock. Pending phase transitions are applied first, so a
/// verdict set on tick N freezes the simulation from tick N+1 on.
pub fn step_simulation(app: &mut App) {
    app.world_mut().run_schedule(StateTransition);
    app.world_mut().run_schedule(FixedUpdate);
}
