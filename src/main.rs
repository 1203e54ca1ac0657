use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use gyro_clash::game::components::{Intent, Top, TopState};
use gyro_clash::{
    spawn_top, start_battle, step_simulation, Archetype, Battle, SimSet, SimulationPlugin,
    StatProfile, Tuning,
};

/// Headless demo bout: two archetypes chase each other until one stops
/// spinning or the clock runs out.
fn main() {
    let tuning = Tuning::load_or_default();
    let dt = tuning.dt;

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin, LogPlugin::default()));
    app.insert_resource(Time::<Fixed>::from_seconds(dt as f64));
    app.insert_resource(tuning);
    app.add_plugins(SimulationPlugin);
    app.add_systems(
        FixedUpdate,
        drive_tops
            .run_if(in_state(gyro_clash::BattlePhase::Active))
            .before(SimSet::Actions),
    );

    let striker = StatProfile {
        name: "striker".into(),
        archetype: Archetype::Attack,
        ..Default::default()
    };
    let bulwark = StatProfile {
        name: "bulwark".into(),
        archetype: Archetype::Defense,
        mass: 2.0,
        ..Default::default()
    };

    let world = app.world_mut();
    spawn_top(world, striker, Vec3::new(-3.0, 0.0, 0.0)).expect("striker profile is valid");
    spawn_top(world, bulwark, Vec3::new(3.0, 0.0, 0.0)).expect("bulwark profile is valid");
    start_battle(world);

    let max_ticks = (600.0 / dt) as u32;
    for _ in 0..max_ticks {
        step_simulation(&mut app);
        if app.world().resource::<Battle>().verdict.is_some() {
            break;
        }
    }

    let battle = app.world().resource::<Battle>();
    match battle.verdict {
        Some(verdict) => match verdict.winner {
            Some(winner) => {
                let name = app
                    .world()
                    .entity(winner)
                    .get::<gyro_clash::game::components::TopProfile>()
                    .map(|p| p.0.name.clone())
                    .unwrap_or_default();
                info!(
                    "winner after {:.1}s: {name} ({winner})",
                    battle.elapsed
                );
            }
            None => info!("draw after {:.1}s", battle.elapsed),
        },
        None => info!("bout still running after {} ticks", max_ticks),
    }
}

/// Stand-in for the input collaborator: every live top seeks its
/// nearest opponent and swings when in reach.
fn drive_tops(
    mut tops: Query<(Entity, &Transform, &TopState, &mut Intent), With<Top>>,
) {
    let positions: Vec<(Entity, Vec3)> = tops
        .iter()
        .filter(|(_, _, state, _)| **state != TopState::Defeated)
        .map(|(entity, tf, _, _)| (entity, tf.translation))
        .collect();

    for (entity, transform, state, mut intent) in &mut tops {
        if *state == TopState::Defeated {
            continue;
        }
        let here = transform.translation;
        let Some((_, target)) = positions
            .iter()
            .filter(|(other, _)| *other != entity)
            .min_by(|(_, p), (_, q)| {
                p.distance_squared(here)
                    .partial_cmp(&q.distance_squared(here))
                    .unwrap()
            })
        else {
            continue;
        };

        let to_target = *target - here;
        intent.move_dir = Vec2::new(to_target.x, to_target.z).normalize_or_zero();
        if to_target.length() < 2.0 {
            intent.attack = Some(0.5);
        }
    }
}
