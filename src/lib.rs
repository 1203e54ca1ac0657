//! Deterministic spinning-top combat simulation.
//!
//! The library owns the per-tick battle loop: force injection from
//! input intents, rigid-body integration, spin decay and
//! stabilization, collision resolution with asymmetric rpm damage and
//! recoil, arena boundary enforcement, and match-end evaluation.
//! Rendering, audio, and input collection live with the embedding
//! application and talk to the core through `Intent` components and
//! fire-and-forget messages.

pub mod config;
pub mod game;
pub mod plugins;

pub use config::tuning::Tuning;
pub use game::battle::{spawn_top, start_battle, Battle, BattlePhase, Verdict};
pub use game::components::{Intent, TopState};
pub use game::stats::profile::{ProfileError, StatProfile};
pub use game::stats::types::Archetype;
pub use plugins::sim_plugin::{step_simulation, SimSet, SimulationPlugin};
