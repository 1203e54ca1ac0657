pub mod actions;
pub mod arena;
pub mod battle;
pub mod collision;
pub mod combat;
pub mod components;
pub mod events;
pub mod physics;
pub mod stats;
