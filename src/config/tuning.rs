use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All tunable simulation parameters, loaded from tuning.ron.
///
/// The damage and recoil normalizers are feel constants, not physical
/// law; they live here so they can be tuned without touching code.
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct Tuning {
    pub dt: f32,
    pub gravity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    // ── Spin & stabilization ──
    pub gyro_force: f32,
    pub stabilization_force: f32,
    pub stabilization_smoothing: f32,
    /// Tilt deadband: no corrective torque below this angle.
    pub max_tilt_degrees: f32,
    /// Blend rate of the display-side spin speed toward actual rpm.
    pub visual_spin_smoothing: f32,
    // ── Combat ──
    pub rpm_loss_multiplier: f32,
    /// Divisor turning a power difference into rpm damage.
    pub damage_normalizer: f32,
    /// Divisor turning relative speed into impact intensity for effects.
    pub impact_normalizer: f32,
    /// Re-trigger suppression window per body pair.
    pub contact_cooldown: f32,
    pub min_recoil: f32,
    pub max_recoil: f32,
    /// Relative speed that maps to max_recoil.
    pub recoil_speed_normalizer: f32,
    pub recoil_multiplier: f32,
    /// Lighter bodies recoil more: force scales by (1 + influence / mass).
    pub mass_influence: f32,
    pub vertical_recoil_factor: f32,
    // ── Actions ──
    pub attack_boost_secs: f32,
    pub dash_boost_secs: f32,
    /// How long the attack mass bump lasts.
    pub mass_bump_window: f32,
    /// Recovery time from the Attacking state back to Active.
    pub attack_recovery_secs: f32,
    /// Special meter gained per attack charge spent.
    pub special_per_charge: f32,
    /// Special meter gained per point of rpm damage taken.
    pub special_from_damage: f32,
    pub special_burst_power: f32,
    pub special_invuln_secs: f32,
    // ── Arena ──
    pub arena_radius: f32,
    pub bounce_force: f32,
    /// Upward fraction mixed into the wall bounce direction.
    pub wall_pop: f32,
    pub boundary_damage: f32,
    /// Bodies are pushed back to arena_radius - epsilon after a wall hit.
    pub boundary_epsilon: f32,
    pub knockout_enabled: bool,
    pub knockout_height: f32,
    // ── Match ──
    pub time_limit: Option<f32>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            gravity: 9.81,
            linear_damping: 0.8,
            angular_damping: 0.3,
            gyro_force: 10.0,
            stabilization_force: 5.0,
            stabilization_smoothing: 0.1,
            max_tilt_degrees: 15.0,
            visual_spin_smoothing: 2.0,
            rpm_loss_multiplier: 1.0,
            damage_normalizer: 10.0,
            impact_normalizer: 5.0,
            contact_cooldown: 0.1,
            min_recoil: 2.0,
            max_recoil: 8.0,
            recoil_speed_normalizer: 20.0,
            recoil_multiplier: 1.5,
            mass_influence: 0.3,
            vertical_recoil_factor: 0.2,
            attack_boost_secs: 3.0,
            dash_boost_secs: 3.0,
            mass_bump_window: 0.25,
            attack_recovery_secs: 0.2,
            special_per_charge: 0.1,
            special_from_damage: 0.01,
            special_burst_power: 15.0,
            special_invuln_secs: 1.5,
            arena_radius: 10.0,
            bounce_force: 6.0,
            wall_pop: 0.2,
            boundary_damage: 50.0,
            boundary_epsilon: 0.5,
            knockout_enabled: true,
            knockout_height: -2.0,
            time_limit: Some(180.0),
        }
    }
}

impl Tuning {
    /// Get the data directory for tuning files.
    pub fn data_dir() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("gyro_clash")
    }

    /// Path to the tuning file.
    pub fn file_path() -> PathBuf {
        Self::data_dir().join("tuning.ron")
    }

    /// Load from file, or create default if not found.
    pub fn load_or_default() -> Self {
        let path = Self::file_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match ron::from_str(&contents) {
                    Ok(tuning) => return tuning,
                    Err(e) => {
                        warn!("Failed to parse tuning.ron: {e}, using defaults");
                    }
                },
                Err(e) => {
                    warn!("Failed to read tuning.ron: {e}, using defaults");
                }
            }
        }
        let tuning = Self::default();
        tuning.save();
        tuning
    }

    /// Save current tuning to file.
    pub fn save(&self) {
        let path = Self::file_path();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let pretty = ron::ser::PrettyConfig::default();
        match ron::ser::to_string_pretty(self, pretty) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    warn!("Failed to write tuning.ron: {e}");
                }
            }
            Err(e) => {
                warn!("Failed to serialize tuning: {e}");
            }
        }
    }

    /// Reload from file.
    pub fn reload(&mut self) {
        *self = Self::load_or_default();
        info!("Tuning reloaded");
    }
}
