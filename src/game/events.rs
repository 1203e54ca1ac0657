use bevy::prelude::*;

/// Top–top contact (separate message type to keep detection and
/// resolution decoupled). Consumed by the resolver the same tick.
#[derive(Message, Debug, Clone)]
pub struct ContactMessage {
    pub a: Entity,
    pub b: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub relative_velocity: Vec3,
}

/// Resolved collision outcome for visual/audio collaborators.
#[derive(Message, Debug, Clone)]
pub struct ImpactMessage {
    pub a: Entity,
    pub b: Entity,
    pub point: Vec3,
    pub intensity: f32,
}

/// A body ran out of spin energy or was knocked out. Fired exactly once
/// per body.
#[derive(Message, Debug, Clone)]
pub struct DefeatMessage {
    pub body: Entity,
}

#[derive(Message, Debug, Clone)]
pub struct AttackMessage {
    pub body: Entity,
    pub charge: f32,
}

#[derive(Message, Debug, Clone)]
pub struct DashMessage {
    pub body: Entity,
}

#[derive(Message, Debug, Clone)]
pub struct SpecialMessage {
    pub body: Entity,
}

/// A body bounced off the ring wall.
#[derive(Message, Debug, Clone)]
pub struct BoundaryHitMessage {
    pub body: Entity,
    pub position: Vec3,
}

/// A body fell below the knockout plane. Always paired with a
/// DefeatMessage for the same body.
#[derive(Message, Debug, Clone)]
pub struct KnockoutMessage {
    pub body: Entity,
}

/// External request to end the match immediately with no winner.
#[derive(Message, Debug, Clone)]
pub struct AbortMessage;
