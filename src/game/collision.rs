use bevy::prelude::*;

use super::components::*;
use super::events::ContactMessage;
use crate::config::tuning::Tuning;

/// CollisionSet: sphere-sphere detection over every registered pair.
/// Emits one contact per approaching overlap, rate-limited per pair so
/// a contact that spans several substeps does not double-count.
pub fn detect_contacts(
    tuning: Res<Tuning>,
    tops: Query<(Entity, &Transform, &Velocity, &TopProfile, &TopState), With<Top>>,
    mut cooldowns: Query<&mut ContactCooldowns>,
    mut contacts: MessageWriter<ContactMessage>,
) {
    let top_list: Vec<_> = tops.iter().collect();

    for i in 0..top_list.len() {
        for j in (i + 1)..top_list.len() {
            let (entity_a, tf_a, vel_a, profile_a, state_a) = &top_list[i];
            let (entity_b, tf_b, vel_b, profile_b, state_b) = &top_list[j];

            if **state_a == TopState::Defeated || **state_b == TopState::Defeated {
                continue;
            }

            let pos_a = tf_a.translation;
            let pos_b = tf_b.translation;
            let dist = pos_a.distance(pos_b);
            let min_dist = profile_a.0.radius + profile_b.0.radius;
            if dist >= min_dist || dist <= 0.0 {
                continue;
            }

            let normal = (pos_b - pos_a) / dist;
            let relative_velocity = vel_a.0 - vel_b.0;
            // Only resolve pairs moving toward each other.
            if relative_velocity.dot(normal) <= 0.0 {
                continue;
            }

            let Ok([mut cd_a, mut cd_b]) = cooldowns.get_many_mut([*entity_a, *entity_b]) else {
                continue;
            };
            if !cd_a.can_contact(*entity_b) || !cd_b.can_contact(*entity_a) {
                continue;
            }
            cd_a.register_contact(*entity_b, tuning.contact_cooldown);
            cd_b.register_contact(*entity_a, tuning.contact_cooldown);

            contacts.write(ContactMessage {
                a: *entity_a,
                b: *entity_b,
                point: pos_a + normal * profile_a.0.radius,
                normal,
                relative_velocity,
            });
        }
    }
}
