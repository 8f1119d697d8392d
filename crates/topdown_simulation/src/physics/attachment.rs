//! Attachment: привязка entity к hold point другого entity
//!
//! Tool в руке игрока, объект в вакууме. Вместо иерархии Bevy (нужен TransformPlugin
//! и GlobalTransform): плоский компонент AttachedTo, позиция резолвится каждый tick.

use bevy::prelude::*;

use crate::components::AttachedTo;
use crate::logger::log_warning;

/// Максимальная глубина цепочки (объект → vacuum → игрок)
const MAX_ATTACHMENT_DEPTH: usize = 8;

/// World transform entity с учётом цепочки AttachedTo
fn resolve(
    entity: Entity,
    transforms: &Query<(Entity, &mut Transform, Option<&AttachedTo>)>,
) -> Option<Transform> {
    let mut chain: Vec<Vec3> = Vec::new();
    let mut current = entity;

    for _ in 0..MAX_ATTACHMENT_DEPTH {
        let (_, transform, attached) = transforms.get(current).ok()?;
        match attached {
            Some(attached) => {
                chain.push(attached.offset);
                current = attached.parent;
            }
            None => {
                // Корень найден: раскручиваем offsets от корня к entity
                let mut resolved = *transform;
                for offset in chain.iter().rev() {
                    resolved.translation += resolved.rotation * *offset;
                }
                return Some(resolved);
            }
        }
    }

    None
}

/// System: Transform attached entity = hold point родителя
///
/// Родитель исчез (despawn) → AttachedTo снимается, entity остаётся на месте.
pub fn sync_attachments(
    mut commands: Commands,
    mut transforms: Query<(Entity, &mut Transform, Option<&AttachedTo>)>,
) {
    let resolved: Vec<(Entity, Option<Transform>)> = transforms
        .iter()
        .filter(|(_, _, attached)| attached.is_some())
        .map(|(entity, _, _)| (entity, resolve(entity, &transforms)))
        .collect();

    for (entity, target) in resolved {
        match target {
            Some(target) => {
                if let Ok((_, mut transform, _)) = transforms.get_mut(entity) {
                    transform.translation = target.translation;
                    transform.rotation = target.rotation;
                }
            }
            None => {
                log_warning(&format!("Attachment of {entity} lost its parent, detaching"));
                commands.entity(entity).remove::<AttachedTo>();
            }
        }
    }
}
