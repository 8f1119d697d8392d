//! Tools: interactable предметы, которые контроллер держит в руке
//!
//! Архитектура:
//! - Tool ↔ ToolHolder: двусторонняя ссылка, инвариант
//!   `tool.holder == Some(c) ⟺ holder(c).equipped == Some(tool)`
//! - equip_tool / drop_tool: чистые функции над компонентами (без Commands)
//! - handle_tool_use: InteractableUsed на Tool → drop у старого владельца → equip
//! - process_drop_intents: явный drop (DropToolIntent)
//!
//! Vacuum (vacuum.rs) реагирует на ToolEquipped / ToolDropped.

use bevy::prelude::*;

use crate::components::{AttachedTo, PhysicsBody};
use crate::interaction::{Interactable, InteractableUsed};
use crate::logger::{log, log_warning};

pub mod vacuum;

pub use vacuum::{
    grab_objects, pull_objects, release_on_tool_events, throw_held_objects, tick_vacuum_cooldowns, Vacuum,
};

/// Предмет, который можно взять в руку
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Tool {
    holder: Option<Entity>,
}

impl Tool {
    pub fn holder(&self) -> Option<Entity> {
        self.holder
    }
}

/// Рука контроллера
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ToolHolder {
    equipped: Option<Entity>,
    /// Hold point относительно тела
    pub hold_offset: Vec3,
}

impl Default for ToolHolder {
    fn default() -> Self {
        Self {
            equipped: None,
            hold_offset: Vec3::new(0.35, 0.2, -0.5),
        }
    }
}

impl ToolHolder {
    pub fn equipped(&self) -> Option<Entity> {
        self.equipped
    }
}

/// Event: tool в руке
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolEquipped {
    pub tool: Entity,
    pub holder: Entity,
}

/// Event: tool выброшен
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDropped {
    pub tool: Entity,
    pub holder: Entity,
}

/// Intent: выбросить то, что в руке
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropToolIntent {
    pub holder: Entity,
}

/// Equip: hit-box off, velocity 0, kinematic, collisions off, ownership с обеих сторон
///
/// Возвращает привязку к hold point (вставляет вызывающий).
pub fn equip_tool(
    tool_entity: Entity,
    tool: &mut Tool,
    interactable: &mut Interactable,
    body: &mut PhysicsBody,
    holder_entity: Entity,
    holder: &mut ToolHolder,
) -> AttachedTo {
    interactable.hitbox_enabled = false;
    body.velocity = Vec3::ZERO;
    body.kinematic = true;
    body.detect_collisions = false;

    tool.holder = Some(holder_entity);
    holder.equipped = Some(tool_entity);

    AttachedTo {
        parent: holder_entity,
        offset: holder.hold_offset,
    }
}

/// Drop: обратное к equip (AttachedTo снимает вызывающий)
pub fn drop_tool(tool_entity: Entity, tool: &mut Tool, interactable: &mut Interactable, body: &mut PhysicsBody, holder: &mut ToolHolder) {
    body.kinematic = false;
    body.detect_collisions = true;
    interactable.hitbox_enabled = true;

    tool.holder = None;
    if holder.equipped == Some(tool_entity) {
        holder.equipped = None;
    }
}

type ToolQuery<'w, 's> = Query<'w, 's, (&'static mut Tool, &'static mut Interactable, &'static mut PhysicsBody)>;

/// Снять tool с его текущего владельца (если есть)
fn release_tool(
    commands: &mut Commands,
    tools: &mut ToolQuery,
    holders: &mut Query<&mut ToolHolder>,
    tool_entity: Entity,
    dropped: &mut EventWriter<ToolDropped>,
) {
    let Ok((mut tool, mut interactable, mut body)) = tools.get_mut(tool_entity) else {
        return;
    };
    let Some(holder_entity) = tool.holder else {
        return;
    };

    match holders.get_mut(holder_entity) {
        Ok(mut holder) => drop_tool(tool_entity, &mut tool, &mut interactable, &mut body, &mut holder),
        Err(_) => {
            // Владелец исчез: чиним только сторону tool
            let mut orphan = ToolHolder::default();
            drop_tool(tool_entity, &mut tool, &mut interactable, &mut body, &mut orphan);
        }
    }

    commands.entity(tool_entity).remove::<AttachedTo>();
    dropped.write(ToolDropped {
        tool: tool_entity,
        holder: holder_entity,
    });
}

/// System: use на Tool = equip (с передачей владения)
///
/// 1. tool у другого владельца → drop
/// 2. у пользователя в руке другой tool → drop
/// 3. equip
pub fn handle_tool_use(
    mut commands: Commands,
    mut used: EventReader<InteractableUsed>,
    mut tools: ToolQuery,
    mut holders: Query<&mut ToolHolder>,
    mut equipped: EventWriter<ToolEquipped>,
    mut dropped: EventWriter<ToolDropped>,
) {
    for event in used.read() {
        if !tools.contains(event.interactable) {
            continue;
        }

        let Ok(current) = holders.get(event.user).map(|holder| holder.equipped) else {
            log_warning(&format!("{} used a tool without ToolHolder", event.user));
            continue;
        };

        release_tool(&mut commands, &mut tools, &mut holders, event.interactable, &mut dropped);
        if let Some(current) = current.filter(|current| *current != event.interactable) {
            release_tool(&mut commands, &mut tools, &mut holders, current, &mut dropped);
        }

        let Ok((mut tool, mut interactable, mut body)) = tools.get_mut(event.interactable) else {
            continue;
        };
        let Ok(mut holder) = holders.get_mut(event.user) else {
            continue;
        };

        let attachment = equip_tool(
            event.interactable,
            &mut tool,
            &mut interactable,
            &mut body,
            event.user,
            &mut holder,
        );
        commands.entity(event.interactable).insert(attachment);
        equipped.write(ToolEquipped {
            tool: event.interactable,
            holder: event.user,
        });

        log(&format!("{} equipped {}", event.user, event.interactable));
    }
}

/// System: явный drop
pub fn process_drop_intents(
    mut commands: Commands,
    mut intents: EventReader<DropToolIntent>,
    mut tools: ToolQuery,
    mut holders: Query<&mut ToolHolder>,
    mut dropped: EventWriter<ToolDropped>,
) {
    for intent in intents.read() {
        let Some(tool) = holders.get(intent.holder).ok().and_then(|holder| holder.equipped) else {
            continue;
        };
        release_tool(&mut commands, &mut tools, &mut holders, tool, &mut dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> (Tool, Interactable, PhysicsBody, ToolHolder) {
        (
            Tool::default(),
            Interactable::click("Vacuum"),
            PhysicsBody {
                velocity: Vec3::new(1.0, -2.0, 0.0),
                ..default()
            },
            ToolHolder::default(),
        )
    }

    #[test]
    fn test_equip_sets_flags_and_ownership() {
        let (mut tool, mut interactable, mut body, mut holder) = parts();
        let tool_entity = Entity::from_raw(10);
        let player = Entity::from_raw(1);

        let attachment = equip_tool(tool_entity, &mut tool, &mut interactable, &mut body, player, &mut holder);

        assert_eq!(tool.holder(), Some(player));
        assert_eq!(holder.equipped(), Some(tool_entity));
        assert!(!interactable.hitbox_enabled);
        assert!(body.kinematic && !body.detect_collisions);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(attachment.parent, player);
        assert_eq!(attachment.offset, holder.hold_offset);
    }

    #[test]
    fn test_drop_is_inverse_of_equip() {
        let (mut tool, mut interactable, mut body, mut holder) = parts();
        let tool_entity = Entity::from_raw(10);

        let _ = equip_tool(tool_entity, &mut tool, &mut interactable, &mut body, Entity::from_raw(1), &mut holder);
        drop_tool(tool_entity, &mut tool, &mut interactable, &mut body, &mut holder);

        assert_eq!(tool.holder(), None);
        assert_eq!(holder.equipped(), None);
        assert!(interactable.hitbox_enabled);
        assert!(!body.kinematic && body.detect_collisions);
    }

    #[test]
    fn test_drop_keeps_other_equipped_tool() {
        let (mut tool, mut interactable, mut body, mut holder) = parts();
        holder.equipped = Some(Entity::from_raw(99));

        drop_tool(Entity::from_raw(10), &mut tool, &mut interactable, &mut body, &mut holder);
        assert_eq!(holder.equipped(), Some(Entity::from_raw(99)));
    }
}
