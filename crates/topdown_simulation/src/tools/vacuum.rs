//! Vacuum: pull → grab → throw
//!
//! Пока vacuum в руке и tool action held:
//! - pull (FixedUpdate): capsule перед соплом, каждому телу velocity к соплу (не impulse).
//!   Не работает, пока что-то держим или идёт cooldown.
//! - grab (FixedUpdate): box у hold point, первое попавшееся тело захватывается
//!   (velocity 0, kinematic, AttachedTo). Максимум один объект.
//! Throw action pressed (Update): отцепить, impulse вперёд, старт cooldown.
//!
//! Cooldown: обычный countdown, `cancel_cooldown` обнуляет (equip/drop).

use bevy::ecs::system::StaticSystemParam;
use bevy::prelude::*;

use super::{Tool, ToolDropped, ToolEquipped};
use crate::components::{AttachedTo, ControllerInput, PhysicsBody};
use crate::debug::{DebugColor, DebugShapes};
use crate::logger::log_warning;
use crate::physics::layers::LAYER_VACUUMABLE;
use crate::physics::{PhysicsBackend, ProbeFilter};

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Tool)]
pub struct Vacuum {
    /// Скорость притягивания (m/s)
    pub strength: f32,
    pub length: f32,
    /// Радиус capsule
    pub width: f32,
    pub throw_force: f32,
    /// Пауза pull после броска (секунды)
    pub cooldown: f32,
    pub mask: u32,
    /// Hold point относительно vacuum
    pub hold_offset: Vec3,
    pub grab_half_extents: Vec3,
    pub debug: bool,

    held: Option<Entity>,
    /// Последний брошенный объект: не ловим, пока не вылетит из grab box
    released: Option<Entity>,
    cooldown_remaining: f32,
}

impl Default for Vacuum {
    fn default() -> Self {
        Self {
            strength: 150.0,
            length: 15.0,
            width: 5.0,
            throw_force: 50.0,
            cooldown: 0.5,
            mask: LAYER_VACUUMABLE,
            hold_offset: Vec3::new(0.0, 0.0, -0.8),
            grab_half_extents: Vec3::splat(0.75),
            debug: false,
            held: None,
            released: None,
            cooldown_remaining: 0.0,
        }
    }
}

impl Vacuum {
    pub fn held(&self) -> Option<Entity> {
        self.held
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining > 0.0
    }

    pub fn can_pull(&self) -> bool {
        self.held.is_none() && !self.is_cooling_down()
    }

    pub fn cancel_cooldown(&mut self) {
        self.cooldown_remaining = 0.0;
    }

    pub fn tick_cooldown(&mut self, delta: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - delta).max(0.0);
    }

    /// Capsule pull: (start, end, radius)
    pub fn pull_region(&self, transform: &Transform) -> (Vec3, Vec3, f32) {
        let start = transform.translation;
        (start, start + transform.forward().as_vec3() * self.length, self.width)
    }

    /// Box grab: (center, half_extents, rotation)
    pub fn grab_region(&self, transform: &Transform) -> (Vec3, Vec3, Quat) {
        (
            transform.translation + transform.rotation * self.hold_offset,
            self.grab_half_extents,
            transform.rotation,
        )
    }

    pub fn pull_velocity(&self, nozzle: Vec3, target: Vec3) -> Vec3 {
        (nozzle - target).normalize_or_zero() * self.strength
    }

    /// Захват; None если уже держим или это только что брошенный объект
    pub fn grab(&mut self, vacuum: Entity, object: Entity, body: &mut PhysicsBody) -> Option<AttachedTo> {
        if self.held.is_some() || self.released == Some(object) {
            return None;
        }

        body.velocity = Vec3::ZERO;
        body.kinematic = true;
        self.held = Some(object);

        Some(AttachedTo {
            parent: vacuum,
            offset: self.hold_offset,
        })
    }

    /// Бросок; None если ничего не держим
    pub fn throw(&mut self, body: &mut PhysicsBody, forward: Vec3) -> Option<Entity> {
        let object = self.held.take()?;

        body.kinematic = false;
        body.apply_impulse(forward * self.throw_force);
        self.cooldown_remaining = self.cooldown;
        self.released = Some(object);

        Some(object)
    }

    /// Отпустить без броска (drop vacuum)
    pub fn release(&mut self) -> Option<Entity> {
        self.cancel_cooldown();
        self.held.take()
    }

    fn forget_held(&mut self) {
        self.held = None;
    }

    /// Брошенный объект вылетел из grab box → снова можно ловить
    fn refresh_released(&mut self, overlapping: &[Entity]) {
        if self.released.is_some_and(|released| !overlapping.contains(&released)) {
            self.released = None;
        }
    }
}

/// Vacuum в руке с зажатым tool action
fn active_holder(tool: &Tool, inputs: &Query<&ControllerInput>) -> Option<Entity> {
    let holder = tool.holder()?;
    let input = inputs.get(holder).ok()?;
    input.tool.held.then_some(holder)
}

/// System: pull (FixedUpdate)
pub fn pull_objects<B: PhysicsBackend>(
    queries: StaticSystemParam<B::Queries>,
    mut debug: ResMut<DebugShapes>,
    vacuums: Query<(Entity, &Vacuum, &Tool, &Transform)>,
    inputs: Query<&ControllerInput>,
    mut bodies: Query<(&Transform, &mut PhysicsBody, Has<AttachedTo>), Without<Vacuum>>,
) {
    B::with_queries(&*queries, |spatial| {
        for (entity, vacuum, tool, transform) in vacuums.iter() {
            let Some(holder) = active_holder(tool, &inputs) else {
                continue;
            };
            if !vacuum.can_pull() {
                continue;
            }

            let (start, end, radius) = vacuum.pull_region(transform);
            if vacuum.debug {
                debug.sphere(start, radius, DebugColor::Blue);
                debug.sphere(end, radius, DebugColor::Blue);
                debug.line(start, end, DebugColor::Blue);
            }

            let filter = ProbeFilter::new(vacuum.mask).excluding(entity);
            for object in spatial.overlap_capsule(start, end, radius, &filter) {
                if object == holder {
                    continue;
                }
                let Ok((object_transform, mut body, attached)) = bodies.get_mut(object) else {
                    continue;
                };
                if body.kinematic || attached {
                    continue;
                }
                body.velocity = vacuum.pull_velocity(start, object_transform.translation);
            }
        }
    });
}

/// System: grab (FixedUpdate, после pull)
pub fn grab_objects<B: PhysicsBackend>(
    queries: StaticSystemParam<B::Queries>,
    mut commands: Commands,
    mut vacuums: Query<(Entity, &mut Vacuum, &Tool, &Transform)>,
    inputs: Query<&ControllerInput>,
    mut bodies: Query<(&mut PhysicsBody, Has<AttachedTo>), Without<Vacuum>>,
) {
    B::with_queries(&*queries, |spatial| {
        for (entity, mut vacuum, tool, transform) in vacuums.iter_mut() {
            if let Some(held) = vacuum.held() {
                if !bodies.contains(held) {
                    log_warning(&format!("Vacuum {entity} lost held object {held}"));
                    vacuum.forget_held();
                }
            }

            let Some(holder) = active_holder(tool, &inputs) else {
                continue;
            };

            let (center, half_extents, rotation) = vacuum.grab_region(transform);
            let filter = ProbeFilter::new(vacuum.mask).excluding(entity);
            let overlapping = spatial.overlap_box(center, half_extents, rotation, &filter);
            vacuum.refresh_released(&overlapping);

            if vacuum.held().is_some() {
                continue;
            }

            for object in overlapping {
                if object == holder {
                    continue;
                }
                let Ok((mut body, attached)) = bodies.get_mut(object) else {
                    continue;
                };
                if attached {
                    continue;
                }
                if let Some(attachment) = vacuum.grab(entity, object, &mut body) {
                    commands.entity(object).insert(attachment);
                    break;
                }
            }
        }
    });
}

/// System: throw (Update, throw action pressed)
pub fn throw_held_objects(
    mut commands: Commands,
    mut vacuums: Query<(Entity, &mut Vacuum, &Tool, &Transform)>,
    inputs: Query<&ControllerInput>,
    mut bodies: Query<&mut PhysicsBody, Without<Vacuum>>,
) {
    for (entity, mut vacuum, tool, transform) in vacuums.iter_mut() {
        let Some(input) = tool.holder().and_then(|holder| inputs.get(holder).ok()) else {
            continue;
        };
        if !input.throw.pressed {
            continue;
        }
        let Some(held) = vacuum.held() else {
            continue;
        };

        let Ok(mut body) = bodies.get_mut(held) else {
            log_warning(&format!("Vacuum {entity} lost held object {held}"));
            vacuum.forget_held();
            continue;
        };

        if let Some(thrown) = vacuum.throw(&mut body, transform.forward().as_vec3()) {
            commands.entity(thrown).remove::<AttachedTo>();
        }
    }
}

/// System: cooldown countdown (Update)
pub fn tick_vacuum_cooldowns(time: Res<Time>, mut vacuums: Query<&mut Vacuum>) {
    let delta = time.delta_secs();
    for mut vacuum in vacuums.iter_mut() {
        if vacuum.is_cooling_down() {
            vacuum.tick_cooldown(delta);
        }
    }
}

/// System: drop → отпустить объект + cancel cooldown; equip → cancel cooldown
pub fn release_on_tool_events(
    mut commands: Commands,
    mut equipped: EventReader<ToolEquipped>,
    mut dropped: EventReader<ToolDropped>,
    mut vacuums: Query<&mut Vacuum>,
    mut bodies: Query<&mut PhysicsBody, Without<Vacuum>>,
) {
    for event in equipped.read() {
        if let Ok(mut vacuum) = vacuums.get_mut(event.tool) {
            vacuum.cancel_cooldown();
        }
    }

    for event in dropped.read() {
        let Ok(mut vacuum) = vacuums.get_mut(event.tool) else {
            continue;
        };
        let Some(object) = vacuum.release() else {
            continue;
        };
        if let Ok(mut body) = bodies.get_mut(object) {
            body.kinematic = false;
            commands.entity(object).remove::<AttachedTo>();
        }
    }
}
