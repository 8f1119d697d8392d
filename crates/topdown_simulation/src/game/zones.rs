//! Trigger зоны: урон, цель (очки), дверь
//!
//! Вход детектируется edge-triggered: overlap по форме зоны каждый FixedUpdate,
//! `ZoneOccupants` помнит прошлый набор, реагируем только на новых.

use bevy::ecs::system::StaticSystemParam;
use bevy::prelude::*;

use crate::components::{ColliderShape, Health, HealthChanged, Player, Trigger};
use crate::game::GameState;
use crate::logger::log;
use crate::physics::layers::{LAYER_VACUUMABLE, MASK_ALL};
use crate::physics::{PhysicsBackend, ProbeFilter, SpatialQueries};
use crate::ui::UiUpdate;

/// Кто сейчас внутри зоны
#[derive(Component, Debug, Clone, Default)]
pub struct ZoneOccupants(Vec<Entity>);

impl ZoneOccupants {
    /// Новый набор; возвращает только вошедших
    pub fn update(&mut self, current: Vec<Entity>) -> Vec<Entity> {
        let entered = current.iter().copied().filter(|entity| !self.0.contains(entity)).collect();
        self.0 = current;
        entered
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }
}

/// Игрок, вошедший в зону, теряет `damage` здоровья (один раз на вход)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
#[require(Trigger, ZoneOccupants)]
pub struct DamageZone {
    pub damage: f32,
}

impl Default for DamageZone {
    fn default() -> Self {
        Self { damage: 3.0 }
    }
}

/// Тело на слое `layers`, вошедшее в зону, удаляется и даёт очко
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
#[require(Trigger, ZoneOccupants)]
pub struct ObjectiveZone {
    pub layers: u32,
}

impl Default for ObjectiveZone {
    fn default() -> Self {
        Self {
            layers: LAYER_VACUUMABLE,
        }
    }
}

/// Переход в другую сцену (загрузку делает embedding приложение)
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Trigger, ZoneOccupants)]
pub struct Door {
    pub scene: String,
}

/// Event: игрок вошёл в дверь
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SceneChangeRequested {
    pub scene: String,
}

fn entered(
    spatial: &dyn SpatialQueries,
    zone: Entity,
    shape: &ColliderShape,
    transform: &Transform,
    mask: u32,
    occupants: &mut ZoneOccupants,
) -> Vec<Entity> {
    let filter = ProbeFilter::new(mask).excluding(zone);
    occupants.update(spatial.overlap_collider(shape, transform, &filter))
}

/// System: damage zones
pub fn damage_zones<B: PhysicsBackend>(
    queries: StaticSystemParam<B::Queries>,
    mut zones: Query<(Entity, &DamageZone, &ColliderShape, &Transform, &mut ZoneOccupants)>,
    mut players: Query<&mut Health, With<Player>>,
    mut changed: EventWriter<HealthChanged>,
) {
    B::with_queries(&*queries, |spatial| {
        for (zone, damage, shape, transform, mut occupants) in zones.iter_mut() {
            for entity in entered(spatial, zone, shape, transform, MASK_ALL, &mut occupants) {
                if let Ok(mut health) = players.get_mut(entity) {
                    changed.write(health.take_damage(entity, damage.damage));
                }
            }
        }
    });
}

/// System: objective zones
pub fn objective_zones<B: PhysicsBackend>(
    queries: StaticSystemParam<B::Queries>,
    mut commands: Commands,
    mut zones: Query<(Entity, &ObjectiveZone, &ColliderShape, &Transform, &mut ZoneOccupants)>,
    mut game: ResMut<GameState>,
    mut ui: EventWriter<UiUpdate>,
) {
    B::with_queries(&*queries, |spatial| {
        for (zone, objective, shape, transform, mut occupants) in zones.iter_mut() {
            for entity in entered(spatial, zone, shape, transform, objective.layers, &mut occupants) {
                commands.entity(entity).despawn();
                let total = game.add_points(1);
                ui.write(UiUpdate::Points(total));
                log(&format!("Objective {zone} consumed {entity}, points: {total}"));
            }
        }
    });
}

/// System: doors
pub fn door_zones<B: PhysicsBackend>(
    queries: StaticSystemParam<B::Queries>,
    mut zones: Query<(Entity, &Door, &ColliderShape, &Transform, &mut ZoneOccupants)>,
    players: Query<(), With<Player>>,
    mut requests: EventWriter<SceneChangeRequested>,
) {
    B::with_queries(&*queries, |spatial| {
        for (zone, door, shape, transform, mut occupants) in zones.iter_mut() {
            let arrivals = entered(spatial, zone, shape, transform, MASK_ALL, &mut occupants);
            if arrivals.iter().any(|entity| players.contains(*entity)) {
                requests.write(SceneChangeRequested {
                    scene: door.scene.clone(),
                });
            }
        }
    });
}
