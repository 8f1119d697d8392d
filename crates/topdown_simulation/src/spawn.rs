//! Bundles для сцены (игрок, пол, vacuum, props, зоны)
//!
//! Все параметры берутся из SimulationConfig, стратегия движения: общая (SharedLocomotion).

use bevy::prelude::*;

use crate::components::{ColliderShape, Health, PhysicsBody, PhysicsLayer, Player};
use crate::config::SimulationConfig;
use crate::controller::BodyController;
use crate::game::{DamageZone, Door, ObjectiveZone, PointsPickup};
use crate::interaction::Interactable;
use crate::locomotion::Locomotion;
use crate::physics::layers::{LAYER_ACTORS, LAYER_GROUND, LAYER_INTERACTABLE, LAYER_VACUUMABLE, LAYER_ZONES};
use crate::tools::ToolHolder;

/// Игрок: контроллер + всё, что он требует
pub fn player_bundle(config: &SimulationConfig, locomotion: Locomotion, position: Vec3) -> impl Bundle {
    let mut controller = BodyController::new(config.locomotion.base_speed, locomotion);
    controller.interaction_length = config.interaction.length;
    controller.interaction_cast_offset = Vec3::from_array(config.interaction.cast_offset);
    controller.debug = config.debug;

    (
        Player,
        controller,
        Health::new(10.0),
        config.ground_sensor(),
        config.gravity(),
        ToolHolder::default(),
        ColliderShape::default(),
        PhysicsLayer(LAYER_ACTORS),
        Transform::from_translation(position),
    )
}

/// Статический пол / стена (без PhysicsBody → fixed)
pub fn floor_bundle(center: Vec3, half_extents: Vec3) -> impl Bundle {
    (
        ColliderShape::Cuboid { half_extents },
        PhysicsLayer(LAYER_GROUND),
        Transform::from_translation(center),
    )
}

/// Vacuum на земле (подбирается click use)
pub fn vacuum_bundle(config: &SimulationConfig, position: Vec3) -> impl Bundle {
    (
        config.vacuum(),
        Interactable::click("Vacuum"),
        PhysicsBody::default(),
        config.gravity(),
        ColliderShape::Cuboid {
            half_extents: Vec3::new(0.15, 0.15, 0.4),
        },
        PhysicsLayer(LAYER_INTERACTABLE),
        Transform::from_translation(position),
    )
}

/// Hold-to-use объект с очками
pub fn points_pickup_bundle(position: Vec3, points: i32, hold_duration: f32) -> impl Bundle {
    (
        PointsPickup { points },
        Interactable::hold("Collect", hold_duration),
        ColliderShape::Cuboid {
            half_extents: Vec3::splat(0.3),
        },
        PhysicsLayer(LAYER_INTERACTABLE),
        Transform::from_translation(position),
    )
}

/// Объект, который можно засосать и бросить
pub fn prop_bundle(config: &SimulationConfig, position: Vec3) -> impl Bundle {
    (
        PhysicsBody::default(),
        config.gravity(),
        ColliderShape::Ball { radius: 0.3 },
        PhysicsLayer(LAYER_VACUUMABLE),
        Transform::from_translation(position),
    )
}

pub fn damage_zone_bundle(config: &SimulationConfig, center: Vec3, half_extents: Vec3) -> impl Bundle {
    (
        DamageZone {
            damage: config.zones.damage,
        },
        ColliderShape::Cuboid { half_extents },
        PhysicsLayer(LAYER_ZONES),
        Transform::from_translation(center),
    )
}

pub fn objective_zone_bundle(center: Vec3, half_extents: Vec3) -> impl Bundle {
    (
        ObjectiveZone::default(),
        ColliderShape::Cuboid { half_extents },
        PhysicsLayer(LAYER_ZONES),
        Transform::from_translation(center),
    )
}

pub fn door_bundle(scene: impl Into<String>, center: Vec3, half_extents: Vec3) -> impl Bundle {
    (
        Door { scene: scene.into() },
        ColliderShape::Cuboid { half_extents },
        PhysicsLayer(LAYER_ZONES),
        Transform::from_translation(center),
    )
}
