//! Locomotion: ground sensing, gravity, стратегии движения
//!
//! Архитектура:
//! - LocomotionStrategy: stateless trait (move, rotate, move_gizmos, rotate_gizmos),
//!   один экземпляр шарится через Arc между всеми контроллерами
//! - DefaultLocomotion: прямое присваивание velocity с ground/air модификаторами
//! - EasedLocomotion: ограниченное ускорение + плавный поворот
//! - GroundSensor / GravityIntegrator: per body компоненты
//!
//! Yaw конвенция: compass градусы, по часовой сверху, 0 = -Z (forward).

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use bevy::prelude::*;

use crate::components::PhysicsBody;
use crate::debug::{DebugColor, DebugShapes};

pub mod gravity;
pub mod ground;

pub use gravity::{apply_free_body_gravity, GravityIntegrator};
pub use ground::{probe_ground, GroundProbeResult, GroundSensor, GroundTransition, Landed, LeftGround};

/// Поворот по yaw (compass градусы)
pub fn yaw_rotation(yaw_degrees: f32) -> Quat {
    Quat::from_rotation_y(-yaw_degrees.to_radians())
}

/// Yaw (compass градусы) из поворота
pub fn yaw_degrees(rotation: Quat) -> f32 {
    let forward = rotation * Vec3::NEG_Z;
    forward.x.atan2(-forward.z).to_degrees()
}

/// Модификаторы скорости (immutable, общие для всех тел со стратегией)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionParameters {
    pub ground_modifier: f32,
    pub air_modifier: f32,
}

impl Default for LocomotionParameters {
    fn default() -> Self {
        Self {
            ground_modifier: 1.0,
            air_modifier: 0.7,
        }
    }
}

/// Стратегия движения
///
/// Не хранит per-body состояние: всё, что нужно, приходит аргументами.
pub trait LocomotionStrategy: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Пишет velocity тела. Нулевой direction → нет горизонтальной скорости.
    fn move_body(&self, body: &mut PhysicsBody, base_speed: f32, direction: Vec3, grounded: bool, delta: f32);

    fn rotate_body(&self, transform: &mut Transform, yaw_degrees: f32);

    fn move_gizmos(&self, shapes: &mut DebugShapes, origin: Vec3, body: &PhysicsBody) {
        shapes.line(origin, origin + body.velocity, DebugColor::Yellow);
    }

    fn rotate_gizmos(&self, shapes: &mut DebugShapes, transform: &Transform, yaw_degrees: f32) {
        let origin = transform.translation;
        shapes.line(origin, origin + yaw_rotation(yaw_degrees) * Vec3::NEG_Z, DebugColor::Blue);
    }
}

/// Скорость из direction: normalize * base * modifier * dt
fn scaled_velocity(direction: Vec3, base_speed: f32, modifier: f32, delta: f32) -> Vec3 {
    direction.normalize_or_zero() * (base_speed * modifier) * delta
}

/// Default стратегия
///
/// Grounded: velocity полностью перезаписывается (vertical тоже).
/// Airborne: горизонталь с air модификатором, vertical сохраняется.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLocomotion {
    pub parameters: LocomotionParameters,
}

impl DefaultLocomotion {
    pub fn new(parameters: LocomotionParameters) -> Self {
        Self { parameters }
    }
}

impl LocomotionStrategy for DefaultLocomotion {
    fn name(&self) -> &'static str {
        "default"
    }

    fn move_body(&self, body: &mut PhysicsBody, base_speed: f32, direction: Vec3, grounded: bool, delta: f32) {
        let ground = self.parameters.ground_modifier;

        if grounded {
            body.velocity = scaled_velocity(direction, base_speed, ground, delta);
        } else {
            let air = scaled_velocity(direction, base_speed, ground * self.parameters.air_modifier, delta);
            body.velocity = Vec3::new(air.x, body.velocity.y, air.z);
        }
    }

    fn rotate_body(&self, transform: &mut Transform, yaw_degrees: f32) {
        transform.rotation = yaw_rotation(yaw_degrees);
    }
}

/// Eased стратегия: горизонтальная скорость идёт к цели с ограниченным ускорением,
/// поворот: slerp к целевому yaw на фиксированную долю за tick
#[derive(Debug, Clone, Copy)]
pub struct EasedLocomotion {
    pub parameters: LocomotionParameters,
    /// Максимальное изменение горизонтальной скорости (m/s за секунду)
    pub acceleration: f32,
    /// Доля оставшегося поворота за tick (0..=1)
    pub rotation_blend: f32,
}

impl Default for EasedLocomotion {
    fn default() -> Self {
        Self {
            parameters: LocomotionParameters::default(),
            acceleration: 40.0,
            rotation_blend: 0.25,
        }
    }
}

impl LocomotionStrategy for EasedLocomotion {
    fn name(&self) -> &'static str {
        "eased"
    }

    fn move_body(&self, body: &mut PhysicsBody, base_speed: f32, direction: Vec3, grounded: bool, delta: f32) {
        let modifier = if grounded {
            self.parameters.ground_modifier
        } else {
            self.parameters.ground_modifier * self.parameters.air_modifier
        };
        let target = scaled_velocity(direction, base_speed, modifier, delta);

        let current = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
        let wanted = Vec3::new(target.x, 0.0, target.z);
        let step = self.acceleration * delta;
        let offset = wanted - current;
        let next = if offset.length() <= step {
            wanted
        } else {
            current + offset.normalize() * step
        };

        let vertical = if grounded { target.y } else { body.velocity.y };
        body.velocity = Vec3::new(next.x, vertical, next.z);
    }

    fn rotate_body(&self, transform: &mut Transform, yaw_degrees: f32) {
        transform.rotation = transform
            .rotation
            .slerp(yaw_rotation(yaw_degrees), self.rotation_blend.clamp(0.0, 1.0));
    }

    fn rotate_gizmos(&self, shapes: &mut DebugShapes, transform: &Transform, yaw_degrees: f32) {
        let origin = transform.translation;
        shapes.line(origin, origin + transform.forward().as_vec3(), DebugColor::Blue);
        shapes.line(origin, origin + yaw_rotation(yaw_degrees) * Vec3::NEG_Z, DebugColor::Green);
    }
}

/// Handle на общую стратегию
#[derive(Clone)]
pub struct Locomotion(Arc<dyn LocomotionStrategy>);

impl Locomotion {
    pub fn new(strategy: impl LocomotionStrategy) -> Self {
        Self(Arc::new(strategy))
    }

    /// Тот же экземпляр стратегии (а не просто равные параметры)
    pub fn shares_instance(&self, other: &Locomotion) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new(DefaultLocomotion::default())
    }
}

impl Deref for Locomotion {
    type Target = dyn LocomotionStrategy;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for Locomotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Locomotion").field(&self.0.name()).finish()
    }
}

/// Стратегия, которую получают новые контроллеры (resource)
#[derive(Resource, Debug, Clone, Default)]
pub struct SharedLocomotion(pub Locomotion);
