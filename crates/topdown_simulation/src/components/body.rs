//! Физическое тело: velocity, флаги, форма коллайдера, слои
//!
//! Архитектура:
//! - PhysicsBody: то, что core читает/пишет (velocity, kinematic, detect_collisions)
//! - ColliderShape: форма для spatial queries (headless world или Rapier collider)
//! - AttachedTo: "parenting" к hold point (tool в руке, объект в вакууме)

use bevy::prelude::*;

use crate::physics::layers::LAYER_DEFAULT;

/// Физическое тело (velocity integration: backend, флаги: core)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    /// Линейная скорость (m/s)
    pub velocity: Vec3,
    /// Kinematic: backend не интегрирует velocity и не применяет контакты
    pub kinematic: bool,
    /// false → тело исключено из всех spatial queries и контактов
    pub detect_collisions: bool,
    /// Масса (kg), делитель для impulse
    pub mass: f32,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            kinematic: false,
            detect_collisions: true,
            mass: 1.0,
        }
    }
}

impl PhysicsBody {
    pub fn with_mass(mass: f32) -> Self {
        Self {
            mass,
            ..default()
        }
    }

    /// Мгновенное изменение импульса: velocity += impulse / mass
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.mass.max(f32::EPSILON);
    }
}

/// Форма коллайдера
///
/// Cuboid поворачивается вместе с Transform (OBB), Ball инвариантен к повороту.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub enum ColliderShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

impl Default for ColliderShape {
    fn default() -> Self {
        // Персонаж: 0.8 x 1.8 x 0.8
        Self::Cuboid {
            half_extents: Vec3::new(0.4, 0.9, 0.4),
        }
    }
}

impl ColliderShape {
    /// World-space AABB half extents для данного поворота
    pub fn aabb_half_extents(&self, rotation: Quat) -> Vec3 {
        match *self {
            ColliderShape::Ball { radius } => Vec3::splat(radius),
            ColliderShape::Cuboid { half_extents } => {
                let basis = Mat3::from_quat(rotation);
                let abs = Mat3::from_cols(basis.x_axis.abs(), basis.y_axis.abs(), basis.z_axis.abs());
                abs * half_extents
            }
        }
    }

    /// World-space AABB (min, max)
    pub fn aabb(&self, transform: &Transform) -> (Vec3, Vec3) {
        let half = self.aabb_half_extents(transform.rotation);
        (transform.translation - half, transform.translation + half)
    }
}

/// Слой (битовая маска membership), см. `physics::layers`
///
/// Entity без PhysicsLayer считается на LAYER_DEFAULT.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct PhysicsLayer(pub u32);

impl Default for PhysicsLayer {
    fn default() -> Self {
        Self(LAYER_DEFAULT)
    }
}

impl PhysicsLayer {
    pub fn matches(&self, mask: u32) -> bool {
        self.0 & mask != 0
    }
}

/// Trigger volume: не участвует в контактах, ground probe его игнорирует
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Trigger;

/// Привязка к другому entity с локальным offset
///
/// Каждый tick Transform child = parent.translation + parent.rotation * offset,
/// rotation копируется с parent. Цепочки (vacuum в руке → объект в vacuum) поддерживаются.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AttachedTo {
    pub parent: Entity,
    pub offset: Vec3,
}
