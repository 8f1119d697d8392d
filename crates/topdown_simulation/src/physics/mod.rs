//! Physics collaborator: spatial queries + backend абстракция
//!
//! Архитектура:
//! - `SpatialQueries`: четыре запроса, от которых зависит core (sphere cast, ray cast,
//!   capsule overlap, box overlap). Core не знает реализацию.
//! - `PhysicsBackend`: связывает queries с ECS (через SystemParam) и регистрирует
//!   backend-специфичные системы (sync, integration).
//! - HeadlessBackend: аналитический shape world без физического движка (тесты, сервер).
//! - RapierBackend: bevy_rapier3d RapierContext.

use bevy::ecs::system::{SystemParam, SystemParamItem};
use bevy::prelude::*;

use crate::components::ColliderShape;

pub mod attachment;
pub mod headless;
pub mod layers;
pub mod rapier;

pub use attachment::sync_attachments;
pub use headless::{HeadlessBackend, ShapeWorld};
pub use layers::*;
pub use rapier::RapierBackend;

/// Результат cast запроса
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    pub entity: Entity,
    /// Точка контакта на поверхности hit коллайдера
    pub point: Vec3,
    /// Нормаль поверхности в точке контакта
    pub normal: Vec3,
    /// Пройденная дистанция вдоль direction
    pub distance: f32,
}

/// Фильтр запроса: маска слоёв, triggers, исключённый entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeFilter {
    pub mask: u32,
    pub include_triggers: bool,
    pub exclude: Option<Entity>,
}

impl Default for ProbeFilter {
    fn default() -> Self {
        Self::new(MASK_ALL)
    }
}

impl ProbeFilter {
    pub fn new(mask: u32) -> Self {
        Self {
            mask,
            include_triggers: false,
            exclude: None,
        }
    }

    pub fn excluding(mut self, entity: Entity) -> Self {
        self.exclude = Some(entity);
        self
    }

    pub fn with_triggers(mut self) -> Self {
        self.include_triggers = true;
        self
    }

    pub fn accepts(&self, entity: Entity, layer: u32, trigger: bool) -> bool {
        if self.exclude == Some(entity) {
            return false;
        }
        if trigger && !self.include_triggers {
            return false;
        }
        layer & self.mask != 0
    }
}

/// Spatial queries, которые использует core
///
/// Casts игнорируют коллайдеры, внутри которых уже находится начальная форма.
/// Overlap результаты упорядочены детерминированно (по Entity).
pub trait SpatialQueries {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ShapeHit>;

    fn ray_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ShapeHit>;

    fn overlap_capsule(&self, start: Vec3, end: Vec3, radius: f32, filter: &ProbeFilter) -> Vec<Entity>;

    fn overlap_box(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        filter: &ProbeFilter,
    ) -> Vec<Entity>;

    /// Overlap по форме коллайдера (zones)
    fn overlap_collider(&self, shape: &ColliderShape, transform: &Transform, filter: &ProbeFilter) -> Vec<Entity> {
        match *shape {
            ColliderShape::Ball { radius } => {
                self.overlap_capsule(transform.translation, transform.translation, radius, filter)
            }
            ColliderShape::Cuboid { half_extents } => {
                self.overlap_box(transform.translation, half_extents, transform.rotation, filter)
            }
        }
    }
}

/// Пустой мир (backend ещё не готов)
pub struct EmptyQueries;

impl SpatialQueries for EmptyQueries {
    fn sphere_cast(&self, _: Vec3, _: f32, _: Vec3, _: f32, _: &ProbeFilter) -> Option<ShapeHit> {
        None
    }

    fn ray_cast(&self, _: Vec3, _: Vec3, _: f32, _: &ProbeFilter) -> Option<ShapeHit> {
        None
    }

    fn overlap_capsule(&self, _: Vec3, _: Vec3, _: f32, _: &ProbeFilter) -> Vec<Entity> {
        Vec::new()
    }

    fn overlap_box(&self, _: Vec3, _: Vec3, _: Quat, _: &ProbeFilter) -> Vec<Entity> {
        Vec::new()
    }
}

/// Physics backend
///
/// `Queries`: SystemParam, из которого строится `SpatialQueries` на время вызова.
/// Системы core generic по backend: `fn probe_ground<B: PhysicsBackend>(queries: StaticSystemParam<B::Queries>, ..)`.
pub trait PhysicsBackend: Send + Sync + 'static {
    type Queries: SystemParam + 'static;

    fn with_queries<R>(
        param: &SystemParamItem<'_, '_, Self::Queries>,
        f: impl FnOnce(&dyn SpatialQueries) -> R,
    ) -> R;

    /// Регистрация backend систем (sync, integration) в `SimulationSet`
    fn build(app: &mut App);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rejects_excluded_and_triggers() {
        let me = Entity::from_raw(1);
        let other = Entity::from_raw(2);
        let filter = ProbeFilter::new(LAYER_GROUND).excluding(me);

        assert!(!filter.accepts(me, LAYER_GROUND, false));
        assert!(filter.accepts(other, LAYER_GROUND, false));
        assert!(!filter.accepts(other, LAYER_GROUND, true));
        assert!(!filter.accepts(other, LAYER_ACTORS, false));
        assert!(filter.with_triggers().accepts(other, LAYER_GROUND, true));
    }
}
