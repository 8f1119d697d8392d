//! Ground sensing: sphere cast вниз от низа коллайдера
//!
//! Архитектура:
//! - GroundSensor: per body компонент (параметры + последнее состояние)
//! - probe() кэширует результат на SimulationTick: повторный вызов в том же tick
//!   возвращает тот же результат и не генерирует Landed/LeftGround повторно
//! - Landed / LeftGround: edge-triggered events (одно событие на переход)

use bevy::ecs::system::StaticSystemParam;
use bevy::prelude::*;

use crate::components::ColliderShape;
use crate::debug::{DebugColor, DebugShapes};
use crate::physics::layers::MASK_GROUND;
use crate::physics::{PhysicsBackend, ProbeFilter, ShapeHit, SpatialQueries};
use crate::SimulationTick;

/// Подъём старта каста над низом коллайдера
const GROUND_CAST_EPSILON: f32 = 0.03;

/// Результат ground probe (валиден только для tick, в котором посчитан)
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct GroundProbeResult {
    pub grounded: bool,
    pub point: Vec3,
    /// Нормаль опоры; Vec3::ZERO когда не grounded
    pub normal: Vec3,
}

impl GroundProbeResult {
    pub const AIRBORNE: Self = Self {
        grounded: false,
        point: Vec3::ZERO,
        normal: Vec3::ZERO,
    };
}

/// Переход grounded состояния
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTransition {
    Landed,
    LeftGround,
}

/// Event: тело приземлилось
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landed {
    pub entity: Entity,
}

/// Event: тело оторвалось от земли
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeftGround {
    pub entity: Entity,
}

/// Ground sensor
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct GroundSensor {
    /// Множитель радиуса (radius = ширина коллайдера / 2 * modifier)
    pub radius_modifier: f32,
    /// Длина каста вниз
    pub probe_length: f32,
    /// Offset старта каста (x/z; y перезаписывается низом коллайдера)
    pub offset: Vec3,
    /// Маска слоёв опоры
    pub mask: u32,

    grounded: bool,
    last_tick: Option<u64>,
    last_result: GroundProbeResult,
    #[reflect(ignore)]
    last_hit: Option<ShapeHit>,
    last_origin: Vec3,
    last_radius: f32,
}

impl Default for GroundSensor {
    fn default() -> Self {
        Self::new(1.0, 0.1, Vec3::ZERO, MASK_GROUND)
    }
}

impl GroundSensor {
    pub fn new(radius_modifier: f32, probe_length: f32, offset: Vec3, mask: u32) -> Self {
        Self {
            radius_modifier,
            probe_length,
            offset,
            mask,
            grounded: false,
            last_tick: None,
            last_result: GroundProbeResult::AIRBORNE,
            last_hit: None,
            last_origin: Vec3::ZERO,
            last_radius: 0.0,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Последний результат (для debug и систем, которым не нужен свежий каст)
    pub fn last_result(&self) -> GroundProbeResult {
        self.last_result
    }

    pub fn last_hit(&self) -> Option<ShapeHit> {
        self.last_hit
    }

    /// Радиус и старт каста по bounds коллайдера
    pub fn cast_geometry(&self, transform: &Transform, shape: &ColliderShape) -> (Vec3, f32) {
        let (min, max) = shape.aabb(transform);
        let radius = (max.x - min.x) / 2.0 * self.radius_modifier;

        let mut origin = transform.translation + self.offset;
        origin.y = min.y + GROUND_CAST_EPSILON + radius;
        (origin, radius)
    }

    /// Ground probe с кэшем на tick
    ///
    /// Возвращает результат и переход (только при первом вызове в tick).
    pub fn probe(
        &mut self,
        queries: &dyn SpatialQueries,
        tick: u64,
        entity: Entity,
        transform: &Transform,
        shape: &ColliderShape,
    ) -> (GroundProbeResult, Option<GroundTransition>) {
        if self.last_tick == Some(tick) {
            return (self.last_result, None);
        }

        let (origin, radius) = self.cast_geometry(transform, shape);
        let filter = ProbeFilter::new(self.mask).excluding(entity);
        let hit = queries
            .sphere_cast(origin, radius, Vec3::NEG_Y, self.probe_length, &filter)
            // Опора только "полом": нормаль не против направления каста
            .filter(|hit| hit.normal.dot(Vec3::Y) >= 0.0);

        let result = match hit {
            Some(hit) => GroundProbeResult {
                grounded: true,
                point: hit.point,
                normal: hit.normal,
            },
            None => GroundProbeResult::AIRBORNE,
        };

        let transition = match (self.grounded, result.grounded) {
            (false, true) => Some(GroundTransition::Landed),
            (true, false) => Some(GroundTransition::LeftGround),
            _ => None,
        };

        self.grounded = result.grounded;
        self.last_tick = Some(tick);
        self.last_result = result;
        self.last_hit = hit;
        self.last_origin = origin;
        self.last_radius = radius;

        (result, transition)
    }

    /// Debug: сфера старта (blue), сфера контакта (green) или конца каста (red), линия
    pub fn draw_debug(&self, shapes: &mut DebugShapes) {
        let origin = self.last_origin;
        let radius = self.last_radius;
        shapes.sphere(origin, radius, DebugColor::Blue);

        match self.last_hit.filter(|_| self.grounded) {
            Some(hit) => {
                shapes.sphere(hit.point + Vec3::Y * radius, radius, DebugColor::Green);
                shapes.line(origin, hit.point, DebugColor::Green);
            }
            None => {
                let end = origin + Vec3::NEG_Y * self.probe_length;
                shapes.sphere(end, radius, DebugColor::Red);
                shapes.line(origin, end, DebugColor::Red);
            }
        }
    }
}

/// Отправить event перехода
pub fn emit_transition(
    entity: Entity,
    transition: Option<GroundTransition>,
    landed: &mut EventWriter<Landed>,
    left_ground: &mut EventWriter<LeftGround>,
) {
    match transition {
        Some(GroundTransition::Landed) => {
            landed.write(Landed { entity });
        }
        Some(GroundTransition::LeftGround) => {
            left_ground.write(LeftGround { entity });
        }
        None => {}
    }
}

/// System: ground probe для всех сенсоров (FixedUpdate, до drive_controllers)
pub fn probe_ground<B: PhysicsBackend>(
    queries: StaticSystemParam<B::Queries>,
    tick: Res<SimulationTick>,
    mut debug: ResMut<DebugShapes>,
    mut sensors: Query<(Entity, &Transform, &ColliderShape, &mut GroundSensor)>,
    mut landed: EventWriter<Landed>,
    mut left_ground: EventWriter<LeftGround>,
) {
    B::with_queries(&*queries, |spatial| {
        for (entity, transform, shape, mut sensor) in sensors.iter_mut() {
            let (_, transition) = sensor.probe(spatial, tick.0, entity, transform, shape);
            emit_transition(entity, transition, &mut landed, &mut left_ground);
            sensor.draw_debug(&mut debug);
        }
    });
}
