//! Headless physics backend (без Rapier)
//!
//! Архитектура:
//! - ShapeWorld: snapshot коллайдеров, пересобирается в начале каждого schedule
//!   из (Transform, ColliderShape, PhysicsLayer, PhysicsBody, Trigger)
//! - Queries: аналитическая геометрия: ray/sphere vs ball/OBB, capsule/box overlap (SAT)
//! - integrate_bodies: position += velocity * dt + опора на статические коллайдеры сверху
//!
//! Контакты между динамическими телами и стены не резолвятся: для этого RapierBackend.

use bevy::ecs::system::SystemParamItem;
use bevy::prelude::*;

use super::{PhysicsBackend, ProbeFilter, ShapeHit, SpatialQueries};
use crate::components::{AttachedTo, ColliderShape, PhysicsBody, PhysicsLayer, Trigger};
use crate::physics::layers::LAYER_DEFAULT;
use crate::SimulationSet;

/// Допуск, с которым тело считается стоящим на опоре
const SUPPORT_TOLERANCE: f32 = 1e-3;

/// Ray считается стартующим внутри коллайдера ближе этого расстояния
const SURFACE_EPSILON: f32 = 1e-4;

/// Ternary search итерации для segment ↔ box distance
const SEGMENT_SEARCH_STEPS: usize = 48;

#[derive(Debug, Clone, Copy)]
struct WorldShape {
    entity: Entity,
    center: Vec3,
    rotation: Quat,
    shape: ColliderShape,
    layer: u32,
    trigger: bool,
    dynamic: bool,
}

impl WorldShape {
    fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.center)
    }

    /// Расстояние от точки до поверхности (0 внутри)
    fn distance_to(&self, point: Vec3) -> f32 {
        match self.shape {
            ColliderShape::Ball { radius } => ((point - self.center).length() - radius).max(0.0),
            ColliderShape::Cuboid { half_extents } => box_distance(self.to_local(point), half_extents),
        }
    }

    /// Sweep сферы (radius 0 → ray). Формы, которые уже пересекает начальная сфера, игнорируются.
    fn cast(&self, origin: Vec3, radius: f32, direction: Vec3, max_distance: f32) -> Option<(f32, Vec3, Vec3)> {
        if self.distance_to(origin) < radius.max(SURFACE_EPSILON) {
            return None;
        }

        let (distance, point, normal) = match self.shape {
            ColliderShape::Ball { radius: ball_radius } => {
                let combined = ball_radius + radius;
                let m = origin - self.center;
                let b = m.dot(direction);
                let c = m.length_squared() - combined * combined;
                if b > 0.0 {
                    return None;
                }
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let distance = (-b - discriminant.sqrt()).max(0.0);
                let normal = (origin + direction * distance - self.center).normalize_or(-direction);
                (distance, self.center + normal * ball_radius, normal)
            }
            ColliderShape::Cuboid { half_extents } => {
                // Box, раздутый на radius (углы не скругляем, консервативно)
                let local_origin = self.to_local(origin);
                let local_direction = self.rotation.inverse() * direction;
                let (distance, local_normal) =
                    ray_aabb(local_origin, local_direction, half_extents + Vec3::splat(radius))?;
                let normal = self.rotation * local_normal;
                let sphere_center = origin + direction * distance;
                (distance, sphere_center - normal * radius, normal)
            }
        };

        (distance <= max_distance).then_some((distance, point, normal))
    }

    fn overlaps_segment(&self, start: Vec3, end: Vec3, radius: f32) -> bool {
        match self.shape {
            ColliderShape::Ball { radius: ball_radius } => {
                segment_point_distance(start, end, self.center) <= ball_radius + radius
            }
            ColliderShape::Cuboid { half_extents } => {
                segment_box_distance(self.to_local(start), self.to_local(end), half_extents) <= radius
            }
        }
    }

    fn overlaps_box(&self, center: Vec3, half_extents: Vec3, rotation: Quat) -> bool {
        match self.shape {
            ColliderShape::Ball { radius } => {
                let local = rotation.inverse() * (self.center - center);
                box_distance(local, half_extents) <= radius
            }
            ColliderShape::Cuboid {
                half_extents: own_half,
            } => obb_overlap(center, half_extents, rotation, self.center, own_half, self.rotation),
        }
    }

    fn aabb(&self) -> (Vec3, Vec3) {
        let half = self.shape.aabb_half_extents(self.rotation);
        (self.center - half, self.center + half)
    }
}

/// Snapshot коллайдеров для headless queries
#[derive(Resource, Debug, Default)]
pub struct ShapeWorld {
    shapes: Vec<WorldShape>,
}

impl ShapeWorld {
    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// `dynamic`: тело, которое двигается интегратором (не опора для других)
    pub fn insert(
        &mut self,
        entity: Entity,
        transform: &Transform,
        shape: ColliderShape,
        layer: u32,
        trigger: bool,
        dynamic: bool,
    ) {
        self.shapes.push(WorldShape {
            entity,
            center: transform.translation,
            rotation: transform.rotation,
            shape,
            layer,
            trigger,
            dynamic,
        });
    }

    fn candidates<'a>(&'a self, filter: &'a ProbeFilter) -> impl Iterator<Item = &'a WorldShape> + 'a {
        self.shapes
            .iter()
            .filter(move |shape| filter.accepts(shape.entity, shape.layer, shape.trigger))
    }

    fn closest_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ShapeHit> {
        let direction = direction.try_normalize()?;

        self.candidates(filter)
            .filter_map(|shape| {
                shape
                    .cast(origin, radius, direction, max_distance)
                    .map(|(distance, point, normal)| ShapeHit {
                        entity: shape.entity,
                        point,
                        normal,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Верх самой высокой статической опоры под footprint тела
    ///
    /// Опора засчитывается, только если на прошлом шаге низ тела был не ниже её верха.
    pub fn support_top(&self, entity: Entity, center: Vec3, half_extents: Vec3, previous_bottom: f32) -> Option<f32> {
        let min = center - half_extents;
        let max = center + half_extents;

        self.shapes
            .iter()
            .filter(|shape| shape.entity != entity && !shape.trigger && !shape.dynamic)
            .filter_map(|shape| {
                let (shape_min, shape_max) = shape.aabb();
                let overlaps_xz = min.x < shape_max.x
                    && max.x > shape_min.x
                    && min.z < shape_max.z
                    && max.z > shape_min.z;
                let top = shape_max.y;
                (overlaps_xz && previous_bottom >= top - SUPPORT_TOLERANCE).then_some(top)
            })
            .max_by(|a, b| a.total_cmp(b))
    }
}

impl SpatialQueries for ShapeWorld {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ShapeHit> {
        self.closest_cast(origin, radius, direction, max_distance, filter)
    }

    fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32, filter: &ProbeFilter) -> Option<ShapeHit> {
        self.closest_cast(origin, 0.0, direction, max_distance, filter)
    }

    fn overlap_capsule(&self, start: Vec3, end: Vec3, radius: f32, filter: &ProbeFilter) -> Vec<Entity> {
        self.candidates(filter)
            .filter(|shape| shape.overlaps_segment(start, end, radius))
            .map(|shape| shape.entity)
            .collect()
    }

    fn overlap_box(&self, center: Vec3, half_extents: Vec3, rotation: Quat, filter: &ProbeFilter) -> Vec<Entity> {
        self.candidates(filter)
            .filter(|shape| shape.overlaps_box(center, half_extents, rotation))
            .map(|shape| shape.entity)
            .collect()
    }
}

/// Расстояние от локальной точки до AABB с центром в нуле
fn box_distance(local: Vec3, half_extents: Vec3) -> f32 {
    (local.abs() - half_extents).max(Vec3::ZERO).length()
}

/// Slab test. Возвращает (distance, local normal) входа; None если origin внутри или промах.
fn ray_aabb(origin: Vec3, direction: Vec3, half_extents: Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let (o, d, h) = (origin[axis], direction[axis], half_extents[axis]);

        if d.abs() < 1e-8 {
            if o.abs() > h {
                return None;
            }
            continue;
        }

        let inverse = 1.0 / d;
        let mut near = (-h - o) * inverse;
        let mut far = (h - o) * inverse;
        // Вход через -h грань → нормаль смотрит в -axis
        let mut sign = -1.0;
        if near > far {
            std::mem::swap(&mut near, &mut far);
            sign = 1.0;
        }

        if near > t_enter {
            t_enter = near;
            normal = Vec3::ZERO;
            normal[axis] = sign;
        }
        t_exit = t_exit.min(far);

        if t_enter > t_exit {
            return None;
        }
    }

    (t_enter >= 0.0 && t_enter.is_finite()).then_some((t_enter, normal))
}

fn segment_point_distance(start: Vec3, end: Vec3, point: Vec3) -> f32 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return (point - start).length();
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}

/// Минимум расстояния segment ↔ box. Функция выпуклая по t, поэтому ternary search.
fn segment_box_distance(start: Vec3, end: Vec3, half_extents: Vec3) -> f32 {
    let at = |t: f32| box_distance(start.lerp(end, t), half_extents);

    let (mut low, mut high) = (0.0_f32, 1.0_f32);
    for _ in 0..SEGMENT_SEARCH_STEPS {
        let m1 = low + (high - low) / 3.0;
        let m2 = high - (high - low) / 3.0;
        if at(m1) <= at(m2) {
            high = m2;
        } else {
            low = m1;
        }
    }

    at((low + high) * 0.5).min(at(0.0)).min(at(1.0))
}

/// Separating Axis Test для двух OBB
fn obb_overlap(
    center_a: Vec3,
    half_a: Vec3,
    rotation_a: Quat,
    center_b: Vec3,
    half_b: Vec3,
    rotation_b: Quat,
) -> bool {
    let axes_a = [rotation_a * Vec3::X, rotation_a * Vec3::Y, rotation_a * Vec3::Z];
    let axes_b = [rotation_b * Vec3::X, rotation_b * Vec3::Y, rotation_b * Vec3::Z];
    let offset = center_b - center_a;

    let mut axes: Vec<Vec3> = axes_a.iter().chain(axes_b.iter()).copied().collect();
    for a in &axes_a {
        for b in &axes_b {
            if let Some(axis) = a.cross(*b).try_normalize() {
                axes.push(axis);
            }
        }
    }

    let project = |axes: &[Vec3; 3], half: Vec3, axis: Vec3| -> f32 {
        half.x * axes[0].dot(axis).abs() + half.y * axes[1].dot(axis).abs() + half.z * axes[2].dot(axis).abs()
    };

    axes.iter().all(|axis| {
        offset.dot(*axis).abs() <= project(&axes_a, half_a, *axis) + project(&axes_b, half_b, *axis)
    })
}

/// System: пересобрать ShapeWorld из ECS
///
/// Тела с `detect_collisions == false` (tool в руке) в мир не попадают.
pub fn rebuild_shape_world(
    mut world: ResMut<ShapeWorld>,
    colliders: Query<(
        Entity,
        &Transform,
        &ColliderShape,
        Option<&PhysicsLayer>,
        Option<&PhysicsBody>,
        Has<Trigger>,
    )>,
) {
    world.clear();

    let mut entries: Vec<_> = colliders
        .iter()
        .filter(|(_, _, _, _, body, _)| body.map_or(true, |body| body.detect_collisions))
        .collect();
    entries.sort_by_key(|(entity, ..)| *entity);

    for (entity, transform, shape, layer, body, trigger) in entries {
        let layer = layer.map_or(LAYER_DEFAULT, |layer| layer.0);
        let dynamic = body.is_some_and(|body| !body.kinematic);
        world.insert(entity, transform, *shape, layer, trigger, dynamic);
    }
}

/// System: интеграция velocity → Transform (headless режим, без Rapier)
///
/// Kinematic и attached тела не двигаются. Падающее тело останавливается на
/// верхней грани статического коллайдера (vertical velocity → 0).
pub fn integrate_bodies(
    time: Res<Time>,
    world: Res<ShapeWorld>,
    mut bodies: Query<(Entity, &mut Transform, &mut PhysicsBody, Option<&ColliderShape>), Without<AttachedTo>>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut body, shape) in bodies.iter_mut() {
        if body.kinematic {
            continue;
        }

        let previous = transform.translation;
        transform.translation += body.velocity * delta;

        let Some(shape) = shape else {
            continue;
        };
        if !body.detect_collisions || body.velocity.y > 0.0 {
            continue;
        }

        let half = shape.aabb_half_extents(transform.rotation);
        let previous_bottom = previous.y - half.y;
        let bottom = transform.translation.y - half.y;

        if let Some(top) = world.support_top(entity, transform.translation, half, previous_bottom) {
            if bottom < top {
                transform.translation.y += top - bottom;
                body.velocity.y = 0.0;
            }
        }
    }
}

/// Headless backend: ShapeWorld + прямая интеграция
pub struct HeadlessBackend;

impl PhysicsBackend for HeadlessBackend {
    type Queries = Res<'static, ShapeWorld>;

    fn with_queries<R>(
        param: &SystemParamItem<'_, '_, Self::Queries>,
        f: impl FnOnce(&dyn SpatialQueries) -> R,
    ) -> R {
        let world: &ShapeWorld = param;
        f(world)
    }

    fn build(app: &mut App) {
        app.init_resource::<ShapeWorld>()
            .add_systems(FixedUpdate, rebuild_shape_world.in_set(SimulationSet::Prepare))
            .add_systems(Update, rebuild_shape_world.in_set(SimulationSet::Prepare))
            .add_systems(FixedUpdate, integrate_bodies.in_set(SimulationSet::Integrate));
    }
}
