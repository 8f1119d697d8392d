//! Rapier physics backend (bevy_rapier3d)
//!
//! Архитектура:
//! - Queries: RapierContext (cast_shape, cast_ray_and_get_normal, intersect_shape)
//!   принимают `&dyn Shape`, поэтому передаём `&*collider.raw`
//! - Наши компоненты authoritative: PhysicsBody → Velocity/RigidBody/ColliderDisabled
//!   до physics step, Velocity → PhysicsBody после Writeback
//! - Гравитацию считает GravityIntegrator, поэтому GravityScale(0.0) на всех телах
//!
//! Rapier шагает в FixedPostUpdate (`in_fixed_schedule`), синхронно с нашим FixedUpdate.

use bevy::ecs::system::SystemParamItem;
use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_rapier3d::plugin::PhysicsSet;
use bevy_rapier3d::prelude::{
    Collider, ColliderDisabled, CollisionGroups, GravityScale, Group, LockedAxes, NoUserData,
    QueryFilter as RapierFilter, RapierContext, RapierPhysicsPlugin, ReadRapierContext, RigidBody, Sensor,
    ShapeCastOptions, Velocity,
};

use super::{EmptyQueries, PhysicsBackend, ProbeFilter, ShapeHit, SpatialQueries};
use crate::components::{AttachedTo, ColliderShape, PhysicsBody, PhysicsLayer, Trigger};
use crate::controller::BodyController;
use crate::logger::log_warning;
use crate::physics::layers::LAYER_DEFAULT;
use crate::SimulationSet;

fn collision_groups(layer: u32) -> CollisionGroups {
    CollisionGroups::new(Group::from_bits_truncate(layer), Group::ALL)
}

fn rapier_filter<'a>(filter: &ProbeFilter) -> RapierFilter<'a> {
    let mut query = RapierFilter::new().groups(CollisionGroups::new(Group::ALL, Group::from_bits_truncate(filter.mask)));
    if !filter.include_triggers {
        query = query.exclude_sensors();
    }
    if let Some(entity) = filter.exclude {
        query = query.exclude_collider(entity);
    }
    query
}

fn rapier_collider(shape: &ColliderShape) -> Collider {
    match *shape {
        ColliderShape::Ball { radius } => Collider::ball(radius),
        ColliderShape::Cuboid { half_extents } => Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
    }
}

/// SpatialQueries поверх RapierContext
struct RapierQueries<'a, 'c> {
    context: &'a RapierContext<'c>,
}

impl SpatialQueries for RapierQueries<'_, '_> {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ShapeHit> {
        let direction = direction.try_normalize()?;
        let options = ShapeCastOptions {
            stop_at_penetration: false,
            ..ShapeCastOptions::with_max_time_of_impact(max_distance)
        };

        let ball = Collider::ball(radius);
        let (entity, hit) = self.context.cast_shape(
            origin,
            Quat::IDENTITY,
            direction,
            &*ball.raw,
            options,
            rapier_filter(filter),
        )?;

        // Нормаль и точку берём world-space ray cast'ом из центра сферы в момент контакта
        let center = origin + direction * hit.time_of_impact;
        let only_hit = |candidate: Entity| candidate == entity;
        let surface = self.context.cast_ray_and_get_normal(
            center,
            direction,
            radius * 2.0,
            true,
            rapier_filter(filter).predicate(&only_hit),
        );

        let (point, normal) = match surface {
            Some((_, intersection)) => (intersection.point, intersection.normal),
            None => (center + direction * radius, -direction),
        };

        Some(ShapeHit {
            entity,
            point,
            normal,
            distance: hit.time_of_impact,
        })
    }

    fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32, filter: &ProbeFilter) -> Option<ShapeHit> {
        let direction = direction.try_normalize()?;
        let (entity, intersection) =
            self.context
                .cast_ray_and_get_normal(origin, direction, max_distance, true, rapier_filter(filter))?;

        Some(ShapeHit {
            entity,
            point: intersection.point,
            normal: intersection.normal,
            distance: intersection.time_of_impact,
        })
    }

    fn overlap_capsule(&self, start: Vec3, end: Vec3, radius: f32, filter: &ProbeFilter) -> Vec<Entity> {
        let capsule = Collider::capsule(start, end, radius);
        let mut found = Vec::new();
        self.context.intersect_shape(
            Vec3::ZERO,
            Quat::IDENTITY,
            &*capsule.raw,
            rapier_filter(filter),
            |entity| {
                found.push(entity);
                true
            },
        );
        found.sort();
        found
    }

    fn overlap_box(&self, center: Vec3, half_extents: Vec3, rotation: Quat, filter: &ProbeFilter) -> Vec<Entity> {
        let cuboid = Collider::cuboid(half_extents.x, half_extents.y, half_extents.z);
        let mut found = Vec::new();
        self.context.intersect_shape(
            center,
            rotation,
            &*cuboid.raw,
            rapier_filter(filter),
            |entity| {
                found.push(entity);
                true
            },
        );
        found.sort();
        found
    }
}

/// System: добавить Rapier компоненты entity с ColliderShape
///
/// PhysicsBody → Dynamic (или KinematicPositionBased), без PhysicsBody → Fixed.
/// Контроллерам блокируем вращение: yaw пишет LocomotionStrategy.
#[allow(clippy::type_complexity)]
pub fn attach_rapier_components(
    mut commands: Commands,
    new_colliders: Query<
        (
            Entity,
            &ColliderShape,
            Option<&PhysicsBody>,
            Option<&PhysicsLayer>,
            Has<Trigger>,
            Has<BodyController>,
        ),
        Without<Collider>,
    >,
) {
    for (entity, shape, body, layer, trigger, controller) in new_colliders.iter() {
        let layer = layer.map_or(LAYER_DEFAULT, |layer| layer.0);
        let mut entity_commands = commands.entity(entity);
        entity_commands.insert((rapier_collider(shape), collision_groups(layer)));

        if trigger {
            entity_commands.insert(Sensor);
        }

        match body {
            Some(body) => {
                let rigid_body = if body.kinematic {
                    RigidBody::KinematicPositionBased
                } else {
                    RigidBody::Dynamic
                };
                entity_commands.insert((
                    rigid_body,
                    Velocity::linear(body.velocity),
                    GravityScale(0.0),
                ));
                if controller {
                    entity_commands.insert(LockedAxes::ROTATION_LOCKED);
                }
            }
            None => {
                entity_commands.insert(RigidBody::Fixed);
            }
        }
    }
}

/// System: PhysicsBody → Rapier (velocity, kinematic, detect_collisions)
pub fn push_bodies_to_rapier(
    mut commands: Commands,
    mut bodies: Query<(Entity, &PhysicsBody, &mut Velocity, &mut RigidBody, Has<ColliderDisabled>, Has<AttachedTo>)>,
) {
    for (entity, body, mut velocity, mut rigid_body, disabled, attached) in bodies.iter_mut() {
        velocity.linvel = if attached { Vec3::ZERO } else { body.velocity };

        let wanted = if body.kinematic || attached {
            RigidBody::KinematicPositionBased
        } else {
            RigidBody::Dynamic
        };
        if *rigid_body != wanted {
            *rigid_body = wanted;
        }

        match (body.detect_collisions, disabled) {
            (false, false) => {
                commands.entity(entity).insert(ColliderDisabled);
            }
            (true, true) => {
                commands.entity(entity).remove::<ColliderDisabled>();
            }
            _ => {}
        }
    }
}

/// System: Rapier → PhysicsBody (после physics step)
pub fn pull_bodies_from_rapier(mut bodies: Query<(&Velocity, &mut PhysicsBody), Without<AttachedTo>>) {
    for (velocity, mut body) in bodies.iter_mut() {
        if !body.kinematic {
            body.velocity = velocity.linvel;
        }
    }
}

/// Rapier backend
pub struct RapierBackend;

impl PhysicsBackend for RapierBackend {
    type Queries = ReadRapierContext<'static, 'static>;

    fn with_queries<R>(
        param: &SystemParamItem<'_, '_, Self::Queries>,
        f: impl FnOnce(&dyn SpatialQueries) -> R,
    ) -> R {
        match param.single() {
            Ok(context) => f(&RapierQueries { context: &context }),
            Err(error) => {
                log_warning(&format!("Rapier context unavailable ({error}), spatial queries return nothing"));
                f(&EmptyQueries)
            }
        }
    }

    fn build(app: &mut App) {
        if !app.is_plugin_added::<TransformPlugin>() {
            app.add_plugins(TransformPlugin);
        }

        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
            .add_systems(
                FixedUpdate,
                (attach_rapier_components, push_bodies_to_rapier)
                    .chain()
                    .in_set(SimulationSet::Integrate),
            )
            .add_systems(FixedPostUpdate, pull_bodies_from_rapier.after(PhysicsSet::Writeback));
    }
}
