//! Body Controller: input + камера → rotation/velocity тела
//!
//! Архитектура:
//! - BodyController: параметры контроллера (скорость, стратегия, interaction probe)
//! - Required Components тянут всё остальное (PhysicsBody, GroundSensor, GravityIntegrator,
//!   ControllerInput, InteractionSession, ToolHolder), как Actor в симуляции
//! - drive_controllers (FixedUpdate): ground probe → aim → rotate → gravity → move
//!
//! Interaction probe контроллера живёт в `interaction` (Update).

use bevy::ecs::system::StaticSystemParam;
use bevy::prelude::*;

use crate::components::{AttachedTo, CameraRig, ColliderShape, ControllerInput, PhysicsBody};
use crate::debug::DebugShapes;
use crate::interaction::InteractionSession;
use crate::locomotion::ground::emit_transition;
use crate::locomotion::{yaw_rotation, GravityIntegrator, GroundProbeResult, GroundSensor, Landed, LeftGround, Locomotion};
use crate::physics::layers::MASK_INTERACTION;
use crate::physics::PhysicsBackend;
use crate::tools::ToolHolder;
use crate::SimulationTick;

/// Контроллер тела
#[derive(Component, Debug, Clone)]
#[require(
    Transform,
    PhysicsBody,
    ColliderShape,
    GroundSensor,
    GravityIntegrator,
    ControllerInput,
    InteractionSession,
    ToolHolder
)]
pub struct BodyController {
    /// Базовая скорость (> 0), масштабируется dt внутри стратегии
    pub base_speed: f32,
    /// Общая (shared) стратегия движения
    pub locomotion: Locomotion,
    /// Точка старта interaction луча (локально к телу)
    pub interaction_cast_offset: Vec3,
    pub interaction_length: f32,
    pub interaction_mask: u32,
    /// Рисовать debug shapes для этого контроллера
    pub debug: bool,

    facing_yaw: f32,
}

impl Default for BodyController {
    fn default() -> Self {
        Self::new(300.0, Locomotion::default())
    }
}

impl BodyController {
    pub fn new(base_speed: f32, locomotion: Locomotion) -> Self {
        Self {
            base_speed,
            locomotion,
            interaction_cast_offset: Vec3::new(0.0, -0.75, 0.0),
            interaction_length: 1.0,
            interaction_mask: MASK_INTERACTION,
            debug: false,
            facing_yaw: 0.0,
        }
    }

    /// Текущий yaw взгляда (compass градусы)
    pub fn facing_yaw(&self) -> f32 {
        self.facing_yaw
    }
}

/// Yaw прицела: вектор от тела (на экране) к курсору + yaw камеры
///
/// Yaw камеры прибавляется, а не вычитается: курсор над точкой из
/// `CameraRig::world_to_screen` даёт yaw ровно на эту точку.
/// Нулевой вектор → текущий yaw сохраняется.
pub fn aim_yaw_degrees(cursor: Vec2, body_on_screen: Vec2, camera_yaw: f32, current_yaw: f32) -> f32 {
    let aim = cursor - body_on_screen;
    if aim.length_squared() <= f32::EPSILON {
        return current_yaw;
    }
    aim.x.atan2(aim.y).to_degrees() + camera_yaw
}

/// Направление движения в мире
///
/// Угол input (x вправо, y вверх) + yaw камеры. На земле направление проецируется
/// на плоскость опоры (normal × right), в воздухе горизонтальный forward.
pub fn move_direction(axis: Vec2, camera_yaw: f32, ground: &GroundProbeResult) -> Vec3 {
    if axis == Vec2::ZERO {
        return Vec3::ZERO;
    }

    let rotation = yaw_rotation(axis.x.atan2(axis.y).to_degrees() + camera_yaw);
    if ground.grounded {
        ground.normal.cross(rotation * Vec3::X)
    } else {
        rotation * Vec3::NEG_Z
    }
}

/// System: physics tick всех контроллеров
///
/// Порядок фиксирован: rotate → gravity → move (velocity видит heading этого tick).
/// Ground probe берётся из кэша сенсора, если `probe_ground` уже отработал в этом tick.
#[allow(clippy::too_many_arguments)]
pub fn drive_controllers<B: PhysicsBackend>(
    queries: StaticSystemParam<B::Queries>,
    time: Res<Time>,
    tick: Res<SimulationTick>,
    camera: Res<CameraRig>,
    mut debug: ResMut<DebugShapes>,
    mut controllers: Query<
        (
            Entity,
            &mut BodyController,
            &ControllerInput,
            &GravityIntegrator,
            &ColliderShape,
            &mut GroundSensor,
            &mut Transform,
            &mut PhysicsBody,
        ),
        Without<AttachedTo>,
    >,
    mut landed: EventWriter<Landed>,
    mut left_ground: EventWriter<LeftGround>,
) {
    let delta = time.delta_secs();

    B::with_queries(&*queries, |spatial| {
        for (entity, mut controller, input, gravity, shape, mut sensor, mut transform, mut body) in
            controllers.iter_mut()
        {
            let (ground, transition) = sensor.probe(spatial, tick.0, entity, &transform, shape);
            emit_transition(entity, transition, &mut landed, &mut left_ground);

            let body_on_screen = camera.world_to_screen(transform.translation);
            let yaw = aim_yaw_degrees(input.aim_cursor, body_on_screen, camera.yaw_degrees, controller.facing_yaw);
            controller.facing_yaw = yaw;

            let direction = move_direction(input.move_axis, camera.yaw_degrees, &ground);
            let strategy = controller.locomotion.clone();

            strategy.rotate_body(&mut transform, yaw);
            gravity.apply(&mut body, delta);
            strategy.move_body(&mut body, controller.base_speed, direction, ground.grounded, delta);

            if controller.debug {
                strategy.rotate_gizmos(&mut debug, &transform, yaw);
                strategy.move_gizmos(&mut debug, transform.translation, &body);
                sensor.draw_debug(&mut debug);
            }
        }
    });
}
