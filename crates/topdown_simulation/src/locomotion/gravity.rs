//! Gravity integration
//!
//! Своя гравитация вместо гравитации движка: pull/terminal настраиваются per body,
//! а grounded ветка LocomotionStrategy перезаписывает vertical velocity.

use bevy::prelude::*;

use crate::components::{AttachedTo, PhysicsBody};
use crate::controller::BodyController;

/// Параметры гравитации тела
///
/// Инвариант: после `apply` vertical velocity ≥ terminal_velocity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct GravityIntegrator {
    /// Прибавка скорости вниз за секунду (> 0)
    pub pull_per_second: f32,
    /// Максимальная скорость падения (< 0)
    pub terminal_velocity: f32,
}

impl Default for GravityIntegrator {
    fn default() -> Self {
        Self {
            pull_per_second: 50.0,
            terminal_velocity: -150.0,
        }
    }
}

impl GravityIntegrator {
    pub fn new(pull_per_second: f32, terminal_velocity: f32) -> Self {
        Self {
            pull_per_second,
            terminal_velocity,
        }
    }

    /// Один шаг интеграции. Вызывать не больше одного раза за physics tick.
    pub fn apply(&self, body: &mut PhysicsBody, delta: f32) {
        if body.velocity.y > self.terminal_velocity {
            body.velocity.y = (body.velocity.y - self.pull_per_second * delta).max(self.terminal_velocity);
        }
    }
}

/// System: гравитация для свободных тел (props, брошенные объекты)
///
/// Контроллеры не трогаем: у них gravity вызывается внутри `drive_controllers`
/// между rotate и move.
pub fn apply_free_body_gravity(
    time: Res<Time>,
    mut bodies: Query<(&GravityIntegrator, &mut PhysicsBody), (Without<BodyController>, Without<AttachedTo>)>,
) {
    let delta = time.delta_secs();

    for (gravity, mut body) in bodies.iter_mut() {
        if !body.kinematic {
            gravity.apply(&mut body, delta);
        }
    }
}
