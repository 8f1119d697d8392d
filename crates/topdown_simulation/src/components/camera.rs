//! Top-down камера: yaw и проекция world → screen
//!
//! Ортографическая камера смотрит вниз (-Y). Screen x вправо, y вверх,
//! центр viewport = `focus`. Yaw: compass градусы (по часовой сверху, 0 = -Z).

use bevy::prelude::*;

use crate::locomotion::yaw_rotation;

/// Состояние камеры (resource, пишется embedding приложением)
#[derive(Resource, Debug, Clone, Copy, Reflect)]
#[reflect(Resource)]
pub struct CameraRig {
    pub yaw_degrees: f32,
    /// Точка мира в центре экрана
    pub focus: Vec3,
    pub pixels_per_unit: f32,
    pub viewport: Vec2,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            yaw_degrees: 0.0,
            focus: Vec3::ZERO,
            pixels_per_unit: 32.0,
            viewport: Vec2::new(1920.0, 1080.0),
        }
    }
}

impl CameraRig {
    /// Проекция world точки на экран (pixels)
    pub fn world_to_screen(&self, point: Vec3) -> Vec2 {
        let rotation = yaw_rotation(self.yaw_degrees);
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::NEG_Z;
        let offset = point - self.focus;

        self.viewport * 0.5 + Vec2::new(offset.dot(right), offset.dot(up)) * self.pixels_per_unit
    }
}
