//! Debug shapes buffer (аналог gizmos без рендера)
//!
//! Заполняется ground sensor / locomotion strategy / interaction probe, когда
//! `DebugShapes::enabled`. Embedding приложение рисует буфер как хочет.
//! FixedUpdate начинает буфер заново.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugColor {
    Blue,
    Green,
    Red,
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugShape {
    Sphere { center: Vec3, radius: f32, color: DebugColor },
    Line { start: Vec3, end: Vec3, color: DebugColor },
}

#[derive(Resource, Debug, Default)]
pub struct DebugShapes {
    pub enabled: bool,
    shapes: Vec<DebugShape>,
}

impl DebugShapes {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            shapes: Vec::new(),
        }
    }

    pub fn sphere(&mut self, center: Vec3, radius: f32, color: DebugColor) {
        if self.enabled {
            self.shapes.push(DebugShape::Sphere { center, radius, color });
        }
    }

    pub fn line(&mut self, start: Vec3, end: Vec3, color: DebugColor) {
        if self.enabled {
            self.shapes.push(DebugShape::Line { start, end, color });
        }
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn shapes(&self) -> &[DebugShape] {
        &self.shapes
    }
}

pub fn clear_debug_shapes(mut shapes: ResMut<DebugShapes>) {
    shapes.clear();
}
