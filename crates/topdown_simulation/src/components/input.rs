//! Абстрактный input контроллера
//!
//! Core не знает про bindings: embedding приложение (или тест) пишет ControllerInput,
//! core читает. Edge-флаги (pressed/released) живут один frame и сбрасываются
//! системой `clear_input_edges` в конце Update.

use bevy::prelude::*;

/// Состояние одной action кнопки
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub struct ActionState {
    /// Нажата в этом frame
    pub pressed: bool,
    /// Удерживается
    pub held: bool,
    /// Отпущена в этом frame
    pub released: bool,
}

impl ActionState {
    pub fn press(&mut self) {
        self.pressed = !self.held;
        self.held = true;
        self.released = false;
    }

    pub fn release(&mut self) {
        self.released = self.held;
        self.held = false;
        self.pressed = false;
    }

    pub fn end_frame(&mut self) {
        self.pressed = false;
        self.released = false;
    }
}

/// Input одного контроллера
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ControllerInput {
    /// WASD / stick (x = right, y = up), не нормализован
    pub move_axis: Vec2,
    /// Курсор в screen space (pixels, y вверх)
    pub aim_cursor: Vec2,
    pub interact: ActionState,
    /// Вакуум / действие инструмента (held → pull/grab)
    pub tool: ActionState,
    /// Бросок удерживаемого объекта
    pub throw: ActionState,
}

impl ControllerInput {
    pub fn end_frame(&mut self) {
        self.interact.end_frame();
        self.tool.end_frame();
        self.throw.end_frame();
    }
}

/// System: сбросить edge-флаги после обработки frame
pub fn clear_input_edges(mut inputs: Query<&mut ControllerInput>) {
    for mut input in inputs.iter_mut() {
        input.end_frame();
    }
}
