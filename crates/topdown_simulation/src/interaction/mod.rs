//! Interaction: луч контроллера → Interactable → use
//!
//! Архитектура:
//! - Interactable: capability компонент (текст, click/hold, availability, hit-box)
//! - InteractionSession (session.rs): чистая state machine, одна на контроллер
//! - probe_interactions (systems.rs, Update): ray cast + capability lookup + events
//!
//! Потребители `InteractableUsed`: tools (equip), game (points pickup).

use bevy::prelude::*;

pub mod session;
pub mod systems;

pub use session::{InteractionSession, InteractionState, InteractionTarget, SessionEffect};
pub use systems::probe_interactions;

/// Тип взаимодействия
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum InteractionMode {
    /// Один pressed edge → use
    Click,
    /// Удерживать `duration` секунд
    Hold { duration: f32 },
}

/// Объект, с которым можно взаимодействовать
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Interactable {
    pub hover_text: String,
    pub mode: InteractionMode,
    /// false → нельзя начать use (уже использован, ...)
    pub available: bool,
    /// false → луч игнорирует объект (tool в руке)
    pub hitbox_enabled: bool,
    /// Количество вариантов звука use (выбирается RNG)
    pub use_sound_variants: u32,
}

impl Interactable {
    pub fn click(hover_text: impl Into<String>) -> Self {
        Self {
            hover_text: hover_text.into(),
            mode: InteractionMode::Click,
            available: true,
            hitbox_enabled: true,
            use_sound_variants: 1,
        }
    }

    pub fn hold(hover_text: impl Into<String>, duration: f32) -> Self {
        Self {
            mode: InteractionMode::Hold { duration },
            ..Self::click(hover_text)
        }
    }

    pub fn requires_hold(&self) -> bool {
        matches!(self.mode, InteractionMode::Hold { .. })
    }

    /// "hold [E] text" / "[E] text"
    pub fn tooltip(&self, binding: &str) -> String {
        let hold = if self.requires_hold() { "hold " } else { "" };
        format!("{hold}[{binding}] {}", self.hover_text)
    }
}

/// Подпись кнопки interact в подсказках
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct InteractionBinding(pub String);

impl Default for InteractionBinding {
    fn default() -> Self {
        Self("E".to_string())
    }
}

/// Event: use(controller) вызван
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractableUsed {
    pub interactable: Entity,
    pub user: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    ProgressStarted,
    Completed { variant: u32 },
    Cancelled,
}

/// Event: audio cue (проигрывает embedding приложение)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionCue {
    pub target: Entity,
    pub kind: CueKind,
}
