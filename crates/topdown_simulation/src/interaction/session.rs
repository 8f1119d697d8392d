//! InteractionSession: state machine одного контроллера
//!
//! Idle → Tracking (луч попал) → Holding (hold-тип, action held, available)
//! → Idle после завершения hold. Click-тип: pressed edge → Used (terminal,
//! пока луч не уйдёт с объекта).
//!
//! `step` чистая: никаких ECS запросов, только эффекты. Система превращает их в events.

use bevy::prelude::*;

use super::InteractionMode;
use crate::components::ActionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum InteractionState {
    #[default]
    Idle,
    Tracking,
    Holding,
    Used,
}

/// Что луч видит в этом frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionTarget {
    pub entity: Entity,
    pub mode: InteractionMode,
    pub available: bool,
}

/// Побочный эффект шага
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEffect {
    /// Прогресс сброшен до завершения (release, смена цели, промах)
    Cancelled { target: Entity },
    /// Первый ненулевой прогресс
    ProgressStarted { target: Entity },
    /// progress / duration, в [0, 1]
    Progress { target: Entity, normalized: f32 },
    /// use(controller); `hold`: завершение hold, а не click
    Used { target: Entity, hold: bool },
}

/// Сессия взаимодействия (одна на контроллер, максимум одна цель)
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct InteractionSession {
    target: Option<Entity>,
    state: InteractionState,
    /// Накопленный hold, clamp [0, duration]
    progress: f32,
    hint: Option<String>,
}

impl InteractionSession {
    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Обновить подсказку; `Some(..)` только если текст изменился
    pub fn set_hint(&mut self, hint: Option<String>) -> Option<Option<String>> {
        if self.hint == hint {
            return None;
        }
        self.hint = hint.clone();
        Some(hint)
    }

    /// Один frame: `hit`: результат interaction луча (None = промах или не interactable)
    pub fn step(&mut self, hit: Option<InteractionTarget>, interact: ActionState, delta: f32) -> Vec<SessionEffect> {
        let mut effects = Vec::new();

        let Some(hit) = hit else {
            self.reset(&mut effects);
            return effects;
        };

        if self.target != Some(hit.entity) {
            self.reset(&mut effects);
            self.target = Some(hit.entity);
            self.state = InteractionState::Tracking;
        }

        match (self.state, hit.mode) {
            (InteractionState::Used, _) | (InteractionState::Idle, _) => {}
            (_, InteractionMode::Click) => {
                if interact.pressed && hit.available {
                    self.state = InteractionState::Used;
                    effects.push(SessionEffect::Used {
                        target: hit.entity,
                        hold: false,
                    });
                }
            }
            (InteractionState::Tracking, InteractionMode::Hold { duration }) => {
                if interact.held && hit.available {
                    self.state = InteractionState::Holding;
                    self.advance(hit.entity, duration, delta, &mut effects);
                }
            }
            (InteractionState::Holding, InteractionMode::Hold { duration }) => {
                if interact.held && hit.available {
                    self.advance(hit.entity, duration, delta, &mut effects);
                } else {
                    self.cancel(hit.entity, &mut effects);
                    self.state = InteractionState::Tracking;
                }
            }
        }

        effects
    }

    fn advance(&mut self, target: Entity, duration: f32, delta: f32, effects: &mut Vec<SessionEffect>) {
        let started = self.progress == 0.0;
        self.progress = (self.progress + delta.max(0.0)).min(duration);

        if started && self.progress > 0.0 {
            effects.push(SessionEffect::ProgressStarted { target });
        }

        let normalized = if duration > 0.0 { self.progress / duration } else { 1.0 };
        effects.push(SessionEffect::Progress { target, normalized });

        if self.progress >= duration {
            effects.push(SessionEffect::Used { target, hold: true });
            self.progress = 0.0;
            self.state = InteractionState::Idle;
            self.target = None;
        }
    }

    fn cancel(&mut self, target: Entity, effects: &mut Vec<SessionEffect>) {
        if self.progress > 0.0 {
            effects.push(SessionEffect::Cancelled { target });
        }
        self.progress = 0.0;
    }

    fn reset(&mut self, effects: &mut Vec<SessionEffect>) {
        if let Some(target) = self.target.take() {
            self.cancel(target, effects);
        }
        self.progress = 0.0;
        self.state = InteractionState::Idle;
    }
}
