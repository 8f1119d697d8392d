//! Базовые компоненты акторов: Health, Player

use bevy::prelude::*;

/// Игрок (маркер)
///
/// Автоматически добавляет Health через Required Components.
/// DamageZone бьёт только entity с этим маркером.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Health)]
pub struct Player;

/// Здоровье
///
/// Без clamp: значение может уйти в минус. Смерть решает listener (`check_player_death`),
/// а не сам Health. Каждая мутация возвращает `HealthChanged`, который вызывающий
/// обязан отправить (`#[must_use]`).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    #[must_use]
    pub fn take_damage(&mut self, entity: Entity, amount: f32) -> HealthChanged {
        self.change(entity, -amount)
    }

    #[must_use]
    pub fn heal(&mut self, entity: Entity, amount: f32) -> HealthChanged {
        self.change(entity, amount)
    }

    #[must_use]
    pub fn change(&mut self, entity: Entity, delta: f32) -> HealthChanged {
        let previous = self.current;
        self.current += delta;
        HealthChanged {
            entity,
            previous,
            current: self.current,
        }
    }
}

/// Event: здоровье изменилось (на каждую мутацию, даже если delta == 0)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct HealthChanged {
    pub entity: Entity,
    pub previous: f32,
    pub current: f32,
}
