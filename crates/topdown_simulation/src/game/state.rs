//! GameState + listeners (points pickup, смерть игрока, run timer)

use bevy::prelude::*;

use crate::components::{HealthChanged, Player};
use crate::interaction::{Interactable, InteractableUsed};
use crate::logger::log;
use crate::ui::UiUpdate;

/// Состояние забега
///
/// Embedding приложение вставляет свой экземпляр; если его нет, plugin
/// регистрирует default.
#[derive(Resource, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct GameState {
    pub points: i32,
    pub run_timer: f32,
    pub timer_enabled: bool,
    pub deaths: u32,
}

/// Итог забега (end screen)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub points: i32,
    pub deaths: u32,
    pub time: f32,
}

impl GameState {
    pub fn start_run(&mut self) {
        self.run_timer = 0.0;
        self.timer_enabled = true;
    }

    pub fn finish_run(&mut self) -> RunSummary {
        self.timer_enabled = false;
        RunSummary {
            points: self.points,
            deaths: self.deaths,
            time: self.run_timer,
        }
    }

    pub fn add_points(&mut self, amount: i32) -> i32 {
        self.points += amount;
        self.points
    }
}

/// Hold-to-use объект, дающий очки (одноразовый)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PointsPickup {
    pub points: i32,
}

impl Default for PointsPickup {
    fn default() -> Self {
        Self { points: 1 }
    }
}

/// Event: игрок умер
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PlayerDied {
    pub entity: Entity,
}

/// System: use на PointsPickup → очки, объект больше не available
pub fn apply_points_pickups(
    mut used: EventReader<InteractableUsed>,
    mut pickups: Query<(&PointsPickup, &mut Interactable)>,
    mut game: ResMut<GameState>,
    mut ui: EventWriter<UiUpdate>,
) {
    for event in used.read() {
        let Ok((pickup, mut interactable)) = pickups.get_mut(event.interactable) else {
            continue;
        };
        if !interactable.available {
            continue;
        }

        interactable.available = false;
        let total = game.add_points(pickup.points);
        ui.write(UiUpdate::Points(total));
    }
}

/// System: listener HealthChanged → смерть игрока
///
/// Срабатывает на переход через 0 (повторный урон по мёртвому не считается).
pub fn check_player_death(
    mut changes: EventReader<HealthChanged>,
    players: Query<(), With<Player>>,
    mut game: ResMut<GameState>,
    mut died: EventWriter<PlayerDied>,
) {
    for change in changes.read() {
        if !players.contains(change.entity) {
            continue;
        }
        if change.previous > 0.0 && change.current <= 0.0 {
            game.deaths += 1;
            let summary = game.finish_run();
            died.write(PlayerDied { entity: change.entity });
            log(&format!(
                "Player {} died (deaths: {}, time: {:.1}s)",
                change.entity, summary.deaths, summary.time
            ));
        }
    }
}

/// System: run timer (Update)
pub fn tick_run_timer(time: Res<Time>, mut game: ResMut<GameState>) {
    if game.timer_enabled {
        game.run_timer += time.delta_secs();
    }
}
