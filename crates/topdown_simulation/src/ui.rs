//! UI collaborator: fire-and-forget обновления
//!
//! Core пишет `UiUpdate`, embedding приложение рисует. `UiState`: зеркало последних
//! значений (удобно для headless прогонов и тестов).

use bevy::prelude::*;

#[derive(Event, Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// None → спрятать подсказку
    HintText(Option<String>),
    /// Прогресс hold [0, 1]
    Progress(f32),
    Points(i32),
}

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub hint: Option<String>,
    pub progress: f32,
    pub points: i32,
}

/// System: применить UiUpdate к зеркалу
pub fn mirror_ui_updates(mut updates: EventReader<UiUpdate>, mut state: ResMut<UiState>) {
    for update in updates.read() {
        match update {
            UiUpdate::HintText(hint) => state.hint = hint.clone(),
            UiUpdate::Progress(progress) => state.progress = *progress,
            UiUpdate::Points(points) => state.points = *points,
        }
    }
}
