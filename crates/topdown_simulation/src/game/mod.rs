//! Game layer: очки, таймер забега, смерть игрока, зоны
//!
//! GameState: обычный resource (регистрируется явно, без глобальных singleton).

pub mod state;
pub mod zones;

pub use state::{
    apply_points_pickups, check_player_death, tick_run_timer, GameState, PlayerDied, PointsPickup, RunSummary,
};
pub use zones::{
    damage_zones, door_zones, objective_zones, DamageZone, Door, ObjectiveZone, SceneChangeRequested, ZoneOccupants,
};
