//! Общие helpers для integration тестов (headless backend, ручные шаги)

#![allow(dead_code)]

use std::time::Duration;

use bevy::prelude::*;
use topdown_simulation::spawn::{floor_bundle, player_bundle};
use topdown_simulation::physics::PhysicsBackend;
use topdown_simulation::{
    create_simulation_app, step_fixed, step_frame, CameraRig, ControllerInput, HeadlessBackend, HealthChanged,
    InteractableUsed, InteractionCue, Landed, LeftGround, PlayerDied, SceneChangeRequested, SharedLocomotion,
    SimulationConfig, SimulationSet, ToolDropped, ToolEquipped, UiUpdate,
};

pub fn test_app() -> App {
    test_app_with(SimulationConfig::default())
}

pub fn test_app_with(config: SimulationConfig) -> App {
    test_app_on::<HeadlessBackend>(config)
}

/// App на произвольном backend с записью всех events, которые проверяют тесты
pub fn test_app_on<B: PhysicsBackend>(config: SimulationConfig) -> App {
    let mut app = create_simulation_app::<B>(config).expect("valid config");
    record::<Landed>(&mut app);
    record::<LeftGround>(&mut app);
    record::<HealthChanged>(&mut app);
    record::<PlayerDied>(&mut app);
    record::<SceneChangeRequested>(&mut app);
    record::<InteractableUsed>(&mut app);
    record::<InteractionCue>(&mut app);
    record::<UiUpdate>(&mut app);
    record::<ToolEquipped>(&mut app);
    record::<ToolDropped>(&mut app);
    app
}

pub fn fixed_step(app: &App) -> Duration {
    app.world().resource::<Time<Fixed>>().timestep()
}

/// Fixed tick + frame той же длины
pub fn tick(app: &mut App) {
    let step = fixed_step(app);
    step_fixed(app);
    step_frame(app, step);
}

pub fn ticks(app: &mut App, count: usize) {
    for _ in 0..count {
        tick(app);
    }
}

pub fn spawn_floor(app: &mut App) -> Entity {
    app.world_mut()
        .spawn(floor_bundle(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0)))
        .id()
}

pub fn spawn_player(app: &mut App, position: Vec3) -> Entity {
    let config = app.world().resource::<SimulationConfig>().clone();
    let locomotion = app.world().resource::<SharedLocomotion>().0.clone();
    app.world_mut().spawn(player_bundle(&config, locomotion, position)).id()
}

/// Курсор над/под телом на экране: body смотрит в `forward` (-Z) или назад
pub fn aim_forward(app: &mut App, player: Entity) {
    let position = app.world().get::<Transform>(player).expect("player").translation;
    let rig = *app.world().resource::<CameraRig>();
    let screen = rig.world_to_screen(position);
    input(app, player).aim_cursor = screen + Vec2::new(0.0, 100.0);
}

pub fn input(app: &mut App, player: Entity) -> Mut<'_, ControllerInput> {
    app.world_mut().get_mut::<ControllerInput>(player).expect("controller input")
}

/// Events типа E, накопленные с момента `record` (буферы `Events<E>` ротируются каждый frame)
#[derive(Resource)]
pub struct Recorded<E: Event>(pub Vec<E>);

fn record_events<E: Event + Clone>(mut reader: EventReader<E>, mut recorded: ResMut<Recorded<E>>) {
    recorded.0.extend(reader.read().cloned());
}

/// Reader в конце Update: видит и FixedUpdate events этого tick, и events frame
pub fn record<E: Event + Clone>(app: &mut App) {
    app.insert_resource(Recorded::<E>(Vec::new()))
        .add_systems(Update, record_events::<E>.after(SimulationSet::Bookkeeping));
}

pub fn events<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .get_resource::<Recorded<E>>()
        .expect("event type recorded in test_app_on")
        .0
        .clone()
}
