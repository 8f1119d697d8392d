//! Integration тесты на Rapier backend: те же сценарии, что и в headless,
//! но spatial queries и интеграция идут через bevy_rapier3d

mod common;

use std::time::Duration;

use bevy::prelude::*;
use common::*;
use topdown_simulation::spawn::{points_pickup_bundle, prop_bundle, vacuum_bundle};
use topdown_simulation::{
    step_frame, AttachedTo, GameState, GroundSensor, InteractableUsed, InteractionSession, Landed, LeftGround,
    PhysicsBody, RapierBackend, SimulationConfig, Tool, Vacuum,
};

fn rapier_app(config: SimulationConfig) -> App {
    test_app_on::<RapierBackend>(config)
}

/// Пол + игрок чуть выше пола, несколько tick чтобы Rapier принял коллайдеры
fn settled_scene(config: SimulationConfig) -> (App, Entity) {
    let mut app = rapier_app(config);
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.95, 0.0));
    aim_forward(&mut app, player);
    ticks(&mut app, 20);
    (app, player)
}

#[test]
fn test_rapier_player_lands_once_and_stays_grounded() {
    let mut app = rapier_app(SimulationConfig::default());
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.95, 0.0));

    ticks(&mut app, 120);

    let world = app.world();
    assert!(world.get::<GroundSensor>(player).unwrap().is_grounded());
    let y = world.get::<Transform>(player).unwrap().translation.y;
    assert!((0.85..1.0).contains(&y), "player y {y}");

    assert_eq!(events::<Landed>(&app), vec![Landed { entity: player }]);
    assert!(events::<LeftGround>(&app).is_empty());
}

#[test]
fn test_rapier_ray_drives_hold_interaction() {
    let (mut app, player) = settled_scene(SimulationConfig::default());
    let pickup = app
        .world_mut()
        .spawn(points_pickup_bundle(Vec3::new(0.0, 0.3, -0.8), 4, 1.0))
        .id();
    ticks(&mut app, 3);
    assert_eq!(app.world().get::<InteractionSession>(player).unwrap().target(), Some(pickup));

    input(&mut app, player).interact.press();
    step_frame(&mut app, Duration::from_millis(500));
    step_frame(&mut app, Duration::from_millis(500));

    assert_eq!(
        events::<InteractableUsed>(&app),
        vec![InteractableUsed {
            interactable: pickup,
            user: player,
        }]
    );
    assert_eq!(app.world().resource::<GameState>().points, 4);
}

#[test]
fn test_rapier_vacuum_pulls_and_grabs_prop() {
    let mut config = SimulationConfig::default();
    config.vacuum.strength = 6.0;
    let (mut app, player) = settled_scene(config.clone());

    let vacuum = app
        .world_mut()
        .spawn(vacuum_bundle(&config, Vec3::new(0.0, 0.15, -1.0)))
        .id();
    ticks(&mut app, 10);

    input(&mut app, player).interact.press();
    tick(&mut app);
    input(&mut app, player).interact.release();
    tick(&mut app);
    assert_eq!(app.world().get::<Tool>(vacuum).unwrap().holder(), Some(player));

    let prop = app
        .world_mut()
        .spawn(prop_bundle(&config, Vec3::new(0.35, 0.3, -4.0)))
        .id();
    ticks(&mut app, 3);

    input(&mut app, player).tool.press();
    ticks(&mut app, 120);

    let world = app.world();
    assert_eq!(world.get::<Vacuum>(vacuum).unwrap().held(), Some(prop));
    assert_eq!(world.get::<AttachedTo>(prop).map(|attached| attached.parent), Some(vacuum));
    assert!(world.get::<PhysicsBody>(prop).unwrap().kinematic);

    // Объект висит в hold point vacuum
    let vacuum_transform = world.get::<Transform>(vacuum).unwrap();
    let hold_point = vacuum_transform.translation + vacuum_transform.rotation * Vec3::new(0.0, 0.0, -0.8);
    let position = world.get::<Transform>(prop).unwrap().translation;
    assert!((position - hold_point).length() < 0.05, "prop at {position}, hold point {hold_point}");
}
