//! Integration тесты tools: equip через interaction, передача владения, vacuum

mod common;

use approx::assert_relative_eq;
use bevy::prelude::*;
use common::*;
use topdown_simulation::spawn::{prop_bundle, vacuum_bundle};
use topdown_simulation::{
    AttachedTo, DropToolIntent, Interactable, InteractableUsed, PhysicsBody, SimulationConfig, Tool, ToolDropped,
    ToolEquipped, ToolHolder, Vacuum,
};

fn slow_vacuum_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.vacuum.strength = 6.0;
    config
}

/// Игрок смотрит в -Z, vacuum лежит перед ним и подбирается click use
fn equipped_scene(config: SimulationConfig) -> (App, Entity, Entity) {
    let mut app = test_app_with(config);
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.9, 0.0));
    let vacuum_config = app.world().resource::<SimulationConfig>().clone();
    let vacuum = app
        .world_mut()
        .spawn(vacuum_bundle(&vacuum_config, Vec3::new(0.0, 0.15, -1.0)))
        .id();

    aim_forward(&mut app, player);
    input(&mut app, player).interact.press();
    tick(&mut app);
    input(&mut app, player).interact.release();

    (app, player, vacuum)
}

#[test]
fn test_click_use_equips_vacuum() {
    let (app, player, vacuum) = equipped_scene(SimulationConfig::default());
    let world = app.world();

    assert_eq!(world.get::<Tool>(vacuum).unwrap().holder(), Some(player));
    assert_eq!(world.get::<ToolHolder>(player).unwrap().equipped(), Some(vacuum));

    let interactable = world.get::<Interactable>(vacuum).unwrap();
    assert!(!interactable.hitbox_enabled);
    let body = world.get::<PhysicsBody>(vacuum).unwrap();
    assert!(body.kinematic);
    assert!(!body.detect_collisions);
    assert_eq!(body.velocity, Vec3::ZERO);

    assert_eq!(
        events::<ToolEquipped>(&app),
        vec![ToolEquipped {
            tool: vacuum,
            holder: player,
        }]
    );

    // Hold point игрока: позиция + (0.35, 0.2, -0.5)
    let position = world.get::<Transform>(vacuum).unwrap().translation;
    assert_relative_eq!(position.x, 0.35, epsilon = 1e-4);
    assert_relative_eq!(position.y, 1.1, epsilon = 1e-4);
    assert_relative_eq!(position.z, -0.5, epsilon = 1e-4);
}

#[test]
fn test_equipped_tool_follows_holder() {
    let (mut app, player, vacuum) = equipped_scene(SimulationConfig::default());
    input(&mut app, player).move_axis = Vec2::new(1.0, 0.0);
    ticks(&mut app, 30);

    let player_position = app.world().get::<Transform>(player).unwrap().translation;
    let player_rotation = app.world().get::<Transform>(player).unwrap().rotation;
    let tool_position = app.world().get::<Transform>(vacuum).unwrap().translation;
    let expected = player_position + player_rotation * Vec3::new(0.35, 0.2, -0.5);
    assert!((tool_position - expected).length() < 1e-4);
}

#[test]
fn test_use_by_another_controller_transfers_ownership() {
    let (mut app, first, vacuum) = equipped_scene(SimulationConfig::default());
    let second = spawn_player(&mut app, Vec3::new(5.0, 0.9, 0.0));

    app.world_mut().send_event(InteractableUsed {
        interactable: vacuum,
        user: second,
    });
    tick(&mut app);

    let world = app.world();
    assert_eq!(world.get::<Tool>(vacuum).unwrap().holder(), Some(second));
    assert_eq!(world.get::<ToolHolder>(first).unwrap().equipped(), None);
    assert_eq!(world.get::<ToolHolder>(second).unwrap().equipped(), Some(vacuum));
    assert_eq!(world.get::<AttachedTo>(vacuum).map(|attached| attached.parent), Some(second));

    assert_eq!(
        events::<ToolDropped>(&app),
        vec![ToolDropped {
            tool: vacuum,
            holder: first,
        }]
    );
    assert_eq!(events::<ToolEquipped>(&app).len(), 2);
}

#[test]
fn test_vacuum_pulls_then_grabs_one_object() {
    let (mut app, player, vacuum) = equipped_scene(slow_vacuum_config());
    let config = app.world().resource::<SimulationConfig>().clone();
    let prop = app
        .world_mut()
        .spawn(prop_bundle(&config, Vec3::new(0.35, 0.3, -4.0)))
        .id();

    input(&mut app, player).tool.press();
    tick(&mut app);

    // Velocity к соплу с заданной скоростью
    let velocity = app.world().get::<PhysicsBody>(prop).unwrap().velocity;
    assert_relative_eq!(velocity.length(), 6.0, epsilon = 1e-3);
    assert!(velocity.z > 0.0 && velocity.y > 0.0);

    ticks(&mut app, 120);

    let world = app.world();
    assert_eq!(world.get::<Vacuum>(vacuum).unwrap().held(), Some(prop));
    assert_eq!(world.get::<AttachedTo>(prop).map(|attached| attached.parent), Some(vacuum));
    let body = world.get::<PhysicsBody>(prop).unwrap();
    assert!(body.kinematic);
    assert_eq!(body.velocity, Vec3::ZERO);

    // Hold point vacuum: (0, 0, -0.8) от его позиции
    let position = world.get::<Transform>(prop).unwrap().translation;
    assert!((position - Vec3::new(0.35, 1.1, -1.3)).length() < 1e-3);
}

#[test]
fn test_throw_launches_object_and_starts_cooldown() {
    let (mut app, player, vacuum) = equipped_scene(slow_vacuum_config());
    let config = app.world().resource::<SimulationConfig>().clone();
    let prop = app
        .world_mut()
        .spawn(prop_bundle(&config, Vec3::new(0.35, 0.3, -4.0)))
        .id();
    input(&mut app, player).tool.press();
    ticks(&mut app, 120);
    assert_eq!(app.world().get::<Vacuum>(vacuum).unwrap().held(), Some(prop));

    input(&mut app, player).throw.press();
    tick(&mut app);

    let body = app.world().get::<PhysicsBody>(prop).unwrap();
    assert!(!body.kinematic);
    assert_relative_eq!(body.velocity.z, -50.0, epsilon = 1e-3);
    assert!(app.world().get::<AttachedTo>(prop).is_none());
    let state = app.world().get::<Vacuum>(vacuum).unwrap();
    assert_eq!(state.held(), None);
    assert!(state.is_cooling_down());

    // Во время cooldown pull не работает
    let second = app
        .world_mut()
        .spawn(prop_bundle(&config, Vec3::new(0.35, 0.3, -4.0)))
        .id();
    tick(&mut app);
    assert!(app.world().get::<PhysicsBody>(second).unwrap().velocity.length() < 1e-3);

    ticks(&mut app, 40);
    assert!(!app.world().get::<Vacuum>(vacuum).unwrap().is_cooling_down());
    assert!(app.world().get::<Transform>(second).unwrap().translation.z > -3.9);
}

#[test]
fn test_drop_intent_releases_tool_and_held_object() {
    let (mut app, player, vacuum) = equipped_scene(slow_vacuum_config());
    let config = app.world().resource::<SimulationConfig>().clone();
    let prop = app
        .world_mut()
        .spawn(prop_bundle(&config, Vec3::new(0.35, 0.3, -4.0)))
        .id();
    input(&mut app, player).tool.press();
    ticks(&mut app, 120);

    app.world_mut().send_event(DropToolIntent { holder: player });
    tick(&mut app);

    let world = app.world();
    assert_eq!(world.get::<Tool>(vacuum).unwrap().holder(), None);
    assert_eq!(world.get::<ToolHolder>(player).unwrap().equipped(), None);
    assert!(world.get::<AttachedTo>(vacuum).is_none());
    assert!(world.get::<Interactable>(vacuum).unwrap().hitbox_enabled);
    assert!(!world.get::<PhysicsBody>(vacuum).unwrap().kinematic);

    assert_eq!(world.get::<Vacuum>(vacuum).unwrap().held(), None);
    assert!(world.get::<AttachedTo>(prop).is_none());
    assert!(!world.get::<PhysicsBody>(prop).unwrap().kinematic);

    assert_eq!(
        events::<ToolDropped>(&app),
        vec![ToolDropped {
            tool: vacuum,
            holder: player,
        }]
    );
}
