//! Integration: ground sensing, gravity, locomotion через полный FixedUpdate

mod common;

use approx::assert_relative_eq;
use bevy::prelude::*;
use common::*;
use topdown_simulation::config::LocomotionKind;
use topdown_simulation::spawn::prop_bundle;
use topdown_simulation::{
    BodyController, GroundSensor, Landed, LeftGround, PhysicsBody, SimulationConfig,
};

#[test]
fn test_player_on_floor_is_grounded_and_still() {
    let mut app = test_app();
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.9, 0.0));

    ticks(&mut app, 30);

    let world = app.world();
    assert!(world.get::<GroundSensor>(player).unwrap().is_grounded());
    assert_eq!(world.get::<PhysicsBody>(player).unwrap().velocity, Vec3::ZERO);
    assert_relative_eq!(world.get::<Transform>(player).unwrap().translation.y, 0.9, epsilon = 1e-4);

    let landed = events::<Landed>(&app);
    assert_eq!(landed, vec![Landed { entity: player }]);
    assert!(events::<LeftGround>(&app).is_empty());
}

#[test]
fn test_walk_forward_five_meters_per_second() {
    let mut app = test_app();
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.9, 0.0));
    aim_forward(&mut app, player);
    input(&mut app, player).move_axis = Vec2::Y;

    ticks(&mut app, 60);

    let translation = app.world().get::<Transform>(player).unwrap().translation;
    assert_relative_eq!(translation.z, -5.0, epsilon = 1e-2);
    assert_relative_eq!(translation.x, 0.0, epsilon = 1e-4);
    assert_relative_eq!(translation.y, 0.9, epsilon = 1e-4);
}

#[test]
fn test_aim_is_decoupled_from_movement() {
    let mut app = test_app();
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.9, 0.0));

    // Курсор справа от тела → смотрим на +X, идём вперёд (-Z)
    let screen = app
        .world()
        .resource::<topdown_simulation::CameraRig>()
        .world_to_screen(Vec3::new(0.0, 0.9, 0.0));
    {
        let mut input = input(&mut app, player);
        input.aim_cursor = screen + Vec2::new(200.0, 0.0);
        input.move_axis = Vec2::Y;
    }

    tick(&mut app);

    let world = app.world();
    let transform = world.get::<Transform>(player).unwrap();
    assert!((transform.forward().as_vec3() - Vec3::X).length() < 1e-4);
    assert_relative_eq!(world.get::<BodyController>(player).unwrap().facing_yaw(), 90.0, epsilon = 1e-3);

    let velocity = world.get::<PhysicsBody>(player).unwrap().velocity;
    assert!(velocity.z < 0.0);
    assert_relative_eq!(velocity.x, 0.0, epsilon = 1e-4);
}

#[test]
fn test_fall_lands_once() {
    let mut app = test_app();
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 3.0, 0.0));

    ticks(&mut app, 5);
    assert!(!app.world().get::<GroundSensor>(player).unwrap().is_grounded());
    assert!(app.world().get::<PhysicsBody>(player).unwrap().velocity.y < 0.0);

    ticks(&mut app, 120);

    assert!(app.world().get::<GroundSensor>(player).unwrap().is_grounded());
    // Grounded ветка обнуляет vertical velocity: тело может зависнуть в пределах probe (0.07)
    let y = app.world().get::<Transform>(player).unwrap().translation.y;
    assert!((0.9 - 1e-4..=0.97 + 1e-3).contains(&y), "y = {y}");
    assert_eq!(events::<Landed>(&app).len(), 1);
    assert!(events::<LeftGround>(&app).is_empty());
}

#[test]
fn test_walking_off_ledge_leaves_ground_once() {
    let mut app = test_app();
    app.world_mut().spawn(topdown_simulation::spawn::floor_bundle(
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(2.0, 0.5, 2.0),
    ));
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.9, 0.0));
    aim_forward(&mut app, player);

    tick(&mut app);
    input(&mut app, player).move_axis = Vec2::Y;
    ticks(&mut app, 60);

    assert_eq!(events::<Landed>(&app).len(), 1);
    assert_eq!(events::<LeftGround>(&app), vec![LeftGround { entity: player }]);

    let body = app.world().get::<PhysicsBody>(player).unwrap();
    // В воздухе: air modifier 0.7 → 3.5 m/s горизонтально, падаем
    assert_relative_eq!(body.velocity.z, -3.5, epsilon = 1e-3);
    assert!(body.velocity.y < 0.0);
}

#[test]
fn test_free_body_gravity_scenario() {
    let config = SimulationConfig {
        tick_hz: 10.0,
        ..Default::default()
    };
    let mut app = test_app_with(config.clone());
    let prop = app.world_mut().spawn(prop_bundle(&config, Vec3::new(0.0, 100.0, 0.0))).id();
    app.world_mut().get_mut::<PhysicsBody>(prop).unwrap().velocity.y = -10.0;

    tick(&mut app);
    assert_relative_eq!(app.world().get::<PhysicsBody>(prop).unwrap().velocity.y, -15.0, epsilon = 1e-4);

    ticks(&mut app, 29);
    assert_eq!(app.world().get::<PhysicsBody>(prop).unwrap().velocity.y, -150.0);

    ticks(&mut app, 10);
    assert_eq!(app.world().get::<PhysicsBody>(prop).unwrap().velocity.y, -150.0);
}

#[test]
fn test_eased_strategy_accelerates_gradually() {
    let mut config = SimulationConfig::default();
    config.locomotion.strategy = LocomotionKind::Eased;
    let mut app = test_app_with(config);
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.9, 0.0));
    aim_forward(&mut app, player);
    input(&mut app, player).move_axis = Vec2::Y;

    tick(&mut app);
    let first = app.world().get::<PhysicsBody>(player).unwrap().velocity.length();
    assert!(first > 0.0 && first < 5.0);

    ticks(&mut app, 60);
    assert_relative_eq!(app.world().get::<PhysicsBody>(player).unwrap().velocity.z, -5.0, epsilon = 1e-3);
}
