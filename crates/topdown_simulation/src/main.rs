//! Headless прогон topdown симуляции
//!
//! Демо сцена (пол, игрок, vacuum, props, зоны) + скриптованный input:
//! идём к vacuum, берём его, тянем props, бросаем. Без рендера и wall clock.

use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::*;
use clap::Parser;
use topdown_simulation::physics::PhysicsBackend;
use topdown_simulation::spawn::{
    damage_zone_bundle, floor_bundle, objective_zone_bundle, player_bundle, points_pickup_bundle, prop_bundle,
    vacuum_bundle,
};
use topdown_simulation::{
    create_simulation_app, log, log_error, step_fixed, step_frame, CameraRig, ConfigError, ControllerInput,
    GameState, GroundSensor, Health, HeadlessBackend, Player, RapierBackend, SharedLocomotion, SimulationConfig,
    ToolHolder, Vacuum,
};

/// Headless runner
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON config (по умолчанию встроенные дефолты)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rapier backend вместо headless shape world
    #[arg(long)]
    rapier: bool,

    /// Количество fixed ticks
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,
}

fn main() {
    let args = Args::parse();

    let result = if args.rapier {
        run::<RapierBackend>(&args)
    } else {
        run::<HeadlessBackend>(&args)
    };

    if let Err(error) = result {
        log_error(&format!("Simulation failed to start: {error}"));
        std::process::exit(1);
    }
}

fn run<B: PhysicsBackend>(args: &Args) -> Result<(), ConfigError> {
    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    log(&format!("Starting topdown headless simulation (seed: {})", config.seed));

    let mut app = create_simulation_app::<B>(config.clone())?;
    app.world_mut().resource_mut::<GameState>().start_run();
    let player = spawn_demo_scene(&mut app, &config);

    let frame = app.world().resource::<Time<Fixed>>().timestep();
    for tick in 0..args.ticks {
        script_input(&mut app, player, tick);
        step_fixed(&mut app);
        step_frame(&mut app, frame);

        if tick % 60 == 0 {
            report(&mut app, player, tick);
        }
    }

    let summary = app.world_mut().resource_mut::<GameState>().finish_run();
    log(&format!(
        "Simulation complete: points {}, deaths {}, time {:.2}s",
        summary.points, summary.deaths, summary.time
    ));
    Ok(())
}

fn spawn_demo_scene(app: &mut App, config: &SimulationConfig) -> Entity {
    let locomotion = app.world().resource::<SharedLocomotion>().0.clone();
    let world = app.world_mut();

    world.spawn(floor_bundle(Vec3::new(0.0, -0.5, 0.0), Vec3::new(30.0, 0.5, 30.0)));
    world.spawn(vacuum_bundle(config, Vec3::new(0.0, 0.15, -3.0)));
    world.spawn(points_pickup_bundle(Vec3::new(4.0, 0.3, 0.0), 5, 2.0));
    for index in 0..3 {
        world.spawn(prop_bundle(config, Vec3::new(-1.0 + index as f32, 0.3, -9.0)));
    }
    world.spawn(damage_zone_bundle(config, Vec3::new(-6.0, 0.5, 0.0), Vec3::new(1.0, 0.5, 1.0)));
    world.spawn(objective_zone_bundle(Vec3::new(0.0, 0.5, 8.0), Vec3::new(2.0, 0.5, 2.0)));

    world.spawn(player_bundle(config, locomotion, Vec3::new(0.0, 0.9, 0.0))).id()
}

/// Скрипт: вперёд к vacuum → взять → тянуть → развернуться → бросить к objective зоне
fn script_input(app: &mut App, player: Entity, tick: u64) {
    let world = app.world_mut();
    let Some(position) = world.get::<Transform>(player).map(|transform| transform.translation) else {
        return;
    };

    let mut camera = world.resource_mut::<CameraRig>();
    camera.focus = position;
    let center = camera.viewport * 0.5;

    let Some(mut input) = world.get_mut::<ControllerInput>(player) else {
        return;
    };

    // Курсор выше центра экрана → смотрим вперёд (-Z), ниже → назад
    let facing_back = (300..420).contains(&tick);
    input.aim_cursor = center + Vec2::new(0.0, if facing_back { -100.0 } else { 100.0 });
    input.move_axis = match tick {
        0..=20 => Vec2::Y,
        _ => Vec2::ZERO,
    };

    match tick {
        30 => input.interact.press(),
        31 => input.interact.release(),
        60 => input.tool.press(),
        300 => input.tool.release(),
        420 => input.throw.press(),
        421 => input.throw.release(),
        _ => {}
    }
}

fn report(app: &mut App, player: Entity, tick: u64) {
    let world = app.world_mut();
    let mut players = world.query_filtered::<(&Transform, &GroundSensor, &Health, &ToolHolder), With<Player>>();
    let Ok((transform, sensor, health, holder)) = players.get(world, player) else {
        return;
    };
    let (position, grounded, health, equipped) =
        (transform.translation, sensor.is_grounded(), health.current(), holder.equipped());

    let held = equipped.and_then(|tool| world.get::<Vacuum>(tool)).and_then(Vacuum::held);
    let points = world.resource::<GameState>().points;

    log(&format!(
        "Tick {tick}: pos ({:.2}, {:.2}, {:.2}), grounded {grounded}, health {health}, tool {equipped:?}, held {held:?}, points {points}",
        position.x, position.y, position.z
    ));
}
