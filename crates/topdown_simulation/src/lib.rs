//! Topdown Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: locomotion и interaction персонажа top-down игры.
//!
//! Архитектура:
//! - FixedUpdate (60Hz): ground sensing, gravity, locomotion, vacuum pull/grab, зоны,
//!   интеграция (headless или Rapier)
//! - Update (каждый frame): interaction probe, tool use, throw, cooldowns, run timer
//! - Physics за trait `PhysicsBackend` (HeadlessBackend / RapierBackend)
//! - UI, audio, сцены: внешние коллабораторы, общаемся events (UiUpdate, InteractionCue,
//!   SceneChangeRequested)

use std::marker::PhantomData;
use std::time::Duration;

use bevy::app::FixedMain;
use bevy::ecs::event::event_update_system;
use bevy::ecs::schedule::ScheduleLabel;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod components;
pub mod config;
pub mod controller;
pub mod debug;
pub mod game;
pub mod interaction;
pub mod locomotion;
pub mod logger;
pub mod physics;
pub mod spawn;
pub mod tools;
pub mod ui;

pub use components::*;
pub use config::{ConfigError, LocomotionKind, SimulationConfig};
pub use controller::BodyController;
pub use debug::{DebugColor, DebugShape, DebugShapes};
pub use game::{GameState, PlayerDied, PointsPickup, SceneChangeRequested};
pub use interaction::{
    CueKind, Interactable, InteractableUsed, InteractionCue, InteractionMode, InteractionSession, InteractionState,
};
pub use locomotion::{
    DefaultLocomotion, EasedLocomotion, GravityIntegrator, GroundSensor, Landed, LeftGround, Locomotion,
    LocomotionStrategy, SharedLocomotion,
};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use physics::{HeadlessBackend, PhysicsBackend, RapierBackend, ShapeWorld, SpatialQueries};
pub use tools::{DropToolIntent, Tool, ToolDropped, ToolEquipped, ToolHolder, Vacuum};
pub use ui::{UiState, UiUpdate};

/// Порядок фаз внутри schedule
///
/// FixedUpdate: Prepare → Sense → Drive → Tools → Zones → Integrate → Attach
/// Update: Prepare → Interact → Resolve → Bookkeeping
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Tick counter, пересборка мира запросов, debug буфер
    Prepare,
    /// Ground probes
    Sense,
    /// Контроллеры и свободная гравитация
    Drive,
    /// Vacuum pull/grab
    Tools,
    /// Trigger зоны, смерть игрока
    Zones,
    /// Velocity → Transform (backend)
    Integrate,
    /// AttachedTo → Transform
    Attach,
    /// Interaction probe
    Interact,
    /// Потребители interaction events, throw, cooldowns
    Resolve,
    /// Таймер, attachments, UI зеркало, сброс input edges
    Bookkeeping,
}

/// Номер fixed tick (ключ кэша ground probe)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

pub fn advance_tick(mut tick: ResMut<SimulationTick>) {
    tick.0 += 1;
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Главный plugin симуляции, generic по physics backend
pub struct SimulationPlugin<B: PhysicsBackend> {
    pub config: SimulationConfig,
    _backend: PhantomData<fn() -> B>,
}

impl<B: PhysicsBackend> SimulationPlugin<B> {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            _backend: PhantomData,
        }
    }
}

impl<B: PhysicsBackend> Plugin for SimulationPlugin<B> {
    fn build(&self, app: &mut App) {
        let config = &self.config;

        app.insert_resource(Time::<Fixed>::from_hz(config.tick_hz))
            .insert_resource(DeterministicRng::new(config.seed))
            .insert_resource(SharedLocomotion(config.build_locomotion()))
            .insert_resource(interaction::InteractionBinding(config.interaction.binding.clone()))
            .insert_resource(DebugShapes::new(config.debug))
            .insert_resource(config.clone())
            .init_resource::<SimulationTick>()
            .init_resource::<CameraRig>()
            .init_resource::<UiState>();

        // GameState принадлежит embedding приложению; default только если не вставлен
        if !app.world().contains_resource::<GameState>() {
            app.init_resource::<GameState>();
        }

        app.add_event::<Landed>()
            .add_event::<LeftGround>()
            .add_event::<HealthChanged>()
            .add_event::<InteractableUsed>()
            .add_event::<InteractionCue>()
            .add_event::<ToolEquipped>()
            .add_event::<ToolDropped>()
            .add_event::<DropToolIntent>()
            .add_event::<PlayerDied>()
            .add_event::<SceneChangeRequested>()
            .add_event::<UiUpdate>();

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Prepare,
                SimulationSet::Sense,
                SimulationSet::Drive,
                SimulationSet::Tools,
                SimulationSet::Zones,
                SimulationSet::Integrate,
                SimulationSet::Attach,
            )
                .chain(),
        )
        .configure_sets(
            Update,
            (
                SimulationSet::Prepare,
                SimulationSet::Interact,
                SimulationSet::Resolve,
                SimulationSet::Bookkeeping,
            )
                .chain(),
        );

        B::build(app);

        app.add_systems(
            FixedUpdate,
            (
                (advance_tick, debug::clear_debug_shapes).in_set(SimulationSet::Prepare),
                locomotion::probe_ground::<B>.in_set(SimulationSet::Sense),
                // rotate → gravity → move внутри drive_controllers
                (locomotion::apply_free_body_gravity, controller::drive_controllers::<B>)
                    .chain()
                    .in_set(SimulationSet::Drive),
                (tools::pull_objects::<B>, tools::grab_objects::<B>)
                    .chain()
                    .in_set(SimulationSet::Tools),
                (
                    game::damage_zones::<B>,
                    game::objective_zones::<B>,
                    game::door_zones::<B>,
                    game::check_player_death,
                )
                    .chain()
                    .in_set(SimulationSet::Zones),
                physics::sync_attachments.in_set(SimulationSet::Attach),
            ),
        );

        app.add_systems(
            Update,
            (
                interaction::probe_interactions::<B>.in_set(SimulationSet::Interact),
                (
                    tools::handle_tool_use,
                    tools::process_drop_intents,
                    game::apply_points_pickups,
                    tools::release_on_tool_events,
                    tools::throw_held_objects,
                    tools::tick_vacuum_cooldowns,
                )
                    .chain()
                    .in_set(SimulationSet::Resolve),
                (
                    game::tick_run_timer,
                    physics::sync_attachments,
                    ui::mirror_ui_updates,
                    clear_input_edges,
                )
                    .chain()
                    .in_set(SimulationSet::Bookkeeping),
            ),
        );
    }
}

/// Создаёт minimal Bevy App для headless симуляции (без систем core)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// App с полной симуляцией; невалидный config → ошибка до старта
pub fn create_simulation_app<B: PhysicsBackend>(config: SimulationConfig) -> Result<App, ConfigError> {
    config.validate()?;
    logger::set_log_level(config.log_level()?);

    let mut app = create_headless_app(config.seed);
    app.add_plugins(SimulationPlugin::<B>::new(config));
    run_startup(&mut app);
    Ok(app)
}

/// Завершить сборку plugins и выполнить startup schedules (Main не запускается)
pub fn run_startup(app: &mut App) {
    app.finish();
    app.cleanup();
    // Schedule без систем не создаётся: отсутствие не ошибка
    for label in [PreStartup.intern(), Startup.intern(), PostStartup.intern()] {
        let _ = app.world_mut().try_run_schedule(label);
    }
}

/// Продвинуть `Time` на `delta` и выполнить schedule (детерминированный шаг без wall clock)
pub fn advance_schedule(app: &mut App, schedule: impl ScheduleLabel, delta: Duration) {
    app.world_mut().resource_mut::<Time>().advance_by(delta);
    app.world_mut().run_schedule(schedule);
}

/// Один fixed tick (весь FixedMain: FixedUpdate + backend step)
pub fn step_fixed(app: &mut App) {
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    advance_schedule(app, FixedMain, timestep);
}

/// Ротация double buffer всех зарегистрированных `Events<T>`
///
/// В обычном App это делает `First`, который ручные шаги не запускают. Event живёт
/// два вызова: reader'ы FixedUpdate и Update успевают его увидеть.
pub fn update_events(app: &mut App) {
    if let Err(error) = app.world_mut().run_system_cached(event_update_system) {
        log_error(&format!("Event buffers not updated: {error}"));
    }
}

/// Один frame (Update) длиной `delta`, перед ним ротация events
pub fn step_frame(app: &mut App, delta: Duration) {
    update_events(app);
    advance_schedule(app, Update, delta);
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component + std::fmt::Debug>(world: &mut World) -> Vec<u8> {
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
