//! Integration тесты interaction: луч контроллера → сессия → events

mod common;

use std::time::Duration;

use bevy::prelude::*;
use common::*;
use topdown_simulation::physics::layers::LAYER_INTERACTABLE;
use topdown_simulation::spawn::points_pickup_bundle;
use topdown_simulation::{
    step_frame, ColliderShape, CueKind, GameState, Interactable, InteractableUsed, InteractionCue, InteractionSession,
    InteractionState, PhysicsLayer, UiState, UiUpdate,
};

const IN_FRONT: Vec3 = Vec3::new(0.0, 0.3, -0.8);

/// Игрок в центре, смотрит в -Z, один tick чтобы луч увидел сцену
fn scene_with_player() -> (App, Entity) {
    let mut app = test_app();
    spawn_floor(&mut app);
    let player = spawn_player(&mut app, Vec3::new(0.0, 0.9, 0.0));
    aim_forward(&mut app, player);
    (app, player)
}

fn progress_updates(app: &App) -> Vec<f32> {
    events::<UiUpdate>(app)
        .into_iter()
        .filter_map(|update| match update {
            UiUpdate::Progress(progress) => Some(progress),
            _ => None,
        })
        .collect()
}

#[test]
fn test_hold_pickup_completes_in_four_half_second_frames() {
    let (mut app, player) = scene_with_player();
    let pickup = app.world_mut().spawn(points_pickup_bundle(IN_FRONT, 5, 2.0)).id();
    tick(&mut app);

    {
        let session = app.world().get::<InteractionSession>(player).unwrap();
        assert_eq!(session.target(), Some(pickup));
        assert_eq!(session.state(), InteractionState::Tracking);
        assert_eq!(session.hint(), Some("hold [E] Collect"));
    }

    input(&mut app, player).interact.press();
    for _ in 0..4 {
        step_frame(&mut app, Duration::from_millis(500));
    }

    assert_eq!(progress_updates(&app), vec![0.25, 0.5, 0.75, 1.0, 0.0]);
    assert_eq!(
        events::<InteractableUsed>(&app),
        vec![InteractableUsed {
            interactable: pickup,
            user: player,
        }]
    );
    assert_eq!(app.world().resource::<GameState>().points, 5);
    assert_eq!(app.world().resource::<UiState>().points, 5);
    assert!(!app.world().get::<Interactable>(pickup).unwrap().available);

    // Использованный объект: подсказка спрятана, повторный hold не стартует
    step_frame(&mut app, Duration::from_millis(500));
    assert_eq!(app.world().resource::<UiState>().hint, None);
    assert_eq!(events::<InteractableUsed>(&app).len(), 1);
    assert_eq!(app.world().get::<InteractionSession>(player).unwrap().progress(), 0.0);
}

#[test]
fn test_cues_for_completed_hold() {
    let (mut app, player) = scene_with_player();
    let pickup = app.world_mut().spawn(points_pickup_bundle(IN_FRONT, 1, 1.0)).id();
    tick(&mut app);

    input(&mut app, player).interact.press();
    step_frame(&mut app, Duration::from_millis(500));
    step_frame(&mut app, Duration::from_millis(500));

    let kinds: Vec<CueKind> = events::<InteractionCue>(&app)
        .into_iter()
        .inspect(|cue| assert_eq!(cue.target, pickup))
        .map(|cue| cue.kind)
        .collect();
    assert_eq!(kinds.len(), 2);
    assert_eq!(kinds[0], CueKind::ProgressStarted);
    assert!(matches!(kinds[1], CueKind::Completed { variant: 0 }));
}

#[test]
fn test_release_mid_hold_cancels_and_resets_progress() {
    let (mut app, player) = scene_with_player();
    let pickup = app.world_mut().spawn(points_pickup_bundle(IN_FRONT, 1, 2.0)).id();
    tick(&mut app);

    input(&mut app, player).interact.press();
    step_frame(&mut app, Duration::from_millis(500));
    input(&mut app, player).interact.release();
    step_frame(&mut app, Duration::from_millis(500));

    assert_eq!(progress_updates(&app), vec![0.25, 0.0]);
    assert_eq!(
        events::<InteractionCue>(&app).last().copied(),
        Some(InteractionCue {
            target: pickup,
            kind: CueKind::Cancelled,
        })
    );
    let session = app.world().get::<InteractionSession>(player).unwrap();
    assert_eq!(session.state(), InteractionState::Tracking);
    assert_eq!(session.progress(), 0.0);
    assert!(events::<InteractableUsed>(&app).is_empty());
}

#[test]
fn test_object_on_interaction_layer_without_capability_is_ignored() {
    let (mut app, player) = scene_with_player();
    app.world_mut().spawn((
        ColliderShape::Cuboid {
            half_extents: Vec3::splat(0.3),
        },
        PhysicsLayer(LAYER_INTERACTABLE),
        Transform::from_translation(IN_FRONT),
    ));

    input(&mut app, player).interact.press();
    ticks(&mut app, 3);

    let session = app.world().get::<InteractionSession>(player).unwrap();
    assert_eq!(session.state(), InteractionState::Idle);
    assert_eq!(session.target(), None);
    assert_eq!(app.world().resource::<UiState>().hint, None);
}

#[test]
fn test_disabled_hitbox_is_invisible_to_the_ray() {
    let (mut app, player) = scene_with_player();
    let pickup = app.world_mut().spawn(points_pickup_bundle(IN_FRONT, 1, 1.0)).id();
    app.world_mut().get_mut::<Interactable>(pickup).unwrap().hitbox_enabled = false;
    tick(&mut app);

    assert_eq!(app.world().get::<InteractionSession>(player).unwrap().target(), None);
}

#[test]
fn test_switching_target_cancels_previous_progress() {
    let (mut app, player) = scene_with_player();
    let first = app.world_mut().spawn(points_pickup_bundle(IN_FRONT, 1, 2.0)).id();
    tick(&mut app);

    input(&mut app, player).interact.press();
    step_frame(&mut app, Duration::from_millis(500));

    // Первый уезжает, на его месте второй; кнопку не отпускаем
    app.world_mut().get_mut::<Transform>(first).unwrap().translation = Vec3::new(10.0, 0.3, 10.0);
    let second = app.world_mut().spawn(points_pickup_bundle(IN_FRONT, 1, 2.0)).id();
    step_frame(&mut app, Duration::from_millis(500));

    assert_eq!(
        events::<InteractionCue>(&app),
        vec![
            InteractionCue {
                target: first,
                kind: CueKind::ProgressStarted,
            },
            InteractionCue {
                target: first,
                kind: CueKind::Cancelled,
            },
            InteractionCue {
                target: second,
                kind: CueKind::ProgressStarted,
            },
        ]
    );
    let session = app.world().get::<InteractionSession>(player).unwrap();
    assert_eq!(session.target(), Some(second));
    assert_eq!(session.state(), InteractionState::Holding);
    assert!((session.progress() - 0.5).abs() < 1e-5);
}

#[test]
fn test_hint_follows_target_and_clears_on_miss() {
    let (mut app, player) = scene_with_player();
    let pickup = app.world_mut().spawn(points_pickup_bundle(IN_FRONT, 1, 1.0)).id();
    tick(&mut app);
    assert_eq!(app.world().resource::<UiState>().hint.as_deref(), Some("hold [E] Collect"));

    app.world_mut().get_mut::<Transform>(pickup).unwrap().translation = Vec3::new(10.0, 0.3, 10.0);
    tick(&mut app);
    tick(&mut app);

    assert_eq!(app.world().resource::<UiState>().hint, None);
    let hints: Vec<Option<String>> = events::<UiUpdate>(&app)
        .into_iter()
        .filter_map(|update| match update {
            UiUpdate::HintText(hint) => Some(hint),
            _ => None,
        })
        .collect();
    // Одинаковая подсказка не дублируется
    assert_eq!(hints, vec![Some("hold [E] Collect".to_string()), None]);
}

#[test]
fn test_event_buffers_do_not_grow_during_long_hold() {
    let (mut app, player) = scene_with_player();
    app.world_mut().spawn(points_pickup_bundle(IN_FRONT, 1, 1000.0));
    tick(&mut app);

    input(&mut app, player).interact.press();
    for _ in 0..500 {
        step_frame(&mut app, Duration::from_millis(16));
    }

    // Каждый frame пишет progress, но в буфере остаются только два последних update
    assert!(app.world().resource::<Events<UiUpdate>>().len() <= 4);
    assert!(app.world().resource::<Events<InteractionCue>>().len() <= 2);
    assert_eq!(progress_updates(&app).len(), 500);
}
