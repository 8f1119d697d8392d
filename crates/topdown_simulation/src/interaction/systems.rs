//! Interaction probe (Update)

use bevy::ecs::system::StaticSystemParam;
use bevy::prelude::*;
use rand::Rng;

use super::{
    CueKind, Interactable, InteractableUsed, InteractionBinding, InteractionCue, InteractionSession,
    InteractionState, InteractionTarget, SessionEffect,
};
use crate::components::{ControllerInput, PhysicsLayer};
use crate::controller::BodyController;
use crate::debug::{DebugColor, DebugShapes};
use crate::logger::log_warning;
use crate::physics::layers::{LAYER_DEFAULT, MASK_ALL};
use crate::physics::{PhysicsBackend, ProbeFilter};
use crate::ui::UiUpdate;
use crate::DeterministicRng;

/// System: interaction луч каждого контроллера → session → events
///
/// Промах, чужой слой, hit-box выключен → reset сессии.
/// Объект на interaction слое без Interactable → warning + reset.
#[allow(clippy::too_many_arguments)]
pub fn probe_interactions<B: PhysicsBackend>(
    queries: StaticSystemParam<B::Queries>,
    time: Res<Time>,
    binding: Res<InteractionBinding>,
    mut rng: ResMut<DeterministicRng>,
    mut debug: ResMut<DebugShapes>,
    mut controllers: Query<(Entity, &BodyController, &Transform, &ControllerInput, &mut InteractionSession)>,
    targets: Query<(Option<&PhysicsLayer>, Option<&Interactable>)>,
    mut used: EventWriter<InteractableUsed>,
    mut cues: EventWriter<InteractionCue>,
    mut ui: EventWriter<UiUpdate>,
) {
    let delta = time.delta_secs();

    B::with_queries(&*queries, |spatial| {
        for (entity, controller, transform, input, mut session) in controllers.iter_mut() {
            let origin = transform.translation + transform.rotation * controller.interaction_cast_offset;
            let direction = transform.forward().as_vec3();
            let filter = ProbeFilter::new(MASK_ALL).excluding(entity).with_triggers();
            let hit = spatial.ray_cast(origin, direction, controller.interaction_length, &filter);

            if controller.debug {
                let (end, color) = match hit {
                    Some(hit) => (hit.point, DebugColor::Green),
                    None => (origin + direction * controller.interaction_length, DebugColor::Red),
                };
                debug.line(origin, end, color);
            }

            let interactable = hit.and_then(|hit| {
                let (layer, interactable) = targets.get(hit.entity).ok()?;
                let layer = layer.map_or(LAYER_DEFAULT, |layer| layer.0);
                if layer & controller.interaction_mask == 0 {
                    return None;
                }
                let Some(interactable) = interactable else {
                    log_warning(&format!("{} is on the interaction layer but is not interactable", hit.entity));
                    return None;
                };
                interactable.hitbox_enabled.then_some((hit.entity, interactable))
            });

            let target = interactable.map(|(entity, interactable)| InteractionTarget {
                entity,
                mode: interactable.mode,
                available: interactable.available,
            });

            for effect in session.step(target, input.interact, delta) {
                match effect {
                    SessionEffect::Cancelled { target } => {
                        cues.write(InteractionCue {
                            target,
                            kind: CueKind::Cancelled,
                        });
                        ui.write(UiUpdate::Progress(0.0));
                    }
                    SessionEffect::ProgressStarted { target } => {
                        cues.write(InteractionCue {
                            target,
                            kind: CueKind::ProgressStarted,
                        });
                    }
                    SessionEffect::Progress { normalized, .. } => {
                        ui.write(UiUpdate::Progress(normalized));
                    }
                    SessionEffect::Used { target, hold } => {
                        let variants = interactable.map_or(1, |(_, interactable)| interactable.use_sound_variants.max(1));
                        let variant = rng.rng.gen_range(0..variants);
                        used.write(InteractableUsed {
                            interactable: target,
                            user: entity,
                        });
                        cues.write(InteractionCue {
                            target,
                            kind: CueKind::Completed { variant },
                        });
                        if hold {
                            ui.write(UiUpdate::Progress(0.0));
                        }
                    }
                }
            }

            let hint = interactable
                .filter(|(_, interactable)| interactable.available && session.state() != InteractionState::Used)
                .filter(|_| session.target().is_some())
                .map(|(_, interactable)| interactable.tooltip(&binding.0));
            if let Some(hint) = session.set_hint(hint) {
                ui.write(UiUpdate::HintText(hint));
            }
        }
    });
}
