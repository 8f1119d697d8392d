//! Collision Layers Constants
//!
//! Битовые маски membership (PhysicsLayer) и фильтров (ProbeFilter::mask).
//!
//! ## Layers:
//! - bit 0: Default (entity без PhysicsLayer)
//! - bit 1: Ground (пол, платформы)
//! - bit 2: Actors (игрок)
//! - bit 3: Interactable (tools, pickups)
//! - bit 4: Vacuumable (объекты, которые тянет вакуум)
//! - bit 5: Zones (trigger volumes)

pub const LAYER_DEFAULT: u32 = 1 << 0;
pub const LAYER_GROUND: u32 = 1 << 1;
pub const LAYER_ACTORS: u32 = 1 << 2;
pub const LAYER_INTERACTABLE: u32 = 1 << 3;
pub const LAYER_VACUUMABLE: u32 = 1 << 4;
pub const LAYER_ZONES: u32 = 1 << 5;

pub const MASK_ALL: u32 = u32::MAX;

/// Ground probe: на чём можно стоять
pub const MASK_GROUND: u32 = LAYER_DEFAULT | LAYER_GROUND | LAYER_VACUUMABLE;

/// Interaction probe: что принимает interaction
pub const MASK_INTERACTION: u32 = LAYER_INTERACTABLE;
