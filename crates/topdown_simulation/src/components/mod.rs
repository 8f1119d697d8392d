//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - body: физическое тело (PhysicsBody, ColliderShape, PhysicsLayer, Trigger, AttachedTo)
//! - actor: живые существа (Health, Player)
//! - input: абстрактный input контроллера (ControllerInput, ActionState)
//! - camera: top-down камера (CameraRig)

pub mod actor;
pub mod body;
pub mod camera;
pub mod input;

// Re-exports для удобного импорта
pub use actor::*;
pub use body::*;
pub use camera::*;
pub use input::*;
