//! SimulationConfig: все настраиваемые параметры, загрузка из RON
//!
//! Каждая секция `#[serde(default)]`: в RON файле достаточно указать то,
//! что отличается от дефолтов. Векторы хранятся как `[f32; 3]` (RON без bevy serde).
//!
//! Ошибки конфигурации фатальны: `create_simulation_app` не строит App из
//! невалидного конфига.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locomotion::{
    DefaultLocomotion, EasedLocomotion, GravityIntegrator, GroundSensor, Locomotion, LocomotionParameters,
};
use crate::logger::LogLevel;
use crate::physics::layers::{LAYER_VACUUMABLE, MASK_GROUND};
use crate::tools::Vacuum;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocomotionKind {
    #[default]
    Default,
    Eased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub strategy: LocomotionKind,
    pub base_speed: f32,
    pub ground_modifier: f32,
    pub air_modifier: f32,
    /// Только для Eased
    pub acceleration: f32,
    /// Только для Eased
    pub rotation_blend: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        let eased = EasedLocomotion::default();
        let parameters = LocomotionParameters::default();
        Self {
            strategy: LocomotionKind::Default,
            base_speed: 300.0,
            ground_modifier: parameters.ground_modifier,
            air_modifier: parameters.air_modifier,
            acceleration: eased.acceleration,
            rotation_blend: eased.rotation_blend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub radius_modifier: f32,
    pub probe_length: f32,
    pub offset: [f32; 3],
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            radius_modifier: 1.0,
            probe_length: 0.1,
            offset: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    pub pull_per_second: f32,
    pub terminal_velocity: f32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            pull_per_second: 50.0,
            terminal_velocity: -150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub length: f32,
    pub cast_offset: [f32; 3],
    /// Подпись кнопки в подсказке
    pub binding: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            length: 1.0,
            cast_offset: [0.0, -0.75, 0.0],
            binding: "E".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VacuumConfig {
    pub strength: f32,
    pub length: f32,
    pub width: f32,
    pub throw_force: f32,
    pub cooldown: f32,
    pub hold_offset: [f32; 3],
    pub grab_half_extents: [f32; 3],
}

impl Default for VacuumConfig {
    fn default() -> Self {
        let vacuum = Vacuum::default();
        Self {
            strength: vacuum.strength,
            length: vacuum.length,
            width: vacuum.width,
            throw_force: vacuum.throw_force,
            cooldown: vacuum.cooldown,
            hold_offset: vacuum.hold_offset.to_array(),
            grab_half_extents: vacuum.grab_half_extents.to_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub damage: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self { damage: 3.0 }
    }
}

/// Полный конфиг симуляции (доступен системам как resource)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub locomotion: LocomotionConfig,
    #[serde(default)]
    pub ground: GroundConfig,
    #[serde(default)]
    pub gravity: GravityConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub vacuum: VacuumConfig,
    #[serde(default)]
    pub zones: ZoneConfig,
}

fn default_seed() -> u64 {
    42
}

fn default_tick_hz() -> f64 {
    60.0
}

fn default_log_level() -> String {
    LogLevel::Info.as_str().to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_hz: default_tick_hz(),
            log_level: default_log_level(),
            debug: false,
            locomotion: LocomotionConfig::default(),
            ground: GroundConfig::default(),
            gravity: GravityConfig::default(),
            interaction: InteractionConfig::default(),
            vacuum: VacuumConfig::default(),
            zones: ZoneConfig::default(),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be > 0, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be >= 0, got {value}"),
        })
    }
}

impl SimulationConfig {
    /// Парсинг + валидация
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_hz.is_finite() && self.tick_hz > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "tick_hz",
                reason: format!("must be > 0, got {}", self.tick_hz),
            });
        }
        self.log_level()?;

        positive("locomotion.base_speed", self.locomotion.base_speed)?;
        non_negative("locomotion.ground_modifier", self.locomotion.ground_modifier)?;
        non_negative("locomotion.air_modifier", self.locomotion.air_modifier)?;
        positive("locomotion.acceleration", self.locomotion.acceleration)?;
        if !(0.0..=1.0).contains(&self.locomotion.rotation_blend) {
            return Err(ConfigError::InvalidValue {
                field: "locomotion.rotation_blend",
                reason: format!("must be in [0, 1], got {}", self.locomotion.rotation_blend),
            });
        }

        positive("ground.radius_modifier", self.ground.radius_modifier)?;
        positive("ground.probe_length", self.ground.probe_length)?;

        positive("gravity.pull_per_second", self.gravity.pull_per_second)?;
        if !(self.gravity.terminal_velocity.is_finite() && self.gravity.terminal_velocity < 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "gravity.terminal_velocity",
                reason: format!("must be < 0, got {}", self.gravity.terminal_velocity),
            });
        }

        positive("interaction.length", self.interaction.length)?;

        non_negative("vacuum.strength", self.vacuum.strength)?;
        positive("vacuum.length", self.vacuum.length)?;
        positive("vacuum.width", self.vacuum.width)?;
        non_negative("vacuum.throw_force", self.vacuum.throw_force)?;
        non_negative("vacuum.cooldown", self.vacuum.cooldown)?;

        non_negative("zones.damage", self.zones.damage)?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        LogLevel::parse(&self.log_level).ok_or_else(|| ConfigError::InvalidValue {
            field: "log_level",
            reason: format!("unknown level `{}`", self.log_level),
        })
    }

    /// Общая стратегия для всех контроллеров
    pub fn build_locomotion(&self) -> Locomotion {
        let parameters = LocomotionParameters {
            ground_modifier: self.locomotion.ground_modifier,
            air_modifier: self.locomotion.air_modifier,
        };
        match self.locomotion.strategy {
            LocomotionKind::Default => Locomotion::new(DefaultLocomotion::new(parameters)),
            LocomotionKind::Eased => Locomotion::new(EasedLocomotion {
                parameters,
                acceleration: self.locomotion.acceleration,
                rotation_blend: self.locomotion.rotation_blend,
            }),
        }
    }

    pub fn ground_sensor(&self) -> GroundSensor {
        GroundSensor::new(
            self.ground.radius_modifier,
            self.ground.probe_length,
            Vec3::from_array(self.ground.offset),
            MASK_GROUND,
        )
    }

    pub fn gravity(&self) -> GravityIntegrator {
        GravityIntegrator::new(self.gravity.pull_per_second, self.gravity.terminal_velocity)
    }

    pub fn vacuum(&self) -> Vacuum {
        // Runtime поля (held, cooldown) приватны: стартуем с пустого состояния
        let mut vacuum = Vacuum::default();
        vacuum.strength = self.vacuum.strength;
        vacuum.length = self.vacuum.length;
        vacuum.width = self.vacuum.width;
        vacuum.throw_force = self.vacuum.throw_force;
        vacuum.cooldown = self.vacuum.cooldown;
        vacuum.mask = LAYER_VACUUMABLE;
        vacuum.hold_offset = Vec3::from_array(self.vacuum.hold_offset);
        vacuum.grab_half_extents = Vec3::from_array(self.vacuum.grab_half_extents);
        vacuum.debug = self.debug;
        vacuum
    }
}
