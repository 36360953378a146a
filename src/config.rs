//! Engine settings: animation timing, shuffle length and the starting shape.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::animation::Easing;

/// Shape the puzzle takes right after construction (or reset).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum InitialShape {
    #[default]
    #[strum(serialize = "cube")]
    Cube,
    #[strum(serialize = "2x2")]
    #[serde(rename = "2x2")]
    TwoByTwo,
    #[strum(serialize = "pyramorphix")]
    Pyramorphix,
    #[strum(serialize = "mirrorcube")]
    #[serde(rename = "mirrorcube")]
    Mirror,
    #[strum(serialize = "mirror-gold")]
    MirrorGold,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds per slice turn.
    pub turn_duration: f32,
    /// Seconds per shape primitive (2x2 scaling, mirror, pyramorphix morph).
    pub shape_duration: f32,
    /// Seconds per view preset change.
    pub view_duration: f32,
    /// Pause before the next queued move starts.
    pub queue_delay: f32,
    /// Pause after each step of a shape sequence.
    pub settle_delay: f32,
    #[serde(with = "easing_name")]
    pub easing: Easing,
    /// Moves per shuffle when the caller gives no count.
    pub shuffle_moves: usize,
    /// Fixed RNG seed for reproducible shuffles.
    pub seed: Option<u64>,
    pub initial_shape: InitialShape,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turn_duration: 0.5,
            shape_duration: 0.5,
            view_duration: 0.5,
            queue_delay: 0.05,
            settle_delay: 0.5,
            easing: Easing::Linear,
            shuffle_moves: 10,
            seed: None,
            initial_shape: InitialShape::Cube,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineConfig {
    /// Parses a JSON config; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Settings with every animation and delay set to zero.
    pub fn instant() -> Self {
        Self {
            turn_duration: 0.0,
            shape_duration: 0.0,
            view_duration: 0.0,
            queue_delay: 0.0,
            settle_delay: 0.0,
            ..Self::default()
        }
    }
}

/// Easing stored by its kebab-case name.
mod easing_name {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::animation::Easing;

    pub fn serialize<S: Serializer>(easing: &Easing, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&easing.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Easing, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(D::Error::custom)
    }
}
