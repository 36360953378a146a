//! Command façade: the fire-and-forget operations hosts drive the puzzle with.
//!
//! Commands never fail and never block. Anything the engine cannot do right
//! now (a move is animating, no shape path exists) is dropped with a log line.
//! The message bridge decodes `{"action": "...", "params": ...}` JSON into a
//! [`Command`].

use glam::{Quat, Vec3};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::engine::PuzzleEngine;
use crate::moves::Letter;

/// Named operations; the kebab-case names double as message actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Command {
    Undo,
    Redo,
    /// Random moves; `None` uses the configured count.
    Shuffle(Option<usize>),
    /// Target shape code.
    Morph(u8),
    Mirror,
    /// Shows or hides the rotation labels.
    Help,
    Reset,
    ResetView,
    HideNext,
    ToggleGold,
    ToggleWireframe,
    ToggleTumble,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("invalid params for {action}: {value}")]
    InvalidParam { action: String, value: Value },
    #[error("undecodable message: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct Message {
    action: String,
    #[serde(default)]
    params: Value,
}

impl Command {
    /// Decodes a bridge message.
    ///
    /// A missing, null or zero shuffle count means the default count; a
    /// missing morph target means `0`.
    pub fn from_message(text: &str) -> Result<Command, CommandError> {
        let message: Message = serde_json::from_str(text)?;
        let command: Command = message
            .action
            .parse()
            .map_err(|_| CommandError::UnknownAction(message.action.clone()))?;
        let invalid = || CommandError::InvalidParam {
            action: message.action.clone(),
            value: message.params.clone(),
        };

        let command = match command {
            Command::Shuffle(_) => match &message.params {
                Value::Null => Command::Shuffle(None),
                value => match value.as_u64() {
                    Some(0) => Command::Shuffle(None),
                    Some(n) => Command::Shuffle(Some(usize::try_from(n).map_err(|_| invalid())?)),
                    None => return Err(invalid()),
                },
            },
            Command::Morph(_) => match &message.params {
                Value::Null => Command::Morph(0),
                value => Command::Morph(
                    value.as_u64().and_then(|n| u8::try_from(n).ok()).ok_or_else(invalid)?,
                ),
            },
            other => other,
        };
        Ok(command)
    }
}

/// Distance of a rotation label from the puzzle center, in model units.
pub const LABEL_DISTANCE: f32 = 1.6;
pub const LABEL_SCALE: f32 = 0.5;

/// An on-cube marker naming the turn of one outer face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationLabel {
    pub letter: Letter,
    /// Shows the inverse turn (shift held).
    pub inverse: bool,
    /// Position in puzzle root space.
    pub position: Vec3,
    /// Turns the label to face outwards from its face.
    pub rotation: Quat,
    pub scale: f32,
}

impl RotationLabel {
    /// Text drawn on the label, e.g. `F` or `F'`.
    pub fn text(&self) -> String {
        let letter = self.letter.to_char().to_ascii_uppercase();
        if self.inverse {
            format!("{letter}'")
        } else {
            letter.to_string()
        }
    }
}

impl PuzzleEngine {
    pub fn dispatch(&mut self, command: Command) {
        info!("command {command:?}");
        match command {
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::Shuffle(n) => self.shuffle(n.unwrap_or(self.config.shuffle_moves)),
            Command::Morph(target) => self.morph(target),
            Command::Mirror => self.toggle_mirror(),
            Command::Help => self.help(),
            Command::Reset => self.reset(),
            Command::ResetView => self.reset_view(),
            Command::HideNext => self.hide_next(),
            Command::ToggleGold => self.toggle_gold(),
            Command::ToggleWireframe => self.toggle_wireframe(),
            Command::ToggleTumble => self.toggle_tumble(),
        }
    }

    /// Decodes and runs a bridge message; bad messages are logged and dropped.
    pub fn dispatch_message(&mut self, text: &str) {
        match Command::from_message(text) {
            Ok(command) => self.dispatch(command),
            Err(err) => warn!("ignoring message {text:?}: {err}"),
        }
    }

    pub fn help(&mut self) {
        self.labels_shown = !self.labels_shown;
    }

    pub fn labels_shown(&self) -> bool {
        self.labels_shown
    }

    pub fn set_labels_inverted(&mut self, inverted: bool) {
        self.labels_inverted = inverted;
    }

    /// Labels to draw, empty while hidden.
    pub fn rotation_labels(&self) -> Vec<RotationLabel> {
        if !self.labels_shown {
            return Vec::new();
        }
        let half_turn = std::f32::consts::FRAC_PI_2;
        [
            (Letter::F, Vec3::Z, Quat::IDENTITY),
            (Letter::B, Vec3::NEG_Z, Quat::from_rotation_y(2.0 * half_turn)),
            (Letter::R, Vec3::X, Quat::from_rotation_y(half_turn)),
            (Letter::L, Vec3::NEG_X, Quat::from_rotation_y(-half_turn)),
            (Letter::U, Vec3::Y, Quat::from_rotation_x(-half_turn)),
            (Letter::D, Vec3::NEG_Y, Quat::from_rotation_x(half_turn)),
        ]
        .into_iter()
        .map(|(letter, face, rotation)| RotationLabel {
            letter,
            inverse: self.labels_inverted,
            position: face * LABEL_DISTANCE,
            rotation,
            scale: LABEL_SCALE,
        })
        .collect()
    }
}
