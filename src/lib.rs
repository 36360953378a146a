//! Cubemorph Library
//!
//! A 3x3x3 twisty puzzle engine that can morph into a 2x2 cube, a
//! pyramorphix and a mirror cube. The engine owns the pieces, the permutation
//! model, the move history and every running animation; hosts feed it time,
//! pointer gestures and commands, and draw the piece transforms it produces.

pub mod animation;
pub mod colors;
pub mod commands;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod gesture;
pub mod model;
pub mod morph;
pub mod moves;
pub mod pieces;

pub use commands::{Command, CommandError};
pub use config::{EngineConfig, InitialShape};
pub use engine::PuzzleEngine;
pub use moves::{Move, MoveError};

/// The command façade behind a vtable, for hosts that keep the puzzle as a
/// trait object.
///
/// Every operation is fire-and-forget: calls the puzzle cannot honor right
/// now are dropped.
pub trait CubeOps {
    fn undo(&mut self);
    fn redo(&mut self);
    /// `None` plays the configured number of random moves.
    fn shuffle(&mut self, n: Option<usize>);
    fn morph(&mut self, target: u8);
    fn mirror(&mut self);
    fn help(&mut self);
    fn submit_move(&mut self, token: &str);
}

impl CubeOps for PuzzleEngine {
    fn undo(&mut self) {
        self.dispatch(Command::Undo)
    }

    fn redo(&mut self) {
        self.dispatch(Command::Redo)
    }

    fn shuffle(&mut self, n: Option<usize>) {
        self.dispatch(Command::Shuffle(n))
    }

    fn morph(&mut self, target: u8) {
        self.dispatch(Command::Morph(target))
    }

    fn mirror(&mut self) {
        self.dispatch(Command::Mirror)
    }

    fn help(&mut self) {
        self.dispatch(Command::Help)
    }

    fn submit_move(&mut self, token: &str) {
        PuzzleEngine::submit_move(self, token)
    }
}
