//! The permutation model: which piece sits in which lattice slot.
//!
//! Moves are applied here synchronously, before any animation starts, so the
//! next move always resolves its slices against the committed state.

use std::fmt;

use crate::moves::Move;
use crate::pieces::{slot_index, PieceId, NUM_PIECES};

/// `rot[slot]` is the piece currently at `slot`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PuzzleModel {
    rot: [PieceId; NUM_PIECES],
}

impl Default for PuzzleModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PuzzleModel {
    /// Every piece on its home slot.
    pub fn new() -> Self {
        Self { rot: std::array::from_fn(PieceId::from_home_slot) }
    }

    pub fn at(&self, slot: usize) -> PieceId {
        self.rot[slot]
    }

    pub fn slots(&self) -> &[PieceId; NUM_PIECES] {
        &self.rot
    }

    /// Slot the piece currently occupies.
    pub fn slot_of(&self, id: PieceId) -> usize {
        self.rot.iter().position(|&p| p == id).unwrap_or(id.home_slot())
    }

    pub fn is_solved(&self) -> bool {
        self.rot.iter().enumerate().all(|(slot, id)| id.home_slot() == slot)
    }

    /// Cycles the pieces on an 8-slot ring by two positions.
    ///
    /// Clockwise moves the piece at `ring[i + 2]` to `ring[i]`, counter-clockwise
    /// moves the piece at `ring[i]` to `ring[i + 2]`.
    pub fn rotate_slice(&mut self, ring: &[usize; 8], clockwise: bool) {
        let old: [PieceId; 8] = ring.map(|slot| self.rot[slot]);
        let shift = if clockwise { 2 } else { 6 };
        for (i, &slot) in ring.iter().enumerate() {
            self.rot[slot] = old[(i + shift) % 8];
        }
    }

    /// Applies a move and returns the slots whose pieces turn with it.
    ///
    /// Whole-puzzle rotations turn all 27 slots. Slice moves turn the ring and
    /// center of the slice, plus the adjacent slice for wide moves.
    pub fn apply(&mut self, mv: &Move) -> Vec<usize> {
        for turn in mv.slice_turns() {
            if let Some(ring) = turn.letter.descriptor().ring() {
                self.rotate_slice(&ring, turn.clockwise);
            }
        }
        if mv.letter.is_axis() {
            return (0..NUM_PIECES).collect();
        }
        let mut slots = mv.descriptor().slots.to_vec();
        if mv.wide {
            if let Some((adjacent, _)) = mv.letter.adjacent() {
                slots.extend_from_slice(adjacent.descriptor().slots);
            }
        }
        slots
    }

    /// Text grid of piece ids: one block per z layer, rows from top (`y = 1`)
    /// to bottom, columns from `x = -1` to `x = 1`.
    pub fn layout(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = (-1..=1).map(|z| format!("{:<8}", format!("z={z}"))).collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');
        for y in (-1..=1).rev() {
            let blocks: Vec<String> = (-1..=1)
                .map(|z| {
                    (-1..=1)
                        .map(|x| self.rot[slot_index(x, y, z)].to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();
            out.push_str(&blocks.join("  "));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for PuzzleModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.layout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{Letter, SLICE_LETTERS};
    use strum::IntoEnumIterator;

    fn mv(token: &str) -> Move {
        token.parse().unwrap()
    }

    fn apply_all(model: &mut PuzzleModel, tokens: &[&str]) {
        for token in tokens {
            model.apply(&mv(token));
        }
    }

    #[test]
    fn test_slice_rotation_has_period_four() {
        for letter in SLICE_LETTERS {
            let ring = letter.descriptor().ring().unwrap();
            for clockwise in [true, false] {
                let mut model = PuzzleModel::new();
                model.rotate_slice(&ring, clockwise);
                assert!(!model.is_solved(), "{letter:?} should permute the ring");
                for _ in 0..3 {
                    model.rotate_slice(&ring, clockwise);
                }
                assert!(model.is_solved(), "{letter:?} clockwise={clockwise} not 4-periodic");
            }
        }
    }

    #[test]
    fn test_clockwise_and_counter_clockwise_are_inverse() {
        let mut model = PuzzleModel::new();
        apply_all(&mut model, &["l", "u", "F", "m!"]);
        let before = model.clone();
        for letter in SLICE_LETTERS {
            let ring = letter.descriptor().ring().unwrap();
            model.rotate_slice(&ring, true);
            model.rotate_slice(&ring, false);
            assert_eq!(model, before, "{letter:?}");
        }
    }

    #[test]
    fn test_every_move_is_undone_by_its_inverse() {
        for letter in Letter::iter() {
            let mut tokens = vec![letter.to_char().to_string()];
            if letter.adjacent().is_some() {
                tokens.push(format!("{}!", letter.to_char()));
            }
            for token in tokens {
                let m = mv(&token);
                for m in [m, m.inverse()] {
                    let mut model = PuzzleModel::new();
                    model.apply(&m);
                    model.apply(&m.inverse());
                    assert!(model.is_solved(), "{m} followed by {} is not identity", m.inverse());
                }
            }
        }
    }

    #[test]
    fn test_ring_rotation_moves_corners_to_corners() {
        let mut model = PuzzleModel::new();
        model.apply(&mv("l"));
        // clockwise: the piece two ring steps ahead moves in
        assert_eq!(model.at(0), PieceId::from_home_slot(18));
        assert_eq!(model.at(9), PieceId::from_home_slot(21));
        assert_eq!(model.at(12), PieceId::from_home_slot(12), "center stays");
    }

    #[test]
    fn test_apply_reports_turned_slots() {
        let mut model = PuzzleModel::new();
        assert_eq!(model.apply(&mv("r")).len(), 9);
        assert_eq!(model.apply(&mv("R!")).len(), 18);
        assert_eq!(model.apply(&mv("m!")).len(), 9);
        assert_eq!(model.apply(&mv("z")).len(), NUM_PIECES);
    }

    #[test]
    fn test_axis_rotation_moves_every_slice() {
        let mut model = PuzzleModel::new();
        model.apply(&mv("y"));
        let moved = (0..NUM_PIECES).filter(|&s| model.at(s).home_slot() != s).count();
        // only the three slice centers stay put
        assert_eq!(moved, 24);
        assert_eq!(model.slot_of(PieceId::from_home_slot(16)), 16);
    }

    #[test]
    fn test_solved_layout() {
        insta::assert_snapshot!(PuzzleModel::new().layout());
    }

    #[test]
    fn test_layout_after_moves() {
        let mut model = PuzzleModel::new();
        apply_all(&mut model, &["r", "U", "f!", "x"]);
        insta::assert_snapshot!(model.layout());
    }
}
