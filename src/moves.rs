//! Move tokens and the rotation tables behind them.
//!
//! A token is one letter of `lmrudebsfxyz`, upper case for the inverse turn,
//! optionally followed by `!` for a wide turn that takes the adjacent middle
//! slice along.

use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec3};
use strum::{Display, EnumIter};
use thiserror::Error;

use crate::pieces::Coord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Axis {
    #[strum(serialize = "x")]
    X,
    #[strum(serialize = "y")]
    Y,
    #[strum(serialize = "z")]
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Rotation matrix about this axis through the origin.
    pub fn rotation(self, degrees: f32) -> Mat4 {
        let angle = degrees.to_radians();
        match self {
            Axis::X => Mat4::from_rotation_x(angle),
            Axis::Y => Mat4::from_rotation_y(angle),
            Axis::Z => Mat4::from_rotation_z(angle),
        }
    }

    /// Rotates a lattice coordinate by a whole number of quarter turns
    /// (positive = counter-clockwise looking down the axis).
    pub fn rotate_coord(self, (x, y, z): Coord, quarter_turns: i32) -> Coord {
        let mut c = (x, y, z);
        for _ in 0..quarter_turns.rem_euclid(4) {
            let (x, y, z) = c;
            c = match self {
                Axis::X => (x, -z, y),
                Axis::Y => (z, y, -x),
                Axis::Z => (-y, x, z),
            };
        }
        c
    }
}

/// A move letter, independent of case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum Letter {
    L,
    M,
    R,
    U,
    E,
    D,
    B,
    S,
    F,
    X,
    Y,
    Z,
}

/// Letters a 3x3 shuffle draws from.
pub const SLICE_LETTERS: [Letter; 9] = [
    Letter::L,
    Letter::M,
    Letter::R,
    Letter::U,
    Letter::E,
    Letter::D,
    Letter::B,
    Letter::S,
    Letter::F,
];

/// Letters a 2x2 shuffle draws from (no middle slices).
pub const OUTER_LETTERS: [Letter; 6] = [
    Letter::L,
    Letter::R,
    Letter::U,
    Letter::D,
    Letter::B,
    Letter::F,
];

/// Axis, angle, direction and slots of one letter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationDescriptor {
    pub axis: Axis,
    /// Turn angle of the lower-case move.
    pub degrees: f32,
    /// Whether the lower-case move rotates the ring clockwise.
    pub forward: bool,
    /// Ring of 8 slots in clockwise order seen from outside, then the center
    /// slot. Empty for whole-puzzle rotations.
    pub slots: &'static [usize],
}

impl RotationDescriptor {
    pub fn ring(&self) -> Option<[usize; 8]> {
        self.slots.get(..8)?.try_into().ok()
    }
}

impl Letter {
    pub fn from_char(c: char) -> Option<Letter> {
        Some(match c.to_ascii_lowercase() {
            'l' => Letter::L,
            'm' => Letter::M,
            'r' => Letter::R,
            'u' => Letter::U,
            'e' => Letter::E,
            'd' => Letter::D,
            'b' => Letter::B,
            's' => Letter::S,
            'f' => Letter::F,
            'x' => Letter::X,
            'y' => Letter::Y,
            'z' => Letter::Z,
            _ => return None,
        })
    }

    /// Lower-case character of the letter.
    pub fn to_char(self) -> char {
        match self {
            Letter::L => 'l',
            Letter::M => 'm',
            Letter::R => 'r',
            Letter::U => 'u',
            Letter::E => 'e',
            Letter::D => 'd',
            Letter::B => 'b',
            Letter::S => 's',
            Letter::F => 'f',
            Letter::X => 'x',
            Letter::Y => 'y',
            Letter::Z => 'z',
        }
    }

    /// Whole-puzzle rotation rather than a single slice.
    pub fn is_axis(self) -> bool {
        matches!(self, Letter::X | Letter::Y | Letter::Z)
    }

    pub fn descriptor(self) -> RotationDescriptor {
        use Axis::*;
        let (axis, degrees, forward, slots): (Axis, f32, bool, &'static [usize]) = match self {
            Letter::L => (X, 90.0, true, &[0, 9, 18, 21, 24, 15, 6, 3, 12]),
            Letter::M => (X, 90.0, false, &[1, 4, 7, 16, 25, 22, 19, 10, 13]),
            Letter::R => (X, -90.0, true, &[26, 23, 20, 11, 2, 5, 8, 17, 14]),
            Letter::U => (Y, -90.0, false, &[6, 7, 8, 17, 26, 25, 24, 15, 16]),
            Letter::E => (Y, 90.0, false, &[3, 12, 21, 22, 23, 14, 5, 4, 13]),
            Letter::D => (Y, 90.0, false, &[18, 19, 20, 11, 2, 1, 0, 9, 10]),
            Letter::B => (Z, 90.0, true, &[0, 3, 6, 7, 8, 5, 2, 1, 4]),
            Letter::S => (Z, -90.0, true, &[9, 10, 11, 14, 17, 16, 15, 12, 13]),
            Letter::F => (Z, -90.0, true, &[24, 21, 18, 19, 20, 23, 26, 25, 22]),
            Letter::X => (X, -90.0, true, &[]),
            Letter::Y => (Y, -90.0, true, &[]),
            Letter::Z => (Z, -90.0, true, &[]),
        };
        RotationDescriptor { axis, degrees, forward, slots }
    }

    /// Middle slice a wide turn takes along, and whether it turns against
    /// the outer slice's own sense.
    pub fn adjacent(self) -> Option<(Letter, bool)> {
        match self {
            Letter::L => Some((Letter::M, false)),
            Letter::R => Some((Letter::M, true)),
            Letter::F => Some((Letter::S, false)),
            Letter::B => Some((Letter::S, true)),
            Letter::U => Some((Letter::E, false)),
            Letter::D => Some((Letter::E, true)),
            _ => None,
        }
    }

    /// The three parallel slices of a whole-puzzle rotation, each with a
    /// flag telling whether it turns against the move's case.
    pub fn axis_slices(self) -> Option<[(Letter, bool); 3]> {
        match self {
            Letter::X => Some([(Letter::L, true), (Letter::M, true), (Letter::R, false)]),
            Letter::Y => Some([(Letter::U, false), (Letter::E, true), (Letter::D, true)]),
            Letter::Z => Some([(Letter::F, false), (Letter::S, false), (Letter::B, true)]),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("empty move token")]
    Empty,
    #[error("unknown move letter {0:?}")]
    UnknownLetter(char),
    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
    #[error("whole-puzzle rotation {0:?} cannot be wide")]
    WideAxisTurn(char),
}

/// One ring permutation step of the puzzle model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceTurn {
    pub letter: Letter,
    pub clockwise: bool,
}

/// A parsed move token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub letter: Letter,
    /// Upper-case token.
    pub inverted: bool,
    /// `!` suffix.
    pub wide: bool,
}

impl Move {
    pub fn new(letter: Letter, inverted: bool) -> Self {
        Self { letter, inverted, wide: false }
    }

    /// The same move with its case toggled. Wideness is kept.
    pub fn inverse(self) -> Self {
        Self { inverted: !self.inverted, ..self }
    }

    pub fn descriptor(&self) -> RotationDescriptor {
        self.letter.descriptor()
    }

    /// Angle the affected pieces turn by, in degrees.
    pub fn angle(&self) -> f32 {
        let degrees = self.descriptor().degrees;
        if self.inverted {
            -degrees
        } else {
            degrees
        }
    }

    /// Ring permutations that carry this move out on the puzzle model, in order.
    pub fn slice_turns(&self) -> Vec<SliceTurn> {
        let lower = !self.inverted;
        if let Some(slices) = self.letter.axis_slices() {
            return slices
                .into_iter()
                .map(|(letter, flip)| SliceTurn {
                    letter,
                    clockwise: (lower != flip) == letter.descriptor().forward,
                })
                .collect();
        }

        let clockwise = lower == self.descriptor().forward;
        let mut turns = vec![SliceTurn { letter: self.letter, clockwise }];
        if self.wide {
            if let Some((adjacent, flip)) = self.letter.adjacent() {
                turns.push(SliceTurn {
                    letter: adjacent,
                    clockwise: (clockwise != flip) == adjacent.descriptor().forward,
                });
            }
        }
        turns
    }
}

impl FromStr for Move {
    type Err = MoveError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut chars = token.chars();
        let first = chars.next().ok_or(MoveError::Empty)?;
        let letter = Letter::from_char(first).ok_or(MoveError::UnknownLetter(first))?;
        let rest = chars.as_str();
        let wide = match rest {
            "" => false,
            "!" => true,
            _ => return Err(MoveError::TrailingInput(rest.to_string())),
        };
        if wide && letter.is_axis() {
            return Err(MoveError::WideAxisTurn(first));
        }
        Ok(Move { letter, inverted: first.is_ascii_uppercase(), wide })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.letter.to_char();
        if self.inverted {
            write!(f, "{}", c.to_ascii_uppercase())?;
        } else {
            write!(f, "{c}")?;
        }
        if self.wide {
            write!(f, "!")?;
        }
        Ok(())
    }
}
