//! Piece identities, lattice coordinates and the per-piece scene node.
//!
//! The puzzle is a 3x3x3 lattice with coordinates in `-1..=1` on each axis.
//! Every lattice cell has a fixed slot index `(x+1) + (y+1)*3 + (z+1)*9`,
//! so slot 0 is the `(-1, -1, -1)` corner and slot 26 the `(1, 1, 1)` corner.

use std::fmt;

use glam::{Mat4, Vec3};

use crate::colors::Material;
use crate::geometry::{build_piece_geometry, PieceGeometry, TRIANGLES_PER_PIECE};

/// An integer lattice position, each component in `-1..=1`.
pub type Coord = (i32, i32, i32);

/// Number of pieces (and slots) in the puzzle.
pub const NUM_PIECES: usize = 27;

/// Distance between neighbouring lattice cells in model units.
pub const CUBE_STEP: f32 = 1.0;

/// Slots of the eight corner pieces.
pub const CORNER_SLOTS: [usize; 8] = [0, 2, 6, 8, 18, 20, 24, 26];

/// Slots of every non-corner piece (edges, face centers and the core).
pub const CENTER_SLOTS: [usize; 19] = [
    1, 3, 4, 5, 7, 9, 10, 11, 12, 13, 14, 15, 16, 17, 19, 21, 22, 23, 25,
];

/// Converts a lattice coordinate to its slot index.
#[inline(always)]
pub const fn slot_index(x: i32, y: i32, z: i32) -> usize {
    ((x + 1) + (y + 1) * 3 + (z + 1) * 9) as usize
}

/// Converts a slot index back to its lattice coordinate.
#[inline(always)]
pub const fn slot_coord(slot: usize) -> Coord {
    (
        (slot % 3) as i32 - 1,
        ((slot / 3) % 3) as i32 - 1,
        (slot / 9) as i32 - 1,
    )
}

/// Returns whether the slot is one of the eight corners.
pub const fn is_corner(slot: usize) -> bool {
    let (x, y, z) = slot_coord(slot);
    x != 0 && y != 0 && z != 0
}

/// Identity of a piece: the slot it occupied when the puzzle was built.
///
/// Ids never change; moves only permute which id sits in which slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(u8);

impl PieceId {
    /// The piece built at `slot`.
    pub const fn from_home_slot(slot: usize) -> Self {
        assert!(slot < NUM_PIECES, "slot out of range");
        Self(slot as u8)
    }

    /// The slot this piece was built at.
    pub const fn home_slot(self) -> usize {
        self.0 as usize
    }

    /// All 27 ids in home-slot order.
    pub fn all() -> impl Iterator<Item = PieceId> {
        (0..NUM_PIECES).map(PieceId::from_home_slot)
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// One rendered piece: the scene node the host draws.
///
/// `matrix` is the node transform inside the puzzle root (slice rotations and
/// the 2x2 corner scaling act on it). `mesh_matrix` is applied below it, in
/// the piece's own frame, and carries the mirror-cube deformation so that the
/// deformation turns together with the piece.
#[derive(Clone, Debug)]
pub struct Piece {
    id: PieceId,
    geometry: PieceGeometry,
    pub matrix: Mat4,
    pub mesh_matrix: Mat4,
    pub visible: bool,
    /// Weight of the pyramorphix morph target, `0.0` = cube, `1.0` = morphed.
    pub morph_weight: f32,
    /// One material per mesh triangle, two per cube face.
    pub materials: [Material; TRIANGLES_PER_PIECE],
}

impl Piece {
    /// Builds the piece for its home slot, placed on the lattice.
    pub fn new(id: PieceId) -> Self {
        let (x, y, z) = slot_coord(id.home_slot());
        let position = Vec3::new(x as f32, y as f32, z as f32) * CUBE_STEP;
        Self {
            id,
            geometry: build_piece_geometry(id.home_slot()),
            matrix: Mat4::from_translation(position),
            mesh_matrix: Mat4::IDENTITY,
            visible: true,
            morph_weight: 0.0,
            materials: [Material::Black; TRIANGLES_PER_PIECE],
        }
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn geometry(&self) -> &PieceGeometry {
        &self.geometry
    }

    /// Translation part of the node transform.
    pub fn position(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// Current position rounded to the nearest lattice cell.
    pub fn lattice_position(&self) -> Coord {
        let p = self.position() / CUBE_STEP;
        (p.x.round() as i32, p.y.round() as i32, p.z.round() as i32)
    }

    /// Transform from mesh space to the puzzle root.
    pub fn mesh_to_root(&self) -> Mat4 {
        self.matrix * self.mesh_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_coordinate_roundtrip() {
        for slot in 0..NUM_PIECES {
            let (x, y, z) = slot_coord(slot);
            assert_eq!(slot_index(x, y, z), slot, "roundtrip failed for slot {slot}");
        }
        assert_eq!(slot_coord(0), (-1, -1, -1));
        assert_eq!(slot_coord(13), (0, 0, 0));
        assert_eq!(slot_coord(26), (1, 1, 1));
    }

    #[test]
    fn test_corner_and_center_slots_partition_the_lattice() {
        let mut seen = [false; NUM_PIECES];
        for &slot in CORNER_SLOTS.iter().chain(CENTER_SLOTS.iter()) {
            assert!(!seen[slot], "slot {slot} listed twice");
            seen[slot] = true;
        }
        assert!(seen.iter().all(|&s| s));
        for slot in 0..NUM_PIECES {
            assert_eq!(is_corner(slot), CORNER_SLOTS.contains(&slot));
        }
    }

    #[test]
    fn test_new_piece_sits_on_its_home_cell() {
        for id in PieceId::all() {
            let piece = Piece::new(id);
            assert_eq!(piece.lattice_position(), slot_coord(id.home_slot()));
            assert!(piece.visible);
            assert_eq!(piece.morph_weight, 0.0);
        }
    }
}
