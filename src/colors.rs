//! Palettes, color masks and face coloring.
//!
//! Default coloring paints the outward faces of every piece with the six base
//! colors (or the mirror palette), limited by the active [`ColorMask`]. The
//! mask is looked up by the slot a piece *currently* occupies, while the faces
//! painted are the ones the piece had at its home slot, so masks follow the
//! lattice position and colors follow the piece. Pyramorphix coloring ignores
//! the mask and paints a fixed table of triangles per home slot.

use rustc_hash::FxHashMap;
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};

use crate::geometry::{Face, TRIANGLES_PER_PIECE};
use crate::pieces::{slot_coord, slot_index, Piece, PieceId, NUM_PIECES};

/// A surface material as the host should draw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Material {
    Red,
    Orange,
    White,
    Yellow,
    Green,
    Blue,
    Black,
    Silver,
    Gold,
    /// Unlit edges only.
    Wireframe,
}

impl Material {
    pub const fn hex(self) -> u32 {
        match self {
            Material::Red => 0xff0000,
            Material::Orange => 0xffb700,
            Material::White => 0xffffff,
            Material::Yellow => 0xffff00,
            Material::Green => 0x00ff00,
            Material::Blue => 0x0080ff,
            Material::Black => 0x202020,
            Material::Silver => 0xc0c0c0,
            Material::Gold => 0xffd700,
            Material::Wireframe => 0xffffff,
        }
    }

    /// Color as linear `[r, g, b]` in `0.0..=1.0`.
    pub fn rgb(self) -> [f32; 3] {
        let hex = self.hex();
        [
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        ]
    }
}

/// Base color of each face, in [`Face`] order.
pub const BASIC_PALETTE: [Material; 6] = [
    Material::Red,
    Material::Orange,
    Material::White,
    Material::Yellow,
    Material::Green,
    Material::Blue,
];

/// Training masks selecting which faces keep their color.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, EnumString, EnumCount,
)]
pub enum ColorMask {
    /// Every face.
    #[default]
    All,
    /// The six face centers.
    Centers,
    /// Centers plus the four top-layer edges.
    TopEdges,
    TopLayer,
    /// Centers plus the four bottom-layer edges.
    BottomEdges,
    /// Centers plus the bottom and middle layers.
    FirstTwoLayers,
    TopCrossFaces,
    TopBarFaces,
    TopEllFaces,
    TopThreeEdges,
    TopThreeCornersLeft,
    TopThreeCornersRight,
}

/// How a listed slot is colored under a mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskEntry {
    AllFaces,
    Faces(&'static [Face]),
}

impl MaskEntry {
    pub fn allows(&self, face: Face) -> bool {
        match self {
            MaskEntry::AllFaces => true,
            MaskEntry::Faces(faces) => faces.contains(&face),
        }
    }
}

/// Slot to mask entry lookup. Unlisted slots are fully disabled unless the
/// table covers everything.
#[derive(Clone, Debug, Default)]
pub struct MaskTable {
    everything: bool,
    slots: FxHashMap<usize, MaskEntry>,
}

impl MaskTable {
    fn everything() -> Self {
        Self { everything: true, slots: FxHashMap::default() }
    }

    /// Adds (or overrides) entries for `slots`.
    fn with(mut self, slots: impl IntoIterator<Item = usize>, entry: MaskEntry) -> Self {
        for slot in slots {
            self.slots.insert(slot, entry);
        }
        self
    }

    pub fn entry(&self, slot: usize) -> Option<MaskEntry> {
        if self.everything {
            return Some(MaskEntry::AllFaces);
        }
        self.slots.get(&slot).copied()
    }
}

const BOTTOM_FACE_ONLY: &[Face] = &[Face::Bottom];

fn centers() -> MaskTable {
    MaskTable::default().with([4, 10, 12, 14, 16, 22], MaskEntry::AllFaces)
}

fn layers(from_y: i32, to_y: i32) -> impl Iterator<Item = usize> {
    (-1..=1).flat_map(move |z| {
        (from_y..=to_y).flat_map(move |y| (-1..=1).map(move |x| slot_index(x, y, z)))
    })
}

fn first_two_layers() -> MaskTable {
    centers().with(layers(-1, 0), MaskEntry::AllFaces)
}

impl ColorMask {
    pub fn table(self) -> MaskTable {
        use MaskEntry::{AllFaces, Faces};
        match self {
            ColorMask::All => MaskTable::everything(),
            ColorMask::Centers => centers(),
            ColorMask::TopEdges => centers().with([7, 15, 17, 25], AllFaces),
            ColorMask::TopLayer => centers().with(layers(1, 1), AllFaces),
            ColorMask::BottomEdges => centers().with([1, 9, 11, 19], AllFaces),
            ColorMask::FirstTwoLayers => first_two_layers(),
            ColorMask::TopCrossFaces => {
                first_two_layers().with([7, 15, 17, 25], Faces(BOTTOM_FACE_ONLY))
            }
            ColorMask::TopBarFaces => {
                first_two_layers().with([15, 17], Faces(BOTTOM_FACE_ONLY))
            }
            ColorMask::TopEllFaces => {
                first_two_layers().with([15, 7], Faces(BOTTOM_FACE_ONLY))
            }
            ColorMask::TopThreeEdges => first_two_layers().with([15, 17, 25], AllFaces),
            ColorMask::TopThreeCornersLeft => first_two_layers().with([6, 24, 26], AllFaces),
            ColorMask::TopThreeCornersRight => first_two_layers().with([24, 26, 8], AllFaces),
        }
    }

    /// The following mask, staying on the last one.
    pub fn next(self) -> Self {
        ColorMask::iter().skip_while(|m| *m != self).nth(1).unwrap_or(self)
    }

    /// The preceding mask, staying on the first one.
    pub fn previous(self) -> Self {
        ColorMask::iter().take_while(|m| *m != self).last().unwrap_or(self)
    }
}

/// Triangles painted per home slot for each of the four pyramorphix faces.
const PYRA_FACES: [(Material, &[(usize, &[usize])]); 4] = [
    (
        Material::Red,
        &[
            (6, &[2, 5]),
            (18, &[2, 9]),
            (24, &[2, 3, 8, 9, 4, 5]),
            (26, &[5, 9]),
            (25, &[8, 9, 4, 5]),
            (15, &[2, 3, 4, 5]),
            (21, &[2, 3, 8, 9]),
            (12, &[2]),
            (22, &[9]),
            (16, &[5]),
        ],
    ),
    (
        Material::Blue,
        &[
            (18, &[8, 6]),
            (2, &[6, 1]),
            (20, &[8, 9, 0, 1, 6, 7]),
            (26, &[8, 1]),
            (23, &[8, 9, 0, 1]),
            (19, &[8, 9, 6, 7]),
            (11, &[0, 1, 6, 7]),
            (22, &[8]),
            (14, &[1]),
            (10, &[6]),
        ],
    ),
    (
        Material::Yellow,
        &[
            (26, &[0, 4]),
            (6, &[4, 11]),
            (8, &[0, 1, 4, 5, 10, 11]),
            (2, &[0, 11]),
            (17, &[4, 5, 0, 1]),
            (7, &[4, 5, 10, 11]),
            (5, &[0, 1, 10, 11]),
            (16, &[4]),
            (14, &[0]),
            (4, &[11]),
        ],
    ),
    (
        Material::Green,
        &[
            (2, &[10, 7]),
            (18, &[3, 7]),
            (0, &[10, 11, 2, 3, 6, 7]),
            (6, &[10, 3]),
            (3, &[10, 11, 2, 3]),
            (1, &[10, 11, 6, 7]),
            (9, &[2, 3, 6, 7]),
            (4, &[10]),
            (12, &[3]),
            (10, &[7]),
        ],
    ),
];

/// Color flags of a puzzle. [`ColorScheme::apply`] repaints all pieces from them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorScheme {
    pub mask: ColorMask,
    pub pyra: bool,
    pub mirror: bool,
    pub gold: bool,
    pub wireframe: bool,
}

impl ColorScheme {
    /// Palette for enabled faces.
    pub fn palette(&self) -> [Material; 6] {
        match (self.mirror, self.gold) {
            (false, _) => BASIC_PALETTE,
            (true, false) => [Material::Silver; 6],
            (true, true) => [Material::Gold; 6],
        }
    }

    /// Repaints every piece.
    ///
    /// `pieces` is indexed by home slot, `rot[slot]` is the piece currently at `slot`.
    pub fn apply(&self, pieces: &mut [Piece], rot: &[PieceId; NUM_PIECES]) {
        if self.wireframe {
            for piece in pieces.iter_mut() {
                piece.materials = [Material::Wireframe; TRIANGLES_PER_PIECE];
            }
        } else if self.pyra && !self.mirror {
            apply_pyra(pieces);
        } else {
            self.apply_default(pieces, rot);
        }
    }

    fn apply_default(&self, pieces: &mut [Piece], rot: &[PieceId; NUM_PIECES]) {
        let table = self.mask.table();
        let palette = self.palette();
        for (slot, id) in rot.iter().enumerate() {
            let piece = &mut pieces[id.home_slot()];
            piece.materials = [Material::Black; TRIANGLES_PER_PIECE];
            let Some(entry) = table.entry(slot) else {
                continue;
            };
            let (x, y, z) = slot_coord(id.home_slot());
            for (coord, negative, positive) in [
                (x, Face::Left, Face::Right),
                (y, Face::Bottom, Face::Top),
                (z, Face::Back, Face::Front),
            ] {
                let face = match coord {
                    -1 => negative,
                    1 => positive,
                    _ => continue,
                };
                if entry.allows(face) {
                    for t in face.triangles() {
                        piece.materials[t] = palette[face.index()];
                    }
                }
            }
        }
    }
}

fn apply_pyra(pieces: &mut [Piece]) {
    for piece in pieces.iter_mut() {
        piece.materials = [Material::Black; TRIANGLES_PER_PIECE];
    }
    for (material, entries) in PYRA_FACES {
        for &(slot, triangles) in entries {
            for &t in triangles {
                pieces[slot].materials[t] = material;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved() -> (Vec<Piece>, [PieceId; NUM_PIECES]) {
        let pieces = PieceId::all().map(Piece::new).collect();
        let rot = std::array::from_fn(PieceId::from_home_slot);
        (pieces, rot)
    }

    fn count(pieces: &[Piece], material: Material) -> usize {
        pieces
            .iter()
            .flat_map(|p| p.materials.iter())
            .filter(|m| **m == material)
            .count()
    }

    #[test]
    fn test_default_colors_on_solved_puzzle() {
        let (mut pieces, rot) = solved();
        ColorScheme::default().apply(&mut pieces, &rot);

        // 9 stickers per face, two triangles each
        for material in BASIC_PALETTE {
            assert_eq!(count(&pieces, material), 18, "{material} count");
        }
        let corner = &pieces[26].materials;
        assert_eq!(corner[0], Material::Red);
        assert_eq!(corner[1], Material::Red);
        assert_eq!(corner[4], Material::White);
        assert_eq!(corner[8], Material::Green);
        assert_eq!(corner[2], Material::Black);
        assert!(pieces[13].materials.iter().all(|m| *m == Material::Black));
    }

    #[test]
    fn test_centers_mask() {
        let (mut pieces, rot) = solved();
        let scheme = ColorScheme { mask: ColorMask::Centers, ..Default::default() };
        scheme.apply(&mut pieces, &rot);
        let colored = pieces
            .iter()
            .flat_map(|p| p.materials.iter())
            .filter(|m| **m != Material::Black)
            .count();
        assert_eq!(colored, 12);
        assert_eq!(pieces[14].materials[0], Material::Red);
    }

    #[test]
    fn test_mask_follows_current_slot_and_home_faces() {
        let (mut pieces, mut rot) = solved();
        // bottom-back edge now sits in the top-back edge slot
        rot.swap(1, 7);
        let scheme = ColorScheme { mask: ColorMask::TopCrossFaces, ..Default::default() };
        scheme.apply(&mut pieces, &rot);

        let moved = &pieces[1].materials;
        assert_eq!(moved[6], Material::Yellow, "bottom face should stay yellow");
        assert_eq!(moved[7], Material::Yellow);
        assert_eq!(moved[10], Material::Black, "back face is masked");

        // the top edge now sits in the bottom layer, which is fully enabled
        let displaced = &pieces[7].materials;
        assert_eq!(displaced[4], Material::White);
        assert_eq!(displaced[10], Material::Blue);
    }

    #[test]
    fn test_top_edge_slots_show_only_their_underside() {
        for mask in [ColorMask::TopCrossFaces, ColorMask::TopBarFaces, ColorMask::TopEllFaces] {
            let entry = mask.table().entry(15);
            assert_eq!(entry, Some(MaskEntry::Faces(&[Face::Bottom])), "{mask}");
            let entry = entry.unwrap();
            assert!(entry.allows(Face::Bottom));
            assert!(Face::ALL.iter().filter(|f| entry.allows(**f)).eq([Face::Bottom].iter()), "{mask}");
        }
        assert_eq!(ColorMask::TopBarFaces.table().entry(7), None);
    }

    #[test]
    fn test_mirror_palette() {
        let (mut pieces, rot) = solved();
        let mut scheme = ColorScheme { mirror: true, ..Default::default() };
        scheme.apply(&mut pieces, &rot);
        assert_eq!(count(&pieces, Material::Silver), 108);

        scheme.gold = true;
        scheme.apply(&mut pieces, &rot);
        assert_eq!(count(&pieces, Material::Gold), 108);
        assert_eq!(count(&pieces, Material::Silver), 0);
    }

    #[test]
    fn test_pyra_colors() {
        let (mut pieces, rot) = solved();
        let scheme = ColorScheme { pyra: true, ..Default::default() };
        scheme.apply(&mut pieces, &rot);
        for material in [Material::Red, Material::Blue, Material::Yellow, Material::Green] {
            assert_eq!(count(&pieces, material), 27, "{material} pyra triangles");
        }
        assert_eq!(count(&pieces, Material::White), 0);
        assert_eq!(pieces[0].materials[10], Material::Green);

        // mirror coloring wins over pyra coloring
        let scheme = ColorScheme { pyra: true, mirror: true, ..Default::default() };
        scheme.apply(&mut pieces, &rot);
        assert_eq!(count(&pieces, Material::Silver), 108);
    }

    #[test]
    fn test_wireframe_wins() {
        let (mut pieces, rot) = solved();
        let scheme = ColorScheme { wireframe: true, pyra: true, ..Default::default() };
        scheme.apply(&mut pieces, &rot);
        assert_eq!(count(&pieces, Material::Wireframe), NUM_PIECES * TRIANGLES_PER_PIECE);
    }

    #[test]
    fn test_mask_stepping_is_clamped() {
        assert_eq!(ColorMask::All.previous(), ColorMask::All);
        assert_eq!(ColorMask::All.next(), ColorMask::Centers);
        assert_eq!(ColorMask::Centers.previous(), ColorMask::All);
        assert_eq!(ColorMask::TopThreeCornersRight.next(), ColorMask::TopThreeCornersRight);
        assert_eq!(ColorMask::COUNT, 12);
    }

    #[test]
    fn test_material_rgb() {
        assert_eq!(Material::Red.rgb(), [1.0, 0.0, 0.0]);
        assert_eq!(Material::Blue.rgb(), [0.0, 128.0 / 255.0, 1.0]);
    }
}
