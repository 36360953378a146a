//! Per-piece mesh geometry.
//!
//! Every piece is a box of side [`CUBE_SIZE`] built from six quads. Each quad
//! corner is stored twice: the first triangle of a face uses the first copy,
//! the second triangle the second copy. The two triangles of a face then keep
//! independent normals once the pyramorphix morph bends the face.
//!
//! Mesh corner ids use the bit pattern `x + 2*y + 4*z`, where a bit is set for
//! the positive side of that axis, so corner 0 is `(-, -, -)` and corner 7 is
//! `(+, +, +)`.

use glam::Vec3;

/// Edge length of a rendered piece (slightly below the lattice step to leave a gap).
pub const CUBE_SIZE: f32 = 0.98;

const HALF: f32 = CUBE_SIZE / 2.0;

/// Number of quads per piece.
pub const FACES_PER_PIECE: usize = 6;

/// Two triangles per quad; triangle `t` uses material slot `t`.
pub const TRIANGLES_PER_PIECE: usize = FACES_PER_PIECE * 2;

/// Four corners per quad, each stored twice.
pub const VERTICES_PER_PIECE: usize = FACES_PER_PIECE * 8;

const SIXTH: f32 = 1.0 / 6.0;

/// The six box faces in mesh order.
///
/// Face `f` owns triangles (and material slots) `2*f` and `2*f + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Right = 0,
    Left = 1,
    Top = 2,
    Bottom = 3,
    Front = 4,
    Back = 5,
}

impl Face {
    pub const ALL: [Face; FACES_PER_PIECE] = [
        Face::Right,
        Face::Left,
        Face::Top,
        Face::Bottom,
        Face::Front,
        Face::Back,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Face> {
        Face::ALL.get(index).copied()
    }

    /// Outward unit normal.
    pub fn normal(self) -> Vec3 {
        match self {
            Face::Right => Vec3::X,
            Face::Left => Vec3::NEG_X,
            Face::Top => Vec3::Y,
            Face::Bottom => Vec3::NEG_Y,
            Face::Front => Vec3::Z,
            Face::Back => Vec3::NEG_Z,
        }
    }

    /// Material slots of the two triangles of this face.
    pub const fn triangles(self) -> [usize; 2] {
        [self as usize * 2, self as usize * 2 + 1]
    }

    /// The four quad corners, as `(u, v)` sign pairs mapped to a position.
    ///
    /// Order is `(-u, -v), (+u, -v), (-u, +v), (+u, +v)` in the face's own
    /// axes, with the axis directions chosen so both triangles wind outward.
    fn corners(self) -> [Vec3; 4] {
        let corner = |iu: f32, iv: f32| -> Vec3 {
            let (u, v) = (iu * HALF, iv * HALF);
            match self {
                Face::Right => Vec3::new(HALF, -v, -u),
                Face::Left => Vec3::new(-HALF, -v, u),
                Face::Top => Vec3::new(u, HALF, v),
                Face::Bottom => Vec3::new(u, -HALF, -v),
                Face::Front => Vec3::new(u, -v, HALF),
                Face::Back => Vec3::new(-u, -v, -HALF),
            }
        };
        [
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(-1.0, 1.0),
            corner(1.0, 1.0),
        ]
    }
}

/// Mesh corner id (`x + 2*y + 4*z`, bit set = positive side) of a box vertex.
pub fn corner_id(position: Vec3) -> u8 {
    (position.x > 0.0) as u8 | ((position.y > 0.0) as u8) << 1 | ((position.z > 0.0) as u8) << 2
}

/// A positional override of one mesh corner in the morph target.
///
/// `None` keeps the base coordinate on that axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerOverride {
    pub corner: u8,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

/// Pulls a corner onto the local x axis.
const fn onto_x(corner: u8) -> CornerOverride {
    CornerOverride { corner, x: None, y: Some(0.0), z: Some(0.0) }
}

/// Pulls a corner onto the local y axis.
const fn onto_y(corner: u8) -> CornerOverride {
    CornerOverride { corner, x: Some(0.0), y: None, z: Some(0.0) }
}

/// Pulls a corner onto the local z axis.
const fn onto_z(corner: u8) -> CornerOverride {
    CornerOverride { corner, x: Some(0.0), y: Some(0.0), z: None }
}

const fn moved_to(corner: u8, x: f32, y: f32, z: f32) -> CornerOverride {
    CornerOverride { corner, x: Some(x), y: Some(y), z: Some(z) }
}

/// Morph-target corner overrides for the slots that make up the pyramorphix.
///
/// The four tetrahedron tips are slots 0, 8, 20 and 24; the remaining corners
/// and the edges between them fold their outer corners onto the local axes.
pub fn morph_overrides(slot: usize) -> &'static [CornerOverride] {
    const S: f32 = SIXTH;
    match slot {
        0 => const { &[onto_x(1), onto_y(2), onto_z(4), moved_to(0, S, S, S)] },
        1 => const { &[onto_x(0), onto_x(1)] },
        2 => const { &[onto_x(0), onto_y(3), onto_z(5)] },
        3 => const { &[onto_y(2), onto_y(0)] },
        5 => const { &[onto_y(3), onto_y(1)] },
        6 => const { &[onto_x(3), onto_y(0), onto_z(6)] },
        7 => const { &[onto_x(2), onto_x(3)] },
        8 => const { &[onto_x(2), onto_y(1), onto_z(7), moved_to(3, -S, -S, S)] },
        9 => const { &[onto_z(4), onto_z(0)] },
        11 => const { &[onto_z(5), onto_z(1)] },
        15 => const { &[onto_z(6), onto_z(2)] },
        17 => const { &[onto_z(7), onto_z(3)] },
        18 => const { &[onto_x(5), onto_y(6), onto_z(0)] },
        19 => const { &[onto_x(4), onto_x(5)] },
        20 => const { &[onto_x(4), onto_y(7), onto_z(1), moved_to(5, -S, S, -S)] },
        21 => const { &[onto_y(6), onto_y(4)] },
        23 => const { &[onto_y(5), onto_y(7)] },
        24 => const { &[onto_x(7), onto_y(4), onto_z(2), moved_to(6, S, -S, -S)] },
        25 => const { &[onto_x(6), onto_x(7)] },
        26 => const { &[onto_x(6), onto_y(5), onto_z(3)] },
        _ => &[],
    }
}

/// Triangulation focus of a slot: `0` keeps the default diagonal, `1..=4`
/// selects a body diagonal of the box whose two end corners every face
/// diagonal must pass through.
///
/// Needed so neighbouring pyramorphix pieces fold along matching diagonals.
pub fn diagonal_focus(slot: usize) -> u8 {
    match slot {
        0 | 26 | 22 | 16 => 1,
        6 | 20 | 12 => 2,
        8 | 18 | 10 => 3,
        2 | 24 | 14 => 4,
        _ => 0,
    }
}

/// End corners of the body diagonal a focus value selects.
fn focus_corners(focus: u8) -> Option<[u8; 2]> {
    match focus {
        1 => Some([0, 7]),
        2 => Some([2, 5]),
        3 => Some([3, 4]),
        4 => Some([1, 6]),
        _ => None,
    }
}

/// Mesh of one piece, with an optional pyramorphix morph target.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Vertex indices per triangle; triangle `t` is drawn with material slot `t`.
    pub triangles: Vec<[u16; 3]>,
    pub morph_positions: Option<Vec<Vec3>>,
    pub morph_normals: Option<Vec<Vec3>>,
    pub diagonal_focus: u8,
}

impl PieceGeometry {
    pub fn has_morph_target(&self) -> bool {
        self.morph_positions.is_some()
    }

    /// Vertex position blended towards the morph target by `weight`.
    pub fn position_at(&self, vertex: usize, weight: f32) -> Vec3 {
        let base = self.positions[vertex];
        match &self.morph_positions {
            Some(morph) if weight != 0.0 => base.lerp(morph[vertex], weight),
            _ => base,
        }
    }

    /// Corner positions of a triangle blended towards the morph target.
    pub fn triangle_at(&self, triangle: usize, weight: f32) -> [Vec3; 3] {
        self.triangles[triangle].map(|vertex| self.position_at(vertex as usize, weight))
    }
}

/// Builds the mesh of the piece at `slot`.
///
/// Pure and deterministic: the same slot always yields the same geometry.
pub fn build_piece_geometry(slot: usize) -> PieceGeometry {
    let focus = diagonal_focus(slot);
    let mut positions = Vec::with_capacity(VERTICES_PER_PIECE);
    let mut normals = Vec::with_capacity(VERTICES_PER_PIECE);
    let mut triangles = Vec::with_capacity(TRIANGLES_PER_PIECE);

    for face in Face::ALL {
        let base = positions.len() as u16;
        let corners = face.corners();
        for corner in corners {
            // first copy for the first triangle, second copy for the second
            positions.push(corner);
            positions.push(corner);
            normals.push(face.normal());
            normals.push(face.normal());
        }
        let first = |q: u16| base + q * 2;
        let second = |q: u16| base + q * 2 + 1;

        // quad corners 0 and 3 are opposite, as are 1 and 2
        let through_0_3 = focus_corners(focus).is_some_and(|ends| {
            ends.contains(&corner_id(corners[0])) || ends.contains(&corner_id(corners[3]))
        });
        // focused pieces list the two triangles of a face the other way round;
        // the pyramorphix color table addresses them in that order
        if through_0_3 {
            triangles.push([first(0), first(3), first(1)]);
            triangles.push([second(0), second(2), second(3)]);
        } else if focus != 0 {
            triangles.push([first(2), first(3), first(1)]);
            triangles.push([second(0), second(2), second(1)]);
        } else {
            triangles.push([first(0), first(2), first(1)]);
            triangles.push([second(2), second(3), second(1)]);
        }
    }

    let overrides = morph_overrides(slot);
    let (morph_positions, morph_normals) = if overrides.is_empty() {
        (None, None)
    } else {
        let mut morphed = positions.clone();
        for o in overrides {
            // corner ids come from the unmorphed box
            for (vertex, position) in morphed.iter_mut().enumerate() {
                if corner_id(positions[vertex]) != o.corner {
                    continue;
                }
                if let Some(x) = o.x {
                    position.x = x;
                }
                if let Some(y) = o.y {
                    position.y = y;
                }
                if let Some(z) = o.z {
                    position.z = z;
                }
            }
        }
        let morphed_normals = vertex_normals(&morphed, &triangles);
        (Some(morphed), Some(morphed_normals))
    };

    PieceGeometry {
        positions,
        normals,
        triangles,
        morph_positions,
        morph_normals,
        diagonal_focus: focus,
    }
}

/// Area-weighted vertex normals of an indexed mesh.
///
/// Vertices used by no triangle, or only by degenerate ones, keep a zero normal.
fn vertex_normals(positions: &[Vec3], triangles: &[[u16; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for &[a, b, c] in triangles {
        let (pa, pb, pc) = (
            positions[a as usize],
            positions[b as usize],
            positions[c as usize],
        );
        let n = (pb - pa).cross(pc - pa);
        normals[a as usize] += n;
        normals[b as usize] += n;
        normals[c as usize] += n;
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}
