//! Gesture resolver: turns a pointer drag on the puzzle into a move token.
//!
//! Pointer-down ray-casts against the visible piece meshes and records the
//! piece, its face normal and the hit point in root space. Every pointer-move
//! re-samples the hit point and looks the drag up in a rule table. On
//! pointer-up the resolved move, if any, is submitted like a typed one.

use glam::{Mat4, Vec2, Vec3};
use log::debug;

use crate::engine::PuzzleEngine;
use crate::geometry::{Face, TRIANGLES_PER_PIECE};
use crate::moves::{Axis, Letter, Move};
use crate::pieces::{Coord, Piece, PieceId};

/// Drags shorter than this (in model units) resolve to no move.
pub const DRAG_THRESHOLD: f32 = 0.1;

const EPSILON: f32 = 1e-6;

/// A ray in some coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    /// The same ray expressed through `matrix`.
    pub fn transformed(&self, matrix: Mat4) -> Ray {
        Ray::new(matrix.transform_point3(self.origin), matrix.transform_vector3(self.direction))
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Distance to a front-facing triangle (counter-clockwise seen from the
    /// ray origin), or `None`.
    pub fn intersect_triangle(&self, [a, b, c]: [Vec3; 3]) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// Perspective camera looking at the puzzle, used to turn viewport pixels
/// into world rays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 8.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            viewport: Vec2::new(800.0, 600.0),
        }
    }
}

impl Camera {
    /// World ray through a pixel; `(0, 0)` is the top-left corner.
    pub fn ray_through(&self, pixel: Vec2) -> Ray {
        let ndc = Vec2::new(
            pixel.x / self.viewport.x * 2.0 - 1.0,
            -(pixel.y / self.viewport.y) * 2.0 + 1.0,
        );
        let forward = (self.target - self.eye).normalize_or_zero();
        let right = forward.cross(self.up).normalize_or_zero();
        let up = right.cross(forward);
        let half_height = (self.fov_y / 2.0).tan();
        let aspect = self.viewport.x / self.viewport.y;
        let direction = forward + right * ndc.x * half_height * aspect + up * ndc.y * half_height;
        Ray::new(self.eye, direction)
    }
}

/// Nearest intersection of a picking ray with a piece.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub piece: PieceId,
    pub triangle: usize,
    pub distance: f32,
    /// Hit point in puzzle root space.
    pub point: Vec3,
}

/// An axis label with its sign, e.g. `-x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignedAxis {
    pub axis: Axis,
    pub negative: bool,
}

impl SignedAxis {
    pub const fn new(axis: Axis, negative: bool) -> Self {
        Self { axis, negative }
    }
}

/// Dominant component of `v`.
///
/// Ties fall through to `z`; a component of exactly zero counts as negative.
pub fn major_axis(v: Vec3) -> SignedAxis {
    let a = v.abs();
    if a.x > a.y && a.x > a.z {
        SignedAxis::new(Axis::X, v.x <= 0.0)
    } else if a.y > a.x && a.y > a.z {
        SignedAxis::new(Axis::Y, v.y <= 0.0)
    } else {
        SignedAxis::new(Axis::Z, v.z <= 0.0)
    }
}

/// Model-space normal of the face a triangle belongs to.
fn grabbed_normal(piece: &Piece, triangle: usize) -> Option<Vec3> {
    let face = Face::from_index(triangle / 2)?;
    Some(piece.matrix.transform_vector3(face.normal()).normalize_or_zero())
}

/// A lattice position pattern, `None` matching any value on that axis.
type PositionPattern = [Option<i32>; 3];

fn matches(pattern: &PositionPattern, (x, y, z): Coord) -> bool {
    pattern.iter().zip([x, y, z]).all(|(want, got)| want.is_none_or(|w| w == got))
}

/// Drag rule for the cube shapes.
#[derive(Clone, Copy, Debug)]
pub struct DragRule {
    pub position: PositionPattern,
    pub normal: SignedAxis,
    pub drag: Axis,
    pub letter: Letter,
    /// Whether a drag along the positive axis turns the inverse direction.
    pub inverted: bool,
}

const N: Option<i32> = Some(-1);
const O: Option<i32> = Some(0);
const P: Option<i32> = Some(1);
const ANY: Option<i32> = None;

const POS_X: SignedAxis = SignedAxis::new(Axis::X, false);
const NEG_X: SignedAxis = SignedAxis::new(Axis::X, true);
const POS_Y: SignedAxis = SignedAxis::new(Axis::Y, false);
const NEG_Y: SignedAxis = SignedAxis::new(Axis::Y, true);
const POS_Z: SignedAxis = SignedAxis::new(Axis::Z, false);
const NEG_Z: SignedAxis = SignedAxis::new(Axis::Z, true);

const fn rule(
    position: PositionPattern,
    normal: SignedAxis,
    drag: Axis,
    letter: Letter,
    inverted: bool,
) -> DragRule {
    DragRule { position, normal, drag, letter, inverted }
}

/// Which slice a drag turns, by grabbed face and drag direction.
pub const DRAG_RULES: [DragRule; 36] = {
    use Axis::{X as DX, Y as DY, Z as DZ};
    use Letter::*;
    [
        // left and right faces, dragged up
        rule([N, ANY, N], NEG_X, DY, B, true),
        rule([N, ANY, O], NEG_X, DY, S, false),
        rule([N, ANY, P], NEG_X, DY, F, false),
        rule([P, ANY, N], POS_X, DY, B, false),
        rule([P, ANY, O], POS_X, DY, S, true),
        rule([P, ANY, P], POS_X, DY, F, true),
        // front and back faces, dragged up
        rule([N, ANY, P], POS_Z, DY, L, true),
        rule([O, ANY, P], POS_Z, DY, M, true),
        rule([P, ANY, P], POS_Z, DY, R, false),
        rule([N, ANY, N], NEG_Z, DY, L, false),
        rule([O, ANY, N], NEG_Z, DY, M, false),
        rule([P, ANY, N], NEG_Z, DY, R, true),
        // top and bottom faces, dragged towards the front
        rule([N, P, ANY], POS_Y, DZ, L, false),
        rule([O, P, ANY], POS_Y, DZ, M, false),
        rule([P, P, ANY], POS_Y, DZ, R, true),
        rule([N, N, ANY], NEG_Y, DZ, L, true),
        rule([O, N, ANY], NEG_Y, DZ, M, true),
        rule([P, N, ANY], NEG_Y, DZ, R, false),
        // left and right faces, dragged towards the front
        rule([N, N, ANY], NEG_X, DZ, D, false),
        rule([N, O, ANY], NEG_X, DZ, E, false),
        rule([N, P, ANY], NEG_X, DZ, U, true),
        rule([P, N, ANY], POS_X, DZ, D, true),
        rule([P, O, ANY], POS_X, DZ, E, true),
        rule([P, P, ANY], POS_X, DZ, U, false),
        // front and back faces, dragged right
        rule([ANY, N, P], POS_Z, DX, D, false),
        rule([ANY, O, P], POS_Z, DX, E, false),
        rule([ANY, P, P], POS_Z, DX, U, true),
        rule([ANY, N, N], NEG_Z, DX, D, true),
        rule([ANY, O, N], NEG_Z, DX, E, true),
        rule([ANY, P, N], NEG_Z, DX, U, false),
        // top and bottom faces, dragged right
        rule([ANY, P, N], POS_Y, DX, B, true),
        rule([ANY, P, O], POS_Y, DX, S, false),
        rule([ANY, P, P], POS_Y, DX, F, false),
        rule([ANY, N, N], NEG_Y, DX, B, false),
        rule([ANY, N, O], NEG_Y, DX, S, true),
        rule([ANY, N, P], NEG_Y, DX, F, true),
    ]
};

/// Move for a drag along `drag` on a face with outward `normal` of the piece
/// at `position`.
pub fn resolve_drag(position: Coord, normal: SignedAxis, drag: SignedAxis) -> Option<Move> {
    DRAG_RULES
        .iter()
        .find(|r| r.normal == normal && r.drag == drag.axis && matches(&r.position, position))
        .map(|r| Move::new(r.letter, drag.negative != r.inverted))
}

/// Drag rule for the pyramorphix, keyed by the axis the drag circles.
#[derive(Clone, Copy, Debug)]
pub struct PyraRule {
    pub position: PositionPattern,
    pub axis: Axis,
    pub letter: Letter,
    pub inverted: bool,
}

pub const PYRA_RULES: [PyraRule; 6] = [
    PyraRule { position: [N, ANY, ANY], axis: Axis::X, letter: Letter::L, inverted: true },
    PyraRule { position: [P, ANY, ANY], axis: Axis::X, letter: Letter::R, inverted: false },
    PyraRule { position: [ANY, N, ANY], axis: Axis::Y, letter: Letter::D, inverted: true },
    PyraRule { position: [ANY, P, ANY], axis: Axis::Y, letter: Letter::U, inverted: false },
    PyraRule { position: [ANY, ANY, N], axis: Axis::Z, letter: Letter::B, inverted: true },
    PyraRule { position: [ANY, ANY, P], axis: Axis::Z, letter: Letter::F, inverted: false },
];

/// Signed angle from `(x1, y1)` to `(x2, y2)` around the origin, in `-π..=π`.
pub fn angle_diff(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let diff = y2.atan2(x2) - y1.atan2(x1);
    if diff > PI {
        diff - TAU
    } else if diff < -PI {
        diff + TAU
    } else {
        diff
    }
}

/// Move for a drag from `start` to `end` (root space) on the pyramorphix.
///
/// The drag circles the axis along which it moved least; the sign of the
/// angle swept around that axis picks the direction.
pub fn resolve_pyra_drag(position: Coord, start: Vec3, end: Vec3) -> Option<Move> {
    let a = (end - start).abs();
    let (axis, angle) = if a.z < a.x && a.z < a.y {
        (Axis::Z, angle_diff(start.y, start.x, end.y, end.x))
    } else if a.y < a.x {
        (Axis::Y, angle_diff(-start.z, start.x, -end.z, end.x))
    } else {
        (Axis::X, angle_diff(start.y, -start.z, end.y, -end.z))
    };
    PYRA_RULES
        .iter()
        .find(|r| r.axis == axis && matches(&r.position, position))
        .map(|r| Move::new(r.letter, (angle < 0.0) != r.inverted))
}

/// A drag in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drag {
    pub piece: PieceId,
    /// Lattice position of the piece at pointer-down.
    pub position: Coord,
    /// Grabbed face normal in root space.
    pub normal: SignedAxis,
    pub start: Vec3,
    pub current: Vec3,
    pub token: Option<Move>,
}

impl Drag {
    fn resolve(&self, pyra: bool) -> Option<Move> {
        if self.current.distance(self.start) < DRAG_THRESHOLD {
            return None;
        }
        if pyra {
            resolve_pyra_drag(self.position, self.start, self.current)
        } else {
            resolve_drag(self.position, self.normal, major_axis(self.current - self.start))
        }
    }
}

impl PuzzleEngine {
    /// Nearest visible piece under a viewport pixel.
    pub fn pick(&self, camera: &Camera, pixel: Vec2) -> Option<Hit> {
        let ray = camera.ray_through(pixel).transformed(self.view_matrix().inverse());
        let mut best: Option<Hit> = None;
        for piece in self.pieces.iter().filter(|p| p.visible) {
            let to_root = piece.mesh_to_root();
            for triangle in 0..TRIANGLES_PER_PIECE {
                let corners = piece
                    .geometry()
                    .triangle_at(triangle, piece.morph_weight)
                    .map(|p| to_root.transform_point3(p));
                let Some(distance) = ray.intersect_triangle(corners) else {
                    continue;
                };
                if best.is_none_or(|b| distance < b.distance) {
                    best = Some(Hit { piece: piece.id(), triangle, distance, point: ray.at(distance) });
                }
            }
        }
        best
    }

    /// Starts a drag if the pointer is over a visible piece.
    ///
    /// Returns whether a drag started; hosts keep camera controls off until
    /// [`PuzzleEngine::pointer_up`] when it did.
    pub fn pointer_down(&mut self, camera: &Camera, pixel: Vec2) -> bool {
        let Some(hit) = self.pick(camera, pixel) else {
            self.drag = None;
            return false;
        };
        let piece = self.piece(hit.piece);
        let Some(normal) = grabbed_normal(piece, hit.triangle) else {
            debug!("triangle {} of piece {} has no face", hit.triangle, hit.piece);
            self.drag = None;
            return false;
        };
        let position = piece.lattice_position();
        self.drag = Some(Drag {
            piece: hit.piece,
            position,
            normal: major_axis(normal),
            start: hit.point,
            current: hit.point,
            token: None,
        });
        true
    }

    /// Re-samples the drag point and resolves the move it describes so far.
    pub fn pointer_move(&mut self, camera: &Camera, pixel: Vec2) {
        if self.drag.is_none() {
            return;
        }
        let Some(hit) = self.pick(camera, pixel) else {
            return;
        };
        let pyra = self.shape.is_pyra;
        if let Some(drag) = self.drag.as_mut() {
            drag.current = hit.point;
            drag.token = drag.resolve(pyra);
        }
    }

    /// Ends the drag and submits its move, if one was resolved.
    pub fn pointer_up(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        match drag.token {
            Some(mv) => self.submit(mv),
            None => debug!("drag on piece {} resolved to no move", drag.piece),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag(&self) -> Option<&Drag> {
        self.drag.as_ref()
    }
}
