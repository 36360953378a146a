//! Shape morph controller: 3x3, 2x2, pyramorphix and mirror cube.
//!
//! Three primitives change the silhouette:
//! - 2x2 scaling shrinks and hides the 19 non-corner pieces and blows the
//!   corners up to fill the cube,
//! - the mirror deformation scales each piece's mesh per axis band,
//! - the pyramorphix morph blends every mesh towards its morph target.
//!
//! Primitives always run inside a [`MorphSequence`], one after another with a
//! settle pause in between, and commit their shape flag only on completion.

use std::collections::VecDeque;

use glam::{Mat4, Vec3};
use log::{debug, info};

use crate::animation::lerp;
use crate::config::InitialShape;
use crate::engine::PuzzleEngine;
use crate::pieces::{slot_coord, Piece, CENTER_SLOTS, CORNER_SLOTS};

/// Target code of [`PuzzleEngine::morph`] that toggles the mirror cube.
pub const MIRROR_TARGET: u8 = 8;

const CENTER_SCALE: f32 = 0.8;
const CORNER_SCALE: f32 = 1.5;
const CORNER_SHIFT_IN: f32 = -0.5;
const CORNER_SHIFT_OUT: f32 = 0.75;

/// One step of a shape sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeStep {
    /// Scale to (`true`) or from (`false`) the 2x2 shape.
    TwoByTwo(bool),
    /// Morph to (`true`) or from (`false`) the pyramorphix.
    Pyra(bool),
    ToggleMirror,
    PyraColors,
    DefaultColors,
}

/// Steps leading from one combined shape code to another.
pub fn transition_path(from: u8, to: u8) -> Option<&'static [ShapeStep]> {
    use ShapeStep::*;
    Some(match (from, to) {
        (0, 1) | (2, 3) => &[TwoByTwo(true)],
        (1, 0) | (3, 2) => &[TwoByTwo(false)],
        (1, 3) | (0, 2) => &[Pyra(true), PyraColors],
        (3, 1) | (2, 0) => &[Pyra(false), DefaultColors],
        (0, 3) => &[TwoByTwo(true), Pyra(true), PyraColors],
        (3, 0) => &[Pyra(false), DefaultColors, TwoByTwo(false)],
        (0, MIRROR_TARGET) | (1, MIRROR_TARGET) => &[ToggleMirror],
        _ => return None,
    })
}

/// A shape sequence in progress.
#[derive(Clone, Debug, PartialEq)]
pub struct MorphSequence {
    current: Option<ShapeStep>,
    remaining: VecDeque<ShapeStep>,
    duration: f32,
    settle: f32,
}

impl MorphSequence {
    /// Step running or settling right now.
    pub fn current(&self) -> Option<ShapeStep> {
        self.current
    }

    /// Steps still to come after the current one.
    pub fn remaining(&self) -> impl Iterator<Item = ShapeStep> + '_ {
        self.remaining.iter().copied()
    }
}

/// Animation state of a running shape primitive.
#[derive(Clone, Debug)]
pub(crate) enum ShapeJob {
    /// Node matrices at the start, by home slot.
    TwoByTwo { forward: bool, starts: Vec<Mat4> },
    /// Mesh matrices at the start, by home slot.
    Mirror { forward: bool, starts: Vec<Mat4> },
    Pyra { forward: bool },
}

/// Extra size and shift direction of a mirror-cube band, or `None` for the
/// middle band.
fn mirror_band(axis: usize, coord: i32) -> Option<(f32, f32)> {
    match (axis, coord) {
        (0, -1) => Some((0.4, 1.0)),
        (0, 1) => Some((-0.4, -1.0)),
        (1, -1) => Some((-0.6, 1.0)),
        (1, 1) => Some((0.6, -1.0)),
        (2, -1) => Some((0.2, 1.0)),
        (2, 1) => Some((-0.2, -1.0)),
        _ => None,
    }
}

/// End scale and shift of a band; the shift keeps the inner face in place.
fn band_scale_and_shift(extra: f32, forward: bool, sign: f32) -> (f32, f32) {
    let scale = 1.0 + extra;
    if forward {
        (scale, (1.0 - scale) / 2.0 * sign)
    } else {
        (1.0 / scale, (1.0 - 1.0 / scale) / 2.0 * sign)
    }
}

impl ShapeJob {
    pub(crate) fn apply_frame(&self, pieces: &mut [Piece], t: f32) {
        match self {
            ShapeJob::TwoByTwo { forward, starts } => {
                let (center_to, corner_to, shift_to) = if *forward {
                    (CENTER_SCALE, CORNER_SCALE, CORNER_SHIFT_IN)
                } else {
                    (1.0 / CENTER_SCALE, 1.0 / CORNER_SCALE, CORNER_SHIFT_OUT)
                };
                let center = lerp(1.0, center_to, t);
                let corner = lerp(1.0, corner_to, t);
                let shift = lerp(0.0, shift_to, t) * 3f32.sqrt();
                for slot in CENTER_SLOTS {
                    pieces[slot].matrix = Mat4::from_scale(Vec3::splat(center)) * starts[slot];
                }
                for slot in CORNER_SLOTS {
                    let outward = starts[slot].w_axis.truncate().normalize_or_zero();
                    pieces[slot].matrix = Mat4::from_scale(Vec3::splat(corner))
                        * Mat4::from_translation(outward * shift)
                        * starts[slot];
                }
            }
            ShapeJob::Mirror { forward, starts } => {
                for (slot, piece) in pieces.iter_mut().enumerate() {
                    let (x, y, z) = slot_coord(slot);
                    let mut mesh = starts[slot];
                    for (axis, coord) in [x, y, z].into_iter().enumerate() {
                        let Some((extra, sign)) = mirror_band(axis, coord) else {
                            continue;
                        };
                        let (scale_to, shift_to) = band_scale_and_shift(extra, *forward, sign);
                        let mut scale = Vec3::ONE;
                        let mut shift = Vec3::ZERO;
                        scale[axis] = lerp(1.0, scale_to, t);
                        shift[axis] = lerp(0.0, shift_to, t);
                        mesh = Mat4::from_translation(shift) * Mat4::from_scale(scale) * mesh;
                    }
                    piece.mesh_matrix = mesh;
                }
            }
            ShapeJob::Pyra { forward } => {
                let weight = if *forward { t } else { 1.0 - t };
                for piece in pieces.iter_mut() {
                    piece.morph_weight = weight;
                }
            }
        }
    }
}

impl PuzzleEngine {
    /// Combined shape code of the committed flags.
    pub fn shape_code(&self) -> u8 {
        self.shape.code()
    }

    pub fn morph_sequence(&self) -> Option<&MorphSequence> {
        self.sequence.as_ref()
    }

    /// Moves to another combined shape (`0..=3`, or [`MIRROR_TARGET`]).
    ///
    /// Without a path from the current shape this does nothing.
    pub fn morph(&mut self, target: u8) {
        let from = self.shape.code();
        let Some(steps) = transition_path(from, target) else {
            debug!("no shape path from {from} to {target}");
            return;
        };
        info!("morph {from} -> {target}");
        self.run_sequence(steps, self.config.shape_duration, self.config.settle_delay);
    }

    /// Toggles the mirror cube deformation and palette.
    pub fn toggle_mirror(&mut self) {
        self.run_sequence(&[ShapeStep::ToggleMirror], self.config.shape_duration, 0.0);
    }

    pub fn scale_to_2x2(&mut self, forward: bool) {
        self.run_sequence(&[ShapeStep::TwoByTwo(forward)], self.config.shape_duration, 0.0);
    }

    pub fn scale_to_mirror(&mut self, forward: bool) {
        if forward != self.shape.is_mirror {
            self.toggle_mirror();
        }
    }

    pub fn morph_to_pyra(&mut self, forward: bool) {
        self.run_sequence(&[ShapeStep::Pyra(forward)], self.config.shape_duration, 0.0);
    }

    pub(crate) fn apply_initial_shape(&mut self, shape: InitialShape) {
        use ShapeStep::*;
        match shape {
            InitialShape::Cube => {}
            InitialShape::TwoByTwo => {
                self.run_sequence(&[TwoByTwo(true)], 0.0, 0.0);
            }
            InitialShape::Pyramorphix => {
                self.run_sequence(&[TwoByTwo(true), Pyra(true), PyraColors], 0.0, 0.0);
            }
            InitialShape::Mirror => {
                self.run_sequence(&[ToggleMirror], 0.0, 0.0);
            }
            InitialShape::MirrorGold => {
                self.colors.gold = true;
                self.run_sequence(&[ToggleMirror], self.config.shape_duration, 0.0);
            }
        }
    }

    /// Starts a sequence unless something is already moving.
    fn run_sequence(&mut self, steps: &[ShapeStep], duration: f32, settle: f32) -> bool {
        if self.is_busy() {
            debug!("shape change rejected: animation or sequence running");
            return false;
        }
        self.sequence = Some(MorphSequence {
            current: None,
            remaining: steps.iter().copied().collect(),
            duration,
            settle,
        });
        self.advance_sequence();
        true
    }

    /// Starts the next step, or ends the sequence after the last one.
    pub(crate) fn advance_sequence(&mut self) {
        let Some(sequence) = self.sequence.as_mut() else {
            return;
        };
        let Some(step) = sequence.remaining.pop_front() else {
            self.sequence = None;
            info!("shape sequence finished in state {}", self.shape.code());
            return;
        };
        sequence.current = Some(step);
        let (duration, settle) = (sequence.duration, sequence.settle);
        debug!("shape step {step:?}");

        match step {
            ShapeStep::TwoByTwo(forward) if forward != self.shape.is_2x2 => {
                let starts = self.pieces.iter().map(|p| p.matrix).collect();
                if !forward {
                    for slot in CENTER_SLOTS {
                        self.pieces[slot].visible = true;
                    }
                }
                self.start_shape_job(ShapeJob::TwoByTwo { forward, starts }, duration);
            }
            ShapeStep::Pyra(forward) if forward != self.shape.is_pyra => {
                self.start_shape_job(ShapeJob::Pyra { forward }, duration);
            }
            ShapeStep::ToggleMirror => {
                let starts = self.pieces.iter().map(|p| p.mesh_matrix).collect();
                let forward = !self.shape.is_mirror;
                self.start_shape_job(ShapeJob::Mirror { forward, starts }, duration);
            }
            ShapeStep::PyraColors => {
                self.set_pyra_colors();
                self.schedule_settle(settle);
            }
            ShapeStep::DefaultColors => {
                self.set_default_colors();
                self.schedule_settle(settle);
            }
            // already in the requested shape
            ShapeStep::TwoByTwo(_) | ShapeStep::Pyra(_) => self.schedule_settle(settle),
        }
    }

    /// Commits a finished primitive and starts its settle pause.
    pub(crate) fn finish_shape_job(&mut self, job: ShapeJob) {
        match job {
            ShapeJob::TwoByTwo { forward, .. } => {
                if forward {
                    for slot in CENTER_SLOTS {
                        self.pieces[slot].visible = false;
                    }
                }
                self.shape.is_2x2 = forward;
            }
            ShapeJob::Mirror { forward, .. } => {
                self.shape.is_mirror = forward;
                self.colors.mirror = forward;
                self.repaint();
            }
            ShapeJob::Pyra { forward } => self.shape.is_pyra = forward,
        }
        let settle = self.sequence.as_ref().map_or(0.0, |s| s.settle);
        self.schedule_settle(settle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::Material;
    use crate::config::EngineConfig;
    use crate::moves::OUTER_LETTERS;
    use crate::pieces::NUM_PIECES;

    fn engine() -> PuzzleEngine {
        PuzzleEngine::new(EngineConfig { seed: Some(3), ..EngineConfig::default() })
    }

    fn matrices(engine: &PuzzleEngine) -> Vec<Mat4> {
        engine.pieces().iter().map(|p| p.matrix).collect()
    }

    #[test]
    fn test_two_by_two_round_trip() {
        let mut engine = engine();
        engine.submit_move("r");
        engine.run_until_idle();
        let before = matrices(&engine);

        engine.scale_to_2x2(true);
        engine.run_until_idle();
        assert!(engine.shape().is_2x2);
        assert!(CENTER_SLOTS.iter().all(|&s| !engine.pieces()[s].visible));
        let corner = engine.pieces()[26].position();
        assert!(corner.abs().abs_diff_eq(Vec3::splat(0.75), 1e-5), "corner at {corner:?}");

        engine.scale_to_2x2(false);
        engine.run_until_idle();
        assert!(!engine.shape().is_2x2);
        assert!(engine.pieces().iter().all(|p| p.visible));
        for (slot, (a, b)) in before.iter().zip(matrices(&engine)).enumerate() {
            assert!(a.abs_diff_eq(b, 1e-5), "slot {slot} matrix drifted");
        }
    }

    #[test]
    fn test_two_by_two_when_already_there_only_settles() {
        let mut engine = engine();
        engine.scale_to_2x2(false);
        assert!(!engine.is_animating());
        engine.run_until_idle();
        assert!(engine.morph_sequence().is_none());
        assert!(engine.pieces().iter().all(|p| p.visible));
    }

    #[test]
    fn test_mirror_round_trip() {
        let mut engine = engine();
        engine.toggle_mirror();
        engine.run_until_idle();
        assert!(engine.shape().is_mirror);
        let left = engine.pieces()[12].mesh_matrix;
        assert!((left.x_axis.x - 1.4).abs() < 1e-5);
        assert!((left.w_axis.x + 0.2).abs() < 1e-5);
        let top_front = engine.pieces()[25].mesh_matrix;
        assert!((top_front.y_axis.y - 1.6).abs() < 1e-5);
        assert!((top_front.z_axis.z - 0.8).abs() < 1e-5);
        assert!(engine.pieces()[13].mesh_matrix.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        assert_eq!(engine.pieces()[26].materials[0], Material::Silver);

        engine.toggle_mirror();
        engine.run_until_idle();
        assert!(!engine.shape().is_mirror);
        for piece in engine.pieces() {
            assert!(piece.mesh_matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5), "piece {}", piece.id());
        }
        assert_eq!(engine.pieces()[26].materials[0], Material::Red);
    }

    #[test]
    fn test_morph_to_two_by_two_only_scales() {
        let mut engine = engine();
        engine.morph(1);
        assert_eq!(engine.morph_sequence().unwrap().current(), Some(ShapeStep::TwoByTwo(true)));
        assert_eq!(engine.morph_sequence().unwrap().remaining().count(), 0);
        engine.run_until_idle();
        assert_eq!(engine.shape_code(), 1);
        assert!(engine.pieces().iter().all(|p| p.morph_weight == 0.0));
    }

    #[test]
    fn test_morph_to_pyramorphix_runs_steps_in_order() {
        let mut engine = engine();
        engine.morph(3);
        let current = |e: &PuzzleEngine| e.morph_sequence().and_then(|s| s.current());

        assert_eq!(current(&engine), Some(ShapeStep::TwoByTwo(true)));
        assert!(engine.is_animating());

        // 2x2 done, settling; the morph has not started yet
        engine.tick(0.5);
        assert!(engine.shape().is_2x2 && !engine.shape().is_pyra);
        assert!(!engine.is_animating());
        assert!(engine.pieces().iter().all(|p| p.morph_weight == 0.0));
        assert_eq!(current(&engine), Some(ShapeStep::TwoByTwo(true)));

        engine.tick(0.5);
        assert_eq!(current(&engine), Some(ShapeStep::Pyra(true)));
        assert!(engine.is_animating());

        engine.tick(0.5);
        assert!(engine.shape().is_pyra);
        assert!(!engine.color_scheme().pyra, "colors wait for the settle pause");

        engine.tick(0.5);
        assert_eq!(current(&engine), Some(ShapeStep::PyraColors));
        assert!(engine.color_scheme().pyra);

        engine.tick(0.5);
        assert!(engine.morph_sequence().is_none());
        assert_eq!(engine.shape_code(), 3);
        assert!(engine.pieces().iter().all(|p| p.morph_weight == 1.0));
        assert!(engine.is_idle());
    }

    #[test]
    fn test_pyramorphix_back_to_cube() {
        let mut engine = PuzzleEngine::new(EngineConfig {
            initial_shape: InitialShape::Pyramorphix,
            ..EngineConfig::default()
        });
        assert_eq!(engine.shape_code(), 3);
        assert!(engine.is_idle(), "initial shapes apply instantly");
        assert!(engine.color_scheme().pyra);

        engine.morph(0);
        engine.run_until_idle();
        assert_eq!(engine.shape_code(), 0);
        assert!(!engine.color_scheme().pyra);
        assert!(engine.pieces().iter().all(|p| p.visible && p.morph_weight == 0.0));
        for piece in engine.pieces() {
            assert!(piece.matrix.abs_diff_eq(Piece::new(piece.id()).matrix, 1e-5));
        }
    }

    #[test]
    fn test_morph_without_path_is_ignored() {
        let mut engine = engine();
        engine.morph(0);
        engine.morph(7);
        assert!(engine.morph_sequence().is_none());
        assert!(engine.is_idle());

        engine.morph(1);
        engine.run_until_idle();
        engine.morph(2);
        assert!(engine.morph_sequence().is_none(), "no path from 1 to 2");
    }

    #[test]
    fn test_morph_rejected_while_busy() {
        let mut engine = engine();
        engine.submit_move("l");
        engine.morph(1);
        assert!(engine.morph_sequence().is_none());
        engine.run_until_idle();

        engine.morph(1);
        engine.tick(0.5);
        // settling still blocks another shape change
        engine.morph(0);
        engine.run_until_idle();
        assert_eq!(engine.shape_code(), 1);
    }

    /// Every piece sits in the cell the model puts it in, at unit scale.
    fn assert_settled_cube(engine: &PuzzleEngine) {
        for slot in 0..NUM_PIECES {
            let id = engine.model().at(slot);
            let piece = engine.piece(id);
            assert_eq!(piece.lattice_position(), slot_coord(slot), "piece {id} away from slot {slot}");
            let (scale, _, _) = piece.matrix.to_scale_rotation_translation();
            assert!(scale.abs_diff_eq(Vec3::ONE, 1e-4), "piece {id} scaled by {scale:?}");
        }
    }

    #[test]
    fn test_moves_wait_for_settle_pause() {
        let mut engine = PuzzleEngine::new(EngineConfig {
            initial_shape: InitialShape::Pyramorphix,
            seed: Some(3),
            ..EngineConfig::default()
        });
        engine.morph(0);
        engine.tick(0.5);
        engine.tick(0.5);
        engine.tick(0.25);
        assert!(!engine.is_animating(), "between two steps");
        assert!(engine.is_busy());

        engine.submit_move("r");
        engine.undo();
        engine.redo();
        engine.shuffle(2);
        assert!(engine.history().is_empty());
        assert!(engine.pending().is_empty());

        engine.run_until_idle();
        assert_eq!(engine.shape_code(), 0);
        assert!(engine.model().is_solved());
        assert_settled_cube(&engine);

        engine.submit_move("r");
        engine.run_until_idle();
        assert_eq!(engine.history().len(), 1, "moves play again once the sequence is over");
        assert_settled_cube(&engine);
    }

    #[test]
    fn test_queued_moves_resume_after_sequence() {
        let mut engine = engine();
        engine.shuffle(3);
        engine.tick(0.5);
        assert!(!engine.is_animating());
        assert_eq!(engine.pending().len(), 2);

        // starts during the queue delay, which then has to wait for it
        engine.morph(1);
        assert!(engine.morph_sequence().is_some());
        engine.run_until_idle();
        assert_eq!(engine.shape_code(), 1);
        assert_eq!(engine.history().len(), 3);
        assert!(engine.pending().is_empty());

        engine.morph(0);
        engine.run_until_idle();
        assert_eq!(engine.shape_code(), 0);
        assert_settled_cube(&engine);
    }

    #[test]
    fn test_pyramorphix_faces_are_flat() {
        let engine = PuzzleEngine::new(EngineConfig {
            initial_shape: InitialShape::Pyramorphix,
            ..EngineConfig::default()
        });
        let colors = [Material::Red, Material::Blue, Material::Yellow, Material::Green];
        let mut planes = Vec::new();
        for material in colors {
            let mut plane: Option<(Vec3, f32)> = None;
            let mut count = 0;
            for piece in engine.pieces().iter().filter(|p| p.visible) {
                let to_root = piece.mesh_to_root();
                for (t, _) in piece.materials.iter().enumerate().filter(|(_, m)| **m == material) {
                    let [a, b, c] = piece
                        .geometry()
                        .triangle_at(t, piece.morph_weight)
                        .map(|p| to_root.transform_point3(p));
                    let n = (b - a).cross(c - a);
                    if n.length() < 1e-6 {
                        continue;
                    }
                    let n = n.normalize();
                    let (normal, offset) = *plane.get_or_insert((n, n.dot(a)));
                    assert!(
                        n.dot(normal) > 0.999,
                        "{material} triangle {t} of piece {} faces {n:?}, not {normal:?}",
                        piece.id()
                    );
                    for p in [a, b, c] {
                        assert!((normal.dot(p) - offset).abs() < 0.02, "{material} piece {} off plane", piece.id());
                    }
                    count += 1;
                }
            }
            assert!(count >= 4, "{material} has only {count} triangles");
            let (normal, _) = plane.unwrap();
            assert!(normal.abs().abs_diff_eq(Vec3::splat(1.0 / 3f32.sqrt()), 1e-2), "{material} {normal:?}");
            planes.push(normal);
        }
        // four different faces of one tetrahedron
        for i in 0..planes.len() {
            for j in i + 1..planes.len() {
                assert!(planes[i].dot(planes[j]) < -0.3, "{:?} and {:?}", colors[i], colors[j]);
            }
        }
    }

    #[test]
    fn test_mirror_target_and_initial_gold() {
        let mut engine = engine();
        engine.morph(MIRROR_TARGET);
        engine.run_until_idle();
        assert!(engine.shape().is_mirror);

        let mut gold = PuzzleEngine::new(EngineConfig {
            initial_shape: InitialShape::MirrorGold,
            ..EngineConfig::default()
        });
        assert!(gold.is_animating(), "gold mirror animates in");
        gold.run_until_idle();
        assert!(gold.shape().is_mirror);
        let gold_triangles = gold
            .pieces()
            .iter()
            .flat_map(|p| p.materials.iter())
            .filter(|m| **m == Material::Gold)
            .count();
        assert_eq!(gold_triangles, 108);
    }

    #[test]
    fn test_shuffle_in_two_by_two_uses_outer_slices() {
        let mut engine = PuzzleEngine::new(EngineConfig {
            initial_shape: InitialShape::TwoByTwo,
            seed: Some(11),
            ..EngineConfig::default()
        });
        engine.shuffle(30);
        engine.run_until_idle();
        assert_eq!(engine.history().len(), 30);
        assert!(engine.history().iter().all(|m| OUTER_LETTERS.contains(&m.letter)));
        // hidden centers stay hidden while the corners turn
        let visible = engine.pieces().iter().filter(|p| p.visible).count();
        assert_eq!(visible, NUM_PIECES - CENTER_SLOTS.len());
    }

    #[test]
    fn test_transition_table() {
        assert_eq!(transition_path(0, 1), Some(&[ShapeStep::TwoByTwo(true)][..]));
        assert_eq!(
            transition_path(3, 0),
            Some(
                &[
                    ShapeStep::Pyra(false),
                    ShapeStep::DefaultColors,
                    ShapeStep::TwoByTwo(false)
                ][..]
            )
        );
        assert_eq!(transition_path(2, 1), None);
        assert_eq!(transition_path(3, MIRROR_TARGET), None);
    }
}
