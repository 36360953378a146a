//! The puzzle engine: one context object that owns every piece, the
//! permutation model, the move history and all running animations.
//!
//! The engine is either idle or animating. Animating means the run counter
//! (one per piece turn, shape primitive or view change in flight) is above
//! zero; moves, undo and redo are rejected until it returns to zero. Time only
//! moves forward through [`PuzzleEngine::tick`], which advances every job,
//! rebuilds the affected transforms from their captured start matrices and
//! then completes finished jobs in an explicit loop.

use std::collections::VecDeque;

use glam::{EulerRot, Mat4, Quat};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::animation::Tween;
use crate::colors::ColorScheme;
use crate::config::EngineConfig;
use crate::gesture::Drag;
use crate::model::PuzzleModel;
use crate::moves::{Axis, Move, OUTER_LETTERS, SLICE_LETTERS};
use crate::morph::{MorphSequence, ShapeJob};
use crate::pieces::{Piece, PieceId, NUM_PIECES};

/// Committed shape flags. They change only when a shape primitive completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShapeFlags {
    pub is_2x2: bool,
    pub is_pyra: bool,
    pub is_mirror: bool,
}

impl ShapeFlags {
    /// Combined shape code: `0` 3x3, `1` 2x2, `2` pyramorphix with 3x3
    /// proportions, `3` pyramorphix.
    pub fn code(&self) -> u8 {
        self.is_2x2 as u8 + 2 * self.is_pyra as u8
    }
}

/// View presets `(x, y)` in degrees, indexed by `right + 2 * up`.
const VIEW_PRESETS: [(f32, f32); 6] = [
    (-40.0, 30.0),
    (-40.0, -30.0),
    (30.0, 30.0),
    (30.0, -30.0),
    (130.0, 30.0),
    (130.0, -30.0),
];

/// Tumble speed in radians per 60 Hz frame on each Euler axis.
const TUMBLE_STEP: f32 = 0.01;

/// Orientation of the puzzle root in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub rotation: Quat,
    pub right: bool,
    /// `0` from under, `1` from the front, `2` from the back.
    pub up: u8,
    pub tumble: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        let mut view = Self { rotation: Quat::IDENTITY, right: true, up: 1, tumble: false };
        view.rotation = view.preset();
        view
    }
}

impl ViewState {
    pub fn preset(&self) -> Quat {
        let (x, y) = VIEW_PRESETS[self.right as usize + 2 * self.up as usize];
        Quat::from_euler(EulerRot::XYZ, x.to_radians(), y.to_radians(), 0.0)
    }

    fn tumble_step(&mut self, dt: f32) {
        let step = TUMBLE_STEP * dt * 60.0;
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        self.rotation = Quat::from_euler(EulerRot::XYZ, x + step, y + step, z + step);
    }
}

/// A scheduled piece of work driven by [`PuzzleEngine::tick`].
#[derive(Clone, Debug)]
pub(crate) enum Job {
    /// One piece turning with a move.
    Turn {
        piece: PieceId,
        axis: Axis,
        degrees: f32,
        start: Mat4,
        tween: Tween,
    },
    Shape { job: ShapeJob, tween: Tween },
    View { from: Quat, to: Quat, tween: Tween },
    /// Pause before the next queued move.
    QueueDelay { tween: Tween },
    /// Pause after a shape sequence step.
    Settle { tween: Tween },
}

impl Job {
    fn tween(&self) -> &Tween {
        match self {
            Job::Turn { tween, .. }
            | Job::Shape { tween, .. }
            | Job::View { tween, .. }
            | Job::QueueDelay { tween }
            | Job::Settle { tween } => tween,
        }
    }

    fn tween_mut(&mut self) -> &mut Tween {
        match self {
            Job::Turn { tween, .. }
            | Job::Shape { tween, .. }
            | Job::View { tween, .. }
            | Job::QueueDelay { tween }
            | Job::Settle { tween } => tween,
        }
    }

    /// Whether the job holds the run counter.
    fn is_counted(&self) -> bool {
        matches!(self, Job::Turn { .. } | Job::Shape { .. } | Job::View { .. })
    }

    /// Rebuilds the transforms this job drives for its current progress.
    fn apply_frame(&self, pieces: &mut [Piece], view: &mut ViewState) {
        let t = self.tween().progress();
        match self {
            Job::Turn { piece, axis, degrees, start, .. } => {
                pieces[piece.home_slot()].matrix = axis.rotation(degrees * t) * *start;
            }
            Job::Shape { job, .. } => job.apply_frame(pieces, t),
            Job::View { from, to, .. } => view.rotation = from.slerp(*to, t),
            Job::QueueDelay { .. } | Job::Settle { .. } => {}
        }
    }
}

/// Owner of the complete puzzle state.
pub struct PuzzleEngine {
    pub(crate) config: EngineConfig,
    /// Indexed by home slot.
    pub(crate) pieces: Vec<Piece>,
    pub(crate) model: PuzzleModel,
    pub(crate) history: Vec<Move>,
    /// Number of history entries currently applied.
    pub(crate) applied: usize,
    pub(crate) pending: VecDeque<Move>,
    pub(crate) jobs: Vec<Job>,
    pub(crate) num_anims: usize,
    pub(crate) hide_next: bool,
    pub(crate) shape: ShapeFlags,
    pub(crate) colors: ColorScheme,
    pub(crate) sequence: Option<MorphSequence>,
    pub(crate) view: ViewState,
    pub(crate) labels_shown: bool,
    pub(crate) labels_inverted: bool,
    pub(crate) show_one: bool,
    pub(crate) inspect_slot: usize,
    pub(crate) drag: Option<Drag>,
    rng: StdRng,
}

fn build_pieces() -> Vec<Piece> {
    PieceId::all().map(Piece::new).collect()
}

impl PuzzleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = config.seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let mut engine = Self {
            pieces: build_pieces(),
            model: PuzzleModel::new(),
            history: Vec::new(),
            applied: 0,
            pending: VecDeque::new(),
            jobs: Vec::new(),
            num_anims: 0,
            hide_next: false,
            shape: ShapeFlags::default(),
            colors: ColorScheme::default(),
            sequence: None,
            view: ViewState::default(),
            labels_shown: false,
            labels_inverted: false,
            show_one: false,
            inspect_slot: NUM_PIECES - 1,
            drag: None,
            rng,
            config,
        };
        engine.repaint();
        engine.apply_initial_shape(engine.config.initial_shape);
        engine.tick(0.0);
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// All pieces, indexed by home slot.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.home_slot()]
    }

    pub fn model(&self) -> &PuzzleModel {
        &self.model
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Index of the last applied history entry, `None` before the first.
    pub fn history_index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn pending(&self) -> &VecDeque<Move> {
        &self.pending
    }

    /// Run counter: animations in flight that block moves.
    pub fn running_animations(&self) -> usize {
        self.num_anims
    }

    pub fn is_animating(&self) -> bool {
        self.num_anims > 0
    }

    /// Animating, or inside a shape sequence (settle pauses included).
    pub fn is_busy(&self) -> bool {
        self.is_animating() || self.sequence.is_some()
    }

    /// Nothing scheduled at all: no animation, delay or sequence step.
    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn shape(&self) -> ShapeFlags {
        self.shape
    }

    pub fn color_scheme(&self) -> &ColorScheme {
        &self.colors
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Transform from the puzzle root to the world.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.view.rotation)
    }

    pub fn is_hide_next_pending(&self) -> bool {
        self.hide_next
    }

    /// Parses and plays a move, recording it in the history.
    ///
    /// Invalid tokens are logged and ignored.
    pub fn submit_move(&mut self, token: &str) {
        match token.parse::<Move>() {
            Ok(mv) => self.submit(mv),
            Err(err) => debug!("ignoring move {token:?}: {err}"),
        }
    }

    /// Plays a move, recording it in the history.
    pub fn submit(&mut self, mv: Move) {
        self.rotate(mv, true);
    }

    /// Applies a move to the model and starts its turn animation.
    ///
    /// Returns `false` if the move was rejected.
    pub(crate) fn rotate(&mut self, mv: Move, record: bool) -> bool {
        if self.is_busy() {
            debug!("move {mv} rejected: animation or shape change running");
            return false;
        }

        if self.hide_next {
            self.hide_next = false;
            for &slot in mv.descriptor().slots {
                let piece = &mut self.pieces[self.model.at(slot).home_slot()];
                piece.visible = !piece.visible;
            }
            debug!("move {mv} toggled visibility instead of turning");
            return true;
        }

        if record {
            self.history.truncate(self.applied);
            self.history.push(mv);
            self.applied += 1;
        }

        let degrees = mv.angle();
        let axis = mv.descriptor().axis;
        for slot in self.model.apply(&mv) {
            let piece = self.model.at(slot);
            self.jobs.push(Job::Turn {
                piece,
                axis,
                degrees,
                start: self.pieces[piece.home_slot()].matrix,
                tween: Tween::new(self.config.turn_duration, self.config.easing),
            });
            self.num_anims += 1;
        }
        true
    }

    /// Reverts the last applied history entry.
    pub fn undo(&mut self) {
        if self.is_busy() || self.hide_next {
            debug!("undo rejected: busy or hide-next pending");
            return;
        }
        let Some(index) = self.history_index() else {
            debug!("undo rejected: nothing to undo");
            return;
        };
        let mv = self.history[index];
        self.applied -= 1;
        self.rotate(mv.inverse(), false);
    }

    /// Re-applies the next history entry.
    pub fn redo(&mut self) {
        if self.is_busy() || self.hide_next {
            debug!("redo rejected: busy or hide-next pending");
            return;
        }
        let Some(&mv) = self.history.get(self.applied) else {
            debug!("redo rejected: nothing to redo");
            return;
        };
        self.applied += 1;
        self.rotate(mv, false);
    }

    /// Queues `n` random moves and starts playing them one after another.
    ///
    /// Only outer slices are used in 2x2 mode.
    pub fn shuffle(&mut self, n: usize) {
        if self.is_busy() || n == 0 {
            debug!("shuffle({n}) rejected");
            return;
        }
        let letters: &[_] = if self.shape.is_2x2 { &OUTER_LETTERS } else { &SLICE_LETTERS };
        for _ in 0..n {
            let letter = letters[self.rng.random_range(0..letters.len())];
            let mv = Move::new(letter, self.rng.random_bool(0.5));
            self.pending.push_back(mv);
        }
        debug!("queued {n} shuffle moves");
        self.play_next_queued();
    }

    /// Diverts the next move into toggling the visibility of its slice.
    pub fn hide_next(&mut self) {
        self.hide_next = true;
    }

    fn play_next_queued(&mut self) {
        if self.is_busy() {
            // retried once the counter returns to zero and no sequence runs
            return;
        }
        let Some(mv) = self.pending.pop_front() else {
            return;
        };
        self.rotate(mv, true);
        if !self.is_busy() {
            self.schedule_queue_delay();
        }
    }

    fn schedule_queue_delay(&mut self) {
        let scheduled = self.jobs.iter().any(|job| matches!(job, Job::QueueDelay { .. }));
        if !self.pending.is_empty() && !scheduled {
            self.jobs.push(Job::QueueDelay { tween: Tween::delay(self.config.queue_delay) });
        }
    }

    pub(crate) fn schedule_settle(&mut self, duration: f32) {
        self.jobs.push(Job::Settle { tween: Tween::delay(duration) });
    }

    pub(crate) fn start_shape_job(&mut self, job: ShapeJob, duration: f32) {
        self.num_anims += 1;
        self.jobs.push(Job::Shape { job, tween: Tween::new(duration, self.config.easing) });
    }

    /// Advances all animations by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if self.view.tumble {
            self.view.tumble_step(dt);
        }
        for job in self.jobs.iter_mut() {
            job.tween_mut().advance(dt);
            job.apply_frame(&mut self.pieces, &mut self.view);
        }
        loop {
            let (finished, running): (Vec<Job>, Vec<Job>) = std::mem::take(&mut self.jobs)
                .into_iter()
                .partition(|job| job.tween().is_finished());
            self.jobs = running;
            if finished.is_empty() {
                break;
            }
            for job in finished {
                self.complete(job);
            }
        }
    }

    fn complete(&mut self, job: Job) {
        job.apply_frame(&mut self.pieces, &mut self.view);
        let counted = job.is_counted();
        let settled = matches!(job, Job::Settle { .. });
        if counted {
            self.num_anims = self.num_anims.saturating_sub(1);
        }
        match job {
            Job::Turn { .. } | Job::View { .. } => {}
            Job::Shape { job, .. } => self.finish_shape_job(job),
            Job::QueueDelay { .. } => self.play_next_queued(),
            Job::Settle { .. } => self.advance_sequence(),
        }
        if (counted || settled) && !self.is_busy() {
            self.schedule_queue_delay();
        }
    }

    /// Ticks at 60 Hz until nothing is scheduled any more.
    pub fn run_until_idle(&mut self) {
        const STEP: f32 = 1.0 / 60.0;
        const MAX_STEPS: usize = 1_000_000;
        for _ in 0..MAX_STEPS {
            if self.is_idle() {
                return;
            }
            self.tick(STEP);
        }
        warn!("engine still busy after {MAX_STEPS} steps");
    }

    /// Discards every piece and all state, and rebuilds a plain cube.
    ///
    /// The color mask, gold and wireframe settings and the view survive.
    pub fn reset(&mut self) {
        info!("reset");
        self.pieces = build_pieces();
        self.model = PuzzleModel::new();
        self.history.clear();
        self.applied = 0;
        self.pending.clear();
        self.jobs.clear();
        self.num_anims = 0;
        self.hide_next = false;
        self.shape = ShapeFlags::default();
        self.colors.pyra = false;
        self.colors.mirror = false;
        self.sequence = None;
        self.drag = None;
        self.apply_visibility();
        self.repaint();
    }

    /// Repaints every piece from the color flags.
    pub(crate) fn repaint(&mut self) {
        self.colors.apply(&mut self.pieces, self.model.slots());
    }

    pub fn set_pyra_colors(&mut self) {
        self.colors.pyra = true;
        self.repaint();
    }

    pub fn set_default_colors(&mut self) {
        self.colors.pyra = false;
        self.repaint();
    }

    /// Switches the mirror palette between silver and gold.
    pub fn toggle_gold(&mut self) {
        self.colors.gold = !self.colors.gold;
        self.repaint();
    }

    pub fn toggle_wireframe(&mut self) {
        self.colors.wireframe = !self.colors.wireframe;
        self.repaint();
    }

    pub fn next_color_mask(&mut self) {
        self.colors.mask = self.colors.mask.next();
        self.set_default_colors();
    }

    pub fn previous_color_mask(&mut self) {
        self.colors.mask = self.colors.mask.previous();
        self.set_default_colors();
    }

    pub fn show_all(&mut self, visible: bool) {
        for piece in self.pieces.iter_mut() {
            piece.visible = visible;
        }
    }

    /// Switches between showing every piece and only the inspected one.
    pub fn toggle_show_one(&mut self) {
        self.show_one = !self.show_one;
        self.apply_visibility();
    }

    /// Shows only the piece whose home slot is `slot`.
    pub fn show_only(&mut self, slot: usize) {
        self.inspect_slot = slot.min(NUM_PIECES - 1);
        self.show_one = true;
        self.apply_visibility();
    }

    pub fn show_next_piece(&mut self) {
        self.show_only(self.inspect_slot + 1);
    }

    pub fn show_previous_piece(&mut self) {
        self.show_only(self.inspect_slot.saturating_sub(1));
    }

    fn apply_visibility(&mut self) {
        for (slot, piece) in self.pieces.iter_mut().enumerate() {
            piece.visible = !self.show_one || slot == self.inspect_slot;
        }
    }

    /// Jumps back to the default view and stops tumbling.
    pub fn reset_view(&mut self) {
        self.view = ViewState::default();
        self.jobs.retain(|job| !matches!(job, Job::View { .. }));
        self.num_anims = self.jobs.iter().filter(|job| job.is_counted()).count();
    }

    pub fn toggle_view_right(&mut self) {
        self.view.right = !self.view.right;
        self.animate_view();
    }

    pub fn toggle_view_back(&mut self) {
        self.view.up = if self.view.up == 1 { 2 } else { 1 };
        self.animate_view();
    }

    pub fn toggle_view_under(&mut self) {
        self.view.up = if self.view.up == 1 { 0 } else { 1 };
        self.animate_view();
    }

    pub fn toggle_tumble(&mut self) {
        self.view.tumble = !self.view.tumble;
    }

    /// Rotates the view freely, in world space (radians).
    pub fn orbit_view(&mut self, yaw: f32, pitch: f32) {
        self.view.rotation =
            (Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch) * self.view.rotation).normalize();
    }

    fn animate_view(&mut self) {
        let from = self.view.rotation;
        let to = self.view.preset();
        let tween = Tween::new(self.config.view_duration, self.config.easing);
        // retarget a running view change instead of stacking another
        for job in self.jobs.iter_mut() {
            if let Job::View { .. } = job {
                *job = Job::View { from, to, tween };
                return;
            }
        }
        self.num_anims += 1;
        self.jobs.push(Job::View { from, to, tween });
    }
}
