//! Interactive 3D viewer using kiss3d.
//!
//! Every piece is drawn as a dark body cube with one small colored cube per
//! sticker, placed from the engine's piece transforms each frame.

use kiss3d::prelude::*;

use cubemorph::colors::Material;
use cubemorph::geometry::Face;
use cubemorph::pieces::Piece;
use cubemorph::{EngineConfig, PuzzleEngine};

/// Size of the body cube drawn for each piece.
const BODY_SIZE: f32 = 0.9;
/// Size of a sticker cube.
const STICKER_SIZE: f32 = 0.3;
/// Simulated time per rendered frame.
const FRAME_TIME: f32 = 1.0 / 60.0;

fn scene_color(material: Material) -> Color {
    let [r, g, b] = material.rgb();
    Color::new(r, g, b, 1.0)
}

fn scene_vec(v: glam::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Scene nodes of one piece.
struct RenderedPiece {
    body: SceneNode3d,
    stickers: Vec<(Face, SceneNode3d)>,
    slot: usize,
}

/// Size of the marker cube drawn for a rotation label.
const LABEL_SIZE: f32 = 0.25;

/// Everything that forces the nodes to be rebuilt when it changes.
type SceneKey = (Vec<(bool, [Material; 12])>, bool);

fn scene_key(engine: &PuzzleEngine) -> SceneKey {
    let pieces = engine.pieces().iter().map(|p| (p.visible, p.materials)).collect();
    (pieces, engine.labels_shown())
}

/// Marker nodes for the rotation labels.
fn build_labels(scene: &mut SceneNode3d, engine: &PuzzleEngine) -> Vec<SceneNode3d> {
    let view = engine.view_matrix();
    engine
        .rotation_labels()
        .iter()
        .map(|label| {
            scene
                .add_cube(LABEL_SIZE, LABEL_SIZE, LABEL_SIZE)
                .set_color(Color::new(0.12, 0.12, 1.0, 0.8))
                .set_position(scene_vec(view.transform_point3(label.position)))
        })
        .collect()
}

fn build_scene(scene: &mut SceneNode3d, engine: &PuzzleEngine) -> Vec<RenderedPiece> {
    let view = engine.view_matrix();
    let mut rendered = Vec::new();
    for (slot, piece) in engine.pieces().iter().enumerate() {
        if !piece.visible {
            continue;
        }
        let to_world = view * piece.mesh_to_root();
        let body = scene
            .add_cube(BODY_SIZE, BODY_SIZE, BODY_SIZE)
            .set_color(scene_color(Material::Black))
            .set_position(scene_vec(to_world.transform_point3(glam::Vec3::ZERO)));
        let stickers = Face::ALL
            .into_iter()
            .filter_map(|face| {
                let material = piece.materials[face.triangles()[0]];
                (material != Material::Black).then(|| {
                    let node = scene
                        .add_cube(STICKER_SIZE, STICKER_SIZE, STICKER_SIZE)
                        .set_color(scene_color(material))
                        .set_position(scene_vec(to_world.transform_point3(face_center(piece, face))));
                    (face, node)
                })
            })
            .collect();
        rendered.push(RenderedPiece { body, stickers, slot });
    }
    rendered
}

/// Center of a face's two triangles, in mesh space.
fn face_center(piece: &Piece, face: Face) -> glam::Vec3 {
    let sum: glam::Vec3 = face
        .triangles()
        .into_iter()
        .flat_map(|t| piece.geometry().triangle_at(t, piece.morph_weight))
        .sum();
    sum / 6.0
}

fn place_scene(rendered: &mut [RenderedPiece], engine: &PuzzleEngine) {
    let view = engine.view_matrix();
    for part in rendered.iter_mut() {
        let piece = &engine.pieces()[part.slot];
        let to_world = view * piece.mesh_to_root();
        part.body.set_position(scene_vec(to_world.transform_point3(glam::Vec3::ZERO)));
        for (face, node) in part.stickers.iter_mut() {
            node.set_position(scene_vec(to_world.transform_point3(face_center(piece, *face))));
        }
    }
}

fn place_labels(labels: &mut [SceneNode3d], engine: &PuzzleEngine) {
    let view = engine.view_matrix();
    for (node, label) in labels.iter_mut().zip(engine.rotation_labels()) {
        node.set_position(scene_vec(view.transform_point3(label.position)));
    }
}

fn clear_scene(rendered: &mut Vec<RenderedPiece>) {
    for mut part in rendered.drain(..) {
        part.body.remove();
        for (_, mut node) in part.stickers.drain(..) {
            node.remove();
        }
    }
}

fn title(engine: &PuzzleEngine) -> String {
    let shape = match (engine.shape().is_mirror, engine.shape_code()) {
        (true, _) => "mirror cube",
        (false, 1) => "2x2",
        (false, 2) => "pyramorphix (3x3)",
        (false, 3) => "pyramorphix",
        _ => "3x3",
    };
    format!("Cubemorph - {} - {} moves", shape, engine.history().len())
}

/// Maps a key press onto the engine.
fn handle_key(engine: &mut PuzzleEngine, key: kiss3d::event::Key, shift: bool, alt: bool) {
    use kiss3d::event::Key;
    let letter = match key {
        Key::L => Some('l'),
        Key::M => Some('m'),
        Key::R => Some('r'),
        Key::U => Some('u'),
        Key::E => Some('e'),
        Key::D => Some('d'),
        Key::B => Some('b'),
        Key::S => Some('s'),
        Key::F => Some('f'),
        Key::X => Some('x'),
        Key::Y => Some('y'),
        Key::Z => Some('z'),
        _ => None,
    };
    if let Some(letter) = letter {
        let mut token = if shift { letter.to_ascii_uppercase().to_string() } else { letter.to_string() };
        if alt {
            token.push('!');
        }
        engine.submit_move(&token);
        return;
    }

    match key {
        Key::F1 => engine.help(),
        Key::F2 => engine.morph(0),
        Key::F3 => engine.morph(1),
        Key::F4 => engine.morph(3),
        Key::F5 => engine.morph(2),
        Key::F6 => engine.set_pyra_colors(),
        Key::F7 => engine.set_default_colors(),
        Key::F8 => engine.toggle_mirror(),
        Key::F9 => engine.shuffle(engine.config().shuffle_moves),
        Key::F10 => engine.reset(),
        Key::Key0 => engine.reset_view(),
        Key::Key1 => engine.toggle_view_right(),
        Key::Key2 => engine.toggle_view_back(),
        Key::Key3 => engine.toggle_view_under(),
        Key::Key5 => engine.toggle_show_one(),
        Key::Key6 => engine.show_all(true),
        Key::Key8 => engine.redo(),
        Key::Key9 => engine.undo(),
        Key::T => engine.toggle_tumble(),
        Key::W => engine.toggle_wireframe(),
        Key::G => engine.toggle_gold(),
        Key::I => engine.hide_next(),
        Key::Up => engine.next_color_mask(),
        Key::Down => engine.previous_color_mask(),
        Key::Right => engine.show_next_piece(),
        Key::Left => engine.show_previous_piece(),
        _ => {}
    }
}

/// Opens the viewer and runs until the window closes.
pub fn display(config: EngineConfig) {
    pollster::block_on(display_async(config));
}

async fn display_async(config: EngineConfig) {
    let mut engine = PuzzleEngine::new(config);

    let mut window = Window::new(&title(&engine)).await;

    let mut camera = OrbitCamera3d::default();
    camera.set_dist(8.0);

    let mut scene = SceneNode3d::empty();
    scene
        .add_light(Light::point(100.0))
        .set_position(Vec3::new(5.0, 5.0, 5.0));

    let mut scene_state = scene_key(&engine);
    let mut rendered = build_scene(&mut scene, &engine);
    let mut labels = build_labels(&mut scene, &engine);
    let mut shown_title = title(&engine);

    loop {
        for event in window.events().iter() {
            if let kiss3d::event::WindowEvent::Key(key, action, modifiers) = event.value {
                use kiss3d::event::{Action, Key, Modifiers};
                let shift = modifiers.contains(Modifiers::Shift);
                if matches!(key, Key::LShift | Key::RShift) {
                    engine.set_labels_inverted(action == Action::Press);
                }
                if action == Action::Press {
                    handle_key(&mut engine, key, shift, modifiers.contains(Modifiers::Alt));
                }
            }
        }

        engine.tick(FRAME_TIME);

        let next_state = scene_key(&engine);
        if next_state != scene_state {
            clear_scene(&mut rendered);
            for mut node in labels.drain(..) {
                node.remove();
            }
            rendered = build_scene(&mut scene, &engine);
            labels = build_labels(&mut scene, &engine);
            scene_state = next_state;
        }
        place_scene(&mut rendered, &engine);
        place_labels(&mut labels, &engine);

        let next_title = title(&engine);
        if next_title != shown_title {
            window.set_title(&next_title);
            shown_title = next_title;
        }

        if !window.render_3d(&mut scene, &mut camera).await {
            break;
        }
    }
}
