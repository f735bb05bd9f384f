// Merch booth: cut a portrait out of its backdrop, dress it up with merch and
// stamps on a glowing dark canvas, export the result as a PNG.
//
// What you SEE:
// • The canvas with the cut-out avatar, the selected merch and placed stamps.
// • Drag a layer to move it, drag its bottom-right corner to resize it.
// • A crosshair under the mouse and a one-line HUD at the bottom (never exported).
//
// Keys: O reload avatar, [ ] tolerance, - = avatar scale, R rotate, , . merch scale,
// N M previous/next merch, 1-9 stamps, U undo stamp, L lasso, Enter close lasso,
// W wand, 0 reset avatar, S export, Esc cancel tool or quit.

mod assets;
mod compositor;
mod config;
mod draw;
mod error;
mod font;
mod gamma;
mod glow;
mod input;
mod sampler;
mod scene;
mod segment;
mod types;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use env_logger::Env;
use minifb::Key;

use assets::{Loaded, Loader, Slot, export_png, list_gallery};
use compositor::Compositor;
use config::{Args, Capabilities};
use draw::{Drawer, draw_crosshair, draw_polyline, draw_rect, draw_text};
use error::Error;
use input::{Controller, HANDLE_SIZE, InputEvent, Mode};
use scene::{Gallery, LayerKind, Scene};
use types::{FrameBuffer, Point};

const TOLERANCE_STEP: f32 = 5.0;
const SCALE_STEP: f32 = 0.05;
const ROTATE_STEP: f32 = 15.0;

const CROSSHAIR: u32 = 0x00_FF_CC_33;
const LASSO: u32 = 0x00_39_FF_14;
const HANDLE: u32 = 0x00_FF_FF_FF;
const HUD: u32 = 0x00_FF_FF_FF;

/// What a key press asks for.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    ReloadAvatar,
    Tolerance(f32),
    AvatarScale(f32),
    Rotate(f32),
    MerchScale(f32),
    CycleMerch(isize),
    Stamp(usize),
    UndoStamp,
    Lasso,
    CloseLasso,
    Wand,
    ResetAvatar,
    Export,
    Escape,
}

fn action_for(key: Key) -> Option<Action> {
    let stamp_keys = [
        Key::Key1,
        Key::Key2,
        Key::Key3,
        Key::Key4,
        Key::Key5,
        Key::Key6,
        Key::Key7,
        Key::Key8,
        Key::Key9,
    ];
    if let Some(i) = stamp_keys.iter().position(|&k| k == key) {
        return Some(Action::Stamp(i));
    }
    Some(match key {
        Key::O => Action::ReloadAvatar,
        Key::LeftBracket => Action::Tolerance(-TOLERANCE_STEP),
        Key::RightBracket => Action::Tolerance(TOLERANCE_STEP),
        Key::Minus => Action::AvatarScale(-SCALE_STEP),
        Key::Equal => Action::AvatarScale(SCALE_STEP),
        Key::R => Action::Rotate(ROTATE_STEP),
        Key::Comma => Action::MerchScale(-SCALE_STEP),
        Key::Period => Action::MerchScale(SCALE_STEP),
        Key::N => Action::CycleMerch(-1),
        Key::M => Action::CycleMerch(1),
        Key::U => Action::UndoStamp,
        Key::L => Action::Lasso,
        Key::Enter => Action::CloseLasso,
        Key::W => Action::Wand,
        Key::Key0 => Action::ResetAvatar,
        Key::S => Action::Export,
        Key::Escape => Action::Escape,
        _ => return None,
    })
}

/// Next loaded merch entry `step` away from the current one, wrapping around.
fn cycle_merch(scene: &mut Scene, step: isize) -> bool {
    let n = scene.merch_count() as isize;
    if n == 0 {
        return false;
    }
    let start = scene.merch_selected() as isize;
    (1..=n).any(|k| scene.select_merch((start + step * k).rem_euclid(n) as usize))
}

/// Result of one key press for the loop: redraw, export, or quit.
#[derive(Default)]
struct Outcome {
    redraw: bool,
    export: bool,
    quit: bool,
}

struct App {
    args: Args,
    scene: Scene,
    controller: Controller,
    loader: Loader,
}

impl App {
    fn apply(&mut self, action: Action) -> Outcome {
        let scene = &mut self.scene;
        let mut out = Outcome::default();
        out.redraw = match action {
            Action::ReloadAvatar => {
                self.request_avatar();
                false
            }
            Action::Tolerance(d) => scene.set_tolerance(scene.tolerance() + d),
            Action::AvatarScale(d) => scene.set_avatar_scale(scene.transform(LayerKind::Avatar).scale + d),
            Action::Rotate(d) => scene.set_avatar_rotation(scene.transform(LayerKind::Avatar).rotation + d),
            Action::MerchScale(d) => scene.set_merch_scale(scene.transform(LayerKind::Merch).scale + d),
            Action::CycleMerch(step) => cycle_merch(scene, step),
            Action::Stamp(i) => self.controller.handle(scene, InputEvent::SelectStamp(i)),
            Action::UndoStamp => scene.undo_stamp(),
            Action::Lasso => self.controller.handle(scene, InputEvent::ActivateLasso),
            Action::CloseLasso => self.controller.handle(scene, InputEvent::CloseLasso),
            Action::Wand => self.controller.handle(scene, InputEvent::ToggleWand),
            Action::ResetAvatar => scene.reset_avatar(),
            Action::Export => {
                out.export = true;
                false
            }
            Action::Escape => {
                if *self.controller.mode() == Mode::Idle {
                    out.quit = true;
                    false
                } else {
                    self.controller.handle(scene, InputEvent::Cancel)
                }
            }
        };
        out
    }

    fn request_avatar(&mut self) {
        match &self.args.avatar {
            Some(path) => self.loader.request(Slot::Avatar, path.clone()),
            None => log::warn!("no avatar file given (use --avatar)"),
        }
    }

    /// Hand finished decodes to the scene. Returns true when anything landed.
    fn absorb(&mut self, loaded: Vec<Loaded>) -> bool {
        let mut changed = false;
        for Loaded { slot, path, result } in loaded {
            let image = match result {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                    continue;
                }
            };
            match slot {
                Slot::Avatar => self.scene.set_avatar(image),
                Slot::Merch(i) => self.scene.gallery_loaded(Gallery::Merch, i, image),
                Slot::Stamp(i) => self.scene.gallery_loaded(Gallery::Stamps, i, image),
            }
            changed = true;
        }
        changed
    }
}

/// UI-only decorations drawn over a copy of the canvas.
fn draw_overlays(screen: &mut FrameBuffer, app: &App, mouse: Option<Point>, hud: &str) {
    for kind in [LayerKind::Avatar, LayerKind::Merch] {
        if let Some((img, tf)) = app.scene.layer(kind) {
            let (w, h) = tf.size(img.width(), img.height());
            draw_rect(screen, tf.x + w - HANDLE_SIZE, tf.y + h - HANDLE_SIZE, HANDLE_SIZE, HANDLE_SIZE, HANDLE);
        }
    }
    if let Mode::LassoDrawing { points } = app.controller.mode() {
        draw_polyline(screen, points, mouse, LASSO);
    }
    if let Some(p) = mouse {
        draw_crosshair(screen, p.x as i32, p.y as i32, 12, CROSSHAIR);
    }
    let y = screen.height as i32 - 12;
    draw_text(screen, 8, y, hud, HUD);
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let caps = Capabilities::load(&args)?;
    let (w, h) = (caps.canvas_width, caps.canvas_height);
    log::info!("profile {:?}, canvas {w}x{h}", args.profile);

    let merch_files = list_gallery(&args.merch_dir);
    let stamp_files = if caps.stamps { list_gallery(&args.stamps_dir) } else { Vec::new() };
    let out_dir: PathBuf = args.out_dir.clone();
    let export_name = caps.export_name.clone();

    let mut app = App { args, scene: Scene::new(caps), controller: Controller::new(), loader: Loader::new() };
    app.request_avatar();
    app.loader.request_gallery(merch_files, Slot::Merch);
    app.loader.request_gallery(stamp_files, Slot::Stamp);

    let mut drawer = Drawer::new("Merch Booth", w, h)?;
    let compositor = Compositor::new();
    let mut canvas = FrameBuffer::new(w, h);
    let mut screen = FrameBuffer::new(w, h);
    compositor.render(&app.scene, &mut canvas);

    let mut was_down = false;
    let mut last_mouse = None;
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut fps_text = String::from("FPS: 0.0");

    while drawer.is_open() {
        let now = Instant::now();
        let loaded = app.loader.drain();
        let mut redraw = app.absorb(loaded);

        /* Keys */
        let mut quit = false;
        for key in drawer.keys_pressed() {
            let Some(action) = action_for(key) else { continue };
            let out = app.apply(action);
            redraw |= out.redraw;
            quit |= out.quit;
            if out.export {
                // Render first so the file matches what the scene holds right now.
                compositor.render(&app.scene, &mut canvas);
                if let Err(e) = export_png(&canvas, &out_dir, &export_name) {
                    log::error!("{e}");
                }
            }
        }
        if quit {
            break;
        }

        /* Pointer: edges become down/up, motion only while held */
        let mouse = drawer.mouse_pos();
        let down = drawer.left_mouse_down();
        match (was_down, down, mouse) {
            (false, true, Some(p)) => redraw |= app.controller.handle(&mut app.scene, InputEvent::PointerDown(p)),
            (true, true, Some(p)) if mouse != last_mouse => {
                redraw |= app.controller.handle(&mut app.scene, InputEvent::PointerMove(p))
            }
            (true, false, _) => redraw |= app.controller.handle(&mut app.scene, InputEvent::PointerUp),
            _ => {}
        }
        was_down = down;
        last_mouse = mouse;

        if redraw {
            compositor.render(&app.scene, &mut canvas);
        }

        screen.pixels.copy_from_slice(&canvas.pixels);
        let loading = match app.loader.pending() {
            0 => String::new(),
            n => format!(" | loading {n}"),
        };
        let bg = match app.scene.avatar() {
            Some(a) => format!(" bg #{:06x}", a.background().packed()),
            None => String::new(),
        };
        let hud = format!(
            "{} | tol {:.0}{} | merch {}/{} | stamps {}{} | {}",
            app.controller.mode().label(),
            app.scene.tolerance(),
            bg,
            app.scene.merch_selected() + 1,
            app.scene.merch_count(),
            app.scene.placed_stamps().len(),
            loading,
            fps_text
        );
        draw_overlays(&mut screen, &app, mouse, &hud);
        drawer.present(&screen)?;

        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            fps_text = format!("FPS: {:.1}", frames_this_second as f32 / secs);
            log::trace!("{fps_text}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}
