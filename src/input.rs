// Interaction controller: pointer/touch input and tool toggles become scene edits.
// Visual: press on a layer to drag it, on its bottom-right corner to resize it,
// or click with a tool armed (lasso point, stamp, wand erase).
// Exactly one Mode is active at a time. Hit-testing uses axis-aligned boxes and ignores rotation.

use crate::scene::{LayerKind, Scene};
use crate::types::Point;

/// Side of the square resize handle at a layer's bottom-right corner.
pub const HANDLE_SIZE: f32 = 10.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Mode {
    #[default]
    Idle,
    /// `offset` is the grab point relative to the layer's top-left.
    Dragging { layer: LayerKind, offset: Point },
    Resizing { layer: LayerKind },
    LassoDrawing { points: Vec<Point> },
    StampArmed { stamp: usize },
    /// Every click runs a wand erase at the clicked avatar pixel.
    WandArmed,
}

impl Mode {
    /// Short name for the HUD.
    pub fn label(&self) -> String {
        match self {
            Mode::Idle => "IDLE".into(),
            Mode::Dragging { .. } => "DRAG".into(),
            Mode::Resizing { .. } => "RESIZE".into(),
            Mode::LassoDrawing { points } => format!("LASSO {}", points.len()),
            Mode::StampArmed { stamp } => format!("STAMP {}", stamp + 1),
            Mode::WandArmed => "WAND".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    // Touch mirrors the pointer; the minifb window only ever reports the mouse.
    #[allow(dead_code)]
    TouchStart(Point),
    #[allow(dead_code)]
    TouchMove(Point),
    #[allow(dead_code)]
    TouchEnd,
    /// Lasso tool button.
    ActivateLasso,
    /// Close the current lasso polygon and cut.
    CloseLasso,
    /// Stamp radio clicked; clicking the armed one again deselects it.
    SelectStamp(usize),
    /// Wand tool button; toggles.
    ToggleWand,
    /// Leave whatever tool is active.
    Cancel,
}

pub struct Controller {
    mode: Mode,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self { mode: Mode::Idle }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// True while a drag or resize gesture is in progress.
    pub fn in_gesture(&self) -> bool {
        matches!(self.mode, Mode::Dragging { .. } | Mode::Resizing { .. })
    }

    /// Feed one event. Returns true when the scene changed and needs a redraw.
    pub fn handle(&mut self, scene: &mut Scene, event: InputEvent) -> bool {
        match event {
            InputEvent::PointerDown(p) | InputEvent::TouchStart(p) => self.press(scene, p),
            InputEvent::PointerMove(p) | InputEvent::TouchMove(p) => self.motion(scene, p),
            InputEvent::PointerUp | InputEvent::TouchEnd => {
                if self.in_gesture() {
                    self.mode = Mode::Idle;
                }
                false
            }
            InputEvent::ActivateLasso => {
                if !scene.caps().lasso || self.in_gesture() {
                    return false;
                }
                if !matches!(self.mode, Mode::LassoDrawing { .. }) {
                    log::debug!("lasso: drawing");
                    self.mode = Mode::LassoDrawing { points: Vec::new() };
                }
                false
            }
            InputEvent::CloseLasso => self.close_lasso(scene),
            InputEvent::SelectStamp(stamp) => {
                if !scene.caps().stamps || self.in_gesture() {
                    return false;
                }
                if self.mode == (Mode::StampArmed { stamp }) {
                    self.mode = Mode::Idle;
                } else if scene.stamp_image(stamp).is_some() {
                    self.mode = Mode::StampArmed { stamp };
                } else {
                    log::debug!("stamp {stamp} not loaded");
                }
                false
            }
            InputEvent::ToggleWand => {
                if !scene.caps().erase || self.in_gesture() {
                    return false;
                }
                self.mode = if self.mode == Mode::WandArmed { Mode::Idle } else { Mode::WandArmed };
                false
            }
            InputEvent::Cancel => {
                let redraw = matches!(&self.mode, Mode::LassoDrawing { points } if !points.is_empty());
                self.mode = Mode::Idle;
                redraw
            }
        }
    }

    fn press(&mut self, scene: &mut Scene, p: Point) -> bool {
        if self.mode == Mode::Idle {
            self.mode = hit_test(scene, p);
            return false;
        }
        match &mut self.mode {
            Mode::Idle => false,
            Mode::LassoDrawing { points } => {
                points.push(p);
                true
            }
            Mode::StampArmed { stamp } => scene.place_stamp(*stamp, p),
            Mode::WandArmed => scene.erase_at(p),
            // A second press mid-gesture (other button, second finger) is ignored.
            Mode::Dragging { .. } | Mode::Resizing { .. } => false,
        }
    }

    fn motion(&mut self, scene: &mut Scene, p: Point) -> bool {
        match self.mode {
            Mode::Dragging { layer, offset } => {
                scene.move_layer(layer, Point::new(p.x - offset.x, p.y - offset.y))
            }
            Mode::Resizing { layer } => {
                let Some((img, tf)) = scene.layer(layer) else { return false };
                let (w, h) = (img.width() as f32, img.height() as f32);
                // Smaller of the two ratios keeps the aspect and never overshoots.
                let scale = ((p.x - tf.x) / w).min((p.y - tf.y) / h);
                scene.resize_layer(layer, scale)
            }
            _ => false,
        }
    }

    fn close_lasso(&mut self, scene: &mut Scene) -> bool {
        let Mode::LassoDrawing { points } = &self.mode else { return false };
        if points.len() < 3 {
            log::debug!("lasso: {} points, need 3", points.len());
            return false;
        }
        let Mode::LassoDrawing { points } = std::mem::take(&mut self.mode) else { return false };
        scene.apply_lasso(&points);
        true
    }
}

/// What a press at `p` grabs: resize handles first, then bodies, topmost layer first.
fn hit_test(scene: &Scene, p: Point) -> Mode {
    let [bottom, top] = scene.stacking();
    let order = [top, bottom];

    for layer in order {
        if let Some((img, tf)) = scene.layer(layer) {
            if tf.over_handle(img.width(), img.height(), p, HANDLE_SIZE) {
                log::debug!("resize {layer:?}");
                return Mode::Resizing { layer };
            }
        }
    }
    for layer in order {
        if let Some((img, tf)) = scene.layer(layer) {
            if tf.contains(img.width(), img.height(), p) {
                log::debug!("drag {layer:?}");
                return Mode::Dragging { layer, offset: Point::new(p.x - tf.x, p.y - tf.y) };
            }
        }
    }
    Mode::Idle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capabilities, Profile};
    use crate::scene::Gallery;
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// Avatar 100x100 at (350, 250), merch 200x100 at (300, 340).
    fn scene(profile: Profile) -> Scene {
        let mut scene = Scene::new(Capabilities::for_profile(profile));
        let avatar = RgbaImage::from_fn(100, 100, |x, y| {
            if (20..80).contains(&x) && (20..80).contains(&y) { RED } else { Rgba([0, 0, 255, 255]) }
        });
        scene.set_avatar(avatar);
        scene.gallery_loaded(Gallery::Merch, 0, RgbaImage::from_pixel(200, 100, RED));
        scene.gallery_loaded(Gallery::Stamps, 0, RgbaImage::from_pixel(20, 20, RED));
        scene
    }

    fn down(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerDown(Point::new(x, y))
    }

    fn mv(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMove(Point::new(x, y))
    }

    #[test]
    fn drag_moves_layer_keeping_grab_offset() {
        let mut s = scene(Profile::Classic);
        let mut c = Controller::new();
        c.handle(&mut s, down(360.0, 260.0));
        assert!(matches!(c.mode(), Mode::Dragging { layer: LayerKind::Avatar, .. }));
        assert!(c.handle(&mut s, mv(100.0, 120.0)));
        let tf = s.transform(LayerKind::Avatar);
        assert_eq!((tf.x, tf.y), (90.0, 110.0));
        c.handle(&mut s, InputEvent::PointerUp);
        assert_eq!(c.mode(), &Mode::Idle);
        assert!(!c.handle(&mut s, mv(0.0, 0.0)));
    }

    #[test]
    fn dragging_off_canvas_is_allowed() {
        let mut s = scene(Profile::Classic);
        let mut c = Controller::new();
        c.handle(&mut s, down(360.0, 260.0));
        c.handle(&mut s, mv(-500.0, 2000.0));
        let tf = s.transform(LayerKind::Avatar);
        assert_eq!((tf.x, tf.y), (-510.0, 1990.0));
    }

    #[test]
    fn topmost_layer_wins_the_overlap() {
        // Overlap of avatar (350..450, 250..350) and merch (300..500, 340..440).
        let p = (400.0, 345.0);
        let mut classic = scene(Profile::Classic);
        let mut c = Controller::new();
        c.handle(&mut classic, down(p.0, p.1));
        assert!(matches!(c.mode(), Mode::Dragging { layer: LayerKind::Merch, .. }));

        let mut editor = scene(Profile::Editor);
        let mut c = Controller::new();
        c.handle(&mut editor, down(p.0, p.1));
        assert!(matches!(c.mode(), Mode::Dragging { layer: LayerKind::Avatar, .. }));
    }

    #[test]
    fn miss_stays_idle() {
        let mut s = scene(Profile::Classic);
        let mut c = Controller::new();
        c.handle(&mut s, down(5.0, 5.0));
        assert_eq!(c.mode(), &Mode::Idle);
    }

    #[test]
    fn handle_starts_resize_and_keeps_aspect() {
        let mut s = scene(Profile::Classic);
        let mut c = Controller::new();
        // Avatar bottom-right corner is (450, 350).
        c.handle(&mut s, down(445.0, 345.0));
        assert_eq!(c.mode(), &Mode::Resizing { layer: LayerKind::Avatar });

        // Wider than tall: the vertical ratio wins.
        c.handle(&mut s, mv(650.0, 400.0));
        let tf = s.transform(LayerKind::Avatar);
        assert_eq!(tf.scale, 1.5);
        assert_eq!((tf.x, tf.y), (350.0, 250.0));
        let (img, tf) = s.layer(LayerKind::Avatar).expect("avatar");
        let (w, h) = tf.size(img.width(), img.height());
        assert!((w / h - 1.0).abs() < 1e-6);

        // Pointer above/left of the origin cannot flip or zero the scale.
        c.handle(&mut s, mv(0.0, 0.0));
        assert_eq!(s.transform(LayerKind::Avatar).scale, crate::scene::MIN_SCALE);

        c.handle(&mut s, InputEvent::TouchEnd);
        assert_eq!(c.mode(), &Mode::Idle);
    }

    #[test]
    fn merch_resize_uses_merch_dimensions() {
        let mut s = scene(Profile::Classic);
        let mut c = Controller::new();
        // Merch bottom-right corner is (500, 440).
        c.handle(&mut s, InputEvent::TouchStart(Point::new(498.0, 438.0)));
        assert_eq!(c.mode(), &Mode::Resizing { layer: LayerKind::Merch });
        c.handle(&mut s, InputEvent::TouchMove(Point::new(500.0, 540.0)));
        // dw/200 = 1.0, dh/100 = 2.0 -> 1.0
        assert_eq!(s.transform(LayerKind::Merch).scale, 1.0);
    }

    #[test]
    fn stamp_mode_places_repeatedly_until_deselected() {
        let mut s = scene(Profile::Classic);
        let mut c = Controller::new();
        c.handle(&mut s, InputEvent::SelectStamp(0));
        assert_eq!(c.mode(), &Mode::StampArmed { stamp: 0 });
        // Clicking on top of the avatar places a stamp instead of dragging.
        assert!(c.handle(&mut s, down(400.0, 300.0)));
        assert!(c.handle(&mut s, down(10.0, 10.0)));
        assert_eq!(s.placed_stamps().len(), 2);
        assert_eq!(s.transform(LayerKind::Avatar).x, 350.0);

        c.handle(&mut s, InputEvent::SelectStamp(0));
        assert_eq!(c.mode(), &Mode::Idle);
        c.handle(&mut s, InputEvent::SelectStamp(7));
        assert_eq!(c.mode(), &Mode::Idle);
    }

    #[test]
    fn stamps_disabled_in_editor() {
        let mut s = scene(Profile::Editor);
        let mut c = Controller::new();
        c.handle(&mut s, InputEvent::SelectStamp(0));
        assert_eq!(c.mode(), &Mode::Idle);
    }

    #[test]
    fn lasso_collects_points_and_commits_on_close() {
        let mut s = scene(Profile::Editor);
        let mut c = Controller::new();
        c.handle(&mut s, InputEvent::ActivateLasso);
        c.handle(&mut s, down(350.0, 250.0));
        c.handle(&mut s, down(400.0, 250.0));
        // Two points: closing is a no-op and drawing continues.
        assert!(!c.handle(&mut s, InputEvent::CloseLasso));
        assert!(matches!(c.mode(), Mode::LassoDrawing { points } if points.len() == 2));

        c.handle(&mut s, down(400.0, 300.0));
        c.handle(&mut s, down(350.0, 300.0));
        assert!(c.handle(&mut s, InputEvent::CloseLasso));
        assert_eq!(c.mode(), &Mode::Idle);

        let avatar = s.avatar().expect("avatar");
        // Inside the top-left quarter the red core survives, outside is cut.
        assert_eq!(avatar.processed.get_pixel(30, 30)[3], 255);
        assert_eq!(avatar.processed.get_pixel(70, 70)[3], 0);
        assert!(avatar.mask.is_some());
    }

    #[test]
    fn lasso_disabled_in_classic() {
        let mut s = scene(Profile::Classic);
        let mut c = Controller::new();
        c.handle(&mut s, InputEvent::ActivateLasso);
        assert_eq!(c.mode(), &Mode::Idle);
    }

    #[test]
    fn cancel_drops_lasso_points() {
        let mut s = scene(Profile::Editor);
        let mut c = Controller::new();
        c.handle(&mut s, InputEvent::ActivateLasso);
        c.handle(&mut s, down(1.0, 1.0));
        assert!(c.handle(&mut s, InputEvent::Cancel));
        assert_eq!(c.mode(), &Mode::Idle);
        assert!(s.avatar().expect("avatar").mask.is_none());
    }

    #[test]
    fn wand_erases_clicked_region() {
        let mut s = scene(Profile::Editor);
        let mut c = Controller::new();
        c.handle(&mut s, InputEvent::ToggleWand);
        assert_eq!(c.mode(), &Mode::WandArmed);
        assert!(c.handle(&mut s, down(400.0, 300.0)));
        assert_eq!(s.avatar().expect("avatar").processed.get_pixel(50, 50)[3], 0);
        assert_eq!(c.mode(), &Mode::WandArmed);
        c.handle(&mut s, InputEvent::ToggleWand);
        assert_eq!(c.mode(), &Mode::Idle);
    }

    #[test]
    fn tools_wait_for_gesture_to_finish() {
        let mut s = scene(Profile::Editor);
        let mut c = Controller::new();
        c.handle(&mut s, down(360.0, 260.0));
        c.handle(&mut s, InputEvent::ActivateLasso);
        c.handle(&mut s, InputEvent::ToggleWand);
        assert!(c.in_gesture());
    }

    #[test]
    fn rotation_does_not_change_hit_boxes() {
        let mut s = scene(Profile::Classic);
        assert!(s.set_avatar_rotation(45.0));

        // Top-left corner of the unrotated box lies outside the turned square.
        let mut c = Controller::new();
        c.handle(&mut s, down(352.0, 252.0));
        assert_eq!(
            c.mode(),
            &Mode::Dragging { layer: LayerKind::Avatar, offset: Point::new(2.0, 2.0) }
        );
        c.handle(&mut s, InputEvent::PointerUp);

        // Same for the handle at the unrotated bottom-right corner.
        c.handle(&mut s, down(448.0, 348.0));
        assert_eq!(c.mode(), &Mode::Resizing { layer: LayerKind::Avatar });
    }
}
