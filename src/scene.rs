// Layer model: everything the compositor draws and the controller edits.
// Visual: the avatar cut-out, the selected merch and the placed stamps, each
// with its own position and scale (the avatar can also rotate).
// Setters reject non-finite numbers so NaN never reaches the compositor.

use std::rc::Rc;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::config::Capabilities;
use crate::sampler::sample_background;
use crate::segment::{apply_manual_mask, flood_erase, lasso_mask, removed_count, segment};
use crate::types::{ManualMask, Point, Rgb};

/// Longest side of the processed avatar; bigger uploads are downscaled.
pub const MAX_DIM: u32 = 1200;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 3.0;
pub const MAX_TOLERANCE: f32 = 200.0;
/// Stamps are placed at half size, centred on the click.
pub const STAMP_SCALE: f32 = 0.5;
/// Merch sits this fraction of the canvas height below centre when selected.
const MERCH_DROP: f32 = 0.15;

/// Position (top-left, canvas pixels), uniform scale and rotation in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self { x: 50.0, y: 50.0, scale: 1.0, rotation: 0.0 }
    }
}

impl Transform {
    /// On-canvas size of a `w` x `h` source.
    pub fn size(&self, w: u32, h: u32) -> (f32, f32) {
        (w as f32 * self.scale, h as f32 * self.scale)
    }

    /// Axis-aligned bounding box test; rotation is ignored.
    pub fn contains(&self, w: u32, h: u32, p: Point) -> bool {
        let (sw, sh) = self.size(w, h);
        p.x >= self.x && p.x <= self.x + sw && p.y >= self.y && p.y <= self.y + sh
    }

    /// Inside the `handle` sized square at the bottom-right corner.
    pub fn over_handle(&self, w: u32, h: u32, p: Point, handle: f32) -> bool {
        let (sw, sh) = self.size(w, h);
        let (right, bottom) = (self.x + sw, self.y + sh);
        p.x >= right - handle && p.x <= right && p.y >= bottom - handle && p.y <= bottom
    }

    fn rescale(&mut self, w: u32, h: u32, scale: f32, keep_center: bool) {
        if keep_center {
            let (ow, oh) = self.size(w, h);
            let (cx, cy) = (self.x + ow / 2.0, self.y + oh / 2.0);
            self.scale = scale;
            let (nw, nh) = self.size(w, h);
            self.x = cx - nw / 2.0;
            self.y = cy - nh / 2.0;
        } else {
            self.scale = scale;
        }
    }
}

/// The two draggable layer categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Avatar,
    Merch,
}

/// Which gallery a decoded asset belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gallery {
    Merch,
    Stamps,
}

/// The uploaded portrait: downscaled source plus its current cut-out.
pub struct Avatar {
    source: RgbaImage,
    background: Rgb,
    pub processed: RgbaImage,
    pub mask: Option<ManualMask>,
}

impl Avatar {
    pub fn background(&self) -> Rgb {
        self.background
    }
}

/// One click-placed stamp. The image is shared with the gallery entry.
#[derive(Clone, Debug)]
pub struct StampRecord {
    pub image: Rc<RgbaImage>,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

pub struct Scene {
    caps: Capabilities,
    tolerance: f32,
    avatar: Option<Avatar>,
    avatar_tf: Transform,
    merch: Vec<Option<Rc<RgbaImage>>>,
    merch_selected: usize,
    merch_tf: Transform,
    stamps: Vec<Option<Rc<RgbaImage>>>,
    placed: Vec<StampRecord>,
}

/// Shrink so the longest side is at most `max_dim`; never upscales.
pub fn fit_within(img: RgbaImage, max_dim: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let longest = w.max(h);
    if longest <= max_dim || longest == 0 {
        return img;
    }
    let k = max_dim as f32 / longest as f32;
    let nw = ((w as f32 * k).round() as u32).max(1);
    let nh = ((h as f32 * k).round() as u32).max(1);
    log::info!("downscaling avatar {w}x{h} -> {nw}x{nh}");
    imageops::resize(&img, nw, nh, FilterType::Triangle)
}

/// Turn a raw control value into a number, keeping `prior` when it does not parse.
pub fn parse_control(raw: &str, prior: f32) -> f32 {
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            log::warn!("ignoring control value {raw:?}, keeping {prior}");
            prior
        }
    }
}

fn finite(what: &str, v: f32) -> Option<f32> {
    if v.is_finite() {
        Some(v)
    } else {
        log::warn!("{what}: rejecting non-finite value {v}");
        None
    }
}

impl Scene {
    pub fn new(caps: Capabilities) -> Self {
        let tolerance = caps.tolerance.clamp(0.0, MAX_TOLERANCE);
        let merch_tf = Transform {
            x: caps.canvas_width as f32 / 2.0,
            y: caps.canvas_height as f32 / 2.0,
            ..Transform::default()
        };
        Self {
            caps,
            tolerance,
            avatar: None,
            avatar_tf: Transform::default(),
            merch: Vec::new(),
            merch_selected: 0,
            merch_tf,
            stamps: Vec::new(),
            placed: Vec::new(),
        }
    }

    pub fn caps(&self) -> &Capabilities {
        &self.caps
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        self.avatar.as_ref()
    }

    fn canvas(&self) -> (f32, f32) {
        (self.caps.canvas_width as f32, self.caps.canvas_height as f32)
    }

    /* ---------------- avatar ---------------- */

    /// New upload: downscale, sample, segment, centre. Prior manual cuts are dropped.
    pub fn set_avatar(&mut self, image: RgbaImage) {
        let source = fit_within(image, MAX_DIM);
        let background = sample_background(&source);
        let processed = segment(&source, background, self.tolerance);
        let (cw, ch) = self.canvas();
        // Centred at its unscaled size.
        self.avatar_tf.x = (cw - source.width() as f32) / 2.0;
        self.avatar_tf.y = (ch - source.height() as f32) / 2.0;
        log::info!(
            "avatar {}x{} background {:?} tolerance {}",
            source.width(),
            source.height(),
            background,
            self.tolerance
        );
        self.avatar = Some(Avatar { source, background, processed, mask: None });
    }

    /// Re-run segmentation at a new tolerance (clamped to 0..=200).
    pub fn set_tolerance(&mut self, tolerance: f32) -> bool {
        let Some(t) = finite("tolerance", tolerance) else { return false };
        self.tolerance = t.clamp(0.0, MAX_TOLERANCE);
        let keep = self.caps.keep_manual_mask;
        let Some(avatar) = self.avatar.as_mut() else { return false };

        avatar.processed = segment(&avatar.source, avatar.background, self.tolerance);
        if keep {
            if let Some(mask) = &avatar.mask {
                apply_manual_mask(&mut avatar.processed, mask);
            }
        } else {
            avatar.mask = None;
        }
        log::debug!(
            "tolerance {} removes {} pixels",
            self.tolerance,
            removed_count(&avatar.processed)
        );
        true
    }

    pub fn set_avatar_scale(&mut self, scale: f32) -> bool {
        let Some(s) = finite("avatar scale", scale) else { return false };
        let s = s.clamp(MIN_SCALE, MAX_SCALE);
        let keep = self.caps.scale_keeps_center;
        match &self.avatar {
            Some(a) => {
                let (w, h) = a.processed.dimensions();
                self.avatar_tf.rescale(w, h, s, keep);
            }
            None => self.avatar_tf.scale = s,
        }
        true
    }

    pub fn set_avatar_rotation(&mut self, degrees: f32) -> bool {
        if !self.caps.rotation {
            log::debug!("rotation disabled for this profile");
            return false;
        }
        let Some(d) = finite("avatar rotation", degrees) else { return false };
        // rem_euclid can round a tiny negative angle up to exactly 360.
        let r = d.rem_euclid(360.0);
        self.avatar_tf.rotation = if r >= 360.0 { 0.0 } else { r };
        true
    }

    /// Back to scale 1, no rotation, centred.
    pub fn reset_avatar(&mut self) -> bool {
        let Some(a) = &self.avatar else { return false };
        let (w, h) = a.processed.dimensions();
        let (cw, ch) = self.canvas();
        self.avatar_tf = Transform {
            x: (cw - w as f32) / 2.0,
            y: (ch - h as f32) / 2.0,
            scale: 1.0,
            rotation: 0.0,
        };
        true
    }

    /// Magic-wand erase at a canvas point, using the current tolerance.
    pub fn erase_at(&mut self, p: Point) -> bool {
        let tf = self.avatar_tf;
        let tolerance = self.tolerance;
        let Some(avatar) = self.avatar.as_mut() else {
            log::debug!("erase_at: no avatar");
            return false;
        };
        let lx = ((p.x - tf.x) / tf.scale).floor();
        let ly = ((p.y - tf.y) / tf.scale).floor();
        if lx < 0.0 || ly < 0.0 {
            return false;
        }
        flood_erase(&mut avatar.processed, &mut avatar.mask, lx as u32, ly as u32, tolerance) > 0
    }

    /// Keep only what lies inside `polygon`; fewer than three points does nothing.
    pub fn apply_lasso(&mut self, polygon: &[Point]) -> bool {
        let tf = self.avatar_tf;
        let Some(avatar) = self.avatar.as_mut() else {
            log::debug!("apply_lasso: no avatar");
            return false;
        };
        if polygon.len() < 3 {
            return false;
        }
        lasso_mask(&mut avatar.processed, &mut avatar.mask, polygon, Point::new(tf.x, tf.y), tf.scale);
        true
    }

    /* ---------------- galleries ---------------- */

    /// Store a decoded gallery image at its list position. The first merch entry
    /// is selected as soon as it arrives.
    pub fn gallery_loaded(&mut self, gallery: Gallery, index: usize, image: RgbaImage) {
        let list = match gallery {
            Gallery::Merch => &mut self.merch,
            Gallery::Stamps => &mut self.stamps,
        };
        if list.len() <= index {
            list.resize(index + 1, None);
        }
        list[index] = Some(Rc::new(image));
        if gallery == Gallery::Merch && index == 0 {
            self.select_merch(0);
        }
    }

    pub fn merch_count(&self) -> usize {
        self.merch.len()
    }

    pub fn merch_selected(&self) -> usize {
        self.merch_selected
    }

    /// Pick a merch graphic and place it centred, slightly below the middle.
    pub fn select_merch(&mut self, index: usize) -> bool {
        let Some(Some(img)) = self.merch.get(index) else {
            log::debug!("merch {index} not loaded");
            return false;
        };
        let (mw, mh) = self.merch_tf.size(img.width(), img.height());
        let (cw, ch) = self.canvas();
        self.merch_tf.x = (cw - mw) / 2.0;
        self.merch_tf.y = (ch - mh) / 2.0 + ch * MERCH_DROP;
        self.merch_selected = index;
        true
    }

    pub fn set_merch_scale(&mut self, scale: f32) -> bool {
        let Some(s) = finite("merch scale", scale) else { return false };
        let s = s.clamp(MIN_SCALE, MAX_SCALE);
        let keep = self.caps.scale_keeps_center;
        match self.merch.get(self.merch_selected).cloned().flatten() {
            Some(img) => self.merch_tf.rescale(img.width(), img.height(), s, keep),
            None => self.merch_tf.scale = s,
        }
        true
    }

    pub fn stamp_image(&self, index: usize) -> Option<&Rc<RgbaImage>> {
        self.stamps.get(index).and_then(|s| s.as_ref())
    }

    /// Append a stamp centred on (x, y) at half size.
    pub fn place_stamp(&mut self, index: usize, at: Point) -> bool {
        if !self.caps.stamps {
            return false;
        }
        let Some(image) = self.stamp_image(index).cloned() else { return false };
        let (w, h) = (image.width() as f32 * STAMP_SCALE, image.height() as f32 * STAMP_SCALE);
        self.placed.push(StampRecord { image, x: at.x - w / 2.0, y: at.y - h / 2.0, scale: STAMP_SCALE });
        true
    }

    /// Remove the most recent stamp; nothing happens when none are placed.
    pub fn undo_stamp(&mut self) -> bool {
        self.placed.pop().is_some()
    }

    pub fn placed_stamps(&self) -> &[StampRecord] {
        &self.placed
    }

    /* ---------------- layers ---------------- */

    /// Source pixels and transform of a layer, if it currently has an image.
    pub fn layer(&self, kind: LayerKind) -> Option<(&RgbaImage, Transform)> {
        match kind {
            LayerKind::Avatar => self.avatar.as_ref().map(|a| (&a.processed, self.avatar_tf)),
            LayerKind::Merch => self
                .merch
                .get(self.merch_selected)
                .and_then(|m| m.as_deref())
                .map(|img| (img, self.merch_tf)),
        }
    }

    pub fn transform(&self, kind: LayerKind) -> Transform {
        match kind {
            LayerKind::Avatar => self.avatar_tf,
            LayerKind::Merch => self.merch_tf,
        }
    }

    /// Bottom to top.
    pub fn stacking(&self) -> [LayerKind; 2] {
        if self.caps.avatar_on_top {
            [LayerKind::Merch, LayerKind::Avatar]
        } else {
            [LayerKind::Avatar, LayerKind::Merch]
        }
    }

    pub fn move_layer(&mut self, kind: LayerKind, to: Point) -> bool {
        if !(to.x.is_finite() && to.y.is_finite()) {
            return false;
        }
        let tf = match kind {
            LayerKind::Avatar => &mut self.avatar_tf,
            LayerKind::Merch => &mut self.merch_tf,
        };
        tf.x = to.x;
        tf.y = to.y;
        true
    }

    /// Handle-driven resize: the top-left stays put, the scale is floored at MIN_SCALE.
    pub fn resize_layer(&mut self, kind: LayerKind, scale: f32) -> bool {
        let Some(s) = finite("resize", scale) else { return false };
        let tf = match kind {
            LayerKind::Avatar => &mut self.avatar_tf,
            LayerKind::Merch => &mut self.merch_tf,
        };
        tf.scale = s.max(MIN_SCALE);
        true
    }
}
