// Asset plumbing: gallery directory listing, background image decodes and PNG export.
// Decodes run on the rayon pool (one worker per core) and report back over a
// channel that the UI loop drains once per frame, so the window never stalls on a big JPEG.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use image::RgbaImage;

use crate::error::Error;
use crate::types::FrameBuffer;

const EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "avif"];

/// Image files directly inside `dir`, sorted and de-duplicated by file name.
/// A missing or unreadable directory is an empty gallery.
pub fn list_gallery(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("gallery {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut by_name = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if !is_image {
            continue;
        }
        if let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) {
            by_name.entry(name).or_insert(path);
        }
    }
    log::info!("gallery {}: {} images", dir.display(), by_name.len());
    by_name.into_values().collect()
}

/// Decode any supported image into 8-bit RGBA.
pub fn decode(path: &Path) -> Result<RgbaImage, Error> {
    let img = image::open(path).map_err(|source| Error::Decode { path: path.to_path_buf(), source })?;
    Ok(img.to_rgba8())
}

/// Where a decoded image goes once it arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Avatar,
    Merch(usize),
    Stamp(usize),
}

pub struct Loaded {
    pub slot: Slot,
    pub path: PathBuf,
    pub result: Result<RgbaImage, Error>,
}

/// Fire-and-forget decode jobs. Results come back in arrival order, so when
/// two avatar loads overlap the later arrival simply replaces the earlier one.
pub struct Loader {
    tx: Sender<Loaded>,
    rx: Receiver<Loaded>,
    pending: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, pending: 0 }
    }

    pub fn request(&mut self, slot: Slot, path: PathBuf) {
        log::debug!("decode {slot:?} {}", path.display());
        let tx = self.tx.clone();
        self.pending += 1;
        rayon::spawn(move || {
            let result = decode(&path);
            // The receiver only disappears when the app is shutting down.
            let _ = tx.send(Loaded { slot, path, result });
        });
    }

    /// Queue every file of a gallery, tagging each with its list position.
    pub fn request_gallery(&mut self, files: Vec<PathBuf>, slot: impl Fn(usize) -> Slot) {
        for (i, path) in files.into_iter().enumerate() {
            self.request(slot(i), path);
        }
    }

    /// Everything that finished since the last call. Never blocks.
    pub fn drain(&mut self) -> Vec<Loaded> {
        let done: Vec<Loaded> = self.rx.try_iter().collect();
        self.pending = self.pending.saturating_sub(done.len());
        done
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}

/// Write the composited surface as `dir/name`. Returns the written path.
pub fn export_png(fb: &FrameBuffer, dir: &Path, name: &str) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fb.to_rgba()
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|source| Error::Export { path: path.clone(), source })?;
    log::info!("exported {}x{} to {}", fb.width, fb.height, path.display());
    Ok(path)
}
