// Command line and per-deployment capability configuration.
// Visual: `classic` puts the avatar under the merch, with rotation, stamps and
// centre-anchored scaling, and exports `hohoho.png`. `editor` puts the merch
// under the avatar, adds the wand and lasso tools, has no stamps, and exports
// `merged.png`. A TOML file can override any capability on top of the profile.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::error::Error;
use crate::scene::parse_control;

pub const DEFAULT_TOLERANCE: f32 = 32.0;

#[derive(Parser, Debug)]
#[command(name = "merch-booth", version, about = "Cut out a portrait and dress it up with merch and stamps")]
pub struct Args {
    /// Deployment profile to start from
    #[arg(long, value_enum, default_value_t = Profile::Classic)]
    pub profile: Profile,

    /// TOML file overriding individual capabilities
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Portrait to cut out (reloaded with `O`)
    #[arg(long)]
    pub avatar: Option<PathBuf>,

    /// Directory of selectable merch graphics; the first file is auto-selected
    #[arg(long, default_value = "assets/merch")]
    pub merch_dir: PathBuf,

    /// Directory of stamp graphics
    #[arg(long, default_value = "assets/stamps")]
    pub stamps_dir: PathBuf,

    /// Where exported PNGs are written
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Initial background tolerance (0-200); a value that is not a number keeps the profile's
    #[arg(long)]
    pub tolerance: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Classic,
    Editor,
}

/// Everything that differs between deployments, passed to the scene at start-up.
#[derive(Clone, Debug, PartialEq)]
pub struct Capabilities {
    pub canvas_width: usize,
    pub canvas_height: usize,
    /// Avatar drawn above the merch (and hit-tested first).
    pub avatar_on_top: bool,
    pub rotation: bool,
    pub lasso: bool,
    pub erase: bool,
    pub stamps: bool,
    /// Scale sliders keep the layer centre fixed instead of its top-left corner.
    pub scale_keeps_center: bool,
    /// Re-apply lasso/wand cuts after a tolerance change instead of dropping them.
    pub keep_manual_mask: bool,
    pub tolerance: f32,
    pub export_name: String,
    pub branding: [String; 2],
}

impl Capabilities {
    pub fn for_profile(profile: Profile) -> Self {
        let base = Self {
            canvas_width: 800,
            canvas_height: 600,
            avatar_on_top: false,
            rotation: true,
            lasso: false,
            erase: false,
            stamps: true,
            scale_keeps_center: true,
            keep_manual_mask: false,
            tolerance: DEFAULT_TOLERANCE,
            export_name: "hohoho.png".into(),
            branding: ["Advent of Code".into(), "0xffff&2025".into()],
        };
        match profile {
            Profile::Classic => base,
            Profile::Editor => Self {
                avatar_on_top: true,
                rotation: false,
                lasso: true,
                erase: true,
                stamps: false,
                scale_keeps_center: false,
                export_name: "merged.png".into(),
                ..base
            },
        }
    }

    /// Profile defaults, then the optional TOML file, then `--tolerance`.
    pub fn load(args: &Args) -> Result<Self, Error> {
        let mut caps = Self::for_profile(args.profile);
        if let Some(path) = &args.config {
            let overrides = Overrides::read(path)?;
            log::info!("applying capability overrides from {}", path.display());
            overrides.apply(&mut caps);
        }
        if let Some(raw) = &args.tolerance {
            caps.tolerance = parse_control(raw, caps.tolerance);
        }
        caps.validate()?;
        Ok(caps)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(Error::Config(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if !self.tolerance.is_finite() {
            return Err(Error::Config("tolerance must be a number".into()));
        }
        if self.export_name.trim().is_empty() {
            return Err(Error::Config("export_name must not be empty".into()));
        }
        Ok(())
    }
}

/// Field-by-field overrides as written in the TOML file.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    canvas_width: Option<usize>,
    canvas_height: Option<usize>,
    avatar_on_top: Option<bool>,
    rotation: Option<bool>,
    lasso: Option<bool>,
    erase: Option<bool>,
    stamps: Option<bool>,
    scale_keeps_center: Option<bool>,
    keep_manual_mask: Option<bool>,
    tolerance: Option<f32>,
    export_name: Option<String>,
    branding: Option<[String; 2]>,
}

impl Overrides {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn read(path: &Path) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn apply(self, caps: &mut Capabilities) {
        macro_rules! take {
            ($($field:ident),*) => {
                $( if let Some(v) = self.$field { caps.$field = v; } )*
            };
        }
        take!(
            canvas_width,
            canvas_height,
            avatar_on_top,
            rotation,
            lasso,
            erase,
            stamps,
            scale_keeps_center,
            keep_manual_mask,
            tolerance,
            export_name,
            branding
        );
    }
}
