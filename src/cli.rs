// Command line interface module
// Handles parsing of command line arguments into startup overrides

use crate::config::{default_config_path, AnimationMode, Settings};
use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

/// rpet - A desktop pet for Wayland
#[derive(Parser, Debug)]
#[command(name = "rpet")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding `characters/`, `sounds/` and `dialogs.json`
    #[arg(short, long, value_name = "DIR", default_value = "assets")]
    pub assets: PathBuf,

    /// Settings file (defaults to $XDG_CONFIG_HOME/rpet/config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Character to load from the assets directory
    #[arg(long)]
    pub character: Option<String>,

    /// Scale factor for the pet (e.g., 0.5 for half size, 2.0 for double)
    #[arg(short, long, value_parser = parse_scale)]
    pub scale: Option<f32>,

    /// What to do when an animation finishes on its own
    #[arg(short, long, value_enum)]
    pub mode: Option<AnimationMode>,

    /// Initial X position of the pet
    #[arg(short = 'x', long, allow_negative_numbers = true)]
    pub pos_x: Option<i32>,

    /// Initial Y position of the pet
    #[arg(short = 'y', long, allow_negative_numbers = true)]
    pub pos_y: Option<i32>,

    /// Animation frame rate
    #[arg(long, default_value = "24")]
    pub fps: u32,

    /// Start with sound disabled
    #[arg(long, default_value = "false")]
    pub mute: bool,

    /// Start with speech bubbles disabled
    #[arg(long, default_value = "false")]
    pub no_dialog: bool,
}

/// Parsed arguments with resolved paths
#[derive(Debug)]
pub struct ParsedArgs {
    pub assets_dir: PathBuf,
    pub config_path: PathBuf,
    pub character: Option<String>,
    pub scale: Option<f32>,
    pub mode: Option<AnimationMode>,
    pub pos_x: Option<i32>,
    pub pos_y: Option<i32>,
    pub fps: u32,
    pub mute: bool,
    pub no_dialog: bool,
}

impl ParsedArgs {
    /// Whether any flag overrides a persisted setting
    pub fn has_overrides(&self) -> bool {
        self.character.is_some()
            || self.scale.is_some()
            || self.mode.is_some()
            || self.pos_x.is_some()
            || self.pos_y.is_some()
            || self.mute
            || self.no_dialog
    }

    /// Apply command line overrides on top of persisted settings
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(character) = &self.character {
            settings.character = character.clone();
        }
        if let Some(scale) = self.scale {
            settings.scale = scale;
        }
        if let Some(mode) = self.mode {
            settings.animation_mode = mode;
        }
        if let Some(x) = self.pos_x {
            settings.pet_x = x;
        }
        if let Some(y) = self.pos_y {
            settings.pet_y = y;
        }
        if self.mute {
            settings.sound_enabled = false;
        }
        if self.no_dialog {
            settings.dialog_enabled = false;
        }
    }
}

/// Parse scale value and ensure it's within a usable range
fn parse_scale(s: &str) -> Result<f32, String> {
    let scale: f32 = s.parse().map_err(|_| "Invalid scale value")?;
    if !(0.1..=4.0).contains(&scale) {
        return Err("Scale must be between 0.1 and 4.0".to_string());
    }
    Ok(scale)
}

/// Parse command line arguments
pub fn parse_args() -> Result<ParsedArgs> {
    resolve(Args::parse())
}

fn resolve(args: Args) -> Result<ParsedArgs> {
    if args.fps == 0 || args.fps > 120 {
        bail!("Frame rate must be between 1 and 120, got {}", args.fps);
    }

    Ok(ParsedArgs {
        assets_dir: args.assets,
        config_path: args.config.unwrap_or_else(default_config_path),
        character: args.character,
        scale: args.scale,
        mode: args.mode,
        pos_x: args.pos_x,
        pos_y: args.pos_y,
        fps: args.fps,
        mute: args.mute,
        no_dialog: args.no_dialog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<ParsedArgs> {
        let args = Args::try_parse_from(std::iter::once("rpet").chain(argv.iter().copied()))?;
        resolve(args)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.assets_dir, PathBuf::from("assets"));
        assert_eq!(args.fps, 24);
        assert!(!args.has_overrides());
    }

    #[test]
    fn test_overrides_applied_to_settings() {
        let args = parse(&[
            "--character", "cat", "-s", "1.5", "--mode", "keep", "-x", "10", "-y", "-20", "--mute",
        ])
        .unwrap();
        assert!(args.has_overrides());

        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings.character, "cat");
        assert_eq!(settings.scale, 1.5);
        assert_eq!(settings.animation_mode, AnimationMode::Keep);
        assert_eq!((settings.pet_x, settings.pet_y), (10, -20));
        assert!(!settings.sound_enabled);
        assert!(settings.dialog_enabled);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse(&["--scale", "9"]).is_err());
        assert!(parse(&["--scale", "big"]).is_err());
        assert!(parse(&["--fps", "0"]).is_err());
        assert!(parse(&["--mode", "sometimes"]).is_err());
    }
}
