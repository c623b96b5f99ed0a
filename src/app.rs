// Application state module
// Assembles the pet from persisted settings, command line overrides and assets

use crate::behavior::BehaviorController;
use crate::cli::ParsedArgs;
use crate::config::{AssetPaths, Config, JsonFileStore};
use crate::dialog::DialogBook;
use crate::pet::{self, Pet};
use crate::player::AnimationPlayer;
use crate::sound;
use anyhow::{bail, Result};
use fastrand::Rng;
use log::{info, warn};

/// Build the pet described by `args`
pub fn build_pet(args: &ParsedArgs) -> Result<Pet> {
    if args.assets_dir.exists() && !args.assets_dir.is_dir() {
        bail!("Assets path {} is not a directory", args.assets_dir.display());
    }

    let mut config = Config::open(Box::new(JsonFileStore::new(&args.config_path)));
    if args.has_overrides() {
        config.update(|settings| args.apply(settings));
    }
    let settings = config.settings().clone();

    let paths = AssetPaths::new(&args.assets_dir, &settings.character);
    let animations_dir = paths.animations_dir();
    if !animations_dir.is_dir() {
        warn!(
            "Animation directory {} not found, showing placeholder",
            animations_dir.display()
        );
    }

    let (width, height) = pet::scaled_size(settings.scale);
    let player = AnimationPlayer::load(animations_dir, width, height, args.fps);
    info!(
        "Character '{}': {} animations at {}x{}",
        settings.character,
        player.catalog().len(),
        width,
        height
    );

    let behavior = BehaviorController::new(width, Rng::new());
    let sound = sound::open(&paths.sounds_dir());
    let dialogs = DialogBook::load(&paths.dialog_files());

    Ok(Pet::new(player, behavior, config, sound, dialogs, Rng::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnimationMode, ConfigStore};
    use image::RgbaImage;
    use std::fs;
    use std::path::Path;
    use std::time::Instant;

    fn args(assets: &Path, config: &Path) -> ParsedArgs {
        ParsedArgs {
            assets_dir: assets.to_path_buf(),
            config_path: config.to_path_buf(),
            character: None,
            scale: None,
            mode: None,
            pos_x: None,
            pos_y: None,
            fps: 24,
            mute: false,
            no_dialog: false,
        }
    }

    #[test]
    fn test_builds_pet_from_assets() {
        let dir = tempfile::tempdir().unwrap();
        let anim_dir = dir.path().join("characters/cat/animations/standing");
        fs::create_dir_all(&anim_dir).unwrap();
        RgbaImage::new(4, 4).save(anim_dir.join("0.png")).unwrap();

        let config_path = dir.path().join("config.json");
        let mut args = args(dir.path(), &config_path);
        args.character = Some("cat".into());
        args.scale = Some(0.5);
        args.mode = Some(AnimationMode::Keep);

        let mut pet = build_pet(&args).unwrap();
        pet.start(Instant::now());
        assert_eq!(pet.player().current_name(), Some("standing"));
        assert_eq!(pet.size(), (175, 210));
        let frame = pet.player().current_frame().unwrap();
        assert_eq!((frame.width, frame.height), (175, 210));

        // Overrides are persisted
        let saved = JsonFileStore::new(&config_path).load().unwrap().unwrap();
        assert_eq!(saved.character, "cat");
        assert_eq!(saved.animation_mode, AnimationMode::Keep);
    }

    #[test]
    fn test_missing_assets_still_builds() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let mut pet = build_pet(&args(&dir.path().join("absent"), &config_path)).unwrap();
        pet.start(Instant::now());
        assert!(pet.player().catalog().is_empty());
        // Nothing overridden, nothing written
        assert!(!config_path.exists());
    }

    #[test]
    fn test_assets_path_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("assets");
        fs::write(&file, b"").unwrap();
        assert!(build_pet(&args(&file, &dir.path().join("config.json"))).is_err());
    }
}
