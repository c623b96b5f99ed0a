// Animation store module
// Discovers directory-backed frame sequences and keeps them keyed by name

use crate::image_loader::{self, Frame};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Idle pose, also the fallback for unknown names
pub const STANDING: &str = "standing";
/// Played while walking in either direction
pub const WALKING: &str = "cute";
/// Mapped to the dragging state
pub const CONFUSED: &str = "confused";
/// Mapped to the brief clicking state
pub const CLICKING: &str = "annoyed-short";
/// Pose held while the pet is being dragged
pub const DRAG: &str = "drag";
/// Special reaction to rapid clicking
pub const ANNOYED: &str = "annoyed";
pub const CLICK: &str = "click";

/// Interaction clips that play once unless told otherwise
const ONE_SHOT_NAMES: &[&str] = &[CLICK, DRAG, ANNOYED];

/// Never picked by a random choice
const RANDOM_EXCLUDED: &[&str] = &[DRAG, ANNOYED];

/// Hidden from the animation menu
const MENU_EXCLUDED: &[&str] = &[DRAG, ANNOYED, CLICK];

/// Default loop flag for an animation discovered on disk
pub fn default_loop(name: &str) -> bool {
    !ONE_SHOT_NAMES.contains(&name)
}

/// A named frame sequence
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<Arc<Frame>>,
    /// Loop flag used when a play request carries no override
    pub looped: bool,
}

impl Animation {
    pub fn new(name: impl Into<String>, frames: Vec<Arc<Frame>>) -> Self {
        let name = name.into();
        let looped = default_loop(&name);
        Self {
            name,
            frames,
            looped,
        }
    }

    /// Index of the last frame
    pub fn last_index(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.frames.len()
    }
}

/// All animations available to the player
#[derive(Debug, Clone, Default)]
pub struct AnimationCatalog {
    animations: BTreeMap<String, Animation>,
}

impl AnimationCatalog {
    /// Scan `dir` for one subdirectory per animation, scaling frames to `width` x `height`
    pub fn load(dir: &Path, width: u32, height: u32) -> Self {
        let mut catalog = Self::default();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Animation directory {} unavailable: {}", dir.display(), e);
                return catalog;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!("Skipping animation directory with non UTF-8 name: {}", path.display());
                continue;
            };

            let frames = load_frames(&path, width, height);
            if frames.is_empty() {
                warn!("Animation '{}' has no usable frames, skipping", name);
                continue;
            }
            debug!("Loaded animation '{}' with {} frames", name, frames.len());
            catalog.insert(Animation::new(name, frames));
        }

        info!(
            "Loaded {} animations from {} at {}x{}",
            catalog.len(),
            dir.display(),
            width,
            height
        );
        catalog
    }

    /// Add an animation, replacing one with the same name. Empty animations are rejected.
    pub fn insert(&mut self, animation: Animation) -> bool {
        if animation.frames.is_empty() {
            return false;
        }
        self.animations.insert(animation.name.clone(), animation);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Names in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.animations.keys().map(String::as_str).collect()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.animations.keys().next().map(String::as_str)
    }

    /// Names eligible for a random pick; everything when only excluded clips exist
    pub fn random_candidates(&self) -> Vec<&str> {
        let normal: Vec<&str> = self
            .names()
            .into_iter()
            .filter(|n| !RANDOM_EXCLUDED.contains(n))
            .collect();
        if normal.is_empty() {
            self.names()
        } else {
            normal
        }
    }

    /// Names offered for manual selection, sorted
    pub fn menu_names(&self) -> Vec<&str> {
        let shown: Vec<&str> = self
            .names()
            .into_iter()
            .filter(|n| !MENU_EXCLUDED.contains(n))
            .collect();
        if shown.is_empty() {
            self.names()
        } else {
            shown
        }
    }
}

/// Decode every frame file in `dir`, sorted by file name. Unreadable files are skipped.
fn load_frames(dir: &Path, width: u32, height: u32) -> Vec<Arc<Frame>> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && image_loader::is_frame_file(p))
            .collect(),
        Err(e) => {
            warn!("Failed to list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    files
        .iter()
        .filter_map(|file| match image_loader::load_frame(file, width, height) {
            Ok(frame) => Some(Arc::new(frame)),
            Err(e) => {
                warn!("Skipping frame: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(path: &Path, shade: u8) {
        RgbaImage::from_pixel(4, 4, Rgba([shade, 0, 0, 255]))
            .save(path)
            .unwrap();
    }

    fn frames(n: usize) -> Vec<Arc<Frame>> {
        (0..n).map(|_| Arc::new(Frame::blank(1, 1))).collect()
    }

    #[test]
    fn test_load_scans_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let standing = dir.path().join("standing");
        fs::create_dir(&standing).unwrap();
        write_png(&standing.join("001.png"), 10);
        write_png(&standing.join("002.png"), 20);
        fs::write(dir.path().join("readme.txt"), "not an animation").unwrap();

        let catalog = AnimationCatalog::load(dir.path(), 8, 8);
        assert_eq!(catalog.names(), vec!["standing"]);
        let anim = catalog.get("standing").unwrap();
        assert_eq!(anim.len(), 2);
        assert_eq!(anim.frames[0].width, 8);
        assert!(anim.looped);
    }

    #[test]
    fn test_frames_sorted_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let anim_dir = dir.path().join("wave");
        fs::create_dir(&anim_dir).unwrap();
        write_png(&anim_dir.join("b.png"), 200);
        write_png(&anim_dir.join("a.png"), 100);
        write_png(&anim_dir.join("c.png"), 250);

        let catalog = AnimationCatalog::load(dir.path(), 4, 4);
        let anim = catalog.get("wave").unwrap();
        // Red lands in byte 2 of BGRA
        let reds: Vec<u8> = anim.frames.iter().map(|f| f.bgra_data[2]).collect();
        assert_eq!(reds, vec![100, 200, 250]);
    }

    #[test]
    fn test_corrupt_frames_skipped_and_empty_dirs_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let mixed = dir.path().join("mixed");
        fs::create_dir(&mixed).unwrap();
        write_png(&mixed.join("001.png"), 1);
        fs::write(mixed.join("002.png"), b"garbage").unwrap();
        fs::write(mixed.join("003.txt"), b"ignored").unwrap();

        let broken = dir.path().join("broken");
        fs::create_dir(&broken).unwrap();
        fs::write(broken.join("001.png"), b"garbage").unwrap();

        fs::create_dir(dir.path().join("empty")).unwrap();

        let catalog = AnimationCatalog::load(dir.path(), 4, 4);
        assert_eq!(catalog.names(), vec!["mixed"]);
        assert_eq!(catalog.get("mixed").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_directory_gives_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AnimationCatalog::load(&dir.path().join("absent"), 4, 4);
        assert!(catalog.is_empty());
        assert_eq!(catalog.first_name(), None);
    }

    #[test]
    fn test_default_loop_flags() {
        assert!(!default_loop(CLICK));
        assert!(!default_loop(DRAG));
        assert!(!default_loop(ANNOYED));
        assert!(default_loop(STANDING));
        assert!(default_loop(CLICKING));
    }

    #[test]
    fn test_insert_rejects_empty() {
        let mut catalog = AnimationCatalog::default();
        assert!(!catalog.insert(Animation::new("ghost", Vec::new())));
        assert!(catalog.insert(Animation::new("solid", frames(2))));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_random_candidates_exclude_interaction_clips() {
        let mut catalog = AnimationCatalog::default();
        for name in [STANDING, WALKING, DRAG, ANNOYED] {
            catalog.insert(Animation::new(name, frames(1)));
        }
        assert_eq!(catalog.random_candidates(), vec![WALKING, STANDING]);

        let mut only_special = AnimationCatalog::default();
        only_special.insert(Animation::new(DRAG, frames(1)));
        assert_eq!(only_special.random_candidates(), vec![DRAG]);
    }

    #[test]
    fn test_menu_names_hide_interaction_clips() {
        let mut catalog = AnimationCatalog::default();
        for name in [STANDING, CLICK, DRAG, "wave"] {
            catalog.insert(Animation::new(name, frames(1)));
        }
        assert_eq!(catalog.menu_names(), vec![STANDING, "wave"]);
    }
}
