// Dialog module
// Speech bubble lines and bubble placement around the pet

use crate::error::DialogError;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a bubble stays visible
pub const BUBBLE_DURATION: Duration = Duration::from_millis(3000);

/// Maximum width of bubble text before wrapping
pub const BUBBLE_MAX_TEXT_WIDTH: u32 = 200;

/// Gap between the pet and its bubble
const BUBBLE_GAP: i32 = 10;

const DEFAULT_LINES: &[&str] = &[
    "Let's do our best today!",
    "Nice to meet you.",
    "Want to go stargazing later?",
    "The night sky looks beautiful.",
    "I'll stay right here with you.",
    "Anything I can help with?",
    "Lovely weather today~",
    "Remember to take a break.",
    "Even a small light can push back the dark.",
    "Whatever happens, I won't give up.",
];

/// Screen rectangle a bubble is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Lines the pet can say
#[derive(Debug, Clone)]
pub struct DialogBook {
    lines: Vec<String>,
}

impl DialogBook {
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn defaults() -> Self {
        Self::from_lines(DEFAULT_LINES.iter().map(|s| s.to_string()).collect())
    }

    /// Read the first dialog file that holds a JSON array of strings
    pub fn load(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match read_lines(path) {
                Ok(lines) => {
                    info!("Loaded {} dialog lines from {}", lines.len(), path.display());
                    return Self::from_lines(lines);
                }
                Err(e) => warn!("Ignoring dialog file {}: {}", path.display(), e),
            }
        }
        Self::defaults()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn random_line(&self, rng: &mut fastrand::Rng) -> Option<&str> {
        if self.lines.is_empty() {
            return None;
        }
        Some(&self.lines[rng.usize(..self.lines.len())])
    }
}

/// Parse a JSON array of strings
fn read_lines(path: &Path) -> Result<Vec<String>, DialogError> {
    let text = fs::read_to_string(path).map_err(|source| DialogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DialogError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Top-left corner for a `width` x `height` bubble: centered above the anchor,
/// or below it when there is no room above.
pub fn bubble_origin(anchor: Anchor, width: u32, height: u32) -> (i32, i32) {
    let x = anchor.x + anchor.width as i32 / 2 - width as i32 / 2;
    let mut y = anchor.y - height as i32 - BUBBLE_GAP;
    if y < 0 {
        y = anchor.y + anchor.height as i32 + BUBBLE_GAP;
    }
    (x, y)
}
