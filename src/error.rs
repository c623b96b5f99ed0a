// Error types module
// Library-level failures for asset, configuration, dialog and sound loading

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a file on disk into a usable asset
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure to load or persist settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure to read a dialog line file
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dialog file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to decode or play a sound effect
#[derive(Debug, Error)]
pub enum SoundError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode sound {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    #[error("sound {0} holds no audio")]
    Empty(PathBuf),

    #[error("no audio output: {0}")]
    Stream(#[from] rodio::StreamError),

    #[error("audio playback failed: {0}")]
    Play(#[from] rodio::PlayError),
}
