// Sound module
// Decodes short effects once at startup and plays them by logical name through rodio

use crate::error::SoundError;
use log::{debug, info, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Accepted sound file extensions
const SOUND_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg"];

/// Logical sound keys used by the pet
pub const SOUND_CLICK: &str = "click";
pub const SOUND_WALK: &str = "walk";
pub const SOUND_DIALOG: &str = "dialog";

/// Effect playback as seen by the pet. Implementations never fail loudly.
pub trait SoundPlayer {
    fn play(&mut self, name: &str);
    /// Volume in 0.0 - 1.0; out-of-range values are clamped
    fn set_volume(&mut self, volume: f32);
    fn set_enabled(&mut self, enabled: bool);
    fn stop_all(&mut self);
}

/// Used when no sounds or no audio device are available
#[derive(Debug, Default)]
pub struct NullSound;

impl SoundPlayer for NullSound {
    fn play(&mut self, name: &str) {
        debug!("Sound '{}' skipped (no audio)", name);
    }
    fn set_volume(&mut self, _volume: f32) {}
    fn set_enabled(&mut self, _enabled: bool) {}
    fn stop_all(&mut self) {}
}

/// A decoded effect, replayed from memory
#[derive(Debug, Clone)]
pub struct Clip {
    channels: u16,
    sample_rate: u32,
    samples: Arc<[i16]>,
}

impl Clip {
    pub fn decode(path: &Path) -> Result<Self, SoundError> {
        let file = File::open(path).map_err(|source| SoundError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|source| SoundError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<i16> = decoder.collect();
        if channels == 0 || sample_rate == 0 || samples.is_empty() {
            return Err(SoundError::Empty(path.to_path_buf()));
        }

        Ok(Self {
            channels,
            sample_rate,
            samples: samples.into(),
        })
    }

    fn source(&self) -> SamplesBuffer<i16> {
        SamplesBuffer::new(self.channels, self.sample_rate, self.samples.to_vec())
    }
}

/// Somewhere clips can be played
pub trait AudioOutput {
    fn play(&mut self, clip: &Clip, volume: f32) -> Result<(), SoundError>;
    /// Applies to effects still playing
    fn set_volume(&mut self, volume: f32);
    fn stop_all(&mut self);
}

/// The default audio device; one sink per effect so effects overlap
pub struct DeviceOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sinks: Vec<Sink>,
}

impl DeviceOutput {
    pub fn open() -> Result<Self, SoundError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            sinks: Vec::new(),
        })
    }
}

impl AudioOutput for DeviceOutput {
    fn play(&mut self, clip: &Clip, volume: f32) -> Result<(), SoundError> {
        self.sinks.retain(|sink| !sink.empty());

        let sink = Sink::try_new(&self.handle)?;
        sink.set_volume(volume);
        sink.append(clip.source());
        self.sinks.push(sink);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        for sink in &self.sinks {
            sink.set_volume(volume);
        }
    }

    fn stop_all(&mut self) {
        for sink in self.sinks.drain(..) {
            sink.stop();
        }
    }
}

/// Plays clips by name. The first output failure silences it for the rest of the session.
pub struct RodioSound {
    clips: HashMap<String, Clip>,
    output: Option<Box<dyn AudioOutput>>,
    enabled: bool,
    volume: f32,
}

impl RodioSound {
    pub fn new(clips: HashMap<String, Clip>, output: Box<dyn AudioOutput>) -> Self {
        Self {
            clips,
            output: Some(output),
            enabled: true,
            volume: 0.5,
        }
    }

    #[cfg(test)]
    pub fn is_available(&self) -> bool {
        self.output.is_some()
    }
}

impl SoundPlayer for RodioSound {
    fn play(&mut self, name: &str) {
        if !self.enabled {
            return;
        }
        let Some(output) = self.output.as_mut() else {
            return;
        };
        let Some(clip) = self.clips.get(name) else {
            debug!("No sound named '{}'", name);
            return;
        };

        if let Err(e) = output.play(clip, self.volume) {
            warn!("{}, sound disabled for this session", e);
            self.output = None;
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(output) = self.output.as_mut() {
            output.set_volume(self.volume);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn stop_all(&mut self) {
        if let Some(output) = self.output.as_mut() {
            output.stop_all();
        }
    }
}

/// Map sound file stems in `dir` to their paths
pub fn discover_sounds(dir: &Path) -> HashMap<String, PathBuf> {
    let mut sounds = HashMap::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Sound directory {} unavailable: {}", dir.display(), e);
            return sounds;
        }
    };

    for path in entries.flatten().map(|e| e.path()) {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        if !ext.is_some_and(|e| SOUND_EXTENSIONS.contains(&e.as_str())) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            sounds.insert(stem.to_string(), path.clone());
        }
    }

    info!("Found {} sounds in {}", sounds.len(), dir.display());
    sounds
}

/// Decode every sound in `dir`, skipping files that fail
pub fn load_clips(dir: &Path) -> HashMap<String, Clip> {
    discover_sounds(dir)
        .into_iter()
        .filter_map(|(name, path)| match Clip::decode(&path) {
            Ok(clip) => Some((name, clip)),
            Err(e) => {
                warn!("Skipping sound: {}", e);
                None
            }
        })
        .collect()
}

/// Build the sound player for `dir`, degrading to silence without sounds or an audio device
pub fn open(dir: &Path) -> Box<dyn SoundPlayer> {
    let clips = load_clips(dir);
    if clips.is_empty() {
        return Box::new(NullSound);
    }

    match DeviceOutput::open() {
        Ok(output) => {
            info!("Audio output ready with {} sounds", clips.len());
            Box::new(RodioSound::new(clips, Box::new(output)))
        }
        Err(e) => {
            warn!("{}, sound disabled", e);
            Box::new(NullSound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// 16-bit mono PCM WAV holding `samples`
    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&16000u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    fn clip() -> Clip {
        Clip {
            channels: 1,
            sample_rate: 8000,
            samples: vec![0i16; 16].into(),
        }
    }

    #[derive(Default)]
    struct Log {
        plays: Vec<f32>,
        volumes: Vec<f32>,
        stops: usize,
    }

    /// Records calls; fails every play when `broken`
    struct FakeOutput {
        log: Rc<RefCell<Log>>,
        broken: bool,
    }

    impl AudioOutput for FakeOutput {
        fn play(&mut self, _clip: &Clip, volume: f32) -> Result<(), SoundError> {
            self.log.borrow_mut().plays.push(volume);
            if self.broken {
                Err(SoundError::Empty(PathBuf::from("device")))
            } else {
                Ok(())
            }
        }
        fn set_volume(&mut self, volume: f32) {
            self.log.borrow_mut().volumes.push(volume);
        }
        fn stop_all(&mut self) {
            self.log.borrow_mut().stops += 1;
        }
    }

    fn player(broken: bool) -> (RodioSound, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let output = FakeOutput {
            log: log.clone(),
            broken,
        };
        let clips = HashMap::from([(SOUND_CLICK.to_string(), clip())]);
        (RodioSound::new(clips, Box::new(output)), log)
    }

    #[test]
    fn test_discover_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["click.wav", "walk.OGG", "dialog.mp3", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let sounds = discover_sounds(dir.path());
        assert_eq!(sounds.len(), 3);
        assert!(sounds.contains_key(SOUND_CLICK));
        assert!(sounds.contains_key(SOUND_WALK));
        assert!(sounds.contains_key(SOUND_DIALOG));
    }

    #[test]
    fn test_decode_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        fs::write(&path, wav_bytes(&[0, 1000, -1000, 0])).unwrap();

        let clip = Clip::decode(&path).unwrap();
        assert_eq!(clip.channels, 1);
        assert_eq!(clip.sample_rate, 8000);
        assert_eq!(clip.samples.len(), 4);
    }

    #[test]
    fn test_load_clips_skips_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("click.wav"), wav_bytes(&[1, 2, 3])).unwrap();
        fs::write(dir.path().join("walk.ogg"), b"not audio").unwrap();

        let clips = load_clips(dir.path());
        assert_eq!(clips.len(), 1);
        assert!(clips.contains_key(SOUND_CLICK));
    }

    #[test]
    fn test_failing_output_degrades_permanently() {
        let (mut player, log) = player(true);
        assert!(player.is_available());

        // Unknown names do not touch the output
        player.play("missing");
        assert!(player.is_available());

        for _ in 0..5 {
            player.play(SOUND_CLICK);
        }
        assert!(!player.is_available());
        assert_eq!(log.borrow().plays.len(), 1);

        player.set_volume(0.8);
        player.stop_all();
        assert!(log.borrow().volumes.is_empty());
        assert_eq!(log.borrow().stops, 0);
    }

    #[test]
    fn test_disabled_player_stays_silent() {
        let (mut player, log) = player(false);
        player.set_enabled(false);
        player.play(SOUND_CLICK);
        assert!(log.borrow().plays.is_empty());

        player.set_enabled(true);
        player.play(SOUND_CLICK);
        assert_eq!(log.borrow().plays.len(), 1);
    }

    #[test]
    fn test_volume_clamped_and_applied() {
        let (mut player, log) = player(false);
        player.set_volume(1.7);
        player.play(SOUND_CLICK);
        player.set_volume(-0.2);
        player.play(SOUND_CLICK);
        player.stop_all();

        let log = log.borrow();
        assert_eq!(log.volumes, vec![1.0, 0.0]);
        assert_eq!(log.plays, vec![1.0, 0.0]);
        assert_eq!(log.stops, 1);
    }
}
