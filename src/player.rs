// Animation player module
// Sequences the frames of one active animation on a fixed-interval clock

use crate::image_loader::Frame;
use crate::store::{AnimationCatalog, STANDING};
use crate::timer::{Scheduler, TimerKind};
use fastrand::Rng;
use log::{debug, warn};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default playback rate
#[cfg(test)]
pub const DEFAULT_FPS: u32 = 24;

/// Notifications produced by the player, drained by the coordinator in order
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// A new frame should be shown
    FrameChanged(Arc<Frame>),
    /// A non-looping run reached its last frame
    Finished(String),
}

/// The run currently on screen
#[derive(Debug, Clone, PartialEq)]
struct Playback {
    name: String,
    cursor: usize,
    looped: bool,
    finished: bool,
}

pub struct AnimationPlayer {
    catalog: AnimationCatalog,
    /// Directory the catalog is rebuilt from on resize
    source: Option<PathBuf>,
    frame_interval: Duration,
    current: Option<Playback>,
    running: bool,
    events: VecDeque<PlayerEvent>,
}

impl AnimationPlayer {
    pub fn new(catalog: AnimationCatalog, fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            catalog,
            source: None,
            frame_interval: Duration::from_millis(1000 / fps as u64),
            current: None,
            running: false,
            events: VecDeque::new(),
        }
    }

    /// Load the catalog from `dir` and remember it for later resizes
    pub fn load(dir: PathBuf, width: u32, height: u32, fps: u32) -> Self {
        let catalog = AnimationCatalog::load(&dir, width, height);
        let mut player = Self::new(catalog, fps);
        player.source = Some(dir);
        player
    }

    /// Start `name` at `start_frame`.
    ///
    /// Unknown names fall back to the standing pose, then to the first catalog
    /// entry; an empty catalog makes this a no-op. `loop_override` applies to this
    /// run only and leaves the animation's default loop flag untouched.
    pub fn play(
        &mut self,
        name: &str,
        loop_override: Option<bool>,
        start_frame: usize,
        sched: &mut Scheduler,
        now: Instant,
    ) {
        let Some(anim) = self
            .catalog
            .get(name)
            .or_else(|| self.catalog.get(STANDING))
            .or_else(|| self.catalog.first_name().and_then(|n| self.catalog.get(n)))
        else {
            debug!("No animation available for '{}'", name);
            return;
        };

        if anim.name != name {
            debug!("Animation '{}' missing, falling back to '{}'", name, anim.name);
        }

        let cursor = start_frame.min(anim.last_index());
        let playback = Playback {
            name: anim.name.clone(),
            cursor,
            looped: loop_override.unwrap_or(anim.looped),
            finished: false,
        };
        let frame = anim.frames[cursor].clone();

        debug!(
            "Playing '{}' from frame {} (loop: {})",
            playback.name, playback.cursor, playback.looped
        );
        self.current = Some(playback);
        self.events.push_back(PlayerEvent::FrameChanged(frame));

        sched.start_periodic(TimerKind::AnimationFrame, now, self.frame_interval);
        self.running = true;
    }

    /// Play a uniformly chosen animation, skipping interaction-only clips
    pub fn play_random(
        &mut self,
        loop_override: Option<bool>,
        rng: &mut Rng,
        sched: &mut Scheduler,
        now: Instant,
    ) {
        let candidates = self.catalog.random_candidates();
        if candidates.is_empty() {
            return;
        }
        let name = candidates[rng.usize(..candidates.len())].to_string();
        self.play(&name, loop_override, 0, sched, now);
    }

    /// Halt the frame clock
    pub fn stop(&mut self, sched: &mut Scheduler) {
        sched.cancel(TimerKind::AnimationFrame);
        self.running = false;
    }

    /// Advance one frame; called when the frame clock fires
    pub fn tick(&mut self, sched: &mut Scheduler) {
        let Some(playback) = self.current.as_mut() else {
            return;
        };
        if playback.finished {
            return;
        }
        let Some(anim) = self.catalog.get(&playback.name) else {
            return;
        };

        playback.cursor += 1;
        if playback.cursor > anim.last_index() {
            if playback.looped {
                playback.cursor = 0;
            } else {
                playback.cursor = anim.last_index();
                playback.finished = true;
                sched.cancel(TimerKind::AnimationFrame);
                self.running = false;
                self.events
                    .push_back(PlayerEvent::Finished(playback.name.clone()));
                return;
            }
        }

        self.events
            .push_back(PlayerEvent::FrameChanged(anim.frames[playback.cursor].clone()));
    }

    /// Change the loop flag of the current run
    pub fn set_looping(&mut self, looped: bool) {
        if let Some(playback) = self.current.as_mut() {
            playback.looped = looped;
        }
    }

    /// Rebuild the catalog at a new frame size and resume the current run
    pub fn update_size(&mut self, width: u32, height: u32, sched: &mut Scheduler, now: Instant) {
        let Some(dir) = self.source.clone() else {
            warn!("Animation catalog has no source directory, cannot rescale");
            return;
        };
        let catalog = AnimationCatalog::load(&dir, width, height);
        self.replace_catalog(catalog, sched, now);
    }

    /// Swap in a new catalog, replaying the active animation at the same cursor
    pub fn replace_catalog(&mut self, catalog: AnimationCatalog, sched: &mut Scheduler, now: Instant) {
        self.catalog = catalog;
        if let Some(previous) = self.current.take() {
            self.play(&previous.name, Some(previous.looped), previous.cursor, sched, now);
        }
    }

    pub fn pop_event(&mut self) -> Option<PlayerEvent> {
        self.events.pop_front()
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.catalog.contains(name)
    }

    pub fn catalog(&self) -> &AnimationCatalog {
        &self.catalog
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|p| p.name.as_str())
    }

    pub fn current_cursor(&self) -> Option<usize> {
        self.current.as_ref().map(|p| p.cursor)
    }

    pub fn is_looping(&self) -> Option<bool> {
        self.current.as_ref().map(|p| p.looped)
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frame at the current cursor
    #[cfg(test)]
    pub fn current_frame(&self) -> Option<Arc<Frame>> {
        let playback = self.current.as_ref()?;
        let anim = self.catalog.get(&playback.name)?;
        anim.frames.get(playback.cursor).cloned()
    }
}
