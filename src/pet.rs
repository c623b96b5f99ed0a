// Pet module
// Coordinates behavior, playback and pointer input into what the pet shows and does

use crate::behavior::{BehaviorController, BehaviorEvent, BehaviorState};
use crate::config::{AnimationMode, Config, Settings};
use crate::dialog::{Anchor, DialogBook, BUBBLE_DURATION};
use crate::image_loader::{self, Frame};
use crate::menu::MenuAction;
use crate::player::{AnimationPlayer, PlayerEvent};
use crate::sound::{SoundPlayer, SOUND_CLICK, SOUND_DIALOG, SOUND_WALK};
use crate::store::{ANNOYED, DRAG, STANDING};
use crate::timer::{Scheduler, TimerKind};
use fastrand::Rng;
use log::{debug, info};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pet size at 100% scale
pub const BASE_WIDTH: u32 = 350;
pub const BASE_HEIGHT: u32 = 420;

/// Manhattan distance the pointer must travel before a press becomes a drag
const DRAG_THRESHOLD: i32 = 5;

/// Rolling window for counting rapid clicks
const CLICK_WINDOW: Duration = Duration::from_millis(2000);

/// Clicks within the window that make the pet annoyed
const ANNOYED_CLICKS: u32 = 3;

/// Double-click detection threshold
const DOUBLE_CLICK_THRESHOLD: Duration = Duration::from_millis(300);
const DOUBLE_CLICK_DISTANCE: f64 = 10.0;

/// Volume change per menu step or scroll notch
pub const VOLUME_STEP: f32 = 0.1;

/// Requests for the presentation shell, drained after every call into the pet
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Render(Arc<Frame>),
    MoveWindow { x: i32, y: i32 },
    ShowBubble { text: String, anchor: Anchor },
    HideBubble,
    Resize { width: u32, height: u32 },
    SetVisible(bool),
    Quit,
}

/// Playback captured when an interruption begins
#[derive(Debug, Clone, PartialEq)]
pub struct SavedAnimationState {
    pub name: String,
    pub cursor: usize,
    pub looped: bool,
    pub click_triggered: bool,
}

/// A held left button
#[derive(Debug, Clone, Copy)]
struct PointerHold {
    press_pos: (i32, i32),
    /// Pointer position relative to the pet's top-left corner at press time
    grab_offset: (i32, i32),
    dragging: bool,
}

pub struct Pet {
    player: AnimationPlayer,
    behavior: BehaviorController,
    sched: Scheduler,
    config: Config,
    sound: Box<dyn SoundPlayer>,
    dialogs: DialogBook,
    rng: Rng,
    commands: VecDeque<ShellCommand>,

    size: (u32, u32),
    visible: bool,
    bubble_visible: bool,

    hold: Option<PointerHold>,
    last_press: Option<(Instant, (i32, i32))>,

    click_count: u32,
    /// Latched while the annoyed reaction plays
    special_reaction: bool,
    /// Whether the current animation was started by a click
    click_triggered: bool,
    saved: Option<SavedAnimationState>,
    quit: bool,
}

impl Pet {
    pub fn new(
        player: AnimationPlayer,
        mut behavior: BehaviorController,
        config: Config,
        mut sound: Box<dyn SoundPlayer>,
        dialogs: DialogBook,
        rng: Rng,
    ) -> Self {
        let mut sched = Scheduler::new();
        let settings = config.settings().clone();
        let size = scaled_size(settings.scale);

        behavior.update_pet_width(size.0);
        behavior.set_position(settings.pet_x, settings.pet_y);
        behavior.set_enabled(settings.auto_walk, &mut sched);
        sound.set_enabled(settings.sound_enabled);
        sound.set_volume(settings.volume);

        Self {
            player,
            behavior,
            sched,
            config,
            sound,
            dialogs,
            rng,
            commands: VecDeque::new(),
            size,
            visible: true,
            bubble_visible: false,
            hold: None,
            last_press: None,
            click_count: 0,
            special_reaction: false,
            click_triggered: false,
            saved: None,
            quit: false,
        }
    }

    /// Show the pet at its saved position and begin idling
    pub fn start(&mut self, now: Instant) {
        let (x, y) = self.behavior.position();
        self.commands.push_back(ShellCommand::MoveWindow { x, y });

        if self.player.catalog().is_empty() {
            info!("No animations loaded, showing placeholder");
            let frame = image_loader::placeholder_frame(self.size.0, self.size.1);
            self.commands.push_back(ShellCommand::Render(Arc::new(frame)));
        } else if self.player.has_animation(STANDING) {
            self.player.play(STANDING, None, 0, &mut self.sched, now);
        } else {
            self.player
                .play_random(None, &mut self.rng, &mut self.sched, now);
        }

        self.behavior.start_idle(&mut self.sched);
        self.behavior.start(&mut self.sched, now);
        self.pump(now);
    }

    // ----- timers -----

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sched.next_deadline()
    }

    /// Fire every timer due at `now`, each observing its own deadline
    pub fn run_due_timers(&mut self, now: Instant) {
        while let Some((kind, at)) = self.sched.pop_due(now) {
            self.on_timer(kind, at);
        }
    }

    fn on_timer(&mut self, kind: TimerKind, at: Instant) {
        match kind {
            TimerKind::AnimationFrame => self.player.tick(&mut self.sched),
            TimerKind::WalkStep => self.behavior.walk_step(&mut self.sched),
            TimerKind::WalkEnd | TimerKind::ClickReturn => self.behavior.start_idle(&mut self.sched),
            TimerKind::ClickReset => {
                debug!("Click counter reset");
                self.click_count = 0;
            }
            TimerKind::Dialog => self.behavior.dialog_tick(&mut self.sched, at),
            TimerKind::BubbleHide => self.hide_bubble(),
        }
        self.pump(at);
    }

    // ----- event plumbing -----

    /// Handle queued component events until both queues are empty
    fn pump(&mut self, now: Instant) {
        loop {
            if let Some(event) = self.behavior.pop_event() {
                self.on_behavior_event(event, now);
            } else if let Some(event) = self.player.pop_event() {
                self.on_player_event(event, now);
            } else {
                break;
            }
        }
    }

    fn on_behavior_event(&mut self, event: BehaviorEvent, now: Instant) {
        match event {
            BehaviorEvent::StateChanged(state) => self.on_state_changed(state, now),
            BehaviorEvent::PositionChanged(x, y) => {
                self.commands.push_back(ShellCommand::MoveWindow { x, y });
            }
            BehaviorEvent::DialogRequested => self.show_dialog(now),
        }
    }

    fn on_player_event(&mut self, event: PlayerEvent, now: Instant) {
        match event {
            PlayerEvent::FrameChanged(frame) => {
                self.commands.push_back(ShellCommand::Render(frame));
            }
            PlayerEvent::Finished(name) => self.on_animation_finished(&name, now),
        }
    }

    fn mode(&self) -> AnimationMode {
        self.config.settings().animation_mode
    }

    fn on_animation_finished(&mut self, name: &str, now: Instant) {
        if name == ANNOYED {
            debug!("Annoyed reaction finished");
            self.special_reaction = false;
            self.click_triggered = false;
            self.click_count = 0;

            if self.saved.is_some() {
                self.restore_animation_state(now);
            } else {
                self.on_state_changed(self.behavior.state(), now);
            }
            return;
        }

        if self.special_reaction {
            return;
        }
        self.click_triggered = false;

        match self.mode() {
            AnimationMode::Random => {
                self.player
                    .play_random(Some(false), &mut self.rng, &mut self.sched, now);
            }
            AnimationMode::Keep => {
                if let Some(current) = self.player.current_name().map(String::from) {
                    self.player.play(&current, Some(true), 0, &mut self.sched, now);
                }
            }
        }
    }

    fn on_state_changed(&mut self, state: BehaviorState, now: Instant) {
        if self.special_reaction {
            debug!("State {:?} ignored during special reaction", state);
            return;
        }

        if state != BehaviorState::Dragging && self.saved.is_some() {
            self.restore_animation_state(now);
            return;
        }

        if state == BehaviorState::Dragging {
            self.save_animation_state();
            if self.player.has_animation(DRAG) {
                self.player.play(DRAG, Some(true), 0, &mut self.sched, now);
            }
            return;
        }

        let mode = self.mode();
        if state == BehaviorState::Idle && mode == AnimationMode::Random {
            self.player
                .play_random(Some(false), &mut self.rng, &mut self.sched, now);
            return;
        }

        let name = state.animation_name();
        let looped = mode == AnimationMode::Keep && name != ANNOYED;
        let name = if self.player.has_animation(name) {
            name
        } else {
            STANDING
        };
        self.player.play(name, Some(looped), 0, &mut self.sched, now);

        if state == BehaviorState::Clicking {
            self.sound.play(SOUND_CLICK);
        } else if state.is_walking() {
            self.sound.play(SOUND_WALK);
        }
    }

    /// Snapshot the current playback unless an earlier snapshot is still pending
    fn save_animation_state(&mut self) {
        if self.saved.is_some() {
            return;
        }
        let (Some(name), Some(cursor), Some(looped)) = (
            self.player.current_name(),
            self.player.current_cursor(),
            self.player.is_looping(),
        ) else {
            return;
        };
        debug!("Saving '{}' at frame {}", name, cursor);
        self.saved = Some(SavedAnimationState {
            name: name.to_string(),
            cursor,
            looped,
            click_triggered: self.click_triggered,
        });
    }

    fn restore_animation_state(&mut self, now: Instant) {
        let Some(state) = self.saved.take() else {
            return;
        };
        debug!("Restoring '{}' at frame {}", state.name, state.cursor);
        self.click_triggered = state.click_triggered;
        self.player
            .play(&state.name, Some(state.looped), state.cursor, &mut self.sched, now);
    }

    // ----- pointer input (screen coordinates) -----

    pub fn pointer_press(&mut self, x: i32, y: i32, now: Instant) {
        // A drag whose release never arrived ends before the new press
        if self.hold.is_some_and(|hold| hold.dragging) {
            self.hold = None;
            self.end_drag(now);
        }

        if !self.visible {
            // A click on the hidden outline brings the pet back
            self.set_visible(true);
            self.hold = None;
            return;
        }

        let is_double_click = self.last_press.is_some_and(|(at, (lx, ly))| {
            let dist = (((x - lx).pow(2) + (y - ly).pow(2)) as f64).sqrt();
            now.duration_since(at) < DOUBLE_CLICK_THRESHOLD && dist < DOUBLE_CLICK_DISTANCE
        });

        let (px, py) = self.behavior.position();
        self.hold = Some(PointerHold {
            press_pos: (x, y),
            grab_offset: (x - px, y - py),
            dragging: false,
        });

        if is_double_click {
            self.last_press = None;
            self.double_click(now);
        } else {
            self.last_press = Some((now, (x, y)));
        }
    }

    pub fn pointer_motion(&mut self, x: i32, y: i32, now: Instant) {
        let Some(mut hold) = self.hold else {
            return;
        };

        if !hold.dragging {
            let moved = (x - hold.press_pos.0).abs() + (y - hold.press_pos.1).abs();
            if moved > DRAG_THRESHOLD {
                hold.dragging = true;
                self.behavior.start_dragging(&mut self.sched);
            }
        }

        if hold.dragging {
            let nx = x - hold.grab_offset.0;
            let ny = y - hold.grab_offset.1;
            self.behavior.set_position(nx, ny);
            self.commands.push_back(ShellCommand::MoveWindow { x: nx, y: ny });
        }

        self.hold = Some(hold);
        self.pump(now);
    }

    pub fn pointer_release(&mut self, now: Instant) {
        let Some(hold) = self.hold.take() else {
            return;
        };

        if hold.dragging {
            self.end_drag(now);
        } else {
            self.handle_click(now);
            self.pump(now);
        }
    }

    /// The pointer left the pet. A press that has not become a drag is dropped;
    /// a drag keeps going since the pointer grab still delivers its motion and release.
    pub fn pointer_cancel(&mut self) {
        if self.hold.is_some_and(|hold| !hold.dragging) {
            self.hold = None;
        }
    }

    fn end_drag(&mut self, now: Instant) {
        self.behavior.stop_dragging();
        self.save_position();
        self.pump(now);
    }

    fn handle_click(&mut self, now: Instant) {
        if self.special_reaction {
            debug!("Click ignored during special reaction");
            return;
        }

        self.click_count += 1;
        self.sched.start_once(TimerKind::ClickReset, now, CLICK_WINDOW);
        debug!("Click {} within window", self.click_count);

        if self.click_count >= ANNOYED_CLICKS && self.player.has_animation(ANNOYED) {
            info!("Rapid clicking, playing annoyed reaction");
            self.save_animation_state();
            self.special_reaction = true;
            self.click_triggered = true;
            self.player.play(ANNOYED, Some(false), 0, &mut self.sched, now);
            self.sound.play(SOUND_CLICK);
        } else {
            self.click_triggered = true;
            self.player
                .play_random(Some(false), &mut self.rng, &mut self.sched, now);
            self.sound.play(SOUND_CLICK);
            self.show_dialog(now);
        }
    }

    fn double_click(&mut self, now: Instant) {
        if self.special_reaction {
            debug!("Double-click ignored during special reaction");
            return;
        }
        self.behavior.trigger_click(&mut self.sched, now);
        self.show_dialog(now);
        self.pump(now);
    }

    // ----- dialog bubble -----

    fn show_dialog(&mut self, now: Instant) {
        if !self.config.settings().dialog_enabled || !self.visible {
            return;
        }
        let Some(text) = self.dialogs.random_line(&mut self.rng).map(String::from) else {
            return;
        };
        let (x, y) = self.behavior.position();
        let anchor = Anchor {
            x,
            y,
            width: self.size.0,
            height: self.size.1,
        };
        debug!("Saying: {}", text);
        self.commands
            .push_back(ShellCommand::ShowBubble { text, anchor });
        self.bubble_visible = true;
        self.sched.start_once(TimerKind::BubbleHide, now, BUBBLE_DURATION);
        self.sound.play(SOUND_DIALOG);
    }

    fn hide_bubble(&mut self) {
        self.sched.cancel(TimerKind::BubbleHide);
        if self.bubble_visible {
            self.bubble_visible = false;
            self.commands.push_back(ShellCommand::HideBubble);
        }
    }

    // ----- menu actions -----

    pub fn apply_menu_action(&mut self, action: &MenuAction, now: Instant) {
        match action {
            MenuAction::Open(_) => {}
            MenuAction::SetMode(mode) => self.set_animation_mode(*mode),
            MenuAction::SetScale(scale) => self.set_scale(*scale, now),
            MenuAction::PlayAnimation(name) => self.change_to_animation(name, now),
            MenuAction::Talk => {
                self.show_dialog(now);
            }
            MenuAction::Walk => {
                self.behavior.start_walking(None, &mut self.sched, now);
                self.pump(now);
            }
            MenuAction::ToggleWalking => self.set_auto_walk(!self.behavior.is_enabled()),
            MenuAction::ToggleSound => self.set_sound(!self.config.settings().sound_enabled),
            MenuAction::ToggleDialog => self.set_dialog(!self.config.settings().dialog_enabled),
            MenuAction::VolumeUp => self.adjust_volume(VOLUME_STEP),
            MenuAction::VolumeDown => self.adjust_volume(-VOLUME_STEP),
            MenuAction::ToggleVisibility => self.set_visible(!self.visible),
            MenuAction::Quit => self.quit(),
        }
    }

    /// Explicit choice from the menu; discards all interruption bookkeeping
    pub fn change_to_animation(&mut self, name: &str, now: Instant) {
        info!("Switching to animation '{}'", name);
        self.special_reaction = false;
        self.click_triggered = false;
        self.click_count = 0;
        self.sched.cancel(TimerKind::ClickReset);
        self.saved = None;

        let looped = self.mode() == AnimationMode::Keep;
        self.player.play(name, Some(looped), 0, &mut self.sched, now);
        self.pump(now);
    }

    pub fn set_animation_mode(&mut self, mode: AnimationMode) {
        info!("Animation mode: {:?}", mode);
        self.config.update(|s| s.animation_mode = mode);
        self.player.set_looping(mode == AnimationMode::Keep);
    }

    pub fn set_scale(&mut self, scale: f32, now: Instant) {
        if (self.config.settings().scale - scale).abs() < 0.01 {
            return;
        }
        info!("Scale: {:.0}%", scale * 100.0);
        self.config.update(|s| s.scale = scale);

        let (width, height) = scaled_size(scale);
        self.size = (width, height);
        self.commands
            .push_back(ShellCommand::Resize { width, height });
        self.behavior.update_pet_width(width);
        if self.player.catalog().is_empty() {
            let frame = image_loader::placeholder_frame(width, height);
            self.commands.push_back(ShellCommand::Render(Arc::new(frame)));
        } else {
            self.player.update_size(width, height, &mut self.sched, now);
        }
        self.pump(now);
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        info!("Pet {}", if visible { "shown" } else { "hidden" });
        self.visible = visible;
        if !visible {
            self.hide_bubble();
        }
        self.commands.push_back(ShellCommand::SetVisible(visible));
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.sound.set_enabled(enabled);
        self.config.update(|s| s.sound_enabled = enabled);
    }

    pub fn set_dialog(&mut self, enabled: bool) {
        if !enabled {
            self.hide_bubble();
        }
        self.config.update(|s| s.dialog_enabled = enabled);
    }

    pub fn set_auto_walk(&mut self, enabled: bool) {
        self.behavior.set_enabled(enabled, &mut self.sched);
        self.config.update(|s| s.auto_walk = enabled);
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        let current = self.config.settings().volume;
        let volume = (current + delta).clamp(0.0, 1.0);
        if (volume - current).abs() > f32::EPSILON {
            info!("Volume adjusted to: {:.2}", volume);
            self.sound.set_volume(volume);
            self.config.update(|s| s.volume = volume);
        }
    }

    pub fn set_screen_width(&mut self, width: u32) {
        self.behavior.set_screen_width(width);
    }

    /// Persist the position, stop playback and sounds, and ask the shell to exit
    pub fn quit(&mut self) {
        if self.quit {
            return;
        }
        info!("Quitting");
        self.save_position();
        self.player.stop(&mut self.sched);
        self.sound.stop_all();
        self.hide_bubble();
        self.quit = true;
        self.commands.push_back(ShellCommand::Quit);
    }

    fn save_position(&mut self) {
        let (x, y) = self.behavior.position();
        self.config.update(|s| {
            s.pet_x = x;
            s.pet_y = y;
        });
    }

    // ----- accessors -----

    pub fn take_commands(&mut self) -> Vec<ShellCommand> {
        self.commands.drain(..).collect()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn position(&self) -> (i32, i32) {
        self.behavior.position()
    }

    pub fn state(&self) -> BehaviorState {
        self.behavior.state()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn is_quitting(&self) -> bool {
        self.quit
    }

    pub fn settings(&self) -> &Settings {
        self.config.settings()
    }

    pub fn walking_enabled(&self) -> bool {
        self.behavior.is_enabled()
    }

    pub fn player(&self) -> &AnimationPlayer {
        &self.player
    }

    #[cfg(test)]
    pub fn saved_state(&self) -> Option<&SavedAnimationState> {
        self.saved.as_ref()
    }

    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    #[cfg(test)]
    pub fn is_special_reaction(&self) -> bool {
        self.special_reaction
    }

    #[cfg(test)]
    pub fn is_click_triggered(&self) -> bool {
        self.click_triggered
    }
}

/// Pet size for a display scale
pub fn scaled_size(scale: f32) -> (u32, u32) {
    (
        ((BASE_WIDTH as f32 * scale) as u32).max(1),
        ((BASE_HEIGHT as f32 * scale) as u32).max(1),
    )
}
