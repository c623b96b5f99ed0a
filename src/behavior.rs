// Behavior module
// The pet's discrete state machine, walk physics and ambient dialog timer

use crate::store::{CLICKING, CONFUSED, STANDING, WALKING};
use crate::timer::{Scheduler, TimerKind};
use fastrand::Rng;
use log::debug;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Interval between walk steps
const WALK_STEP_INTERVAL: Duration = Duration::from_millis(50);

/// Pixels moved per walk step
const WALK_SPEED: i32 = 2;

/// Distance kept from the left and right screen edges while walking
pub const EDGE_MARGIN: i32 = 50;

/// Bounds of a walk's random duration, in milliseconds
const WALK_DURATION_MS: (u64, u64) = (3000, 8000);

/// How long the clicking state lasts
const CLICK_DURATION: Duration = Duration::from_millis(1000);

/// Bounds of the ambient dialog interval, in milliseconds
const DIALOG_INTERVAL_MS: (u64, u64) = (20_000, 45_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    Idle,
    WalkingLeft,
    WalkingRight,
    Dragging,
    Clicking,
}

impl BehaviorState {
    /// Animation shown for this state
    pub fn animation_name(self) -> &'static str {
        match self {
            BehaviorState::Idle => STANDING,
            BehaviorState::WalkingLeft | BehaviorState::WalkingRight => WALKING,
            BehaviorState::Dragging => CONFUSED,
            BehaviorState::Clicking => CLICKING,
        }
    }

    pub fn is_walking(self) -> bool {
        matches!(self, BehaviorState::WalkingLeft | BehaviorState::WalkingRight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorEvent {
    StateChanged(BehaviorState),
    PositionChanged(i32, i32),
    DialogRequested,
}

pub struct BehaviorController {
    state: BehaviorState,
    enabled: bool,
    x: i32,
    y: i32,
    walk_direction: i32,
    pet_width: u32,
    screen_width: u32,
    rng: Rng,
    events: VecDeque<BehaviorEvent>,
}

impl BehaviorController {
    pub fn new(pet_width: u32, rng: Rng) -> Self {
        Self {
            state: BehaviorState::Idle,
            enabled: true,
            x: 100,
            y: 100,
            walk_direction: 0,
            pet_width,
            screen_width: 1920,
            rng,
            events: VecDeque::new(),
        }
    }

    /// Arm the ambient dialog timer
    pub fn start(&mut self, sched: &mut Scheduler, now: Instant) {
        self.schedule_dialog(sched, now);
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record an externally applied position without emitting an event
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Walks are clamped horizontally only
    pub fn set_screen_width(&mut self, width: u32) {
        self.screen_width = width;
    }

    pub fn update_pet_width(&mut self, width: u32) {
        self.pet_width = width;
    }

    pub fn set_enabled(&mut self, enabled: bool, sched: &mut Scheduler) {
        self.enabled = enabled;
        if !enabled {
            self.stop_walking(sched);
        }
    }

    pub fn start_idle(&mut self, sched: &mut Scheduler) {
        self.stop_walking(sched);
        sched.cancel(TimerKind::WalkEnd);
        sched.cancel(TimerKind::ClickReturn);
        self.change_state(BehaviorState::Idle);
    }

    /// Walk in `direction` (negative is left); random when `None`
    pub fn start_walking(&mut self, direction: Option<i32>, sched: &mut Scheduler, now: Instant) {
        if !self.enabled {
            return;
        }

        let direction = direction.unwrap_or_else(|| if self.rng.bool() { -1 } else { 1 });
        self.walk_direction = if direction < 0 { -1 } else { 1 };

        if self.walk_direction < 0 {
            self.change_state(BehaviorState::WalkingLeft);
        } else {
            self.change_state(BehaviorState::WalkingRight);
        }

        // Already against the edge: the walk ends before it starts
        if self.clamp_to_edges(self.x + WALK_SPEED * self.walk_direction).1 {
            self.walk_step(sched);
            return;
        }

        sched.start_periodic(TimerKind::WalkStep, now, WALK_STEP_INTERVAL);
        let duration = self.rng.u64(WALK_DURATION_MS.0..=WALK_DURATION_MS.1);
        sched.start_once(TimerKind::WalkEnd, now, Duration::from_millis(duration));
    }

    pub fn stop_walking(&mut self, sched: &mut Scheduler) {
        sched.cancel(TimerKind::WalkStep);
    }

    /// Move one step; called when the walk-step timer fires
    pub fn walk_step(&mut self, sched: &mut Scheduler) {
        let (new_x, hit_edge) = self.clamp_to_edges(self.x + WALK_SPEED * self.walk_direction);
        if hit_edge {
            self.start_idle(sched);
        }

        if new_x != self.x {
            self.x = new_x;
            self.events
                .push_back(BehaviorEvent::PositionChanged(self.x, self.y));
        }
    }

    pub fn start_dragging(&mut self, sched: &mut Scheduler) {
        self.stop_walking(sched);
        sched.cancel(TimerKind::WalkEnd);
        sched.cancel(TimerKind::ClickReturn);
        self.change_state(BehaviorState::Dragging);
    }

    pub fn stop_dragging(&mut self) {
        self.change_state(BehaviorState::Idle);
    }

    pub fn trigger_click(&mut self, sched: &mut Scheduler, now: Instant) {
        if self.state == BehaviorState::Dragging {
            return;
        }
        self.stop_walking(sched);
        sched.cancel(TimerKind::WalkEnd);
        self.change_state(BehaviorState::Clicking);
        sched.start_once(TimerKind::ClickReturn, now, CLICK_DURATION);
    }

    /// Ambient dialog timer fired; suppressed while dragging, always re-armed
    pub fn dialog_tick(&mut self, sched: &mut Scheduler, now: Instant) {
        if self.state != BehaviorState::Dragging {
            self.events.push_back(BehaviorEvent::DialogRequested);
        } else {
            debug!("Ambient dialog suppressed while dragging");
        }
        self.schedule_dialog(sched, now);
    }

    pub fn pop_event(&mut self) -> Option<BehaviorEvent> {
        self.events.pop_front()
    }

    fn schedule_dialog(&mut self, sched: &mut Scheduler, now: Instant) {
        let delay = self.rng.u64(DIALOG_INTERVAL_MS.0..=DIALOG_INTERVAL_MS.1);
        sched.start_once(TimerKind::Dialog, now, Duration::from_millis(delay));
    }

    /// Clamp a candidate x into the walkable band, reporting whether it was clamped
    fn clamp_to_edges(&self, x: i32) -> (i32, bool) {
        let right = self.screen_width as i32 - self.pet_width as i32 - EDGE_MARGIN;
        if x < EDGE_MARGIN {
            (EDGE_MARGIN, true)
        } else if x > right {
            (right, true)
        } else {
            (x, false)
        }
    }

    fn change_state(&mut self, new_state: BehaviorState) {
        if self.state != new_state {
            debug!("Behavior state {:?} -> {:?}", self.state, new_state);
            self.state = new_state;
            self.events.push_back(BehaviorEvent::StateChanged(new_state));
        }
    }
}
