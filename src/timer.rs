// Timer module
// Single-slot cancellable timers driven by an externally supplied clock

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Every scheduled callback the pet knows about. Each kind owns exactly one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Periodic animation frame advance
    AnimationFrame,
    /// Periodic walk movement
    WalkStep,
    /// One-shot return to idle after a walk
    WalkEnd,
    /// One-shot return to idle after a click reaction
    ClickReturn,
    /// One-shot click counter reset
    ClickReset,
    /// Ambient dialog trigger
    Dialog,
    /// One-shot dialog bubble hide
    BubbleHide,
}

/// How far behind a periodic timer may fall before its backlog is dropped
const MAX_BACKLOG: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct Slot {
    deadline: Instant,
    period: Option<Duration>,
}

/// Pending timers keyed by kind
///
/// Starting a kind that is already pending replaces its deadline; there is never
/// more than one outstanding instance per kind.
#[derive(Debug, Default)]
pub struct Scheduler {
    slots: HashMap<TimerKind, Slot>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `kind` once, `delay` after `now`
    pub fn start_once(&mut self, kind: TimerKind, now: Instant, delay: Duration) {
        self.slots.insert(
            kind,
            Slot {
                deadline: now + delay,
                period: None,
            },
        );
    }

    /// Fire `kind` every `interval`, first at `now + interval`
    pub fn start_periodic(&mut self, kind: TimerKind, now: Instant, interval: Duration) {
        self.slots.insert(
            kind,
            Slot {
                deadline: now + interval,
                period: Some(interval),
            },
        );
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.slots.remove(&kind);
    }

    #[cfg(test)]
    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.slots.get(&kind).map(|s| s.deadline)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.values().map(|s| s.deadline).min()
    }

    /// Pop the earliest timer due at `now`, returning its kind and deadline.
    ///
    /// Periodic timers are re-armed one period after their deadline, so a caller
    /// that wakes late still sees every tick in order. A timer more than
    /// `MAX_BACKLOG` behind (suspend, stalled compositor) is re-armed relative to
    /// `now` instead of replaying the backlog.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerKind, Instant)> {
        let (kind, slot) = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.deadline <= now)
            .min_by_key(|(kind, slot)| (slot.deadline, **kind))
            .map(|(kind, slot)| (*kind, *slot))?;

        match slot.period {
            Some(period) => {
                let mut next = slot.deadline + period;
                if now.duration_since(slot.deadline) > MAX_BACKLOG {
                    next = now + period;
                }
                self.slots.insert(
                    kind,
                    Slot {
                        deadline: next,
                        period: Some(period),
                    },
                );
            }
            None => {
                self.slots.remove(&kind);
            }
        }

        Some((kind, slot.deadline))
    }
}
