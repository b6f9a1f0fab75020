use bevy::reflect::Reflect;

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrackerPhase {
    #[default]
    Idle,
    Accumulating,
    Fired,
}

/// What a single observation did to the tracker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerEdge {
    /// Nothing noteworthy, keep waiting
    Hold,
    /// The condition has held for long enough and the latch was open: emit a request
    Fire,
    /// The condition is false. Accumulated time and the latch were reset.
    Released,
}

/// Edge-triggered timer for one (interrupter clone, entity) pair.
///
/// Fires at most once per false-to-true cycle of the condition.
#[derive(Reflect, Clone, Debug, Default, PartialEq)]
pub struct ConditionTracker {
    accumulated: f32,
    has_reacted: bool,
    phase: TrackerPhase,
}

impl ConditionTracker {
    pub fn observe(&mut self, holds: bool, delta: f32, min_duration: f32) -> TrackerEdge {
        if !holds {
            self.accumulated = 0.;
            self.has_reacted = false;
            self.phase = TrackerPhase::Idle;
            return TrackerEdge::Released;
        }

        self.accumulated += delta;

        if self.has_reacted {
            return TrackerEdge::Hold;
        }

        if self.accumulated >= min_duration {
            self.has_reacted = true;
            self.phase = TrackerPhase::Fired;
            TrackerEdge::Fire
        } else {
            self.phase = TrackerPhase::Accumulating;
            TrackerEdge::Hold
        }
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn has_reacted(&self) -> bool {
        self.has_reacted
    }

    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }
}
