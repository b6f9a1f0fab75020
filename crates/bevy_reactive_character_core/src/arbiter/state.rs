use bevy::platform::collections::{HashMap, HashSet};
use indexmap::IndexMap;

use crate::{
    condition::ConditionTracker,
    interrupter::{InterrupterId, InterruptionConfig},
    scheduler::TaskId,
};

/// How the completion of an active reaction is awaited
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Completion {
    /// Timer equal to the reactive clip's length
    ReactiveClip,
    /// Fixed timeout of a gaze-only reaction
    LookOnly,
}

/// The interrupter currently owning the character
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveReaction {
    pub id: InterrupterId,
    pub config: InterruptionConfig,
    pub completion: Completion,
    pub(crate) task: TaskId,
}

impl ActiveReaction {
    pub fn priority(&self) -> i32 {
        self.config.priority
    }

    pub fn is_reactive(&self) -> bool {
        self.completion == Completion::ReactiveClip
    }

    pub fn task(&self) -> TaskId {
        self.task
    }
}

/// Mutable arbitration state of one character
#[derive(Clone, Debug, Default)]
pub struct ArbiterState {
    pub active: Option<ActiveReaction>,
    /// Requests with a priority not above the active one, in arrival order
    pub waiting: IndexMap<InterrupterId, InterruptionConfig>,
    /// Preempted interrupters, barred until their condition goes false
    pub suppressed: HashSet<InterrupterId>,
    /// Interrupters preempted during their run. Their completion is ignored.
    pub overlaid: HashSet<InterrupterId>,
    /// Edge-detection latch and hold timer per interrupter
    pub trackers: HashMap<InterrupterId, ConditionTracker>,
    pub has_first_look_occurred: bool,
}

impl ArbiterState {
    pub fn is_active(&self, id: InterrupterId) -> bool {
        self.active.as_ref().is_some_and(|active| active.id == id)
    }

    pub fn is_waiting(&self, id: InterrupterId) -> bool {
        self.waiting.contains_key(&id)
    }

    pub fn is_suppressed(&self, id: InterrupterId) -> bool {
        self.suppressed.contains(&id)
    }

    pub fn has_reacted(&self, id: InterrupterId) -> bool {
        self.trackers
            .get(&id)
            .is_some_and(ConditionTracker::has_reacted)
    }

    /// Highest-priority waiting request that is not suppressed. On equal priorities the earliest
    /// request wins.
    pub fn highest_waiting(&self) -> Option<(InterrupterId, &InterruptionConfig)> {
        self.waiting
            .iter()
            .filter(|(id, _)| !self.suppressed.contains(*id))
            .fold(None, |best: Option<(InterrupterId, &InterruptionConfig)>, (id, config)| {
                match best {
                    Some((_, best_config)) if best_config.priority >= config.priority => best,
                    _ => Some((*id, config)),
                }
            })
    }
}
