//! Engine-facing logic of reactive characters: condition evaluators, the interruption arbiter,
//! the three-slot animation blend and the smoothed gaze.
//!
//! Nothing in this crate queries the ECS directly. World state is read through
//! [`condition::WorldSignals`] and [`gaze::EntityHierarchy`], so every piece can be driven from
//! plain unit tests. The Bevy systems live in `bevy_reactive_character`.

pub mod arbiter;
pub mod blend;
pub mod condition;
pub mod errors;
pub mod gaze;
pub mod interrupter;
pub mod profile;
pub mod scheduler;

pub mod prelude {
    use super::*;
    pub use arbiter::{
        ActiveReaction, ArbiterEvent, ArbiterState, CROSSFADE_DURATION, Completion,
        InterruptionArbiter, LOOK_ONLY_TIMEOUT,
    };
    pub use blend::{AnimationBlendController, BlendSlot, SlotPlayback};
    pub use condition::{CharacterPose, ConditionSample, ConditionTracker, WorldSignals};
    pub use errors::*;
    pub use gaze::{
        EntityHierarchy, GazeController, GazeSettings, GazeTransition, LookAtOutput, find_head,
    };
    pub use interrupter::{
        BoundInterrupter, ClipRef, Interrupter, InterrupterId, InterrupterKind,
        InterruptionConfig, InterruptionType, USER_ALIAS, USER_ANCHOR_NAME,
    };
    pub use profile::ReactiveProfile;
    pub use scheduler::{TaskId, TaskScheduler};
}
