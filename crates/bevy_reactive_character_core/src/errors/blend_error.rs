use thiserror::Error;

use crate::blend::BlendSlot;

/// Possible errors produced when requesting a blend transition
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlendError {
    #[error("a transition towards {0:?} is already in flight")]
    TransitionInFlight(BlendSlot),
    #[error("transition duration must be finite and non-negative, got {0}")]
    InvalidDuration(f32),
}
