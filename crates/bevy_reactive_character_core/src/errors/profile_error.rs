use thiserror::Error;

/// Possible errors that can be produced by the reactive profile loader
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProfileError {
    /// An [IO](std::io) Error
    #[error("could not read reactive profile: {0}")]
    Io(#[from] std::io::Error),
    /// A [RON](ron) Error
    #[error("could not parse RON: {0}")]
    RonSpannedError(#[from] ron::error::SpannedError),
}

/// Semantic problems with a single interrupter definition.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileValidationError {
    #[error("interrupter has an empty name")]
    EmptyName,
    #[error("interrupter {name:?} has a negative minimum duration ({value})")]
    NegativeMinDuration { name: String, value: f32 },
    #[error("interrupter {name:?} has a non-positive maximum distance ({value})")]
    NonPositiveMaxDistance { name: String, value: f32 },
    #[error("interrupter {name:?} has an inverted frequency band range {min}..={max}")]
    InvertedBandRange { name: String, min: usize, max: usize },
    #[error("clip {clip:?} of interrupter {name:?} has a non-positive duration ({value})")]
    NonPositiveClipDuration {
        name: String,
        clip: String,
        value: f32,
    },
}
