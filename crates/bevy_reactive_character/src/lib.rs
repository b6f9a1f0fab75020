//! # Bevy Reactive Character
//!
//! **Bevy Reactive Character** makes motion-captured characters react to what happens around
//! them. Each character loops a main animation while a set of _interrupters_ watch the world. When
//! one of them fires, the character crossfades into a reactive clip and looks at whatever caused
//! it, then blends back to its loop.
//!
//! ## Profiles
//!
//! A character is configured by a [`ReactiveProfile`] asset, defined in `*.reactive.ron` files:
//! ```ron
//! (
//!     main_animation: Some((name: "idle", duration: 4.0, path: Some("models/Guide.glb#Animation0"))),
//!     interrupters: [
//!         (
//!             name: "greet visitors",
//!             relevant_entities: ["User", "Visitor"],
//!             max_distance: 2.5,
//!             min_duration: 1.0,
//!             priority: 5,
//!             reactive_animations: [(name: "wave", duration: 2.2, path: Some("models/Guide.glb#Animation3"))],
//!             kind: Proximity,
//!         ),
//!         (
//!             name: "noticed staring",
//!             relevant_entities: ["User"],
//!             kind: LookAt(max_angle: 15.0),
//!         ),
//!     ],
//! )
//! ```
//! Entity names are matched against the `Name` component of world entities. `"User"` refers to the
//! entity named [`USER_ANCHOR_NAME`]. Interrupters come in four kinds:
//! - `Proximity`: the entity is closer than `max_distance`.
//! - `Audio(volume_threshold, min_band, max_band)`: the entity's [`AudioSpectrum`] carries enough
//!   energy in the given bins. For the [`UserAnchor`] the [`MicrophoneLoudness`] resource is used.
//! - `Velocity(velocity_threshold)`: the entity's [`TrackedVelocity`] is high enough.
//! - `LookAt(max_angle)`: the entity looks at the character's head.
//!
//! An interrupter with no reactive animation only turns the character's gaze.
//!
//! ## Usage
//!
//! ```ignore
//! app.add_plugins(ReactiveCharacterPlugin::default());
//! // ...
//! commands.spawn((
//!     SceneRoot(asset_server.load("models/Guide.glb#Scene0")),
//!     ReactiveCharacterHandle(asset_server.load("characters/guide.reactive.ron")),
//! ));
//! ```
//! The IK look-at target of every character is published in its [`LookAtIk`] component, and all
//! arbitration decisions are sent as [`ReactionMessage`]s.
//!
//! [`ReactiveProfile`]: bevy_reactive_character_core::profile::ReactiveProfile
//! [`USER_ANCHOR_NAME`]: bevy_reactive_character_core::interrupter::USER_ANCHOR_NAME
//! [`AudioSpectrum`]: crate::signals::AudioSpectrum
//! [`UserAnchor`]: crate::signals::UserAnchor
//! [`MicrophoneLoudness`]: crate::signals::MicrophoneLoudness
//! [`TrackedVelocity`]: crate::signals::TrackedVelocity
//! [`LookAtIk`]: crate::character::LookAtIk
//! [`ReactionMessage`]: crate::systems::ReactionMessage

pub mod animation_driver;
pub mod character;
pub mod debug;
pub mod hierarchy;
pub mod loader;
pub mod plugin;
pub mod signals;
pub mod systems;

pub mod prelude {
    use super::*;
    pub use animation_driver::ReactiveAnimationBinding;
    pub use bevy_reactive_character_core::prelude::*;
    pub use character::{LookAtIk, ReactiveBlendOutput, ReactiveCharacter, ReactiveCharacterHandle};
    pub use debug::ReactiveDebugSettings;
    pub use loader::ReactiveProfileLoader;
    pub use plugin::{ReactiveCharacterPlugin, ReactiveCharacterSet};
    pub use signals::{AudioSpectrum, MicrophoneLoudness, TrackedVelocity, UserAnchor};
    pub use systems::ReactionMessage;
}
