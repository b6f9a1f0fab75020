use bevy::{
    app::{App, Plugin, Update},
    asset::AssetApp,
    ecs::schedule::{IntoScheduleConfigs, SystemSet},
};
use bevy_reactive_character_core::{
    blend::SlotPlayback,
    gaze::{GazeSettings, GazeTransition, LookAtOutput},
    interrupter::{ClipRef, Interrupter, InterrupterId, InterrupterKind, InterruptionType},
    profile::ReactiveProfile,
};

use crate::{
    animation_driver::{bind_animation_players, drive_animation_players},
    character::{
        LookAtIk, ReactiveBlendOutput, ReactiveCharacterHandle, instantiate_reactive_characters,
    },
    debug::{ReactiveDebugSettings, debug_gizmos_enabled, draw_reactive_gizmos},
    loader::ReactiveProfileLoader,
    signals::{AudioSpectrum, MicrophoneLoudness, TrackedVelocity, UserAnchor, sample_velocities},
    systems::{ReactionMessage, update_reactive_characters},
};

/// Adds reactive characters to an app
pub struct ReactiveCharacterPlugin {
    /// Play the blend on an `AnimationPlayer` found below each character. Needs the animation and
    /// asset server plugins.
    pub animation_driver: bool,
    /// Draw look-at points with gizmos. Needs the gizmo plugin.
    pub debug_gizmos: bool,
}

impl Default for ReactiveCharacterPlugin {
    fn default() -> Self {
        Self {
            animation_driver: true,
            debug_gizmos: false,
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum ReactiveCharacterSet {
    /// Instantiates pending characters and samples signal sources
    Sample,
    /// Runs the interrupters, the arbiter, the blend and the gaze of every character
    Evaluate,
    /// Hands the results to animation players and debug drawing
    Apply,
}

impl Plugin for ReactiveCharacterPlugin {
    fn build(&self, app: &mut App) {
        self.register_assets(app);
        self.register_types(app);

        app.add_message::<ReactionMessage>()
            .init_resource::<MicrophoneLoudness>()
            .init_resource::<ReactiveDebugSettings>();

        app.configure_sets(
            Update,
            (
                ReactiveCharacterSet::Sample,
                ReactiveCharacterSet::Evaluate,
                ReactiveCharacterSet::Apply,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            (instantiate_reactive_characters, sample_velocities)
                .chain()
                .in_set(ReactiveCharacterSet::Sample),
        );
        app.add_systems(
            Update,
            update_reactive_characters.in_set(ReactiveCharacterSet::Evaluate),
        );

        if self.animation_driver {
            app.add_systems(
                Update,
                (bind_animation_players, drive_animation_players)
                    .chain()
                    .in_set(ReactiveCharacterSet::Apply),
            );
        }

        if self.debug_gizmos {
            app.add_systems(
                Update,
                draw_reactive_gizmos
                    .run_if(debug_gizmos_enabled)
                    .in_set(ReactiveCharacterSet::Apply),
            );
        }
    }
}

impl ReactiveCharacterPlugin {
    /// Registers asset types and their loaders
    fn register_assets(&self, app: &mut App) {
        app.init_asset::<ReactiveProfile>()
            .init_asset_loader::<ReactiveProfileLoader>()
            .register_asset_reflect::<ReactiveProfile>();
    }

    /// "Other" reflect registrations
    fn register_types(&self, app: &mut App) {
        app //
            .register_type::<ReactiveCharacterHandle>()
            .register_type::<LookAtIk>()
            .register_type::<ReactiveBlendOutput>()
            .register_type::<TrackedVelocity>()
            .register_type::<AudioSpectrum>()
            .register_type::<UserAnchor>()
            .register_type::<MicrophoneLoudness>()
            .register_type::<ReactiveDebugSettings>()
            .register_type::<Interrupter>()
            .register_type::<InterrupterKind>()
            .register_type::<InterrupterId>()
            .register_type::<InterruptionType>()
            .register_type::<ClipRef>()
            .register_type::<GazeSettings>()
            .register_type::<GazeTransition>()
            .register_type::<LookAtOutput>()
            .register_type::<SlotPlayback>();
    }
}
