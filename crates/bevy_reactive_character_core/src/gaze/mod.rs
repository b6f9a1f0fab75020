//! Smoothed look-at target for the character's IK look-at system.

pub mod head;
pub mod smoothing;

use bevy::{
    ecs::entity::Entity,
    log::trace,
    math::Vec3,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use serde::{Deserialize, Serialize};

use crate::condition::CharacterPose;

pub use head::{EntityHierarchy, find_head, is_head_name};
pub use smoothing::{move_towards, smooth_damp};

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GazeTransition {
    /// First target since the character was last idle
    FirstLook,
    /// No target, drifting back to the default point
    #[default]
    ReturnToDefault,
    /// Moving from one target to another
    SwitchTarget,
    /// Locked on a target
    FollowTarget,
}

#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
#[serde(default)]
pub struct GazeSettings {
    pub first_look_smooth_time: f32,
    pub return_to_default_smooth_time: f32,
    pub switch_target_smooth_time: f32,
    pub follow_target_smooth_time: f32,
    pub body_weight: f32,
    pub head_weight: f32,
    pub eyes_weight: f32,
    pub clamp_weight: f32,
    /// Distance ahead of the character of the point looked at when there is no target
    pub default_distance: f32,
    /// Distance to the target below which a first look or switch becomes a follow
    pub follow_threshold: f32,
}

impl Default for GazeSettings {
    fn default() -> Self {
        Self {
            first_look_smooth_time: 0.6,
            return_to_default_smooth_time: 0.8,
            switch_target_smooth_time: 0.4,
            follow_target_smooth_time: 0.15,
            body_weight: 0.3,
            head_weight: 0.8,
            eyes_weight: 1.,
            clamp_weight: 0.5,
            default_distance: 5.,
            follow_threshold: 0.1,
        }
    }
}

impl GazeSettings {
    pub fn smooth_time(&self, transition: GazeTransition) -> f32 {
        match transition {
            GazeTransition::FirstLook => self.first_look_smooth_time,
            GazeTransition::ReturnToDefault => self.return_to_default_smooth_time,
            GazeTransition::SwitchTarget => self.switch_target_smooth_time,
            GazeTransition::FollowTarget => self.follow_target_smooth_time,
        }
    }
}

/// Values handed to the character's IK look-at solver every tick
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq)]
#[reflect(Default)]
pub struct LookAtOutput {
    pub position: Vec3,
    pub weight: f32,
    pub body_weight: f32,
    pub head_weight: f32,
    pub eyes_weight: f32,
    pub clamp_weight: f32,
}

#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct GazeController {
    settings: GazeSettings,
    target: Option<Entity>,
    transition: GazeTransition,
    virtual_position: Option<Vec3>,
    damping_velocity: Vec3,
    current_weight: f32,
    target_weight: f32,
}

impl GazeController {
    pub fn new(settings: GazeSettings) -> Self {
        Self {
            settings,
            target: None,
            transition: GazeTransition::ReturnToDefault,
            virtual_position: None,
            damping_velocity: Vec3::ZERO,
            current_weight: 0.,
            target_weight: 0.,
        }
    }

    /// Routes the gaze to `target`'s head, or back to the default point with `None`.
    pub fn set_target(&mut self, target: Option<Entity>, transition: GazeTransition) {
        self.target = target;
        self.transition = transition;
        self.target_weight = if target.is_some() { 1. } else { 0. };
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn transition(&self) -> GazeTransition {
        self.transition
    }

    pub fn settings(&self) -> &GazeSettings {
        &self.settings
    }

    pub fn current_weight(&self) -> f32 {
        self.current_weight
    }

    pub fn target_weight(&self) -> f32 {
        self.target_weight
    }

    pub fn virtual_position(&self) -> Option<Vec3> {
        self.virtual_position
    }

    /// Point looked at when there is no target, in front of the character's head
    pub fn default_point(&self, character: &CharacterPose) -> Vec3 {
        let forward = character.forward.try_normalize().unwrap_or(Vec3::NEG_Z);
        character.head + forward * self.settings.default_distance
    }

    /// Advances the smoothing. `target_position` is the world position of the current target's
    /// head, `None` if there is no target or it could not be resolved this tick.
    pub fn tick(
        &mut self,
        delta: f32,
        target_position: Option<Vec3>,
        character: &CharacterPose,
    ) -> LookAtOutput {
        let default_point = self.default_point(character);
        let goal = target_position.unwrap_or(default_point);
        let smooth_time = self.settings.smooth_time(self.transition).max(1e-4);
        let current = self.virtual_position.unwrap_or(default_point);

        let position = smooth_damp(
            current,
            goal,
            &mut self.damping_velocity,
            smooth_time,
            delta,
        );
        self.virtual_position = Some(position);

        let weight_goal = if target_position.is_some() {
            self.target_weight
        } else {
            0.
        };
        self.current_weight = move_towards(self.current_weight, weight_goal, delta / smooth_time);

        if target_position.is_some()
            && matches!(
                self.transition,
                GazeTransition::FirstLook | GazeTransition::SwitchTarget
            )
            && position.distance(goal) < self.settings.follow_threshold
        {
            trace!("Gaze locked on target, {:?} -> FollowTarget", self.transition);
            self.transition = GazeTransition::FollowTarget;
        }

        LookAtOutput {
            position,
            weight: self.current_weight,
            body_weight: self.settings.body_weight,
            head_weight: self.settings.head_weight,
            eyes_weight: self.settings.eyes_weight,
            clamp_weight: self.settings.clamp_weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::world::World;

    use super::*;

    fn pose() -> CharacterPose {
        CharacterPose::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0., 1.6, 0.))
    }

    #[test]
    fn idle_gaze_rests_ahead_of_character() {
        let mut gaze = GazeController::new(GazeSettings::default());
        let out = gaze.tick(0.1, None, &pose());

        assert_eq!(out.position, Vec3::new(0., 1.6, -5.));
        assert_eq!(out.weight, 0.);
    }

    #[test]
    fn first_look_becomes_follow_target() {
        let mut world = World::new();
        let target = world.spawn_empty().id();
        let mut gaze = GazeController::new(GazeSettings::default());
        gaze.tick(0.1, None, &pose());

        gaze.set_target(Some(target), GazeTransition::FirstLook);
        let head = Vec3::new(2., 1.7, -1.);

        let mut transitions = Vec::new();
        for _ in 0..60 {
            gaze.tick(0.05, Some(head), &pose());
            transitions.push(gaze.transition());
        }

        assert_eq!(gaze.transition(), GazeTransition::FollowTarget);
        assert_eq!(transitions[0], GazeTransition::FirstLook);
        assert_eq!(gaze.current_weight(), 1.);
        assert!(gaze.virtual_position().unwrap().distance(head) < 0.1);
    }

    #[test]
    fn weight_ramps_linearly() {
        let mut world = World::new();
        let target = world.spawn_empty().id();
        let settings = GazeSettings {
            first_look_smooth_time: 0.5,
            ..Default::default()
        };
        let mut gaze = GazeController::new(settings);
        gaze.set_target(Some(target), GazeTransition::FirstLook);

        let out = gaze.tick(0.125, Some(Vec3::new(0., 1.6, -20.)), &pose());
        assert_eq!(out.weight, 0.25);
        let out = gaze.tick(0.125, Some(Vec3::new(0., 1.6, -20.)), &pose());
        assert_eq!(out.weight, 0.5);
    }

    #[test]
    fn unresolved_target_fades_out_towards_default() {
        let mut world = World::new();
        let target = world.spawn_empty().id();
        let mut gaze = GazeController::new(GazeSettings::default());
        gaze.set_target(Some(target), GazeTransition::FirstLook);
        for _ in 0..20 {
            gaze.tick(0.1, Some(Vec3::new(3., 1.6, 0.)), &pose());
        }
        assert!(gaze.current_weight() > 0.9);

        for _ in 0..40 {
            gaze.tick(0.1, None, &pose());
        }
        assert_eq!(gaze.current_weight(), 0.);
        let resting = gaze.virtual_position().unwrap();
        assert!(resting.distance(gaze.default_point(&pose())) < 0.05);
    }

    #[test]
    fn return_to_default_never_auto_follows() {
        let mut gaze = GazeController::new(GazeSettings::default());
        gaze.set_target(None, GazeTransition::ReturnToDefault);
        for _ in 0..50 {
            gaze.tick(0.1, None, &pose());
        }
        assert_eq!(gaze.transition(), GazeTransition::ReturnToDefault);
    }
}
