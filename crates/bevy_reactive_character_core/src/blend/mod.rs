//! Three-slot crossfading between the main loop and two reactive slots.

pub mod easing;

use bevy::{log::debug, reflect::Reflect};

use crate::{errors::BlendError, interrupter::ClipRef};

pub use easing::smoothstep;

/// Weight sums above this are scaled back down to one
const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendSlot {
    Main,
    ReactiveA,
    ReactiveB,
}

impl BlendSlot {
    pub const ALL: [BlendSlot; 3] = [BlendSlot::Main, BlendSlot::ReactiveA, BlendSlot::ReactiveB];

    pub const fn index(self) -> usize {
        match self {
            BlendSlot::Main => 0,
            BlendSlot::ReactiveA => 1,
            BlendSlot::ReactiveB => 2,
        }
    }

    pub fn is_reactive(self) -> bool {
        self != BlendSlot::Main
    }

    /// The reactive slot that is not `self`. [`BlendSlot::Main`] maps to
    /// [`BlendSlot::ReactiveA`].
    pub fn other_reactive(self) -> Self {
        match self {
            BlendSlot::ReactiveA => BlendSlot::ReactiveB,
            BlendSlot::Main | BlendSlot::ReactiveB => BlendSlot::ReactiveA,
        }
    }
}

/// Playback state of one blend input
#[derive(Reflect, Clone, Debug, Default, PartialEq)]
pub struct SlotPlayback {
    pub clip: Option<ClipRef>,
    /// Playback head in seconds
    pub time: f32,
    pub weight: f32,
    pub paused: bool,
}

impl SlotPlayback {
    fn connect(&mut self, clip: ClipRef) {
        self.clip = Some(clip);
        self.time = 0.;
        self.paused = false;
    }

    fn disconnect(&mut self) {
        *self = Self::default();
    }

    fn advance(&mut self, delta: f32, looping: bool) {
        let Some(clip) = &self.clip else {
            return;
        };
        if self.paused {
            return;
        }
        let next = self.time + delta;
        self.time = if clip.duration <= 0. {
            0.
        } else if looping {
            next.rem_euclid(clip.duration)
        } else {
            next.min(clip.duration)
        };
    }

    pub fn is_connected(&self) -> bool {
        self.clip.is_some()
    }
}

/// Crossfade in flight
#[derive(Reflect, Clone, Copy, Debug, PartialEq)]
pub struct BlendTransition {
    pub target: BlendSlot,
    pub elapsed: f32,
    pub duration: f32,
    start_weights: [f32; 3],
}

impl BlendTransition {
    pub fn progress(&self) -> f32 {
        if self.duration > 0. {
            (self.elapsed / self.duration).min(1.)
        } else {
            1.
        }
    }
}

/// Owns the Main/ReactiveA/ReactiveB blend and runs at most one crossfade at a time.
///
/// At rest exactly one slot has weight one. During a crossfade the target slot eases in with
/// [`smoothstep`] while every other slot eases out from wherever it was.
#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct AnimationBlendController {
    slots: [SlotPlayback; 3],
    last_reactive: Option<BlendSlot>,
    transition: Option<BlendTransition>,
}

impl Default for AnimationBlendController {
    fn default() -> Self {
        let mut slots: [SlotPlayback; 3] = Default::default();
        slots[BlendSlot::Main.index()].weight = 1.;
        Self {
            slots,
            last_reactive: None,
            transition: None,
        }
    }
}

impl AnimationBlendController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `clip` to the main slot at full weight, replacing the previous main clip.
    pub fn play_main(&mut self, clip: ClipRef) {
        let main = &mut self.slots[BlendSlot::Main.index()];
        main.disconnect();
        main.connect(clip);
        main.weight = 1.;
        self.sanitize_weights();
    }

    /// Crossfades into the reactive slot that was not used last.
    pub fn play_reactive(&mut self, clip: ClipRef, duration: f32) -> Result<BlendSlot, BlendError> {
        self.check_can_start(duration)?;

        let slot = self.next_reactive_slot();
        let reused = &self.slots[slot.index()];
        if reused.weight > 0. {
            debug!(
                "Restarting {slot:?} at weight {:.2}, it was still playing {:?}",
                reused.weight,
                reused.clip.as_ref().map(|clip| clip.name.as_str())
            );
        }
        self.slots[slot.index()].connect(clip);
        self.last_reactive = Some(slot);
        self.start_transition(slot, duration);

        Ok(slot)
    }

    /// Crossfades whichever reactive slot is contributing back to the main slot.
    pub fn return_to_main(&mut self, duration: f32) -> Result<(), BlendError> {
        self.check_can_start(duration)?;

        let reactive_weight: f32 = [BlendSlot::ReactiveA, BlendSlot::ReactiveB]
            .iter()
            .map(|slot| self.slots[slot.index()].weight)
            .sum();

        if reactive_weight <= 0. {
            self.finish(BlendSlot::Main);
        } else {
            self.start_transition(BlendSlot::Main, duration);
        }

        Ok(())
    }

    pub fn pause_main(&mut self) {
        self.slots[BlendSlot::Main.index()].paused = true;
    }

    pub fn resume_main(&mut self) {
        self.slots[BlendSlot::Main.index()].paused = false;
    }

    /// Stops the crossfade in flight, leaving the weights where they are.
    pub fn cancel_transition(&mut self) -> Option<BlendSlot> {
        let transition = self.transition.take()?;
        debug!(
            "Cancelled crossfade towards {:?} at {:.0}%",
            transition.target,
            transition.progress() * 100.
        );
        Some(transition.target)
    }

    pub fn tick(&mut self, delta: f32) {
        for slot in BlendSlot::ALL {
            self.slots[slot.index()].advance(delta, slot == BlendSlot::Main);
        }

        let Some(mut transition) = self.transition.take() else {
            self.sanitize_weights();
            return;
        };

        transition.elapsed += delta;
        let progress = transition.progress();

        if progress >= 1. {
            self.finish(transition.target);
        } else {
            self.apply_eased_weights(&transition, smoothstep(progress));
            self.transition = Some(transition);
        }
    }

    pub fn weight(&self, slot: BlendSlot) -> f32 {
        self.slots[slot.index()].weight
    }

    pub fn weights(&self) -> [f32; 3] {
        self.slots.each_ref().map(|slot| slot.weight)
    }

    pub fn slot(&self, slot: BlendSlot) -> &SlotPlayback {
        &self.slots[slot.index()]
    }

    pub fn transition(&self) -> Option<&BlendTransition> {
        self.transition.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn last_reactive(&self) -> Option<BlendSlot> {
        self.last_reactive
    }

    /// Slot with the highest weight, main on ties
    pub fn dominant_slot(&self) -> BlendSlot {
        BlendSlot::ALL
            .into_iter()
            .fold(BlendSlot::Main, |best, slot| {
                if self.weight(slot) > self.weight(best) {
                    slot
                } else {
                    best
                }
            })
    }

    fn next_reactive_slot(&self) -> BlendSlot {
        self.last_reactive
            .map(BlendSlot::other_reactive)
            .unwrap_or(BlendSlot::ReactiveA)
    }

    fn check_can_start(&self, duration: f32) -> Result<(), BlendError> {
        if !duration.is_finite() || duration < 0. {
            return Err(BlendError::InvalidDuration(duration));
        }
        if let Some(transition) = &self.transition {
            return Err(BlendError::TransitionInFlight(transition.target));
        }
        Ok(())
    }

    fn start_transition(&mut self, target: BlendSlot, duration: f32) {
        let transition = BlendTransition {
            target,
            elapsed: 0.,
            duration,
            start_weights: self.weights(),
        };

        if duration <= 0. {
            self.finish(target);
        } else {
            self.transition = Some(transition);
        }
    }

    fn apply_eased_weights(&mut self, transition: &BlendTransition, eased: f32) {
        for slot in BlendSlot::ALL {
            let start = transition.start_weights[slot.index()];
            self.slots[slot.index()].weight = if slot == transition.target {
                start + (1. - start) * eased
            } else {
                start * (1. - eased)
            };
        }
        self.sanitize_weights();
    }

    /// Forces the resting state of a finished crossfade, regardless of easing rounding.
    fn finish(&mut self, target: BlendSlot) {
        for slot in BlendSlot::ALL {
            self.slots[slot.index()].weight = if slot == target { 1. } else { 0. };
        }

        match target {
            BlendSlot::Main => {
                self.slots[BlendSlot::ReactiveA.index()].disconnect();
                self.slots[BlendSlot::ReactiveB.index()].disconnect();
                self.last_reactive = None;
            }
            reactive => {
                self.slots[reactive.other_reactive().index()].disconnect();
            }
        }
    }

    /// Clamps every weight to `[0, 1]` and scales them down if they add up to more than one.
    fn sanitize_weights(&mut self) {
        for slot in &mut self.slots {
            slot.weight = if slot.weight.is_finite() {
                slot.weight.clamp(0., 1.)
            } else {
                0.
            };
        }

        let sum: f32 = self.slots.iter().map(|slot| slot.weight).sum();
        if sum > 1. + WEIGHT_SUM_TOLERANCE {
            for slot in &mut self.slots {
                slot.weight /= sum;
            }
        }
    }
}
