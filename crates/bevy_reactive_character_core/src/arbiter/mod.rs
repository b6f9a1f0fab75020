//! Per-character authority deciding which interrupter owns the character.

mod state;

use bevy::{
    ecs::entity::Entity,
    log::{debug, warn},
    math::Vec3,
};

use crate::{
    blend::{AnimationBlendController, BlendSlot},
    condition::{CharacterPose, ConditionSample, TrackerEdge, WorldSignals},
    gaze::{GazeController, GazeSettings, GazeTransition, LookAtOutput},
    interrupter::{BoundInterrupter, ClipRef, InterrupterId, InterruptionConfig},
    scheduler::{TaskId, TaskScheduler},
};

pub use state::{ActiveReaction, ArbiterState, Completion};

/// Length of every crossfade started by the arbiter, in seconds
pub const CROSSFADE_DURATION: f32 = 0.5;
/// How long a gaze-only reaction owns the character, in seconds
pub const LOOK_ONLY_TIMEOUT: f32 = 5.;

/// Record of an arbitration decision
#[derive(Clone, Debug, PartialEq)]
pub enum ArbiterEvent {
    /// An evaluator delivered a request
    Fired {
        id: InterrupterId,
        config: InterruptionConfig,
    },
    /// An interrupter became active. `slot` is the reactive slot it plays in, if any.
    Started {
        id: InterrupterId,
        slot: Option<BlendSlot>,
    },
    Preempted {
        suppressed: InterrupterId,
        by: InterrupterId,
    },
    Enqueued(InterrupterId),
    DroppedSuppressed(InterrupterId),
    /// The condition of a suppressed interrupter went false, it may fire again
    Released(InterrupterId),
    Completed(InterrupterId),
    ReturnedToMain,
}

/// Resolves interruption requests for a single character and drives its blend and gaze
/// controllers.
///
/// At most one interrupter is active at a time. A strictly higher priority request preempts the
/// active one, which is then suppressed until its own condition goes false. Other requests wait
/// until the active reaction completes.
#[derive(Clone, Debug)]
pub struct InterruptionArbiter {
    interrupters: Vec<BoundInterrupter>,
    state: ArbiterState,
    scheduler: TaskScheduler<(InterrupterId, Completion)>,
    blend: AnimationBlendController,
    gaze: GazeController,
    events: Vec<ArbiterEvent>,
}

impl InterruptionArbiter {
    pub fn new(
        interrupters: Vec<BoundInterrupter>,
        main_clip: Option<ClipRef>,
        gaze_settings: GazeSettings,
    ) -> Self {
        let mut blend = AnimationBlendController::new();
        if let Some(clip) = main_clip {
            blend.play_main(clip);
        }

        Self {
            interrupters,
            state: ArbiterState::default(),
            scheduler: TaskScheduler::new(),
            blend,
            gaze: GazeController::new(gaze_settings),
            events: Vec::new(),
        }
    }

    /// Runs a full tick: conditions, arbitration, timers, blending and gaze.
    ///
    /// `head_position` maps the gaze target entity to the world position of its head. Decisions
    /// are appended to [`Self::events`], which is never cleared here: callers ticking the arbiter
    /// themselves should call [`Self::drain_events`] once per frame.
    pub fn tick(
        &mut self,
        delta: f32,
        character: &CharacterPose,
        signals: &impl WorldSignals,
        head_position: impl FnOnce(Entity) -> Option<Vec3>,
    ) -> LookAtOutput {
        self.evaluate_conditions(delta, character, signals);
        self.advance(delta);
        let target_position = self.gaze.target().and_then(head_position);
        self.update_gaze(delta, target_position, character)
    }

    /// Evaluates every bound interrupter and forwards newly satisfied edges.
    pub fn evaluate_conditions(
        &mut self,
        delta: f32,
        character: &CharacterPose,
        signals: &impl WorldSignals,
    ) {
        for index in 0..self.interrupters.len() {
            let bound = &self.interrupters[index];
            let id = bound.id;
            let min_duration = bound.interrupter.min_duration;
            let sample = bound.interrupter.kind.evaluate(
                bound.interrupter.max_distance,
                character,
                bound.entity,
                signals,
            );

            let edge = self
                .state
                .trackers
                .entry(id)
                .or_default()
                .observe(sample.holds, delta, min_duration);

            match edge {
                TrackerEdge::Fire => {
                    let config = build_request(&self.interrupters[index], &sample);
                    debug!(
                        "Interrupter {:?} fired for {:?} (signal {:.3})",
                        self.interrupters[index].interrupter.name,
                        self.interrupters[index].entity_name,
                        sample.signal
                    );
                    self.events.push(ArbiterEvent::Fired {
                        id,
                        config: config.clone(),
                    });
                    self.handle_interruption(config, id);
                }
                TrackerEdge::Released => {
                    if self.state.suppressed.remove(&id) {
                        debug!("Interrupter {:?} released from suppression", id);
                        self.events.push(ArbiterEvent::Released(id));
                    }
                }
                TrackerEdge::Hold => {}
            }
        }
    }

    pub fn handle_interruption(&mut self, config: InterruptionConfig, id: InterrupterId) {
        if self.state.suppressed.contains(&id) {
            debug!("Dropping request from suppressed interrupter {:?}", id);
            self.events.push(ArbiterEvent::DroppedSuppressed(id));
            return;
        }

        let preempts = self
            .state
            .active
            .as_ref()
            .is_none_or(|active| config.priority > active.priority());

        if preempts {
            if let Some(previous) = self.state.active.take() {
                self.scheduler.cancel(previous.task);
                self.state.suppressed.insert(previous.id);
                self.state.overlaid.insert(previous.id);
                debug!(
                    "Interrupter {:?} (priority {}) preempted {:?} (priority {})",
                    id,
                    config.priority,
                    previous.id,
                    previous.priority()
                );
                self.events.push(ArbiterEvent::Preempted {
                    suppressed: previous.id,
                    by: id,
                });
            }
            self.start(id, config);
        } else if !self.state.is_active(id) && !self.state.waiting.contains_key(&id) {
            debug!(
                "Interrupter {:?} (priority {}) waiting behind the active reaction",
                id, config.priority
            );
            self.state.waiting.insert(id, config);
            self.events.push(ArbiterEvent::Enqueued(id));
        }
    }

    /// Starts the best waiting request, or returns the character to its main loop if nothing is
    /// waiting. Does nothing while a reaction is active.
    pub fn check_for_next_interruption(&mut self) {
        if self.state.active.is_some() {
            return;
        }

        let next = self
            .state
            .highest_waiting()
            .map(|(id, config)| (id, config.clone()));

        match next {
            Some((id, config)) => self.start(id, config),
            None => self.return_to_main(),
        }
    }

    /// Advances completion timers and the blend.
    pub fn advance(&mut self, delta: f32) {
        for (_, (id, completion)) in self.scheduler.advance(delta) {
            self.complete(id, completion);
        }
        self.blend.tick(delta);
    }

    pub fn update_gaze(
        &mut self,
        delta: f32,
        target_position: Option<Vec3>,
        character: &CharacterPose,
    ) -> LookAtOutput {
        self.gaze.tick(delta, target_position, character)
    }

    pub fn interrupters(&self) -> &[BoundInterrupter] {
        &self.interrupters
    }

    pub fn interrupter(&self, id: InterrupterId) -> Option<&BoundInterrupter> {
        self.interrupters.iter().find(|bound| bound.id == id)
    }

    pub fn state(&self) -> &ArbiterState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveReaction> {
        self.state.active.as_ref()
    }

    pub fn blend(&self) -> &AnimationBlendController {
        &self.blend
    }

    pub fn gaze(&self) -> &GazeController {
        &self.gaze
    }

    /// Seconds left before the active reaction completes
    pub fn active_remaining(&self) -> Option<f32> {
        self.state
            .active
            .as_ref()
            .and_then(|active| self.scheduler.remaining(active.task))
    }

    pub fn is_task_pending(&self, task: TaskId) -> bool {
        self.scheduler.is_pending(task)
    }

    /// Events recorded since the last [`Self::drain_events`]
    pub fn events(&self) -> &[ArbiterEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<ArbiterEvent> {
        std::mem::take(&mut self.events)
    }

    fn start(&mut self, id: InterrupterId, config: InterruptionConfig) {
        self.state.waiting.shift_remove(&id);
        self.state.overlaid.remove(&id);
        self.blend.cancel_transition();

        let (completion, delay, slot) = match &config.reactive_animation {
            Some(clip) => {
                self.blend.pause_main();
                let slot = match self.blend.play_reactive(clip.clone(), CROSSFADE_DURATION) {
                    Ok(slot) => Some(slot),
                    Err(error) => {
                        warn!("Could not play reactive clip {:?}: {}", clip.name, error);
                        None
                    }
                };
                (Completion::ReactiveClip, clip.duration, slot)
            }
            None => {
                self.blend.resume_main();
                if let Err(error) = self.blend.return_to_main(CROSSFADE_DURATION) {
                    warn!("Could not return to the main animation: {}", error);
                }
                (Completion::LookOnly, LOOK_ONLY_TIMEOUT, None)
            }
        };

        let task = self.scheduler.schedule(delay, (id, completion));

        let transition = if self.state.has_first_look_occurred {
            GazeTransition::SwitchTarget
        } else {
            GazeTransition::FirstLook
        };
        self.state.has_first_look_occurred = true;
        self.gaze.set_target(Some(config.source_entity), transition);

        debug!(
            "Interrupter {:?} active ({:?}, {:?})",
            id, completion, transition
        );
        self.events.push(ArbiterEvent::Started { id, slot });
        self.state.active = Some(ActiveReaction {
            id,
            config,
            completion,
            task,
        });
    }

    fn complete(&mut self, id: InterrupterId, completion: Completion) {
        if self.state.overlaid.contains(&id) {
            debug!("Ignoring {:?} completion of overlaid {:?}", completion, id);
            return;
        }
        if !self.state.is_active(id) {
            debug!("Ignoring stale {:?} completion of {:?}", completion, id);
            return;
        }

        self.state.active = None;
        debug!("Interrupter {:?} completed ({:?})", id, completion);
        self.events.push(ArbiterEvent::Completed(id));
        self.check_for_next_interruption();
    }

    fn return_to_main(&mut self) {
        self.blend.cancel_transition();
        self.blend.resume_main();
        if let Err(error) = self.blend.return_to_main(CROSSFADE_DURATION) {
            warn!("Could not return to the main animation: {}", error);
        }
        self.gaze.set_target(None, GazeTransition::ReturnToDefault);
        self.state.has_first_look_occurred = false;
        self.events.push(ArbiterEvent::ReturnedToMain);
    }
}

fn build_request(bound: &BoundInterrupter, sample: &ConditionSample) -> InterruptionConfig {
    InterruptionConfig {
        interruption_type: bound.interrupter.interruption_type(),
        target_position: sample.target_position,
        min_duration: bound.interrupter.min_duration,
        priority: bound.interrupter.priority,
        signal_value: sample.signal,
        source_entity: bound.entity,
        active_distance: sample.distance,
        reactive_animation: bound.interrupter.reactive_animation().cloned(),
    }
}
