//! Animator: per-puppet timing state and generator dispatch.
//!
//! Methods:
//! - new (normalize + bind), normalize (re-normalize, sync state with the effect set),
//!   cycle_check (loop/pause transitions), animate (check → dispatch → advance)

use hashbrown::HashMap;
use log::debug;
use rand::rngs::StdRng;
use std::rc::Rc;

use crate::effect::EffectConfig;
use crate::generator::{Generator, GeneratorFn, GeneratorInput};
use crate::ids::AnimatorId;
use crate::puppet::{Puppet, SharedPuppet, WeakPuppet};

/// Outcome of a cycle check for one effect on one tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CycleStatus {
    /// Dispatch the generator and advance elapsed time.
    Ready,
    /// Inside a pause-between-loop gap; skip this tick.
    Pausing,
    /// The configured loop count was reached; the effect has been deactivated.
    Finished,
}

/// Timing state of one effect.
#[derive(Clone, Debug, Default)]
pub struct EffectState {
    /// Elapsed time within the current loop (ms). Keeps overshoot across loop boundaries.
    pub elapsed: f64,
    /// Frame delta seen by the last cycle check.
    pub frame_time: f64,
    /// Completed loops, only counted for finite loop counts.
    pub loop_count: u32,
    pub pause_elapsed: f64,
    pub pause_active: bool,
    /// Set at a loop boundary, consumed by per-loop generators.
    pub ping: bool,
    binding: Option<(Generator, GeneratorFn)>,
}

impl EffectState {
    pub fn new(generator: Option<Generator>) -> Self {
        let mut state = Self::default();
        state.bind(generator);
        state
    }

    /// Bind the dispatch entry for a generator kind.
    pub fn bind(&mut self, generator: Option<Generator>) {
        self.binding = generator.map(|g| (g, g.function()));
    }

    #[inline]
    pub fn bound_generator(&self) -> Option<Generator> {
        self.binding.map(|(g, _)| g)
    }

    /// Dispatch entry for `generator`, rebinding if the live config changed kind.
    fn dispatch_for(&mut self, generator: Option<Generator>) -> Option<GeneratorFn> {
        if self.bound_generator() != generator {
            if let Some(g) = generator {
                debug!(
                    "rebinding to {} (synchronized: {}, per-loop: {})",
                    g.name(),
                    g.is_synchronized(),
                    g.is_per_loop()
                );
            }
            self.bind(generator);
        }
        self.binding.map(|(_, f)| f)
    }

    fn in_pause_gap(&mut self, config: &EffectConfig, frame_delta: f64) -> bool {
        if self.pause_active && config.pause_between_duration > 0.0 {
            self.pause_elapsed += frame_delta;
            if self.pause_elapsed < config.pause_between_duration {
                return true;
            }
            self.pause_elapsed = 0.0;
            self.pause_active = false;
        }
        false
    }

    /// Advance loop/pause bookkeeping for this tick. May write `active = false` into `config`.
    pub fn cycle_check(&mut self, config: &mut EffectConfig, frame_delta: f64) -> CycleStatus {
        self.frame_time = frame_delta;
        if self.in_pause_gap(config, frame_delta) {
            return CycleStatus::Pausing;
        }
        if self.elapsed > config.loop_duration {
            self.elapsed -= config.loop_duration;
            self.ping = true;
            if config.loops.is_finite() {
                self.loop_count += 1;
            }
            if config.loops.is_reached_by(self.loop_count) {
                self.loop_count = 0;
                config.active = false;
                return CycleStatus::Finished;
            } else if config.pause_between_duration > 0.0 {
                self.pause_active = true;
            }
        }
        CycleStatus::Ready
    }
}

/// Per-frame inputs shared by every animator in a tick.
pub struct FrameContext<'a> {
    /// Milliseconds since the previous animated frame.
    pub frame_delta: f64,
    /// Shared clock time (ms) driving synchronized generators.
    pub clock: f64,
    pub rng: &'a mut StdRng,
}

/// Drives the effects of one puppet.
///
/// The puppet's effect table is read and written live: host edits are seen on
/// the next tick, and loop exhaustion is written back as `active = false`.
#[derive(Debug)]
pub struct Animator {
    id: AnimatorId,
    puppet: WeakPuppet,
    owner: Option<String>,
    states: HashMap<String, EffectState>,
    is_good: bool,
}

impl Animator {
    /// Build an animator for `puppet`. A puppet without effects yields an inert animator
    /// (`is_good() == false`) that the scheduler refuses to register.
    pub fn new(puppet: SharedPuppet) -> Self {
        let mut animator = Self {
            id: AnimatorId::new(),
            puppet: Rc::downgrade(&puppet),
            owner: puppet.borrow().owner_id().map(str::to_owned),
            states: HashMap::new(),
            is_good: false,
        };
        let mut guard = puppet.borrow_mut();
        if guard.effects().is_empty() {
            debug!("animator {}: puppet has no effects, staying inert", animator.id);
            return animator;
        }
        animator.normalize_with(&mut *guard);
        animator.is_good = true;
        animator
    }

    #[inline]
    pub fn id(&self) -> AnimatorId {
        self.id
    }

    #[inline]
    pub fn is_good(&self) -> bool {
        self.is_good
    }

    /// Owner id captured from the puppet at construction.
    #[inline]
    pub fn owner_id(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Strong handle to the puppet, if the host still holds it.
    pub fn puppet(&self) -> Option<SharedPuppet> {
        self.puppet.upgrade()
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.puppet.strong_count() > 0
    }

    pub fn state(&self, effect: &str) -> Option<&EffectState> {
        self.states.get(effect)
    }

    pub fn state_mut(&mut self, effect: &str) -> Option<&mut EffectState> {
        self.states.get_mut(effect)
    }

    /// Re-normalize the puppet's table, initialize state for effects added since
    /// construction and drop state for removed ones. Returns false when the puppet is gone.
    pub fn normalize(&mut self) -> bool {
        let Some(puppet) = self.puppet.upgrade() else {
            return false;
        };
        let mut guard = puppet.borrow_mut();
        self.normalize_with(&mut *guard);
        true
    }

    fn normalize_with(&mut self, puppet: &mut dyn Puppet) {
        let table = puppet.effects_mut();
        table.normalize();
        self.states.retain(|name, _| table.contains(name));
        for (name, config) in table.iter() {
            match self.states.get_mut(name) {
                Some(state) => state.bind(config.generator),
                None => {
                    self.states
                        .insert(name.to_owned(), EffectState::new(config.generator));
                }
            }
        }
    }

    /// Run the cycle check of a single effect without dispatching.
    /// `None` when the effect or the puppet does not exist.
    pub fn cycle_check(&mut self, effect: &str, frame_delta: f64) -> Option<CycleStatus> {
        let puppet = self.puppet.upgrade()?;
        let mut guard = puppet.borrow_mut();
        let config = guard.effects_mut().get_mut(effect)?;
        let state = self
            .states
            .entry(effect.to_owned())
            .or_insert_with(|| EffectState::new(config.generator));
        Some(state.cycle_check(config, frame_delta))
    }

    /// Evaluate every active effect for one frame. Returns false when the puppet is gone.
    pub fn animate(&mut self, frame: &mut FrameContext<'_>) -> bool {
        let Some(puppet) = self.puppet.upgrade() else {
            return false;
        };
        let mut guard = puppet.borrow_mut();
        let names: Vec<String> = guard.effects().names().map(str::to_owned).collect();

        for name in names {
            let Some(config) = guard.effects_mut().get_mut(&name) else {
                continue;
            };
            if !config.active {
                continue;
            }
            let state = self
                .states
                .entry(name.clone())
                .or_insert_with(|| EffectState::new(config.generator));
            match state.cycle_check(config, frame.frame_delta) {
                CycleStatus::Ready => {}
                CycleStatus::Pausing => continue,
                CycleStatus::Finished => {
                    debug!("animator {}: effect '{name}' finished its loops", self.id);
                    continue;
                }
            }
            let config = *config;

            if let Some(dispatch) = state.dispatch_for(config.generator) {
                let current = guard.property(&name).unwrap_or(0.0);
                let mut input = GeneratorInput {
                    config: &config,
                    elapsed: state.elapsed,
                    frame_time: state.frame_time,
                    clock: frame.clock,
                    current,
                    ping: &mut state.ping,
                    rng: &mut *frame.rng,
                };
                if let Some(value) = dispatch(&mut input) {
                    guard.set_property(&name, value);
                }
            }
            state.elapsed += frame.frame_delta;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectTable, Loops};
    use crate::puppet::{share, BasicPuppet};
    use rand::SeedableRng;

    fn frame(rng: &mut StdRng, delta: f64, clock: f64) -> FrameContext<'_> {
        FrameContext {
            frame_delta: delta,
            clock,
            rng,
        }
    }

    #[test]
    fn cycle_check_wraps_and_keeps_overshoot() {
        let mut config = EffectConfig {
            loop_duration: 100.0,
            ..EffectConfig::default()
        };
        let mut state = EffectState {
            elapsed: 130.0,
            ..EffectState::default()
        };
        assert_eq!(state.cycle_check(&mut config, 16.0), CycleStatus::Ready);
        assert_eq!(state.elapsed, 30.0);
        assert!(state.ping);
        assert_eq!(state.loop_count, 0);
        assert_eq!(state.frame_time, 16.0);
    }

    #[test]
    fn cycle_check_exactly_at_duration_does_not_wrap() {
        let mut config = EffectConfig {
            loop_duration: 100.0,
            loops: Loops::Finite(1),
            ..EffectConfig::default()
        };
        let mut state = EffectState {
            elapsed: 100.0,
            ..EffectState::default()
        };
        assert_eq!(state.cycle_check(&mut config, 16.0), CycleStatus::Ready);
        assert!(config.active);
        state.elapsed = 100.5;
        assert_eq!(state.cycle_check(&mut config, 16.0), CycleStatus::Finished);
        assert!(!config.active);
        assert_eq!(state.loop_count, 0);
    }

    #[test]
    fn empty_puppet_is_inert() {
        let puppet = share(BasicPuppet::default());
        let animator = Animator::new(puppet.clone());
        assert!(!animator.is_good());
        assert!(animator.state("anything").is_none());
    }

    #[test]
    fn generator_sees_pre_increment_elapsed() {
        let table = EffectTable::new().with(
            "x",
            EffectConfig {
                val1: 100.0,
                val2: 0.0,
                loop_duration: 1000.0,
                ..EffectConfig::with_generator(Generator::MoveToward)
            },
        );
        let puppet = share(BasicPuppet::new(table));
        let mut animator = Animator::new(puppet.clone());
        let mut rng = StdRng::seed_from_u64(0);

        animator.animate(&mut frame(&mut rng, 100.0, 100.0));
        assert_eq!(puppet.borrow().property("x"), Some(0.0));
        assert_eq!(animator.state("x").unwrap().elapsed, 100.0);

        animator.animate(&mut frame(&mut rng, 100.0, 200.0));
        assert_eq!(puppet.borrow().property("x"), Some(10.0));
    }

    #[test]
    fn live_generator_change_rebinds() {
        let table = EffectTable::new().with("x", EffectConfig::with_generator(Generator::Move));
        let puppet = share(BasicPuppet::new(table));
        let mut animator = Animator::new(puppet.clone());
        assert_eq!(
            animator.state("x").unwrap().bound_generator(),
            Some(Generator::Move)
        );

        puppet.borrow_mut().animated.get_mut("x").unwrap().generator = Some(Generator::Rotation);
        let mut rng = StdRng::seed_from_u64(0);
        animator.animate(&mut frame(&mut rng, 16.0, 16.0));
        assert_eq!(
            animator.state("x").unwrap().bound_generator(),
            Some(Generator::Rotation)
        );
        assert_eq!(puppet.borrow().property("x"), Some(360.0));
    }

    #[test]
    fn normalize_picks_up_new_effects() {
        let table = EffectTable::new().with("x", EffectConfig::default());
        let puppet = share(BasicPuppet::new(table));
        let mut animator = Animator::new(puppet.clone());
        puppet.borrow_mut().animated.insert(
            "y",
            EffectConfig {
                loop_duration: 0.0,
                ..EffectConfig::with_generator(Generator::SinOscillation)
            },
        );
        assert!(animator.state("y").is_none());
        assert!(animator.normalize());
        assert!(animator.state("y").is_some());
        assert_eq!(puppet.borrow().animated.get("y").unwrap().loop_duration, 3000.0);
    }

    #[test]
    fn normalize_forgets_removed_effects() {
        let table = EffectTable::new()
            .with("x", EffectConfig::with_generator(Generator::Move))
            .with("y", EffectConfig::with_generator(Generator::Rotation));
        let puppet = share(BasicPuppet::new(table));
        let mut animator = Animator::new(puppet.clone());
        assert!(animator.state("y").is_some());

        puppet.borrow_mut().animated.remove("y");
        assert!(animator.normalize());
        assert!(animator.state("x").is_some());
        assert!(animator.state("y").is_none());
    }

    #[test]
    fn dropped_puppet_stops_animation() {
        let table = EffectTable::new().with("x", EffectConfig::with_generator(Generator::Move));
        let puppet = share(BasicPuppet::new(table));
        let mut animator = Animator::new(puppet.clone());
        drop(puppet);
        assert!(!animator.is_alive());
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!animator.animate(&mut frame(&mut rng, 16.0, 16.0)));
    }
}
