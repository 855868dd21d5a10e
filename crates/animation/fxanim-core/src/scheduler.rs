//! Scheduler: animator registry and the shared animation clock.
//!
//! Methods:
//! - register / animate_puppet, unregister / unregister_by_owner, reset
//! - activate / deactivate (host lifecycle)
//! - tick (called by the frame driver once per frame)
//!
//! The tick callback is subscribed to the driver iff the scheduler is
//! activated and not suspended. Suspended means the registry is empty.

use indexmap::IndexMap;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::animator::{Animator, FrameContext};
use crate::config::Config;
use crate::error::{AnimeError, Result};
use crate::ids::AnimatorId;
use crate::puppet::SharedPuppet;

/// Host frame source. The scheduler asks it to start or stop calling
/// [`Scheduler::tick`]; the host performs the actual calls.
pub trait FrameDriver {
    /// Monotonic time of the current frame, in milliseconds.
    fn now(&self) -> f64;

    /// Minimum frame delta (ms) worth animating.
    fn min_interval(&self) -> f64;

    fn subscribe(&mut self);

    fn unsubscribe(&mut self);
}

/// What a call to [`Scheduler::tick`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// False when the tick was skipped (unsubscribed or below the minimum interval).
    pub ran: bool,
    pub frame_delta: f64,
    /// Animators whose puppet was evaluated.
    pub animated: usize,
    /// Animators dropped because their puppet is gone.
    pub reaped: usize,
}

pub struct Scheduler<D: FrameDriver> {
    driver: D,
    cfg: Config,
    animators: IndexMap<AnimatorId, Animator>,
    suspended: bool,
    activated: bool,
    subscribed: bool,
    last_time: f64,
    prev_time: f64,
    rng: StdRng,
}

impl<D: FrameDriver> Scheduler<D> {
    /// Create an empty, suspended and deactivated scheduler.
    pub fn new(driver: D, cfg: Config) -> Self {
        let rng = match cfg.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            driver,
            cfg,
            animators: IndexMap::new(),
            suspended: true,
            activated: false,
            subscribed: false,
            last_time: 0.0,
            prev_time: 0.0,
            rng,
        }
    }

    /// Register a valid animator; inert animators are ignored and yield `None`.
    /// Registering into an empty registry resumes the scheduler.
    pub fn register(&mut self, animator: Animator) -> Option<AnimatorId> {
        if !animator.is_good() {
            debug!("ignoring inert animator {}", animator.id());
            return None;
        }
        let id = animator.id();
        self.animators.insert(id, animator);
        debug!("registered animator {id} ({} total)", self.animators.len());
        if self.suspended {
            self.resume();
        }
        Some(id)
    }

    /// Build an animator for `puppet` and register it.
    pub fn animate_puppet(&mut self, puppet: SharedPuppet) -> Option<AnimatorId> {
        self.register(Animator::new(puppet))
    }

    /// Remove one animator by id.
    pub fn unregister(&mut self, id: AnimatorId) -> Result<Animator> {
        let animator = self
            .animators
            .shift_remove(&id)
            .ok_or(AnimeError::UnknownAnimator { id })?;
        debug!("unregistered animator {id}");
        self.suspend_if_empty();
        Ok(animator)
    }

    /// Remove every animator whose puppet currently belongs to `owner`; dropped puppets
    /// match on the owner seen at registration. Returns how many were removed.
    pub fn unregister_by_owner(&mut self, owner: &str) -> usize {
        let before = self.animators.len();
        self.animators.retain(|_, a| {
            let Some(puppet) = a.puppet() else {
                return a.owner_id() != Some(owner);
            };
            let owned = puppet.borrow().owner_id() == Some(owner);
            !owned
        });
        let removed = before - self.animators.len();
        if removed > 0 {
            debug!("unregistered {removed} animator(s) owned by '{owner}'");
        }
        self.suspend_if_empty();
        removed
    }

    /// Clear the registry (scene teardown).
    pub fn reset(&mut self) {
        self.animators.clear();
        self.suspend();
    }

    /// Re-normalize one animator's puppet table.
    pub fn renormalize(&mut self, id: AnimatorId) -> Result<()> {
        let animator = self
            .animators
            .get_mut(&id)
            .ok_or(AnimeError::UnknownAnimator { id })?;
        if !animator.normalize() {
            return Err(AnimeError::PuppetDropped { id });
        }
        Ok(())
    }

    /// Host is ready to render.
    pub fn activate(&mut self) {
        self.activated = true;
        if !self.suspended {
            self.sync_subscription();
            self.seed_clock();
        }
    }

    /// Host is no longer rendering.
    pub fn deactivate(&mut self) {
        self.activated = false;
        self.sync_subscription();
        self.zero_clock();
    }

    /// Advance the shared clock and, when at least one driver interval has passed,
    /// run every registered animator.
    pub fn tick(&mut self) -> TickReport {
        if !self.subscribed {
            trace!("tick while unsubscribed; ignoring");
            return TickReport::default();
        }
        self.last_time = self.driver.now();
        let frame_delta = self.last_time - self.prev_time;
        if frame_delta < self.driver.min_interval() {
            trace!("skipping sub-interval frame ({frame_delta} ms)");
            return TickReport {
                frame_delta,
                ..TickReport::default()
            };
        }

        let mut frame = FrameContext {
            frame_delta,
            clock: self.last_time,
            rng: &mut self.rng,
        };
        let mut animated = 0;
        let mut dropped = Vec::new();
        for (id, animator) in self.animators.iter_mut() {
            let Some(puppet) = animator.puppet() else {
                dropped.push(*id);
                continue;
            };
            puppet.borrow_mut().pre_compute();
            animator.animate(&mut frame);
            animated += 1;
        }
        self.prev_time = self.last_time;

        let mut reaped = 0;
        if self.cfg.reap_dropped_puppets && !dropped.is_empty() {
            for id in dropped {
                self.animators.shift_remove(&id);
                debug!("reaped animator {id}: puppet dropped");
                reaped += 1;
            }
            self.suspend_if_empty();
        }

        TickReport {
            ran: true,
            frame_delta,
            animated,
            reaped,
        }
    }

    fn resume(&mut self) {
        self.suspended = false;
        if self.activated {
            self.sync_subscription();
            self.seed_clock();
        }
        debug!("scheduler resumed");
    }

    fn suspend(&mut self) {
        self.suspended = true;
        self.sync_subscription();
        self.zero_clock();
        debug!("scheduler suspended");
    }

    fn suspend_if_empty(&mut self) {
        if self.animators.is_empty() && !self.suspended {
            self.suspend();
        }
    }

    fn sync_subscription(&mut self) {
        let wanted = self.activated && !self.suspended;
        if wanted == self.subscribed {
            return;
        }
        if wanted {
            self.driver.subscribe();
        } else {
            self.driver.unsubscribe();
        }
        self.subscribed = wanted;
    }

    fn seed_clock(&mut self) {
        self.last_time = self.driver.now();
        self.prev_time = self.last_time;
    }

    fn zero_clock(&mut self) {
        self.last_time = 0.0;
        self.prev_time = 0.0;
    }
}

impl<D: FrameDriver> Scheduler<D> {
    #[inline]
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    #[inline]
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Shared clock time of the last animated frame.
    #[inline]
    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    #[inline]
    pub fn prev_time(&self) -> f64 {
        self.prev_time
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.animators.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: AnimatorId) -> bool {
        self.animators.contains_key(&id)
    }

    pub fn get(&self, id: AnimatorId) -> Option<&Animator> {
        self.animators.get(&id)
    }

    pub fn get_mut(&mut self, id: AnimatorId) -> Option<&mut Animator> {
        self.animators.get_mut(&id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = AnimatorId> + '_ {
        self.animators.keys().copied()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectConfig, EffectTable};
    use crate::puppet::{share, BasicPuppet};

    #[derive(Default)]
    struct StubDriver {
        now: f64,
        subscribed: bool,
        calls: usize,
    }

    impl FrameDriver for StubDriver {
        fn now(&self) -> f64 {
            self.now
        }
        fn min_interval(&self) -> f64 {
            10.0
        }
        fn subscribe(&mut self) {
            self.subscribed = true;
            self.calls += 1;
        }
        fn unsubscribe(&mut self) {
            self.subscribed = false;
            self.calls += 1;
        }
    }

    fn puppet() -> std::rc::Rc<std::cell::RefCell<BasicPuppet>> {
        share(BasicPuppet::new(
            EffectTable::new().with("x", EffectConfig::default()),
        ))
    }

    #[test]
    fn starts_suspended_and_unsubscribed() {
        let mut s = Scheduler::new(StubDriver::default(), Config::seeded(1));
        assert!(s.is_suspended());
        s.activate();
        assert!(!s.is_subscribed());
        assert_eq!(s.driver().calls, 0);
        assert!(!s.tick().ran);
    }

    #[test]
    fn subscription_follows_both_flags() {
        let mut s = Scheduler::new(StubDriver::default(), Config::seeded(1));
        let p = puppet();
        s.driver_mut().now = 500.0;
        let id = s.animate_puppet(p.clone()).unwrap();
        assert!(!s.is_suspended());
        assert!(!s.is_subscribed());

        s.activate();
        assert!(s.driver().subscribed);
        assert_eq!(s.last_time(), 500.0);
        assert_eq!(s.prev_time(), 500.0);

        s.deactivate();
        assert!(!s.driver().subscribed);
        assert_eq!(s.last_time(), 0.0);

        s.activate();
        s.unregister(id).unwrap();
        assert!(s.is_suspended());
        assert!(s.is_activated());
        assert!(!s.driver().subscribed);
        assert_eq!(s.driver().calls, 4);
    }

    #[test]
    fn repeated_activation_subscribes_once() {
        let mut s = Scheduler::new(StubDriver::default(), Config::seeded(1));
        let p = puppet();
        s.animate_puppet(p.clone());
        s.activate();
        s.activate();
        assert_eq!(s.driver().calls, 1);
    }

    #[test]
    fn inert_animator_is_not_registered() {
        let mut s = Scheduler::new(StubDriver::default(), Config::seeded(1));
        let empty = share(BasicPuppet::default());
        assert!(s.animate_puppet(empty).is_none());
        assert!(s.is_empty());
        assert!(s.is_suspended());
    }

    #[test]
    fn unknown_id_is_an_error() {
        let mut s = Scheduler::new(StubDriver::default(), Config::seeded(1));
        let err = s.unregister(AnimatorId::new()).unwrap_err();
        assert!(matches!(err, AnimeError::UnknownAnimator { .. }));
    }

    #[test]
    fn sub_interval_frames_do_not_advance_prev_time() {
        let mut s = Scheduler::new(StubDriver::default(), Config::seeded(1));
        let p = puppet();
        s.animate_puppet(p.clone());
        s.activate();
        s.driver_mut().now = 5.0;
        let report = s.tick();
        assert!(!report.ran);
        assert_eq!(s.prev_time(), 0.0);
        s.driver_mut().now = 12.0;
        let report = s.tick();
        assert!(report.ran);
        assert_eq!(report.frame_delta, 12.0);
        assert_eq!(s.prev_time(), 12.0);
    }
}
