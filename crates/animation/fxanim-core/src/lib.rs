//! FX Animation Core (host-agnostic)
//!
//! Tick-driven oscillators for ambient object effects. A [`Scheduler`] owns a
//! registry of [`Animator`]s and a shared clock; each animator drives the
//! effect table of one [`Puppet`], writing generator output into the puppet's
//! numeric properties once per frame. Frames come from a host
//! [`FrameDriver`]; nothing here renders.

pub mod animator;
pub mod config;
pub mod effect;
pub mod error;
pub mod generator;
pub mod ids;
pub mod puppet;
pub mod scheduler;

// Re-exports for consumers (hosts and adapters)
pub use animator::{Animator, CycleStatus, EffectState, FrameContext};
pub use config::Config;
pub use effect::{
    parse_effect_table, EffectConfig, EffectTable, Loops, DEFAULT_CHAOS_FACTOR,
    DEFAULT_LOOP_DURATION_MS,
};
pub use error::{AnimeError, Result};
pub use generator::{Generator, GeneratorFn, GeneratorInput};
pub use ids::AnimatorId;
pub use puppet::{share, BasicPuppet, PropertyBag, Puppet, SharedPuppet, WeakPuppet};
pub use scheduler::{FrameDriver, Scheduler, TickReport};
