//! Generator kinds and their dispatch table.
//!
//! Each effect names a generator (`animType`); the name is parsed once into a
//! [`Generator`] at normalization time and bound to a [`GeneratorFn`] through
//! [`Generator::function`]. Unknown names never reach dispatch.

pub mod functions;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::effect::EffectConfig;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Generator {
    MoveToward,
    ColorOscillation,
    CosOscillation,
    SinOscillation,
    ChaoticOscillation,
    SyncCosOscillation,
    SyncSinOscillation,
    SyncChaoticOscillation,
    Rotation,
    SyncRotation,
    RandomNumber,
    RandomNumberPerLoop,
    RandomColor,
    RandomColorPerLoop,
    Move,
}

impl Generator {
    pub const ALL: [Generator; 15] = [
        Generator::MoveToward,
        Generator::ColorOscillation,
        Generator::CosOscillation,
        Generator::SinOscillation,
        Generator::ChaoticOscillation,
        Generator::SyncCosOscillation,
        Generator::SyncSinOscillation,
        Generator::SyncChaoticOscillation,
        Generator::Rotation,
        Generator::SyncRotation,
        Generator::RandomNumber,
        Generator::RandomNumberPerLoop,
        Generator::RandomColor,
        Generator::RandomColorPerLoop,
        Generator::Move,
    ];

    /// Authored name of this generator.
    pub fn name(self) -> &'static str {
        match self {
            Generator::MoveToward => "moveToward",
            Generator::ColorOscillation => "colorOscillation",
            Generator::CosOscillation => "cosOscillation",
            Generator::SinOscillation => "sinOscillation",
            Generator::ChaoticOscillation => "chaoticOscillation",
            Generator::SyncCosOscillation => "syncCosOscillation",
            Generator::SyncSinOscillation => "syncSinOscillation",
            Generator::SyncChaoticOscillation => "syncChaoticOscillation",
            Generator::Rotation => "rotation",
            Generator::SyncRotation => "syncRotation",
            Generator::RandomNumber => "randomNumber",
            Generator::RandomNumberPerLoop => "randomNumberPerLoop",
            Generator::RandomColor => "randomColor",
            Generator::RandomColorPerLoop => "randomColorPerLoop",
            Generator::Move => "move",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.name() == name)
    }

    /// Phase derives from the shared clock rather than the effect's elapsed time.
    pub fn is_synchronized(self) -> bool {
        matches!(
            self,
            Generator::SyncCosOscillation
                | Generator::SyncSinOscillation
                | Generator::SyncChaoticOscillation
                | Generator::SyncRotation
        )
    }

    /// Writes only once per loop boundary.
    pub fn is_per_loop(self) -> bool {
        matches!(
            self,
            Generator::RandomNumberPerLoop | Generator::RandomColorPerLoop
        )
    }

    /// Dispatch table entry.
    pub fn function(self) -> GeneratorFn {
        match self {
            Generator::MoveToward => functions::move_toward,
            Generator::ColorOscillation => functions::color_oscillation,
            Generator::CosOscillation => functions::cos_oscillation,
            Generator::SinOscillation => functions::sin_oscillation,
            Generator::ChaoticOscillation => functions::chaotic_oscillation,
            Generator::SyncCosOscillation => functions::sync_cos_oscillation,
            Generator::SyncSinOscillation => functions::sync_sin_oscillation,
            Generator::SyncChaoticOscillation => functions::sync_chaotic_oscillation,
            Generator::Rotation => functions::rotation,
            Generator::SyncRotation => functions::sync_rotation,
            Generator::RandomNumber => functions::random_number,
            Generator::RandomNumberPerLoop => functions::random_number_per_loop,
            Generator::RandomColor => functions::random_color,
            Generator::RandomColorPerLoop => functions::random_color_per_loop,
            Generator::Move => functions::move_by_speed,
        }
    }
}

/// Everything a generator may read for one effect on one tick.
/// `elapsed` and `frame_time` are pre-increment values.
pub struct GeneratorInput<'a> {
    pub config: &'a EffectConfig,
    pub elapsed: f64,
    pub frame_time: f64,
    /// Shared clock time (ms) of the current tick.
    pub clock: f64,
    /// Current value of the puppet property the effect drives.
    pub current: f64,
    /// One-shot loop-boundary flag; per-loop generators consume it.
    pub ping: &'a mut bool,
    pub rng: &'a mut StdRng,
}

/// Returns the new property value, or `None` to leave the property untouched.
pub type GeneratorFn = fn(&mut GeneratorInput<'_>) -> Option<f64>;
