//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`Scheduler`](crate::Scheduler).
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for the random source shared by chaotic and random generators.
    /// `None` seeds from OS entropy, which makes those generators non-reproducible.
    pub rng_seed: Option<u64>,

    /// Drop animators whose puppet has been released by the host at the end of a tick.
    pub reap_dropped_puppets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rng_seed: None,
            reap_dropped_puppets: true,
        }
    }
}

impl Config {
    /// Config with a fixed random seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng_seed: Some(seed),
            ..Self::default()
        }
    }
}
