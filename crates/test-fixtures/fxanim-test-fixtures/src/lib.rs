use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use fxanim_core::{BasicPuppet, EffectTable, FrameDriver, Puppet};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    effects: HashMap<String, String>,
    filters: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Effect tables (`animated` objects) keyed by fixture name.
pub mod effects {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.effects.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.effects, "effect", name)?)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        super::load_json(lookup(&MANIFEST.effects, "effect", name)?)
    }

    /// Parse through the tolerant effect-table ingestion.
    pub fn table(name: &str) -> Result<EffectTable> {
        let text = json(name)?;
        fxanim_core::parse_effect_table(&text)
            .with_context(|| format!("effect fixture '{name}' is not an effect table"))
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        Ok(resolve_path(lookup(&MANIFEST.effects, "effect", name)?))
    }
}

/// Filter parameter objects keyed by fixture name.
pub mod filters {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.filters.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.filters, "filter", name)?)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        super::load_json(lookup(&MANIFEST.filters, "filter", name)?)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        Ok(resolve_path(lookup(&MANIFEST.filters, "filter", name)?))
    }
}

/// A subscription change requested by the scheduler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    Subscribe,
    Unsubscribe,
}

/// Frame driver with a hand-cranked clock. Records every subscription change.
#[derive(Clone, Debug)]
pub struct ManualDriver {
    pub now: f64,
    pub min_interval: f64,
    pub subscribed: bool,
    pub transitions: Vec<Transition>,
}

impl ManualDriver {
    /// Driver at time zero with a 60 fps threshold.
    pub fn new() -> Self {
        Self::with_interval(1000.0 / 60.0)
    }

    pub fn with_interval(min_interval: f64) -> Self {
        Self {
            now: 0.0,
            min_interval,
            subscribed: false,
            transitions: Vec::new(),
        }
    }

    pub fn advance(&mut self, ms: f64) -> f64 {
        self.now += ms;
        self.now
    }

    pub fn set_now(&mut self, ms: f64) {
        self.now = ms;
    }
}

impl Default for ManualDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver for ManualDriver {
    fn now(&self) -> f64 {
        self.now
    }

    fn min_interval(&self) -> f64 {
        self.min_interval
    }

    fn subscribe(&mut self) {
        self.subscribed = true;
        self.transitions.push(Transition::Subscribe);
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
        self.transitions.push(Transition::Unsubscribe);
    }
}

/// Puppet that records every property write and counts per-frame hooks.
#[derive(Clone, Debug, Default)]
pub struct TestPuppet {
    pub inner: BasicPuppet,
    pub writes: Vec<(String, f64)>,
    pub pre_computes: usize,
}

impl TestPuppet {
    pub fn new(animated: EffectTable) -> Self {
        Self {
            inner: BasicPuppet::new(animated),
            ..Self::default()
        }
    }

    /// Puppet driven by a named effect fixture.
    pub fn from_fixture(name: &str) -> Result<Self> {
        Ok(Self::new(effects::table(name)?))
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.inner = self.inner.with_owner(owner);
        self
    }

    /// Values written to `name`, in order.
    pub fn writes_to(&self, name: &str) -> Vec<f64> {
        self.writes
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl Puppet for TestPuppet {
    fn effects(&self) -> &EffectTable {
        self.inner.effects()
    }

    fn effects_mut(&mut self) -> &mut EffectTable {
        self.inner.effects_mut()
    }

    fn property(&self, name: &str) -> Option<f64> {
        self.inner.property(name)
    }

    fn set_property(&mut self, name: &str, value: f64) {
        self.writes.push((name.to_owned(), value));
        self.inner.set_property(name, value);
    }

    fn pre_compute(&mut self) {
        self.pre_computes += 1;
    }

    fn owner_id(&self) -> Option<&str> {
        self.inner.owner_id()
    }
}
