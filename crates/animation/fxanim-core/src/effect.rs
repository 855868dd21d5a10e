//! Effect configuration: one entry per named effect on a puppet.
//!
//! Configurations are user-authored and ingested tolerantly: every field that
//! is missing or has the wrong type is replaced by its default, never rejected.
//! [`EffectConfig::normalize`] re-applies the same rules to an already typed
//! config and is idempotent.

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::{json_kind, AnimeError, Result};
use crate::generator::Generator;

pub const DEFAULT_LOOP_DURATION_MS: f64 = 3000.0;
pub const DEFAULT_CHAOS_FACTOR: f64 = 0.25;

/// How many loops an effect runs before it deactivates itself.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Loops {
    #[default]
    Infinite,
    Finite(u32),
}

impl Loops {
    /// Loop count from an authored number. Non-positive or non-finite counts are unbounded;
    /// fractional counts round up.
    pub fn from_count(count: f64) -> Self {
        if count.is_finite() && count > 0.0 {
            Loops::Finite(count.ceil().min(u32::MAX as f64) as u32)
        } else {
            Loops::Infinite
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        matches!(self, Loops::Finite(_))
    }

    /// True once `completed` loops satisfy the configured count.
    #[inline]
    pub fn is_reached_by(self, completed: u32) -> bool {
        match self {
            Loops::Infinite => false,
            Loops::Finite(n) => completed >= n,
        }
    }
}

// Infinite is written as `null`, which ingestion maps back to Infinite.
impl Serialize for Loops {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self {
            Loops::Infinite => serializer.serialize_none(),
            Loops::Finite(n) => serializer.serialize_u32(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Loops {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let raw = JsonValue::deserialize(deserializer)?;
        Ok(raw.as_f64().map(Loops::from_count).unwrap_or_default())
    }
}

/// Normalized configuration of a single effect.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "JsonValue")]
pub struct EffectConfig {
    pub active: bool,
    pub loops: Loops,
    /// Loop length in milliseconds, always > 0.
    pub loop_duration: f64,
    /// Gap between loops in milliseconds; 0 disables the gap.
    pub pause_between_duration: f64,
    /// Phase offset (fraction of a loop for oscillations, milliseconds for synchronized rotation).
    pub sync_shift: f64,
    pub val1: f64,
    pub val2: f64,
    #[serde(rename = "animType")]
    pub generator: Option<Generator>,
    /// Units per millisecond for the `move` generator.
    pub speed: f64,
    pub chaos_factor: f64,
    pub want_integer: bool,
    #[serde(rename = "clockWise")]
    pub clockwise: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            active: true,
            loops: Loops::Infinite,
            loop_duration: DEFAULT_LOOP_DURATION_MS,
            pause_between_duration: 0.0,
            sync_shift: 0.0,
            val1: 0.0,
            val2: 0.0,
            generator: None,
            speed: 0.0,
            chaos_factor: DEFAULT_CHAOS_FACTOR,
            want_integer: false,
            clockwise: false,
        }
    }
}

fn number(map: &Map<String, JsonValue>, key: &str) -> Option<f64> {
    map.get(key)
        .and_then(JsonValue::as_f64)
        .filter(|v| v.is_finite())
}

fn boolean(map: &Map<String, JsonValue>, key: &str) -> Option<bool> {
    map.get(key).and_then(JsonValue::as_bool)
}

impl EffectConfig {
    /// Config driven by `generator` with every other field at its default.
    pub fn with_generator(generator: Generator) -> Self {
        Self {
            generator: Some(generator),
            ..Self::default()
        }
    }

    /// Ingest an authored JSON record. Anything that is not an object yields the defaults.
    pub fn from_json(value: &JsonValue) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let d = Self::default();
        Self {
            active: boolean(map, "active").unwrap_or(d.active),
            loops: number(map, "loops")
                .map(Loops::from_count)
                .unwrap_or_default(),
            loop_duration: number(map, "loopDuration")
                .filter(|v| *v > 0.0)
                .unwrap_or(d.loop_duration),
            pause_between_duration: number(map, "pauseBetweenDuration")
                .filter(|v| *v > 0.0)
                .unwrap_or(d.pause_between_duration),
            sync_shift: number(map, "syncShift")
                .filter(|v| *v >= 0.0)
                .unwrap_or(d.sync_shift),
            val1: number(map, "val1").unwrap_or(d.val1),
            val2: number(map, "val2").unwrap_or(d.val2),
            generator: map
                .get("animType")
                .and_then(JsonValue::as_str)
                .and_then(|name| {
                    let generator = Generator::from_name(name);
                    if generator.is_none() {
                        warn!("unknown animType '{name}'; effect stays inert");
                    }
                    generator
                }),
            speed: number(map, "speed").unwrap_or(d.speed),
            chaos_factor: number(map, "chaosFactor").unwrap_or(d.chaos_factor),
            want_integer: boolean(map, "wantInteger").unwrap_or(d.want_integer),
            clockwise: boolean(map, "clockWise").unwrap_or(d.clockwise),
        }
    }

    /// Re-apply the defaulting rules to a typed config. Idempotent.
    pub fn normalize(&mut self) {
        let d = Self::default();
        if let Loops::Finite(0) = self.loops {
            self.loops = Loops::Infinite;
        }
        if !(self.loop_duration.is_finite() && self.loop_duration > 0.0) {
            self.loop_duration = d.loop_duration;
        }
        if !(self.pause_between_duration.is_finite() && self.pause_between_duration > 0.0) {
            self.pause_between_duration = d.pause_between_duration;
        }
        if !(self.sync_shift.is_finite() && self.sync_shift >= 0.0) {
            self.sync_shift = d.sync_shift;
        }
        for v in [&mut self.val1, &mut self.val2, &mut self.speed] {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
        if !self.chaos_factor.is_finite() {
            self.chaos_factor = d.chaos_factor;
        }
    }

    /// Normalized copy of this config.
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }
}

impl From<JsonValue> for EffectConfig {
    fn from(value: JsonValue) -> Self {
        Self::from_json(&value)
    }
}

/// Insertion-ordered mapping `effect name -> config`, owned by a puppet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectTable {
    entries: IndexMap<String, EffectConfig>,
}

impl EffectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a JSON object of effect records. Each record is ingested tolerantly;
    /// only a non-object envelope is an error.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let map = value.as_object().ok_or(AnimeError::NotAnObject {
            what: "effect table",
            found: json_kind(value),
        })?;
        let entries = map
            .iter()
            .map(|(name, raw)| (name.clone(), EffectConfig::from_json(raw)))
            .collect();
        Ok(Self { entries })
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, config: EffectConfig) -> Self {
        self.insert(name, config);
        self
    }

    /// Insert or replace an effect, returning the previous config.
    pub fn insert(&mut self, name: impl Into<String>, config: EffectConfig) -> Option<EffectConfig> {
        self.entries.insert(name.into(), config)
    }

    pub fn remove(&mut self, name: &str) -> Option<EffectConfig> {
        self.entries.shift_remove(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&EffectConfig> {
        self.entries.get(name)
    }

    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut EffectConfig> {
        self.entries.get_mut(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EffectConfig)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut EffectConfig)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalize every config in place.
    pub fn normalize(&mut self) {
        self.entries.values_mut().for_each(EffectConfig::normalize);
    }
}

/// Parse an effect table from JSON text.
pub fn parse_effect_table(s: &str) -> Result<EffectTable> {
    let value: JsonValue = serde_json::from_str(s)?;
    EffectTable::from_json(&value)
}
