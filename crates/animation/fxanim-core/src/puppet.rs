//! Puppet contract: the host-owned object an animator drives.
//!
//! A puppet exposes its effect table and a string-keyed numeric property per
//! effect. Hosts share puppets as [`SharedPuppet`]; animators keep only a
//! [`WeakPuppet`], so dropping the host's handle ends the animation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::effect::EffectTable;

pub trait Puppet {
    /// Effect configurations, keyed by the property each effect drives.
    fn effects(&self) -> &EffectTable;

    /// Mutable access to the same table. The animator writes `active = false`
    /// here when an effect runs out of loops.
    fn effects_mut(&mut self) -> &mut EffectTable;

    fn property(&self, name: &str) -> Option<f64>;

    fn set_property(&mut self, name: &str, value: f64);

    /// Runs once per animated frame, before any effect of this puppet is evaluated.
    fn pre_compute(&mut self) {}

    /// Owner used for bulk unregistration.
    fn owner_id(&self) -> Option<&str> {
        None
    }
}

pub type SharedPuppet = Rc<RefCell<dyn Puppet>>;
pub type WeakPuppet = Weak<RefCell<dyn Puppet>>;

/// Wrap a puppet for sharing between host and scheduler.
pub fn share<P: Puppet + 'static>(puppet: P) -> Rc<RefCell<P>> {
    Rc::new(RefCell::new(puppet))
}

/// Insertion-ordered numeric property bag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    values: IndexMap<String, f64>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    #[inline]
    pub fn set(&mut self, name: &str, value: f64) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        } else {
            self.values.insert(name.to_string(), value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Plain puppet: an effect table plus a property bag.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BasicPuppet {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub animated: EffectTable,
    #[serde(default)]
    pub properties: PropertyBag,
}

impl BasicPuppet {
    pub fn new(animated: EffectTable) -> Self {
        Self {
            animated,
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_property(mut self, name: &str, value: f64) -> Self {
        self.properties.set(name, value);
        self
    }
}

impl Puppet for BasicPuppet {
    fn effects(&self) -> &EffectTable {
        &self.animated
    }

    fn effects_mut(&mut self) -> &mut EffectTable {
        &mut self.animated
    }

    fn property(&self, name: &str) -> Option<f64> {
        self.properties.get(name)
    }

    fn set_property(&mut self, name: &str, value: f64) {
        self.properties.set(name, value);
    }

    fn owner_id(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}
