//! `FilterPuppet`: a rendering filter whose numeric uniforms are animated.

use fxanim_core::{EffectTable, PropertyBag, Puppet};
use log::debug;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::padding::{PaddingEnv, PaddingShape, PaddingState, PlaceableTransform};
use crate::params::FilterParams;

/// Host-side view of the object a filter is attached to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeable {
    pub transform: PlaceableTransform,
    /// Z-index of the sprite's container.
    pub parent_z_index: f64,
}

#[derive(Clone, Debug)]
pub struct FilterPuppet {
    params: FilterParams,
    padding: PaddingState,
    env: PaddingEnv,
    placeable: Option<Placeable>,
}

impl FilterPuppet {
    pub fn new(params: FilterParams, env: PaddingEnv) -> Self {
        let padding = PaddingState::new(params.padding, params.grid_padding, &env);
        let mut filter = Self {
            params,
            padding,
            env,
            placeable: None,
        };
        filter.normalize_params();
        filter
    }

    pub fn from_json(value: &JsonValue, env: PaddingEnv) -> Result<Self> {
        Ok(Self::new(FilterParams::from_json(value)?, env))
    }

    /// Attach the placeable this filter renders on and run the per-frame transform once.
    /// Dummy filters stay detached; returns whether the placeable was attached.
    pub fn attach(&mut self, placeable: Placeable) -> bool {
        if self.params.dummy {
            debug!("dummy filter {:?}: not attaching placeable", self.params.filter_id);
            return false;
        }
        self.placeable = Some(placeable);
        self.pre_compute();
        true
    }

    pub fn detach(&mut self) -> Option<Placeable> {
        self.placeable.take()
    }

    /// Refresh the transform snapshot (host calls this when the sprite moves).
    pub fn update_transform(&mut self, transform: PlaceableTransform) {
        if let Some(placeable) = self.placeable.as_mut() {
            placeable.transform = transform;
        }
    }

    #[inline]
    pub fn placeable(&self) -> Option<&Placeable> {
        self.placeable.as_ref()
    }

    #[inline]
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    #[inline]
    pub fn padding_state(&self) -> &PaddingState {
        &self.padding
    }

    #[inline]
    pub fn uniforms(&self) -> &PropertyBag {
        &self.params.uniforms
    }

    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.params.dummy
    }

    fn shape(&self) -> PaddingShape {
        PaddingShape {
            custom: self.params.custom,
            sticky: self.params.sticky,
            placeable_type: self.params.placeable_type,
        }
    }

    /// Recompute padding from the attached placeable. No-op for dummy or detached filters.
    pub fn calculate_padding(&mut self) {
        if self.params.dummy {
            return;
        }
        let shape = self.shape();
        if let Some(placeable) = self.placeable {
            self.padding.calculate(shape, &placeable.transform, &self.env);
        }
    }

    /// Effective padding, recomputed first when `recalculate_padding` is set.
    pub fn padding(&mut self) -> f64 {
        if self.padding.recalculate_padding {
            self.calculate_padding();
        }
        self.padding.current_padding
    }

    /// Replace the authored padding.
    pub fn set_padding(&mut self, padding: f64) {
        self.params.padding = padding;
        self.padding.set_padding(padding, &self.env);
    }

    pub fn set_recalculate_padding(&mut self, recalculate: bool) {
        self.padding.recalculate_padding = recalculate;
    }

    /// Re-apply effect defaults to the animated table.
    pub fn normalize_params(&mut self) {
        self.params.animated.normalize();
    }
}

/// `padding` reads the effective (scaled) padding and writes the authored one.
impl Puppet for FilterPuppet {
    fn effects(&self) -> &EffectTable {
        &self.params.animated
    }

    fn effects_mut(&mut self) -> &mut EffectTable {
        &mut self.params.animated
    }

    fn property(&self, name: &str) -> Option<f64> {
        match name {
            "padding" => Some(self.padding.current_padding),
            "zIndex" => self.params.z_index,
            _ => self.params.uniforms.get(name),
        }
    }

    fn set_property(&mut self, name: &str, value: f64) {
        match name {
            "padding" => self.set_padding(value),
            "zIndex" => self.params.z_index = Some(value),
            _ => self.params.uniforms.set(name, value),
        }
    }

    fn pre_compute(&mut self) {
        if self.params.dummy {
            return;
        }
        let Some(placeable) = self.placeable.as_mut() else {
            return;
        };
        if let Some(z) = self.params.z_index {
            placeable.parent_z_index = z;
        }
        if self.padding.recalculate_padding {
            self.calculate_padding();
        }
    }

    fn owner_id(&self) -> Option<&str> {
        self.params.placeable_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn glow() -> FilterPuppet {
        FilterPuppet::from_json(
            &json!({
                "filterId": "g",
                "placeableId": "token-1",
                "padding": 8,
                "zIndex": 5,
                "outerStrength": 2,
                "animated": {"outerStrength": {"animType": "cosOscillation", "loopDuration": 0}}
            }),
            PaddingEnv::default(),
        )
        .unwrap()
    }

    #[test]
    fn construction_normalizes_animated_table() {
        let filter = glow();
        assert_eq!(filter.effects().get("outerStrength").unwrap().loop_duration, 3000.0);
        assert_eq!(filter.owner_id(), Some("token-1"));
    }

    #[test]
    fn attach_propagates_z_index_and_padding() {
        let mut filter = glow();
        assert!(filter.attach(Placeable {
            transform: PlaceableTransform {
                scale: 2.0,
                ..PlaceableTransform::default()
            },
            parent_z_index: 0.0,
        }));
        let placeable = filter.placeable().unwrap();
        assert_eq!(placeable.parent_z_index, 5.0);
        assert_eq!(filter.padding_state().current_padding, 16.0);
    }

    #[test]
    fn special_properties_route_to_state() {
        let mut filter = glow();
        filter.set_property("padding", 12.0);
        assert_eq!(filter.params().padding, 12.0);
        assert_eq!(filter.padding_state().raw_padding, 12.0);
        filter.set_property("zIndex", 9.0);
        assert_eq!(filter.property("zIndex"), Some(9.0));
        filter.set_property("outerStrength", 3.5);
        assert_eq!(filter.uniforms().get("outerStrength"), Some(3.5));
    }

    #[test]
    fn padding_property_reads_effective_padding() {
        let mut filter = glow();
        filter.attach(Placeable {
            transform: PlaceableTransform {
                scale: 2.0,
                ..PlaceableTransform::default()
            },
            parent_z_index: 0.0,
        });
        assert_eq!(filter.property("padding"), Some(16.0));

        filter.set_property("padding", 10.0);
        filter.calculate_padding();
        assert_eq!(filter.padding_state().raw_padding, 10.0);
        assert_eq!(filter.property("padding"), Some(20.0));
    }

    #[test]
    fn detached_filter_keeps_zero_padding() {
        let mut filter = glow();
        assert_eq!(filter.padding(), 0.0);
    }
}
