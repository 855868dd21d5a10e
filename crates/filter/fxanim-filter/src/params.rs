//! Filter parameters: placement, padding inputs, numeric uniforms and the
//! `animated` effect table.
//!
//! Ingestion is tolerant like the core's effect records: known keys with the
//! wrong type fall back to their defaults and every other numeric key becomes
//! a uniform. Only a non-object envelope or a non-object `animated` table fails.

use fxanim_core::error::json_kind;
use fxanim_core::{AnimeError, EffectTable, PropertyBag};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{FilterError, Result};

/// Kind of scene object a filter is attached to.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceableType {
    #[default]
    Token,
    Tile,
    Template,
    Drawing,
}

impl PlaceableType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "token" => Some(Self::Token),
            "tile" => Some(Self::Tile),
            "template" | "measuredtemplate" => Some(Self::Template),
            "drawing" => Some(Self::Drawing),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Tile => "tile",
            Self::Template => "template",
            Self::Drawing => "drawing",
        }
    }
}

const RESERVED_KEYS: &[&str] = &[
    "filterType",
    "filterId",
    "placeableId",
    "placeableType",
    "padding",
    "gridPadding",
    "zIndex",
    "sticky",
    "custom",
    "dummy",
    "autoDisable",
    "autoDestroy",
    "animated",
];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub filter_type: Option<String>,
    pub filter_id: Option<String>,
    pub placeable_id: Option<String>,
    pub placeable_type: PlaceableType,
    /// Authored padding in pixels (unscaled).
    pub padding: f64,
    /// Padding in grid cells; 0 means pixel padding is used instead.
    pub grid_padding: f64,
    /// Z-index pushed to the placeable's container every frame, when set.
    pub z_index: Option<f64>,
    pub sticky: bool,
    /// Custom shader filter (padding follows the placeable's rotated bounds).
    pub custom: bool,
    /// Placeholder filter: animated but never attached or padded.
    pub dummy: bool,
    pub auto_disable: bool,
    pub auto_destroy: bool,
    #[serde(flatten)]
    pub uniforms: PropertyBag,
    pub animated: EffectTable,
}

fn number(map: &Map<String, JsonValue>, key: &str) -> Option<f64> {
    map.get(key)
        .and_then(JsonValue::as_f64)
        .filter(|v| v.is_finite())
}

fn boolean(map: &Map<String, JsonValue>, key: &str) -> bool {
    map.get(key).and_then(JsonValue::as_bool).unwrap_or(false)
}

fn text(map: &Map<String, JsonValue>, key: &str) -> Option<String> {
    map.get(key).and_then(JsonValue::as_str).map(str::to_owned)
}

impl FilterParams {
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let map = value.as_object().ok_or(FilterError::NotAnObject {
            found: json_kind(value),
        })?;

        let placeable_type = match map.get("placeableType").and_then(JsonValue::as_str) {
            Some(name) => PlaceableType::from_name(name).unwrap_or_else(|| {
                warn!("unknown placeableType '{name}'; assuming token");
                PlaceableType::Token
            }),
            None => PlaceableType::default(),
        };

        let animated = match map.get("animated") {
            None | Some(JsonValue::Null) => EffectTable::new(),
            Some(raw) => EffectTable::from_json(raw)?,
        };

        let mut uniforms = PropertyBag::new();
        for (key, raw) in map {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(v) = raw.as_f64().filter(|v| v.is_finite()) {
                uniforms.set(key, v);
            }
        }

        Ok(Self {
            filter_type: text(map, "filterType"),
            filter_id: text(map, "filterId"),
            placeable_id: text(map, "placeableId"),
            placeable_type,
            padding: number(map, "padding").unwrap_or(0.0),
            grid_padding: number(map, "gridPadding").unwrap_or(0.0),
            z_index: number(map, "zIndex"),
            sticky: boolean(map, "sticky"),
            custom: boolean(map, "custom"),
            dummy: boolean(map, "dummy"),
            auto_disable: boolean(map, "autoDisable"),
            auto_destroy: boolean(map, "autoDestroy"),
            uniforms,
            animated,
        })
    }

    /// Parse filter parameters from JSON text.
    pub fn parse(s: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(s).map_err(AnimeError::from)?;
        Self::from_json(&value)
    }
}
