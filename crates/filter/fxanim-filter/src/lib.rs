//! FX Animation Filters
//!
//! Filter parameters and padding for animated rendering filters. A
//! [`FilterPuppet`] plugs into the core scheduler as a puppet: its numeric
//! uniforms are the animated properties, and its per-frame hook keeps the
//! placeable's z-index and the filter padding up to date.

pub mod error;
pub mod padding;
pub mod params;
pub mod puppet;

pub use error::{FilterError, Result};
pub use padding::{BoundsPadding, PaddingEnv, PaddingShape, PaddingState, PlaceableTransform};
pub use params::{FilterParams, PlaceableType};
pub use puppet::{FilterPuppet, Placeable};
