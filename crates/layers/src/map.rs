//! Boundary to the map rendering SDK.
//!
//! The SDK itself (basemap engine, tiles, custom renderers) lives outside this
//! workspace; pages only talk to it through [`MapHandle`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::layer::LayerId;
use crate::query::{PropertyFilter, RenderedFeature};
use crate::symbology::LayerStyle;

/// Identity of one map instance. A recreated map gets a new id even if it
/// renders into the same container.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MapInstanceId(pub u64);

impl MapInstanceId {
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HandlerId(pub u64);

impl HandlerId {
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MapEvent {
    MouseMove,
    MouseLeave,
    Click,
}

/// Pixel position inside the map canvas.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Everything the SDK needs to draw a k-means layer over the parent polygons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterLayerSpec {
    pub id: LayerId,
    /// Polygons the clusters are painted onto.
    pub parent: LayerId,
    /// Cluster index per feature, in feature order.
    pub assignments: Vec<usize>,
    pub feature_ids: Vec<Option<String>>,
    pub styles: Vec<LayerStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("layer {0} already exists")]
    DuplicateLayer(LayerId),
    #[error("layer {0} does not exist")]
    UnknownLayer(LayerId),
    #[error("map is not ready")]
    NotReady,
    #[error("map SDK error: {0}")]
    Sdk(String),
}

pub trait MapHandle {
    fn instance_id(&self) -> MapInstanceId;

    /// True once the map fired its `load` event.
    fn is_loaded(&self) -> bool;

    fn is_tearing_down(&self) -> bool;

    /// Loaded and not tearing down: the only state in which layer
    /// operations may be issued.
    fn is_ready(&self) -> bool {
        self.is_loaded() && !self.is_tearing_down()
    }

    fn add_layer(&mut self, spec: ClusterLayerSpec) -> Result<(), MapError>;

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), MapError>;

    /// Re-paints clusters of an existing layer; `styles[i]` is cluster `i`.
    fn set_cluster_styles(&mut self, id: &LayerId, styles: &[LayerStyle]) -> Result<(), MapError>;

    fn on(&mut self, event: MapEvent, layer: &LayerId, handler: HandlerId) -> Result<(), MapError>;

    fn off(&mut self, event: MapEvent, layer: &LayerId, handler: HandlerId);

    fn query_rendered_features(&self, point: ScreenPoint, layers: &[LayerId])
    -> Vec<RenderedFeature>;

    /// Sets the outline width of features matching `filter` (all features
    /// when `None`); the rest fall back to the layer default.
    fn set_line_width(
        &mut self,
        layer: &LayerId,
        filter: Option<&PropertyFilter>,
        width: f32,
    ) -> Result<(), MapError>;
}
