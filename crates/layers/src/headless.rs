use std::collections::BTreeMap;

use serde::Serialize;

use crate::layer::LayerId;
use crate::map::{
    ClusterLayerSpec, HandlerId, MapError, MapEvent, MapHandle, MapInstanceId, ScreenPoint,
};
use crate::query::{PropertyFilter, RenderedFeature};
use crate::symbology::LayerStyle;

/// One call issued against the map, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MapOp {
    AddLayer(LayerId),
    RemoveLayer(LayerId),
    SetStyles(LayerId),
    On(MapEvent, LayerId, HandlerId),
    Off(MapEvent, LayerId, HandlerId),
    SetLineWidth(LayerId, Option<PropertyFilter>, f32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineWidth {
    pub filter: Option<PropertyFilter>,
    pub width: f32,
}

/// In-memory map without a renderer.
///
/// Keeps the layer table, handler registrations and an operation log, which
/// is what the command-line tool prints and what tests assert on.
#[derive(Debug, Serialize)]
pub struct HeadlessMap {
    id: MapInstanceId,
    loaded: bool,
    tearing_down: bool,
    layers: BTreeMap<LayerId, ClusterLayerSpec>,
    handlers: Vec<(MapEvent, LayerId, HandlerId)>,
    line_widths: BTreeMap<LayerId, LineWidth>,
    #[serde(skip)]
    hits: Vec<(ScreenPoint, RenderedFeature)>,
    ops: Vec<MapOp>,
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessMap {
    /// A map that has not fired `load` yet.
    pub fn new() -> Self {
        Self {
            id: MapInstanceId::fresh(),
            loaded: false,
            tearing_down: false,
            layers: BTreeMap::new(),
            handlers: Vec::new(),
            line_widths: BTreeMap::new(),
            hits: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn loaded() -> Self {
        let mut map = Self::new();
        map.mark_loaded();
        map
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Starts teardown: the map drops every layer and handler with it.
    pub fn begin_teardown(&mut self) {
        self.tearing_down = true;
    }

    pub fn layer(&self, id: &LayerId) -> Option<&ClusterLayerSpec> {
        self.layers.get(id)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &LayerId> {
        self.layers.keys()
    }

    pub fn handlers(&self) -> &[(MapEvent, LayerId, HandlerId)] {
        &self.handlers
    }

    pub fn line_width(&self, layer: &LayerId) -> Option<&LineWidth> {
        self.line_widths.get(layer)
    }

    pub fn ops(&self) -> &[MapOp] {
        &self.ops
    }

    /// Places a feature under `point` for subsequent queries.
    pub fn place_feature(&mut self, point: ScreenPoint, feature: RenderedFeature) {
        self.hits.push((point, feature));
    }

    fn check_ready(&self) -> Result<(), MapError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(MapError::NotReady)
        }
    }
}

impl MapHandle for HeadlessMap {
    fn instance_id(&self) -> MapInstanceId {
        self.id
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn is_tearing_down(&self) -> bool {
        self.tearing_down
    }

    fn add_layer(&mut self, spec: ClusterLayerSpec) -> Result<(), MapError> {
        self.check_ready()?;
        if self.layers.contains_key(&spec.id) {
            return Err(MapError::DuplicateLayer(spec.id));
        }
        self.ops.push(MapOp::AddLayer(spec.id.clone()));
        self.layers.insert(spec.id.clone(), spec);
        Ok(())
    }

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), MapError> {
        self.check_ready()?;
        if self.layers.remove(id).is_none() {
            return Err(MapError::UnknownLayer(id.clone()));
        }
        self.ops.push(MapOp::RemoveLayer(id.clone()));
        Ok(())
    }

    fn set_cluster_styles(&mut self, id: &LayerId, styles: &[LayerStyle]) -> Result<(), MapError> {
        self.check_ready()?;
        let layer = self
            .layers
            .get_mut(id)
            .ok_or_else(|| MapError::UnknownLayer(id.clone()))?;
        if styles.len() != layer.styles.len() {
            return Err(MapError::Sdk(format!(
                "{} styles for {} clusters",
                styles.len(),
                layer.styles.len()
            )));
        }
        layer.styles = styles.to_vec();
        self.ops.push(MapOp::SetStyles(id.clone()));
        Ok(())
    }

    fn on(&mut self, event: MapEvent, layer: &LayerId, handler: HandlerId) -> Result<(), MapError> {
        self.check_ready()?;
        self.handlers.push((event, layer.clone(), handler));
        self.ops.push(MapOp::On(event, layer.clone(), handler));
        Ok(())
    }

    fn off(&mut self, event: MapEvent, layer: &LayerId, handler: HandlerId) {
        let before = self.handlers.len();
        self.handlers
            .retain(|(e, l, h)| !(*e == event && l == layer && *h == handler));
        if self.handlers.len() != before {
            self.ops.push(MapOp::Off(event, layer.clone(), handler));
        }
    }

    fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[LayerId],
    ) -> Vec<RenderedFeature> {
        self.hits
            .iter()
            .filter(|(p, f)| *p == point && layers.contains(&f.layer))
            .map(|(_, f)| f.clone())
            .collect()
    }

    fn set_line_width(
        &mut self,
        layer: &LayerId,
        filter: Option<&PropertyFilter>,
        width: f32,
    ) -> Result<(), MapError> {
        self.check_ready()?;
        self.line_widths.insert(
            layer.clone(),
            LineWidth {
                filter: filter.cloned(),
                width,
            },
        );
        self.ops
            .push(MapOp::SetLineWidth(layer.clone(), filter.cloned(), width));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadlessMap, MapOp};
    use crate::layer::LayerId;
    use crate::map::{ClusterLayerSpec, MapError, MapHandle};
    use crate::symbology::LayerStyle;
    use foundation::color::Hex;

    fn spec(id: &str) -> ClusterLayerSpec {
        ClusterLayerSpec {
            id: LayerId::new(id),
            parent: LayerId::new("tracts"),
            assignments: vec![0],
            feature_ids: vec![None],
            styles: vec![LayerStyle::shown(Hex::rgb(1, 2, 3))],
        }
    }

    #[test]
    fn refuses_work_before_load() {
        let mut map = HeadlessMap::new();
        assert_eq!(map.add_layer(spec("a")), Err(MapError::NotReady));
        map.mark_loaded();
        assert!(map.add_layer(spec("a")).is_ok());
        assert_eq!(
            map.add_layer(spec("a")),
            Err(MapError::DuplicateLayer(LayerId::new("a")))
        );
        map.begin_teardown();
        assert_eq!(map.remove_layer(&LayerId::new("a")), Err(MapError::NotReady));
    }

    #[test]
    fn logs_layer_operations() {
        let mut map = HeadlessMap::loaded();
        map.add_layer(spec("a")).unwrap();
        map.set_cluster_styles(&LayerId::new("a"), &[LayerStyle::hidden(Hex::rgb(1, 2, 3))])
            .unwrap();
        map.remove_layer(&LayerId::new("a")).unwrap();
        assert_eq!(
            map.ops(),
            &[
                MapOp::AddLayer(LayerId::new("a")),
                MapOp::SetStyles(LayerId::new("a")),
                MapOp::RemoveLayer(LayerId::new("a")),
            ]
        );
        assert!(map.layer(&LayerId::new("a")).is_none());
    }
}
