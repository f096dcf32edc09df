use foundation::color::Hex;
use foundation::ids::PageId;
use survey::ClusterList;
use tracing::{debug, warn};

use crate::kmeans::{KMeansLayer, RunId};
use crate::layer::{Layer, LayerId};
use crate::map::{ClusterLayerSpec, MapError, MapHandle, MapInstanceId};
use crate::symbology::LayerStyle;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MapNotLoaded,
    MapTearingDown,
    NothingInstalled,
    /// The installed layer belongs to a map instance that is gone.
    ForeignMap,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    Unchanged,
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
struct Installed {
    layer: LayerId,
    run: RunId,
    map: MapInstanceId,
    colors: Vec<Hex>,
}

/// Keeps one page's k-means layer in step with the map.
///
/// Owns at most one installed layer. Installing a new run always removes the
/// previous one first, so every `add` is paired with a `remove` before the
/// next `add`.
#[derive(Debug)]
pub struct LayerSync {
    page: PageId,
    parent: LayerId,
    installed: Option<Installed>,
}

impl LayerSync {
    pub fn new(page: PageId, parent: LayerId) -> Self {
        Self {
            page,
            parent,
            installed: None,
        }
    }

    pub fn installed_layer(&self) -> Option<&LayerId> {
        self.installed.as_ref().map(|i| &i.layer)
    }

    pub fn installed_run(&self) -> Option<RunId> {
        self.installed.as_ref().map(|i| i.run)
    }

    fn readiness(map: &dyn MapHandle) -> Option<SkipReason> {
        if map.is_tearing_down() {
            Some(SkipReason::MapTearingDown)
        } else if !map.is_loaded() {
            Some(SkipReason::MapNotLoaded)
        } else {
            None
        }
    }

    /// Installs `layer`, replacing whatever run was installed before, then
    /// applies the checked state of `clusters`.
    pub fn add_layer(
        &mut self,
        map: &mut dyn MapHandle,
        layer: &KMeansLayer,
        clusters: &ClusterList,
    ) -> Result<SyncOutcome, MapError> {
        debug_assert_eq!(layer.page(), self.page, "layer added to another page's sync");
        if let Some(reason) = Self::readiness(map) {
            return Ok(SyncOutcome::Skipped(reason));
        }

        if let Some(installed) = &self.installed
            && installed.run == layer.run()
            && installed.map == map.instance_id()
        {
            return Ok(SyncOutcome::Unchanged);
        }
        self.remove_layer(map)?;

        let spec = ClusterLayerSpec {
            id: layer.id().clone(),
            parent: self.parent.clone(),
            assignments: layer.assignments().to_vec(),
            feature_ids: layer.feature_ids().to_vec(),
            styles: layer.default_styles(),
        };
        map.add_layer(spec)?;
        debug!(page = %self.page, layer = %layer.id(), run = layer.run().0, "k-means layer added");
        self.installed = Some(Installed {
            layer: layer.id().clone(),
            run: layer.run(),
            map: map.instance_id(),
            colors: layer.colors().to_vec(),
        });

        self.update_layer(map, clusters)?;
        Ok(SyncOutcome::Applied)
    }

    /// Removes the installed layer, if any.
    ///
    /// A map that is tearing down (or a different map instance) takes its
    /// layers with it, so the record is dropped without issuing a call.
    pub fn remove_layer(&mut self, map: &mut dyn MapHandle) -> Result<SyncOutcome, MapError> {
        let Some(installed) = self.installed.take() else {
            return Ok(SyncOutcome::Unchanged);
        };
        if installed.map != map.instance_id() {
            warn!(page = %self.page, layer = %installed.layer, "dropping layer of a replaced map");
            return Ok(SyncOutcome::Skipped(SkipReason::ForeignMap));
        }
        if map.is_tearing_down() {
            return Ok(SyncOutcome::Skipped(SkipReason::MapTearingDown));
        }
        match map.remove_layer(&installed.layer) {
            Ok(()) => {
                debug!(page = %self.page, layer = %installed.layer, "k-means layer removed");
                Ok(SyncOutcome::Applied)
            }
            Err(err) => {
                // Keep the record so the caller may retry the removal.
                self.installed = Some(installed);
                Err(err)
            }
        }
    }

    /// Re-applies checked/unchecked state without re-running clustering.
    pub fn update_layer(
        &mut self,
        map: &mut dyn MapHandle,
        clusters: &ClusterList,
    ) -> Result<SyncOutcome, MapError> {
        if let Some(reason) = Self::readiness(map) {
            return Ok(SyncOutcome::Skipped(reason));
        }
        let Some(installed) = &self.installed else {
            return Ok(SyncOutcome::Skipped(SkipReason::NothingInstalled));
        };
        if installed.map != map.instance_id() {
            return Ok(SyncOutcome::Skipped(SkipReason::ForeignMap));
        }

        let styles = cluster_styles(&installed.colors, clusters);
        map.set_cluster_styles(&installed.layer, &styles)?;
        Ok(SyncOutcome::Applied)
    }
}

/// One style per installed cluster. Clusters missing from the list (the
/// store has not caught up with the run yet) stay visible.
fn cluster_styles(colors: &[Hex], clusters: &ClusterList) -> Vec<LayerStyle> {
    colors
        .iter()
        .enumerate()
        .map(|(i, &fallback)| match clusters.list.get(i) {
            Some(item) if !item.checked => LayerStyle::hidden(item.color.unwrap_or(fallback)),
            Some(item) => LayerStyle::shown(item.color.unwrap_or(fallback)),
            None => LayerStyle::shown(fallback),
        })
        .collect()
}
