//! One cluster page: attribute selection, k-means, map layer and narratives
//! driven as an explicit sequence of stages.

use std::sync::Arc;

use compute::{ClusterEngine, ClusterError, KMeansEngine, compute_layer, select_attributes};
use formats::FeatureCollection;
use foundation::ids::{Epoch, PageId};
use layers::{
    HoverHighlight, KMeansLayer, Layer, LayerId, LayerSync, MapError, MapHandle, RunId, SyncOutcome,
};
use narrative::{CancelHandle, CancelSignal, Enricher, MessageLog, NarrativeError};
use runtime::EventBus;
use survey::{
    AttributeName, Centroid, ClusterList, Section, SurveyCommand, SurveyError, SurveyRevision,
    SurveyStore, map_section,
};
use tracing::{debug, warn};

use crate::config::Config;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Not mounted, or mounted without features.
    Idle,
    Loaded,
    /// Attributes chosen; nothing to cluster on them.
    Selected,
    /// Layer computed and cluster list rebuilt, but not on the map yet.
    Clustered,
    Synced,
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("{0} is not mounted")]
    NotMounted(PageId),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Survey(#[from] SurveyError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
}

/// Inputs of the last k-means run; recompute is a no-op while they hold.
#[derive(Debug, Clone)]
struct RunInputs {
    attributes: Vec<AttributeName>,
    features: Arc<FeatureCollection>,
}

impl RunInputs {
    fn same_as(&self, attributes: &[AttributeName], features: &Arc<FeatureCollection>) -> bool {
        self.attributes == attributes && Arc::ptr_eq(&self.features, features)
    }
}

struct Mount {
    epoch: Epoch,
    cancel: CancelHandle,
}

/// A narrative request detached from the page, so it can run while the page
/// keeps handling events.
pub struct AnalysisRequest {
    list: ClusterList,
    epoch: Epoch,
    signal: CancelSignal,
}

/// A finished narrative request. `basis` is the centroids the prompt was
/// built from; the store refuses the result once they have been replaced.
pub struct AnalysisResult {
    page: PageId,
    epoch: Epoch,
    basis: Vec<Vec<Centroid>>,
    outcome: Result<ClusterList, NarrativeError>,
}

impl AnalysisRequest {
    pub fn page(&self) -> PageId {
        self.list.page
    }

    pub async fn run(self, enricher: &Enricher) -> AnalysisResult {
        let outcome = enricher.request_reasoning(&self.list, self.signal).await;
        AnalysisResult {
            page: self.list.page,
            epoch: self.epoch,
            basis: self.list.centroid_basis(),
            outcome,
        }
    }
}

pub struct ClusterPage {
    page: PageId,
    config: Config,
    engine: Box<dyn ClusterEngine>,
    features: Arc<FeatureCollection>,
    stage: Stage,
    mount: Option<Mount>,
    sync: LayerSync,
    hover: HoverHighlight,
    layer: Option<KMeansLayer>,
    inputs: Option<RunInputs>,
    next_run: u64,
    last_error: Option<String>,
    events: EventBus,
}

impl ClusterPage {
    pub fn new(page: PageId, config: &Config, features: Arc<FeatureCollection>) -> Self {
        let parent = LayerId::new(map_section(Section::Cluster(page)).parent_layer);
        Self {
            page,
            config: config.clone(),
            engine: Box::new(KMeansEngine::default()),
            features,
            stage: Stage::Idle,
            mount: None,
            sync: LayerSync::new(page, parent.clone()),
            hover: HoverHighlight::new(parent),
            layer: None,
            inputs: None,
            next_run: 0,
            last_error: None,
            events: EventBus::new(),
        }
    }

    pub fn with_engine(mut self, engine: Box<dyn ClusterEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn layer(&self) -> Option<&KMeansLayer> {
        self.layer.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    fn set_stage(&mut self, stage: Stage) {
        if self.stage != stage {
            debug!(page = %self.page, from = ?self.stage, to = ?stage, "stage");
            self.events
                .emit("stage", format!("{}: {:?} -> {:?}", self.page, self.stage, stage));
            self.stage = stage;
        }
    }

    fn fail(&mut self, err: impl std::fmt::Display) {
        let message = err.to_string();
        warn!(page = %self.page, "{message}");
        self.events.emit("error", format!("{}: {message}", self.page));
        self.last_error = Some(message);
    }

    /// Swaps in a new feature collection; the next recompute re-runs k-means.
    pub fn set_features(&mut self, features: Arc<FeatureCollection>) {
        self.features = features;
    }

    pub fn mount(
        &mut self,
        store: &mut SurveyStore,
        map: &mut dyn MapHandle,
    ) -> Result<Stage, PageError> {
        if self.mount.is_some() {
            return self.recompute(store, map);
        }
        let epoch = store.advance_epoch(self.page);
        self.mount = Some(Mount {
            epoch,
            cancel: CancelHandle::new(),
        });
        self.events.emit("mount", format!("{} epoch {}", self.page, epoch.0));
        if map.is_ready() {
            self.hover.attach(map)?;
        }
        self.recompute(store, map)
    }

    /// The single recompute entry point: select attributes, run k-means,
    /// rebuild the cluster list and sync the map layer.
    pub fn recompute(
        &mut self,
        store: &mut SurveyStore,
        map: &mut dyn MapHandle,
    ) -> Result<Stage, PageError> {
        if self.mount.is_none() {
            return Err(PageError::NotMounted(self.page));
        }
        if self.features.is_empty() {
            self.inputs = None;
            self.clear_layer(store, map)?;
            self.set_stage(Stage::Idle);
            return Ok(self.stage);
        }
        if self.stage == Stage::Idle {
            self.set_stage(Stage::Loaded);
        }

        let snapshot = store.snapshot();
        let attributes =
            select_attributes(self.page, &snapshot.preference_list, self.config.slice_size);
        let unchanged = self
            .inputs
            .as_ref()
            .is_some_and(|inputs| inputs.same_as(&attributes, &self.features));
        if !unchanged {
            self.run_kmeans(store, map, attributes)?;
        }
        self.sync_layer(store, map)
    }

    fn run_kmeans(
        &mut self,
        store: &mut SurveyStore,
        map: &mut dyn MapHandle,
        attributes: Vec<AttributeName>,
    ) -> Result<(), PageError> {
        let section = map_section(Section::Cluster(self.page));
        let run = RunId(self.next_run);
        self.next_run += 1;

        let result = compute_layer(
            self.page,
            &self.features,
            &attributes,
            self.config.cluster_count,
            &section.categorized,
            self.engine.as_ref(),
            self.config.cluster_options(run),
        );
        let layer = match result {
            Ok(layer) => layer,
            Err(err) => {
                self.fail(&err);
                return Err(err.into());
            }
        };
        self.inputs = Some(RunInputs {
            attributes,
            features: Arc::clone(&self.features),
        });
        self.set_stage(Stage::Selected);

        match layer {
            Some(layer) => {
                store.dispatch(SurveyCommand::RebuildClusters {
                    page: self.page,
                    shape: layer.shape(),
                })?;
                self.events.emit(
                    "clustered",
                    format!("{} run {} k={}", self.page, run.0, layer.cluster_count()),
                );
                self.layer = Some(layer);
                self.set_stage(Stage::Clustered);
            }
            None => self.clear_layer(store, map)?,
        }
        Ok(())
    }

    /// The "no layer" state: nothing on the map and no clusters listed.
    fn clear_layer(
        &mut self,
        store: &mut SurveyStore,
        map: &mut dyn MapHandle,
    ) -> Result<(), PageError> {
        self.layer = None;
        if let Err(err) = self.sync.remove_layer(map) {
            self.fail(&err);
            return Err(err.into());
        }
        if !store.snapshot().cluster_list(self.page).is_empty() {
            store.dispatch(SurveyCommand::SetClusterList(ClusterList::empty(self.page)))?;
        }
        Ok(())
    }

    /// Installs the current layer if it is not on the map yet, then applies
    /// the checked state. A map that is not ready leaves the page `Clustered`.
    pub fn sync_layer(
        &mut self,
        store: &SurveyStore,
        map: &mut dyn MapHandle,
    ) -> Result<Stage, PageError> {
        let Some(layer) = &self.layer else {
            return Ok(self.stage);
        };
        let snapshot = store.snapshot();
        let outcome = self.sync.add_layer(map, layer, snapshot.cluster_list(self.page));
        match self.map_call(outcome)? {
            SyncOutcome::Applied | SyncOutcome::Unchanged => {
                if map.is_ready() && !self.hover.is_attached() {
                    self.hover.attach(map)?;
                }
                self.set_stage(Stage::Synced);
            }
            SyncOutcome::Skipped(reason) => {
                debug!(page = %self.page, ?reason, "layer sync deferred");
                self.set_stage(Stage::Clustered);
            }
        }
        Ok(self.stage)
    }

    /// Checkbox changes only restyle the installed layer.
    pub fn on_clusters_toggled(
        &mut self,
        store: &SurveyStore,
        map: &mut dyn MapHandle,
    ) -> Result<SyncOutcome, PageError> {
        let snapshot = store.snapshot();
        let outcome = self.sync.update_layer(map, snapshot.cluster_list(self.page));
        Ok(self.map_call(outcome)?)
    }

    fn map_call(
        &mut self,
        outcome: Result<SyncOutcome, MapError>,
    ) -> Result<SyncOutcome, MapError> {
        if let Err(err) = &outcome {
            self.fail(err);
        }
        outcome
    }

    /// Snapshot of what a "retry analysis" should send.
    pub fn begin_analysis(&self, store: &SurveyStore) -> Result<AnalysisRequest, PageError> {
        let mount = self.mount.as_ref().ok_or(PageError::NotMounted(self.page))?;
        Ok(AnalysisRequest {
            list: store.snapshot().cluster_list(self.page).clone(),
            epoch: mount.epoch,
            signal: mount.cancel.signal(),
        })
    }

    /// Writes a finished narrative back. Results from an earlier mount are
    /// rejected by the store and leave state untouched.
    pub fn finish_analysis(
        &mut self,
        store: &mut SurveyStore,
        result: AnalysisResult,
        messages: &mut MessageLog,
    ) -> Result<SurveyRevision, PageError> {
        debug_assert_eq!(result.page, self.page);
        let applied = result.outcome.map_err(PageError::from).and_then(|named| {
            store
                .dispatch(SurveyCommand::ApplyNarrative {
                    page: result.page,
                    namings: named.namings(),
                    basis: result.basis,
                    epoch: result.epoch,
                })
                .map_err(PageError::from)
        });
        match &applied {
            Ok(_) => {
                self.last_error = None;
                self.events.emit("narrative", format!("{} named", self.page));
                let names: Vec<String> = store
                    .snapshot()
                    .cluster_list(self.page)
                    .list
                    .iter()
                    .map(|c| c.name.clone())
                    .collect();
                messages.ai(format!("{}: {}", self.page, names.join(", ")));
            }
            Err(err) => {
                self.fail(err);
                messages.ai(format!("Could not analyse {}: {err}", self.page));
            }
        }
        applied
    }

    /// "Retry analysis": one narrative request, applied if it still matters.
    pub async fn retry_analysis(
        &mut self,
        store: &mut SurveyStore,
        enricher: &Enricher,
        messages: &mut MessageLog,
    ) -> Result<SurveyRevision, PageError> {
        let request = self.begin_analysis(store)?;
        messages.user(format!("Retry the analysis of {}.", self.page));
        let result = request.run(enricher).await;
        self.finish_analysis(store, result, messages)
    }

    /// Cancels pending narratives, removes the layer and invalidates the
    /// mount epoch.
    pub fn unmount(&mut self, store: &mut SurveyStore, map: &mut dyn MapHandle) {
        let Some(mount) = self.mount.take() else {
            return;
        };
        mount.cancel.cancel();
        if let Err(err) = self.sync.remove_layer(map) {
            self.fail(err);
        }
        self.hover.detach(map);
        store.advance_epoch(self.page);
        self.layer = None;
        self.inputs = None;
        self.events.emit("unmount", self.page.to_string());
        self.set_stage(Stage::Idle);
    }
}

impl Drop for ClusterPage {
    fn drop(&mut self) {
        if let Some(mount) = &self.mount {
            mount.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for ClusterPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterPage")
            .field("page", &self.page)
            .field("stage", &self.stage)
            .field("layer", &self.layer.as_ref().map(|l| l.id().clone()))
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
