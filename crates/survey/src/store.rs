use std::sync::Arc;

use foundation::ids::{Epoch, PageId};
use serde::Serialize;
use tracing::debug;

use crate::borough::BoroughList;
use crate::cluster::{Centroid, ClusterList, ClusterNaming, ClusterShape};
use crate::preference::{OutOfRange, PreferenceList};

/// Names the list a command targets; the discriminant of the setter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ListName {
    Preferences,
    Boroughs,
    Clusters(PageId),
}

impl std::fmt::Display for ListName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListName::Preferences => f.write_str("preferences"),
            ListName::Boroughs => f.write_str("boroughs"),
            ListName::Clusters(page) => write!(f, "{page}"),
        }
    }
}

/// Every mutation of survey state goes through one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum SurveyCommand {
    ReorderPreference { from: usize, to: usize },
    SelectPreference { index: usize },
    SetBoroughs(BoroughList),
    ToggleBorough { index: usize, checked: bool },
    SetClusterList(ClusterList),
    ToggleCluster { page: PageId, index: usize, checked: bool },
    RebuildClusters { page: PageId, shape: ClusterShape },
    /// Names and reasoning for a page's clusters, merged by id. Rejected
    /// unless `epoch` is the page's mount epoch and `basis` still matches the
    /// page's centroids; checked flags and colors are never touched.
    ApplyNarrative {
        page: PageId,
        namings: Vec<ClusterNaming>,
        basis: Vec<Vec<Centroid>>,
        epoch: Epoch,
    },
}

impl SurveyCommand {
    pub fn target(&self) -> ListName {
        match self {
            SurveyCommand::ReorderPreference { .. } | SurveyCommand::SelectPreference { .. } => {
                ListName::Preferences
            }
            SurveyCommand::SetBoroughs(_) | SurveyCommand::ToggleBorough { .. } => {
                ListName::Boroughs
            }
            SurveyCommand::SetClusterList(list) => ListName::Clusters(list.page),
            SurveyCommand::ToggleCluster { page, .. }
            | SurveyCommand::RebuildClusters { page, .. }
            | SurveyCommand::ApplyNarrative { page, .. } => ListName::Clusters(*page),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SurveyRevision(pub u64);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurveyError {
    #[error("{list}: {source}")]
    OutOfRange { list: ListName, source: OutOfRange },
    #[error("stale write to {page}: epoch {got:?} is not the mounted epoch {current:?}")]
    StaleEpoch {
        page: PageId,
        got: Epoch,
        current: Epoch,
    },
    #[error("{page}: expected {expected} clusters, got {got}")]
    ClusterCountMismatch {
        page: PageId,
        expected: usize,
        got: usize,
    },
    #[error("{page}: clusters were recomputed since the narrative was requested")]
    StaleClusters { page: PageId },
    #[error("{page}: no cluster with id {id:?}")]
    UnknownCluster { page: PageId, id: String },
}

/// Read-only view handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveySnapshot {
    pub revision: SurveyRevision,
    pub preference_list: PreferenceList,
    pub borough_list: BoroughList,
    pub cluster_lists: [ClusterList; PageId::COUNT],
    /// Which list the last mutation touched, if any.
    pub last_changed: Option<ListName>,
}

impl SurveySnapshot {
    pub fn cluster_list(&self, page: PageId) -> &ClusterList {
        &self.cluster_lists[page.index()]
    }
}

/// Single owner of survey state.
///
/// Mutation happens only through [`SurveyStore::dispatch`]; readers take
/// [`SurveySnapshot`]s, which are shared copy-on-write.
#[derive(Debug)]
pub struct SurveyStore {
    state: Arc<SurveySnapshot>,
    epochs: [Epoch; PageId::COUNT],
}

impl Default for SurveyStore {
    fn default() -> Self {
        Self::new(PreferenceList::healthcare_defaults(), BoroughList::new_york())
    }
}

impl SurveyStore {
    pub fn new(preference_list: PreferenceList, borough_list: BoroughList) -> Self {
        Self {
            state: Arc::new(SurveySnapshot {
                revision: SurveyRevision::default(),
                preference_list,
                borough_list,
                cluster_lists: PageId::ALL.map(ClusterList::empty),
                last_changed: None,
            }),
            epochs: [Epoch::default(); PageId::COUNT],
        }
    }

    pub fn snapshot(&self) -> Arc<SurveySnapshot> {
        Arc::clone(&self.state)
    }

    pub fn revision(&self) -> SurveyRevision {
        self.state.revision
    }

    pub fn epoch(&self, page: PageId) -> Epoch {
        self.epochs[page.index()]
    }

    /// Starts a new mount generation for `page`; pending narrative writes
    /// from the previous one become stale.
    pub fn advance_epoch(&mut self, page: PageId) -> Epoch {
        let slot = &mut self.epochs[page.index()];
        *slot = slot.next();
        *slot
    }

    /// Applies `command` atomically: either the whole command lands and the
    /// revision advances, or state is untouched and an error is returned.
    pub fn dispatch(&mut self, command: SurveyCommand) -> Result<SurveyRevision, SurveyError> {
        let target = command.target();
        let mut next = SurveySnapshot::clone(&self.state);
        let out_of_range = |source| SurveyError::OutOfRange {
            list: target,
            source,
        };

        match command {
            SurveyCommand::ReorderPreference { from, to } => {
                next.preference_list.reorder(from, to).map_err(out_of_range)?
            }
            SurveyCommand::SelectPreference { index } => {
                next.preference_list.select(index).map_err(out_of_range)?
            }
            SurveyCommand::SetBoroughs(list) => next.borough_list = list,
            SurveyCommand::ToggleBorough { index, checked } => {
                next.borough_list.toggle(index, checked).map_err(out_of_range)?
            }
            SurveyCommand::SetClusterList(list) => {
                let page = list.page;
                next.cluster_lists[page.index()] = list;
            }
            SurveyCommand::ToggleCluster {
                page,
                index,
                checked,
            } => {
                let list = &mut next.cluster_lists[page.index()].list;
                let len = list.len();
                let item = list
                    .get_mut(index)
                    .ok_or_else(|| out_of_range(OutOfRange { index, len }))?;
                item.checked = checked;
            }
            SurveyCommand::RebuildClusters { page, shape } => {
                let slot = &mut next.cluster_lists[page.index()];
                *slot = slot.rebuilt(&shape);
            }
            SurveyCommand::ApplyNarrative {
                page,
                namings,
                basis,
                epoch,
            } => {
                let current = self.epoch(page);
                if epoch != current {
                    return Err(SurveyError::StaleEpoch {
                        page,
                        got: epoch,
                        current,
                    });
                }
                let slot = &mut next.cluster_lists[page.index()];
                if slot.len() != basis.len()
                    || slot.list.iter().zip(&basis).any(|(item, c)| item.centroids != *c)
                {
                    return Err(SurveyError::StaleClusters { page });
                }
                if slot.len() != namings.len() {
                    return Err(SurveyError::ClusterCountMismatch {
                        page,
                        expected: slot.len(),
                        got: namings.len(),
                    });
                }
                for naming in namings {
                    let item = slot
                        .list
                        .iter_mut()
                        .find(|item| item.id == naming.id)
                        .ok_or_else(|| SurveyError::UnknownCluster {
                            page,
                            id: naming.id.clone(),
                        })?;
                    item.name = naming.name;
                    item.reasoning = naming.reasoning;
                }
            }
        }

        next.revision = SurveyRevision(self.state.revision.0 + 1);
        next.last_changed = Some(target);
        debug!(list = %target, revision = next.revision.0, "survey state updated");
        self.state = Arc::new(next);
        Ok(self.state.revision)
    }
}
