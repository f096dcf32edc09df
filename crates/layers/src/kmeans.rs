use foundation::color::Hex;
use foundation::ids::PageId;
use ndarray::{Array2, ArrayView1};
use survey::{AttributeName, Centroid, ClusterShape};

use crate::layer::{Layer, LayerId};
use crate::symbology::LayerStyle;

/// Monotonic id of one clustering run; a new run means a new layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayerShapeError {
    #[error("centroid matrix has {cols} columns for {attributes} attributes")]
    Columns { cols: usize, attributes: usize },
    #[error("{colors} colors for {clusters} clusters")]
    Colors { colors: usize, clusters: usize },
    #[error("{assignments} assignments for {features} features")]
    Assignments { assignments: usize, features: usize },
    #[error("feature {feature} assigned to cluster {cluster} of {clusters}")]
    Label {
        feature: usize,
        cluster: usize,
        clusters: usize,
    },
}

/// Renderable result of one k-means run on a cluster page.
///
/// Invariants (checked in [`KMeansLayer::new`]):
/// - `centroids` is `k × attributes.len()` with one color per row;
/// - one assignment per feature, each `< k`.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansLayer {
    id: LayerId,
    page: PageId,
    run: RunId,
    attributes: Vec<AttributeName>,
    centroids: Array2<f64>,
    assignments: Vec<usize>,
    colors: Vec<Hex>,
    feature_ids: Vec<Option<String>>,
}

impl KMeansLayer {
    pub fn new(
        page: PageId,
        run: RunId,
        attributes: Vec<AttributeName>,
        centroids: Array2<f64>,
        assignments: Vec<usize>,
        colors: Vec<Hex>,
        feature_ids: Vec<Option<String>>,
    ) -> Result<Self, LayerShapeError> {
        let (k, cols) = centroids.dim();
        if cols != attributes.len() {
            return Err(LayerShapeError::Columns {
                cols,
                attributes: attributes.len(),
            });
        }
        if colors.len() != k {
            return Err(LayerShapeError::Colors {
                colors: colors.len(),
                clusters: k,
            });
        }
        if assignments.len() != feature_ids.len() {
            return Err(LayerShapeError::Assignments {
                assignments: assignments.len(),
                features: feature_ids.len(),
            });
        }
        if let Some((feature, &cluster)) = assignments.iter().enumerate().find(|(_, c)| **c >= k) {
            return Err(LayerShapeError::Label {
                feature,
                cluster,
                clusters: k,
            });
        }

        Ok(Self {
            id: LayerId::kmeans(page),
            page,
            run,
            attributes,
            centroids,
            assignments,
            colors,
            feature_ids,
        })
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn attributes(&self) -> &[AttributeName] {
        &self.attributes
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    pub fn centroid(&self, cluster: usize) -> ArrayView1<'_, f64> {
        self.centroids.row(cluster)
    }

    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    pub fn colors(&self) -> &[Hex] {
        &self.colors
    }

    pub fn feature_ids(&self) -> &[Option<String>] {
        &self.feature_ids
    }

    pub fn cluster_count(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.cluster_count()];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }

    /// Centroids as `{attribute, value}` rows aligned to the attribute list.
    pub fn centroid_pairs(&self) -> Vec<Vec<Centroid>> {
        self.centroids
            .rows()
            .into_iter()
            .map(|row| {
                self.attributes
                    .iter()
                    .zip(row.iter())
                    .map(|(name, &value)| Centroid {
                        name: name.clone(),
                        value,
                    })
                    .collect()
            })
            .collect()
    }

    /// What the survey store needs to rebuild the page's cluster list.
    pub fn shape(&self) -> ClusterShape {
        ClusterShape {
            centroids: self.centroid_pairs(),
            colors: self.colors.clone(),
        }
    }

    pub fn default_styles(&self) -> Vec<LayerStyle> {
        self.colors.iter().copied().map(LayerStyle::shown).collect()
    }
}

impl Layer for KMeansLayer {
    fn id(&self) -> &LayerId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::{KMeansLayer, LayerShapeError, RunId};
    use crate::layer::{Layer, LayerId};
    use foundation::color::Hex;
    use foundation::ids::PageId;
    use ndarray::array;

    fn attrs() -> Vec<String> {
        vec!["hpsa_score".to_string(), "uninsured_rate".to_string()]
    }

    #[test]
    fn pairs_follow_attribute_order() {
        let page = PageId::new(1).unwrap();
        let layer = KMeansLayer::new(
            page,
            RunId(0),
            attrs(),
            array![[1.0, 0.1], [5.0, 0.4]],
            vec![0, 1, 1],
            vec![Hex::rgb(1, 1, 1), Hex::rgb(2, 2, 2)],
            vec![None, Some("a".to_string()), None],
        )
        .unwrap();

        assert_eq!(layer.id(), &LayerId::kmeans(page));
        assert_eq!(layer.cluster_sizes(), vec![1, 2]);
        let pairs = layer.centroid_pairs();
        assert_eq!(pairs[1][0].name, "hpsa_score");
        assert_eq!(pairs[1][0].value, 5.0);
        assert_eq!(pairs[1][1].value, 0.4);
        assert_eq!(layer.shape().cluster_count(), 2);
    }

    #[test]
    fn rejects_inconsistent_shapes() {
        let page = PageId::new(2).unwrap();
        let err = KMeansLayer::new(
            page,
            RunId(0),
            attrs(),
            array![[1.0], [2.0]],
            vec![],
            vec![Hex::rgb(0, 0, 0); 2],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, LayerShapeError::Columns { cols: 1, attributes: 2 });

        let err = KMeansLayer::new(
            page,
            RunId(0),
            attrs(),
            array![[1.0, 2.0]],
            vec![1],
            vec![Hex::rgb(0, 0, 0)],
            vec![None],
        )
        .unwrap_err();
        assert!(matches!(err, LayerShapeError::Label { cluster: 1, .. }));
    }
}
