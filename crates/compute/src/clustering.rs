use foundation::color::Palette;
use foundation::ids::PageId;
use formats::{AttributeValue, FeatureCollection};
use layers::{KMeansLayer, LayerShapeError, RunId};
use ndarray::Array2;
use survey::AttributeName;
use tracing::{debug, info, warn};

use crate::analysis::kmeans::ClusterEngine;
use crate::analysis::statistics::{ColumnScaler, Normalization};

/// Property names written by [`annotate`].
pub const CLUSTER_PROPERTY: &str = "cluster";
pub const COLOR_PROPERTY: &str = "color";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    pub normalization: Normalization,
    pub seed: u64,
    pub run: RunId,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            normalization: Normalization::None,
            seed: 42,
            run: RunId(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusterError {
    #[error("cluster count must be positive")]
    InvalidClusterCount,
    #[error("engine returned {got} centroids for {expected} clusters")]
    CentroidCount { expected: usize, got: usize },
    #[error("engine output has the wrong shape: {0}")]
    EngineShape(#[from] LayerShapeError),
}

/// Feature attributes as a row-per-feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub data: Array2<f64>,
    /// Cells that were missing or non-numeric and became `0.0`.
    pub substituted: usize,
}

pub fn feature_matrix(features: &FeatureCollection, attributes: &[AttributeName]) -> FeatureMatrix {
    let mut data = Array2::zeros((features.len(), attributes.len()));
    let mut substituted = 0;
    for (i, feature) in features.features.iter().enumerate() {
        for (j, name) in attributes.iter().enumerate() {
            match feature.number(name) {
                Some(v) => data[[i, j]] = v,
                None => substituted += 1,
            }
        }
    }
    FeatureMatrix { data, substituted }
}

/// Runs k-means over `attributes` of every feature and packages the result
/// as the page's layer.
///
/// Returns `Ok(None)` without touching the engine when there is nothing to
/// cluster (no features or no attributes).
pub fn compute_layer(
    page: PageId,
    features: &FeatureCollection,
    attributes: &[AttributeName],
    cluster_count: usize,
    palette: &Palette,
    engine: &dyn ClusterEngine,
    options: ClusterOptions,
) -> Result<Option<KMeansLayer>, ClusterError> {
    if cluster_count == 0 {
        return Err(ClusterError::InvalidClusterCount);
    }
    if features.is_empty() || attributes.is_empty() {
        debug!(
            %page,
            features = features.len(),
            attributes = attributes.len(),
            "nothing to cluster"
        );
        return Ok(None);
    }

    let matrix = feature_matrix(features, attributes);
    if matrix.substituted > 0 {
        warn!(
            %page,
            cells = matrix.substituted,
            "missing or non-numeric attribute values clustered as 0"
        );
    }

    let scaler = ColumnScaler::fit(matrix.data.view(), options.normalization);
    let scaled = scaler.transform(matrix.data.view());
    let out = engine.cluster(scaled.view(), cluster_count, options.seed);
    if out.centroids.nrows() != cluster_count {
        return Err(ClusterError::CentroidCount {
            expected: cluster_count,
            got: out.centroids.nrows(),
        });
    }
    let centroids = scaler.inverse(out.centroids.view());

    let colors = (0..cluster_count).map(|i| palette.color(i)).collect();
    let feature_ids = features.features.iter().map(|f| f.id.clone()).collect();
    let layer = KMeansLayer::new(
        page,
        options.run,
        attributes.to_vec(),
        centroids,
        out.labels,
        colors,
        feature_ids,
    )?;

    info!(
        %page,
        run = options.run.0,
        features = features.len(),
        attributes = attributes.len(),
        clusters = cluster_count,
        iterations = out.iterations,
        inertia = out.inertia,
        "k-means run complete"
    );
    Ok(Some(layer))
}

/// Copies `features` with each feature's cluster index and fill color added
/// to its properties.
pub fn annotate(layer: &KMeansLayer, features: &FeatureCollection) -> FeatureCollection {
    let mut out = features.clone();
    for (feature, &cluster) in out.features.iter_mut().zip(layer.assignments()) {
        feature.properties.insert(
            CLUSTER_PROPERTY.to_string(),
            AttributeValue::Number(cluster as f64),
        );
        feature.properties.insert(
            COLOR_PROPERTY.to_string(),
            AttributeValue::Text(layer.colors()[cluster].to_string()),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeMap;

    use super::{ClusterError, ClusterOptions, annotate, compute_layer, feature_matrix};
    use crate::analysis::kmeans::{ClusterEngine, Clustering, KMeansEngine};
    use crate::analysis::statistics::Normalization;
    use foundation::color::{Hex, Palette};
    use foundation::ids::PageId;
    use formats::{AttributeValue, Feature, FeatureCollection};
    use layers::RunId;
    use ndarray::{Array2, ArrayView2};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct CountingEngine {
        calls: Cell<usize>,
    }

    impl ClusterEngine for CountingEngine {
        fn cluster(&self, data: ArrayView2<'_, f64>, k: usize, seed: u64) -> Clustering {
            self.calls.set(self.calls.get() + 1);
            KMeansEngine::default().cluster(data, k, seed)
        }
    }

    struct ShortEngine;

    impl ClusterEngine for ShortEngine {
        fn cluster(&self, data: ArrayView2<'_, f64>, _k: usize, _seed: u64) -> Clustering {
            Clustering {
                centroids: Array2::zeros((1, data.ncols())),
                labels: vec![0; data.nrows()],
                iterations: 0,
                inertia: 0.0,
            }
        }
    }

    fn feature(i: usize, values: &[(&str, AttributeValue)]) -> Feature {
        Feature {
            id: Some(format!("tract-{i}")),
            properties: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
            geometry: None,
        }
    }

    fn grid(n: usize) -> FeatureCollection {
        FeatureCollection {
            features: (0..n)
                .map(|i| {
                    feature(
                        i,
                        &[
                            ("a", AttributeValue::Number((i % 5) as f64 * 10.0)),
                            ("b", AttributeValue::Number((i % 7) as f64)),
                            ("c", AttributeValue::Number(i as f64 / n as f64)),
                        ],
                    )
                })
                .collect(),
        }
    }

    fn attrs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn palette() -> Palette {
        Palette::new(vec![
            Hex::rgb(1, 0, 0),
            Hex::rgb(2, 0, 0),
            Hex::rgb(3, 0, 0),
        ])
    }

    fn page() -> PageId {
        PageId::ALL[0]
    }

    #[test]
    fn nothing_to_cluster_skips_engine() {
        let engine = CountingEngine::default();
        let out = compute_layer(
            page(),
            &grid(10),
            &[],
            5,
            &palette(),
            &engine,
            ClusterOptions::default(),
        )
        .unwrap();
        assert!(out.is_none());

        let out = compute_layer(
            page(),
            &FeatureCollection::empty(),
            &attrs(&["a"]),
            5,
            &palette(),
            &engine,
            ClusterOptions::default(),
        )
        .unwrap();
        assert!(out.is_none());
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn hundred_features_three_attributes_five_clusters() {
        let engine = CountingEngine::default();
        let layer = compute_layer(
            page(),
            &grid(100),
            &attrs(&["a", "b", "c"]),
            5,
            &palette(),
            &engine,
            ClusterOptions::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(engine.calls.get(), 1);
        assert_eq!(layer.centroids().dim(), (5, 3));
        assert_eq!(layer.assignments().len(), 100);
        assert!(layer.assignments().iter().all(|&c| c < 5));
        assert_eq!(layer.feature_ids()[3].as_deref(), Some("tract-3"));
        // Palette wraps after three colors.
        assert_eq!(layer.colors()[3], Hex::rgb(1, 0, 0));
        assert_eq!(layer.centroid_pairs()[0][2].name, "c");
    }

    #[test]
    fn colors_are_stable_across_runs() {
        let engine = KMeansEngine::default();
        let run = |run: u64| {
            compute_layer(
                page(),
                &grid(40),
                &attrs(&["a", "b"]),
                3,
                &palette(),
                &engine,
                ClusterOptions {
                    run: RunId(run),
                    ..ClusterOptions::default()
                },
            )
            .unwrap()
            .unwrap()
        };
        assert_eq!(run(0).colors(), run(1).colors());
    }

    #[test]
    fn normalized_centroids_are_in_original_units() {
        let layer = compute_layer(
            page(),
            &grid(50),
            &attrs(&["a", "b"]),
            2,
            &palette(),
            &KMeansEngine::default(),
            ClusterOptions {
                normalization: Normalization::MinMax,
                ..ClusterOptions::default()
            },
        )
        .unwrap()
        .unwrap();
        let a_max = layer.centroids().column(0).fold(0.0f64, |m, &v| m.max(v));
        assert!(a_max > 1.0, "centroids left in scaled units: {a_max}");
        assert!(a_max <= 40.0);
    }

    #[test]
    fn missing_and_text_values_become_zero() {
        let features = FeatureCollection {
            features: vec![
                feature(0, &[("a", AttributeValue::Text("12.5".to_string()))]),
                feature(1, &[("a", AttributeValue::Text("n/a".to_string()))]),
                feature(2, &[]),
            ],
        };
        let matrix = feature_matrix(&features, &attrs(&["a"]));
        assert_eq!(matrix.data.column(0).to_vec(), vec![12.5, 0.0, 0.0]);
        assert_eq!(matrix.substituted, 2);
    }

    #[test]
    fn rejects_bad_counts() {
        let err = compute_layer(
            page(),
            &grid(5),
            &attrs(&["a"]),
            0,
            &palette(),
            &KMeansEngine::default(),
            ClusterOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ClusterError::InvalidClusterCount);

        let err = compute_layer(
            page(),
            &grid(5),
            &attrs(&["a"]),
            3,
            &palette(),
            &ShortEngine,
            ClusterOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ClusterError::CentroidCount { expected: 3, got: 1 });
    }

    #[test]
    fn annotate_adds_cluster_and_color() {
        let features = grid(12);
        let layer = compute_layer(
            page(),
            &features,
            &attrs(&["a"]),
            3,
            &palette(),
            &KMeansEngine::default(),
            ClusterOptions::default(),
        )
        .unwrap()
        .unwrap();
        let out = annotate(&layer, &features);
        let f = &out.features[4];
        let cluster = f.number("cluster").unwrap() as usize;
        assert_eq!(cluster, layer.assignments()[4]);
        assert_eq!(
            f.attribute("color").and_then(AttributeValue::as_str),
            Some(layer.colors()[cluster].to_string().as_str())
        );
        // Input is untouched.
        assert!(features.features[4].attribute("cluster").is_none());
    }
}
