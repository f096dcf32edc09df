//! Lloyd's k-means with k-means++ seeding.

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of one clustering run: `centroids` is `k × cols`, `labels[i]` is
/// the cluster of row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centroids: Array2<f64>,
    pub labels: Vec<usize>,
    pub iterations: usize,
    /// Sum of squared distances from each row to its centroid.
    pub inertia: f64,
}

/// Partitions the rows of a matrix into `k` groups.
pub trait ClusterEngine {
    fn cluster(&self, data: ArrayView2<'_, f64>, k: usize, seed: u64) -> Clustering;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansEngine {
    pub max_iterations: usize,
    /// Stop once no centroid moves further than this (Euclidean).
    pub tolerance: f64,
}

impl Default for KMeansEngine {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(row: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (j, c) in centroids.rows().into_iter().enumerate() {
        let d = squared_distance(row, c);
        if d < best.1 {
            best = (j, d);
        }
    }
    best
}

/// k-means++: first center uniform, the rest drawn with probability
/// proportional to squared distance from the nearest chosen center.
fn plus_plus_init(data: ArrayView2<'_, f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));
    centroids.row_mut(0).assign(&data.row(rng.gen_range(0..n)));

    let mut min_distances = vec![f64::INFINITY; n];
    for c in 1..k {
        let last = centroids.row(c - 1).to_owned();
        for (i, row) in data.rows().into_iter().enumerate() {
            let d = squared_distance(row, last.view());
            if d < min_distances[i] {
                min_distances[i] = d;
            }
        }

        let total: f64 = min_distances.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.r#gen::<f64>() * total;
            let mut pick = n - 1;
            for (i, &d) in min_distances.iter().enumerate() {
                if target < d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            // Every row sits on a chosen center; duplicates are unavoidable.
            rng.gen_range(0..n)
        };
        centroids.row_mut(c).assign(&data.row(pick));
    }
    centroids
}

impl ClusterEngine for KMeansEngine {
    /// With fewer distinct rows than `k` some clusters stay empty; their
    /// centroids remain at the seeded position.
    fn cluster(&self, data: ArrayView2<'_, f64>, k: usize, seed: u64) -> Clustering {
        let (n, cols) = data.dim();
        if n == 0 || k == 0 {
            return Clustering {
                centroids: Array2::zeros((k, cols)),
                labels: vec![0; n],
                iterations: 0,
                inertia: 0.0,
            };
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = plus_plus_init(data, k, &mut rng);
        let mut labels = vec![usize::MAX; n];
        let tolerance_sq = self.tolerance * self.tolerance;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            let mut changed = false;
            for (i, row) in data.rows().into_iter().enumerate() {
                let (j, _) = nearest(row, &centroids);
                if labels[i] != j {
                    labels[i] = j;
                    changed = true;
                }
            }

            let mut sums = Array2::<f64>::zeros((k, cols));
            let mut counts = vec![0usize; k];
            for (i, row) in data.rows().into_iter().enumerate() {
                let mut sum = sums.row_mut(labels[i]);
                sum += &row;
                counts[labels[i]] += 1;
            }

            let mut max_shift = 0.0f64;
            for j in 0..k {
                if counts[j] == 0 {
                    continue;
                }
                let mean = sums.row(j).mapv(|v| v / counts[j] as f64);
                max_shift = max_shift.max(squared_distance(mean.view(), centroids.row(j)));
                centroids.row_mut(j).assign(&mean);
            }

            if !changed || max_shift <= tolerance_sq {
                break;
            }
        }

        let inertia = data
            .rows()
            .into_iter()
            .zip(&labels)
            .map(|(row, &j)| squared_distance(row, centroids.row(j)))
            .sum();

        Clustering {
            centroids,
            labels,
            iterations,
            inertia,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClusterEngine, KMeansEngine};
    use ndarray::{Array2, array};

    fn blobs() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.2],
            [0.2, 0.1],
            [10.0, 10.0],
            [10.1, 9.9],
            [9.8, 10.2],
            [0.0, 20.0],
            [0.2, 20.1],
        ]
    }

    #[test]
    fn separates_obvious_groups() {
        let data = blobs();
        let out = KMeansEngine::default().cluster(data.view(), 3, 42);

        assert_eq!(out.centroids.dim(), (3, 2));
        assert_eq!(out.labels.len(), 8);
        assert_eq!(out.labels[0], out.labels[1]);
        assert_eq!(out.labels[1], out.labels[2]);
        assert_eq!(out.labels[3], out.labels[5]);
        assert_eq!(out.labels[6], out.labels[7]);
        assert_ne!(out.labels[0], out.labels[3]);
        assert_ne!(out.labels[0], out.labels[6]);
        assert_ne!(out.labels[3], out.labels[6]);
        assert!(out.inertia < 1.0);
    }

    #[test]
    fn same_seed_same_result() {
        let data = blobs();
        let engine = KMeansEngine::default();
        assert_eq!(engine.cluster(data.view(), 3, 7), engine.cluster(data.view(), 3, 7));
    }

    #[test]
    fn more_clusters_than_rows_keeps_shape() {
        let data = array![[1.0], [1.0]];
        let out = KMeansEngine::default().cluster(data.view(), 4, 0);
        assert_eq!(out.centroids.dim(), (4, 1));
        assert!(out.labels.iter().all(|&l| l < 4));
    }
}
