pub mod kmeans;
pub mod statistics;

pub use kmeans::{ClusterEngine, Clustering, KMeansEngine};
pub use statistics::{ColumnScaler, Normalization, Statistics};
