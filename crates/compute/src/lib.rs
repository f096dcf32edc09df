pub mod analysis;
pub mod clustering;
pub mod selector;

pub use analysis::{ClusterEngine, Clustering, KMeansEngine, Normalization};
pub use clustering::*;
pub use selector::*;
