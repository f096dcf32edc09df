pub mod headless;
pub mod hover;
pub mod kmeans;
pub mod layer;
pub mod map;
pub mod query;
pub mod symbology;
pub mod sync;

pub use headless::{HeadlessMap, MapOp};
pub use hover::HoverHighlight;
pub use kmeans::{KMeansLayer, LayerShapeError, RunId};
pub use layer::*;
pub use map::*;
pub use query::{PropertyFilter, PropertyOp, RenderedFeature};
pub use symbology::*;
pub use sync::{LayerSync, SkipReason, SyncOutcome};
