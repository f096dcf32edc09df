pub mod borough;
pub mod cluster;
pub mod preference;
pub mod sections;
pub mod store;

pub use borough::*;
pub use cluster::*;
pub use preference::*;
pub use sections::*;
pub use store::*;
