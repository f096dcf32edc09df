pub mod config;
pub mod loader;
pub mod page;

pub use config::*;
pub use loader::*;
pub use page::*;
