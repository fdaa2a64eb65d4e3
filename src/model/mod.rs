pub mod category;
pub mod config;
pub mod entry;
pub mod geometry;
pub mod ids;
pub mod list;

pub use category::*;
pub use config::*;
pub use entry::*;
pub use geometry::*;
pub use ids::*;
pub use list::*;
