pub mod geometry;
pub mod options;
pub mod record;

pub use geometry::*;
pub use options::*;
pub use record::*;
