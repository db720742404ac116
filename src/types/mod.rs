mod coord;
mod distance;
mod mercator;

pub use coord::*;
pub use distance::*;
pub use mercator::*;
