pub mod geodesy;
pub mod precision;
pub mod projection;

pub use geodesy::*;
pub use precision::*;
pub use projection::*;
