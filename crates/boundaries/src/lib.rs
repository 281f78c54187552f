pub mod cache;
pub mod error;
pub mod hierarchy;
pub mod store;
pub mod unit;

pub use cache::*;
pub use error::*;
pub use hierarchy::*;
pub use store::*;
pub use unit::*;
