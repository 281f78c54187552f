pub mod initial;
pub mod resolver;

pub use initial::*;
pub use resolver::*;
