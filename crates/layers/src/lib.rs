pub mod compiler;
pub mod export;
pub mod labels;
pub mod layer;
pub mod symbology;

pub use compiler::*;
pub use export::*;
pub use labels::*;
pub use layer::*;
pub use symbology::*;
