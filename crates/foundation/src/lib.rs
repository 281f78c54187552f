pub mod bounds;
pub mod keys;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use keys::*;
