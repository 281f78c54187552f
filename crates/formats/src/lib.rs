pub mod boundary_file;

pub use boundary_file::*;
