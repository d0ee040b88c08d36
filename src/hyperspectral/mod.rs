//! Hyperspectral cube data structures

mod cube;
mod grid;

pub use cube::{HyperspectralCube, Metadata};
pub use grid::WavelengthGrid;
