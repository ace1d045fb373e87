pub mod geometry;
pub mod merge;
pub mod residual;
