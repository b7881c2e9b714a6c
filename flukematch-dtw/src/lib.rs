pub mod distance;
pub mod dtw;

// Re-export commonly used types
pub use distance::{CurvatureDistance, DtwDistance};
pub use dtw::{dtw_1d, weighted_dtw};
