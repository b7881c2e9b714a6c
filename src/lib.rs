pub mod batch;
pub mod config;
pub mod error;
pub mod feature;
pub mod reduction;
pub mod scorer;
pub mod storage;

// Re-export the distance primitive for convenience
pub use flukematch_dtw::{CurvatureDistance, DtwDistance};

pub use error::ScoreError;
pub use feature::{Candidate, FeatureVector, WeightVector};
pub use reduction::{Reduce, Reduction};
pub use scorer::{score, DistanceResult, IdentityScores, ScoreOutcome, Scorer};
