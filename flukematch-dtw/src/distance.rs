use crate::dtw::{dtw_1d, weighted_dtw};
use ndarray::{ArrayView1, Axis};

/// Distance between two curvature sequences of one size bucket.
///
/// Implementations are expected to be non-negative, symmetric and zero for
/// identical inputs. Scoring treats them as deterministic.
pub trait CurvatureDistance: Send + Sync {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

impl<F> CurvatureDistance for F
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self(a, b)
    }
}

/// Windowed dynamic time warping, optionally weighting positions along the
/// edge. Position weights must have one entry per curvature value; sequences
/// of any other length come out as NaN, which scoring rejects.
#[derive(Debug, Clone, PartialEq)]
pub struct DtwDistance {
    pub window: usize,
    pub position_weights: Option<Vec<f32>>,
}

impl DtwDistance {
    pub const DEFAULT_WINDOW: usize = 50;

    pub fn new(window: usize) -> Self {
        Self {
            window,
            position_weights: None,
        }
    }

    pub fn with_position_weights(mut self, weights: Vec<f32>) -> Self {
        self.position_weights = Some(weights);
        self
    }
}

impl Default for DtwDistance {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

impl CurvatureDistance for DtwDistance {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match &self.position_weights {
            None => dtw_1d(a, b, self.window),
            Some(w) => weighted_dtw(
                ArrayView1::from(a).insert_axis(Axis(1)),
                ArrayView1::from(b).insert_axis(Axis(1)),
                Some(w),
                self.window,
            ),
        }
    }
}
