use serde::{Deserialize, Serialize};

/// Collapses the scores of all candidates sharing an identity into one.
///
/// Returning `None` means no value could be produced; the scorer reports
/// that as an invalid reduction for the identity group.
pub trait Reduce: Send + Sync {
    fn reduce(&self, values: &[f32]) -> Option<f32>;
}

impl<F> Reduce for F
where
    F: Fn(&[f32]) -> Option<f32> + Send + Sync,
{
    fn reduce(&self, values: &[f32]) -> Option<f32> {
        self(values)
    }
}

/// Built-in decision functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    #[default]
    Mean,
    Median,
    Max,
    Min,
    Sum,
}

impl Reduce for Reduction {
    fn reduce(&self, values: &[f32]) -> Option<f32> {
        if values.is_empty() {
            return None;
        }
        let value = match self {
            Self::Mean => values.iter().sum::<f32>() / values.len() as f32,
            Self::Sum => values.iter().sum(),
            Self::Max => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Self::Min => values.iter().copied().fold(f32::INFINITY, f32::min),
            Self::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f32::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
        };
        Some(value)
    }
}

impl std::str::FromStr for Reduction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" | "average" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "sum" => Ok(Self::Sum),
            other => Err(format!("unknown reduction: {}", other)),
        }
    }
}
