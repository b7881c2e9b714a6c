use crate::error::ScoreError;
use serde::{Deserialize, Serialize};

/// Block curvature of one trailing edge: one sub-vector per size bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub buckets: Vec<Vec<f32>>,
}

impl FeatureVector {
    pub fn new(buckets: Vec<Vec<f32>>) -> Self {
        Self { buckets }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Fails unless `other` has the same bucket count and per-bucket lengths.
    pub fn check_shape(&self, other: &FeatureVector, label: &str) -> Result<(), ScoreError> {
        if other.bucket_count() != self.bucket_count() {
            return Err(ScoreError::mismatch(
                format!("bucket count of {}", label),
                self.bucket_count(),
                other.bucket_count(),
            ));
        }
        for (i, (mine, theirs)) in self.buckets.iter().zip(&other.buckets).enumerate() {
            if mine.len() != theirs.len() {
                return Err(ScoreError::mismatch(
                    format!("bucket {} of {}", i, label),
                    mine.len(),
                    theirs.len(),
                ));
            }
        }
        Ok(())
    }
}

/// A database-side feature vector with its identity (name) and item
/// (annotation) labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub item: String,
    pub identity: String,
    pub features: FeatureVector,
}

impl Candidate {
    pub fn new(item: impl Into<String>, identity: impl Into<String>, features: FeatureVector) -> Self {
        Self {
            item: item.into(),
            identity: identity.into(),
            features,
        }
    }
}

/// Per-bucket weights applied when combining bucket distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightVector(pub Vec<f32>);

impl WeightVector {
    pub fn uniform(len: usize) -> Self {
        Self(vec![1.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for WeightVector {
    fn from(weights: Vec<f32>) -> Self {
        Self(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_shape() {
        let q = FeatureVector::new(vec![vec![0.0; 3], vec![0.0; 2]]);
        assert!(q.check_shape(&q.clone(), "same").is_ok());

        let fewer = FeatureVector::new(vec![vec![0.0; 3]]);
        assert!(matches!(
            q.check_shape(&fewer, "fewer"),
            Err(ScoreError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));

        let shorter = FeatureVector::new(vec![vec![0.0; 3], vec![0.0; 1]]);
        assert!(matches!(
            q.check_shape(&shorter, "shorter"),
            Err(ScoreError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_feature_json_layout() {
        let fv: FeatureVector = serde_json::from_str(r#"{"buckets": [[0.5, 1.0], [2.0, 3.0]]}"#).unwrap();
        assert_eq!(fv.bucket_count(), 2);
        assert_eq!(fv.buckets[1], vec![2.0, 3.0]);
    }

    #[test]
    fn test_uniform_weights() {
        assert_eq!(WeightVector::uniform(4).as_slice(), &[1.0, 1.0, 1.0, 1.0]);
    }
}
