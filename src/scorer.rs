use std::collections::{HashMap, HashSet};

use flukematch_dtw::{CurvatureDistance, DtwDistance};

use crate::{
    config::MatchConfig,
    error::ScoreError,
    feature::{Candidate, FeatureVector, WeightVector},
    reduction::{Reduce, Reduction},
};

/// Distance from the query to one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceResult {
    pub item: String,
    pub identity: String,
    /// Weighted sum of per-bucket distances, lower is closer.
    pub distance: f32,
    /// `-distance`, higher is better. Rankings sort on this.
    pub score: f32,
}

/// Aggregated score per identity, in first-seen candidate order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityScores {
    entries: Vec<(String, f32)>,
}

impl IdentityScores {
    pub fn get(&self, identity: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(id, s)| (id.as_str(), *s))
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// One entry per candidate, in candidate order.
    pub distances: Vec<DistanceResult>,
    pub identities: IdentityScores,
}

impl ScoreOutcome {
    /// Candidates sorted best first. Ties keep candidate order.
    pub fn ranked_candidates(&self) -> Vec<&DistanceResult> {
        let mut ranked: Vec<&DistanceResult> = self.distances.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    /// Identities sorted best first. Ties keep first-seen order.
    pub fn ranked_identities(&self) -> Vec<(&str, f32)> {
        let mut ranked: Vec<(&str, f32)> = self.identities.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    pub fn best_identity(&self) -> Option<(&str, f32)> {
        self.ranked_identities().into_iter().next()
    }

    /// The aggregated score of each candidate's identity, in candidate order.
    pub fn candidate_identity_scores(&self) -> Vec<f32> {
        self.distances
            .iter()
            .filter_map(|d| self.identities.get(&d.identity))
            .collect()
    }
}

/// Score `query` against every candidate.
///
/// Each candidate's distance is the weighted sum of per-bucket distances;
/// its score is the negated distance so that larger means more similar.
/// Scores are then grouped by identity (first-seen order) and collapsed with
/// `reduction`. Item labels and shapes are validated before any distance is
/// computed; a negative or non-finite bucket distance fails the call before
/// aggregation.
pub fn score<D, R>(
    distance: &D,
    query: &FeatureVector,
    candidates: &[Candidate],
    weights: &WeightVector,
    reduction: &R,
) -> Result<ScoreOutcome, ScoreError>
where
    D: CurvatureDistance + ?Sized,
    R: Reduce + ?Sized,
{
    if candidates.is_empty() {
        return Err(ScoreError::EmptyCandidateSet);
    }
    if weights.len() != query.bucket_count() {
        return Err(ScoreError::mismatch(
            "weights",
            query.bucket_count(),
            weights.len(),
        ));
    }
    let mut seen = HashSet::with_capacity(candidates.len());
    for c in candidates {
        if !seen.insert(c.item.as_str()) {
            return Err(ScoreError::DuplicateItem {
                item: c.item.clone(),
            });
        }
        query.check_shape(&c.features, &format!("candidate {}", c.item))?;
    }

    let distances = candidates
        .iter()
        .map(|c| {
            let mut combined = 0.0f32;
            for (bucket, ((q, d), w)) in query
                .buckets
                .iter()
                .zip(&c.features.buckets)
                .zip(weights.as_slice())
                .enumerate()
            {
                let value = distance.distance(q, d);
                // NaN fails this too
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ScoreError::InvalidDistance {
                        item: c.item.clone(),
                        bucket,
                        value,
                    });
                }
                combined += w * value;
            }
            Ok(DistanceResult {
                item: c.item.clone(),
                identity: c.identity.clone(),
                distance: combined,
                score: -combined,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let identities = aggregate(&distances, reduction)?;

    Ok(ScoreOutcome {
        distances,
        identities,
    })
}

fn aggregate<R>(distances: &[DistanceResult], reduction: &R) -> Result<IdentityScores, ScoreError>
where
    R: Reduce + ?Sized,
{
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<f32>> = HashMap::new();
    for d in distances {
        groups
            .entry(d.identity.as_str())
            .or_insert_with(|| {
                order.push(d.identity.as_str());
                Vec::new()
            })
            .push(d.score);
    }

    let mut entries = Vec::with_capacity(order.len());
    for identity in order {
        let value = groups
            .get(identity)
            .and_then(|scores| reduction.reduce(scores))
            .filter(|v| !v.is_nan())
            .ok_or_else(|| ScoreError::InvalidReduction {
                identity: identity.to_string(),
            })?;
        entries.push((identity.to_string(), value));
    }

    Ok(IdentityScores { entries })
}

/// A distance primitive, bucket weights and a decision function bundled
/// from a [`MatchConfig`].
pub struct Scorer<D = DtwDistance, R = Reduction> {
    pub distance: D,
    pub weights: WeightVector,
    pub reduction: R,
}

impl Scorer {
    pub fn from_config(cfg: &MatchConfig) -> Result<Self, ScoreError> {
        let mut distance = DtwDistance::new(cfg.window);
        if let Some(w) = &cfg.position_weights {
            distance = distance.with_position_weights(w.clone());
        }
        Ok(Self {
            distance,
            weights: cfg.resolve_weights()?,
            reduction: cfg.decision,
        })
    }
}

impl<D: CurvatureDistance, R: Reduce> Scorer<D, R> {
    pub fn new(distance: D, weights: WeightVector, reduction: R) -> Self {
        Self {
            distance,
            weights,
            reduction,
        }
    }

    pub fn score(
        &self,
        query: &FeatureVector,
        candidates: &[Candidate],
    ) -> Result<ScoreOutcome, ScoreError> {
        score(
            &self.distance,
            query,
            candidates,
            &self.weights,
            &self.reduction,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Distance that is the first element of `b`, so each candidate can
    /// carry its per-bucket distances directly.
    fn planted(_a: &[f32], b: &[f32]) -> f32 {
        b[0]
    }

    fn fv(buckets: &[f32]) -> FeatureVector {
        FeatureVector::new(buckets.iter().map(|d| vec![*d]).collect())
    }

    #[test]
    fn test_weighted_sum_and_sign() {
        let query = fv(&[0.0, 0.0]);
        let candidates = vec![Candidate::new("c1", "A", fv(&[2.0, 4.0]))];
        let out = score(
            &planted,
            &query,
            &candidates,
            &WeightVector::uniform(2),
            &Reduction::Mean,
        )
        .unwrap();

        assert_eq!(out.distances[0].distance, 6.0);
        assert_eq!(out.distances[0].score, -6.0);
        assert_eq!(out.identities.get("A"), Some(-6.0));
    }

    #[test]
    fn test_weights_applied_per_bucket() {
        let query = fv(&[0.0, 0.0]);
        let candidates = vec![Candidate::new("c1", "A", fv(&[2.0, 4.0]))];
        let out = score(
            &planted,
            &query,
            &candidates,
            &WeightVector::from(vec![0.5, 2.0]),
            &Reduction::Mean,
        )
        .unwrap();
        assert_eq!(out.distances[0].distance, 9.0);
    }

    #[test]
    fn test_mean_of_identity_group() {
        let query = fv(&[0.0]);
        let candidates = vec![
            Candidate::new("c1", "A", fv(&[3.0])),
            Candidate::new("c2", "B", fv(&[1.0])),
            Candidate::new("c3", "A", fv(&[5.0])),
        ];
        let out = score(
            &planted,
            &query,
            &candidates,
            &WeightVector::uniform(1),
            &Reduction::Mean,
        )
        .unwrap();

        assert_eq!(out.identities.get("A"), Some(-4.0));
        assert_eq!(out.identities.get("B"), Some(-1.0));
        assert_eq!(out.identities.identities().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(out.candidate_identity_scores(), vec![-4.0, -1.0, -4.0]);
        assert_eq!(out.best_identity(), Some(("B", -1.0)));
    }

    #[test]
    fn test_ranked_candidates_stable() {
        let query = fv(&[0.0]);
        let candidates = vec![
            Candidate::new("c1", "A", fv(&[2.0])),
            Candidate::new("c2", "B", fv(&[1.0])),
            Candidate::new("c3", "C", fv(&[2.0])),
        ];
        let out = score(
            &planted,
            &query,
            &candidates,
            &WeightVector::uniform(1),
            &Reduction::Mean,
        )
        .unwrap();
        let items: Vec<&str> = out
            .ranked_candidates()
            .iter()
            .map(|d| d.item.as_str())
            .collect();
        assert_eq!(items, vec!["c2", "c1", "c3"]);
    }

    #[test]
    fn test_empty_candidates() {
        let err = score(
            &planted,
            &fv(&[0.0]),
            &[],
            &WeightVector::uniform(1),
            &Reduction::Mean,
        )
        .unwrap_err();
        assert_eq!(err, ScoreError::EmptyCandidateSet);
    }

    #[test]
    fn test_weight_length_mismatch() {
        let query = fv(&[0.0; 4]);
        let candidates = vec![Candidate::new("c1", "A", fv(&[1.0; 4]))];
        let err = score(
            &planted,
            &query,
            &candidates,
            &WeightVector::uniform(3),
            &Reduction::Mean,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScoreError::DimensionMismatch { expected: 4, actual: 3, .. }
        ));
    }

    #[test]
    fn test_candidate_shape_mismatch() {
        let query = fv(&[0.0, 0.0]);
        let candidates = vec![
            Candidate::new("c1", "A", fv(&[1.0, 1.0])),
            Candidate::new("c2", "A", fv(&[1.0])),
        ];
        let err = score(
            &planted,
            &query,
            &candidates,
            &WeightVector::uniform(2),
            &Reduction::Mean,
        )
        .unwrap_err();
        assert!(matches!(err, ScoreError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let query = fv(&[0.0]);
        let candidates = vec![
            Candidate::new("c1", "A", fv(&[1.0])),
            Candidate::new("c1", "B", fv(&[2.0])),
        ];
        let err = score(
            &planted,
            &query,
            &candidates,
            &WeightVector::uniform(1),
            &Reduction::Mean,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScoreError::DuplicateItem {
                item: "c1".to_string()
            }
        );
    }

    #[test]
    fn test_nan_distance_not_hidden_by_reduction() {
        let query = fv(&[0.0]);
        let candidates = vec![
            Candidate::new("c1", "A", fv(&[f32::NAN])),
            Candidate::new("c2", "A", fv(&[3.0])),
        ];
        for reduction in [Reduction::Max, Reduction::Min, Reduction::Mean, Reduction::Sum] {
            let err = score(
                &planted,
                &query,
                &candidates,
                &WeightVector::uniform(1),
                &reduction,
            )
            .unwrap_err();
            assert!(
                matches!(
                    err,
                    ScoreError::InvalidDistance { ref item, bucket: 0, .. } if item == "c1"
                ),
                "{:?}: {:?}",
                reduction,
                err
            );
        }
    }

    #[test]
    fn test_negative_and_infinite_distance_rejected() {
        let query = fv(&[0.0, 0.0]);
        let negative = vec![Candidate::new("c1", "A", fv(&[1.0, -2.0]))];
        let err = score(
            &planted,
            &query,
            &negative,
            &WeightVector::uniform(2),
            &Reduction::Max,
        )
        .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidDistance { bucket: 1, .. }));

        let infinite = vec![Candidate::new("c1", "A", fv(&[f32::INFINITY, 0.0]))];
        let err = score(
            &planted,
            &query,
            &infinite,
            &WeightVector::uniform(2),
            &Reduction::Mean,
        )
        .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidDistance { bucket: 0, .. }));
    }

    #[test]
    fn test_invalid_reduction_names_identity() {
        let query = fv(&[0.0]);
        let candidates = vec![
            Candidate::new("c1", "A", fv(&[1.0])),
            Candidate::new("c2", "B", fv(&[2.0])),
        ];
        let picky = |v: &[f32]| if v[0] < -1.5 { None } else { Some(v[0]) };
        let err = score(&planted, &query, &candidates, &WeightVector::uniform(1), &picky)
            .unwrap_err();
        assert_eq!(
            err,
            ScoreError::InvalidReduction {
                identity: "B".to_string()
            }
        );

        let nan = |_: &[f32]| Some(f32::NAN);
        assert!(score(&planted, &query, &candidates, &WeightVector::uniform(1), &nan).is_err());
    }
}
