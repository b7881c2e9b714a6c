use std::sync::atomic::{AtomicBool, Ordering};

use flukematch_dtw::CurvatureDistance;
use log::info;
use rayon::prelude::*;

use crate::{
    error::ScoreError,
    feature::{Candidate, FeatureVector},
    reduction::Reduce,
    scorer::{ScoreOutcome, Scorer},
};

/// A query annotation, with its identity when already known.
#[derive(Debug, Clone)]
pub struct Query {
    pub item: String,
    pub identity: Option<String>,
    pub features: FeatureVector,
}

/// Result of matching one query against the database.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub query_item: String,
    pub query_identity: Option<String>,
    pub outcome: ScoreOutcome,
}

/// Score every query against `candidates` on the rayon pool.
///
/// Results come back in query order. `cancel` is checked before each query
/// starts; once it is set the whole call fails with [`ScoreError::Cancelled`].
pub fn identify_all<D, R>(
    scorer: &Scorer<D, R>,
    queries: &[Query],
    candidates: &[Candidate],
    cancel: Option<&AtomicBool>,
    verbose: bool,
) -> Result<Vec<QueryMatch>, ScoreError>
where
    D: CurvatureDistance,
    R: Reduce,
{
    if candidates.is_empty() {
        return Err(ScoreError::EmptyCandidateSet);
    }

    let total = queries.len();
    queries
        .par_iter()
        .enumerate()
        .map(|(i, q)| {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Err(ScoreError::Cancelled);
            }
            if verbose {
                info!("query {}/{}: {}", i + 1, total, q.item);
            }
            let outcome = scorer.score(&q.features, candidates)?;
            Ok(QueryMatch {
                query_item: q.item.clone(),
                query_identity: q.identity.clone(),
                outcome,
            })
        })
        .collect()
}
