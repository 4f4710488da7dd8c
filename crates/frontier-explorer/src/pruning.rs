//! Dominance pruning for explorer frontiers.
//!
//! A state is discarded when another state in the same generation is at
//! least as good in every tracked field. Such a state can never lead to a
//! strictly better objective than the state that dominates it, so removing
//! it keeps the frontier small without changing the answer.

use std::collections::HashMap;
use std::hash::Hash;

use crate::explorer::Frontier;

/// Field-wise partial order over states of one generation.
pub trait Dominance {
    /// States with different buckets are never compared.
    type Bucket: Eq + Hash;

    fn bucket(&self) -> Self::Bucket;

    /// True if `self` is at least as good as `other` in every field.
    fn dominates(&self, other: &Self) -> bool;
}

/// Drop every state that is dominated by a distinct state of the frontier.
///
/// Comparison is all-pairs within each bucket. Equal states were already
/// collapsed by the set, so every remaining pair is distinct.
pub fn remove_dominated<S>(frontier: Frontier<S>) -> Frontier<S>
where
    S: Dominance + Eq + Hash,
{
    let mut buckets: HashMap<S::Bucket, Vec<S>> = HashMap::new();
    for state in frontier {
        buckets.entry(state.bucket()).or_default().push(state);
    }

    let mut kept = Frontier::new();
    for states in buckets.into_values() {
        let dominated: Vec<bool> = states
            .iter()
            .enumerate()
            .map(|(i, state)| {
                states
                    .iter()
                    .enumerate()
                    .any(|(j, other)| i != j && other.dominates(state))
            })
            .collect();

        kept.extend(
            states
                .into_iter()
                .zip(dominated)
                .filter_map(|(state, dominated)| (!dominated).then_some(state)),
        );
    }
    kept
}

/// Apply a ceiling clamp to every state, merging states that become equal.
pub fn clamp_all<S, F>(frontier: Frontier<S>, clamp: F) -> Frontier<S>
where
    S: Eq + Hash,
    F: Fn(S) -> S,
{
    frontier.into_iter().map(clamp).collect()
}
