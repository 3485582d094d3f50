//! Greedy best-first pair assignment.

use chrono::{DateTime, Utc};

use super::policy::MatchPolicy;
use crate::models::{MediaItem, Pair};

/// Result of one matching pass.
///
/// Every input item ends up in exactly one of `pairs` or `unpaired`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Pairs formed in this pass, best score first.
    pub pairs: Vec<Pair>,
    /// Items left without a partner, in input order.
    pub unpaired: Vec<MediaItem>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Index of the member with the smaller id.
    lo: usize,
    /// Index of the member with the larger id.
    hi: usize,
    score: f64,
}

/// Pair up candidates by similarity.
///
/// All eligible pairs are scored and sorted by score, ties broken by the
/// sorted member ids. The list is walked once and a pair is committed when
/// neither member has been used. The result depends only on the input set
/// and `policy`, never on input order or timing.
///
/// Items that are ineligible for every partner (no creation time, already
/// paired) are passed through to `unpaired` untouched.
pub fn match_candidates(items: &[MediaItem], policy: &MatchPolicy, formed_at: DateTime<Utc>) -> MatchOutcome {
    let mut candidates = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let Some(score) = policy.score(&items[i], &items[j]) else {
                continue;
            };
            let (lo, hi) = if items[i].id <= items[j].id { (i, j) } else { (j, i) };
            candidates.push(Candidate { lo, hi, score });
        }
    }

    candidates.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| items[a.lo].id.cmp(&items[b.lo].id))
            .then_with(|| items[a.hi].id.cmp(&items[b.hi].id))
    });

    tracing::debug!(
        "Matching {} items: {} eligible candidate pairs",
        items.len(),
        candidates.len()
    );

    let mut used = vec![false; items.len()];
    let mut pairs = Vec::new();

    for candidate in candidates {
        if used[candidate.lo] || used[candidate.hi] {
            continue;
        }

        let first = items[candidate.lo].clone();
        let second = items[candidate.hi].clone();
        if let Some(pair) = Pair::new(first, second, formed_at) {
            tracing::debug!("Matched {} (score {:.3})", pair.id, candidate.score);
            used[candidate.lo] = true;
            used[candidate.hi] = true;
            pairs.push(pair);
        }
    }

    let unpaired = items
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(item, _)| item.clone())
        .collect();

    MatchOutcome { pairs, unpaired }
}
