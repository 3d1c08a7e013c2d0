//! Reviewer candidate selection
//!
//! Candidates are active members of a team minus an exclusion list. The
//! store only filters; ordering comes from a uniform sample without
//! replacement taken here, so review load spreads evenly regardless of how
//! the backend happens to return rows.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::store::StoreTx;
use crate::Result;

/// Draw up to `max_count` distinct ids from `eligible` in uniformly random order.
pub fn sample_candidates<R: Rng + ?Sized>(
    eligible: &[String],
    max_count: usize,
    rng: &mut R,
) -> Vec<String> {
    eligible.choose_multiple(rng, max_count).cloned().collect()
}

/// Select up to `max_count` active reviewers from `team_name`, skipping `exclude`.
///
/// Returns fewer ids (possibly none) when the eligible set is small.
pub async fn select_candidates(
    tx: &mut dyn StoreTx,
    team_name: &str,
    exclude: &[&str],
    max_count: usize,
) -> Result<Vec<String>> {
    let eligible = tx.eligible_reviewers(team_name, exclude).await?;
    debug!(
        team = %team_name,
        eligible = eligible.len(),
        max_count,
        "Sampling reviewer candidates"
    );

    Ok(sample_candidates(&eligible, max_count, &mut rand::thread_rng()))
}
