use serde::Deserialize;

use crate::DomainResult;
use crate::error::DomainError;

/// Inputs for estimating how many judgements an automated run will issue.
/// `existing_votes` only matters when `skip_existing` is set.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct WorkloadInput {
    pub total_pairs: u64,
    pub judge_count: u64,
    pub existing_votes: u64,
    pub skip_existing: bool,
    pub fraction: f64,
}

/// Number of unordered pairs among `competitors` entities, with no
/// self-pairs: n * (n - 1) / 2.
pub fn unordered_pair_count(competitors: u64) -> u64 {
    competitors * competitors.saturating_sub(1) / 2
}

/// ceil(fraction * (total_pairs * judge_count - skipped)), clamped at zero.
/// Stale inputs can report more existing votes than the population holds;
/// the subtraction saturates rather than producing a negative estimate.
pub fn judgements_to_run(input: &WorkloadInput) -> DomainResult<u64> {
    if !input.fraction.is_finite() || input.fraction <= 0.0 || input.fraction > 1.0 {
        return Err(DomainError::Validation(format!(
            "fraction must be in (0, 1], got {}",
            input.fraction
        )));
    }

    let population = input.total_pairs.saturating_mul(input.judge_count);
    let skipped = if input.skip_existing {
        input.existing_votes
    } else {
        0
    };
    let remaining = population.saturating_sub(skipped);
    Ok((input.fraction * remaining as f64).ceil() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(total_pairs: u64, judge_count: u64, fraction: f64) -> WorkloadInput {
        WorkloadInput {
            total_pairs,
            judge_count,
            existing_votes: 0,
            skip_existing: false,
            fraction,
        }
    }

    #[test]
    fn full_fraction_single_judge_covers_every_pair() {
        assert_eq!(judgements_to_run(&input(10, 1, 1.0)).unwrap(), 10);
    }

    #[test]
    fn half_fraction_halves_the_population() {
        assert_eq!(judgements_to_run(&input(10, 1, 0.5)).unwrap(), 5);
    }

    #[test]
    fn fractional_results_round_up() {
        assert_eq!(judgements_to_run(&input(3, 1, 0.5)).unwrap(), 2);
    }

    #[test]
    fn judges_multiply_the_population() {
        assert_eq!(judgements_to_run(&input(10, 3, 1.0)).unwrap(), 30);
    }

    #[test]
    fn skip_existing_subtracts_prior_votes() {
        let estimate = judgements_to_run(&WorkloadInput {
            total_pairs: 10,
            judge_count: 2,
            existing_votes: 7,
            skip_existing: true,
            fraction: 1.0,
        })
        .unwrap();
        assert_eq!(estimate, 13);
    }

    #[test]
    fn existing_votes_are_ignored_without_skip() {
        let estimate = judgements_to_run(&WorkloadInput {
            total_pairs: 10,
            judge_count: 1,
            existing_votes: 7,
            skip_existing: false,
            fraction: 1.0,
        })
        .unwrap();
        assert_eq!(estimate, 10);
    }

    #[test]
    fn stale_vote_counts_clamp_to_zero() {
        let estimate = judgements_to_run(&WorkloadInput {
            total_pairs: 3,
            judge_count: 1,
            existing_votes: 50,
            skip_existing: true,
            fraction: 1.0,
        })
        .unwrap();
        assert_eq!(estimate, 0);
    }

    #[test]
    fn out_of_range_fractions_are_contract_violations() {
        assert!(judgements_to_run(&input(10, 1, 0.0)).is_err());
        assert!(judgements_to_run(&input(10, 1, -0.5)).is_err());
        assert!(judgements_to_run(&input(10, 1, 1.5)).is_err());
        assert!(judgements_to_run(&input(10, 1, f64::NAN)).is_err());
    }

    #[test]
    fn pair_population_size() {
        assert_eq!(unordered_pair_count(0), 0);
        assert_eq!(unordered_pair_count(1), 0);
        assert_eq!(unordered_pair_count(2), 1);
        assert_eq!(unordered_pair_count(4), 6);
        assert_eq!(unordered_pair_count(10), 45);
    }
}
