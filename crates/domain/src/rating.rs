use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::votes::{Verdict, Vote};

const ELO_BASE: f64 = 10.0;
const ELO_SCALE: f64 = 400.0;
const LOWER_QUANTILE: f64 = 0.025;
const UPPER_QUANTILE: f64 = 0.975;

pub const DEFAULT_INITIAL_SCORE: f64 = 1000.0;
pub const DEFAULT_K_FACTOR: f64 = 4.0;
pub const DEFAULT_BOOTSTRAP_ROUNDS: u32 = 200;

#[derive(Clone, Copy, Debug)]
pub struct RatingConfig {
    pub initial_score: f64,
    pub k_factor: f64,
    /// Resampling rounds for the confidence band. Zero collapses the band
    /// onto the point estimate.
    pub bootstrap_rounds: u32,
    pub seed: u64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_score: DEFAULT_INITIAL_SCORE,
            k_factor: DEFAULT_K_FACTOR,
            bootstrap_rounds: DEFAULT_BOOTSTRAP_ROUNDS,
            seed: 0,
        }
    }
}

/// One judged head-to-head, oriented: `verdict` is from A's side.
#[derive(Clone, Debug, PartialEq)]
pub struct Battle {
    pub competitor_a: String,
    pub competitor_b: String,
    pub verdict: Verdict,
}

impl From<&Vote> for Battle {
    fn from(vote: &Vote) -> Self {
        Self {
            competitor_a: vote.pair.competitor_a().to_string(),
            competitor_b: vote.pair.competitor_b().to_string(),
            verdict: vote.verdict,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FittedRating {
    pub score: f64,
    pub lower: f64,
    pub upper: f64,
    pub vote_count: u64,
}

/// Logistic win expectation for A against B (base 10, scale 400).
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + ELO_BASE.powf((rating_b - rating_a) / ELO_SCALE))
}

fn outcome_value(verdict: Verdict) -> f64 {
    match verdict {
        Verdict::A => 1.0,
        Verdict::B => 0.0,
        Verdict::Tie => 0.5,
    }
}

/// A's rating delta for one battle. B moves by the negation, so the pool
/// stays zero-sum.
pub fn elo_step(rating_a: f64, rating_b: f64, verdict: Verdict, k_factor: f64) -> f64 {
    k_factor * (outcome_value(verdict) - expected_score(rating_a, rating_b))
}

/// Sequential Elo over the battle sequence in the order given. Only
/// competitors that appear in at least one battle get an entry.
pub fn fit_point(battles: &[Battle], config: &RatingConfig) -> HashMap<String, f64> {
    let mut scores: HashMap<String, f64> = HashMap::new();
    for battle in battles {
        let rating_a = *scores
            .entry(battle.competitor_a.clone())
            .or_insert(config.initial_score);
        let rating_b = *scores
            .entry(battle.competitor_b.clone())
            .or_insert(config.initial_score);

        let delta = elo_step(rating_a, rating_b, battle.verdict, config.k_factor);
        scores.insert(battle.competitor_a.clone(), rating_a + delta);
        scores.insert(battle.competitor_b.clone(), rating_b - delta);
    }
    scores
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let index = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[index]
}

/// Point fit plus a percentile-bootstrap confidence band: the battle
/// sequence is resampled with replacement, refit per round, and the
/// 2.5th/97.5th percentiles taken per competitor. Deterministic for a
/// given seed. Bounds are widened to bracket the point estimate so the
/// `lower <= score <= upper` invariant always holds.
pub fn fit(battles: &[Battle], config: &RatingConfig) -> HashMap<String, FittedRating> {
    let point = fit_point(battles, config);
    if point.is_empty() {
        return HashMap::new();
    }

    let mut vote_counts: HashMap<&str, u64> = HashMap::new();
    for battle in battles {
        *vote_counts.entry(battle.competitor_a.as_str()).or_insert(0) += 1;
        *vote_counts.entry(battle.competitor_b.as_str()).or_insert(0) += 1;
    }

    let mut samples: HashMap<String, Vec<f64>> = HashMap::new();
    let mut rng = StdRng::seed_from_u64(config.seed);
    for _ in 0..config.bootstrap_rounds {
        let resample: Vec<Battle> = (0..battles.len())
            .map(|_| battles[rng.gen_range(0..battles.len())].clone())
            .collect();
        for (competitor, score) in fit_point(&resample, config) {
            samples.entry(competitor).or_default().push(score);
        }
    }

    point
        .into_iter()
        .map(|(competitor, score)| {
            let (lower, upper) = match samples.get_mut(&competitor) {
                Some(drawn) if !drawn.is_empty() => {
                    drawn.sort_by(|a, b| a.total_cmp(b));
                    (
                        quantile(drawn, LOWER_QUANTILE).min(score),
                        quantile(drawn, UPPER_QUANTILE).max(score),
                    )
                }
                _ => (score, score),
            };
            let vote_count = vote_counts.get(competitor.as_str()).copied().unwrap_or(0);
            (
                competitor,
                FittedRating {
                    score,
                    lower,
                    upper,
                    vote_count,
                },
            )
        })
        .collect()
}
