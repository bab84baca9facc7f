use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::DomainResult;
use crate::competitors::{Competitor, RatingUpdate, validate_rating_update};
use crate::error::DomainError;
use crate::ports::competitors::CompetitorRepository;
use crate::ports::votes::VoteRepository;
use crate::ranking::{Direction, LeaderboardScale, rank_by, scale_to_leaderboard};
use crate::rating::{Battle, FittedRating, RatingConfig, fit};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedCompetitor {
    pub rank: usize,
    #[serde(flatten)]
    pub competitor: Competitor,
    pub scale: LeaderboardScale,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Leaderboard {
    pub entries: Vec<RankedCompetitor>,
    pub global_lo: f64,
    pub global_hi: f64,
}

/// Ranks competitors by score, best first, and scales every entry against
/// the global score extremes. Pure; recomputed on every render.
pub fn build_leaderboard(competitors: Vec<Competitor>) -> Leaderboard {
    let (global_lo, global_hi) = competitors
        .iter()
        .fold(None, |bounds, competitor| match bounds {
            None => Some((competitor.score, competitor.score)),
            Some((lo, hi)) => Some((
                f64::min(lo, competitor.score),
                f64::max(hi, competitor.score),
            )),
        })
        .unwrap_or((0.0, 0.0));

    let entries = rank_by(competitors, |competitor| competitor.score, Direction::Descending)
        .into_iter()
        .map(|ranked| {
            let scale = scale_to_leaderboard(
                ranked.item.score,
                ranked.item.bounds(),
                global_lo,
                global_hi,
            );
            RankedCompetitor {
                rank: ranked.rank,
                competitor: ranked.item,
                scale,
            }
        })
        .collect();

    Leaderboard {
        entries,
        global_lo,
        global_hi,
    }
}

/// Projects fitted ratings onto the stored competitor rows. Competitors
/// without a fitted rating keep their stored score and stay bound-less.
pub fn overlay_ratings(
    competitors: Vec<Competitor>,
    ratings: &HashMap<String, FittedRating>,
) -> Vec<Competitor> {
    competitors
        .into_iter()
        .map(|mut competitor| {
            if let Some(rating) = ratings.get(&competitor.competitor_id) {
                competitor.score = rating.score;
                competitor.lower_bound = Some(rating.lower);
                competitor.upper_bound = Some(rating.upper);
                competitor.vote_count = rating.vote_count;
            }
            competitor
        })
        .collect()
}

#[derive(Clone)]
pub struct LeaderboardService {
    competitors: Arc<dyn CompetitorRepository>,
    votes: Arc<dyn VoteRepository>,
    config: RatingConfig,
}

impl LeaderboardService {
    pub fn new(
        competitors: Arc<dyn CompetitorRepository>,
        votes: Arc<dyn VoteRepository>,
        config: RatingConfig,
    ) -> Self {
        Self {
            competitors,
            votes,
            config,
        }
    }

    /// Fresh leaderboard from the current vote snapshot, optionally scoped
    /// to a single judge's votes.
    pub async fn ranked(&self, judge_id: Option<&str>) -> DomainResult<Leaderboard> {
        let competitors = self.competitors.list().await?;
        let votes = match judge_id {
            Some(judge_id) => self.votes.list_by_judge(judge_id).await?,
            None => self.votes.list_all().await?,
        };
        let battles: Vec<Battle> = votes.iter().map(Battle::from).collect();
        let ratings = fit(&battles, &self.config);
        Ok(build_leaderboard(overlay_ratings(competitors, &ratings)))
    }

    /// Refits from the full vote history and persists scores and bounds,
    /// resetting competitors whose last votes were retracted. Returns how
    /// many rows were touched.
    pub async fn recompute_and_store(&self) -> DomainResult<usize> {
        let votes = self.votes.list_all().await?;
        let battles: Vec<Battle> = votes.iter().map(Battle::from).collect();
        let ratings = fit(&battles, &self.config);

        let mut touched = 0usize;
        for (competitor_id, rating) in &ratings {
            let update = RatingUpdate {
                score: rating.score,
                bounds: Some((rating.lower, rating.upper)),
                vote_count: rating.vote_count,
            };
            validate_rating_update(&update)?;
            // old votes can reference competitors deleted since
            match self.competitors.update_rating(competitor_id, &update).await {
                Ok(_) => touched += 1,
                Err(DomainError::NotFound) => {}
                Err(err) => return Err(err),
            }
        }

        let rated_ids: Vec<String> = ratings.keys().cloned().collect();
        touched += self
            .competitors
            .reset_unrated(&rated_ids, self.config.initial_score)
            .await?;
        Ok(touched)
    }
}
