use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::rating::{RatingConfig, elo_step};
use crate::votes::Vote;

/// One per-round score update from a competitor's judged history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreUpdate {
    pub round: u64,
    pub opponent_id: String,
    pub opponent_name: String,
    pub judge_id: String,
    pub judge_name: String,
    pub score_after: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub round: u64,
    pub score: f64,
}

/// A competitor's score-over-rounds series, reduced once from a fetched
/// event history and re-projectable (per judge, per round) without going
/// back to the server.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    events: Vec<ScoreUpdate>,
}

impl Trajectory {
    /// Events must already be in chronological round order; the reduction
    /// preserves the order it is given.
    pub fn from_events(events: Vec<ScoreUpdate>) -> Self {
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn points(&self) -> Vec<TrajectoryPoint> {
        self.events
            .iter()
            .map(|event| TrajectoryPoint {
                round: event.round,
                score: event.score_after,
            })
            .collect()
    }

    /// Running (min, max) across the whole series, for a tight display
    /// range. None for an empty trajectory.
    pub fn score_bounds(&self) -> Option<(f64, f64)> {
        self.events.iter().fold(None, |bounds, event| {
            let score = event.score_after;
            match bounds {
                None => Some((score, score)),
                Some((lo, hi)) => Some((lo.min(score), hi.max(score))),
            }
        })
    }

    /// Full event detail for one round, for tooltip rendering.
    pub fn event_at_round(&self, round: u64) -> Option<&ScoreUpdate> {
        self.events.iter().find(|event| event.round == round)
    }

    /// The sub-trajectory contributed by a single judge. Pure projection
    /// over the already-fetched history.
    pub fn filtered_by_judge(&self, judge_id: &str) -> Trajectory {
        Trajectory {
            events: self
                .events
                .iter()
                .filter(|event| event.judge_id == judge_id)
                .cloned()
                .collect(),
        }
    }

    pub fn events(&self) -> &[ScoreUpdate] {
        &self.events
    }
}

/// Replays the full vote history through the same sequential update that
/// fits the leaderboard, emitting one event per battle the competitor took
/// part in. Rounds count that competitor's battles, starting at 1. Unknown
/// opponent ids fall back to the id itself as the display name.
pub fn reduce_from_votes(
    votes: &[Vote],
    competitor_id: &str,
    names: &HashMap<String, String>,
    config: &RatingConfig,
) -> Trajectory {
    let mut scores: HashMap<String, f64> = HashMap::new();
    let mut events = Vec::new();
    let mut round = 0u64;

    for vote in votes {
        let id_a = vote.pair.competitor_a();
        let id_b = vote.pair.competitor_b();
        let rating_a = *scores
            .entry(id_a.to_string())
            .or_insert(config.initial_score);
        let rating_b = *scores
            .entry(id_b.to_string())
            .or_insert(config.initial_score);

        let delta = elo_step(rating_a, rating_b, vote.verdict, config.k_factor);
        scores.insert(id_a.to_string(), rating_a + delta);
        scores.insert(id_b.to_string(), rating_b - delta);

        let (opponent_id, score_after) = if id_a == competitor_id {
            (id_b, rating_a + delta)
        } else if id_b == competitor_id {
            (id_a, rating_b - delta)
        } else {
            continue;
        };

        round += 1;
        events.push(ScoreUpdate {
            round,
            opponent_id: opponent_id.to_string(),
            opponent_name: names
                .get(opponent_id)
                .cloned()
                .unwrap_or_else(|| opponent_id.to_string()),
            judge_id: vote.judge_id.clone(),
            judge_name: vote.judge_name.clone(),
            score_after,
        });
    }

    Trajectory::from_events(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(round: u64, judge: &str, score_after: f64) -> ScoreUpdate {
        ScoreUpdate {
            round,
            opponent_id: "opp-id".to_string(),
            opponent_name: "opponent".to_string(),
            judge_id: format!("{judge}-id"),
            judge_name: judge.to_string(),
            score_after,
        }
    }

    fn sample() -> Trajectory {
        Trajectory::from_events(vec![
            update(1, "gpt-judge", 1004.0),
            update(2, "claude-judge", 1001.5),
            update(3, "gpt-judge", 1005.2),
            update(4, "gpt-judge", 998.0),
        ])
    }

    #[test]
    fn points_follow_input_order_with_increasing_rounds() {
        let points = sample().points();
        let rounds: Vec<u64> = points.iter().map(|point| point.round).collect();
        assert_eq!(rounds, vec![1, 2, 3, 4]);
        assert!(rounds.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(points[2].score, 1005.2);
    }

    #[test]
    fn bounds_track_the_running_extremes() {
        assert_eq!(sample().score_bounds(), Some((998.0, 1005.2)));
        assert_eq!(Trajectory::default().score_bounds(), None);
    }

    #[test]
    fn round_lookup_returns_full_detail() {
        let trajectory = sample();
        let event = trajectory.event_at_round(2).unwrap();
        assert_eq!(event.judge_name, "claude-judge");
        assert_eq!(event.score_after, 1001.5);
        assert!(trajectory.event_at_round(99).is_none());
    }

    #[test]
    fn judge_filter_projects_without_refetching() {
        let trajectory = sample();
        let filtered = trajectory.filtered_by_judge("gpt-judge-id");
        assert_eq!(filtered.len(), 3);
        let rounds: Vec<u64> = filtered.points().iter().map(|point| point.round).collect();
        assert_eq!(rounds, vec![1, 3, 4]);
        // the source trajectory is untouched
        assert_eq!(trajectory.len(), 4);
    }

    #[test]
    fn filtering_twice_equals_filtering_once() {
        let filtered = sample().filtered_by_judge("gpt-judge-id");
        assert_eq!(filtered.filtered_by_judge("gpt-judge-id"), filtered);
    }

    mod replay {
        use super::*;
        use crate::votes::{HeadToHeadPair, Verdict};

        fn vote(a: &str, b: &str, judge: &str, verdict: Verdict) -> Vote {
            let pair = HeadToHeadPair::new(a, b).unwrap();
            let verdict = if pair.is_swapped_from(a) {
                verdict.flipped()
            } else {
                verdict
            };
            Vote {
                vote_id: format!("vote-{a}-{b}-{judge}"),
                pair,
                judge_id: format!("{judge}-id"),
                judge_name: judge.to_string(),
                verdict,
                created_at_ms: 0,
            }
        }

        fn names() -> HashMap<String, String> {
            [("m1", "Model One"), ("m2", "Model Two"), ("m3", "Model Three")]
                .into_iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect()
        }

        #[test]
        fn rounds_count_only_the_competitors_own_battles() {
            let votes = vec![
                vote("m1", "m2", "gpt-judge", Verdict::A),
                vote("m2", "m3", "gpt-judge", Verdict::B),
                vote("m1", "m3", "claude-judge", Verdict::Tie),
            ];
            let trajectory =
                reduce_from_votes(&votes, "m1", &names(), &RatingConfig::default());
            assert_eq!(trajectory.len(), 2);
            let rounds: Vec<u64> = trajectory
                .points()
                .iter()
                .map(|point| point.round)
                .collect();
            assert_eq!(rounds, vec![1, 2]);
            assert_eq!(trajectory.events()[0].opponent_name, "Model Two");
            assert_eq!(trajectory.events()[1].judge_name, "claude-judge");
        }

        #[test]
        fn a_win_raises_and_a_loss_lowers_the_score() {
            let config = RatingConfig::default();
            let votes = vec![
                vote("m1", "m2", "gpt-judge", Verdict::A),
                vote("m1", "m2", "gpt-judge", Verdict::B),
            ];
            let trajectory = reduce_from_votes(&votes, "m1", &names(), &config);
            let points = trajectory.points();
            assert!(points[0].score > config.initial_score);
            assert!(points[1].score < points[0].score);
        }

        #[test]
        fn the_final_point_matches_the_leaderboard_fit() {
            let config = RatingConfig::default();
            let votes = vec![
                vote("m1", "m2", "gpt-judge", Verdict::A),
                vote("m2", "m3", "gpt-judge", Verdict::Tie),
                vote("m1", "m3", "gpt-judge", Verdict::B),
            ];
            let battles: Vec<crate::rating::Battle> =
                votes.iter().map(crate::rating::Battle::from).collect();
            let fitted = crate::rating::fit_point(&battles, &config);
            let trajectory = reduce_from_votes(&votes, "m1", &names(), &config);
            let last = trajectory.points().last().unwrap().score;
            assert!((last - fitted["m1"]).abs() < 1e-9);
        }

        #[test]
        fn uninvolved_competitors_get_an_empty_trajectory() {
            let votes = vec![vote("m1", "m2", "gpt-judge", Verdict::A)];
            let trajectory =
                reduce_from_votes(&votes, "m3", &names(), &RatingConfig::default());
            assert!(trajectory.is_empty());
        }
    }
}
