use std::collections::HashMap;

use arena_domain::competitors::Competitor;
use arena_domain::leaderboard::{build_leaderboard, overlay_ratings};
use arena_domain::ranking::{Direction, rank_by};
use arena_domain::rating::{Battle, FittedRating, RatingConfig, fit};
use arena_domain::votes::Verdict;

fn competitor(id: &str, score: f64) -> Competitor {
    Competitor {
        competitor_id: id.to_string(),
        name: id.to_string(),
        score,
        lower_bound: None,
        upper_bound: None,
        vote_count: 0,
        datapoint_count: 0,
        created_at_ms: 0,
    }
}

fn battle(a: &str, b: &str, verdict: Verdict) -> Battle {
    Battle {
        competitor_a: a.to_string(),
        competitor_b: b.to_string(),
        verdict,
    }
}

#[test]
fn tied_values_share_a_rank_and_the_next_rank_skips() {
    let ranked = rank_by(vec![1, 1, 10], |value| *value, Direction::Ascending);
    let ranks: Vec<usize> = ranked.iter().map(|entry| entry.rank).collect();
    assert_eq!(ranks, vec![1, 1, 3]);
}

#[test]
fn fitted_battles_order_the_final_leaderboard_by_strength() {
    let config = RatingConfig {
        bootstrap_rounds: 50,
        ..RatingConfig::default()
    };
    let mut battles: Vec<Battle> = (0..20)
        .map(|_| battle("strong", "weak", Verdict::A))
        .collect();
    battles.push(battle("strong", "middle", Verdict::Tie));
    battles.push(battle("middle", "weak", Verdict::A));

    let ratings = fit(&battles, &config);
    let competitors = overlay_ratings(
        vec![
            competitor("weak", config.initial_score),
            competitor("middle", config.initial_score),
            competitor("strong", config.initial_score),
        ],
        &ratings,
    );
    let leaderboard = build_leaderboard(competitors);

    let order: Vec<&str> = leaderboard
        .entries
        .iter()
        .map(|entry| entry.competitor.name.as_str())
        .collect();
    assert_eq!(order, vec!["strong", "middle", "weak"]);
    assert_eq!(leaderboard.entries[0].rank, 1);

    for entry in &leaderboard.entries {
        let (lower, upper) = entry.competitor.bounds().expect("fitted bounds");
        assert!(lower <= entry.competitor.score);
        assert!(entry.competitor.score <= upper);
    }
    assert_eq!(leaderboard.entries[0].scale.pct, 100.0);
    assert_eq!(leaderboard.entries[2].scale.pct, 0.0);
}

#[test]
fn a_lone_unrated_competitor_lands_on_the_midpoint() {
    let leaderboard = build_leaderboard(vec![competitor("only", 1000.0)]);
    assert_eq!(leaderboard.entries[0].rank, 1);
    assert_eq!(leaderboard.entries[0].scale.pct, 50.0);
    assert_eq!(leaderboard.entries[0].scale.pct_lo, None);
}

#[test]
fn the_whole_pipeline_is_deterministic_for_a_seed() {
    let config = RatingConfig {
        bootstrap_rounds: 30,
        seed: 7,
        ..RatingConfig::default()
    };
    let battles = vec![
        battle("a", "b", Verdict::A),
        battle("b", "c", Verdict::Tie),
        battle("a", "c", Verdict::B),
    ];

    let run = |ratings: &HashMap<String, FittedRating>| {
        build_leaderboard(overlay_ratings(
            vec![
                competitor("a", config.initial_score),
                competitor("b", config.initial_score),
                competitor("c", config.initial_score),
            ],
            ratings,
        ))
    };

    let first = run(&fit(&battles, &config));
    let second = run(&fit(&battles, &config));
    assert_eq!(first, second);
}
