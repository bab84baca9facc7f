use std::cmp::Ordering;

use serde::Serialize;

pub const DEGENERATE_RANGE_MIDPOINT: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub rank: usize,
    pub item: T,
}

/// Competition ranking: tied keys share a rank and the next distinct key
/// resumes at its one-based position, so ascending keys [1, 1, 10] rank
/// as [1, 1, 3]. The sort is stable, so ties keep their incoming order.
pub fn rank_by<T, K, F>(items: Vec<T>, key: F, direction: Direction) -> Vec<Ranked<T>>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    let mut items = items;
    items.sort_by(|a, b| {
        let ordering = key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal);
        match direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });

    let mut ranked: Vec<Ranked<T>> = Vec::with_capacity(items.len());
    let mut rank = 1usize;
    for (index, item) in items.into_iter().enumerate() {
        if let Some(previous) = ranked.last() {
            if key(&previous.item).partial_cmp(&key(&item)) != Some(Ordering::Equal) {
                rank = index + 1;
            }
        }
        ranked.push(Ranked { rank, item });
    }
    ranked
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LeaderboardScale {
    pub pct: f64,
    pub pct_lo: Option<f64>,
    pub pct_hi: Option<f64>,
}

/// Maps a score and its optional confidence bounds onto the shared
/// [0, 100] leaderboard scale spanned by the global score extremes.
///
/// A collapsed global range (single competitor, or every score equal)
/// places everything at the midpoint instead of dividing by zero. Bounds
/// that fall outside the global range map outside [0, 100] on purpose:
/// clamping would hide an interval that crosses the global minimum or
/// maximum.
pub fn scale_to_leaderboard(
    score: f64,
    bounds: Option<(f64, f64)>,
    global_lo: f64,
    global_hi: f64,
) -> LeaderboardScale {
    let range = global_hi - global_lo;
    if !(range > 0.0) || !range.is_finite() {
        return LeaderboardScale {
            pct: DEGENERATE_RANGE_MIDPOINT,
            pct_lo: bounds.map(|_| DEGENERATE_RANGE_MIDPOINT),
            pct_hi: bounds.map(|_| DEGENERATE_RANGE_MIDPOINT),
        };
    }

    let to_pct = |value: f64| 100.0 * (value - global_lo) / range;
    LeaderboardScale {
        pct: to_pct(score),
        pct_lo: bounds.map(|(lo, _)| to_pct(lo)),
        pct_hi: bounds.map(|(_, hi)| to_pct(hi)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        a: i64,
        b: i64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { a: 1, b: 3 },
            Row { a: 1, b: 1 },
            Row { a: 10, b: -10 },
        ]
    }

    #[test]
    fn ties_share_a_rank_and_the_next_group_skips() {
        let ranked = rank_by(rows(), |row| row.a, Direction::Ascending);
        let ranks: Vec<usize> = ranked.iter().map(|entry| entry.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3]);
    }

    #[test]
    fn ranking_by_another_key_is_dense_when_keys_differ() {
        let ranked = rank_by(rows(), |row| row.b, Direction::Ascending);
        let pairs: Vec<(i64, usize)> = ranked
            .iter()
            .map(|entry| (entry.item.b, entry.rank))
            .collect();
        assert_eq!(pairs, vec![(-10, 1), (1, 2), (3, 3)]);
    }

    #[test]
    fn descending_direction_reverses_the_order() {
        let ranked = rank_by(rows(), |row| row.a, Direction::Descending);
        let keys: Vec<i64> = ranked.iter().map(|entry| entry.item.a).collect();
        assert_eq!(keys, vec![10, 1, 1]);
        let ranks: Vec<usize> = ranked.iter().map(|entry| entry.rank).collect();
        assert_eq!(ranks, vec![1, 2, 2]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let once = rank_by(rows(), |row| row.a, Direction::Ascending);
        let twice = rank_by(once.clone(), |entry| entry.item.a, Direction::Ascending);
        let first: Vec<usize> = once.iter().map(|entry| entry.rank).collect();
        let second: Vec<usize> = twice.iter().map(|entry| entry.rank).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ties_preserve_incoming_order() {
        let ranked = rank_by(rows(), |row| row.a, Direction::Ascending);
        assert_eq!(ranked[0].item, Row { a: 1, b: 3 });
        assert_eq!(ranked[1].item, Row { a: 1, b: 1 });
    }

    #[test]
    fn empty_single_and_all_equal_inputs() {
        assert!(rank_by(Vec::<Row>::new(), |row| row.a, Direction::Ascending).is_empty());

        let single = rank_by(vec![Row { a: 7, b: 0 }], |row| row.a, Direction::Ascending);
        assert_eq!(single[0].rank, 1);

        let equal = rank_by(
            vec![Row { a: 5, b: 1 }, Row { a: 5, b: 2 }, Row { a: 5, b: 3 }],
            |row| row.a,
            Direction::Ascending,
        );
        assert!(equal.iter().all(|entry| entry.rank == 1));
    }

    #[test]
    fn works_for_lexical_keys() {
        let names = vec!["gpt", "claude", "claude", "llama"];
        let ranked = rank_by(names, |name| name.to_string(), Direction::Ascending);
        let pairs: Vec<(&str, usize)> = ranked
            .iter()
            .map(|entry| (entry.item, entry.rank))
            .collect();
        assert_eq!(pairs, vec![("claude", 1), ("claude", 1), ("gpt", 3), ("llama", 4)]);
    }

    #[test]
    fn scale_hits_both_ends_of_the_range() {
        let low = scale_to_leaderboard(900.0, None, 900.0, 1200.0);
        assert_eq!(low.pct, 0.0);
        let high = scale_to_leaderboard(1200.0, None, 900.0, 1200.0);
        assert_eq!(high.pct, 100.0);
    }

    #[test]
    fn collapsed_range_falls_back_to_the_midpoint() {
        let scale = scale_to_leaderboard(1000.0, Some((990.0, 1010.0)), 1000.0, 1000.0);
        assert_eq!(scale.pct, DEGENERATE_RANGE_MIDPOINT);
        assert_eq!(scale.pct_lo, Some(DEGENERATE_RANGE_MIDPOINT));
        assert_eq!(scale.pct_hi, Some(DEGENERATE_RANGE_MIDPOINT));
        assert!(scale.pct.is_finite());
    }

    #[test]
    fn absent_bounds_scale_the_point_score_alone() {
        let scale = scale_to_leaderboard(1050.0, None, 900.0, 1200.0);
        assert_eq!(scale.pct, 50.0);
        assert_eq!(scale.pct_lo, None);
        assert_eq!(scale.pct_hi, None);
    }

    #[test]
    fn lower_bound_below_the_global_minimum_is_not_clamped() {
        let scale = scale_to_leaderboard(900.0, Some((850.0, 950.0)), 900.0, 1200.0);
        let lo = scale.pct_lo.unwrap();
        assert!((lo - (-50.0 / 3.0)).abs() < 1e-9, "expected -16.7, got {lo}");
        let hi = scale.pct_hi.unwrap();
        assert!((hi - (50.0 / 3.0)).abs() < 1e-9);
    }
}
