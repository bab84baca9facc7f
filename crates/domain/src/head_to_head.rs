use serde::{Deserialize, Serialize};

use crate::votes::{Verdict, Vote};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryVote {
    pub judge_id: String,
    pub judge_name: String,
    pub verdict: Verdict,
}

impl From<&Vote> for HistoryVote {
    fn from(vote: &Vote) -> Self {
        Self {
            judge_id: vote.judge_id.clone(),
            judge_name: vote.judge_name.clone(),
            verdict: vote.verdict,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VotePartition {
    pub for_a: Vec<HistoryVote>,
    pub for_b: Vec<HistoryVote>,
    pub ties: Vec<HistoryVote>,
}

/// Splits a pair's chronological vote history into the three verdict
/// buckets, keeping arrival order inside each bucket. Pure fold; calling
/// it again on the same history yields the same partition.
pub fn partition_history(votes: &[HistoryVote]) -> VotePartition {
    votes
        .iter()
        .fold(VotePartition::default(), |mut partition, vote| {
            match vote.verdict {
                Verdict::A => partition.for_a.push(vote.clone()),
                Verdict::B => partition.for_b.push(vote.clone()),
                Verdict::Tie => partition.ties.push(vote.clone()),
            }
            partition
        })
}

/// One "competitor X versus opponent Y" stats row, as produced by a
/// pairwise-stats query, optionally broken out per judge.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PairwiseStats {
    pub opponent_id: String,
    pub opponent_name: String,
    pub judge_id: String,
    pub judge_name: String,
    pub win_count: u64,
    pub loss_count: u64,
    pub tie_count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpponentSummary {
    pub opponent_id: String,
    pub opponent_name: String,
    pub wins: u64,
    pub losses: u64,
    pub ties: u64,
    pub win_pct: Option<f64>,
    pub loss_pct: Option<f64>,
}

impl OpponentSummary {
    pub fn total(&self) -> u64 {
        self.wins + self.losses + self.ties
    }
}

/// Folds per-judge stats rows into one cumulative row per opponent, in
/// first-seen opponent order. Percentages are omitted, not NaN, when an
/// opponent group has no votes at all.
pub fn aggregate_opponents(rows: &[PairwiseStats], judge_id: Option<&str>) -> Vec<OpponentSummary> {
    let mut summaries: Vec<OpponentSummary> = Vec::new();
    for row in rows {
        if let Some(judge_id) = judge_id {
            if row.judge_id != judge_id {
                continue;
            }
        }
        let summary = match summaries
            .iter_mut()
            .find(|summary| summary.opponent_id == row.opponent_id)
        {
            Some(existing) => existing,
            None => {
                summaries.push(OpponentSummary {
                    opponent_id: row.opponent_id.clone(),
                    opponent_name: row.opponent_name.clone(),
                    wins: 0,
                    losses: 0,
                    ties: 0,
                    win_pct: None,
                    loss_pct: None,
                });
                summaries
                    .last_mut()
                    .expect("summary pushed on the line above")
            }
        };
        summary.wins += row.win_count;
        summary.losses += row.loss_count;
        summary.ties += row.tie_count;
    }

    for summary in &mut summaries {
        let total = summary.total();
        if total > 0 {
            summary.win_pct = Some(summary.wins as f64 / total as f64 * 100.0);
            summary.loss_pct = Some(summary.losses as f64 / total as f64 * 100.0);
        }
    }
    summaries
}

/// Cumulative counts from a raw vote history, viewed from competitor A's
/// side. Lets a pair history feed the same summary shape as the stats rows.
pub fn tally_history(votes: &[HistoryVote]) -> (u64, u64, u64) {
    votes.iter().fold((0, 0, 0), |(wins, losses, ties), vote| {
        match vote.verdict {
            Verdict::A => (wins + 1, losses, ties),
            Verdict::B => (wins, losses + 1, ties),
            Verdict::Tie => (wins, losses, ties + 1),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(judge: &str, verdict: Verdict) -> HistoryVote {
        HistoryVote {
            judge_id: format!("{judge}-id"),
            judge_name: judge.to_string(),
            verdict,
        }
    }

    fn stats(opponent: &str, judge: &str, wins: u64, losses: u64, ties: u64) -> PairwiseStats {
        PairwiseStats {
            opponent_id: format!("{opponent}-id"),
            opponent_name: opponent.to_string(),
            judge_id: format!("{judge}-id"),
            judge_name: judge.to_string(),
            win_count: wins,
            loss_count: losses,
            tie_count: ties,
        }
    }

    #[test]
    fn partition_keeps_arrival_order_per_bucket() {
        let history = vec![
            vote("alice", Verdict::A),
            vote("gpt-judge", Verdict::B),
            vote("bob", Verdict::A),
            vote("carol", Verdict::Tie),
        ];
        let partition = partition_history(&history);
        let for_a: Vec<&str> = partition
            .for_a
            .iter()
            .map(|entry| entry.judge_name.as_str())
            .collect();
        assert_eq!(for_a, vec!["alice", "bob"]);
        assert_eq!(partition.for_b.len(), 1);
        assert_eq!(partition.ties[0].judge_name, "carol");
    }

    #[test]
    fn partition_is_a_pure_reduction() {
        let history = vec![vote("alice", Verdict::A), vote("bob", Verdict::Tie)];
        assert_eq!(partition_history(&history), partition_history(&history));
        assert!(partition_history(&[]).for_a.is_empty());
    }

    #[test]
    fn opponents_accumulate_across_judges() {
        let rows = vec![
            stats("model-b", "gpt-judge", 3, 1, 0),
            stats("model-c", "gpt-judge", 0, 2, 1),
            stats("model-b", "claude-judge", 1, 1, 2),
        ];
        let summaries = aggregate_opponents(&rows, None);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].opponent_name, "model-b");
        assert_eq!(summaries[0].wins, 4);
        assert_eq!(summaries[0].losses, 2);
        assert_eq!(summaries[0].ties, 2);
        let win_pct = summaries[0].win_pct.unwrap();
        assert!((win_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn judge_filter_restricts_the_fold() {
        let rows = vec![
            stats("model-b", "gpt-judge", 3, 1, 0),
            stats("model-b", "claude-judge", 1, 1, 2),
        ];
        let summaries = aggregate_opponents(&rows, Some("claude-judge-id"));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].wins, 1);
        assert_eq!(summaries[0].ties, 2);
    }

    #[test]
    fn zero_total_groups_carry_no_percentage() {
        let rows = vec![stats("model-b", "gpt-judge", 0, 0, 0)];
        let summaries = aggregate_opponents(&rows, None);
        assert_eq!(summaries[0].win_pct, None);
        assert_eq!(summaries[0].loss_pct, None);
    }

    #[test]
    fn totals_are_conserved_across_opponents() {
        let rows = vec![
            stats("model-b", "gpt-judge", 3, 1, 0),
            stats("model-c", "gpt-judge", 0, 2, 1),
            stats("model-d", "claude-judge", 2, 2, 2),
        ];
        let summaries = aggregate_opponents(&rows, None);
        let summed: u64 = summaries.iter().map(OpponentSummary::total).sum();
        let expected: u64 = rows
            .iter()
            .map(|row| row.win_count + row.loss_count + row.tie_count)
            .sum();
        assert_eq!(summed, expected);
    }

    #[test]
    fn history_tally_matches_the_partition() {
        let history = vec![
            vote("alice", Verdict::A),
            vote("bob", Verdict::B),
            vote("carol", Verdict::A),
            vote("dave", Verdict::Tie),
        ];
        let (wins, losses, ties) = tally_history(&history);
        let partition = partition_history(&history);
        assert_eq!(wins, partition.for_a.len() as u64);
        assert_eq!(losses, partition.for_b.len() as u64);
        assert_eq!(ties, partition.ties.len() as u64);
    }
}
