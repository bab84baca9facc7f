use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::competitors::CompetitorRepository;
use crate::ports::judges::JudgeRepository;
use crate::ports::votes::VoteRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    A,
    B,
    Tie,
}

impl Verdict {
    /// The same outcome seen from the opposite side of the pair.
    pub fn flipped(self) -> Self {
        match self {
            Verdict::A => Verdict::B,
            Verdict::B => Verdict::A,
            Verdict::Tie => Verdict::Tie,
        }
    }
}

/// An unordered competitor pair. The constructor normalizes the two ids so
/// (a, b) and (b, a) compare and hash equal; callers that care about
/// orientation must flip the verdict when their ordering was swapped.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct HeadToHeadPair {
    competitor_a: String,
    competitor_b: String,
}

impl HeadToHeadPair {
    pub fn new(first: &str, second: &str) -> DomainResult<Self> {
        if first == second {
            return Err(DomainError::Validation(
                "a competitor cannot face itself".into(),
            ));
        }
        let (competitor_a, competitor_b) = if first <= second {
            (first.to_string(), second.to_string())
        } else {
            (second.to_string(), first.to_string())
        };
        Ok(Self {
            competitor_a,
            competitor_b,
        })
    }

    pub fn competitor_a(&self) -> &str {
        &self.competitor_a
    }

    pub fn competitor_b(&self) -> &str {
        &self.competitor_b
    }

    /// True when the caller's (first, second) orientation differs from the
    /// stored normalized orientation.
    pub fn is_swapped_from(&self, first: &str) -> bool {
        self.competitor_a != first
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub vote_id: String,
    pub pair: HeadToHeadPair,
    pub judge_id: String,
    pub judge_name: String,
    pub verdict: Verdict,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct VoteCreate {
    pub competitor_a: String,
    pub competitor_b: String,
    pub judge_id: String,
    pub verdict: Verdict,
}

#[derive(Clone)]
pub struct VoteService {
    votes: Arc<dyn VoteRepository>,
    judges: Arc<dyn JudgeRepository>,
    competitors: Arc<dyn CompetitorRepository>,
}

impl VoteService {
    pub fn new(
        votes: Arc<dyn VoteRepository>,
        judges: Arc<dyn JudgeRepository>,
        competitors: Arc<dyn CompetitorRepository>,
    ) -> Self {
        Self {
            votes,
            judges,
            competitors,
        }
    }

    pub async fn record(&self, input: VoteCreate) -> DomainResult<Vote> {
        self.competitors.get(&input.competitor_a).await?;
        self.competitors.get(&input.competitor_b).await?;
        let judge = self.judges.get(&input.judge_id).await?;
        if !judge.enabled {
            return Err(DomainError::Validation(format!(
                "judge {} is disabled",
                judge.name
            )));
        }

        let pair = HeadToHeadPair::new(&input.competitor_a, &input.competitor_b)?;
        let verdict = if pair.is_swapped_from(&input.competitor_a) {
            input.verdict.flipped()
        } else {
            input.verdict
        };

        let vote = Vote {
            vote_id: uuid_v7_without_dashes(),
            pair,
            judge_id: judge.judge_id.clone(),
            judge_name: judge.name.clone(),
            verdict,
            created_at_ms: now_ms(),
        };
        let vote = self.votes.append(&vote).await?;
        self.judges.increment_votes(&judge.judge_id, 1).await?;
        Ok(vote)
    }

    /// Chronological history for the pair as seen from the caller's
    /// (first, second) orientation.
    pub async fn pair_history(&self, first: &str, second: &str) -> DomainResult<Vec<Vote>> {
        let pair = HeadToHeadPair::new(first, second)?;
        let swapped = pair.is_swapped_from(first);
        let votes = self.votes.list_for_pair(&pair).await?;
        if !swapped {
            return Ok(votes);
        }
        Ok(votes
            .into_iter()
            .map(|mut vote| {
                vote.verdict = vote.verdict.flipped();
                vote
            })
            .collect())
    }

    pub async fn list_all(&self) -> DomainResult<Vec<Vote>> {
        self.votes.list_all().await
    }

    pub async fn count_by_judges(&self, judge_ids: &[String]) -> DomainResult<u64> {
        self.votes.count_by_judges(judge_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_normalizes_orientation() {
        let forward = HeadToHeadPair::new("m1", "m2").unwrap();
        let backward = HeadToHeadPair::new("m2", "m1").unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.competitor_a(), "m1");
        assert!(backward.is_swapped_from("m2"));
        assert!(!forward.is_swapped_from("m1"));
    }

    #[test]
    fn self_pairs_are_rejected() {
        assert!(HeadToHeadPair::new("m1", "m1").is_err());
    }

    #[test]
    fn flipping_a_verdict_twice_is_the_identity() {
        for verdict in [Verdict::A, Verdict::B, Verdict::Tie] {
            assert_eq!(verdict.flipped().flipped(), verdict);
        }
        assert_eq!(Verdict::Tie.flipped(), Verdict::Tie);
    }
}
