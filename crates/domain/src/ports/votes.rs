use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::votes::{HeadToHeadPair, Vote};

pub trait VoteRepository: Send + Sync {
    fn append(&self, vote: &Vote) -> BoxFuture<'_, DomainResult<Vote>>;

    /// All votes in recording order.
    fn list_all(&self) -> BoxFuture<'_, DomainResult<Vec<Vote>>>;

    fn list_for_pair(&self, pair: &HeadToHeadPair) -> BoxFuture<'_, DomainResult<Vec<Vote>>>;

    fn list_by_judge(&self, judge_id: &str) -> BoxFuture<'_, DomainResult<Vec<Vote>>>;

    fn count_by_judges(&self, judge_ids: &[String]) -> BoxFuture<'_, DomainResult<u64>>;

    /// Retracts every vote the judge cast; returns how many were removed.
    fn delete_by_judge(&self, judge_id: &str) -> BoxFuture<'_, DomainResult<u64>>;
}
