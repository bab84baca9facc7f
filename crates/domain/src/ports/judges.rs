use crate::DomainResult;
use crate::judges::Judge;
use crate::ports::BoxFuture;

pub trait JudgeRepository: Send + Sync {
    fn create(&self, judge: &Judge) -> BoxFuture<'_, DomainResult<Judge>>;

    fn get(&self, judge_id: &str) -> BoxFuture<'_, DomainResult<Judge>>;

    fn list(&self) -> BoxFuture<'_, DomainResult<Vec<Judge>>>;

    fn set_enabled(&self, judge_id: &str, enabled: bool) -> BoxFuture<'_, DomainResult<Judge>>;

    fn increment_votes(&self, judge_id: &str, delta: u64) -> BoxFuture<'_, DomainResult<Judge>>;

    fn delete(&self, judge_id: &str) -> BoxFuture<'_, DomainResult<()>>;
}
