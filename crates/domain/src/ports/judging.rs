use crate::DomainResult;
use crate::judges::Judge;
use crate::ports::BoxFuture;
use crate::votes::{HeadToHeadPair, Verdict};

/// Contract for executing one automated judgement. Calling out to a model
/// API happens behind this trait; the core never performs the call itself.
pub trait JudgeBackend: Send + Sync {
    fn verdict(
        &self,
        judge: &Judge,
        pair: &HeadToHeadPair,
    ) -> BoxFuture<'_, DomainResult<Verdict>>;
}
