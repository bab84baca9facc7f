use arena_domain::DomainResult;
use arena_domain::error::DomainError;
use arena_domain::judges::Judge;
use arena_domain::ports::BoxFuture;
use arena_domain::ports::judging::JudgeBackend;
use arena_domain::votes::{HeadToHeadPair, Verdict};

/// Placeholder backend for deployments without model API credentials.
/// Automated runs fail fast instead of silently doing nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledJudgeBackend;

impl JudgeBackend for DisabledJudgeBackend {
    fn verdict(
        &self,
        judge: &Judge,
        _pair: &HeadToHeadPair,
    ) -> BoxFuture<'_, DomainResult<Verdict>> {
        let judge_name = judge.name.clone();
        Box::pin(async move {
            Err(DomainError::Validation(format!(
                "no judge backend configured for {judge_name}"
            )))
        })
    }
}
