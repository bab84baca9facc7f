use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::judges::JudgeRepository;
use crate::ports::votes::VoteRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

const MAX_NAME_LENGTH: usize = 200;
const MAX_SYSTEM_PROMPT_LENGTH: usize = 10_000;

/// Closed set of judge backends. New backends extend this enum; nothing
/// dispatches on backend names as strings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JudgeKind {
    Human,
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
    Cohere,
    Bedrock,
    Custom,
}

impl JudgeKind {
    pub fn is_automated(self) -> bool {
        !matches!(self, JudgeKind::Human)
    }

    /// Automated judges run against a named model; manual voting does not.
    pub fn requires_model_name(self) -> bool {
        self.is_automated()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Judge {
    pub judge_id: String,
    pub name: String,
    pub kind: JudgeKind,
    pub enabled: bool,
    pub vote_count: u64,
    pub model_name: Option<String>,
    pub system_prompt: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct JudgeCreate {
    pub name: String,
    pub kind: JudgeKind,
    pub model_name: Option<String>,
    pub system_prompt: Option<String>,
}

/// Result of deleting a judge: its votes are retracted, and rankings must
/// be recomputed from what remains.
#[derive(Clone, Debug, PartialEq)]
pub struct JudgeDeletion {
    pub judge_id: String,
    pub retracted_votes: u64,
}

#[derive(Clone)]
pub struct JudgeService {
    judges: Arc<dyn JudgeRepository>,
    votes: Arc<dyn VoteRepository>,
}

impl JudgeService {
    pub fn new(judges: Arc<dyn JudgeRepository>, votes: Arc<dyn VoteRepository>) -> Self {
        Self { judges, votes }
    }

    pub async fn create(&self, input: JudgeCreate) -> DomainResult<Judge> {
        let input = validate_judge_create(&input)?;
        if input.kind == JudgeKind::Human {
            let existing = self.judges.list().await?;
            if existing.iter().any(|judge| judge.kind == JudgeKind::Human) {
                return Err(DomainError::Conflict);
            }
        }
        let judge = Judge {
            judge_id: uuid_v7_without_dashes(),
            name: input.name,
            kind: input.kind,
            enabled: true,
            vote_count: 0,
            model_name: input.model_name,
            system_prompt: input.system_prompt,
            created_at_ms: now_ms(),
        };
        self.judges.create(&judge).await
    }

    /// The single manual-vote judge, created on first use.
    pub async fn ensure_human_judge(&self) -> DomainResult<Judge> {
        let existing = self.judges.list().await?;
        if let Some(judge) = existing
            .into_iter()
            .find(|judge| judge.kind == JudgeKind::Human)
        {
            return Ok(judge);
        }
        self.create(JudgeCreate {
            name: "Human".to_string(),
            kind: JudgeKind::Human,
            model_name: None,
            system_prompt: None,
        })
        .await
    }

    pub async fn get(&self, judge_id: &str) -> DomainResult<Judge> {
        self.judges.get(judge_id).await
    }

    pub async fn list(&self) -> DomainResult<Vec<Judge>> {
        self.judges.list().await
    }

    pub async fn set_enabled(&self, judge_id: &str, enabled: bool) -> DomainResult<Judge> {
        self.judges.set_enabled(judge_id, enabled).await
    }

    /// Removes the judge and retracts every vote it cast. The caller is
    /// expected to schedule a leaderboard recompute afterwards.
    pub async fn delete(&self, judge_id: &str) -> DomainResult<JudgeDeletion> {
        let judge = self.judges.get(judge_id).await?;
        let retracted_votes = self.votes.delete_by_judge(&judge.judge_id).await?;
        self.judges.delete(&judge.judge_id).await?;
        Ok(JudgeDeletion {
            judge_id: judge.judge_id,
            retracted_votes,
        })
    }
}

fn validate_judge_create(input: &JudgeCreate) -> DomainResult<JudgeCreate> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::Validation("name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::Validation(format!(
            "name exceeds max length of {MAX_NAME_LENGTH}"
        )));
    }

    if input.kind.requires_model_name() {
        match &input.model_name {
            Some(model_name) if !model_name.trim().is_empty() => {}
            _ => {
                return Err(DomainError::Validation(
                    "automated judges require a model name".into(),
                ));
            }
        }
    } else if input.model_name.is_some() || input.system_prompt.is_some() {
        return Err(DomainError::Validation(
            "the human judge takes no model configuration".into(),
        ));
    }

    if let Some(system_prompt) = &input.system_prompt {
        if system_prompt.chars().count() > MAX_SYSTEM_PROMPT_LENGTH {
            return Err(DomainError::Validation(format!(
                "system prompt exceeds max length of {MAX_SYSTEM_PROMPT_LENGTH}"
            )));
        }
    }

    Ok(JudgeCreate {
        name,
        kind: input.kind,
        model_name: input.model_name.clone(),
        system_prompt: input.system_prompt.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automated_judges_require_a_model_name() {
        let input = JudgeCreate {
            name: "gpt-judge".to_string(),
            kind: JudgeKind::OpenAi,
            model_name: None,
            system_prompt: None,
        };
        assert!(validate_judge_create(&input).is_err());

        let input = JudgeCreate {
            model_name: Some("gpt-4o-mini".to_string()),
            ..input
        };
        assert!(validate_judge_create(&input).is_ok());
    }

    #[test]
    fn the_human_judge_takes_no_model_configuration() {
        let input = JudgeCreate {
            name: "Human".to_string(),
            kind: JudgeKind::Human,
            model_name: Some("gpt-4o".to_string()),
            system_prompt: None,
        };
        assert!(validate_judge_create(&input).is_err());
    }

    #[test]
    fn only_human_is_manual() {
        assert!(!JudgeKind::Human.is_automated());
        for kind in [
            JudgeKind::OpenAi,
            JudgeKind::Anthropic,
            JudgeKind::Gemini,
            JudgeKind::Ollama,
            JudgeKind::Cohere,
            JudgeKind::Bedrock,
            JudgeKind::Custom,
        ] {
            assert!(kind.is_automated());
            assert!(kind.requires_model_name());
        }
    }
}
