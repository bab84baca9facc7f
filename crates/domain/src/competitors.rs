use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::competitors::CompetitorRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

const MAX_NAME_LENGTH: usize = 200;

/// An evaluated model. Bounds stay absent until the competitor has been
/// part of at least one judged comparison; when present they must bracket
/// the score.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Competitor {
    pub competitor_id: String,
    pub name: String,
    pub score: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub vote_count: u64,
    pub datapoint_count: u64,
    pub created_at_ms: i64,
}

impl Competitor {
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.lower_bound, self.upper_bound) {
            (Some(lower), Some(upper)) => Some((lower, upper)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CompetitorCreate {
    pub name: String,
    pub datapoint_count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingUpdate {
    pub score: f64,
    pub bounds: Option<(f64, f64)>,
    pub vote_count: u64,
}

pub fn validate_rating_update(update: &RatingUpdate) -> DomainResult<()> {
    if let Some((lower, upper)) = update.bounds {
        if !(lower <= update.score && update.score <= upper) {
            return Err(DomainError::Validation(format!(
                "bounds [{lower}, {upper}] do not bracket score {}",
                update.score
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct CompetitorService {
    repository: Arc<dyn CompetitorRepository>,
    initial_score: f64,
}

impl CompetitorService {
    pub fn new(repository: Arc<dyn CompetitorRepository>, initial_score: f64) -> Self {
        Self {
            repository,
            initial_score,
        }
    }

    pub async fn create(&self, input: CompetitorCreate) -> DomainResult<Competitor> {
        let name = validate_name(&input.name)?;
        let competitor = Competitor {
            competitor_id: uuid_v7_without_dashes(),
            name,
            score: self.initial_score,
            lower_bound: None,
            upper_bound: None,
            vote_count: 0,
            datapoint_count: input.datapoint_count,
            created_at_ms: now_ms(),
        };
        self.repository.create(&competitor).await
    }

    pub async fn get(&self, competitor_id: &str) -> DomainResult<Competitor> {
        self.repository.get(competitor_id).await
    }

    pub async fn list(&self) -> DomainResult<Vec<Competitor>> {
        self.repository.list().await
    }

    pub async fn delete(&self, competitor_id: &str) -> DomainResult<()> {
        self.repository.delete(competitor_id).await
    }

    pub async fn apply_rating(
        &self,
        competitor_id: &str,
        update: RatingUpdate,
    ) -> DomainResult<Competitor> {
        validate_rating_update(&update)?;
        self.repository.update_rating(competitor_id, &update).await
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::Validation("name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::Validation(format!(
            "name exceeds max length of {MAX_NAME_LENGTH}"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(validate_name("  gpt-4o  ").unwrap(), "gpt-4o");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn rating_updates_must_bracket_the_score() {
        let valid = RatingUpdate {
            score: 1000.0,
            bounds: Some((980.0, 1020.0)),
            vote_count: 4,
        };
        assert!(validate_rating_update(&valid).is_ok());

        let inverted = RatingUpdate {
            score: 1000.0,
            bounds: Some((1010.0, 1020.0)),
            vote_count: 4,
        };
        assert!(validate_rating_update(&inverted).is_err());

        let unbounded = RatingUpdate {
            score: 1000.0,
            bounds: None,
            vote_count: 0,
        };
        assert!(validate_rating_update(&unbounded).is_ok());
    }

    #[test]
    fn bounds_require_both_ends() {
        let competitor = Competitor {
            competitor_id: "c-1".to_string(),
            name: "model".to_string(),
            score: 1000.0,
            lower_bound: Some(990.0),
            upper_bound: None,
            vote_count: 0,
            datapoint_count: 0,
            created_at_ms: 0,
        };
        assert_eq!(competitor.bounds(), None);
    }
}
