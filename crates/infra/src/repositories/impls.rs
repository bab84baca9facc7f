use std::sync::Arc;

use arena_domain::DomainResult;
use arena_domain::competitors::{Competitor, RatingUpdate};
use arena_domain::error::DomainError;
use arena_domain::judges::Judge;
use arena_domain::ports::BoxFuture;
use arena_domain::ports::competitors::CompetitorRepository;
use arena_domain::ports::judges::JudgeRepository;
use arena_domain::ports::tasks::TaskRepository;
use arena_domain::ports::votes::VoteRepository;
use arena_domain::tasks::Task;
use arena_domain::votes::{HeadToHeadPair, Vote};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryCompetitorRepository {
    store: Arc<RwLock<Vec<Competitor>>>,
}

impl InMemoryCompetitorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompetitorRepository for InMemoryCompetitorRepository {
    fn create(&self, competitor: &Competitor) -> BoxFuture<'_, DomainResult<Competitor>> {
        let competitor = competitor.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            if rows.iter().any(|row| {
                row.competitor_id == competitor.competitor_id || row.name == competitor.name
            }) {
                return Err(DomainError::Conflict);
            }
            rows.push(competitor.clone());
            Ok(competitor)
        })
    }

    fn get(&self, competitor_id: &str) -> BoxFuture<'_, DomainResult<Competitor>> {
        let competitor_id = competitor_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let rows = store.read().await;
            rows.iter()
                .find(|row| row.competitor_id == competitor_id)
                .cloned()
                .ok_or(DomainError::NotFound)
        })
    }

    fn list(&self) -> BoxFuture<'_, DomainResult<Vec<Competitor>>> {
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.clone()) })
    }

    fn delete(&self, competitor_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let competitor_id = competitor_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            let before = rows.len();
            rows.retain(|row| row.competitor_id != competitor_id);
            if rows.len() == before {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
    }

    fn update_rating(
        &self,
        competitor_id: &str,
        update: &RatingUpdate,
    ) -> BoxFuture<'_, DomainResult<Competitor>> {
        let competitor_id = competitor_id.to_string();
        let update = *update;
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            let row = rows
                .iter_mut()
                .find(|row| row.competitor_id == competitor_id)
                .ok_or(DomainError::NotFound)?;
            row.score = update.score;
            row.lower_bound = update.bounds.map(|(lo, _)| lo);
            row.upper_bound = update.bounds.map(|(_, hi)| hi);
            row.vote_count = update.vote_count;
            Ok(row.clone())
        })
    }

    fn reset_unrated(
        &self,
        rated_ids: &[String],
        initial_score: f64,
    ) -> BoxFuture<'_, DomainResult<usize>> {
        let rated_ids = rated_ids.to_vec();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            let mut touched = 0usize;
            for row in rows.iter_mut() {
                if rated_ids.contains(&row.competitor_id) {
                    continue;
                }
                if row.lower_bound.is_some() || row.vote_count > 0 || row.score != initial_score {
                    row.score = initial_score;
                    row.lower_bound = None;
                    row.upper_bound = None;
                    row.vote_count = 0;
                    touched += 1;
                }
            }
            Ok(touched)
        })
    }
}

#[derive(Default)]
pub struct InMemoryJudgeRepository {
    store: Arc<RwLock<Vec<Judge>>>,
}

impl InMemoryJudgeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JudgeRepository for InMemoryJudgeRepository {
    fn create(&self, judge: &Judge) -> BoxFuture<'_, DomainResult<Judge>> {
        let judge = judge.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            if rows
                .iter()
                .any(|row| row.judge_id == judge.judge_id || row.name == judge.name)
            {
                return Err(DomainError::Conflict);
            }
            rows.push(judge.clone());
            Ok(judge)
        })
    }

    fn get(&self, judge_id: &str) -> BoxFuture<'_, DomainResult<Judge>> {
        let judge_id = judge_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let rows = store.read().await;
            rows.iter()
                .find(|row| row.judge_id == judge_id)
                .cloned()
                .ok_or(DomainError::NotFound)
        })
    }

    fn list(&self) -> BoxFuture<'_, DomainResult<Vec<Judge>>> {
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.clone()) })
    }

    fn set_enabled(&self, judge_id: &str, enabled: bool) -> BoxFuture<'_, DomainResult<Judge>> {
        let judge_id = judge_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            let row = rows
                .iter_mut()
                .find(|row| row.judge_id == judge_id)
                .ok_or(DomainError::NotFound)?;
            row.enabled = enabled;
            Ok(row.clone())
        })
    }

    fn increment_votes(&self, judge_id: &str, delta: u64) -> BoxFuture<'_, DomainResult<Judge>> {
        let judge_id = judge_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            let row = rows
                .iter_mut()
                .find(|row| row.judge_id == judge_id)
                .ok_or(DomainError::NotFound)?;
            row.vote_count = row.vote_count.saturating_add(delta);
            Ok(row.clone())
        })
    }

    fn delete(&self, judge_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let judge_id = judge_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            let before = rows.len();
            rows.retain(|row| row.judge_id != judge_id);
            if rows.len() == before {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct InMemoryVoteRepository {
    store: Arc<RwLock<Vec<Vote>>>,
}

impl InMemoryVoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VoteRepository for InMemoryVoteRepository {
    fn append(&self, vote: &Vote) -> BoxFuture<'_, DomainResult<Vote>> {
        let vote = vote.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            if rows.iter().any(|row| row.vote_id == vote.vote_id) {
                return Err(DomainError::Conflict);
            }
            rows.push(vote.clone());
            Ok(vote)
        })
    }

    fn list_all(&self) -> BoxFuture<'_, DomainResult<Vec<Vote>>> {
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.clone()) })
    }

    fn list_for_pair(&self, pair: &HeadToHeadPair) -> BoxFuture<'_, DomainResult<Vec<Vote>>> {
        let pair = pair.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let rows = store.read().await;
            Ok(rows.iter().filter(|row| row.pair == pair).cloned().collect())
        })
    }

    fn list_by_judge(&self, judge_id: &str) -> BoxFuture<'_, DomainResult<Vec<Vote>>> {
        let judge_id = judge_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let rows = store.read().await;
            Ok(rows
                .iter()
                .filter(|row| row.judge_id == judge_id)
                .cloned()
                .collect())
        })
    }

    fn count_by_judges(&self, judge_ids: &[String]) -> BoxFuture<'_, DomainResult<u64>> {
        let judge_ids = judge_ids.to_vec();
        let store = self.store.clone();
        Box::pin(async move {
            let rows = store.read().await;
            Ok(rows
                .iter()
                .filter(|row| judge_ids.contains(&row.judge_id))
                .count() as u64)
        })
    }

    fn delete_by_judge(&self, judge_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let judge_id = judge_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            let before = rows.len();
            rows.retain(|row| row.judge_id != judge_id);
            Ok((before - rows.len()) as u64)
        })
    }
}

#[derive(Default)]
pub struct InMemoryTaskRepository {
    store: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn create(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>> {
        let task = task.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            if rows.iter().any(|row| row.task_id == task.task_id) {
                return Err(DomainError::Conflict);
            }
            rows.push(task.clone());
            Ok(task)
        })
    }

    fn get(&self, task_id: &str) -> BoxFuture<'_, DomainResult<Task>> {
        let task_id = task_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let rows = store.read().await;
            rows.iter()
                .find(|row| row.task_id == task_id)
                .cloned()
                .ok_or(DomainError::NotFound)
        })
    }

    fn list(&self) -> BoxFuture<'_, DomainResult<Vec<Task>>> {
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.clone()) })
    }

    fn update(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>> {
        let task = task.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut rows = store.write().await;
            let row = rows
                .iter_mut()
                .find(|row| row.task_id == task.task_id)
                .ok_or(DomainError::NotFound)?;
            *row = task.clone();
            Ok(task)
        })
    }
}
