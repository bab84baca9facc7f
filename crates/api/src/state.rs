use std::sync::Arc;
use std::time::Duration;

use arena_domain::DomainResult;
use arena_domain::competitors::CompetitorService;
use arena_domain::judges::JudgeService;
use arena_domain::leaderboard::LeaderboardService;
use arena_domain::ports::judging::JudgeBackend;
use arena_domain::tasks::{JobDefaults, TaskService};
use arena_domain::votes::VoteService;
use arena_infra::config::AppConfig;
use arena_infra::jobs::InMemoryJobQueue;
use arena_infra::judging::DisabledJudgeBackend;
use arena_infra::repositories::{
    InMemoryCompetitorRepository, InMemoryJudgeRepository, InMemoryTaskRepository,
    InMemoryVoteRepository,
};
use arena_infra::runner::{RunnerConfig, TaskRunner};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub competitors: CompetitorService,
    pub judges: JudgeService,
    pub votes: VoteService,
    pub leaderboard: LeaderboardService,
    pub tasks: TaskService,
    runner: TaskRunner,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        if !config.data_backend.eq_ignore_ascii_case("memory") {
            anyhow::bail!("unsupported data backend: {}", config.data_backend);
        }
        let state = Self::with_judge_backend(config, Arc::new(DisabledJudgeBackend));
        state.judges.ensure_human_judge().await?;
        Ok(state)
    }

    pub fn with_judge_backend(config: AppConfig, backend: Arc<dyn JudgeBackend>) -> Self {
        let competitor_repo = Arc::new(InMemoryCompetitorRepository::new());
        let judge_repo = Arc::new(InMemoryJudgeRepository::new());
        let vote_repo = Arc::new(InMemoryVoteRepository::new());
        let task_repo = Arc::new(InMemoryTaskRepository::new());
        let queue = Arc::new(InMemoryJobQueue::new());

        let rating = config.rating_config();
        let votes = VoteService::new(
            vote_repo.clone(),
            judge_repo.clone(),
            competitor_repo.clone(),
        );
        let leaderboard =
            LeaderboardService::new(competitor_repo.clone(), vote_repo.clone(), rating);
        let runner = TaskRunner::new(
            queue.clone(),
            task_repo.clone(),
            judge_repo.clone(),
            competitor_repo.clone(),
            votes.clone(),
            leaderboard.clone(),
            backend,
            RunnerConfig {
                poll_interval: Duration::from_millis(config.runner_poll_interval_ms),
                promote_batch: config.runner_promote_batch,
                backoff_base_ms: config.runner_backoff_base_ms,
                backoff_max_ms: config.runner_backoff_max_ms,
                sampling_seed: config.rating_seed,
            },
        );

        let defaults = JobDefaults {
            max_attempts: config.judging_max_attempts,
        };
        Self {
            competitors: CompetitorService::new(competitor_repo, rating.initial_score),
            judges: JudgeService::new(judge_repo, vote_repo),
            votes,
            leaderboard,
            tasks: TaskService::new(task_repo, queue, defaults),
            runner,
            config,
        }
    }

    pub fn spawn_runner(&self) {
        let runner = self.runner.clone();
        tokio::spawn(async move { runner.run().await });
    }

    /// Runs every already-due job on the caller's task. Tests use this
    /// instead of a spawned runner.
    #[allow(dead_code)]
    pub async fn drain_jobs(&self) -> DomainResult<usize> {
        self.runner.drain().await
    }
}
