use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arena_domain::DomainResult;
use arena_domain::error::DomainError;
use arena_domain::judges::Judge;
use arena_domain::leaderboard::LeaderboardService;
use arena_domain::ports::competitors::CompetitorRepository;
use arena_domain::ports::jobs::{JobEnvelope, JobQueue, JobType};
use arena_domain::ports::judges::JudgeRepository;
use arena_domain::ports::judging::JudgeBackend;
use arena_domain::ports::tasks::TaskRepository;
use arena_domain::tasks::{AutoJudgeRunPayload, TaskStatus, backoff_ms};
use arena_domain::util::now_ms;
use arena_domain::votes::{HeadToHeadPair, VoteCreate, VoteService};
use arena_domain::workload::{WorkloadInput, judgements_to_run};
use metrics::{counter, histogram};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{info, warn};

const JOBS_PROCESSED_TOTAL: &str = "arena_runner_jobs_processed_total";
const JOB_PROCESSING_DURATION_MS: &str = "arena_runner_job_processing_duration_ms";

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub poll_interval: Duration,
    pub promote_batch: usize,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub sampling_seed: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1_000),
            promote_batch: 50,
            backoff_base_ms: 1_000,
            backoff_max_ms: 60_000,
            sampling_seed: 0,
        }
    }
}

/// Drives scheduled jobs to completion: promotes due retries, pulls the
/// next job, and reflects every step into the task record.
#[derive(Clone)]
pub struct TaskRunner {
    queue: Arc<dyn JobQueue>,
    tasks: Arc<dyn TaskRepository>,
    judges: Arc<dyn JudgeRepository>,
    competitors: Arc<dyn CompetitorRepository>,
    votes: VoteService,
    leaderboard: LeaderboardService,
    backend: Arc<dyn JudgeBackend>,
    config: RunnerConfig,
}

impl TaskRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn JobQueue>,
        tasks: Arc<dyn TaskRepository>,
        judges: Arc<dyn JudgeRepository>,
        competitors: Arc<dyn CompetitorRepository>,
        votes: VoteService,
        leaderboard: LeaderboardService,
        backend: Arc<dyn JudgeBackend>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            queue,
            tasks,
            judges,
            competitors,
            votes,
            leaderboard,
            backend,
            config,
        }
    }

    pub async fn run(&self) {
        info!("task runner started");
        loop {
            if let Err(err) = self.tick().await {
                warn!(error = %err, "task runner tick failed");
            }
        }
    }

    async fn tick(&self) -> DomainResult<()> {
        self.queue
            .promote_due(now_ms(), self.config.promote_batch)
            .await
            .map_err(queue_error)?;
        let job = self
            .queue
            .dequeue(self.config.poll_interval)
            .await
            .map_err(queue_error)?;
        if let Some(job) = job {
            self.process(job).await?;
        }
        Ok(())
    }

    /// Processes every job that is already due, including zero-backoff
    /// retries, then returns. In-process deployments and tests use this.
    pub async fn drain(&self) -> DomainResult<usize> {
        let mut processed = 0usize;
        loop {
            self.queue
                .promote_due(now_ms(), self.config.promote_batch)
                .await
                .map_err(queue_error)?;
            let job = self
                .queue
                .dequeue(Duration::from_millis(10))
                .await
                .map_err(queue_error)?;
            match job {
                Some(job) => {
                    self.process(job).await?;
                    processed += 1;
                }
                None => return Ok(processed),
            }
        }
    }

    async fn process(&self, job: JobEnvelope) -> DomainResult<()> {
        let started = Instant::now();
        let outcome = self.handle(&job).await;
        let duration_ms = started.elapsed().as_secs_f64() * 1_000.0;

        match outcome {
            Ok(()) => {
                register_job_processed(job.job_type, "ok", duration_ms);
                self.queue.ack(&job.job_id).await.map_err(queue_error)?;
            }
            Err(err) => {
                self.queue.ack(&job.job_id).await.map_err(queue_error)?;
                if job.attempt < job.max_attempts {
                    register_job_processed(job.job_type, "retry", duration_ms);
                    let delay = backoff_ms(
                        self.config.backoff_base_ms,
                        job.attempt,
                        self.config.backoff_max_ms,
                    );
                    warn!(
                        task_id = %job.task_id,
                        attempt = job.attempt,
                        delay_ms = delay,
                        error = %err,
                        "job failed, scheduling retry"
                    );
                    let mut retry = job.clone();
                    retry.attempt = job.next_attempt();
                    retry.run_at_ms = now_ms() + delay as i64;
                    self.queue.enqueue(&retry).await.map_err(queue_error)?;
                } else {
                    register_job_processed(job.job_type, "failed", duration_ms);
                    warn!(
                        task_id = %job.task_id,
                        attempt = job.attempt,
                        error = %err,
                        "job exhausted its attempts"
                    );
                    self.update_task(&job.task_id, TaskStatus::Failed, 0.0, Some(err.to_string()))
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn handle(&self, job: &JobEnvelope) -> DomainResult<()> {
        match job.job_type {
            JobType::LeaderboardRecompute => self.recompute_leaderboard(job).await,
            JobType::AutoJudgeRun => self.run_auto_judge(job).await,
        }
    }

    async fn recompute_leaderboard(&self, job: &JobEnvelope) -> DomainResult<()> {
        self.update_task(&job.task_id, TaskStatus::InProgress, 0.1, None)
            .await?;
        let touched = self.leaderboard.recompute_and_store().await?;
        info!(task_id = %job.task_id, touched, "leaderboard recomputed");
        self.update_task(
            &job.task_id,
            TaskStatus::Completed,
            1.0,
            Some(format!("updated {touched} competitors")),
        )
        .await
    }

    async fn run_auto_judge(&self, job: &JobEnvelope) -> DomainResult<()> {
        let payload: AutoJudgeRunPayload = serde_json::from_value(job.payload.clone())
            .map_err(|err| DomainError::Validation(format!("invalid job payload: {err}")))?;
        self.update_task(&job.task_id, TaskStatus::InProgress, 0.0, None)
            .await?;

        let mut judges = Vec::with_capacity(payload.judge_ids.len());
        for judge_id in &payload.judge_ids {
            let judge = self.judges.get(judge_id).await?;
            if !judge.kind.is_automated() {
                return Err(DomainError::Validation(format!(
                    "judge {} does not run automatically",
                    judge.name
                )));
            }
            if !judge.enabled {
                return Err(DomainError::Validation(format!(
                    "judge {} is disabled",
                    judge.name
                )));
            }
            judges.push(judge);
        }

        let plan = self
            .build_plan(&judges, payload.skip_existing, payload.fraction, job)
            .await?;
        let total = plan.len();
        info!(task_id = %job.task_id, judgements = total, "auto-judge run planned");

        for (done, (judge, pair)) in plan.into_iter().enumerate() {
            let verdict = self.backend.verdict(&judge, &pair).await?;
            self.votes
                .record(VoteCreate {
                    competitor_a: pair.competitor_a().to_string(),
                    competitor_b: pair.competitor_b().to_string(),
                    judge_id: judge.judge_id.clone(),
                    verdict,
                })
                .await?;
            let progress = 0.9 * (done + 1) as f64 / total as f64;
            self.update_task(&job.task_id, TaskStatus::InProgress, progress, None)
                .await?;
        }

        self.leaderboard.recompute_and_store().await?;
        self.update_task(
            &job.task_id,
            TaskStatus::Completed,
            1.0,
            Some(format!("recorded {total} votes")),
        )
        .await
    }

    /// Builds the judge-by-pair work list, drops already-judged pairs when
    /// asked to, and samples it down to the requested fraction.
    async fn build_plan(
        &self,
        judges: &[Judge],
        skip_existing: bool,
        fraction: f64,
        job: &JobEnvelope,
    ) -> DomainResult<Vec<(Judge, HeadToHeadPair)>> {
        let competitors = self.competitors.list().await?;
        let mut pairs = Vec::new();
        for (index, first) in competitors.iter().enumerate() {
            for second in &competitors[index + 1..] {
                pairs.push(HeadToHeadPair::new(
                    &first.competitor_id,
                    &second.competitor_id,
                )?);
            }
        }

        // Retries must not re-record pairs judged by a failed attempt, so
        // they always drop pairs the judge has already voted on.
        let skip_recorded = skip_existing || job.attempt > 1;
        let voted: HashSet<(String, HeadToHeadPair)> = if skip_recorded {
            self.votes
                .list_all()
                .await?
                .into_iter()
                .map(|vote| (vote.judge_id, vote.pair))
                .collect()
        } else {
            HashSet::new()
        };

        let mut plan = Vec::new();
        for judge in judges {
            for pair in &pairs {
                if skip_recorded && voted.contains(&(judge.judge_id.clone(), pair.clone())) {
                    continue;
                }
                plan.push((judge.clone(), pair.clone()));
            }
        }

        let population = pairs.len() as u64 * judges.len() as u64;
        let target = judgements_to_run(&WorkloadInput {
            total_pairs: pairs.len() as u64,
            judge_count: judges.len() as u64,
            existing_votes: population - plan.len() as u64,
            skip_existing: skip_recorded,
            fraction,
        })?;

        let mut rng = StdRng::seed_from_u64(
            self.config.sampling_seed.wrapping_add(job.attempt as u64),
        );
        plan.shuffle(&mut rng);
        plan.truncate(target as usize);
        Ok(plan)
    }

    async fn update_task(
        &self,
        task_id: &str,
        status: TaskStatus,
        progress: f64,
        detail: Option<String>,
    ) -> DomainResult<()> {
        let mut task = self.tasks.get(task_id).await?;
        task.transition(status, progress, detail)?;
        self.tasks.update(&task).await?;
        Ok(())
    }
}

fn queue_error(err: arena_domain::ports::jobs::JobQueueError) -> DomainError {
    DomainError::Validation(format!("job queue failure: {err}"))
}

fn register_job_processed(job_type: JobType, result: &str, duration_ms: f64) {
    let job_type = match job_type {
        JobType::AutoJudgeRun => "auto_judge_run",
        JobType::LeaderboardRecompute => "leaderboard_recompute",
    };

    counter!(
        JOBS_PROCESSED_TOTAL,
        "job_type" => job_type,
        "result" => result.to_string()
    )
    .increment(1);

    histogram!(
        JOB_PROCESSING_DURATION_MS,
        "job_type" => job_type
    )
    .record(duration_ms);
}
