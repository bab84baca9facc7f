use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::jobs::{JobEnvelope, JobQueue, JobType};
use crate::ports::tasks::TaskRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Started,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Tasks only move forward: started -> in-progress -> a terminal
    /// status. Repeated in-progress updates carry new progress values.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Started => next != TaskStatus::Started,
            TaskStatus::InProgress => next != TaskStatus::Started,
            TaskStatus::Completed | TaskStatus::Failed => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub task_id: String,
    pub task_type: JobType,
    pub status: TaskStatus,
    pub progress: f64,
    pub detail: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Task {
    pub fn new(task_type: JobType) -> Self {
        let now = now_ms();
        Self {
            task_id: uuid_v7_without_dashes(),
            task_type,
            status: TaskStatus::Started,
            progress: 0.0,
            detail: None,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    /// Applies a status/progress update, rejecting backwards moves.
    /// Progress never decreases and terminal statuses pin it: completed
    /// tasks land on 1.0.
    pub fn transition(
        &mut self,
        status: TaskStatus,
        progress: f64,
        detail: Option<String>,
    ) -> DomainResult<()> {
        if self.status != status && !self.status.can_transition_to(status) {
            return Err(DomainError::Validation(format!(
                "task cannot move from {:?} to {status:?}",
                self.status
            )));
        }
        if self.status == status && self.status.is_terminal() {
            return Err(DomainError::Validation(
                "task already reached a terminal status".into(),
            ));
        }
        if !(0.0..=1.0).contains(&progress) {
            return Err(DomainError::Validation(format!(
                "progress must be in [0, 1], got {progress}"
            )));
        }
        self.status = status;
        self.progress = match status {
            TaskStatus::Completed => 1.0,
            _ => self.progress.max(progress),
        };
        if detail.is_some() {
            self.detail = detail;
        }
        self.updated_at_ms = now_ms();
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AutoJudgeRunPayload {
    pub judge_ids: Vec<String>,
    pub fraction: f64,
    pub skip_existing: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardRecomputePayload {
    pub trigger: String,
}

#[derive(Clone, Debug)]
pub struct JobDefaults {
    pub max_attempts: u32,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

pub fn backoff_ms(base_ms: u64, attempt: u32, max_ms: u64) -> u64 {
    if attempt == 0 {
        return 0;
    }
    let pow = 2u64.saturating_pow(attempt.saturating_sub(1));
    let delay = base_ms.saturating_mul(pow);
    delay.min(max_ms)
}

pub fn new_job(
    task_id: String,
    job_type: JobType,
    payload: serde_json::Value,
    defaults: JobDefaults,
) -> JobEnvelope {
    let now = now_ms();
    JobEnvelope {
        job_id: uuid_v7_without_dashes(),
        job_type,
        payload,
        task_id,
        attempt: 1,
        max_attempts: defaults.max_attempts,
        run_at_ms: now,
        created_at_ms: now,
    }
}

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    queue: Arc<dyn JobQueue>,
    defaults: JobDefaults,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        queue: Arc<dyn JobQueue>,
        defaults: JobDefaults,
    ) -> Self {
        Self {
            tasks,
            queue,
            defaults,
        }
    }

    pub async fn schedule_auto_judge(&self, payload: AutoJudgeRunPayload) -> DomainResult<Task> {
        let payload = serde_json::to_value(&payload)
            .map_err(|err| DomainError::Validation(format!("invalid job payload: {err}")))?;
        self.schedule(JobType::AutoJudgeRun, payload).await
    }

    pub async fn schedule_recompute(&self, trigger: &str) -> DomainResult<Task> {
        let payload = serde_json::to_value(LeaderboardRecomputePayload {
            trigger: trigger.to_string(),
        })
        .map_err(|err| DomainError::Validation(format!("invalid job payload: {err}")))?;
        self.schedule(JobType::LeaderboardRecompute, payload).await
    }

    async fn schedule(&self, job_type: JobType, payload: serde_json::Value) -> DomainResult<Task> {
        let task = Task::new(job_type);
        let task = self.tasks.create(&task).await?;
        let job = new_job(
            task.task_id.clone(),
            job_type,
            payload,
            self.defaults.clone(),
        );
        self.queue.enqueue(&job).await.map_err(|err| {
            DomainError::Validation(format!("failed to enqueue {job_type:?} job: {err}"))
        })?;
        Ok(task)
    }

    pub async fn get(&self, task_id: &str) -> DomainResult<Task> {
        self.tasks.get(task_id).await
    }

    pub async fn list(&self) -> DomainResult<Vec<Task>> {
        self.tasks.list().await
    }
}
