use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arena_domain::ports::BoxFuture;
use arena_domain::ports::jobs::{JobEnvelope, JobQueue, JobQueueError};
use arena_domain::util::now_ms;
use tokio::sync::Notify;

#[derive(Default)]
struct QueueState {
    ready: VecDeque<String>,
    delayed: Vec<(i64, String)>,
    processing: Vec<String>,
    payloads: HashMap<String, JobEnvelope>,
}

/// In-process queue with the same ready/delayed/processing contract a
/// durable queue would expose. Single-process only; the durable variant
/// is an external collaborator.
#[derive(Clone, Default)]
pub struct InMemoryJobQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn pop_ready(&self) -> Option<JobEnvelope> {
        let mut state = self.state.lock().expect("job queue lock");
        let job_id = state.ready.pop_front()?;
        let job = state.payloads.get(&job_id).cloned();
        if job.is_some() {
            state.processing.push(job_id);
        }
        job
    }

    pub fn depths(&self) -> (usize, usize, usize) {
        let state = self.state.lock().expect("job queue lock");
        (
            state.ready.len(),
            state.delayed.len(),
            state.processing.len(),
        )
    }
}

impl JobQueue for InMemoryJobQueue {
    fn enqueue(&self, job: &JobEnvelope) -> BoxFuture<'_, Result<(), JobQueueError>> {
        let job = job.clone();
        Box::pin(async move {
            let mut state = self.state.lock().expect("job queue lock");
            if state.payloads.contains_key(&job.job_id) {
                return Err(JobQueueError::Operation(format!(
                    "job {} already enqueued",
                    job.job_id
                )));
            }
            let job_id = job.job_id.clone();
            let run_at_ms = job.run_at_ms;
            state.payloads.insert(job_id.clone(), job);
            if run_at_ms <= now_ms() {
                state.ready.push_back(job_id);
                drop(state);
                self.notify.notify_one();
            } else {
                state.delayed.push((run_at_ms, job_id));
            }
            Ok(())
        })
    }

    fn dequeue(
        &self,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<Option<JobEnvelope>, JobQueueError>> {
        Box::pin(async move {
            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                if let Some(job) = self.pop_ready() {
                    return Ok(Some(job));
                }
                tokio::select! {
                    _ = self.notify.notified() => {}
                    _ = tokio::time::sleep_until(deadline) => return Ok(None),
                }
            }
        })
    }

    fn ack(&self, job_id: &str) -> BoxFuture<'_, Result<(), JobQueueError>> {
        let job_id = job_id.to_string();
        Box::pin(async move {
            let mut state = self.state.lock().expect("job queue lock");
            state.processing.retain(|id| id != &job_id);
            state.payloads.remove(&job_id);
            Ok(())
        })
    }

    fn promote_due(
        &self,
        now_ms: i64,
        limit: usize,
    ) -> BoxFuture<'_, Result<usize, JobQueueError>> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("job queue lock");
            state.delayed.sort_by_key(|(run_at_ms, _)| *run_at_ms);
            let mut moved = 0usize;
            while moved < limit {
                match state.delayed.first() {
                    Some((run_at_ms, _)) if *run_at_ms <= now_ms => {
                        let (_, job_id) = state.delayed.remove(0);
                        state.ready.push_back(job_id);
                        moved += 1;
                    }
                    _ => break,
                }
            }
            if moved > 0 {
                drop(state);
                self.notify.notify_one();
            }
            Ok(moved)
        })
    }

    fn requeue_processing(&self, limit: usize) -> BoxFuture<'_, Result<usize, JobQueueError>> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("job queue lock");
            let count = limit.min(state.processing.len());
            for _ in 0..count {
                let job_id = state.processing.remove(0);
                state.ready.push_back(job_id);
            }
            if count > 0 {
                drop(state);
                self.notify.notify_one();
            }
            Ok(count)
        })
    }
}
