use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::tasks::Task;

pub trait TaskRepository: Send + Sync {
    fn create(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>>;

    fn get(&self, task_id: &str) -> BoxFuture<'_, DomainResult<Task>>;

    /// Tasks in creation order, newest last.
    fn list(&self) -> BoxFuture<'_, DomainResult<Vec<Task>>>;

    fn update(&self, task: &Task) -> BoxFuture<'_, DomainResult<Task>>;
}
