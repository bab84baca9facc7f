use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod competitors;
pub mod jobs;
pub mod judges;
pub mod judging;
pub mod tasks;
pub mod votes;
