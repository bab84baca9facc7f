pub mod competitors;
pub mod error;
pub mod head_to_head;
pub mod judges;
pub mod leaderboard;
pub mod ports;
pub mod ranking;
pub mod rating;
pub mod tasks;
pub mod trajectory;
pub mod util;
pub mod votes;
pub mod workload;

pub type DomainResult<T> = Result<T, error::DomainError>;
