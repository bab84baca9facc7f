pub mod config;
pub mod jobs;
pub mod judging;
pub mod logging;
pub mod repositories;
pub mod runner;
