use arena_domain::rating::RatingConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub data_backend: String,
    pub rating_initial_score: f64,
    pub rating_k_factor: f64,
    pub rating_bootstrap_rounds: u32,
    pub rating_seed: u64,
    pub judging_max_attempts: u32,
    pub runner_poll_interval_ms: u64,
    pub runner_promote_batch: usize,
    pub runner_backoff_base_ms: u64,
    pub runner_backoff_max_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("data_backend", "memory")?
            .set_default("rating_initial_score", 1000.0)?
            .set_default("rating_k_factor", 4.0)?
            .set_default("rating_bootstrap_rounds", 200)?
            .set_default("rating_seed", 0)?
            .set_default("judging_max_attempts", 5)?
            .set_default("runner_poll_interval_ms", 1000)?
            .set_default("runner_promote_batch", 50)?
            .set_default("runner_backoff_base_ms", 1000)?
            .set_default("runner_backoff_max_ms", 60000)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn rating_config(&self) -> RatingConfig {
        RatingConfig {
            initial_score: self.rating_initial_score,
            k_factor: self.rating_k_factor,
            bootstrap_rounds: self.rating_bootstrap_rounds,
            seed: self.rating_seed,
        }
    }
}
