use axum::extract::{Path, Query, State};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use arena_domain::{
    competitors::{Competitor, CompetitorCreate},
    head_to_head::{
        HistoryVote, OpponentSummary, PairwiseStats, VotePartition, aggregate_opponents,
        partition_history, tally_history,
    },
    judges::{Judge, JudgeCreate, JudgeKind},
    leaderboard::Leaderboard,
    tasks::{AutoJudgeRunPayload, Task},
    trajectory::{ScoreUpdate, TrajectoryPoint, reduce_from_votes},
    util::format_ms_rfc3339,
    votes::{Verdict, Vote, VoteCreate},
    workload::{WorkloadInput, judgements_to_run, unordered_pair_count},
};

use crate::{error::ApiError, middleware as app_middleware, observability, state::AppState};
use crate::validation;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route(
            "/v1/competitors",
            post(create_competitor).get(list_competitors),
        )
        .route(
            "/v1/competitors/:competitor_id",
            get(get_competitor).delete(delete_competitor),
        )
        .route(
            "/v1/competitors/:competitor_id/opponents",
            get(list_opponents),
        )
        .route(
            "/v1/competitors/:competitor_id/trajectory",
            get(get_trajectory),
        )
        .route("/v1/leaderboard", get(get_leaderboard))
        .route(
            "/v1/head-to-head/:first/:second/history",
            get(get_pair_history),
        )
        .route("/v1/judges", post(create_judge).get(list_judges))
        .route("/v1/judges/:judge_id", get(get_judge).delete(delete_judge))
        .route("/v1/judges/:judge_id/enabled", post(set_judge_enabled))
        .route("/v1/votes", post(record_vote))
        .route("/v1/judging/run", post(run_judging))
        .route("/v1/tasks", get(list_tasks))
        .route("/v1/tasks/:task_id", get(get_task))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(middleware::from_fn(
            app_middleware::correlation_id_middleware,
        ))
        .layer(middleware::from_fn(app_middleware::metrics_layer))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
    })
}

async fn metrics() -> Response {
    match observability::render_metrics() {
        Some(body) => body.into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not initialized",
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize, Validate)]
struct CreateCompetitorRequest {
    #[validate(length(min = 1, max = 200))]
    name: String,
    datapoint_count: Option<u64>,
}

async fn create_competitor(
    State(state): State<AppState>,
    Json(payload): Json<CreateCompetitorRequest>,
) -> Result<Response, ApiError> {
    validation::validate(&payload)?;
    let competitor = state
        .competitors
        .create(CompetitorCreate {
            name: payload.name,
            datapoint_count: payload.datapoint_count.unwrap_or(0),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(competitor)).into_response())
}

async fn list_competitors(
    State(state): State<AppState>,
) -> Result<Json<Vec<Competitor>>, ApiError> {
    Ok(Json(state.competitors.list().await?))
}

async fn get_competitor(
    State(state): State<AppState>,
    Path(competitor_id): Path<String>,
) -> Result<Json<Competitor>, ApiError> {
    Ok(Json(state.competitors.get(&competitor_id).await?))
}

async fn delete_competitor(
    State(state): State<AppState>,
    Path(competitor_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.competitors.delete(&competitor_id).await?;
    state.tasks.schedule_recompute("competitor_deleted").await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct JudgeScopedQuery {
    judge_id: Option<String>,
}

async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<JudgeScopedQuery>,
) -> Result<Json<Leaderboard>, ApiError> {
    Ok(Json(state.leaderboard.ranked(query.judge_id.as_deref()).await?))
}

#[derive(Serialize)]
struct PairHistoryResponse {
    history: Vec<HistoryVote>,
    partition: VotePartition,
    wins: u64,
    losses: u64,
    ties: u64,
}

/// History for (first, second) as seen from `first`'s side: `for_a` and
/// `wins` count votes in `first`'s favour regardless of stored order.
async fn get_pair_history(
    State(state): State<AppState>,
    Path((first, second)): Path<(String, String)>,
) -> Result<Json<PairHistoryResponse>, ApiError> {
    state.competitors.get(&first).await?;
    state.competitors.get(&second).await?;
    let votes = state.votes.pair_history(&first, &second).await?;
    let history: Vec<HistoryVote> = votes.iter().map(HistoryVote::from).collect();
    let (wins, losses, ties) = tally_history(&history);
    Ok(Json(PairHistoryResponse {
        partition: partition_history(&history),
        history,
        wins,
        losses,
        ties,
    }))
}

async fn list_opponents(
    State(state): State<AppState>,
    Path(competitor_id): Path<String>,
    Query(query): Query<JudgeScopedQuery>,
) -> Result<Json<Vec<OpponentSummary>>, ApiError> {
    state.competitors.get(&competitor_id).await?;
    let competitors = state.competitors.list().await?;
    let votes = state.votes.list_all().await?;
    let rows = pairwise_stats(&votes, &competitor_id, &competitors);
    Ok(Json(aggregate_opponents(&rows, query.judge_id.as_deref())))
}

/// Per (opponent, judge) verdict counts from `competitor_id`'s side, in
/// first-seen order.
fn pairwise_stats(
    votes: &[Vote],
    competitor_id: &str,
    competitors: &[Competitor],
) -> Vec<PairwiseStats> {
    let mut rows: Vec<PairwiseStats> = Vec::new();
    for vote in votes {
        let (opponent_id, verdict) = if vote.pair.competitor_a() == competitor_id {
            (vote.pair.competitor_b(), vote.verdict)
        } else if vote.pair.competitor_b() == competitor_id {
            (vote.pair.competitor_a(), vote.verdict.flipped())
        } else {
            continue;
        };

        let row = match rows
            .iter_mut()
            .find(|row| row.opponent_id == opponent_id && row.judge_id == vote.judge_id)
        {
            Some(existing) => existing,
            None => {
                let opponent_name = competitors
                    .iter()
                    .find(|competitor| competitor.competitor_id == opponent_id)
                    .map(|competitor| competitor.name.clone())
                    .unwrap_or_else(|| opponent_id.to_string());
                rows.push(PairwiseStats {
                    opponent_id: opponent_id.to_string(),
                    opponent_name,
                    judge_id: vote.judge_id.clone(),
                    judge_name: vote.judge_name.clone(),
                    win_count: 0,
                    loss_count: 0,
                    tie_count: 0,
                });
                rows.last_mut().expect("row pushed on the line above")
            }
        };
        match verdict {
            Verdict::A => row.win_count += 1,
            Verdict::B => row.loss_count += 1,
            Verdict::Tie => row.tie_count += 1,
        }
    }
    rows
}

#[derive(Serialize)]
struct TrajectoryResponse {
    points: Vec<TrajectoryPoint>,
    score_lo: Option<f64>,
    score_hi: Option<f64>,
    events: Vec<ScoreUpdate>,
}

async fn get_trajectory(
    State(state): State<AppState>,
    Path(competitor_id): Path<String>,
    Query(query): Query<JudgeScopedQuery>,
) -> Result<Json<TrajectoryResponse>, ApiError> {
    state.competitors.get(&competitor_id).await?;
    let competitors = state.competitors.list().await?;
    let names = competitors
        .into_iter()
        .map(|competitor| (competitor.competitor_id, competitor.name))
        .collect();
    let votes = state.votes.list_all().await?;
    let trajectory = reduce_from_votes(
        &votes,
        &competitor_id,
        &names,
        &state.config.rating_config(),
    );
    let trajectory = match query.judge_id.as_deref() {
        Some(judge_id) => trajectory.filtered_by_judge(judge_id),
        None => trajectory,
    };
    let (score_lo, score_hi) = match trajectory.score_bounds() {
        Some((lo, hi)) => (Some(lo), Some(hi)),
        None => (None, None),
    };
    Ok(Json(TrajectoryResponse {
        points: trajectory.points(),
        score_lo,
        score_hi,
        events: trajectory.events().to_vec(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateJudgeRequest {
    #[validate(length(min = 1, max = 200))]
    name: String,
    kind: JudgeKind,
    model_name: Option<String>,
    system_prompt: Option<String>,
}

async fn create_judge(
    State(state): State<AppState>,
    Json(payload): Json<CreateJudgeRequest>,
) -> Result<Response, ApiError> {
    validation::validate(&payload)?;
    let judge = state
        .judges
        .create(JudgeCreate {
            name: payload.name,
            kind: payload.kind,
            model_name: payload.model_name,
            system_prompt: payload.system_prompt,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(judge)).into_response())
}

async fn list_judges(State(state): State<AppState>) -> Result<Json<Vec<Judge>>, ApiError> {
    Ok(Json(state.judges.list().await?))
}

async fn get_judge(
    State(state): State<AppState>,
    Path(judge_id): Path<String>,
) -> Result<Json<Judge>, ApiError> {
    Ok(Json(state.judges.get(&judge_id).await?))
}

#[derive(Debug, Deserialize)]
struct SetEnabledRequest {
    enabled: bool,
}

async fn set_judge_enabled(
    State(state): State<AppState>,
    Path(judge_id): Path<String>,
    Json(payload): Json<SetEnabledRequest>,
) -> Result<Json<Judge>, ApiError> {
    Ok(Json(
        state.judges.set_enabled(&judge_id, payload.enabled).await?,
    ))
}

#[derive(Serialize)]
struct DeleteJudgeResponse {
    judge_id: String,
    retracted_votes: u64,
    recompute_task_id: String,
}

/// Deleting a judge retracts its votes, so standings are recomputed from
/// what remains.
async fn delete_judge(
    State(state): State<AppState>,
    Path(judge_id): Path<String>,
) -> Result<Json<DeleteJudgeResponse>, ApiError> {
    let deletion = state.judges.delete(&judge_id).await?;
    let task = state.tasks.schedule_recompute("judge_deleted").await?;
    Ok(Json(DeleteJudgeResponse {
        judge_id: deletion.judge_id,
        retracted_votes: deletion.retracted_votes,
        recompute_task_id: task.task_id,
    }))
}

#[derive(Debug, Deserialize)]
struct RecordVoteRequest {
    competitor_a: String,
    competitor_b: String,
    judge_id: Option<String>,
    verdict: Verdict,
}

#[derive(Serialize)]
struct VoteResponse {
    #[serde(flatten)]
    vote: Vote,
    created_at: String,
}

async fn record_vote(
    State(state): State<AppState>,
    Json(payload): Json<RecordVoteRequest>,
) -> Result<Response, ApiError> {
    let judge_id = match payload.judge_id {
        Some(judge_id) => judge_id,
        None => state.judges.ensure_human_judge().await?.judge_id,
    };
    let vote = state
        .votes
        .record(VoteCreate {
            competitor_a: payload.competitor_a,
            competitor_b: payload.competitor_b,
            judge_id,
            verdict: payload.verdict,
        })
        .await?;
    let created_at = format_ms_rfc3339(vote.created_at_ms);
    Ok((StatusCode::CREATED, Json(VoteResponse { vote, created_at })).into_response())
}

#[derive(Debug, Deserialize)]
struct RunJudgingRequest {
    judge_ids: Vec<String>,
    fraction: Option<f64>,
    #[serde(default)]
    skip_existing: bool,
}

#[derive(Serialize)]
struct RunJudgingResponse {
    task: Task,
    estimated_judgements: u64,
}

async fn run_judging(
    State(state): State<AppState>,
    Json(payload): Json<RunJudgingRequest>,
) -> Result<Response, ApiError> {
    if payload.judge_ids.is_empty() {
        return Err(ApiError::Validation("judge_ids must not be empty".into()));
    }
    for judge_id in &payload.judge_ids {
        let judge = state.judges.get(judge_id).await?;
        if !judge.kind.is_automated() {
            return Err(ApiError::Validation(format!(
                "judge {} does not run automatically",
                judge.name
            )));
        }
        if !judge.enabled {
            return Err(ApiError::Validation(format!(
                "judge {} is disabled",
                judge.name
            )));
        }
    }

    let fraction = payload.fraction.unwrap_or(1.0);
    let competitor_count = state.competitors.list().await?.len() as u64;
    let existing_votes = state.votes.count_by_judges(&payload.judge_ids).await?;
    let estimated_judgements = judgements_to_run(&WorkloadInput {
        total_pairs: unordered_pair_count(competitor_count),
        judge_count: payload.judge_ids.len() as u64,
        existing_votes,
        skip_existing: payload.skip_existing,
        fraction,
    })?;

    let task = state
        .tasks
        .schedule_auto_judge(AutoJudgeRunPayload {
            judge_ids: payload.judge_ids,
            fraction,
            skip_existing: payload.skip_existing,
        })
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(RunJudgingResponse {
            task,
            estimated_judgements,
        }),
    )
        .into_response())
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list().await?))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.tasks.get(&task_id).await?))
}
