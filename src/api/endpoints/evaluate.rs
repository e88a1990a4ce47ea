//! Evaluation endpoints: score, patch, review and batch-score rewrites.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, BatchRequest};
use crate::pipeline::evaluation::{
    BatchReport, EvaluationError, Evaluator, MetricsRecord, ReportPair, ReviewOutcome,
    RewriteOutcome,
};

/// Run evaluator work on the blocking pool. Embedding inference and
/// remote embedding calls must not stall the async workers.
async fn on_evaluator<T, F>(ctx: &ApiContext, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&Evaluator) -> Result<T, EvaluationError> + Send + 'static,
    T: Send + 'static,
{
    let evaluator = Arc::clone(&ctx.evaluator);
    let result = tokio::task::spawn_blocking(move || work(&evaluator)).await??;
    Ok(result)
}

/// `POST /api/evaluate`: full metrics for one pair.
pub async fn evaluate(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ReportPair>, JsonRejection>,
) -> Result<Json<MetricsRecord>, ApiError> {
    let Json(pair) = payload?;
    let metrics = on_evaluator(&ctx, move |ev| ev.evaluate_all(&pair.original, &pair.simplified)).await?;
    Ok(Json(metrics))
}

/// `POST /api/rewrite`: append corrections for dropped critical terms.
/// Lexical only; no embedder involved.
pub async fn rewrite(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ReportPair>, JsonRejection>,
) -> Result<Json<RewriteOutcome>, ApiError> {
    let Json(pair) = payload?;
    let outcome = ctx.evaluator.rewrite(&pair.original, &pair.simplified);
    if outcome.patched {
        tracing::info!(added = outcome.added_terms.len(), "Rewrite patched");
    }
    Ok(Json(outcome))
}

/// `POST /api/review`: evaluate, patch, re-evaluate.
pub async fn review(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ReportPair>, JsonRejection>,
) -> Result<Json<ReviewOutcome>, ApiError> {
    let Json(pair) = payload?;
    let outcome = on_evaluator(&ctx, move |ev| ev.review(&pair.original, &pair.simplified)).await?;
    Ok(Json(outcome))
}

/// `POST /api/batch`: per-pair metrics plus dataset summary.
pub async fn batch(
    State(ctx): State<ApiContext>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, ApiError> {
    let Json(request) = payload?;
    let report = on_evaluator(&ctx, move |ev| ev.evaluate_batch(&request.pairs)).await?;
    Ok(Json(report))
}
