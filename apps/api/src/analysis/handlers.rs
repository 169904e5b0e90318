use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::compatibility::get_or_compute_compatibility;
use crate::analysis::dispatcher::{AnalysisTask, DispatcherStatsSnapshot};
use crate::analysis::invalidation::{
    invalidate_candidate_roadmap, invalidate_job, invalidate_reanalysis, InvalidationReport,
};
use crate::analysis::recommendations::get_or_compute_recommendations;
use crate::analysis::roadmap::get_or_compute_roadmap;
use crate::analysis::skill_match::get_or_compute_skill_match;
use crate::analysis::require_id;
use crate::errors::AppError;
use crate::models::analysis::{CompatibilityAnalysis, SkillMatchAnalysis, SkillRecommendation};
use crate::models::roadmap::RoadmapOutcome;
use crate::routes::caller::CallerStore;
use crate::state::AppState;
use crate::store::AnalysisStore;

#[derive(Deserialize)]
pub struct CompatibilityQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub recommendations: Vec<SkillRecommendation>,
}

#[derive(Serialize)]
pub struct ReanalyzeResponse {
    pub skill_matches_cleared: u64,
    pub compatibility: CompatibilityAnalysis,
}

#[derive(Serialize)]
pub struct ScheduledResponse {
    pub queued: bool,
}

#[derive(Serialize)]
pub struct RoadmapsClearedResponse {
    pub roadmaps_deleted: u64,
}

/// GET /api/v1/analysis/compatibility/:job_id/:candidate_id?force=
pub async fn handle_get_compatibility(
    State(state): State<AppState>,
    CallerStore(store): CallerStore,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<CompatibilityQuery>,
) -> Result<Json<CompatibilityAnalysis>, AppError> {
    let analysis = get_or_compute_compatibility(
        &store,
        state.provider.as_ref(),
        job_id,
        candidate_id,
        params.force,
    )
    .await?;
    Ok(Json(analysis))
}

/// GET /api/v1/analysis/skill-match/:job_id/:candidate_id
pub async fn handle_get_skill_match(
    State(state): State<AppState>,
    CallerStore(store): CallerStore,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SkillMatchAnalysis>, AppError> {
    let analysis =
        get_or_compute_skill_match(&store, state.provider.as_ref(), job_id, candidate_id).await?;
    Ok(Json(analysis))
}

/// GET /api/v1/analysis/recommendations/:job_id/:candidate_id
pub async fn handle_get_recommendations(
    State(state): State<AppState>,
    CallerStore(store): CallerStore,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let recommendations =
        get_or_compute_recommendations(&store, state.provider.as_ref(), job_id, candidate_id)
            .await?;
    Ok(Json(RecommendationsResponse {
        job_id,
        candidate_id,
        recommendations,
    }))
}

/// GET /api/v1/analysis/roadmap/:candidate_id
pub async fn handle_get_roadmap(
    State(state): State<AppState>,
    CallerStore(store): CallerStore,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<RoadmapOutcome>, AppError> {
    let outcome = get_or_compute_roadmap(&store, state.provider.as_ref(), candidate_id).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/analysis/jobs/:job_id/invalidate
/// The caller must be identified; the cascade itself runs elevated.
pub async fn handle_invalidate_job(
    State(state): State<AppState>,
    CallerStore(_caller): CallerStore,
    Path(job_id): Path<Uuid>,
) -> Result<Json<InvalidationReport>, AppError> {
    let report = invalidate_job(state.elevated.as_ref(), job_id).await?;
    Ok(Json(report))
}

/// POST /api/v1/analysis/reanalyze/:job_id/:candidate_id
pub async fn handle_reanalyze(
    State(state): State<AppState>,
    CallerStore(store): CallerStore,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReanalyzeResponse>, AppError> {
    let skill_matches_cleared = invalidate_reanalysis(&store, job_id, candidate_id).await?;
    let compatibility =
        get_or_compute_compatibility(&store, state.provider.as_ref(), job_id, candidate_id, true)
            .await?;
    Ok(Json(ReanalyzeResponse {
        skill_matches_cleared,
        compatibility,
    }))
}

/// POST /api/v1/analysis/applications/:application_id/schedule
/// Returns 202 as soon as the task is handed to the dispatcher.
pub async fn handle_schedule_application(
    State(state): State<AppState>,
    CallerStore(store): CallerStore,
    Path(application_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ScheduledResponse>), AppError> {
    require_id(application_id, "application")?;
    if store.fetch_application(application_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Application {application_id} not found"
        )));
    }
    let queued = state
        .dispatcher
        .schedule(AnalysisTask::Application(application_id));
    Ok((StatusCode::ACCEPTED, Json(ScheduledResponse { queued })))
}

/// POST /api/v1/analysis/candidates/:candidate_id/interests/changed
pub async fn handle_interests_changed(
    CallerStore(store): CallerStore,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<RoadmapsClearedResponse>, AppError> {
    let roadmaps_deleted = invalidate_candidate_roadmap(&store, candidate_id).await?;
    Ok(Json(RoadmapsClearedResponse { roadmaps_deleted }))
}

/// POST /api/v1/analysis/candidates/:candidate_id/profile-changed
/// Re-scores the candidate's applications in the background. No cache rows
/// are deleted here.
pub async fn handle_profile_changed(
    State(state): State<AppState>,
    CallerStore(_caller): CallerStore,
    Path(candidate_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ScheduledResponse>), AppError> {
    require_id(candidate_id, "candidate")?;
    let queued = state
        .dispatcher
        .schedule(AnalysisTask::CandidateProfile(candidate_id));
    Ok((StatusCode::ACCEPTED, Json(ScheduledResponse { queued })))
}

/// GET /api/v1/analysis/dispatcher/stats
pub async fn handle_dispatcher_stats(State(state): State<AppState>) -> Json<DispatcherStatsSnapshot> {
    Json(state.dispatcher.stats())
}
