pub mod caller;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // On-demand analysis (cache or compute)
        .route(
            "/api/v1/analysis/compatibility/:job_id/:candidate_id",
            get(handlers::handle_get_compatibility),
        )
        .route(
            "/api/v1/analysis/skill-match/:job_id/:candidate_id",
            get(handlers::handle_get_skill_match),
        )
        .route(
            "/api/v1/analysis/recommendations/:job_id/:candidate_id",
            get(handlers::handle_get_recommendations),
        )
        .route(
            "/api/v1/analysis/roadmap/:candidate_id",
            get(handlers::handle_get_roadmap),
        )
        // Invalidation hooks
        .route(
            "/api/v1/analysis/jobs/:job_id/invalidate",
            post(handlers::handle_invalidate_job),
        )
        .route(
            "/api/v1/analysis/reanalyze/:job_id/:candidate_id",
            post(handlers::handle_reanalyze),
        )
        .route(
            "/api/v1/analysis/candidates/:candidate_id/interests/changed",
            post(handlers::handle_interests_changed),
        )
        // Background scheduling
        .route(
            "/api/v1/analysis/applications/:application_id/schedule",
            post(handlers::handle_schedule_application),
        )
        .route(
            "/api/v1/analysis/candidates/:candidate_id/profile-changed",
            post(handlers::handle_profile_changed),
        )
        .route(
            "/api/v1/analysis/dispatcher/stats",
            get(handlers::handle_dispatcher_stats),
        )
        .with_state(state)
}
