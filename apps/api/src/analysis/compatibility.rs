//! Compatibility Analyzer: 0 to 100 score plus gap/strength breakdown for one
//! (job, candidate) pair, cached on the application row.
//!
//! Validity follows the dependency-timestamp policy: the snapshot is served
//! while it is newer than both the job and the candidate.
//! A computed result is returned even when persisting it fails.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::provider::{InferenceProvider, RawCompatibility};
use crate::analysis::staleness::{is_valid, StalenessPolicy};
use crate::analysis::{load_candidate, load_job};
use crate::errors::{AnalysisError, AppError};
use crate::models::analysis::{CategoryBreakdown, CompatibilityAnalysis, FitLevel};
use crate::models::candidate::CandidateProfile;
use crate::models::job::Job;
use crate::store::AnalysisStore;

fn bounded_number(field: &'static str, value: Option<&Value>) -> Result<f64, AnalysisError> {
    let value = value.ok_or_else(|| AnalysisError::Malformed(format!("missing '{field}'")))?;
    let number = value
        .as_f64()
        .ok_or_else(|| AnalysisError::Malformed(format!("'{field}' is not numeric: {value}")))?;
    Ok(number.clamp(0.0, 100.0))
}

/// Turns a raw provider response into a complete record, or rejects it.
/// Numbers are clamped to 0 to 100.
pub fn validate_compatibility(
    raw: RawCompatibility,
    analyzed_at: DateTime<Utc>,
) -> Result<CompatibilityAnalysis, AnalysisError> {
    let score = bounded_number("score", raw.score.as_ref())?;

    let breakdown = raw
        .breakdown
        .ok_or_else(|| AnalysisError::Malformed("missing 'breakdown'".to_string()))?;
    let breakdown = CategoryBreakdown {
        skills: bounded_number("breakdown.skills", breakdown.skills.as_ref())?,
        experience: bounded_number("breakdown.experience", breakdown.experience.as_ref())?,
        education: bounded_number("breakdown.education", breakdown.education.as_ref())?,
        overall: bounded_number("breakdown.overall", breakdown.overall.as_ref())?,
    };

    let summary = raw
        .summary
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AnalysisError::Malformed("missing 'summary'".to_string()))?;

    Ok(CompatibilityAnalysis {
        score,
        breakdown,
        strengths: raw.strengths,
        skill_gaps: raw.skill_gaps,
        experience_gaps: raw.experience_gaps,
        recommendations: raw.recommendations,
        fit_level: FitLevel::from_score(score),
        summary,
        analyzed_at,
    })
}

/// Runs one compatibility inference. No caching.
pub async fn analyze_compatibility(
    provider: &dyn InferenceProvider,
    job: &Job,
    candidate: &CandidateProfile,
) -> Result<CompatibilityAnalysis, AnalysisError> {
    let raw = provider.score_compatibility(job, candidate).await?;
    validate_compatibility(raw, Utc::now())
}

/// Serves the stored snapshot when still valid, otherwise recomputes and
/// stores it on the pair's application (if one exists).
///
/// `force_refresh` clears the stored snapshot first.
pub async fn get_or_compute_compatibility(
    store: &dyn AnalysisStore,
    provider: &dyn InferenceProvider,
    job_id: Uuid,
    candidate_id: Uuid,
    force_refresh: bool,
) -> Result<CompatibilityAnalysis, AppError> {
    let job = load_job(store, job_id).await?;
    let candidate = load_candidate(store, candidate_id).await?;
    let application = store.find_application(job_id, candidate_id).await?;

    if force_refresh {
        if let Some(app) = &application {
            if let Err(e) = store.clear_compatibility(app.id).await {
                warn!("Failed to clear compatibility for application {}: {e:#}", app.id);
            }
        }
    } else if let Some(existing) = application.as_ref().and_then(|a| a.compatibility.as_ref()) {
        let policy = StalenessPolicy::dependencies(&job, &candidate);
        if is_valid(Some(existing), &policy, Utc::now()) {
            debug!("Compatibility cache hit for job {job_id} / candidate {candidate_id}");
            return Ok(existing.clone());
        }
        debug!("Compatibility snapshot stale for job {job_id} / candidate {candidate_id}");
    }

    let analysis = analyze_compatibility(provider, &job, &candidate).await?;
    info!(
        "Compatibility computed: {:.1}/100 for job {job_id} / candidate {candidate_id}",
        analysis.score
    );

    match &application {
        Some(app) => {
            if let Err(e) = store.save_compatibility(app.id, &analysis).await {
                warn!("Failed to persist compatibility for application {}: {e:#}", app.id);
            }
        }
        None => debug!("No application for job {job_id} / candidate {candidate_id}; result not stored"),
    }

    Ok(analysis)
}

/// Background entry point: analyze the pair behind an application.
pub async fn analyze_application(
    store: &dyn AnalysisStore,
    provider: &dyn InferenceProvider,
    application_id: Uuid,
) -> Result<CompatibilityAnalysis, AppError> {
    crate::analysis::require_id(application_id, "application")?;
    let application = store
        .fetch_application(application_id)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!("Application {application_id} does not exist"))
        })?;

    get_or_compute_compatibility(
        store,
        provider,
        application.job_id,
        application.candidate_id,
        false,
    )
    .await
}
