//! Invalidation Cascade Handler.
//!
//! Job edits delete dependent cache rows explicitly. Candidate edits do not:
//! their skill match, recommendation and roadmap rows expire by TTL, and the
//! compatibility snapshot is re-checked against timestamps on read.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::require_id;
use crate::errors::AppError;
use crate::store::{AnalysisStore, CredentialScope};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub skill_matches_deleted: u64,
    pub recommendations_deleted: u64,
    pub roadmaps_deleted: u64,
}

/// Cascade for an edit to a job's requirement fields or skill list.
///
/// Touches rows owned by other users, so it needs the elevated handle.
/// Compatibility snapshots are left alone.
pub async fn invalidate_job(
    store: &dyn AnalysisStore,
    job_id: Uuid,
) -> Result<InvalidationReport, AppError> {
    require_id(job_id, "job")?;
    if store.scope() != CredentialScope::Elevated {
        return Err(AppError::Unauthorized);
    }

    let caps = store.capabilities();
    let mut report = InvalidationReport::default();

    if caps.skill_match_cache {
        report.skill_matches_deleted = store.delete_skill_matches_for_job(job_id).await?;
    }
    if caps.recommendation_cache {
        report.recommendations_deleted = store.delete_recommendations_for_job(job_id).await?;
    }
    if caps.roadmap_cache {
        let candidates = store.candidates_interested_in(job_id).await?;
        if !candidates.is_empty() {
            report.roadmaps_deleted = store.delete_roadmaps(&candidates).await?;
        }
    }

    info!(
        "Invalidated job {job_id}: {} skill matches, {} recommendation sets, {} roadmaps",
        report.skill_matches_deleted, report.recommendations_deleted, report.roadmaps_deleted
    );
    Ok(report)
}

/// Force re-analysis of one pair: only its skill match row goes.
pub async fn invalidate_reanalysis(
    store: &dyn AnalysisStore,
    job_id: Uuid,
    candidate_id: Uuid,
) -> Result<u64, AppError> {
    require_id(job_id, "job")?;
    require_id(candidate_id, "candidate")?;
    if !store.capabilities().skill_match_cache {
        return Ok(0);
    }
    let deleted = store.delete_skill_match(job_id, candidate_id).await?;
    info!("Cleared skill match for job {job_id} / candidate {candidate_id} ({deleted} rows)");
    Ok(deleted)
}

/// The candidate added or removed an interested job.
pub async fn invalidate_candidate_roadmap(
    store: &dyn AnalysisStore,
    candidate_id: Uuid,
) -> Result<u64, AppError> {
    require_id(candidate_id, "candidate")?;
    if !store.capabilities().roadmap_cache {
        return Ok(0);
    }
    let deleted = store.delete_roadmaps(&[candidate_id]).await?;
    info!("Cleared roadmap for candidate {candidate_id} after interest change");
    Ok(deleted)
}
