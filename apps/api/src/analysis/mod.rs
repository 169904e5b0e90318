// Compatibility / skill analysis caching and roadmap orchestration.
// Every inference call goes through `provider::InferenceProvider`; every
// read and write goes through a scoped `store::AnalysisStore` handle.

pub mod aggregator;
pub mod compatibility;
pub mod dispatcher;
pub mod handlers;
pub mod invalidation;
pub mod prompts;
pub mod provider;
pub mod recommendations;
pub mod roadmap;
pub mod skill_match;
pub mod staleness;
#[cfg(test)]
pub mod test_support;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateProfile;
use crate::models::job::Job;
use crate::store::AnalysisStore;

pub(crate) fn require_id(id: Uuid, what: &str) -> Result<(), AppError> {
    if id.is_nil() {
        return Err(AppError::Validation(format!("{what} id is required")));
    }
    Ok(())
}

/// Loads a job, rejecting unknown ids before any inference call is made.
pub(crate) async fn load_job(store: &dyn AnalysisStore, job_id: Uuid) -> Result<Job, AppError> {
    require_id(job_id, "job")?;
    store
        .fetch_job(job_id)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Job {job_id} does not exist")))
}

pub(crate) async fn load_candidate(
    store: &dyn AnalysisStore,
    candidate_id: Uuid,
) -> Result<CandidateProfile, AppError> {
    require_id(candidate_id, "candidate")?;
    store
        .fetch_candidate(candidate_id)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Candidate {candidate_id} does not exist")))
}
