//! Repository interface over the relational store.
//!
//! Handles are never process-wide singletons: each one is built for a
//! specific `CredentialScope` and handed to the analysis service per call.
//! Caller-scoped handles are built per request by the `CallerStore`
//! extractor; the elevated handle is used for cascading deletes and for
//! background work that has no caller.
//!
//! Reads return `Option`/empty collections on a miss. A miss is a valid
//! "absent" state, never an error.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::models::analysis::{CompatibilityAnalysis, SkillMatchAnalysis, SkillRecommendationCache};
use crate::models::application::Application;
use crate::models::candidate::CandidateProfile;
use crate::models::job::Job;
use crate::models::roadmap::LearningRoadmap;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Which database role a store handle acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum CredentialScope {
    /// Subject to row-level access policy for this user.
    Caller(Uuid),
    /// Bypasses row-level policy. Used for cross-entity writes.
    Elevated,
}

/// Optional cache tables present in the connected database.
/// Resolved once at startup; a disabled cache means "always compute, never persist".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreCapabilities {
    pub skill_match_cache: bool,
    pub recommendation_cache: bool,
    pub roadmap_cache: bool,
}

impl StoreCapabilities {
    pub fn all() -> Self {
        Self {
            skill_match_cache: true,
            recommendation_cache: true,
            roadmap_cache: true,
        }
    }
}

pub type SharedStore = Arc<dyn AnalysisStore>;

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    fn scope(&self) -> CredentialScope;
    fn capabilities(&self) -> StoreCapabilities;

    // Upstream entities (read-only here)
    async fn fetch_job(&self, job_id: Uuid) -> Result<Option<Job>>;
    async fn fetch_candidate(&self, candidate_id: Uuid) -> Result<Option<CandidateProfile>>;
    async fn fetch_application(&self, application_id: Uuid) -> Result<Option<Application>>;
    async fn find_application(&self, job_id: Uuid, candidate_id: Uuid)
        -> Result<Option<Application>>;
    async fn applications_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Application>>;
    async fn interested_jobs(&self, candidate_id: Uuid) -> Result<Vec<Job>>;
    async fn candidates_interested_in(&self, job_id: Uuid) -> Result<Vec<Uuid>>;

    // Compatibility snapshot embedded in applications
    async fn save_compatibility(
        &self,
        application_id: Uuid,
        analysis: &CompatibilityAnalysis,
    ) -> Result<()>;
    async fn clear_compatibility(&self, application_id: Uuid) -> Result<()>;

    // Skill match cache
    async fn fetch_skill_match(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<SkillMatchAnalysis>>;
    async fn upsert_skill_match(&self, analysis: &SkillMatchAnalysis) -> Result<()>;
    async fn delete_skill_match(&self, job_id: Uuid, candidate_id: Uuid) -> Result<u64>;
    async fn delete_skill_matches_for_job(&self, job_id: Uuid) -> Result<u64>;

    // Recommendation cache
    async fn fetch_recommendations(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<SkillRecommendationCache>>;
    async fn upsert_recommendations(&self, cache: &SkillRecommendationCache) -> Result<()>;
    async fn delete_recommendations_for_job(&self, job_id: Uuid) -> Result<u64>;

    // Roadmap cache
    async fn fetch_roadmap(&self, candidate_id: Uuid) -> Result<Option<LearningRoadmap>>;
    async fn upsert_roadmap(&self, roadmap: &LearningRoadmap) -> Result<()>;
    async fn delete_roadmaps(&self, candidate_ids: &[Uuid]) -> Result<u64>;
}
