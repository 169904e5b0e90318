//! In-memory `AnalysisStore` for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::analysis::{CompatibilityAnalysis, SkillMatchAnalysis, SkillRecommendationCache};
use crate::models::application::Application;
use crate::models::candidate::CandidateProfile;
use crate::models::job::Job;
use crate::models::roadmap::LearningRoadmap;
use crate::store::{AnalysisStore, CredentialScope, StoreCapabilities};

#[derive(Default)]
struct Tables {
    jobs: HashMap<Uuid, Job>,
    candidates: HashMap<Uuid, CandidateProfile>,
    applications: HashMap<Uuid, Application>,
    interests: Vec<(Uuid, Uuid)>, // (candidate_id, job_id)
    skill_matches: HashMap<(Uuid, Uuid), SkillMatchAnalysis>,
    recommendations: HashMap<(Uuid, Uuid), SkillRecommendationCache>,
    roadmaps: HashMap<Uuid, LearningRoadmap>,
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    scope: CredentialScope,
    capabilities: StoreCapabilities,
    fail_writes: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capabilities(StoreCapabilities::all())
    }
}

impl MemoryStore {
    pub fn with_capabilities(capabilities: StoreCapabilities) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            scope: CredentialScope::Elevated,
            capabilities,
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn with_scope(mut self, scope: CredentialScope) -> Self {
        self.scope = scope;
        self
    }

    /// Makes every subsequent cache write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn put_job(&self, job: Job) {
        self.tables.lock().unwrap().jobs.insert(job.id, job);
    }

    pub fn put_candidate(&self, candidate: CandidateProfile) {
        self.tables
            .lock()
            .unwrap()
            .candidates
            .insert(candidate.id, candidate);
    }

    pub fn put_application(&self, application: Application) {
        self.tables
            .lock()
            .unwrap()
            .applications
            .insert(application.id, application);
    }

    pub fn add_interest(&self, candidate_id: Uuid, job_id: Uuid) {
        self.tables
            .lock()
            .unwrap()
            .interests
            .push((candidate_id, job_id));
    }

    pub fn remove_interest(&self, candidate_id: Uuid, job_id: Uuid) {
        self.tables
            .lock()
            .unwrap()
            .interests
            .retain(|pair| *pair != (candidate_id, job_id));
    }

    pub fn application(&self, application_id: Uuid) -> Option<Application> {
        self.tables
            .lock()
            .unwrap()
            .applications
            .get(&application_id)
            .cloned()
    }

    pub fn skill_match_count(&self) -> usize {
        self.tables.lock().unwrap().skill_matches.len()
    }

    pub fn recommendation_count(&self) -> usize {
        self.tables.lock().unwrap().recommendations.len()
    }

    pub fn roadmap_count(&self) -> usize {
        self.tables.lock().unwrap().roadmaps.len()
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(anyhow!("simulated write failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    fn scope(&self) -> CredentialScope {
        self.scope
    }

    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    async fn fetch_job(&self, job_id: Uuid) -> Result<Option<Job>> {
        Ok(self.tables.lock().unwrap().jobs.get(&job_id).cloned())
    }

    async fn fetch_candidate(&self, candidate_id: Uuid) -> Result<Option<CandidateProfile>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .candidates
            .get(&candidate_id)
            .cloned())
    }

    async fn fetch_application(&self, application_id: Uuid) -> Result<Option<Application>> {
        Ok(self.application(application_id))
    }

    async fn find_application(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Application>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .applications
            .values()
            .find(|a| a.job_id == job_id && a.candidate_id == candidate_id)
            .cloned())
    }

    async fn applications_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Application>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .applications
            .values()
            .filter(|a| a.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    async fn interested_jobs(&self, candidate_id: Uuid) -> Result<Vec<Job>> {
        let tables = self.tables.lock().unwrap();
        let jobs = tables
            .interests
            .iter()
            .filter(|(c, _)| *c == candidate_id)
            .filter_map(|(_, job_id)| tables.jobs.get(job_id).cloned())
            .collect();
        Ok(jobs)
    }

    async fn candidates_interested_in(&self, job_id: Uuid) -> Result<Vec<Uuid>> {
        let tables = self.tables.lock().unwrap();
        let mut ids: Vec<Uuid> = tables
            .interests
            .iter()
            .filter(|(_, j)| *j == job_id)
            .map(|(c, _)| *c)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn save_compatibility(
        &self,
        application_id: Uuid,
        analysis: &CompatibilityAnalysis,
    ) -> Result<()> {
        self.check_write()?;
        if let Some(app) = self
            .tables
            .lock()
            .unwrap()
            .applications
            .get_mut(&application_id)
        {
            app.compatibility = Some(analysis.clone());
        }
        Ok(())
    }

    async fn clear_compatibility(&self, application_id: Uuid) -> Result<()> {
        if let Some(app) = self
            .tables
            .lock()
            .unwrap()
            .applications
            .get_mut(&application_id)
        {
            app.compatibility = None;
        }
        Ok(())
    }

    async fn fetch_skill_match(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<SkillMatchAnalysis>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .skill_matches
            .get(&(job_id, candidate_id))
            .cloned())
    }

    async fn upsert_skill_match(&self, analysis: &SkillMatchAnalysis) -> Result<()> {
        self.check_write()?;
        self.tables
            .lock()
            .unwrap()
            .skill_matches
            .insert((analysis.job_id, analysis.candidate_id), analysis.clone());
        Ok(())
    }

    async fn delete_skill_match(&self, job_id: Uuid, candidate_id: Uuid) -> Result<u64> {
        let removed = self
            .tables
            .lock()
            .unwrap()
            .skill_matches
            .remove(&(job_id, candidate_id));
        Ok(removed.map_or(0, |_| 1))
    }

    async fn delete_skill_matches_for_job(&self, job_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.skill_matches.len();
        tables.skill_matches.retain(|(j, _), _| *j != job_id);
        Ok((before - tables.skill_matches.len()) as u64)
    }

    async fn fetch_recommendations(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<SkillRecommendationCache>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .recommendations
            .get(&(job_id, candidate_id))
            .cloned())
    }

    async fn upsert_recommendations(&self, cache: &SkillRecommendationCache) -> Result<()> {
        self.check_write()?;
        self.tables
            .lock()
            .unwrap()
            .recommendations
            .insert((cache.job_id, cache.candidate_id), cache.clone());
        Ok(())
    }

    async fn delete_recommendations_for_job(&self, job_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.recommendations.len();
        tables.recommendations.retain(|(j, _), _| *j != job_id);
        Ok((before - tables.recommendations.len()) as u64)
    }

    async fn fetch_roadmap(&self, candidate_id: Uuid) -> Result<Option<LearningRoadmap>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .roadmaps
            .get(&candidate_id)
            .cloned())
    }

    async fn upsert_roadmap(&self, roadmap: &LearningRoadmap) -> Result<()> {
        self.check_write()?;
        self.tables
            .lock()
            .unwrap()
            .roadmaps
            .insert(roadmap.candidate_id, roadmap.clone());
        Ok(())
    }

    async fn delete_roadmaps(&self, candidate_ids: &[Uuid]) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let removed = candidate_ids
            .iter()
            .filter(|id| tables.roadmaps.remove(id).is_some())
            .count();
        Ok(removed as u64)
    }
}
