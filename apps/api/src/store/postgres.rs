//! Postgres-backed `AnalysisStore`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::analysis::{
    CompatibilityAnalysis, MatchedSkill, MissingSkill, SkillMatchAnalysis, SkillRecommendation,
    SkillRecommendationCache,
};
use crate::models::application::Application;
use crate::models::candidate::{CandidateProfile, CandidateSkill, Certification, Education, Experience};
use crate::models::job::{Job, JobSkill};
use crate::models::roadmap::{CareerPath, LearningRoadmap, RoadmapPhase, SkillGapAnalysis};
use crate::store::{AnalysisStore, CredentialScope, StoreCapabilities};

/// Session setting read by the row-level security policies.
const CALLER_SETTING: &str = "app.current_user_id";

const JOB_COLUMNS: &str = "id, title, description, responsibilities, qualifications, \
     required_skills, min_experience_years, updated_at";

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    responsibilities: Option<String>,
    qualifications: Option<String>,
    required_skills: Option<Json<Vec<JobSkill>>>,
    min_experience_years: Option<i32>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            responsibilities: row.responsibilities.unwrap_or_default(),
            qualifications: row.qualifications.unwrap_or_default(),
            required_skills: row.required_skills.map(|j| j.0).unwrap_or_default(),
            min_experience_years: row.min_experience_years,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    bio: Option<String>,
    skills: Option<Json<Vec<CandidateSkill>>>,
    experience: Option<Json<Vec<Experience>>>,
    education: Option<Json<Vec<Education>>>,
    certifications: Option<Json<Vec<Certification>>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<CandidateRow> for CandidateProfile {
    fn from(row: CandidateRow) -> Self {
        CandidateProfile {
            id: row.id,
            bio: row.bio.unwrap_or_default(),
            skills: row.skills.map(|j| j.0).unwrap_or_default(),
            experience: row.experience.map(|j| j.0).unwrap_or_default(),
            education: row.education.map(|j| j.0).unwrap_or_default(),
            certifications: row.certifications.map(|j| j.0).unwrap_or_default(),
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    candidate_id: Uuid,
    compatibility_analysis: Option<Json<CompatibilityAnalysis>>,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Application {
            id: row.id,
            job_id: row.job_id,
            candidate_id: row.candidate_id,
            compatibility: row.compatibility_analysis.map(|j| j.0),
        }
    }
}

#[derive(Debug, FromRow)]
struct SkillMatchRow {
    job_id: Uuid,
    candidate_id: Uuid,
    matching_skills: Json<Vec<MatchedSkill>>,
    missing_skills: Json<Vec<MissingSkill>>,
    match_percentage: f64,
    analysis_date: DateTime<Utc>,
}

impl From<SkillMatchRow> for SkillMatchAnalysis {
    fn from(row: SkillMatchRow) -> Self {
        SkillMatchAnalysis {
            job_id: row.job_id,
            candidate_id: row.candidate_id,
            matching_skills: row.matching_skills.0,
            missing_skills: row.missing_skills.0,
            match_percentage: row.match_percentage,
            analysis_date: row.analysis_date,
        }
    }
}

#[derive(Debug, FromRow)]
struct RecommendationRow {
    job_id: Uuid,
    candidate_id: Uuid,
    recommendations: Json<Vec<SkillRecommendation>>,
    generated_date: DateTime<Utc>,
}

impl From<RecommendationRow> for SkillRecommendationCache {
    fn from(row: RecommendationRow) -> Self {
        SkillRecommendationCache {
            job_id: row.job_id,
            candidate_id: row.candidate_id,
            recommendations: row.recommendations.0,
            generated_date: row.generated_date,
        }
    }
}

#[derive(Debug, FromRow)]
struct RoadmapRow {
    candidate_id: Uuid,
    skill_gap_analysis: Json<SkillGapAnalysis>,
    phases: Json<Vec<RoadmapPhase>>,
    career_paths: Json<Vec<CareerPath>>,
    source_job_ids: Vec<Uuid>,
    total_duration_weeks: i32,
    generated_date: DateTime<Utc>,
}

impl From<RoadmapRow> for LearningRoadmap {
    fn from(row: RoadmapRow) -> Self {
        LearningRoadmap {
            candidate_id: row.candidate_id,
            skill_gap_analysis: row.skill_gap_analysis.0,
            phases: row.phases.0,
            career_paths: row.career_paths.0,
            source_job_ids: row.source_job_ids,
            total_duration_weeks: row.total_duration_weeks.max(0) as u32,
            generated_date: row.generated_date,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

/// A store handle bound to one pool and one credential scope.
/// Cheap to construct: the pool is reference-counted.
#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
    scope: CredentialScope,
    capabilities: StoreCapabilities,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool, scope: CredentialScope, capabilities: StoreCapabilities) -> Self {
        Self {
            pool,
            scope,
            capabilities,
        }
    }

    /// Opens a transaction. Caller-scoped handles pin the caller identity for
    /// the row-level policies before any statement runs.
    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        if let CredentialScope::Caller(user_id) = self.scope {
            sqlx::query("SELECT set_config($1, $2, true)")
                .bind(CALLER_SETTING)
                .bind(user_id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        Ok(tx)
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    fn scope(&self) -> CredentialScope {
        self.scope
    }

    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    async fn fetch_job(&self, job_id: Uuid) -> Result<Option<Job>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(Job::from))
    }

    async fn fetch_candidate(&self, candidate_id: Uuid) -> Result<Option<CandidateProfile>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, bio, skills, experience, education, certifications, updated_at
            FROM candidate_profiles
            WHERE id = $1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(CandidateProfile::from))
    }

    async fn fetch_application(&self, application_id: Uuid) -> Result<Option<Application>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT id, job_id, candidate_id, compatibility_analysis FROM applications WHERE id = $1",
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(Application::from))
    }

    async fn find_application(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Application>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, job_id, candidate_id, compatibility_analysis
            FROM applications
            WHERE job_id = $1 AND candidate_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(job_id)
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(Application::from))
    }

    async fn applications_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Application>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT id, job_id, candidate_id, compatibility_analysis FROM applications WHERE candidate_id = $1",
        )
        .bind(candidate_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows.into_iter().map(Application::from).collect())
    }

    async fn interested_jobs(&self, candidate_id: Uuid) -> Result<Vec<Job>> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE id IN (
                SELECT job_id FROM candidate_interested_jobs WHERE candidate_id = $1
            )
            ORDER BY id
            "#
        ))
        .bind(candidate_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows.into_iter().map(Job::from).collect())
    }

    async fn candidates_interested_in(&self, job_id: Uuid) -> Result<Vec<Uuid>> {
        let mut tx = self.begin().await?;
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT candidate_id FROM candidate_interested_jobs WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(ids)
    }

    async fn save_compatibility(
        &self,
        application_id: Uuid,
        analysis: &CompatibilityAnalysis,
    ) -> Result<()> {
        let mut tx = self.begin().await?;
        sqlx::query(
            r#"
            UPDATE applications
            SET compatibility_score = $2,
                compatibility_analysis = $3,
                analyzed_at = $4
            WHERE id = $1
            "#,
        )
        .bind(application_id)
        .bind(analysis.score)
        .bind(Json(analysis))
        .bind(analysis.analyzed_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn clear_compatibility(&self, application_id: Uuid) -> Result<()> {
        let mut tx = self.begin().await?;
        sqlx::query(
            r#"
            UPDATE applications
            SET compatibility_score = NULL,
                compatibility_analysis = NULL,
                analyzed_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(application_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_skill_match(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<SkillMatchAnalysis>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, SkillMatchRow>(
            r#"
            SELECT job_id, candidate_id, matching_skills, missing_skills,
                   match_percentage, analysis_date
            FROM skill_match_analyses
            WHERE job_id = $1 AND candidate_id = $2
            "#,
        )
        .bind(job_id)
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(SkillMatchAnalysis::from))
    }

    async fn upsert_skill_match(&self, analysis: &SkillMatchAnalysis) -> Result<()> {
        let mut tx = self.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO skill_match_analyses
                (job_id, candidate_id, matching_skills, missing_skills,
                 match_percentage, analysis_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (job_id, candidate_id) DO UPDATE SET
                matching_skills = EXCLUDED.matching_skills,
                missing_skills = EXCLUDED.missing_skills,
                match_percentage = EXCLUDED.match_percentage,
                analysis_date = EXCLUDED.analysis_date
            "#,
        )
        .bind(analysis.job_id)
        .bind(analysis.candidate_id)
        .bind(Json(&analysis.matching_skills))
        .bind(Json(&analysis.missing_skills))
        .bind(analysis.match_percentage)
        .bind(analysis.analysis_date)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_skill_match(&self, job_id: Uuid, candidate_id: Uuid) -> Result<u64> {
        let mut tx = self.begin().await?;
        let result = sqlx::query(
            "DELETE FROM skill_match_analyses WHERE job_id = $1 AND candidate_id = $2",
        )
        .bind(job_id)
        .bind(candidate_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn delete_skill_matches_for_job(&self, job_id: Uuid) -> Result<u64> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("DELETE FROM skill_match_analyses WHERE job_id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn fetch_recommendations(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<SkillRecommendationCache>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, RecommendationRow>(
            r#"
            SELECT job_id, candidate_id, recommendations, generated_date
            FROM skill_recommendation_cache
            WHERE job_id = $1 AND candidate_id = $2
            "#,
        )
        .bind(job_id)
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(SkillRecommendationCache::from))
    }

    async fn upsert_recommendations(&self, cache: &SkillRecommendationCache) -> Result<()> {
        let mut tx = self.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO skill_recommendation_cache
                (job_id, candidate_id, recommendations, generated_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (job_id, candidate_id) DO UPDATE SET
                recommendations = EXCLUDED.recommendations,
                generated_date = EXCLUDED.generated_date
            "#,
        )
        .bind(cache.job_id)
        .bind(cache.candidate_id)
        .bind(Json(&cache.recommendations))
        .bind(cache.generated_date)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_recommendations_for_job(&self, job_id: Uuid) -> Result<u64> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("DELETE FROM skill_recommendation_cache WHERE job_id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn fetch_roadmap(&self, candidate_id: Uuid) -> Result<Option<LearningRoadmap>> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, RoadmapRow>(
            r#"
            SELECT candidate_id, skill_gap_analysis, phases, career_paths,
                   source_job_ids, total_duration_weeks, generated_date
            FROM learning_roadmaps
            WHERE candidate_id = $1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(LearningRoadmap::from))
    }

    async fn upsert_roadmap(&self, roadmap: &LearningRoadmap) -> Result<()> {
        let mut tx = self.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO learning_roadmaps
                (candidate_id, skill_gap_analysis, phases, career_paths,
                 source_job_ids, total_duration_weeks, generated_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (candidate_id) DO UPDATE SET
                skill_gap_analysis = EXCLUDED.skill_gap_analysis,
                phases = EXCLUDED.phases,
                career_paths = EXCLUDED.career_paths,
                source_job_ids = EXCLUDED.source_job_ids,
                total_duration_weeks = EXCLUDED.total_duration_weeks,
                generated_date = EXCLUDED.generated_date
            "#,
        )
        .bind(roadmap.candidate_id)
        .bind(Json(&roadmap.skill_gap_analysis))
        .bind(Json(&roadmap.phases))
        .bind(Json(&roadmap.career_paths))
        .bind(&roadmap.source_job_ids)
        .bind(roadmap.total_duration_weeks as i32)
        .bind(roadmap.generated_date)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_roadmaps(&self, candidate_ids: &[Uuid]) -> Result<u64> {
        if candidate_ids.is_empty() {
            return Ok(0);
        }
        let mut tx = self.begin().await?;
        let result = sqlx::query("DELETE FROM learning_roadmaps WHERE candidate_id = ANY($1)")
            .bind(candidate_ids)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
