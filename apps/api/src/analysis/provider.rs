//! Inference Provider: the contract around the external model.
//!
//! The trait returns *raw* responses. Every analyzer validates the raw shape
//! before building a record, so validation holds for any backend.
//!
//! `AppState` holds an `Arc<dyn InferenceProvider>`; production uses
//! `LlmInferenceProvider`, tests use a scripted fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analysis::prompts::{
    ALIAS_PROMPT_TEMPLATE, COMPATIBILITY_PROMPT_TEMPLATE, COMPATIBILITY_SYSTEM,
    EXTRACT_SKILLS_PROMPT_TEMPLATE, RECOMMENDATION_PROMPT_TEMPLATE, SKILL_MATCH_PROMPT_TEMPLATE,
};
use crate::errors::AnalysisError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, SYNONYM_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::analysis::{Difficulty, LearningResource, MatchQuality, MissingSkill};
use crate::models::candidate::{CandidateProfile, CandidateSkill};
use crate::models::job::{Job, JobSkill};

// ────────────────────────────────────────────────────────────────────────────
// Raw response shapes
// ────────────────────────────────────────────────────────────────────────────

/// Numbers are kept as JSON values so a non-numeric score is reported as a
/// malformed response instead of a transport error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCompatibility {
    pub score: Option<Value>,
    pub breakdown: Option<RawBreakdown>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub skill_gaps: Vec<String>,
    #[serde(default)]
    pub experience_gaps: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBreakdown {
    pub skills: Option<Value>,
    pub experience: Option<Value>,
    pub education: Option<Value>,
    pub overall: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMatchedSkill {
    pub job_skill: String,
    #[serde(default)]
    pub candidate_skill: Option<String>,
    pub match_quality: MatchQuality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMissingSkill {
    pub skill: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSkillMatch {
    pub matching_skills: Option<Vec<RawMatchedSkill>>,
    pub missing_skills: Option<Vec<RawMissingSkill>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecommendation {
    pub skill: Option<String>,
    pub learning_path: Option<String>,
    pub resources: Option<Vec<LearningResource>>,
    pub time_estimate: Option<String>,
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecommendations {
    pub recommendations: Option<Vec<RawRecommendation>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAlias {
    pub required: String,
    pub held: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAliases {
    pub aliases: Option<Vec<SkillAlias>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExtractedSkills {
    pub skills: Option<Vec<JobSkill>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn score_compatibility(
        &self,
        job: &Job,
        candidate: &CandidateProfile,
    ) -> Result<RawCompatibility, AnalysisError>;

    async fn match_skills(
        &self,
        job_skills: &[JobSkill],
        candidate_skills: &[CandidateSkill],
    ) -> Result<RawSkillMatch, AnalysisError>;

    async fn recommend_learning(
        &self,
        skills: &[MissingSkill],
    ) -> Result<RawRecommendations, AnalysisError>;

    async fn resolve_skill_aliases(
        &self,
        required: &[String],
        held: &[String],
    ) -> Result<RawAliases, AnalysisError>;

    async fn extract_job_skills(&self, job: &Job) -> Result<RawExtractedSkills, AnalysisError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmInferenceProvider: Claude-backed implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmInferenceProvider(pub LlmClient);

impl LlmInferenceProvider {
    fn skill_system() -> String {
        format!("{JSON_ONLY_SYSTEM} {SYNONYM_INSTRUCTION}")
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AnalysisError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AnalysisError::Malformed(format!("could not serialise prompt input: {e}")))
}

#[async_trait]
impl InferenceProvider for LlmInferenceProvider {
    async fn score_compatibility(
        &self,
        job: &Job,
        candidate: &CandidateProfile,
    ) -> Result<RawCompatibility, AnalysisError> {
        let job_view = json!({
            "title": job.title,
            "description": job.description,
            "responsibilities": job.responsibilities,
            "qualifications": job.qualifications,
            "required_skills": job.required_skills,
            "min_experience_years": job.min_experience_years,
        });
        let candidate_view = json!({
            "bio": candidate.bio,
            "skills": candidate.skills,
            "experience": candidate.experience,
            "education": candidate.education,
            "certifications": candidate.certifications,
        });
        let prompt = COMPATIBILITY_PROMPT_TEMPLATE
            .replace("{job}", &to_json(&job_view)?)
            .replace("{candidate}", &to_json(&candidate_view)?);

        Ok(self.0.call_json(&prompt, COMPATIBILITY_SYSTEM).await?)
    }

    async fn match_skills(
        &self,
        job_skills: &[JobSkill],
        candidate_skills: &[CandidateSkill],
    ) -> Result<RawSkillMatch, AnalysisError> {
        let prompt = SKILL_MATCH_PROMPT_TEMPLATE
            .replace("{job_skills}", &to_json(job_skills)?)
            .replace("{candidate_skills}", &to_json(candidate_skills)?);

        Ok(self.0.call_json(&prompt, &Self::skill_system()).await?)
    }

    async fn recommend_learning(
        &self,
        skills: &[MissingSkill],
    ) -> Result<RawRecommendations, AnalysisError> {
        let prompt = RECOMMENDATION_PROMPT_TEMPLATE.replace("{skills}", &to_json(skills)?);
        Ok(self.0.call_json(&prompt, JSON_ONLY_SYSTEM).await?)
    }

    async fn resolve_skill_aliases(
        &self,
        required: &[String],
        held: &[String],
    ) -> Result<RawAliases, AnalysisError> {
        let prompt = ALIAS_PROMPT_TEMPLATE
            .replace("{required}", &to_json(required)?)
            .replace("{held}", &to_json(held)?);

        Ok(self.0.call_json(&prompt, &Self::skill_system()).await?)
    }

    async fn extract_job_skills(&self, job: &Job) -> Result<RawExtractedSkills, AnalysisError> {
        let job_view = json!({
            "title": job.title,
            "description": job.description,
            "responsibilities": job.responsibilities,
            "qualifications": job.qualifications,
        });
        let prompt = EXTRACT_SKILLS_PROMPT_TEMPLATE.replace("{job}", &to_json(&job_view)?);

        Ok(self.0.call_json(&prompt, &Self::skill_system()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_compatibility_keeps_non_numeric_score() {
        let raw: RawCompatibility =
            serde_json::from_str(r#"{"score": "high", "summary": "ok"}"#).unwrap();
        assert_eq!(raw.score, Some(Value::String("high".to_string())));
        assert!(raw.breakdown.is_none());
        assert!(raw.strengths.is_empty());
    }

    #[test]
    fn test_raw_skill_match_deserializes() {
        let raw: RawSkillMatch = serde_json::from_str(
            r#"{
                "matching_skills": [
                    {"job_skill": "React", "candidate_skill": "React.js", "match_quality": "similar"}
                ],
                "missing_skills": [{"skill": "GraphQL"}]
            }"#,
        )
        .unwrap();
        let matching = raw.matching_skills.unwrap();
        assert_eq!(matching[0].match_quality, MatchQuality::Similar);
        assert_eq!(matching[0].candidate_skill.as_deref(), Some("React.js"));
        assert_eq!(raw.missing_skills.unwrap()[0].skill, "GraphQL");
    }

    #[test]
    fn test_prompt_templates_carry_placeholders() {
        assert!(COMPATIBILITY_PROMPT_TEMPLATE.contains("{job}"));
        assert!(COMPATIBILITY_PROMPT_TEMPLATE.contains("{candidate}"));
        assert!(SKILL_MATCH_PROMPT_TEMPLATE.contains("{job_skills}"));
        assert!(RECOMMENDATION_PROMPT_TEMPLATE.contains("{skills}"));
        assert!(ALIAS_PROMPT_TEMPLATE.contains("{held}"));
        assert!(EXTRACT_SKILLS_PROMPT_TEMPLATE.contains("{job}"));
    }
}
