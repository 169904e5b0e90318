//! Shared fixtures for analysis tests: a scripted `InferenceProvider` with
//! per-operation call counters, and builders for jobs and candidates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::analysis::provider::{
    InferenceProvider, RawAliases, RawBreakdown, RawCompatibility, RawExtractedSkills,
    RawMatchedSkill, RawMissingSkill, RawRecommendation, RawRecommendations, RawSkillMatch, SkillAlias,
};
use crate::errors::AnalysisError;
use crate::models::analysis::{Difficulty, LearningResource, MatchQuality, MissingSkill};
use crate::models::candidate::{CandidateProfile, CandidateSkill, SkillLevel};
use crate::models::job::{Job, JobSkill, SkillImportance};

#[derive(Default)]
pub struct Calls {
    pub compatibility: AtomicUsize,
    pub skill_match: AtomicUsize,
    pub recommendations: AtomicUsize,
    pub aliases: AtomicUsize,
    pub extraction: AtomicUsize,
}

impl Calls {
    pub fn compatibility(&self) -> usize {
        self.compatibility.load(Ordering::SeqCst)
    }

    pub fn skill_match(&self) -> usize {
        self.skill_match.load(Ordering::SeqCst)
    }

    pub fn recommendations(&self) -> usize {
        self.recommendations.load(Ordering::SeqCst)
    }

    pub fn aliases(&self) -> usize {
        self.aliases.load(Ordering::SeqCst)
    }

    pub fn extraction(&self) -> usize {
        self.extraction.load(Ordering::SeqCst)
    }
}

/// Deterministic provider.
///
/// - compatibility returns `compatibility` (default: score 75 with a full breakdown)
/// - skill matching matches job skills to candidate skills by case-insensitive
///   name, or through `aliases`, and reports the rest missing
/// - recommendations echo one entry per requested skill, except those in
///   `unanswered`
/// - extraction returns `extracted` for any job
pub struct FakeProvider {
    pub calls: Calls,
    pub compatibility: Mutex<RawCompatibility>,
    pub aliases: Mutex<HashMap<String, String>>, // required -> held
    pub extracted: Mutex<Vec<JobSkill>>,
    pub unanswered: Mutex<Vec<String>>,
    pub fail_all: Mutex<bool>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            calls: Calls::default(),
            compatibility: Mutex::new(raw_compatibility(json!(75))),
            aliases: Mutex::new(HashMap::new()),
            extracted: Mutex::new(Vec::new()),
            unanswered: Mutex::new(Vec::new()),
            fail_all: Mutex::new(false),
        }
    }
}

impl FakeProvider {
    pub fn with_alias(self, required: &str, held: &str) -> Self {
        self.aliases
            .lock()
            .unwrap()
            .insert(required.to_string(), held.to_string());
        self
    }

    pub fn without_recommendation_for(self, skill: &str) -> Self {
        self.unanswered.lock().unwrap().push(skill.to_string());
        self
    }

    pub fn set_compatibility(&self, raw: RawCompatibility) {
        *self.compatibility.lock().unwrap() = raw;
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail_all.lock().unwrap() = fail;
    }

    fn check(&self) -> Result<(), AnalysisError> {
        if *self.fail_all.lock().unwrap() {
            Err(AnalysisError::Malformed("scripted failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl InferenceProvider for FakeProvider {
    async fn score_compatibility(
        &self,
        _job: &Job,
        _candidate: &CandidateProfile,
    ) -> Result<RawCompatibility, AnalysisError> {
        self.calls.compatibility.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.compatibility.lock().unwrap().clone())
    }

    async fn match_skills(
        &self,
        job_skills: &[JobSkill],
        candidate_skills: &[CandidateSkill],
    ) -> Result<RawSkillMatch, AnalysisError> {
        self.calls.skill_match.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let aliases = self.aliases.lock().unwrap().clone();
        let mut matching = Vec::new();
        let mut missing = Vec::new();
        for js in job_skills {
            let exact = candidate_skills
                .iter()
                .find(|cs| cs.name.eq_ignore_ascii_case(&js.name));
            let via_alias = aliases.get(&js.name).and_then(|held| {
                candidate_skills
                    .iter()
                    .find(|cs| cs.name.eq_ignore_ascii_case(held))
            });
            match (exact, via_alias) {
                (Some(cs), _) => matching.push(RawMatchedSkill {
                    job_skill: js.name.clone(),
                    candidate_skill: Some(cs.name.clone()),
                    match_quality: MatchQuality::Exact,
                }),
                (None, Some(cs)) => matching.push(RawMatchedSkill {
                    job_skill: js.name.clone(),
                    candidate_skill: Some(cs.name.clone()),
                    match_quality: MatchQuality::Similar,
                }),
                (None, None) => missing.push(RawMissingSkill {
                    skill: js.name.clone(),
                }),
            }
        }
        Ok(RawSkillMatch {
            matching_skills: Some(matching),
            missing_skills: Some(missing),
        })
    }

    async fn recommend_learning(
        &self,
        skills: &[MissingSkill],
    ) -> Result<RawRecommendations, AnalysisError> {
        self.calls.recommendations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let unanswered = self.unanswered.lock().unwrap().clone();
        Ok(RawRecommendations {
            recommendations: Some(
                skills
                    .iter()
                    .filter(|s| !unanswered.iter().any(|u| u.eq_ignore_ascii_case(&s.skill)))
                    .map(|s| RawRecommendation {
                        skill: Some(s.skill.clone()),
                        learning_path: Some(format!("Learn {} step by step", s.skill)),
                        resources: Some(vec![LearningResource {
                            title: format!("{} fundamentals", s.skill),
                            kind: "course".to_string(),
                            url: None,
                        }]),
                        time_estimate: Some("3 weeks".to_string()),
                        difficulty: Some(Difficulty::Intermediate),
                    })
                    .collect(),
            ),
        })
    }

    async fn resolve_skill_aliases(
        &self,
        required: &[String],
        held: &[String],
    ) -> Result<RawAliases, AnalysisError> {
        self.calls.aliases.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let aliases = self.aliases.lock().unwrap();
        Ok(RawAliases {
            aliases: Some(
                required
                    .iter()
                    .filter_map(|r| {
                        aliases.get(r).filter(|h| held.contains(h)).map(|h| SkillAlias {
                            required: r.clone(),
                            held: h.clone(),
                        })
                    })
                    .collect(),
            ),
        })
    }

    async fn extract_job_skills(&self, _job: &Job) -> Result<RawExtractedSkills, AnalysisError> {
        self.calls.extraction.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(RawExtractedSkills {
            skills: Some(self.extracted.lock().unwrap().clone()),
        })
    }
}

pub fn raw_compatibility(score: serde_json::Value) -> RawCompatibility {
    RawCompatibility {
        score: Some(score),
        breakdown: Some(RawBreakdown {
            skills: Some(json!(80)),
            experience: Some(json!(70)),
            education: Some(json!(60)),
            overall: Some(json!(75)),
        }),
        strengths: vec!["Strong Rust background".to_string()],
        skill_gaps: vec!["Kubernetes".to_string()],
        experience_gaps: vec![],
        recommendations: vec!["Ship a k8s side project".to_string()],
        summary: Some("Solid fit.".to_string()),
    }
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

pub fn job_skill(name: &str, importance: SkillImportance) -> JobSkill {
    JobSkill {
        name: name.to_string(),
        importance,
        min_level: None,
    }
}

pub fn job(title: &str, skills: Vec<JobSkill>) -> Job {
    Job {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: String::new(),
        responsibilities: String::new(),
        qualifications: String::new(),
        required_skills: skills,
        min_experience_years: None,
        updated_at: Some(ts(0)),
    }
}

pub fn candidate(skills: &[(&str, SkillLevel)]) -> CandidateProfile {
    CandidateProfile {
        id: Uuid::new_v4(),
        bio: "Backend engineer".to_string(),
        skills: skills
            .iter()
            .map(|(name, level)| CandidateSkill {
                name: name.to_string(),
                level: *level,
            })
            .collect(),
        experience: vec![],
        education: vec![],
        certifications: vec![],
        updated_at: Some(ts(0)),
    }
}
