//! Skill Match Analyzer: matched vs. missing job skills for one
//! (job, candidate) pair.
//!
//! Name variants are resolved by the inference provider. The percentage is
//! computed locally over `Required` skills only, so preferred or
//! nice-to-have gaps never lower it.
//!
//! Cache: fixed 7-day TTL keyed by (job_id, candidate_id).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::aggregator::{held_skill_index, normalize_skill};
use crate::analysis::provider::{InferenceProvider, RawSkillMatch};
use crate::analysis::staleness::{is_valid, StalenessPolicy};
use crate::analysis::{load_candidate, load_job};
use crate::errors::{AnalysisError, AppError};
use crate::models::analysis::{MatchedSkill, MissingSkill, SkillMatchAnalysis};
use crate::models::candidate::CandidateProfile;
use crate::models::job::{Job, JobSkill, SkillImportance};
use crate::store::AnalysisStore;

/// Percentage of distinct `Required` job skills that were matched, rounded
/// to two decimals. 100 when the job requires nothing.
pub fn required_match_percentage(job_skills: &[JobSkill], matched: &[MatchedSkill]) -> f64 {
    let required: HashSet<String> = job_skills
        .iter()
        .filter(|s| s.importance == SkillImportance::Required)
        .map(|s| normalize_skill(&s.name))
        .collect();
    if required.is_empty() {
        return 100.0;
    }

    let matched_required = matched
        .iter()
        .map(|m| normalize_skill(&m.skill))
        .filter(|key| required.contains(key))
        .collect::<HashSet<_>>()
        .len();

    let pct = matched_required as f64 / required.len() as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Builds the record from a raw provider response.
///
/// Matches naming skills the job does not list are dropped; job skills the
/// provider left out of both lists are reported missing.
pub fn build_skill_match(
    job: &Job,
    candidate: &CandidateProfile,
    raw: RawSkillMatch,
    analysis_date: DateTime<Utc>,
) -> Result<SkillMatchAnalysis, AnalysisError> {
    let raw_matching = raw
        .matching_skills
        .ok_or_else(|| AnalysisError::Malformed("missing 'matching_skills'".to_string()))?;
    if raw.missing_skills.is_none() {
        return Err(AnalysisError::Malformed("missing 'missing_skills'".to_string()));
    }

    let job_index: HashMap<String, &JobSkill> = job
        .required_skills
        .iter()
        .map(|s| (normalize_skill(&s.name), s))
        .collect();
    let held = held_skill_index(&candidate.skills);

    let mut matched_keys: HashSet<String> = HashSet::new();
    let mut matching_skills = Vec::new();
    for entry in raw_matching {
        let key = normalize_skill(&entry.job_skill);
        let Some(job_skill) = job_index.get(&key) else {
            warn!("Dropping match for '{}', not a skill of job {}", entry.job_skill, job.id);
            continue;
        };
        if !matched_keys.insert(key.clone()) {
            continue;
        }
        let held_key = entry
            .candidate_skill
            .as_deref()
            .map(normalize_skill)
            .unwrap_or(key);
        matching_skills.push(MatchedSkill {
            skill: job_skill.name.clone(),
            candidate_level: held.get(&held_key).copied(),
            job_requirement: job_skill.importance,
            match_quality: entry.match_quality,
        });
    }

    let mut seen_missing: HashSet<String> = HashSet::new();
    let missing_skills: Vec<MissingSkill> = job
        .required_skills
        .iter()
        .filter(|s| {
            let key = normalize_skill(&s.name);
            !matched_keys.contains(&key) && seen_missing.insert(key)
        })
        .map(|s| MissingSkill {
            skill: s.name.clone(),
            importance: s.importance,
        })
        .collect();

    let match_percentage = required_match_percentage(&job.required_skills, &matching_skills);

    Ok(SkillMatchAnalysis {
        job_id: job.id,
        candidate_id: candidate.id,
        matching_skills,
        missing_skills,
        match_percentage,
        analysis_date,
    })
}

/// Runs one skill match. Skips the provider when either side has no skills.
pub async fn analyze_skill_match(
    provider: &dyn InferenceProvider,
    job: &Job,
    candidate: &CandidateProfile,
) -> Result<SkillMatchAnalysis, AnalysisError> {
    let raw = if job.required_skills.is_empty() || candidate.skills.is_empty() {
        debug!("Skill match for job {} needs no inference", job.id);
        RawSkillMatch {
            matching_skills: Some(vec![]),
            missing_skills: Some(vec![]),
        }
    } else {
        provider
            .match_skills(&job.required_skills, &candidate.skills)
            .await?
    };
    build_skill_match(job, candidate, raw, Utc::now())
}

pub async fn get_or_compute_skill_match(
    store: &dyn AnalysisStore,
    provider: &dyn InferenceProvider,
    job_id: Uuid,
    candidate_id: Uuid,
) -> Result<SkillMatchAnalysis, AppError> {
    let job = load_job(store, job_id).await?;
    let candidate = load_candidate(store, candidate_id).await?;
    let cache_enabled = store.capabilities().skill_match_cache;

    if cache_enabled {
        let cached = store.fetch_skill_match(job_id, candidate_id).await?;
        if is_valid(cached.as_ref(), &StalenessPolicy::cache_ttl(), Utc::now()) {
            debug!("Skill match cache hit for job {job_id} / candidate {candidate_id}");
            if let Some(cached) = cached {
                return Ok(cached);
            }
        }
    }

    let analysis = analyze_skill_match(provider, &job, &candidate).await?;
    info!(
        "Skill match computed: {:.2}% for job {job_id} / candidate {candidate_id}",
        analysis.match_percentage
    );

    if cache_enabled {
        if let Err(e) = store.upsert_skill_match(&analysis).await {
            warn!("Failed to persist skill match for job {job_id} / candidate {candidate_id}: {e:#}");
        }
    }

    Ok(analysis)
}
