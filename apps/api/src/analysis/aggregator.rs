//! Skill Aggregator: merges the skills of a candidate and a set of jobs into
//! one normalized comparison set.
//!
//! Exact matches (case-insensitive, whitespace-normalized) resolve locally.
//! Name variants are resolved through the inference provider, and only for
//! the names that did not match exactly.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::provider::InferenceProvider;
use crate::errors::AnalysisError;
use crate::models::candidate::{CandidateSkill, SkillLevel};
use crate::models::job::{Job, JobSkill, SkillImportance};

/// Lowercased, trimmed, single-spaced form used as the comparison key.
pub fn normalize_skill(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn importance_strength(importance: SkillImportance) -> u8 {
    match importance {
        SkillImportance::Required => 3,
        SkillImportance::Preferred => 2,
        SkillImportance::NiceToHave => 1,
    }
}

/// One required skill, merged across every job that asks for it.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSkill {
    /// Display name from the first job that listed it.
    pub name: String,
    pub key: String,
    /// Highest level any job asks for.
    pub target_level: SkillLevel,
    /// Strongest importance any job gives it.
    pub importance: SkillImportance,
    /// Jobs needing this skill, in the order they were supplied.
    pub required_by: Vec<Uuid>,
}

/// Unions the skills of `jobs`, deduplicated by normalized name, in order
/// of first appearance.
pub fn aggregate_job_skills(jobs: &[Job]) -> Vec<AggregatedSkill> {
    let mut merged: Vec<AggregatedSkill> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for job in jobs {
        for skill in &job.required_skills {
            let key = normalize_skill(&skill.name);
            if key.is_empty() {
                continue;
            }
            match index.get(&key) {
                Some(&i) => {
                    let entry = &mut merged[i];
                    entry.target_level = entry.target_level.max(skill.target_level());
                    if importance_strength(skill.importance) > importance_strength(entry.importance)
                    {
                        entry.importance = skill.importance;
                    }
                    if !entry.required_by.contains(&job.id) {
                        entry.required_by.push(job.id);
                    }
                }
                None => {
                    index.insert(key.clone(), merged.len());
                    merged.push(AggregatedSkill {
                        name: skill.name.trim().to_string(),
                        key,
                        target_level: skill.target_level(),
                        importance: skill.importance,
                        required_by: vec![job.id],
                    });
                }
            }
        }
    }

    merged
}

/// Candidate skills keyed by normalized name. Duplicates keep the highest level.
pub fn held_skill_index(held: &[CandidateSkill]) -> HashMap<String, SkillLevel> {
    let mut index: HashMap<String, SkillLevel> = HashMap::new();
    for skill in held {
        let key = normalize_skill(&skill.name);
        if key.is_empty() {
            continue;
        }
        index
            .entry(key)
            .and_modify(|level| *level = (*level).max(skill.level))
            .or_insert(skill.level);
    }
    index
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillStatus {
    New,
    Upgrade { current: SkillLevel },
    Sufficient { current: SkillLevel },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSkill {
    pub skill: AggregatedSkill,
    pub status: SkillStatus,
}

/// Classifies each required skill against the candidate's holdings.
/// `aliases` maps a required key to the held key it resolves to.
pub fn classify_skills(
    skills: &[AggregatedSkill],
    held: &HashMap<String, SkillLevel>,
    aliases: &HashMap<String, String>,
) -> Vec<ClassifiedSkill> {
    skills
        .iter()
        .map(|skill| {
            let current = held.get(&skill.key).copied().or_else(|| {
                aliases
                    .get(&skill.key)
                    .and_then(|held_key| held.get(held_key).copied())
            });
            let status = match current {
                None => SkillStatus::New,
                Some(level) if level < skill.target_level => SkillStatus::Upgrade { current: level },
                Some(level) => SkillStatus::Sufficient { current: level },
            };
            ClassifiedSkill {
                skill: skill.clone(),
                status,
            }
        })
        .collect()
}

/// Asks the provider which unmatched required skills the candidate holds
/// under another name. Skips the call when nothing is left to resolve.
pub async fn resolve_aliases(
    provider: &dyn InferenceProvider,
    skills: &[AggregatedSkill],
    held: &[CandidateSkill],
) -> Result<HashMap<String, String>, AnalysisError> {
    let held_index = held_skill_index(held);
    let unresolved: Vec<String> = skills
        .iter()
        .filter(|s| !held_index.contains_key(&s.key))
        .map(|s| s.name.clone())
        .collect();

    if unresolved.is_empty() || held_index.is_empty() {
        debug!("No skill names need alias resolution");
        return Ok(HashMap::new());
    }

    let held_names: Vec<String> = held.iter().map(|s| s.name.trim().to_string()).collect();
    let raw = provider
        .resolve_skill_aliases(&unresolved, &held_names)
        .await?;
    let aliases = raw.aliases.ok_or_else(|| {
        AnalysisError::Malformed("alias response is missing 'aliases'".to_string())
    })?;

    let unresolved_keys: Vec<String> = unresolved.iter().map(|n| normalize_skill(n)).collect();
    let mut resolved = HashMap::new();
    for alias in aliases {
        let required = normalize_skill(&alias.required);
        let held_key = normalize_skill(&alias.held);
        if !unresolved_keys.contains(&required) || !held_index.contains_key(&held_key) {
            warn!(
                "Ignoring alias '{}' -> '{}' that names an unknown skill",
                alias.required, alias.held
            );
            continue;
        }
        resolved.entry(required).or_insert(held_key);
    }

    debug!("Resolved {} skill aliases", resolved.len());
    Ok(resolved)
}

/// Skill list for a job, extracting it from the free-text requirement
/// fields when the posting lists none.
pub async fn job_skills_or_extract(
    provider: &dyn InferenceProvider,
    job: &Job,
) -> Result<Vec<JobSkill>, AnalysisError> {
    if !job.required_skills.is_empty() || !job.has_requirement_text() {
        return Ok(job.required_skills.clone());
    }

    let raw = provider.extract_job_skills(job).await?;
    let skills = raw.skills.ok_or_else(|| {
        AnalysisError::Malformed("extraction response is missing 'skills'".to_string())
    })?;

    Ok(skills
        .into_iter()
        .filter(|s| !normalize_skill(&s.name).is_empty())
        .collect())
}
