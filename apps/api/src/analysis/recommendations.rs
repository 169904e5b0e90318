//! Recommendation Generator: learning paths for a set of missing skills.
//!
//! An empty missing-skill list never reaches the provider.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::aggregator::normalize_skill;
use crate::analysis::provider::{InferenceProvider, RawRecommendation, RawRecommendations};
use crate::analysis::skill_match::get_or_compute_skill_match;
use crate::analysis::staleness::{is_valid, StalenessPolicy};
use crate::errors::{AnalysisError, AppError};
use crate::models::analysis::{MissingSkill, SkillRecommendation, SkillRecommendationCache};
use crate::store::AnalysisStore;

fn required_text(field: &str, skill: &str, value: Option<String>) -> Result<String, AnalysisError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AnalysisError::Malformed(format!("recommendation for '{skill}' is missing '{field}'")))
}

fn validate_one(raw: RawRecommendation) -> Result<SkillRecommendation, AnalysisError> {
    let skill = required_text("skill", "?", raw.skill)?;
    let learning_path = required_text("learning_path", &skill, raw.learning_path)?;
    let time_estimate = required_text("time_estimate", &skill, raw.time_estimate)?;
    let difficulty = raw.difficulty.ok_or_else(|| {
        AnalysisError::Malformed(format!("recommendation for '{skill}' is missing 'difficulty'"))
    })?;

    Ok(SkillRecommendation {
        skill,
        learning_path,
        resources: raw.resources.unwrap_or_default(),
        time_estimate,
        difficulty,
    })
}

/// Validates a provider response against the skills that were asked for.
/// Entries for skills nobody asked about are dropped, as are repeats. Every
/// requested skill must be answered.
pub fn validate_recommendations(
    requested: &[MissingSkill],
    raw: RawRecommendations,
) -> Result<Vec<SkillRecommendation>, AnalysisError> {
    let entries = raw
        .recommendations
        .ok_or_else(|| AnalysisError::Malformed("missing 'recommendations'".to_string()))?;

    let wanted: HashSet<String> = requested.iter().map(|s| normalize_skill(&s.skill)).collect();
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());

    for entry in entries {
        let rec = validate_one(entry)?;
        let key = normalize_skill(&rec.skill);
        if !wanted.contains(&key) {
            warn!("Dropping recommendation for unrequested skill '{}'", rec.skill);
            continue;
        }
        if seen.insert(key) {
            out.push(rec);
        }
    }

    if let Some(unanswered) = requested
        .iter()
        .find(|s| !seen.contains(&normalize_skill(&s.skill)))
    {
        return Err(AnalysisError::Malformed(format!(
            "recommendation missing for '{}'",
            unanswered.skill
        )));
    }

    Ok(out)
}

pub async fn generate_recommendations(
    provider: &dyn InferenceProvider,
    missing: &[MissingSkill],
) -> Result<Vec<SkillRecommendation>, AnalysisError> {
    if missing.is_empty() {
        debug!("No missing skills, skipping recommendation inference");
        return Ok(Vec::new());
    }
    let raw = provider.recommend_learning(missing).await?;
    validate_recommendations(missing, raw)
}

/// Cached recommendations for the pair's missing skills. On a miss the skill
/// match is resolved first (cache or compute), then fed to the generator.
pub async fn get_or_compute_recommendations(
    store: &dyn AnalysisStore,
    provider: &dyn InferenceProvider,
    job_id: Uuid,
    candidate_id: Uuid,
) -> Result<Vec<SkillRecommendation>, AppError> {
    crate::analysis::require_id(job_id, "job")?;
    crate::analysis::require_id(candidate_id, "candidate")?;
    let cache_enabled = store.capabilities().recommendation_cache;

    if cache_enabled {
        let cached = store.fetch_recommendations(job_id, candidate_id).await?;
        if is_valid(cached.as_ref(), &StalenessPolicy::cache_ttl(), Utc::now()) {
            debug!("Recommendation cache hit for job {job_id} / candidate {candidate_id}");
            if let Some(cached) = cached {
                return Ok(cached.recommendations);
            }
        }
    }

    let skill_match = get_or_compute_skill_match(store, provider, job_id, candidate_id).await?;
    let recommendations = generate_recommendations(provider, &skill_match.missing_skills).await?;
    info!(
        "Generated {} recommendations for job {job_id} / candidate {candidate_id}",
        recommendations.len()
    );

    if cache_enabled {
        let row = SkillRecommendationCache {
            job_id,
            candidate_id,
            recommendations: recommendations.clone(),
            generated_date: Utc::now(),
        };
        if let Err(e) = store.upsert_recommendations(&row).await {
            warn!("Failed to persist recommendations for job {job_id} / candidate {candidate_id}: {e:#}");
        }
    }

    Ok(recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{candidate, job, job_skill, FakeProvider};
    use crate::models::analysis::Difficulty;
    use crate::models::candidate::SkillLevel;
    use crate::models::job::SkillImportance;
    use crate::store::memory::MemoryStore;

    fn missing(name: &str) -> MissingSkill {
        MissingSkill {
            skill: name.to_string(),
            importance: SkillImportance::Required,
        }
    }

    fn raw(skill: &str) -> RawRecommendation {
        RawRecommendation {
            skill: Some(skill.to_string()),
            learning_path: Some("Read the book, then build something".to_string()),
            resources: None,
            time_estimate: Some("2 weeks".to_string()),
            difficulty: Some(Difficulty::Beginner),
        }
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_provider_call() {
        let provider = FakeProvider::default();
        let out = generate_recommendations(&provider, &[]).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(provider.calls.recommendations(), 0);
    }

    #[test]
    fn test_validate_drops_unrequested_and_duplicates() {
        let out = validate_recommendations(
            &[missing("Docker")],
            RawRecommendations {
                recommendations: Some(vec![raw("docker"), raw("Docker"), raw("Haskell")]),
            },
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].skill, "docker");
        assert!(out[0].resources.is_empty());
    }

    #[test]
    fn test_validate_rejects_missing_difficulty() {
        let mut entry = raw("Docker");
        entry.difficulty = None;
        let result = validate_recommendations(
            &[missing("Docker")],
            RawRecommendations {
                recommendations: Some(vec![entry]),
            },
        );
        assert!(matches!(result, Err(AnalysisError::Malformed(_))));
    }

    #[test]
    fn test_validate_rejects_unanswered_skill() {
        let result = validate_recommendations(
            &[missing("Docker"), missing("Kubernetes")],
            RawRecommendations {
                recommendations: Some(vec![raw("Docker")]),
            },
        );
        assert!(matches!(result, Err(AnalysisError::Malformed(ref msg)) if msg.contains("Kubernetes")));
    }

    #[test]
    fn test_validate_rejects_missing_list() {
        let result =
            validate_recommendations(&[missing("Docker")], RawRecommendations { recommendations: None });
        assert!(result.is_err());
    }

    fn seeded(candidate_skills: &[(&str, SkillLevel)]) -> (MemoryStore, Uuid, Uuid) {
        let store = MemoryStore::default();
        let j = job(
            "Platform",
            vec![
                job_skill("Docker", SkillImportance::Required),
                job_skill("Go", SkillImportance::Preferred),
            ],
        );
        let c = candidate(candidate_skills);
        let ids = (j.id, c.id);
        store.put_job(j);
        store.put_candidate(c);
        (store, ids.0, ids.1)
    }

    #[tokio::test]
    async fn test_miss_composes_skill_match_then_caches() {
        let (store, job_id, candidate_id) = seeded(&[("Go", SkillLevel::Advanced)]);
        let provider = FakeProvider::default();

        let recs = get_or_compute_recommendations(&store, &provider, job_id, candidate_id)
            .await
            .unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].skill, "Docker");
        assert_eq!(provider.calls.skill_match(), 1);
        assert_eq!(store.skill_match_count(), 1);
        assert_eq!(store.recommendation_count(), 1);

        get_or_compute_recommendations(&store, &provider, job_id, candidate_id)
            .await
            .unwrap();
        assert_eq!(provider.calls.recommendations(), 1);
        assert_eq!(provider.calls.skill_match(), 1);
    }

    #[tokio::test]
    async fn test_nothing_missing_caches_empty_list() {
        let (store, job_id, candidate_id) =
            seeded(&[("Docker", SkillLevel::Expert), ("Go", SkillLevel::Expert)]);
        let provider = FakeProvider::default();

        let recs = get_or_compute_recommendations(&store, &provider, job_id, candidate_id)
            .await
            .unwrap();
        assert!(recs.is_empty());
        assert_eq!(provider.calls.recommendations(), 0);
        assert_eq!(store.recommendation_count(), 1);
    }

    #[tokio::test]
    async fn test_partial_answer_not_cached() {
        let (store, job_id, candidate_id) = seeded(&[]);
        let provider = FakeProvider::default().without_recommendation_for("Go");

        let result = get_or_compute_recommendations(&store, &provider, job_id, candidate_id).await;
        assert!(matches!(result, Err(AppError::Analysis(_))));
        assert_eq!(provider.calls.recommendations(), 1);
        assert_eq!(store.recommendation_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_not_cached() {
        let (store, job_id, candidate_id) = seeded(&[]);
        let provider = FakeProvider::default();
        // Warm the skill match so only the recommendation call can fail.
        get_or_compute_skill_match(&store, &provider, job_id, candidate_id)
            .await
            .unwrap();
        provider.set_failing(true);

        let result = get_or_compute_recommendations(&store, &provider, job_id, candidate_id).await;
        assert!(matches!(result, Err(AppError::Analysis(_))));
        assert_eq!(store.recommendation_count(), 0);
    }
}
