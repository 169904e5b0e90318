//! Roadmap Builder: a phased learning plan across every job the candidate
//! marked as interested.
//!
//! Skills the candidate already holds at or above the aggregate target are
//! reported in the gap analysis but never placed in a phase. Zero interested
//! jobs, or interested jobs with no skills at all, produce an explicit
//! "no roadmap" outcome which is not cached.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::aggregator::{
    aggregate_job_skills, classify_skills, held_skill_index, job_skills_or_extract, normalize_skill,
    resolve_aliases, ClassifiedSkill, SkillStatus,
};
use crate::analysis::load_candidate;
use crate::analysis::provider::InferenceProvider;
use crate::analysis::recommendations::generate_recommendations;
use crate::analysis::staleness::{is_valid, StalenessPolicy};
use crate::errors::AppError;
use crate::models::analysis::{MissingSkill, SkillRecommendation};
use crate::models::candidate::SkillLevel;
use crate::models::job::Job;
use crate::models::roadmap::{
    CareerPath, LearningRoadmap, NewSkillGap, NoRoadmapReason, PhaseTier, RoadmapOutcome,
    RoadmapPhase, RoadmapSkill, SkillGapAnalysis, SkillType, SufficientSkill, UpgradeSkillGap,
};
use crate::store::AnalysisStore;

/// Effort per proficiency level climbed.
pub const WEEKS_PER_LEVEL: u32 = 3;

/// Phase a gap starts in: new skills lay foundations, upgrades start at the
/// tier above what the candidate already has.
pub fn phase_tier(status: SkillStatus) -> Option<PhaseTier> {
    match status {
        SkillStatus::New => Some(PhaseTier::Foundation),
        SkillStatus::Upgrade {
            current: SkillLevel::Beginner,
        } => Some(PhaseTier::Intermediate),
        SkillStatus::Upgrade { .. } => Some(PhaseTier::Advanced),
        SkillStatus::Sufficient { .. } => None,
    }
}

pub fn estimated_weeks(current: Option<SkillLevel>, target: SkillLevel) -> u32 {
    let from = current.map_or(0, |level| level.rank());
    u32::from(target.rank().saturating_sub(from)) * WEEKS_PER_LEVEL
}

fn gap_analysis(classified: &[ClassifiedSkill]) -> SkillGapAnalysis {
    let mut gaps = SkillGapAnalysis::default();
    for entry in classified {
        let skill = &entry.skill;
        match entry.status {
            SkillStatus::New => gaps.new_skills_needed.push(NewSkillGap {
                skill: skill.name.clone(),
                target_level: skill.target_level,
                required_by: skill.required_by.clone(),
            }),
            SkillStatus::Upgrade { current } => gaps.skills_to_upgrade.push(UpgradeSkillGap {
                skill: skill.name.clone(),
                current_level: current,
                target_level: skill.target_level,
                required_by: skill.required_by.clone(),
            }),
            SkillStatus::Sufficient { current } => {
                gaps.skills_already_sufficient.push(SufficientSkill {
                    skill: skill.name.clone(),
                    current_level: current,
                    required_level: skill.target_level,
                })
            }
        }
    }
    gaps
}

fn build_phases(
    classified: &[ClassifiedSkill],
    recommendations: &[SkillRecommendation],
) -> Vec<RoadmapPhase> {
    let by_skill: HashMap<String, &SkillRecommendation> = recommendations
        .iter()
        .map(|r| (normalize_skill(&r.skill), r))
        .collect();

    let mut tiers: BTreeMap<PhaseTier, Vec<RoadmapSkill>> = BTreeMap::new();
    for entry in classified {
        let Some(tier) = phase_tier(entry.status) else {
            continue;
        };
        let (skill_type, current_level) = match entry.status {
            SkillStatus::Upgrade { current } => (SkillType::Upgrade, Some(current)),
            _ => (SkillType::New, None),
        };
        let rec = by_skill.get(&entry.skill.key);
        tiers.entry(tier).or_default().push(RoadmapSkill {
            skill: entry.skill.name.clone(),
            skill_type,
            current_level,
            target_level: entry.skill.target_level,
            estimated_weeks: estimated_weeks(current_level, entry.skill.target_level),
            time_estimate: rec.map(|r| r.time_estimate.clone()),
            resources: rec.map(|r| r.resources.clone()).unwrap_or_default(),
            required_by: entry.skill.required_by.clone(),
        });
    }

    tiers
        .into_iter()
        .enumerate()
        .map(|(i, (tier, skills))| {
            let phase_number = i as u32 + 1;
            RoadmapPhase {
                phase_number,
                tier,
                title: format!("Phase {phase_number}: {}", tier.title()),
                duration_weeks: skills.iter().map(|s| s.estimated_weeks).sum(),
                skills,
                prerequisites: (1..phase_number).collect(),
            }
        })
        .collect()
}

/// Readiness per role is `(upgrade + sufficient) / total * 100`, rounded, over
/// the role's gap skills; only `New` skills count against it.
fn build_career_paths(
    jobs: &[Job],
    classified: &[ClassifiedSkill],
    phases: &[RoadmapPhase],
) -> Vec<CareerPath> {
    // Roles keyed by normalized title, in order of first appearance.
    let mut roles: Vec<(String, String, Vec<Uuid>)> = Vec::new();
    for job in jobs {
        let key = normalize_skill(&job.title);
        match roles.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, _, ids)) => ids.push(job.id),
            None => roles.push((key, job.title.trim().to_string(), vec![job.id])),
        }
    }

    let phase_of: HashMap<&str, u32> = phases
        .iter()
        .flat_map(|p| p.skills.iter().map(move |s| (s.skill.as_str(), p.phase_number)))
        .collect();

    roles
        .into_iter()
        .filter_map(|(_, role, job_ids)| {
            let role_skills: Vec<&ClassifiedSkill> = classified
                .iter()
                .filter(|c| c.skill.required_by.iter().any(|id| job_ids.contains(id)))
                .collect();
            if role_skills.is_empty() {
                return None;
            }

            let ready = role_skills
                .iter()
                .filter(|c| !matches!(c.status, SkillStatus::New))
                .count();
            let readiness_percentage = (ready as f64 / role_skills.len() as f64 * 100.0).round();

            let mut phases_needed: Vec<u32> = role_skills
                .iter()
                .filter_map(|c| phase_of.get(c.skill.name.as_str()).copied())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            phases_needed.sort_unstable();

            Some(CareerPath {
                role,
                job_ids,
                readiness_percentage,
                phases_needed,
            })
        })
        .collect()
}

/// Assembles a roadmap from already-classified skills. `jobs` are the
/// interested jobs with their skill lists resolved.
pub fn build_roadmap(
    candidate_id: Uuid,
    jobs: &[Job],
    classified: &[ClassifiedSkill],
    recommendations: &[SkillRecommendation],
    generated_date: DateTime<Utc>,
) -> LearningRoadmap {
    let phases = build_phases(classified, recommendations);
    let career_paths = build_career_paths(jobs, classified, &phases);
    LearningRoadmap {
        candidate_id,
        skill_gap_analysis: gap_analysis(classified),
        total_duration_weeks: phases.iter().map(|p| p.duration_weeks).sum(),
        phases,
        career_paths,
        source_job_ids: jobs.iter().map(|j| j.id).collect(),
        generated_date,
    }
}

pub async fn get_or_compute_roadmap(
    store: &dyn AnalysisStore,
    provider: &dyn InferenceProvider,
    candidate_id: Uuid,
) -> Result<RoadmapOutcome, AppError> {
    let candidate = load_candidate(store, candidate_id).await?;
    let cache_enabled = store.capabilities().roadmap_cache;

    if cache_enabled {
        let cached = store.fetch_roadmap(candidate_id).await?;
        if is_valid(cached.as_ref(), &StalenessPolicy::cache_ttl(), Utc::now()) {
            debug!("Roadmap cache hit for candidate {candidate_id}");
            if let Some(roadmap) = cached {
                return Ok(RoadmapOutcome::Ready { roadmap });
            }
        }
    }

    let mut jobs = store.interested_jobs(candidate_id).await?;
    if jobs.is_empty() {
        info!("Candidate {candidate_id} has no interested jobs; no roadmap");
        return Ok(RoadmapOutcome::NoRoadmap {
            reason: NoRoadmapReason::NoInterestedJobs,
        });
    }

    for job in jobs.iter_mut() {
        job.required_skills = job_skills_or_extract(provider, job).await?;
    }
    let aggregated = aggregate_job_skills(&jobs);
    if aggregated.is_empty() {
        info!("Interested jobs of candidate {candidate_id} list no skills; no roadmap");
        return Ok(RoadmapOutcome::NoRoadmap {
            reason: NoRoadmapReason::NoRequiredSkills,
        });
    }

    let aliases = resolve_aliases(provider, &aggregated, &candidate.skills).await?;
    let classified = classify_skills(&aggregated, &held_skill_index(&candidate.skills), &aliases);

    let gaps: Vec<MissingSkill> = classified
        .iter()
        .filter(|c| phase_tier(c.status).is_some())
        .map(|c| MissingSkill {
            skill: c.skill.name.clone(),
            importance: c.skill.importance,
        })
        .collect();
    let recommendations = generate_recommendations(provider, &gaps).await?;

    let roadmap = build_roadmap(candidate_id, &jobs, &classified, &recommendations, Utc::now());
    info!(
        "Roadmap built for candidate {candidate_id}: {} phases, {} weeks across {} jobs",
        roadmap.phases.len(),
        roadmap.total_duration_weeks,
        jobs.len()
    );

    if cache_enabled {
        if let Err(e) = store.upsert_roadmap(&roadmap).await {
            warn!("Failed to persist roadmap for candidate {candidate_id}: {e:#}");
        }
    }

    Ok(RoadmapOutcome::Ready { roadmap })
}
