use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::analysis::LearningResource;
use crate::models::candidate::SkillLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    New,
    Upgrade,
}

/// Ordered learning tiers. A roadmap only contains the non-empty ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTier {
    Foundation,
    Intermediate,
    Advanced,
}

impl PhaseTier {
    pub fn title(&self) -> &'static str {
        match self {
            PhaseTier::Foundation => "Foundation",
            PhaseTier::Intermediate => "Intermediate",
            PhaseTier::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapSkill {
    pub skill: String,
    pub skill_type: SkillType,
    pub current_level: Option<SkillLevel>,
    pub target_level: SkillLevel,
    pub estimated_weeks: u32,
    pub time_estimate: Option<String>,
    pub resources: Vec<LearningResource>,
    pub required_by: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapPhase {
    pub phase_number: u32,
    pub tier: PhaseTier,
    pub title: String,
    pub duration_weeks: u32,
    pub skills: Vec<RoadmapSkill>,
    /// Phase numbers that must be completed first.
    pub prerequisites: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerPath {
    pub role: String,
    pub job_ids: Vec<Uuid>,
    pub readiness_percentage: f64,
    pub phases_needed: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSkillGap {
    pub skill: String,
    pub target_level: SkillLevel,
    pub required_by: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSkillGap {
    pub skill: String,
    pub current_level: SkillLevel,
    pub target_level: SkillLevel,
    pub required_by: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SufficientSkill {
    pub skill: String,
    pub current_level: SkillLevel,
    pub required_level: SkillLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGapAnalysis {
    pub new_skills_needed: Vec<NewSkillGap>,
    pub skills_to_upgrade: Vec<UpgradeSkillGap>,
    pub skills_already_sufficient: Vec<SufficientSkill>,
}

/// One row per candidate, replaced wholesale on regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningRoadmap {
    pub candidate_id: Uuid,
    pub skill_gap_analysis: SkillGapAnalysis,
    pub phases: Vec<RoadmapPhase>,
    pub career_paths: Vec<CareerPath>,
    pub source_job_ids: Vec<Uuid>,
    pub total_duration_weeks: u32,
    pub generated_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoRoadmapReason {
    NoInterestedJobs,
    NoRequiredSkills,
}

/// Result of a roadmap request. "No roadmap" is distinct from a roadmap
/// whose phase list happens to be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoadmapOutcome {
    Ready { roadmap: LearningRoadmap },
    NoRoadmap { reason: NoRoadmapReason },
}

impl RoadmapOutcome {
    pub fn roadmap(&self) -> Option<&LearningRoadmap> {
        match self {
            RoadmapOutcome::Ready { roadmap } => Some(roadmap),
            RoadmapOutcome::NoRoadmap { .. } => None,
        }
    }
}
