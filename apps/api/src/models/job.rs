use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::candidate::SkillLevel;

/// How strongly a job asks for a skill. Only `Required` skills count toward
/// the skill match percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillImportance {
    #[default]
    #[serde(alias = "Required", alias = "must_have")]
    Required,
    #[serde(alias = "Preferred")]
    Preferred,
    #[serde(alias = "NiceToHave", alias = "nice-to-have", alias = "optional")]
    NiceToHave,
}

impl SkillImportance {
    /// Proficiency implied when the posting does not name a level.
    pub fn implied_level(&self) -> SkillLevel {
        match self {
            SkillImportance::Required | SkillImportance::Preferred => SkillLevel::Intermediate,
            SkillImportance::NiceToHave => SkillLevel::Beginner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSkill {
    pub name: String,
    #[serde(default)]
    pub importance: SkillImportance,
    /// Explicit proficiency asked for by the posting, if any.
    #[serde(default)]
    pub min_level: Option<SkillLevel>,
}

impl JobSkill {
    pub fn target_level(&self) -> SkillLevel {
        self.min_level
            .unwrap_or_else(|| self.importance.implied_level())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub responsibilities: String,
    #[serde(default)]
    pub qualifications: String,
    #[serde(default)]
    pub required_skills: Vec<JobSkill>,
    #[serde(default)]
    pub min_experience_years: Option<i32>,
    /// `None` is treated as the epoch by the staleness check.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// True when the free-text requirement fields carry anything a skill
    /// extraction pass could work from.
    pub fn has_requirement_text(&self) -> bool {
        [&self.description, &self.responsibilities, &self.qualifications]
            .iter()
            .any(|field| !field.trim().is_empty())
    }
}
