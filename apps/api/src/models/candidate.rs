use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Proficiency ladder: Beginner < Intermediate < Advanced < Expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    #[serde(alias = "beginner")]
    Beginner,
    #[serde(alias = "intermediate")]
    Intermediate,
    #[serde(alias = "advanced")]
    Advanced,
    #[serde(alias = "expert")]
    Expert,
}

impl SkillLevel {
    /// 1-based position on the ladder.
    pub fn rank(&self) -> u8 {
        match self {
            SkillLevel::Beginner => 1,
            SkillLevel::Intermediate => 2,
            SkillLevel::Advanced => 3,
            SkillLevel::Expert => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSkill {
    pub name: String,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub years: Option<f32>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub field_of_study: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    #[serde(default)]
    pub issuer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Uuid,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub skills: Vec<CandidateSkill>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    /// `None` is treated as the epoch by the staleness check.
    pub updated_at: Option<DateTime<Utc>>,
}
