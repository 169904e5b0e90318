use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::candidate::SkillLevel;
use crate::models::job::SkillImportance;

// ────────────────────────────────────────────────────────────────────────────
// Compatibility (embedded in Application)
// ────────────────────────────────────────────────────────────────────────────

/// Coarse label derived from the clamped compatibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl FitLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            FitLevel::Excellent
        } else if score >= 60.0 {
            FitLevel::Good
        } else if score >= 40.0 {
            FitLevel::Fair
        } else {
            FitLevel::Poor
        }
    }
}

/// Per-category scores, each within 0 to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityAnalysis {
    pub score: f64, // 0 to 100
    pub breakdown: CategoryBreakdown,
    pub strengths: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub experience_gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub fit_level: FitLevel,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Skill match (TTL cache, keyed by job_id + candidate_id)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    Exact,
    Similar,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSkill {
    /// Skill name as the job lists it.
    pub skill: String,
    pub candidate_level: Option<SkillLevel>,
    pub job_requirement: SkillImportance,
    pub match_quality: MatchQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingSkill {
    pub skill: String,
    pub importance: SkillImportance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatchAnalysis {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub matching_skills: Vec<MatchedSkill>,
    pub missing_skills: Vec<MissingSkill>,
    pub match_percentage: f64, // 0 to 100, required skills only
    pub analysis_date: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Recommendations (TTL cache, keyed by job_id + candidate_id)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[serde(alias = "Beginner", alias = "easy")]
    Beginner,
    #[serde(alias = "Intermediate", alias = "medium")]
    Intermediate,
    #[serde(alias = "Advanced", alias = "hard")]
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    pub title: String,
    #[serde(default)]
    pub kind: String, // "course" | "book" | "docs" | "project" ...
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecommendation {
    pub skill: String,
    pub learning_path: String,
    pub resources: Vec<LearningResource>,
    pub time_estimate: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRecommendationCache {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub recommendations: Vec<SkillRecommendation>,
    pub generated_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_level_thresholds() {
        assert_eq!(FitLevel::from_score(100.0), FitLevel::Excellent);
        assert_eq!(FitLevel::from_score(80.0), FitLevel::Excellent);
        assert_eq!(FitLevel::from_score(79.9), FitLevel::Good);
        assert_eq!(FitLevel::from_score(40.0), FitLevel::Fair);
        assert_eq!(FitLevel::from_score(0.0), FitLevel::Poor);
    }

    #[test]
    fn test_difficulty_accepts_provider_spellings() {
        let parsed: Vec<Difficulty> =
            serde_json::from_str(r#"["beginner", "Intermediate", "hard"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Difficulty::Beginner,
                Difficulty::Intermediate,
                Difficulty::Advanced
            ]
        );
    }
}
