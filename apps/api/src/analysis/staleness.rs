//! Staleness Oracle: decides whether a cached analysis can be served.
//!
//! Two policies:
//! - `DependencyTimestamps`: valid while the record is strictly newer than
//!   both the job and the candidate. Any edit to either after the analysis
//!   invalidates it; which fields changed is not considered.
//! - `FixedTtl`: valid while `now - generated_at < ttl`. Dependency edits are
//!   invisible to this policy unless a cascade deleted the row.
//!
//! A missing record is always invalid.

use chrono::{DateTime, Duration, Utc};

use crate::models::analysis::{CompatibilityAnalysis, SkillMatchAnalysis, SkillRecommendationCache};
use crate::models::candidate::CandidateProfile;
use crate::models::job::Job;
use crate::models::roadmap::LearningRoadmap;

/// Lifetime of skill match, recommendation and roadmap rows.
pub const CACHE_TTL_DAYS: i64 = 7;

/// A cached row that knows when it was generated.
pub trait Timestamped {
    fn generated_at(&self) -> DateTime<Utc>;
}

impl Timestamped for CompatibilityAnalysis {
    fn generated_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }
}

impl Timestamped for SkillMatchAnalysis {
    fn generated_at(&self) -> DateTime<Utc> {
        self.analysis_date
    }
}

impl Timestamped for SkillRecommendationCache {
    fn generated_at(&self) -> DateTime<Utc> {
        self.generated_date
    }
}

impl Timestamped for LearningRoadmap {
    fn generated_at(&self) -> DateTime<Utc> {
        self.generated_date
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StalenessPolicy {
    DependencyTimestamps {
        job_updated_at: Option<DateTime<Utc>>,
        candidate_updated_at: Option<DateTime<Utc>>,
    },
    FixedTtl {
        ttl: Duration,
    },
}

impl StalenessPolicy {
    pub fn dependencies(job: &Job, candidate: &CandidateProfile) -> Self {
        StalenessPolicy::DependencyTimestamps {
            job_updated_at: job.updated_at,
            candidate_updated_at: candidate.updated_at,
        }
    }

    pub fn cache_ttl() -> Self {
        StalenessPolicy::FixedTtl {
            ttl: Duration::days(CACHE_TTL_DAYS),
        }
    }
}

pub fn is_valid<R: Timestamped>(
    record: Option<&R>,
    policy: &StalenessPolicy,
    now: DateTime<Utc>,
) -> bool {
    let Some(record) = record else {
        return false;
    };
    let generated_at = record.generated_at();

    match policy {
        StalenessPolicy::DependencyTimestamps {
            job_updated_at,
            candidate_updated_at,
        } => {
            let epoch = DateTime::<Utc>::UNIX_EPOCH;
            generated_at > job_updated_at.unwrap_or(epoch)
                && generated_at > candidate_updated_at.unwrap_or(epoch)
        }
        StalenessPolicy::FixedTtl { ttl } => now - generated_at < *ttl,
    }
}
