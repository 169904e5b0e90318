use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::analysis::CompatibilityAnalysis;

/// Links one job to one candidate. Carries at most one compatibility
/// snapshot, overwritten on every recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub compatibility: Option<CompatibilityAnalysis>,
}
