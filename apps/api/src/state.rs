use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::analysis::dispatcher::AnalysisDispatcher;
use crate::analysis::provider::InferenceProvider;
use crate::store::postgres::PgAnalysisStore;
use crate::store::{CredentialScope, SharedStore, StoreCapabilities};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pool for the caller-scoped role. Never queried directly: handlers get a
    /// per-request store through `routes::caller::CallerStore`.
    pub caller_pool: PgPool,
    /// Elevated store for cascades and background work.
    pub elevated: SharedStore,
    /// Cache tables found at startup.
    pub capabilities: StoreCapabilities,
    /// Pluggable inference backend. Default: `LlmInferenceProvider`.
    pub provider: Arc<dyn InferenceProvider>,
    pub dispatcher: AnalysisDispatcher,
}

impl AppState {
    pub fn caller_store(&self, user_id: Uuid) -> PgAnalysisStore {
        PgAnalysisStore::new(
            self.caller_pool.clone(),
            CredentialScope::Caller(user_id),
            self.capabilities,
        )
    }
}
