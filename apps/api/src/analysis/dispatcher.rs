//! Background Task Dispatcher.
//!
//! Fire-and-forget compatibility work, decoupled from the request that
//! triggered it. A bounded queue feeds a fixed pool of workers; each task runs
//! in its own spawned future so a panic or error stays inside that task.
//!
//! Delivery is at-most-once: a full queue drops the task, failures are logged
//! and never retried, and tasks finish in no particular order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analysis::compatibility::analyze_application;
use crate::analysis::provider::InferenceProvider;
use crate::errors::AppError;
use crate::store::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisTask {
    /// Score the pair behind a newly created application.
    Application(Uuid),
    /// Re-score every application of a candidate whose profile changed.
    CandidateProfile(Uuid),
}

#[derive(Debug, Default)]
struct DispatcherStats {
    queued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub queued: u64,
    pub completed: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Clone)]
pub struct AnalysisDispatcher {
    sender: mpsc::Sender<AnalysisTask>,
    stats: Arc<DispatcherStats>,
}

impl AnalysisDispatcher {
    /// Spawns `workers` workers (at least one) sharing a queue of `capacity`.
    /// Must be called inside a Tokio runtime.
    pub fn start(
        store: SharedStore,
        provider: Arc<dyn InferenceProvider>,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(DispatcherStats::default());

        let workers = workers.max(1);
        for worker_id in 0..workers {
            tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&receiver),
                Arc::clone(&store),
                Arc::clone(&provider),
                Arc::clone(&stats),
            ));
        }
        info!("Analysis dispatcher started: {workers} workers, queue capacity {capacity}");

        Self { sender, stats }
    }

    /// Enqueues without waiting. Returns whether the task was accepted; the
    /// caller's request succeeds either way.
    pub fn schedule(&self, task: AnalysisTask) -> bool {
        match self.sender.try_send(task) {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                debug!("Queued {task:?}");
                true
            }
            Err(mpsc::error::TrySendError::Full(task)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Analysis queue full, dropping {task:?}");
                false
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                error!("Analysis queue closed, dropping {task:?}");
                false
            }
        }
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            queued: self.stats.queued.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<AnalysisTask>>>,
    store: SharedStore,
    provider: Arc<dyn InferenceProvider>,
    stats: Arc<DispatcherStats>,
) {
    loop {
        // Lock only long enough to take one task.
        let task = receiver.lock().await.recv().await;
        let Some(task) = task else {
            debug!("Worker {worker_id} exiting, queue closed");
            return;
        };

        let handle = tokio::spawn(run_task(task, Arc::clone(&store), Arc::clone(&provider)));
        match handle.await {
            Ok(Ok(())) => {
                stats.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Background {task:?} failed: {e}");
            }
            Err(join_err) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                error!("Background {task:?} panicked: {join_err}");
            }
        }
    }
}

async fn run_task(
    task: AnalysisTask,
    store: SharedStore,
    provider: Arc<dyn InferenceProvider>,
) -> Result<(), AppError> {
    match task {
        AnalysisTask::Application(application_id) => {
            let analysis = analyze_application(store.as_ref(), provider.as_ref(), application_id).await?;
            info!(
                "Background compatibility for application {application_id}: {:.1}",
                analysis.score
            );
        }
        AnalysisTask::CandidateProfile(candidate_id) => {
            let applications = store.applications_for_candidate(candidate_id).await?;
            let mut failures = 0usize;
            for application in &applications {
                if let Err(e) =
                    analyze_application(store.as_ref(), provider.as_ref(), application.id).await
                {
                    failures += 1;
                    warn!("Re-analysis of application {} failed: {e}", application.id);
                }
            }
            info!(
                "Re-analyzed {} of {} applications for candidate {candidate_id}",
                applications.len() - failures,
                applications.len()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::analysis::test_support::{candidate, job, FakeProvider};
    use crate::models::application::Application;
    use crate::models::candidate::SkillLevel;
    use crate::store::memory::MemoryStore;

    async fn wait_for(dispatcher: &AnalysisDispatcher, done: impl Fn(DispatcherStatsSnapshot) -> bool) {
        for _ in 0..200 {
            if done(dispatcher.stats()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("dispatcher did not settle: {:?}", dispatcher.stats());
    }

    fn seeded() -> (Arc<MemoryStore>, Uuid, Uuid) {
        let store = MemoryStore::default();
        let j = job("Backend", vec![]);
        let c = candidate(&[("Rust", SkillLevel::Advanced)]);
        let application_id = Uuid::new_v4();
        store.put_application(Application {
            id: application_id,
            job_id: j.id,
            candidate_id: c.id,
            compatibility: None,
        });
        let candidate_id = c.id;
        store.put_job(j);
        store.put_candidate(c);
        (Arc::new(store), application_id, candidate_id)
    }

    #[tokio::test]
    async fn test_scheduled_application_is_analyzed() {
        let (store, application_id, _) = seeded();
        let dispatcher =
            AnalysisDispatcher::start(store.clone(), Arc::new(FakeProvider::default()), 2, 8);

        assert!(dispatcher.schedule(AnalysisTask::Application(application_id)));
        wait_for(&dispatcher, |s| s.completed == 1).await;

        assert!(store.application(application_id).unwrap().compatibility.is_some());
        assert_eq!(dispatcher.stats().failed, 0);
    }

    #[tokio::test]
    async fn test_failure_is_counted_not_propagated() {
        let (store, application_id, _) = seeded();
        let provider = FakeProvider::default();
        provider.set_failing(true);
        let dispatcher = AnalysisDispatcher::start(store.clone(), Arc::new(provider), 1, 8);

        assert!(dispatcher.schedule(AnalysisTask::Application(application_id)));
        assert!(dispatcher.schedule(AnalysisTask::Application(Uuid::new_v4())));
        wait_for(&dispatcher, |s| s.failed == 2).await;

        assert!(store.application(application_id).unwrap().compatibility.is_none());
    }

    #[tokio::test]
    async fn test_profile_change_reanalyzes_every_application() {
        let (store, first, candidate_id) = seeded();
        let other_job = job("Platform", vec![]);
        let second = Uuid::new_v4();
        store.put_application(Application {
            id: second,
            job_id: other_job.id,
            candidate_id,
            compatibility: None,
        });
        store.put_job(other_job);
        let provider = Arc::new(FakeProvider::default());
        let dispatcher = AnalysisDispatcher::start(store.clone(), provider.clone(), 1, 8);

        dispatcher.schedule(AnalysisTask::CandidateProfile(candidate_id));
        wait_for(&dispatcher, |s| s.completed == 1).await;

        assert_eq!(provider.calls.compatibility(), 2);
        assert!(store.application(first).unwrap().compatibility.is_some());
        assert!(store.application(second).unwrap().compatibility.is_some());
    }

    #[tokio::test]
    async fn test_full_queue_drops_task() {
        // Built by hand so no worker drains the queue.
        let (sender, _receiver) = mpsc::channel(1);
        let dispatcher = AnalysisDispatcher {
            sender,
            stats: Arc::new(DispatcherStats::default()),
        };
        let application_id = Uuid::new_v4();

        assert!(dispatcher.schedule(AnalysisTask::Application(application_id)));
        assert!(!dispatcher.schedule(AnalysisTask::Application(application_id)));
        let stats = dispatcher.stats();
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.dropped, 1);
    }
}
