use std::path::PathBuf;
use std::sync::Arc;

use futures::{stream::BoxStream, StreamExt};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    domain::{DownloadPlan, DownloadRequest, JobOutcome, PlanError, ProgressEvent},
    engine::{Capabilities, MediaEngine},
};

use super::{
    orchestrator::Orchestrator,
    plan_builder::PlanBuilder,
    progress::{ChannelReporter, ProgressReporter},
    reconciler::Reconciler,
};

#[derive(Debug, Clone)]
pub enum JobEvent {
    Progress(ProgressEvent),
    Completed(JobOutcome),
}

/// Entry point for front-ends: plan, run, reconcile.
#[derive(Clone)]
pub struct DownloadCoordinator {
    planner: PlanBuilder,
    orchestrator: Orchestrator,
    reconciler: Reconciler,
}

impl DownloadCoordinator {
    pub fn new(engine: Arc<dyn MediaEngine>, capabilities: Capabilities, config: &AppConfig) -> Self {
        Self {
            planner: PlanBuilder::new(capabilities.clone(), config),
            orchestrator: Orchestrator::new(engine, capabilities),
            reconciler: Reconciler::new(config.merge_container.clone()),
        }
    }

    pub fn prepare(&self, request: &DownloadRequest) -> Result<DownloadPlan, PlanError> {
        self.planner.build(request)
    }

    /// Blocks until every pass has run or one has failed.
    pub fn run(
        &self,
        plan: &DownloadPlan,
        request: &DownloadRequest,
        sink: &dyn ProgressReporter,
    ) -> JobOutcome {
        info!("download job started for {}", plan.url());
        let results = self.orchestrator.execute(plan, sink);
        let outcome = self.reconciler.reconcile(&results, request);
        info!("download job finished: {:?} {}", outcome.status, outcome.message);
        outcome
    }

    /// Runs the job on the blocking pool and streams its events, ending with
    /// exactly one `JobEvent::Completed`.
    pub fn run_stream(
        &self,
        plan: DownloadPlan,
        request: DownloadRequest,
    ) -> BoxStream<'static, JobEvent> {
        let coordinator = self.clone();

        futures::stream::once(async move {
            let (tx, rx) = futures::channel::mpsc::unbounded();
            let worker_tx = tx.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let reporter = ChannelReporter::new(worker_tx.clone());
                let outcome = coordinator.run(&plan, &request, &reporter);
                let _ = worker_tx.unbounded_send(JobEvent::Completed(outcome));
            });

            // Report a crashed worker instead of leaving the UI waiting.
            tokio::spawn(async move {
                if let Err(e) = handle.await {
                    warn!("download worker stopped: {}", e);
                    let _ = tx.unbounded_send(JobEvent::Completed(JobOutcome::rejected(
                        format!("Download failed: {}", e),
                    )));
                }
                tx.close_channel();
            });

            rx
        })
        .flatten()
        .boxed()
    }

    pub async fn choose_destination(&self, current: PathBuf) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_title("Select Save Location")
            .set_directory(&current)
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }
}
