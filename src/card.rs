//! The mounted plan card.
//!
//! Mounting starts a timer that re-evaluates the night-time window and
//! today's stored plan every `refresh` period, publishing each snapshot
//! on a `watch` channel. Dropping (or [`unmount`](PlanCard::unmount)ing)
//! the card stops the timer and cancels any speech in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use kisan_sathi_core::orchestrator::{PlanCardView, PlanOrchestrator};

pub struct PlanCard {
    orchestrator: Arc<PlanOrchestrator>,
    publisher: Arc<watch::Sender<PlanCardView>>,
    views: watch::Receiver<PlanCardView>,
    timer: Option<JoinHandle<()>>,
}

fn publish(tx: &watch::Sender<PlanCardView>, view: PlanCardView) -> bool {
    tx.send_if_modified(|current| {
        if *current == view {
            false
        } else {
            *current = view;
            true
        }
    })
}

impl PlanCard {
    /// Take an initial snapshot and start the refresh timer.
    ///
    /// An orchestrator left shut down by an earlier card is resumed.
    pub async fn mount(orchestrator: Arc<PlanOrchestrator>, refresh: Duration) -> Self {
        orchestrator.resume();
        let initial = orchestrator.refresh().await;
        let (tx, rx) = watch::channel(initial);
        let publisher = Arc::new(tx);

        let orch = Arc::clone(&orchestrator);
        let tx = Arc::clone(&publisher);
        let timer = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(refresh);
            // The first tick fires immediately; the initial snapshot covers it.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                let view = orch.refresh().await;
                debug!(visible = view.visible, night = view.night, "plan card refreshed");
                publish(&tx, view);
            }
        });

        Self {
            orchestrator,
            publisher,
            views: rx,
            timer: Some(timer),
        }
    }

    pub fn orchestrator(&self) -> &Arc<PlanOrchestrator> {
        &self.orchestrator
    }

    /// Re-evaluate immediately, e.g. right after a generation finished.
    pub async fn refresh_now(&self) -> PlanCardView {
        let view = self.orchestrator.refresh().await;
        publish(&self.publisher, view.clone());
        view
    }

    /// The latest snapshot.
    pub fn view(&self) -> PlanCardView {
        self.views.borrow().clone()
    }

    /// A receiver that is notified whenever the snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<PlanCardView> {
        self.views.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.timer.is_some()
    }

    /// Stop the timer and tear the orchestrator down.
    pub fn unmount(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            self.orchestrator.shutdown();
            debug!("plan card unmounted");
        }
    }
}

impl Drop for PlanCard {
    fn drop(&mut self) {
        self.unmount();
    }
}
