use super::context::ContextHandle;
use crate::core::PlotData;
use crate::observability::{HandoffMetrics, HandoffSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

struct Shared {
    slot: Mutex<Option<PlotData>>,
    consume_pending: AtomicBool,
    metrics: HandoffMetrics,
}

impl Shared {
    fn take(&self) -> Option<PlotData> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

/// Single-slot mailbox between the ingest thread and the consumer.
///
/// Every write replaces the unread value. At most one consume task is
/// queued at a time and it delivers the newest value when it runs.
pub struct LatestValueHandoff<C> {
    shared: Arc<Shared>,
    context: ContextHandle<C>,
}

impl<C> Clone for LatestValueHandoff<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: self.context.clone(),
        }
    }
}

impl<C: 'static> LatestValueHandoff<C> {
    pub fn new(context: ContextHandle<C>) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                consume_pending: AtomicBool::new(false),
                metrics: HandoffMetrics::new(),
            }),
            context,
        }
    }

    /// Replace the pending value. Never blocks on the consumer.
    pub fn write(&self, plot: PlotData) {
        let replaced = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(plot);

        self.shared.metrics.record_write();
        if replaced.is_some() {
            self.shared.metrics.record_overwrite();
        }
    }

    /// Make sure the consumer will run `callback` with the newest value.
    ///
    /// If a consume task is already queued this is a no-op: that task
    /// will pick up whatever is in the slot when it runs.
    pub fn schedule_consume<F>(&self, callback: F)
    where
        F: FnOnce(&mut C, PlotData) + Send + 'static,
    {
        if self.shared.consume_pending.swap(true, Ordering::AcqRel) {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let queued = self.context.spawn(move |state| {
            // clear before taking, so a write racing with us schedules anew
            shared.consume_pending.store(false, Ordering::Release);
            if let Some(plot) = shared.take() {
                shared.metrics.record_delivered();
                callback(state, plot);
            }
        });

        if queued {
            self.shared.metrics.record_scheduled();
        } else {
            self.shared.consume_pending.store(false, Ordering::Release);
            debug!("consumer context closed, plot stays in the slot");
        }
    }

    /// Take the pending value directly, for consumers that poll
    pub fn take(&self) -> Option<PlotData> {
        self.shared.take()
    }

    pub fn metrics(&self) -> HandoffSnapshot {
        self.shared.metrics.snapshot()
    }
}
