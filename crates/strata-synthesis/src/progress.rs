//! Progress events, cancellation and the per-run checkpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_core::enums::{PipelinePhase, StopReason};
use strata_core::errors::ErrorKind;
use strata_core::responses::SynthesisRunReport;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One event on the progress stream of a synthesis run.
///
/// Serialized with an `event` tag so each line of a JSON stream is
/// self-describing, e.g. `{"event":"progress","phase":"scoring",...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress {
        phase: PipelinePhase,
        current: usize,
        total: usize,
        label: String,
    },
    /// Keep-alive for long-lived consumers; carries no pipeline state.
    Heartbeat { elapsed_ms: u64 },
    Complete { report: SynthesisRunReport },
    Error { kind: ErrorKind, message: String },
}

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Cancellation, deadline and event sink for one run.
pub(crate) struct RunControl {
    cancel: CancelToken,
    deadline: Instant,
    events: Option<mpsc::Sender<ProgressEvent>>,
}

impl RunControl {
    pub(crate) const fn new(
        cancel: CancelToken,
        deadline: Instant,
        events: Option<mpsc::Sender<ProgressEvent>>,
    ) -> Self {
        Self {
            cancel,
            deadline,
            events,
        }
    }

    /// Why the run must stop now, if it must.
    pub(crate) fn checkpoint(&self) -> Option<StopReason> {
        if self.cancel.is_cancelled() {
            Some(StopReason::Cancelled)
        } else if Instant::now() >= self.deadline {
            Some(StopReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Send an event. A closed channel means the consumer is gone, which
    /// cancels the run.
    pub(crate) async fn emit(&self, event: ProgressEvent) {
        let Some(events) = &self.events else {
            return;
        };
        if events.send(event).await.is_err() && !self.cancel.is_cancelled() {
            tracing::info!("progress consumer disconnected, cancelling run");
            self.cancel.cancel();
        }
    }

    pub(crate) async fn progress(
        &self,
        phase: PipelinePhase,
        current: usize,
        total: usize,
        label: impl Into<String>,
    ) {
        self.emit(ProgressEvent::Progress {
            phase,
            current,
            total,
            label: label.into(),
        })
        .await;
    }
}

/// Emit [`ProgressEvent::Heartbeat`] every `every` until the receiver goes
/// away or the handle is aborted.
pub(crate) fn spawn_heartbeat(
    events: mpsc::Sender<ProgressEvent>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            if events
                .send(ProgressEvent::Heartbeat { elapsed_ms })
                .await
                .is_err()
            {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = ProgressEvent::Progress {
            phase: PipelinePhase::Scoring,
            current: 2,
            total: 5,
            label: "Fiber".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "progress",
                "phase": "scoring",
                "current": 2,
                "total": 5,
                "label": "Fiber"
            })
        );
        let error = ProgressEvent::Error {
            kind: ErrorKind::NotFound,
            message: "digest not found".into(),
        };
        assert_eq!(serde_json::to_value(&error).unwrap()["kind"], "not_found");
    }

    #[tokio::test]
    async fn checkpoint_reports_cancel_before_deadline() {
        let token = CancelToken::new();
        let control = RunControl::new(token.clone(), Instant::now(), None);
        assert_eq!(control.checkpoint(), Some(StopReason::DeadlineExceeded));
        token.cancel();
        assert_eq!(control.checkpoint(), Some(StopReason::Cancelled));
    }

    #[tokio::test]
    async fn dropped_receiver_cancels() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let token = CancelToken::new();
        let control = RunControl::new(
            token.clone(),
            Instant::now() + Duration::from_secs(60),
            Some(tx),
        );
        assert_eq!(control.checkpoint(), None);
        control.progress(PipelinePhase::Discovering, 1, 1, "x").await;
        assert!(token.is_cancelled());
        assert_eq!(control.checkpoint(), Some(StopReason::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_ticks_until_aborted() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = spawn_heartbeat(tx, Duration::from_secs(15));
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, ProgressEvent::Heartbeat { elapsed_ms } if elapsed_ms >= 15_000));
        handle.abort();
        assert!(rx.recv().await.is_none());
    }
}
