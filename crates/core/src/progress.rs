use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub processed: usize,
    pub total: usize,
}

impl ProgressState {
    /// Share of processed files in `[0, 100]`; an empty run counts as done.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.processed.min(self.total) as f64 * 100.0) / self.total as f64
        }
    }
}

/// Receives progress from the search worker. Called from that worker's thread.
pub trait ProgressSink: Send + Sync {
    /// Called once, after enumeration, with the number of candidate files.
    fn on_start(&self, _total: usize) {}

    /// Called exactly once per processed file.
    fn on_progress(&self, state: ProgressState);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _state: ProgressState) {}
}

impl ProgressSink for watch::Sender<ProgressState> {
    fn on_start(&self, total: usize) {
        self.send_replace(ProgressState {
            processed: 0,
            total,
        });
    }

    fn on_progress(&self, state: ProgressState) {
        self.send_replace(state);
    }
}

impl ProgressSink for mpsc::UnboundedSender<ProgressState> {
    fn on_progress(&self, state: ProgressState) {
        // receiver gone means nobody is watching any more
        let _ = self.send(state);
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Arc<S> {
    fn on_start(&self, total: usize) {
        (**self).on_start(total);
    }

    fn on_progress(&self, state: ProgressState) {
        (**self).on_progress(state);
    }
}

/// Cooperative stop request shared between the caller and the search worker.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_run_is_complete() {
        assert_eq!(ProgressState::default().percent(), 100.0);
    }

    #[test]
    fn percent_tracks_processed_share() {
        let state = ProgressState {
            processed: 1,
            total: 4,
        };
        assert_eq!(state.percent(), 25.0);

        let done = ProgressState {
            processed: 3,
            total: 3,
        };
        assert_eq!(done.percent(), 100.0);
    }

    #[test]
    fn watch_sink_publishes_latest_state() {
        let (sender, receiver) = watch::channel(ProgressState::default());
        sender.on_start(2);
        assert_eq!(*receiver.borrow(), ProgressState { processed: 0, total: 2 });

        sender.on_progress(ProgressState {
            processed: 1,
            total: 2,
        });
        assert_eq!(receiver.borrow().percent(), 50.0);
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        sender.on_progress(ProgressState {
            processed: 1,
            total: 1,
        });
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::default();
        let worker_view = flag.clone();
        assert!(!worker_view.is_requested());

        flag.request();
        assert!(worker_view.is_requested());

        worker_view.reset();
        assert!(!flag.is_requested());
    }
}
