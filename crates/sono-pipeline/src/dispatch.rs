use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sono_core::frame::AnalysisWindow;

/// Handoff borné entre le contexte producteur et le thread d'analyse.
///
/// `dispatch` retourne toujours immédiatement : en cas de débordement, la
/// fenêtre la plus ANCIENNE en attente est jetée (le contexte récent compte
/// plus que l'exhaustivité pour un signal d'attention en direct), le
/// compteur de drops est incrémenté, et la nouvelle fenêtre est enfilée.
/// La mémoire est bornée par la profondeur de la file.
///
/// Discipline single-producer/single-consumer : un seul contexte appelle
/// `dispatch`, un seul thread consomme le receiver.
///
/// # Example
/// ```
/// use sono_pipeline::dispatch::FrameDispatcher;
/// let (dispatcher, _rx) = FrameDispatcher::new(2);
/// assert_eq!(dispatcher.dropped_frames(), 0);
/// ```
pub struct FrameDispatcher {
    tx: flume::Sender<AnalysisWindow>,
    /// Receiver clone used ONLY to evict the oldest pending window on
    /// overflow. Never iterated.
    reclaim: flume::Receiver<AnalysisWindow>,
    dropped: Arc<AtomicU64>,
}

impl FrameDispatcher {
    /// Create a dispatcher with a bounded queue of `depth` windows.
    ///
    /// Returns the dispatcher and the consumer-side receiver.
    ///
    /// # Panics
    /// Panics if `depth` is 0 (a rendezvous queue would block the producer).
    #[must_use]
    pub fn new(depth: usize) -> (Self, flume::Receiver<AnalysisWindow>) {
        assert!(depth > 0, "queue depth must be at least 1");
        let (tx, rx) = flume::bounded(depth);
        (
            Self {
                tx,
                reclaim: rx.clone(),
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Hand one window to the analysis stage. Never blocks.
    ///
    /// On overflow the oldest pending window is evicted and counted; the
    /// incoming window is never the one dropped. If the consumer is gone,
    /// the window is discarded silently (the pipeline is shutting down).
    pub fn dispatch(&self, window: AnalysisWindow) {
        let mut pending = window;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return,
                Err(flume::TrySendError::Full(back)) => {
                    pending = back;
                    // Evict the oldest; if the consumer raced us and drained
                    // the slot, the next try_send succeeds without a drop.
                    if self.reclaim.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(flume::TrySendError::Disconnected(_)) => {
                    // Not reachable while `reclaim` holds a receiver; the
                    // match must stay total regardless.
                    log::debug!("analysis consumer gone, window discarded");
                    return;
                }
            }
        }
    }

    /// Monotonically non-decreasing count of evicted windows.
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(index: u64) -> AnalysisWindow {
        AnalysisWindow {
            index,
            start_sample: index * 100,
            samples: vec![0.0; 4],
        }
    }

    #[test]
    fn dispatch_never_blocks_with_a_stalled_consumer() {
        // The receiver exists but nothing ever reads from it.
        let (dispatcher, rx) = FrameDispatcher::new(2);

        for i in 0..10 {
            dispatcher.dispatch(window(i));
            assert!(rx.len() <= 2, "queue depth exceeded its bound");
        }

        assert_eq!(dispatcher.dropped_frames(), 8);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let (dispatcher, rx) = FrameDispatcher::new(2);

        for i in 0..10 {
            dispatcher.dispatch(window(i));
        }

        // Only the two newest windows survive, in order.
        let survivors: Vec<u64> = rx.drain().map(|w| w.index).collect();
        assert_eq!(survivors, vec![8, 9]);
    }

    #[test]
    fn no_drop_while_the_consumer_keeps_up() {
        let (dispatcher, rx) = FrameDispatcher::new(1);

        for i in 0..100 {
            dispatcher.dispatch(window(i));
            let received = rx.recv().expect("recv");
            assert_eq!(received.index, i);
        }

        assert_eq!(dispatcher.dropped_frames(), 0);
    }

    #[test]
    fn drop_counter_is_monotonic() {
        let (dispatcher, _rx) = FrameDispatcher::new(1);
        let mut last = 0;
        for i in 0..20 {
            dispatcher.dispatch(window(i));
            let now = dispatcher.dropped_frames();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 19);
    }

    #[test]
    fn dispatch_stays_bounded_after_consumer_drop() {
        let (dispatcher, rx) = FrameDispatcher::new(2);
        drop(rx);
        // With the consumer gone the queue degrades to a bounded slot
        // nobody reads: dispatch keeps returning immediately and keeps
        // evicting the oldest entry.
        for i in 0..5 {
            dispatcher.dispatch(window(i));
        }
        assert_eq!(dispatcher.dropped_frames(), 3);
    }
}
