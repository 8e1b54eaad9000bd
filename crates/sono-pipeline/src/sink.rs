use sono_core::frame::InferenceResult;
use sono_core::traits::ResultSink;

/// Sink qui pousse chaque résultat dans un canal flume non borné.
///
/// Pratique pour collecter les résultats depuis un autre thread (tests,
/// binaire de démonstration). Si le receiver est parti, les résultats
/// sont jetés silencieusement.
///
/// # Example
/// ```
/// use sono_core::frame::{InferenceResult, SceneLabel};
/// use sono_core::traits::ResultSink;
/// use sono_pipeline::sink::ChannelSink;
///
/// let (mut sink, rx) = ChannelSink::new();
/// let r = InferenceResult {
///     window_index: 0, timestamp_secs: 0.0,
///     scene: SceneLabel::Silence, confidence: 1.0, noise_level: 0.0,
/// };
/// sink.on_result(&r);
/// assert_eq!(rx.recv().unwrap().window_index, 0);
/// ```
pub struct ChannelSink {
    tx: flume::Sender<InferenceResult>,
}

impl ChannelSink {
    /// Create a sink and the receiver to drain it from.
    #[must_use]
    pub fn new() -> (Self, flume::Receiver<InferenceResult>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn on_result(&mut self, result: &InferenceResult) {
        if self.tx.send(*result).is_err() {
            log::debug!("result receiver gone, inference discarded");
        }
    }
}
