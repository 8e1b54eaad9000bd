use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use sono_core::error::PipelineError;
use sono_core::frame::{AnalysisWindow, InferenceResult};
use sono_core::traits::{Classifier, FeatureExtractor, ResultSink};

/// Spawn the analysis thread.
///
/// The loop blocks on the dispatcher queue, runs extraction then inference
/// for each window, and delivers results to the sink in window order. A
/// failed window is logged, counted, and skipped — never fatal. The loop
/// ends when every sender side of the queue is dropped; queued windows are
/// drained and completed first, and no partial result is ever emitted.
pub(crate) fn spawn_analysis_thread<E, C, S>(
    rx: flume::Receiver<AnalysisWindow>,
    mut extractor: E,
    mut classifier: C,
    mut sink: S,
    mut latest: triple_buffer::Input<Option<InferenceResult>>,
    failures: Arc<AtomicU64>,
    sample_rate: u32,
) -> std::io::Result<JoinHandle<()>>
where
    E: FeatureExtractor,
    C: Classifier,
    S: ResultSink,
{
    std::thread::Builder::new()
        .name("sono-analysis".to_string())
        .spawn(move || {
            for window in rx.iter() {
                match extractor
                    .extract(&window)
                    .and_then(|matrix| classifier.infer(&matrix))
                {
                    Ok(inference) => {
                        let result = InferenceResult::tagged(inference, &window, sample_rate);
                        sink.on_result(&result);
                        latest.write(Some(result));
                    }
                    Err(e) => {
                        failures.fetch_add(1, Ordering::Relaxed);
                        let err = PipelineError::AnalysisFailed {
                            window_index: window.index,
                            timestamp_secs: window.timestamp_secs(sample_rate),
                            reason: e.to_string(),
                        };
                        log::warn!("{err}");
                    }
                }
            }
            log::debug!("analysis thread: queue disconnected, exiting");
        })
}
