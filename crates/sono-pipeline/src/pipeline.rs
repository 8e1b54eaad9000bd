use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use anyhow::Result;
use triple_buffer::TripleBuffer;

use sono_core::config::PipelineConfig;
use sono_core::error::PipelineError;
use sono_core::frame::InferenceResult;
use sono_core::traits::{Classifier, FeatureExtractor, ResultSink};
use sono_dsp::classify::EnergyProfileClassifier;
use sono_dsp::features::LogMelExtractor;

use crate::dispatch::FrameDispatcher;
use crate::window::WindowBuffer;
use crate::worker::spawn_analysis_thread;

/// Compteurs finaux du pipeline, retournés par [`Pipeline::close`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Windows handed to the dispatcher.
    pub windows_dispatched: u64,
    /// Windows evicted on queue overflow.
    pub dropped_frames: u64,
    /// Windows whose analysis failed.
    pub analysis_failures: u64,
}

impl PipelineStats {
    /// Windows that produced a result.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.windows_dispatched
            .saturating_sub(self.dropped_frames)
            .saturating_sub(self.analysis_failures)
    }
}

/// Pipeline d'analyse assemblé : ring de fenêtrage, dispatcher borné,
/// thread d'analyse.
///
/// Côté producteur : `ingest` découpe le flux en fenêtres et les passe au
/// dispatcher — copies et décalages bornés uniquement, jamais de blocage.
/// Côté consommateur : le thread `sono-analysis` tourne à son rythme et
/// livre les résultats au sink dans l'ordre des fenêtres.
///
/// `close` consomme le pipeline : plus aucun chunk accepté, la file se
/// vide, le thread se termine proprement.
///
/// # Example
/// ```no_run
/// use sono_core::config::PipelineConfig;
/// use sono_pipeline::pipeline::Pipeline;
/// use sono_pipeline::sink::ChannelSink;
///
/// let (sink, results) = ChannelSink::new();
/// let mut pipeline = Pipeline::with_default_stages(PipelineConfig::default(), sink).unwrap();
///
/// pipeline.ingest(&[0.0; 4096]).unwrap();
/// let stats = pipeline.close().unwrap();
/// assert_eq!(stats.windows_dispatched, results.len() as u64);
/// ```
pub struct Pipeline {
    buffer: WindowBuffer,
    dispatcher: FrameDispatcher,
    latest: triple_buffer::Output<Option<InferenceResult>>,
    worker: Option<JoinHandle<()>>,
    failures: Arc<AtomicU64>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Assemble and start a pipeline with explicit analysis stages.
    ///
    /// # Errors
    /// Fails on an invalid configuration, on an extractor whose shape does
    /// not match the configuration, or if the worker thread cannot start.
    pub fn spawn<E, C, S>(
        config: PipelineConfig,
        extractor: E,
        classifier: C,
        sink: S,
    ) -> Result<Self>
    where
        E: FeatureExtractor,
        C: Classifier,
        S: ResultSink,
    {
        config.validate()?;

        let shape = extractor.shape();
        if shape != (config.mel_bands, config.frame_count) {
            return Err(PipelineError::InvalidConfiguration(format!(
                "extractor shape {:?} does not match configured {:?}",
                shape,
                (config.mel_bands, config.frame_count)
            ))
            .into());
        }

        let buffer = WindowBuffer::new(config.window_size, config.hop_size, config.max_chunk_size)?;
        let (dispatcher, rx) = FrameDispatcher::new(config.queue_depth);

        let (latest_in, latest_out) = TripleBuffer::new(&None).split();
        let failures = Arc::new(AtomicU64::new(0));

        let worker = spawn_analysis_thread(
            rx,
            extractor,
            classifier,
            sink,
            latest_in,
            Arc::clone(&failures),
            config.sample_rate,
        )?;

        log::info!(
            "pipeline started: window {} / hop {} @ {} Hz, {} mel bands × {} frames, queue {}",
            config.window_size,
            config.hop_size,
            config.sample_rate,
            config.mel_bands,
            config.frame_count,
            config.queue_depth
        );

        Ok(Self {
            buffer,
            dispatcher,
            latest: latest_out,
            worker: Some(worker),
            failures,
            config,
        })
    }

    /// Assemble a pipeline with the default stages (log-mel features,
    /// energy-profile classifier).
    ///
    /// # Errors
    /// Same failure modes as [`Pipeline::spawn`].
    pub fn with_default_stages<S: ResultSink>(config: PipelineConfig, sink: S) -> Result<Self> {
        let extractor = LogMelExtractor::new(&config)?;
        let classifier = EnergyProfileClassifier::default();
        Self::spawn(config, extractor, classifier, sink)
    }

    /// Ingest one chunk of samples. Never blocks, never allocates in the
    /// ring; each completed hop dispatches one window.
    ///
    /// Returns how many windows were dispatched.
    ///
    /// # Errors
    /// Returns [`PipelineError::OversizedChunk`] for a chunk longer than
    /// the configured maximum; the ring is untouched.
    pub fn ingest(&mut self, chunk: &[f32]) -> Result<usize, PipelineError> {
        let dispatcher = &self.dispatcher;
        self.buffer.ingest(chunk, |window| dispatcher.dispatch(window))
    }

    /// Latest available result, if any. Non-blocking snapshot read.
    pub fn latest(&mut self) -> Option<InferenceResult> {
        *self.latest.read()
    }

    /// Windows evicted on dispatcher overflow so far.
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dispatcher.dropped_frames()
    }

    /// Windows whose analysis failed so far.
    #[must_use]
    pub fn analysis_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Windows handed to the dispatcher so far.
    #[must_use]
    pub fn windows_dispatched(&self) -> u64 {
        self.buffer.windows_emitted()
    }

    /// The configuration this pipeline was built with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stop the pipeline: no further chunks are accepted (the pipeline is
    /// consumed), queued windows drain and complete, the worker exits.
    ///
    /// Returns the final counters.
    ///
    /// # Errors
    /// Returns an error if the analysis thread panicked.
    pub fn close(self) -> Result<PipelineStats> {
        let stats = PipelineStats {
            windows_dispatched: self.buffer.windows_emitted(),
            dropped_frames: self.dispatcher.dropped_frames(),
            analysis_failures: self.failures.load(Ordering::Relaxed),
        };

        // Dropping the dispatcher disconnects the queue's sender side; the
        // worker drains what is left and exits.
        drop(self.dispatcher);
        drop(self.buffer);

        if let Some(handle) = self.worker {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("Le thread d'analyse a paniqué"))?;
        }

        // Failures may still have occurred while draining.
        Ok(PipelineStats {
            analysis_failures: stats
                .analysis_failures
                .max(self.failures.load(Ordering::Relaxed)),
            ..stats
        })
    }
}
