use thiserror::Error;

/// Errors originating from the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input chunk longer than the configured maximum. The ring is untouched.
    #[error("Chunk trop grand : {len} échantillons (max {max})")]
    OversizedChunk {
        /// Length of the rejected chunk.
        len: usize,
        /// Configured maximum chunk length.
        max: usize,
    },

    /// Invalid configuration value or structure. Fatal at construction.
    #[error("Configuration invalide : {0}")]
    InvalidConfiguration(String),

    /// Feature extraction or inference failed for one window.
    ///
    /// Non-fatal: the window's result is never emitted, the pipeline
    /// continues with the next window.
    #[error("Analyse échouée (fenêtre {window_index} @ {timestamp_secs:.3}s) : {reason}")]
    AnalysisFailed {
        /// Index of the originating window.
        window_index: u64,
        /// Start time of the originating window, in seconds.
        timestamp_secs: f64,
        /// What went wrong.
        reason: String,
    },
}

/// Errors raised inside the analysis stage, before window identity is known.
///
/// The worker wraps these into [`PipelineError::AnalysisFailed`] together
/// with the originating window's index and timestamp.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Window length does not match the extractor's expectation.
    #[error("Fenêtre malformée : {got} échantillons, {expected} attendus")]
    MalformedWindow {
        /// Expected sample count.
        expected: usize,
        /// Actual sample count.
        got: usize,
    },

    /// Feature matrix shape does not match the classifier's expectation.
    #[error("Matrice malformée : {got_bands}×{got_frames}")]
    MalformedMatrix {
        /// Actual band count.
        got_bands: usize,
        /// Actual frame count.
        got_frames: usize,
    },

    /// The underlying model could not be invoked.
    #[error("Modèle indisponible : {0}")]
    ModelUnavailable(String),
}
