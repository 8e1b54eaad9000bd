use rayon::prelude::*;

use sono_core::config::PipelineConfig;
use sono_core::error::PipelineError;
use sono_core::frame::{AnalysisWindow, InferenceResult};
use sono_core::traits::{Classifier, FeatureExtractor};

use crate::classify::EnergyProfileClassifier;
use crate::features::LogMelExtractor;

/// Analyseur offline pour le traitement en lot d'un buffer déjà décodé.
///
/// Produit la même séquence de résultats que le pipeline temps réel
/// (mêmes offsets de fenêtre, même extracteur, même classifieur), mais
/// parallélisée avec rayon — une fenêtre par tâche, état par thread.
///
/// # Example
/// ```
/// use sono_core::config::PipelineConfig;
/// use sono_dsp::batch::BatchAnalyzer;
///
/// let analyzer = BatchAnalyzer::new(PipelineConfig::default()).unwrap();
/// let samples = vec![0.0f32; 32768]; // ~2 s de silence
/// let results = analyzer.analyze_all(&samples).unwrap();
/// assert_eq!(results.len(), 3); // (32768 - 16000) / 8192 + 1
/// ```
pub struct BatchAnalyzer {
    config: PipelineConfig,
}

impl BatchAnalyzer {
    /// Create a batch analyzer for a validated configuration.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfiguration`] if the configuration
    /// does not validate.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Number of windows a buffer of `total` samples yields.
    #[must_use]
    pub fn window_count(&self, total: usize) -> usize {
        if total < self.config.window_size {
            0
        } else {
            (total - self.config.window_size) / self.config.hop_size + 1
        }
    }

    /// Analyze an entire sample buffer.
    ///
    /// Windows whose analysis fails are logged and skipped, matching the
    /// streaming pipeline's failure semantics. Results come back in
    /// window order.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfiguration`] if the extractor
    /// cannot be built.
    pub fn analyze_all(&self, samples: &[f32]) -> Result<Vec<InferenceResult>, PipelineError> {
        let proto_extractor = LogMelExtractor::new(&self.config)?;
        let proto_classifier = EnergyProfileClassifier::default();

        let window_size = self.config.window_size;
        let hop_size = self.config.hop_size;
        let sample_rate = self.config.sample_rate;
        let count = self.window_count(samples.len());

        let results: Vec<InferenceResult> = (0..count)
            .into_par_iter()
            .map_init(
                || (proto_extractor.clone(), proto_classifier.clone()),
                |(extractor, classifier), i| {
                    let start = i * hop_size;
                    let window = AnalysisWindow {
                        index: i as u64,
                        start_sample: start as u64,
                        samples: samples[start..start + window_size].to_vec(),
                    };

                    extractor
                        .extract(&window)
                        .and_then(|m| classifier.infer(&m))
                        .map(|inference| InferenceResult::tagged(inference, &window, sample_rate))
                        .map_err(|e| PipelineError::AnalysisFailed {
                            window_index: window.index,
                            timestamp_secs: window.timestamp_secs(sample_rate),
                            reason: e.to_string(),
                        })
                },
            )
            .filter_map(|r| match r {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("{e}");
                    None
                }
            })
            .collect();

        Ok(results)
    }
}
