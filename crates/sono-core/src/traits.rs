use crate::error::AnalysisError;
use crate::frame::{AnalysisWindow, FeatureMatrix, Inference, InferenceResult};

/// Transforme une fenêtre d'analyse en matrice de features.
///
/// CONTRAT : fonction pure — la même fenêtre produit la même matrice.
/// Les buffers internes (plan FFT, scratch) sont pré-alloués dans le
/// constructeur ; `extract` ne doit allouer que la matrice de sortie.
///
/// # Example
/// ```
/// use sono_core::traits::FeatureExtractor;
/// use sono_core::frame::{AnalysisWindow, FeatureMatrix};
/// use sono_core::error::AnalysisError;
///
/// struct DummyExtractor;
/// impl FeatureExtractor for DummyExtractor {
///     fn extract(&mut self, _window: &AnalysisWindow) -> Result<FeatureMatrix, AnalysisError> {
///         Ok(FeatureMatrix::zeroed(8, 4))
///     }
///     fn shape(&self) -> (usize, usize) { (8, 4) }
/// }
/// ```
pub trait FeatureExtractor: Send + 'static {
    /// Compute the feature matrix for one window.
    ///
    /// # Errors
    /// Returns [`AnalysisError`] if the window is malformed. The pipeline
    /// drops that window and continues.
    fn extract(&mut self, window: &AnalysisWindow) -> Result<FeatureMatrix, AnalysisError>;

    /// The (bands, frames) shape every produced matrix has.
    fn shape(&self) -> (usize, usize);
}

/// Transforme une matrice de features en inférence.
///
/// CONTRAT : fonction pure, aucun framing ici — uniquement l'invocation
/// d'un modèle et le mapping de sa sortie vers le jeu de labels fermé
/// plus une estimation scalaire du niveau de bruit.
///
/// # Example
/// ```
/// use sono_core::traits::Classifier;
/// use sono_core::frame::{FeatureMatrix, Inference, SceneLabel};
/// use sono_core::error::AnalysisError;
///
/// struct DummyClassifier;
/// impl Classifier for DummyClassifier {
///     fn infer(&mut self, _features: &FeatureMatrix) -> Result<Inference, AnalysisError> {
///         Ok(Inference { scene: SceneLabel::Silence, confidence: 1.0, noise_level: 0.0 })
///     }
/// }
/// ```
pub trait Classifier: Send + 'static {
    /// Run inference over one feature matrix.
    ///
    /// # Errors
    /// Returns [`AnalysisError`] on a malformed matrix or an unavailable
    /// model. The pipeline drops that window and continues.
    fn infer(&mut self, features: &FeatureMatrix) -> Result<Inference, AnalysisError>;
}

/// Reçoit les résultats d'inférence, dans l'ordre, depuis le thread d'analyse.
///
/// Appelé sur le contexte consommateur — peut bloquer sans gêner le
/// producteur.
pub trait ResultSink: Send + 'static {
    /// Deliver one result. Results arrive in non-decreasing time order.
    fn on_result(&mut self, result: &InferenceResult);
}

/// Toute closure `FnMut(&InferenceResult)` est un sink.
///
/// # Example
/// ```
/// use sono_core::traits::ResultSink;
/// use sono_core::frame::{InferenceResult, SceneLabel};
///
/// let mut count = 0usize;
/// let mut sink = move |_r: &InferenceResult| count += 1;
/// let r = InferenceResult {
///     window_index: 0, timestamp_secs: 0.0,
///     scene: SceneLabel::Silence, confidence: 1.0, noise_level: 0.0,
/// };
/// sink.on_result(&r);
/// ```
impl<F> ResultSink for F
where
    F: FnMut(&InferenceResult) + Send + 'static,
{
    fn on_result(&mut self, result: &InferenceResult) {
        self(result);
    }
}
