/// Configuration, types, and shared structures for sonoscope.
///
/// This crate contains all shared types, trait seams, and configuration
/// logic used across the sonoscope workspace.

pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use config::PipelineConfig;
pub use error::{AnalysisError, PipelineError};
pub use frame::{AnalysisWindow, FeatureMatrix, Inference, InferenceResult, SceneLabel};
pub use traits::{Classifier, FeatureExtractor, ResultSink};
