// Feature extraction and inference stages for sonoscope.

pub mod batch;
pub mod classify;
pub mod features;
pub mod mel;
pub mod stft;

pub use batch::BatchAnalyzer;
pub use classify::EnergyProfileClassifier;
pub use features::{LogMelExtractor, MeanBandExtractor};
pub use mel::MelFilterbank;
pub use stft::StftPipeline;
