/// Fenêtre d'analyse : copie immuable de `window_size` échantillons contigus.
///
/// Émise par le ring de fenêtrage, consommée par l'étage d'analyse.
/// Copie indépendante : le ring continue d'accumuler sans aliasing.
///
/// # Example
/// ```
/// use sono_core::frame::AnalysisWindow;
/// let w = AnalysisWindow { index: 2, start_sample: 16384, samples: vec![0.0; 16000] };
/// assert!((w.timestamp_secs(16000) - 1.024).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisWindow {
    /// Monotonically increasing emission index (0, 1, 2, ...).
    pub index: u64,
    /// Offset of the first sample in the stream, in samples.
    pub start_sample: u64,
    /// The samples themselves (mono, f32, normalisé [-1, 1]).
    pub samples: Vec<f32>,
}

impl AnalysisWindow {
    /// Start time of this window in the stream, in seconds.
    #[must_use]
    pub fn timestamp_secs(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.start_sample as f64 / f64::from(sample_rate)
    }
}

/// Matrice de features `bands × frames`, row-major par bande.
///
/// Produite de façon déterministe à partir d'une fenêtre ; immuable
/// une fois construite.
///
/// # Example
/// ```
/// use sono_core::frame::FeatureMatrix;
/// let mut m = FeatureMatrix::zeroed(64, 96);
/// m.set(3, 10, -2.5);
/// assert_eq!(m.at(3, 10), -2.5);
/// assert_eq!(m.band(3).len(), 96);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    bands: usize,
    frames: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    /// Create a zero-filled matrix of the given shape.
    #[must_use]
    pub fn zeroed(bands: usize, frames: usize) -> Self {
        Self {
            bands,
            frames,
            data: vec![0.0; bands * frames],
        }
    }

    /// Number of mel bands (rows).
    #[must_use]
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Number of time frames (columns).
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Value at (band, frame).
    #[inline(always)]
    #[must_use]
    pub fn at(&self, band: usize, frame: usize) -> f32 {
        self.data[band * self.frames + frame]
    }

    /// Write a value at (band, frame).
    #[inline(always)]
    pub fn set(&mut self, band: usize, frame: usize, value: f32) {
        self.data[band * self.frames + frame] = value;
    }

    /// One band's values over time.
    #[inline]
    #[must_use]
    pub fn band(&self, band: usize) -> &[f32] {
        &self.data[band * self.frames..(band + 1) * self.frames]
    }

    /// Flat view of the whole matrix, row-major by band.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Scène acoustique : ensemble fermé de labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneLabel {
    /// Quasi-silence (niveau sous le plancher).
    Silence,
    /// Voix parlée (modulation syllabique dominante).
    Speech,
    /// Musique (structure tonale stable).
    Music,
    /// Bruit large bande (circulation, ventilation, foule).
    Noise,
}

impl SceneLabel {
    /// Tous les labels, dans un ordre stable.
    pub const ALL: [SceneLabel; 4] = [
        SceneLabel::Silence,
        SceneLabel::Speech,
        SceneLabel::Music,
        SceneLabel::Noise,
    ];

    /// Nom lisible pour le debug/UI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SceneLabel::Silence => "silence",
            SceneLabel::Speech => "speech",
            SceneLabel::Music => "music",
            SceneLabel::Noise => "noise",
        }
    }
}

impl std::fmt::Display for SceneLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sortie brute d'un classifieur, sans identité de fenêtre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Inference {
    /// Label retenu.
    pub scene: SceneLabel,
    /// Confiance [0.0, 1.0].
    pub confidence: f32,
    /// Estimation du niveau de bruit, ≥ 0.0.
    pub noise_level: f32,
}

/// Résultat final : une inférence étiquetée par sa fenêtre d'origine.
///
/// Taille fixe, Copy, jamais alloué dynamiquement — écrit par le thread
/// d'analyse, lu par le producteur via le snapshot triple-buffer.
///
/// # Example
/// ```
/// use sono_core::frame::{Inference, InferenceResult, SceneLabel};
/// let r = InferenceResult {
///     window_index: 0,
///     timestamp_secs: 0.0,
///     scene: SceneLabel::Silence,
///     confidence: 1.0,
///     noise_level: 0.0,
/// };
/// assert_eq!(r.scene.as_str(), "silence");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InferenceResult {
    /// Index de la fenêtre d'origine (croissant, jamais réordonné).
    pub window_index: u64,
    /// Début de la fenêtre d'origine, en secondes.
    pub timestamp_secs: f64,
    /// Label retenu.
    pub scene: SceneLabel,
    /// Confiance [0.0, 1.0].
    pub confidence: f32,
    /// Estimation du niveau de bruit, ≥ 0.0.
    pub noise_level: f32,
}

impl InferenceResult {
    /// Assemble a result from a classifier output and its window.
    #[must_use]
    pub fn tagged(inference: Inference, window: &AnalysisWindow, sample_rate: u32) -> Self {
        Self {
            window_index: window.index,
            timestamp_secs: window.timestamp_secs(sample_rate),
            scene: inference.scene,
            confidence: inference.confidence,
            noise_level: inference.noise_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_layout_row_major_by_band() {
        let mut m = FeatureMatrix::zeroed(2, 3);
        m.set(0, 0, 1.0);
        m.set(0, 2, 2.0);
        m.set(1, 1, 3.0);
        assert_eq!(m.data(), &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        assert_eq!(m.band(1), &[0.0, 3.0, 0.0]);
    }

    #[test]
    fn window_timestamp_from_start_sample() {
        let w = AnalysisWindow {
            index: 3,
            start_sample: 24576,
            samples: vec![],
        };
        assert!((w.timestamp_secs(16000) - 1.536).abs() < 1e-9);
        assert_eq!(w.timestamp_secs(0), 0.0);
    }

    #[test]
    fn label_set_is_closed_and_stable() {
        assert_eq!(SceneLabel::ALL.len(), 4);
        for label in SceneLabel::ALL {
            assert!(!label.as_str().is_empty());
        }
    }
}
