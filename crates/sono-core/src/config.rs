use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Configuration complète du pipeline, fixée à la construction.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine
/// (16 kHz mono, fenêtres de 1 s, hop de 512 ms).
///
/// # Example
/// ```
/// use sono_core::config::PipelineConfig;
/// let config = PipelineConfig::default();
/// assert_eq!(config.window_size, 16000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    // === Flux d'entrée ===
    /// Taux d'échantillonnage attendu, en Hz.
    pub sample_rate: u32,
    /// Taille d'une fenêtre d'analyse, en échantillons.
    pub window_size: usize,
    /// Avance entre deux fenêtres consécutives, en échantillons.
    /// `hop_size == window_size` donne des fenêtres sans recouvrement.
    pub hop_size: usize,
    /// Taille maximale d'un chunk d'entrée, en échantillons.
    pub max_chunk_size: usize,

    // === Features ===
    /// Nombre de bandes mel de la matrice de features.
    pub mel_bands: usize,
    /// Nombre de sous-trames temporelles par fenêtre.
    pub frame_count: usize,
    /// Taille de la FFT interne, en échantillons.
    pub fft_size: usize,

    // === Handoff ===
    /// Profondeur de la file du dispatcher (drop-oldest en cas de débordement).
    pub queue_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            window_size: 16000,
            hop_size: 8192,
            max_chunk_size: 4096,
            mel_bands: 64,
            frame_count: 96,
            fft_size: 800,
            queue_depth: 2,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfiguration`] if any size is zero,
    /// if `hop_size > window_size` (samples would be skipped silently), if
    /// the FFT does not fit in a window, or if the internal frame layout
    /// does not divide exactly.
    ///
    /// # Example
    /// ```
    /// use sono_core::config::PipelineConfig;
    /// let mut config = PipelineConfig::default();
    /// config.hop_size = config.window_size + 1;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| Err(PipelineError::InvalidConfiguration(msg));

        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive".into());
        }
        if self.window_size == 0 || self.hop_size == 0 || self.max_chunk_size == 0 {
            return invalid(format!(
                "window_size ({}), hop_size ({}) and max_chunk_size ({}) must be positive",
                self.window_size, self.hop_size, self.max_chunk_size
            ));
        }
        if self.hop_size > self.window_size {
            return invalid(format!(
                "hop_size ({}) exceeds window_size ({}): samples would be skipped",
                self.hop_size, self.window_size
            ));
        }
        if self.mel_bands == 0 || self.frame_count == 0 || self.fft_size == 0 {
            return invalid(format!(
                "mel_bands ({}), frame_count ({}) and fft_size ({}) must be positive",
                self.mel_bands, self.frame_count, self.fft_size
            ));
        }
        if self.fft_size > self.window_size {
            return invalid(format!(
                "fft_size ({}) exceeds window_size ({})",
                self.fft_size, self.window_size
            ));
        }
        if self.mel_bands > self.fft_size / 2 + 1 {
            return invalid(format!(
                "mel_bands ({}) exceeds the {} spectrum bins of a {}-point FFT",
                self.mel_bands,
                self.fft_size / 2 + 1,
                self.fft_size
            ));
        }
        if self.frame_count > 1 && (self.window_size - self.fft_size) % (self.frame_count - 1) != 0
        {
            return invalid(format!(
                "frame layout does not divide exactly: ({} - {}) is not a multiple of {}",
                self.window_size,
                self.fft_size,
                self.frame_count - 1
            ));
        }
        if self.queue_depth == 0 {
            return invalid("queue_depth must be at least 1".into());
        }

        Ok(())
    }

    /// Internal stride between two sub-frames of a window, in samples.
    ///
    /// Derived so that exactly `frame_count` sub-frames of `fft_size`
    /// samples tile a window. Zero when `frame_count == 1`.
    ///
    /// # Example
    /// ```
    /// use sono_core::config::PipelineConfig;
    /// let config = PipelineConfig::default();
    /// // (16000 - 800) / 95 = 160 samples, 10 ms @ 16 kHz.
    /// assert_eq!(config.intra_hop(), 160);
    /// ```
    #[must_use]
    pub fn intra_hop(&self) -> usize {
        if self.frame_count <= 1 {
            0
        } else {
            (self.window_size - self.fft_size) / (self.frame_count - 1)
        }
    }

    /// Ring storage capacity needed to ingest without overflow.
    #[must_use]
    pub fn storage_capacity(&self) -> usize {
        self.window_size + self.max_chunk_size
    }

    /// Duration of one analysis window, in seconds.
    #[must_use]
    pub fn window_secs(&self) -> f64 {
        self.window_size as f64 / f64::from(self.sample_rate)
    }
}

/// Fichier TOML avec une table `[pipeline]` optionnelle.
#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    pipeline: Option<PipelineConfig>,
}

/// Load a pipeline configuration from a TOML file.
///
/// Missing fields fall back to their defaults; the result is validated.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let config = file.pipeline.unwrap_or_default();
    config
        .validate()
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    Ok(config)
}
