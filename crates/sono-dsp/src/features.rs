use sono_core::config::PipelineConfig;
use sono_core::error::{AnalysisError, PipelineError};
use sono_core::frame::{AnalysisWindow, FeatureMatrix};
use sono_core::traits::FeatureExtractor;

use crate::mel::MelFilterbank;
use crate::stft::StftPipeline;

/// Plancher d'énergie avant compression logarithmique.
///
/// Une bande silencieuse vaut donc `ENERGY_FLOOR.ln()` (≈ -23.03).
pub const ENERGY_FLOOR: f32 = 1e-10;

/// Extracteur log-mel : la sémantique réelle de l'étage de features.
///
/// Partitionne la fenêtre en `frame_count` sous-trames de `fft_size`
/// échantillons à stride fixe, FFT fenêtrée (Hann) par sous-trame,
/// spectre de puissance → bandes mel triangulaires → compression log.
///
/// Fonction pure : la même fenêtre produit la même matrice.
///
/// # Example
/// ```
/// use sono_core::config::PipelineConfig;
/// use sono_dsp::features::LogMelExtractor;
/// let extractor = LogMelExtractor::new(&PipelineConfig::default()).unwrap();
/// ```
#[derive(Clone)]
pub struct LogMelExtractor {
    stft: StftPipeline,
    mel: MelFilterbank,
    window_size: usize,
    fft_size: usize,
    intra_hop: usize,
    bands: usize,
    frames: usize,
    /// Scratch for one column of band energies (pre-allocated).
    band_buf: Vec<f32>,
}

impl LogMelExtractor {
    /// Build an extractor from a validated configuration.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfiguration`] if the configuration
    /// does not validate.
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        Ok(Self {
            stft: StftPipeline::new(config.fft_size),
            mel: MelFilterbank::new(config.mel_bands, config.fft_size, config.sample_rate),
            window_size: config.window_size,
            fft_size: config.fft_size,
            intra_hop: config.intra_hop(),
            bands: config.mel_bands,
            frames: config.frame_count,
            band_buf: vec![0.0; config.mel_bands],
        })
    }
}

impl FeatureExtractor for LogMelExtractor {
    fn extract(&mut self, window: &AnalysisWindow) -> Result<FeatureMatrix, AnalysisError> {
        if window.samples.len() != self.window_size {
            return Err(AnalysisError::MalformedWindow {
                expected: self.window_size,
                got: window.samples.len(),
            });
        }

        let mut matrix = FeatureMatrix::zeroed(self.bands, self.frames);
        for t in 0..self.frames {
            let start = t * self.intra_hop;
            let frame = &window.samples[start..start + self.fft_size];

            let power = self.stft.process(frame);
            self.mel.apply(power, &mut self.band_buf);

            for (b, &energy) in self.band_buf.iter().enumerate() {
                matrix.set(b, t, (energy + ENERGY_FLOOR).ln());
            }
        }

        Ok(matrix)
    }

    fn shape(&self) -> (usize, usize) {
        (self.bands, self.frames)
    }
}

/// Extracteur de dégrossissage : moyenne d'amplitude par tranche.
///
/// Stand-in de mise au point, PAS la sémantique finale — même contrat de
/// forme que [`LogMelExtractor`], interchangeable via le trait sans
/// toucher au ring ni au dispatcher. Les « bandes » sont des tranches
/// contiguës de la sous-trame, pas des bandes fréquentielles.
#[derive(Clone)]
pub struct MeanBandExtractor {
    window_size: usize,
    bands: usize,
    frames: usize,
}

impl MeanBandExtractor {
    /// Build a stand-in extractor with the same shape contract.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfiguration`] if the configuration
    /// does not validate.
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            window_size: config.window_size,
            bands: config.mel_bands,
            frames: config.frame_count,
        })
    }
}

impl FeatureExtractor for MeanBandExtractor {
    fn extract(&mut self, window: &AnalysisWindow) -> Result<FeatureMatrix, AnalysisError> {
        if window.samples.len() != self.window_size {
            return Err(AnalysisError::MalformedWindow {
                expected: self.window_size,
                got: window.samples.len(),
            });
        }

        let slice_len = self.window_size / self.frames;
        let mut matrix = FeatureMatrix::zeroed(self.bands, self.frames);

        for t in 0..self.frames {
            let slice = &window.samples[t * slice_len..(t + 1) * slice_len];
            let chunk_len = (slice.len() / self.bands).max(1);

            for b in 0..self.bands {
                let lo = (b * chunk_len).min(slice.len());
                let hi = ((b + 1) * chunk_len).min(slice.len());
                let mean_abs = if lo < hi {
                    slice[lo..hi].iter().map(|s| s.abs()).sum::<f32>() / (hi - lo) as f32
                } else {
                    0.0
                };
                matrix.set(b, t, (mean_abs + ENERGY_FLOOR).ln());
            }
        }

        Ok(matrix)
    }

    fn shape(&self) -> (usize, usize) {
        (self.bands, self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            sample_rate: 16000,
            window_size: 800,
            hop_size: 400,
            max_chunk_size: 512,
            mel_bands: 16,
            frame_count: 4,
            fft_size: 200,
            queue_depth: 2,
        }
    }

    fn window_of(samples: Vec<f32>) -> AnalysisWindow {
        AnalysisWindow {
            index: 0,
            start_sample: 0,
            samples,
        }
    }

    #[test]
    fn log_mel_shape_matches_config() {
        let config = small_config();
        let mut extractor = LogMelExtractor::new(&config).expect("extractor");
        assert_eq!(extractor.shape(), (16, 4));

        let matrix = extractor
            .extract(&window_of(vec![0.0; 800]))
            .expect("extract");
        assert_eq!(matrix.bands(), 16);
        assert_eq!(matrix.frames(), 4);
    }

    #[test]
    fn log_mel_is_deterministic() {
        let config = small_config();
        let mut extractor = LogMelExtractor::new(&config).expect("extractor");

        let samples: Vec<f32> = (0..800)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
            .collect();
        let window = window_of(samples);

        let first = extractor.extract(&window).expect("extract");
        let second = extractor.extract(&window).expect("extract");
        assert_eq!(first, second);
    }

    #[test]
    fn silence_sits_on_the_log_floor() {
        let config = small_config();
        let mut extractor = LogMelExtractor::new(&config).expect("extractor");
        let matrix = extractor
            .extract(&window_of(vec![0.0; 800]))
            .expect("extract");

        let floor = ENERGY_FLOOR.ln();
        for &v in matrix.data() {
            assert!((v - floor).abs() < 1e-3, "expected floor, got {v}");
        }
    }

    #[test]
    fn tone_raises_one_band_above_the_rest() {
        let config = PipelineConfig {
            mel_bands: 40,
            ..PipelineConfig::default()
        };
        let mut extractor = LogMelExtractor::new(&config).expect("extractor");

        // 1 kHz tone, full scale.
        let samples: Vec<f32> = (0..16000)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 16000.0).sin())
            .collect();
        let matrix = extractor.extract(&window_of(samples)).expect("extract");

        // Time-averaged energy per band; the peak band must clear the
        // median band by a wide margin.
        let mut means: Vec<f32> = (0..matrix.bands())
            .map(|b| matrix.band(b).iter().sum::<f32>() / matrix.frames() as f32)
            .collect();
        let peak = means.iter().copied().fold(f32::MIN, f32::max);
        means.sort_by(f32::total_cmp);
        let median = means[means.len() / 2];
        assert!(peak > median + 3.0, "peak {peak} vs median {median}");
    }

    #[test]
    fn malformed_window_is_rejected() {
        let config = small_config();
        let mut extractor = LogMelExtractor::new(&config).expect("extractor");
        let err = extractor.extract(&window_of(vec![0.0; 799]));
        assert!(matches!(
            err,
            Err(AnalysisError::MalformedWindow {
                expected: 800,
                got: 799
            })
        ));
    }

    #[test]
    fn stand_in_honors_the_same_shape_contract() {
        let config = small_config();
        let mut stand_in = MeanBandExtractor::new(&config).expect("extractor");
        let mut real = LogMelExtractor::new(&config).expect("extractor");

        let window = window_of(vec![0.1; 800]);
        let a = stand_in.extract(&window).expect("extract");
        let b = real.extract(&window).expect("extract");
        assert_eq!((a.bands(), a.frames()), (b.bands(), b.frames()));
    }
}
