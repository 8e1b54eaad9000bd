use sono_core::error::AnalysisError;
use sono_core::frame::{FeatureMatrix, Inference, SceneLabel};
use sono_core::traits::Classifier;

use crate::features::ENERGY_FLOOR;

/// Classifieur par profil d'énergie : le modèle par défaut.
///
/// Mapping déterministe de la distribution d'énergie de la matrice
/// log-mel vers le jeu de labels fermé, plus une estimation du niveau
/// de bruit. Le trait [`Classifier`] est la couture pour un vrai modèle
/// appris ; rien d'autre ne change quand on le remplace.
///
/// Décision, dans l'ordre :
/// 1. niveau global sous le plancher → `Silence` ;
/// 2. forte modulation temporelle (syllabique) → `Speech` ;
/// 3. profil spectral plat et stable → `Noise` ;
/// 4. sinon (structure tonale) → `Music`.
///
/// # Example
/// ```
/// use sono_core::frame::{FeatureMatrix, SceneLabel};
/// use sono_core::traits::Classifier;
/// use sono_dsp::classify::EnergyProfileClassifier;
///
/// let mut classifier = EnergyProfileClassifier::default();
/// let silence = FeatureMatrix::zeroed(8, 4); // zéros = bien au-dessus du plancher
/// let result = classifier.infer(&silence).unwrap();
/// assert!(result.noise_level >= 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct EnergyProfileClassifier {
    /// Niveau en dessous duquel la fenêtre est du silence [0.0, 1.0].
    pub silence_level: f32,
    /// Modulation temporelle (log) au-dessus de laquelle on lit de la voix.
    pub speech_flux: f32,
    /// Étalement spectral (log) en dessous duquel le profil est plat.
    pub flat_spread: f32,
}

impl Default for EnergyProfileClassifier {
    fn default() -> Self {
        Self {
            silence_level: 0.15,
            speech_flux: 0.35,
            flat_spread: 1.5,
        }
    }
}

impl Classifier for EnergyProfileClassifier {
    fn infer(&mut self, features: &FeatureMatrix) -> Result<Inference, AnalysisError> {
        let bands = features.bands();
        let frames = features.frames();
        if bands == 0 || frames == 0 {
            return Err(AnalysisError::MalformedMatrix {
                got_bands: bands,
                got_frames: frames,
            });
        }

        let ln_floor = ENERGY_FLOOR.ln();

        // Global level: mean LINEAR energy, re-compressed. A single loud
        // band must not drown in a sea of floor-valued bands.
        let mean_linear = features.data().iter().map(|&v| v.exp()).sum::<f32>()
            / (bands * frames) as f32;
        let level_log = (mean_linear + ENERGY_FLOOR).ln();
        let noise_level = ((level_log - ln_floor) / -ln_floor).max(0.0);

        if noise_level < self.silence_level {
            let confidence = (1.0 - noise_level / self.silence_level).clamp(0.0, 1.0);
            return Ok(Inference {
                scene: SceneLabel::Silence,
                confidence,
                noise_level,
            });
        }

        // Temporal modulation: mean absolute step between column means.
        let col_mean = |t: usize| -> f32 {
            (0..bands).map(|b| features.at(b, t)).sum::<f32>() / bands as f32
        };
        let flux = if frames < 2 {
            0.0
        } else {
            (1..frames)
                .map(|t| (col_mean(t) - col_mean(t - 1)).abs())
                .sum::<f32>()
                / (frames - 1) as f32
        };

        // Spectral spread: standard deviation of time-averaged band means.
        let band_mean: Vec<f32> = (0..bands)
            .map(|b| features.band(b).iter().sum::<f32>() / frames as f32)
            .collect();
        let overall = band_mean.iter().sum::<f32>() / bands as f32;
        let spread = (band_mean
            .iter()
            .map(|&m| (m - overall) * (m - overall))
            .sum::<f32>()
            / bands as f32)
            .sqrt();

        let (scene, confidence) = if flux > self.speech_flux {
            (
                SceneLabel::Speech,
                ((flux - self.speech_flux) / self.speech_flux).clamp(0.0, 1.0),
            )
        } else if spread < self.flat_spread {
            (
                SceneLabel::Noise,
                ((self.flat_spread - spread) / self.flat_spread).clamp(0.0, 1.0),
            )
        } else {
            (
                SceneLabel::Music,
                (1.0 - flux / self.speech_flux).clamp(0.0, 1.0),
            )
        };

        Ok(Inference {
            scene,
            confidence,
            noise_level,
        })
    }
}
