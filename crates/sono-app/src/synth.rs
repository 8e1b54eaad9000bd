use std::f32::consts::PI;

use anyhow::Result;

/// Générateur de signaux de test, un par scène attendue.
///
/// Déterministe (le bruit est un xorshift à graine fixe) : deux appels
/// identiques produisent le même buffer.
///
/// # Errors
/// Retourne une erreur si le nom de scène n'est pas reconnu.
pub fn generate(scene: &str, seconds: f32, sample_rate: u32) -> Result<Vec<f32>> {
    let n = (seconds.max(0.0) * sample_rate as f32) as usize;
    match scene.to_lowercase().as_str() {
        "silence" => Ok(vec![0.0; n]),
        "tone" => Ok(tone(n, sample_rate, &[(440.0, 0.5)])),
        "chord" => Ok(tone(
            n,
            sample_rate,
            // A major triad.
            &[(440.0, 0.3), (554.37, 0.25), (659.25, 0.2)],
        )),
        "noise" => Ok(white_noise(n)),
        _ => anyhow::bail!(
            "Scène synthétique inconnue : {scene}. Supporté : silence, tone, chord, noise"
        ),
    }
}

/// Somme de sinusoïdes (fréquence, amplitude).
fn tone(n: usize, sample_rate: u32, partials: &[(f32, f32)]) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            partials
                .iter()
                .map(|&(freq, amp)| amp * (2.0 * PI * freq * t).sin())
                .sum::<f32>()
        })
        .collect()
}

/// Bruit blanc via xorshift32, graine fixe.
fn white_noise(n: usize) -> Vec<f32> {
    let mut state: u32 = 0x9E37_79B9;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            // u32 -> [-0.5, 0.5)
            (state as f32 / u32::MAX as f32) - 0.5
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_length_follows_duration() {
        let s = generate("silence", 2.0, 16000).expect("generate");
        assert_eq!(s.len(), 32000);
    }

    #[test]
    fn silence_is_all_zeros() {
        let s = generate("silence", 0.5, 16000).expect("generate");
        assert!(s.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn tone_stays_in_range() {
        let s = generate("tone", 1.0, 16000).expect("generate");
        assert!(s.iter().all(|&x| x.abs() <= 1.0));
        assert!(s.iter().any(|&x| x.abs() > 0.1));
    }

    #[test]
    fn noise_is_deterministic() {
        let a = generate("noise", 0.1, 16000).expect("generate");
        let b = generate("noise", 0.1, 16000).expect("generate");
        assert_eq!(a, b);
        assert!(a.iter().any(|&x| x != 0.0));
    }

    #[test]
    fn unknown_scene_rejected() {
        assert!(generate("rainforest", 1.0, 16000).is_err());
    }
}
