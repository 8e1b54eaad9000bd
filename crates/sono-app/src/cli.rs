use std::path::PathBuf;

use clap::Parser;

/// sonoscope — Real-time acoustic scene analysis.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source audio : chemin vers un fichier (WAV, MP3, FLAC, OGG, AAC).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Source synthétique : "silence", "tone", "chord", "noise".
    #[arg(long)]
    pub synth: Option<String>,

    /// Durée de la source synthétique, en secondes.
    #[arg(long, default_value_t = 5.0)]
    pub seconds: f32,

    /// Fichier de configuration TOML. Défaut : valeurs embarquées.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Taille des chunks d'entrée, en échantillons (≤ max_chunk_size).
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Analyse offline en lot (rayon) au lieu du pipeline temps réel.
    #[arg(long, default_value_t = false)]
    pub batch: bool,

    /// Simuler la cadence temps réel de la source (thread producteur + ring SPSC).
    #[arg(long, default_value_t = false)]
    pub realtime: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one audio source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or both sources are specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        let count = usize::from(self.input.is_some()) + usize::from(self.synth.is_some());

        if count == 0 {
            anyhow::bail!("Aucune source audio spécifiée. Utilisez --input ou --synth.");
        }
        if count > 1 {
            anyhow::bail!("Une seule source audio à la fois. Spécifiez --input OU --synth.");
        }
        Ok(())
    }
}
