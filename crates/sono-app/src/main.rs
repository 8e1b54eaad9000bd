use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use sono_core::config::{PipelineConfig, load_config};
use sono_core::frame::InferenceResult;
use sono_dsp::batch::BatchAnalyzer;
use sono_pipeline::pipeline::{Pipeline, PipelineStats};

pub mod cli;
pub mod decode;
pub mod synth;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };

    let chunk_size = cli.chunk_size.unwrap_or(config.max_chunk_size);
    if chunk_size == 0 || chunk_size > config.max_chunk_size {
        anyhow::bail!(
            "chunk_size ({chunk_size}) doit être dans [1, {}]",
            config.max_chunk_size
        );
    }

    // 5. Obtenir les échantillons (mono, f32, au taux configuré)
    let samples = if let Some(path) = &cli.input {
        let (decoded, native_rate) = decode::decode_file(path)?;
        if native_rate != config.sample_rate {
            log::info!(
                "Rééchantillonnage {} Hz -> {} Hz",
                native_rate,
                config.sample_rate
            );
        }
        decode::resample_linear(&decoded, native_rate, config.sample_rate)
    } else if let Some(scene) = &cli.synth {
        synth::generate(scene, cli.seconds, config.sample_rate)?
    } else {
        unreachable!("validate_source garantit une source");
    };

    if samples.len() < config.window_size {
        anyhow::bail!(
            "Source trop courte : {} échantillons, {} requis pour une fenêtre",
            samples.len(),
            config.window_size
        );
    }

    // 6. Analyser
    if cli.batch {
        run_batch(&samples, config)
    } else if cli.realtime {
        let stats = run_live(samples, config, chunk_size)?;
        print_stats(&stats);
        Ok(())
    } else {
        let stats = run_streaming(&samples, config, chunk_size)?;
        print_stats(&stats);
        Ok(())
    }
}

/// Affiche un résultat d'inférence sur stdout.
fn print_result(r: &InferenceResult) {
    println!(
        "[{:8.3}s] {:8} conf {:.2}  bruit {:.2}",
        r.timestamp_secs,
        r.scene.as_str(),
        r.confidence,
        r.noise_level
    );
}

fn print_stats(stats: &PipelineStats) {
    println!(
        "-- {} fenêtres, {} perdues, {} échecs, {} résultats",
        stats.windows_dispatched,
        stats.dropped_frames,
        stats.analysis_failures,
        stats.completed()
    );
}

/// Analyse offline en lot : toutes les fenêtres, parallélisées par rayon.
fn run_batch(samples: &[f32], config: PipelineConfig) -> Result<()> {
    let analyzer = BatchAnalyzer::new(config)?;
    let results = analyzer.analyze_all(samples)?;

    for r in &results {
        print_result(r);
    }
    println!("-- {} fenêtres analysées", results.len());
    Ok(())
}

/// Pipeline temps réel, alimenté aussi vite que possible.
fn run_streaming(
    samples: &[f32],
    config: PipelineConfig,
    chunk_size: usize,
) -> Result<PipelineStats> {
    let mut pipeline = Pipeline::with_default_stages(config, |r: &InferenceResult| print_result(r))?;

    for chunk in samples.chunks(chunk_size) {
        pipeline.ingest(chunk)?;
    }
    pipeline.close()
}

/// Pipeline temps réel alimenté à la cadence de la source : un thread
/// producteur pousse les échantillons dans un ring SPSC lock-free, la
/// boucle principale le vide en chunks et les ingère.
fn run_live(samples: Vec<f32>, config: PipelineConfig, chunk_size: usize) -> Result<PipelineStats> {
    let sample_rate = config.sample_rate as usize;

    // Ring buffer: 1 second of audio.
    let (mut producer, mut consumer) = rtrb::RingBuffer::new(sample_rate);

    let done = Arc::new(AtomicBool::new(false));
    let done_src = Arc::clone(&done);

    let source = thread::Builder::new()
        .name("sono-source".to_string())
        .spawn(move || {
            // 10 ms of samples per tick.
            let step = (sample_rate / 100).max(1);
            for block in samples.chunks(step) {
                for &sample in block {
                    while producer.push(sample).is_err() {
                        thread::sleep(Duration::from_millis(1));
                    }
                }
                thread::sleep(Duration::from_millis(10));
            }
            done_src.store(true, Ordering::Relaxed);
        })
        .context("Impossible de démarrer le thread source")?;

    let mut pipeline = Pipeline::with_default_stages(config, |r: &InferenceResult| print_result(r))?;
    let mut chunk: Vec<f32> = Vec::with_capacity(chunk_size);

    loop {
        chunk.clear();
        while chunk.len() < chunk_size {
            match consumer.pop() {
                Ok(sample) => chunk.push(sample),
                Err(_) => break,
            }
        }
        if !chunk.is_empty() {
            pipeline.ingest(&chunk)?;
        }

        if done.load(Ordering::Relaxed) && consumer.slots() == 0 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    source
        .join()
        .map_err(|_| anyhow::anyhow!("Le thread source a paniqué"))?;
    pipeline.close()
}
