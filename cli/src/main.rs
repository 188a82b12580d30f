use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use vadlite_core::config::{load_config, load_default_config};
use vadlite_core::{decode_f32le, Config, SampleRate, VadSession};

#[derive(Parser)]
#[command(name = "vadctl")]
#[command(about = "Inspect and smoke-test vadlite voice activity detection")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the window size for a sample rate
    WindowSize {
        #[arg(long, default_value_t = 16000)]
        sample_rate: u32,
    },
    /// Score a silent window and a 440 Hz tone window
    Probe {
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        sample_rate: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Score every window of a raw little-endian f32 mono file
    Scan {
        input: PathBuf,
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        sample_rate: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Serialize)]
struct ProbeReport {
    sample_rate: u32,
    window_size_samples: usize,
    silence: f32,
    tone: f32,
}

#[derive(Serialize)]
struct WindowScore {
    index: usize,
    start_sample: usize,
    probability: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .init();

    let cli = Cli::parse();
    let config = read_config(cli.config.as_deref())?;

    match cli.command {
        Commands::WindowSize { sample_rate } => {
            let rate = SampleRate::from_hz(i64::from(sample_rate))?;
            println!("{}", rate.window_size_samples());
        }
        Commands::Probe {
            model,
            sample_rate,
            json,
        } => {
            let mut vad = open_session(&config, model.as_deref(), sample_rate)?;
            let report = probe(&mut vad)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Sample rate: {} Hz", report.sample_rate);
                println!("Window size: {} samples", report.window_size_samples);
                println!("Silence:     {:.4}", report.silence);
                println!("440 Hz tone: {:.4}", report.tone);
            }
        }
        Commands::Scan {
            input,
            model,
            sample_rate,
            json,
        } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let samples = decode_f32le(&bytes)
                .with_context(|| format!("{} is not raw f32le audio", input.display()))?;

            let mut vad = open_session(&config, model.as_deref(), sample_rate)?;
            let scores = scan(&mut vad, &samples)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scores)?);
            } else {
                for score in &scores {
                    println!(
                        "{:>6} {:>10} {:.4}",
                        score.index, score.start_sample, score.probability
                    );
                }
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn read_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => load_default_config()?,
    };
    Ok(config)
}

fn open_session(
    config: &Config,
    model: Option<&Path>,
    sample_rate: Option<u32>,
) -> Result<VadSession> {
    let model_path = config.resolve_model_path(model)?;
    let sample_rate = sample_rate.unwrap_or(config.session.sample_rate.as_hz());
    debug!("Opening {:?} at {} Hz", model_path, sample_rate);

    VadSession::with_config(&model_path, i64::from(sample_rate), &config.engine)
        .with_context(|| format!("Failed to open VAD session for {}", model_path.display()))
}

fn probe(vad: &mut VadSession) -> Result<ProbeReport> {
    let len = vad.window_size_samples();
    let rate = vad.sample_rate().as_hz();

    let silence = vad.predict(&vec![0.0; len])?;
    vad.reset();

    let tone: Vec<f32> = (0..len)
        .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / rate as f32).sin())
        .collect();
    let tone = vad.predict(&tone)?;

    Ok(ProbeReport {
        sample_rate: rate,
        window_size_samples: len,
        silence,
        tone,
    })
}

/// Trailing samples that do not fill a window are dropped.
fn scan(vad: &mut VadSession, samples: &[f32]) -> Result<Vec<WindowScore>> {
    let len = vad.window_size_samples();
    let mut scores = Vec::with_capacity(samples.len() / len);

    for (index, window) in samples.chunks_exact(len).enumerate() {
        let probability = vad
            .predict(window)
            .with_context(|| format!("Inference failed on window {}", index))?;
        scores.push(WindowScore {
            index,
            start_sample: index * len,
            probability,
        });
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_probe() {
        let cli = Cli::try_parse_from([
            "vadctl",
            "probe",
            "--model",
            "silero.onnx",
            "--sample-rate",
            "8000",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Probe {
                model,
                sample_rate,
                json,
            } => {
                assert_eq!(model, Some(PathBuf::from("silero.onnx")));
                assert_eq!(sample_rate, Some(8000));
                assert!(json);
            }
            _ => panic!("expected probe"),
        }
    }

    #[test]
    fn test_cli_global_config_flag() {
        let cli =
            Cli::try_parse_from(["vadctl", "window-size", "--config", "/tmp/vad.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/vad.toml")));
        assert!(matches!(
            cli.command,
            Commands::WindowSize { sample_rate: 16000 }
        ));
    }

    #[test]
    fn test_cli_scan_requires_input() {
        assert!(Cli::try_parse_from(["vadctl", "scan"]).is_err());
    }

    #[test]
    fn test_read_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nsample_rate = 8000\n").unwrap();

        let config = read_config(Some(&path)).unwrap();
        assert_eq!(config.session.sample_rate, SampleRate::Rate8kHz);
    }

    #[test]
    fn test_open_session_missing_model_fails() {
        let config = Config::default();
        let err = open_session(&config, Some(Path::new("/does/not/exist.onnx")), None)
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("/does/not/exist.onnx"));
    }
}
