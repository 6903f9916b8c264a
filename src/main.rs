use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use cuelist::reader::{self, ReaderConfig, ScriptReader};
use cuelist::stats::{self, RunStats};
use cuelist::{CharacterDetector, DetectorConfig};

#[derive(Parser, Debug)]
#[command(name = "cuelist")]
#[command(about = "Detects speaking characters in a screenplay and writes a confirmed roster")]
#[command(version)]
struct Args {
    /// Screenplay text file (or a JSON scene list with --scenes-json)
    script: PathBuf,

    /// Treat SCRIPT as a pre-segmented JSON array of scenes
    #[arg(long)]
    scenes_json: bool,

    /// JSON file with detector settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use memory-mapped I/O instead of async buffered
    #[arg(long)]
    use_mmap: bool,

    /// Do not merge multi-word names that only share a first word
    #[arg(long)]
    no_first_token_match: bool,

    /// Confirm every detected identity, not just the pre-checked ones
    #[arg(long)]
    confirm_all: bool,

    /// Roster output file (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,
}

async fn load_config(args: &Args) -> Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid detector config in {}", path.display()))?
        }
        None => DetectorConfig::default(),
    };

    if args.no_first_token_match {
        config.allow_shared_first_token = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: structured JSON logging enables observability and debugging in production
    // Logs go to stderr so a roster written to stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();

    info!("Starting cuelist");
    info!(?args, "Parsed CLI arguments");

    // WHY: validate input early to fail fast with clear error
    if !args.script.is_file() {
        anyhow::bail!("Screenplay file does not exist: {}", args.script.display());
    }

    let config = load_config(&args).await?;
    let mut detector = CharacterDetector::new(config)?;

    let read_start = std::time::Instant::now();
    let detection_start;
    let (chars_processed, scene_count) = if args.scenes_json {
        let scenes = reader::read_scenes_json(&args.script).await?;
        let read_time = read_start.elapsed();
        detection_start = std::time::Instant::now();
        detector.ingest_scenes(&scenes);
        let chars: usize = scenes.iter().map(|s| s.content.chars().count()).sum();
        info!(read_ms = read_time.as_millis() as u64, "Loaded scene list");
        (chars, scenes.len())
    } else {
        let script_reader = ScriptReader::new(ReaderConfig::default());
        let (text, read_stats) = if args.use_mmap {
            script_reader.read_script_mmap(&args.script)?
        } else {
            script_reader.read_script(&args.script).await?
        };
        info!(
            lines = read_stats.lines_read,
            bytes = read_stats.bytes_read,
            "Read screenplay"
        );
        detection_start = std::time::Instant::now();
        let scenes = detector.ingest_text(&text);
        (text.chars().count(), scenes.len())
    };
    let read_time_ms = detection_start.duration_since(read_start).as_millis() as u64;

    let no_cues_detected = detector.no_cues_detected();
    let detection = detector.stats().clone();
    let identities = detector.registry().len();

    let mut session = detector.into_review();
    if args.confirm_all {
        session.select_all();
    }
    let roster = session.confirm_selected()?;
    let detection_time_ms = detection_start.elapsed().as_millis() as u64;

    info!(
        scenes = scene_count,
        identities,
        confirmed = roster.len(),
        detection_ms = detection_time_ms,
        "Detection complete"
    );

    if no_cues_detected {
        warn!("No character cues detected in {}", args.script.display());
        eprintln!("No character cues detected");
    }

    let roster_json = roster.to_json_pretty()?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, format!("{}\n", roster_json))
                .await
                .with_context(|| format!("Failed to write roster {}", path.display()))?;
            println!(
                "cuelist v{} - {} scenes, {} identities, {} confirmed -> {}",
                env!("CARGO_PKG_VERSION"),
                scene_count,
                identities,
                roster.len(),
                path.display()
            );
        }
        None => println!("{}", roster_json),
    }

    let run_stats = RunStats {
        path: args.script.display().to_string(),
        chars_processed: chars_processed as u64,
        scenes: scene_count as u64,
        identities: identities as u64,
        confirmed: roster.len() as u64,
        detection_time_ms,
        read_time_ms,
        no_cues_detected,
        detection,
    };
    stats::write_stats_file(&args.stats_out, &run_stats).await?;
    info!("Stats written to {}", args.stats_out.display());

    Ok(())
}
