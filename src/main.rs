use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use rhythm_judge::chart::{Chart, ChartLoader};
use rhythm_judge::config::EngineConfig;
use rhythm_judge::game::Session;
use rhythm_judge::replay::{ReplayData, ReplayPlayer};
use rhythm_judge::traits::{SongClock, SystemTimeProvider};
use rhythm_judge::util::logging::init_logging;

#[derive(Parser)]
#[command(name = "rhythm-judge")]
#[command(about = "Headless rhythm game judgement runner", version)]
struct Args {
    /// Chart file (JSON). Uses the built-in demo chart when omitted
    #[arg(long, value_name = "FILE")]
    chart: Option<PathBuf>,

    /// Replay file (JSON press log). Autoplays the chart when omitted
    #[arg(long, value_name = "FILE", conflicts_with = "autoplay_offset")]
    replay: Option<PathBuf>,

    /// Timing offset applied to autoplay presses, in ms (negative = early)
    #[arg(long, value_name = "MS", default_value_t = 0, allow_hyphen_values = true)]
    autoplay_offset: i64,

    /// Engine config file (JSON)
    #[arg(long, value_name = "FILE", env = "RHYTHM_JUDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Simulation ticks per second
    #[arg(long, default_value_t = ReplayPlayer::DEFAULT_TPS)]
    tps: u32,

    /// Play at wall-clock speed instead of simulating ticks
    #[arg(long)]
    realtime: bool,

    /// Write the press log used for this run
    #[arg(long, value_name = "FILE")]
    save_replay: Option<PathBuf>,

    /// Show per-judgement debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let chart = match &args.chart {
        Some(path) => ChartLoader::load(path)
            .with_context(|| format!("Failed to load chart: {}", path.display()))?,
        None => Chart::demo(),
    };

    let replay = match &args.replay {
        Some(path) => ReplayData::load(path)?,
        None => ReplayData::autoplay(&chart, args.autoplay_offset),
    };
    if !replay.song.is_empty() && replay.song != chart.song {
        log::warn!(
            "Replay was recorded for {}, playing it against {}",
            replay.song,
            chart.song
        );
    }
    if let Some(path) = &args.save_replay {
        replay.save(path)?;
    }

    let mut session = Session::new(chart, config)?;
    let mut player = ReplayPlayer::new(&replay, args.tps);
    let result = if args.realtime {
        let frame = Duration::from_secs(1) / args.tps.max(1);
        let mut clock = SongClock::new(SystemTimeProvider::new());
        player.play_realtime(&mut session, &mut clock, |_| std::thread::sleep(frame))?
    } else {
        player.play(&mut session)?
    };

    log::info!(
        "{}: {} ({:.2}%), max combo {}",
        result.song,
        result.display_score(),
        result.accuracy(),
        result.max_combo
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
