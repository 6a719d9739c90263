//! Score Preview CLI Tool
//!
//! Runs the scoring pipeline over a stored match record and prints the
//! breakdown, without touching any tracker state.
//!
//! Usage:
//!   cargo run --bin score-preview -- match.json
//!   cargo run --bin score-preview -- match.json --noob-streak 2 --carry-streak -3
//!   cargo run --bin score-preview -- match.json --config duo-ladder.toml --summary

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use duo_ladder::config::AppConfig;
use duo_ladder::scoring::{ScoreResult, ScoringPipeline};
use duo_ladder::types::{MatchRecord, PlayerSlot};

#[derive(Parser)]
#[command(name = "score-preview")]
#[command(about = "Preview the points a duo match would be awarded")]
struct Cli {
    /// Match record in JSON form
    #[arg(value_name = "FILE")]
    record: PathBuf,

    /// Noob's streak before the match (negative for a losing streak)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    noob_streak: i32,

    /// Carry's streak before the match (negative for a losing streak)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    carry_streak: i32,

    /// Configuration file with a [scoring] table
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a human-readable summary instead of JSON
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let scoring = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.scoring,
        None => Default::default(),
    };
    let pipeline = ScoringPipeline::new(scoring)?;

    let content = std::fs::read_to_string(&cli.record)
        .with_context(|| format!("Failed to read {}", cli.record.display()))?;
    let record: MatchRecord = serde_json::from_str(&content)
        .with_context(|| format!("Invalid match record {}", cli.record.display()))?;

    let result = pipeline.score(&record, cli.noob_streak, cli.carry_streak);

    if cli.summary {
        print_summary(&record, &result);
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

fn print_summary(record: &MatchRecord, result: &ScoreResult) {
    println!(
        "📋 {} ({}) - {}",
        record.match_id,
        record.duo_id,
        if record.win { "win" } else { "loss" }
    );

    if result.is_remake_or_early_game {
        println!("   Remake or early end: no points awarded");
        return;
    }

    for slot in [PlayerSlot::Noob, PlayerSlot::Carry] {
        let stats = record.stats(slot);
        let score = result.player(slot);
        println!(
            "   {:<5} {:<14} {}/{}/{}  raw {:+}  x{:.2}  final {:+}",
            slot.to_string(),
            stats.champion_name,
            stats.kills,
            stats.deaths,
            stats.assists,
            score.raw,
            score.multiplier,
            score.final_points()
        );
    }

    println!(
        "   No-death {:+}, risk {:+} (h-score {}), total {:+}",
        result.pair.no_death_bonus,
        result.pair.risk_bonus.final_points,
        result.pair.risk_bonus.h_score,
        result.total
    );
    for alert in &result.alerts {
        match alert.player {
            Some(slot) => println!("   ⚠️  {} ({})", alert.kind, slot),
            None => println!("   ⚠️  {}", alert.kind),
        }
    }
}
