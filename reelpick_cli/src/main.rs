use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use reelpick_core::{
    fairness_report, Catalog, ConfettiField, EntropySource, MachineConfig, PrizeId,
    RandomSource, RoundEvent, SeededStream, SpinOrchestrator,
};

mod term;

#[derive(Parser)]
#[command(name = "reelpick", about = "Three-reel prize picker for the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Seed for a replayable session; OS entropy when omitted
    #[arg(long, global = true, env = "REELPICK_SEED")]
    seed: Option<String>,
    /// Base reel transition time in milliseconds
    #[arg(long, global = true, env = "REELPICK_BASE_DURATION_MS")]
    base_duration_ms: Option<u64>,
    /// Frame interval for the animated player
    #[arg(long, global = true, env = "REELPICK_FRAME_MS", default_value_t = 33)]
    frame_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Spin the reels
    Play {
        #[arg(default_value_t = 1)]
        rounds: u32,
        /// Print one JSON report per round instead of animating
        #[arg(long)]
        json: bool,
        /// Skip the confetti
        #[arg(long)]
        no_confetti: bool,
    },
    /// Draw many winners and check they are uniform
    Simulate {
        #[arg(default_value_t = 10_000)]
        draws: u64,
        #[arg(long)]
        json: bool,
    },
    /// List the prizes in reel order
    Catalog,
}

#[derive(Debug, Serialize)]
struct RoundReport {
    round: u64,
    winner: PrizeId,
    name: &'static str,
    resting: Vec<usize>,
    stopped_at_ms: Vec<u64>,
    revealed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed_hash: Option<String>,
}

type Machine = SpinOrchestrator<Box<dyn RandomSource>>;

fn random_source(seed: Option<&str>, label: &str) -> (Box<dyn RandomSource>, Option<String>) {
    match seed {
        Some(seed) => {
            let stream = SeededStream::new(seed, label, 0);
            let hash = stream.seed_hash_hex();
            (Box::new(stream), Some(hash))
        }
        None => (Box::new(EntropySource::new()), None),
    }
}

fn machine_config(cli: &Cli) -> MachineConfig {
    let mut config = MachineConfig::default();
    if let Some(ms) = cli.base_duration_ms {
        config.base_duration_ms = ms;
    }
    config
}

fn play_json(machine: &mut Machine, rounds: u32, seed_hash: Option<String>) -> anyhow::Result<()> {
    let mut t = 0;
    for _ in 0..rounds {
        let Some(outcome) = machine.play_to_completion(t) else {
            break;
        };
        t = outcome.revealed_at_ms;
        let report = RoundReport {
            round: outcome.round,
            winner: outcome.prize.id,
            name: outcome.prize.name,
            resting: outcome.resting,
            stopped_at_ms: outcome.stopped_at_ms,
            revealed_at: Utc::now(),
            seed_hash: seed_hash.clone(),
        };
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

async fn play_animated(
    machine: &mut Machine,
    rounds: u32,
    frame_ms: u64,
    confetti: bool,
) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    let clock = Instant::now();
    let now_ms = || clock.elapsed().as_millis() as u64;
    let mut frames = interval(Duration::from_millis(frame_ms.max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    term::hide_cursor(&mut out)?;
    for _ in 0..rounds {
        if machine.trigger_round(now_ms()).is_none() {
            break;
        }
        let mut revealed = None;
        while revealed.is_none() {
            frames.tick().await;
            let now = now_ms();
            for event in machine.tick(now) {
                match event {
                    RoundEvent::ReelStopped { reel, at_ms, .. } => {
                        debug!(reel, at_ms, "reel stopped")
                    }
                    RoundEvent::WinnerRevealed {
                        prize, celebration, ..
                    } => revealed = Some((prize, celebration)),
                }
            }
            let snap = machine.snapshot(now);
            term::draw_reels(&mut out, machine.catalog(), &snap, machine.config().item_height)?;
        }

        let Some((prize, bursts)) = revealed else {
            continue;
        };
        term::draw_winner(&mut out, &prize)?;
        if confetti {
            let mut field = ConfettiField::new(term::FIELD_WIDTH, term::FIELD_HEIGHT);
            field.fire(&bursts, machine.rng_mut());
            while !field.is_done() {
                frames.tick().await;
                field.step();
                term::draw_confetti(&mut out, &field)?;
            }
            term::clear_confetti(&mut out)?;
        }
        info!(winner = prize.name, "round finished");
    }
    term::show_cursor(&mut out)?;
    out.flush()?;
    Ok(())
}

fn simulate(seed: Option<&str>, draws: u64, json: bool) -> anyhow::Result<()> {
    let catalog = Catalog::music();
    let (mut rng, _) = random_source(seed, "simulate");
    let report = fairness_report(&mut rng, catalog.len(), draws);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for (prize, (count, freq)) in catalog
        .prizes()
        .iter()
        .zip(report.counts.iter().zip(&report.frequencies))
    {
        println!("{:<12} {:>8} {:>7.4}", prize.name, count, freq);
    }
    println!(
        "chi2={:.3} dof={} critical(0.999)={:.3} uniform={}",
        report.chi_square, report.degrees_of_freedom, report.critical_value, report.uniform
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            rounds,
            json,
            no_confetti,
        } => {
            let (rng, seed_hash) = random_source(cli.seed.as_deref(), "play");
            let mut machine = SpinOrchestrator::new(Arc::new(Catalog::music()), machine_config(&cli), rng)
                .context("invalid machine configuration")?;
            if json {
                play_json(&mut machine, rounds, seed_hash)?;
            } else {
                let frame_ms = cli.frame_ms;
                tokio::select! {
                    res = play_animated(&mut machine, rounds, frame_ms, !no_confetti) => res?,
                    _ = tokio::signal::ctrl_c() => {
                        let mut out = std::io::stdout().lock();
                        term::show_cursor(&mut out)?;
                        writeln!(out)?;
                    }
                }
            }
        }
        Commands::Simulate { draws, json } => simulate(cli.seed.as_deref(), draws, json)?,
        Commands::Catalog => {
            for (i, prize) in Catalog::music().prizes().iter().enumerate() {
                println!("{} {:<12} {} {}", i, prize.name, prize.color, prize.glyph);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "reelpick",
            "play",
            "3",
            "--json",
            "--seed",
            "abc",
            "--base-duration-ms",
            "500",
            "--frame-ms",
            "10",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Play { rounds: 3, json: true, no_confetti: false }));
        assert_eq!(cli.seed.as_deref(), Some("abc"));
        assert_eq!(cli.frame_ms, 10);
        assert_eq!(machine_config(&cli).base_duration_ms, 500);
    }

    #[test]
    fn env_vars_back_the_global_flags() {
        std::env::set_var("REELPICK_SEED", "from-env");
        std::env::set_var("REELPICK_BASE_DURATION_MS", "750");
        std::env::set_var("REELPICK_FRAME_MS", "20");
        let cli = Cli::try_parse_from(["reelpick", "simulate", "100"]).unwrap();
        std::env::remove_var("REELPICK_SEED");
        std::env::remove_var("REELPICK_BASE_DURATION_MS");
        std::env::remove_var("REELPICK_FRAME_MS");

        assert!(matches!(cli.command, Commands::Simulate { draws: 100, json: false }));
        assert_eq!(cli.seed.as_deref(), Some("from-env"));
        assert_eq!(cli.frame_ms, 20);
        assert_eq!(machine_config(&cli).base_duration_ms, 750);
    }

    #[test]
    fn zero_base_duration_fails_validation() {
        let cli = Cli::try_parse_from(["reelpick", "catalog", "--base-duration-ms", "0"]).unwrap();
        assert_eq!(machine_config(&cli).base_duration_ms, 0);
        assert!(machine_config(&cli).validate().is_err());
    }
}
