//! CLI entry point for the frontier explorer.
//!
//! Usage:
//!   frontier-explorer geodes <input> [--minutes 24] [--mode quality|product]
//!   frontier-explorer climb <input> [--from start|lowest]
//!   frontier-explorer basin <input> [--round-trip]
//!   frontier-explorer valves <input> [--minutes 30] [--elephant] [--permutations]
//!   frontier-explorer beacons <input> [--row 2000000] [--max 4000000]
//!
//! Every subcommand also accepts `--stdin` instead of a file path.
//!
//! Global options:
//!   --workers <n>   Threads used to expand a generation (default: CPU count)
//!   -v              Raise log verbosity (repeat for more)

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Serialize;
use serde_json::json;

use frontier_explorer::blueprint::{first_three_product, quality_level_sum};
use frontier_explorer::{
    parse_blueprints, Basin, ExplorerConfig, Heightmap, RouteCutoff, SensorField, ValveNetwork,
};

#[derive(Parser)]
#[command(name = "frontier-explorer")]
#[command(about = "Bounded state-space explorer with dominance pruning")]
#[command(version)]
struct Cli {
    /// Threads used to expand a generation
    #[arg(long, global = true, default_value_t = num_cpus::get())]
    workers: usize,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// Path to the puzzle input (use --stdin to read from stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Read the puzzle input from stdin instead of a file
    #[arg(long)]
    stdin: bool,
}

impl Input {
    fn read(&self) -> Result<String> {
        if self.stdin {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read from stdin")?;
            Ok(buffer)
        } else if let Some(path) = &self.file {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        } else {
            bail!("must provide either a file path or --stdin")
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Most geodes each robot factory blueprint can open
    Geodes {
        #[command(flatten)]
        input: Input,

        /// Minutes available
        #[arg(long, default_value = "24")]
        minutes: u32,

        /// How blueprint results are combined
        #[arg(long, value_enum, default_value_t = GeodeMode::Quality)]
        mode: GeodeMode,
    },

    /// Fewest steps up the elevation grid
    Climb {
        #[command(flatten)]
        input: Input,

        /// Where the trail may begin
        #[arg(long, value_enum, default_value_t = TrailStart::Start)]
        from: TrailStart,
    },

    /// Fewest minutes across the blizzard basin
    Basin {
        #[command(flatten)]
        input: Input,

        /// Report the third leg of a there-and-back-again trip
        #[arg(long)]
        round_trip: bool,
    },

    /// Most pressure that can be released from the valve network
    Valves {
        #[command(flatten)]
        input: Input,

        /// Minutes available
        #[arg(long, default_value = "30")]
        minutes: u32,

        /// Open valves with a second agent
        #[arg(long, conflicts_with = "permutations")]
        elephant: bool,

        /// Enumerate valve orders instead of exploring minute by minute
        #[arg(long)]
        permutations: bool,

        /// When the permutation search stops extending a route
        #[arg(long, value_enum, default_value_t = Cutoff::OverBudget)]
        cutoff: Cutoff,
    },

    /// Sensor coverage of a row and the one square no sensor covers
    Beacons {
        #[command(flatten)]
        input: Input,

        /// Row whose covered squares are counted
        #[arg(long, default_value = "2000000")]
        row: i64,

        /// Upper bound of both coordinates of the uncovered square
        #[arg(long, default_value = "4000000")]
        max: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GeodeMode {
    /// Sum of id times geodes over every blueprint
    Quality,
    /// Product of geodes over the first three blueprints
    Product,
}

#[derive(Clone, Copy, ValueEnum)]
enum TrailStart {
    /// The square marked S
    Start,
    /// Any square at the lowest elevation
    Lowest,
}

#[derive(Clone, Copy, ValueEnum)]
enum Cutoff {
    Exhaustive,
    OverBudget,
}

impl From<Cutoff> for RouteCutoff {
    fn from(cutoff: Cutoff) -> Self {
        match cutoff {
            Cutoff::Exhaustive => RouteCutoff::Exhaustive,
            Cutoff::OverBudget => RouteCutoff::OverBudget,
        }
    }
}

/// Output format for a solved puzzle
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    puzzle: &'static str,
    answer: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<serde_json::Value>,
    time_elapsed_ms: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let start_time = Instant::now();
    let (puzzle, answer, detail) = solve(&cli)?;
    let report = Report {
        puzzle,
        answer,
        detail,
        time_elapsed_ms: start_time.elapsed().as_millis() as u64,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

type Solved = (&'static str, serde_json::Value, Option<serde_json::Value>);

fn solve(cli: &Cli) -> Result<Solved> {
    let workers = cli.workers.max(1);

    match &cli.command {
        Commands::Geodes {
            input,
            minutes,
            mode,
        } => {
            let blueprints = parse_blueprints(&input.read()?)?;
            let config = ExplorerConfig {
                horizon: *minutes,
                workers,
            };
            let answer = match mode {
                GeodeMode::Quality => quality_level_sum(&blueprints, &config)?,
                GeodeMode::Product => first_three_product(&blueprints, &config)?,
            };
            Ok(("geodes", json!(answer), None))
        }

        Commands::Climb { input, from } => {
            let map = Heightmap::parse(&input.read()?)?;
            let steps = match from {
                TrailStart::Start => map.steps_to_summit()?,
                TrailStart::Lowest => map.shortest_trail()?,
            };
            Ok(("climb", json!(steps), None))
        }

        Commands::Basin { input, round_trip } => {
            let basin = Basin::parse(&input.read()?)?;
            if *round_trip {
                let legs = basin.round_trip()?;
                return Ok(("basin", json!(legs[2]), Some(json!({ "legs": legs }))));
            }
            Ok(("basin", json!(basin.fastest_crossing()?), None))
        }

        Commands::Valves {
            input,
            minutes,
            elephant,
            permutations,
            cutoff,
        } => {
            let network = ValveNetwork::parse(&input.read()?)?;
            if *permutations {
                let search = network.best_route(*minutes, (*cutoff).into());
                let detail = serde_json::to_value(&search)?;
                return Ok(("valves", json!(search.pressure), Some(detail)));
            }

            let config = ExplorerConfig {
                horizon: *minutes,
                workers,
            };
            let pressure = if *elephant {
                network.max_pressure_with_elephant(&config)?
            } else {
                network.max_pressure(&config)?
            };
            Ok(("valves", json!(pressure), None))
        }

        Commands::Beacons { input, row, max } => {
            let field = SensorField::parse(&input.read()?)?;
            let covered = field.covered_positions(*row);
            let gap = field.find_gap_parallel(*max, workers);
            Ok((
                "beacons",
                json!(covered),
                Some(json!({
                    "gap": gap,
                    "tuningFrequency": gap.map(|p| p.tuning_frequency()),
                })),
            ))
        }
    }
}
