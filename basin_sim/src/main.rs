//! Basin Sim CLI
//!
//! Run irrigation allocation simulations and Monte Carlo stress tests
//! from a scenario file.

use basin_core::{Policy, SimulationRequest, StressTestRequest};
use basin_sim::{run_simulation, run_stress_test};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Basin irrigation allocation simulator
#[derive(Parser, Debug)]
#[command(name = "basin-sim")]
#[command(about = "Simulate irrigation water allocation policies", long_about = None)]
struct Args {
    /// Scenario file: JSON with farms, config, policy
    scenario: PathBuf,

    /// Run a Monte Carlo stress test instead of one simulation
    #[arg(long)]
    stress: bool,

    /// Override the stress scenario's run count
    #[arg(long)]
    runs: Option<u32>,

    /// Override the scenario's policy
    #[arg(short, long)]
    policy: Option<Policy>,

    /// Override the scenario's base seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Disable the comparison runs
    #[arg(long)]
    no_compare: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn run(args: &Args) -> Result<String, String> {
    let raw = std::fs::read_to_string(&args.scenario)
        .map_err(|e| format!("cannot read {}: {e}", args.scenario.display()))?;

    if args.stress {
        let mut request: StressTestRequest =
            serde_json::from_str(&raw).map_err(|e| format!("invalid scenario file: {e}"))?;
        if let Some(policy) = args.policy {
            request.policy = policy;
        }
        if let Some(seed) = args.seed {
            request.config = request.config.with_seed(seed);
        }
        if let Some(runs) = args.runs {
            request.runs = runs;
        }

        info!(
            scenario = %args.scenario.display(),
            policy = %request.policy,
            runs = request.runs,
            "loaded stress scenario"
        );

        let summary =
            run_stress_test(&request.farms, &request.config, request.policy, request.runs)
                .map_err(|e| e.to_string())?;
        to_json(&summary, args.pretty).map_err(|e| e.to_string())
    } else {
        let mut request: SimulationRequest =
            serde_json::from_str(&raw).map_err(|e| format!("invalid scenario file: {e}"))?;
        if let Some(policy) = args.policy {
            request.policy = policy;
        }
        if let Some(seed) = args.seed {
            request.config = request.config.with_seed(seed);
        }
        if args.no_compare {
            request.compare_policies = false;
        }

        info!(
            scenario = %args.scenario.display(),
            policy = %request.policy,
            "loaded scenario"
        );

        let response = run_simulation(
            &request.farms,
            &request.config,
            request.policy,
            request.compare_policies,
        )
        .map_err(|e| e.to_string())?;
        to_json(&response, args.pretty).map_err(|e| e.to_string())
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    match run(&args) {
        Ok(output) => println!("{output}"),
        Err(message) => {
            error!("{message}");
            std::process::exit(1);
        }
    }
}
