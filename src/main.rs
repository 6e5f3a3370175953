// src/main.rs
use anyhow::{bail, Context, Result};
use gesture_consensus::{
    round_to, ComparisonResult, ConsensusConfig, ConsensusService, CsvDirectorySource,
    DatasetStore, GestureType,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: gesture_consensus <data-dir> <gesture> <hand> [tolerance]";

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("{USAGE}");
        eprintln!("gestures: {}", GestureType::names().join(", "));
        bail!("expected 3 or 4 arguments, got {}", args.len());
    }

    let tolerance = args
        .get(3)
        .map(|raw| raw.parse::<f64>().with_context(|| format!("invalid tolerance {raw:?}")))
        .transpose()?;

    let config = ConsensusConfig::discover().context("Failed to load configuration")?;
    let source = CsvDirectorySource::new(&args[0]);
    let store = DatasetStore::load(&source)
        .with_context(|| format!("Failed to load recordings from {}", args[0]))?;
    let service = ConsensusService::new(Arc::new(store), config);

    let result = service
        .request_consensus(&args[1], &args[2])
        .context("Consensus request failed")?;

    print_report(&result, service.config(), tolerance);
    Ok(())
}

fn print_report(result: &ComparisonResult, config: &ConsensusConfig, tolerance: Option<f64>) {
    let decimals = config.tolerance_decimals;
    let filter = result.filter();

    println!("=== {} | {} ===", filter.gesture, filter.hand);
    println!(
        "{} person(s), {} pair(s), {}, {:?} aggregation",
        result.person_count(),
        result.eligible_pairs(),
        result.algorithm().name(),
        result.aggregation()
    );

    if result.is_empty() {
        println!("No comparable recordings for this filter.");
        return;
    }

    let (tolerance, consensus) = match tolerance {
        Some(t) => {
            let t = round_to(t, decimals);
            (t, result.relative_consensus(t))
        }
        None => {
            let best = result.best_operating_point();
            (best.tolerance, best.consensus)
        }
    };

    println!();
    for entry in result.matrix() {
        let marker = if entry.distance <= tolerance { "*" } else { " " };
        println!(
            "{} Person {:<16} Person {:<16} {:>10.*}",
            marker,
            entry.person_a,
            entry.person_b,
            decimals as usize,
            entry.distance
        );
    }

    println!();
    println!("Tolerance: {}", round_to(tolerance, decimals));
    println!("Consensus: {}%", round_to(consensus, decimals));

    println!();
    println!("Consensus curve:");
    for point in result.consensus_curve(config.curve_steps) {
        println!(
            "  {:>8.*} -> {:>6.2}%",
            decimals as usize, point.tolerance, point.consensus
        );
    }
}
