//! triangle: fundamental diagram of mixed traffic on a triangular track.
//!
//! ```text
//! triangle [CONFIG.json] [OUTPUT_DIR]
//! ```
//!
//! Without a config file the default sweep runs: cars and bikes at an even
//! PCU split on a 3 km single-lane ring.  Valid points go to
//! `OUTPUT_DIR/data.txt` (tab-separated), every point with its assessment
//! to `OUTPUT_DIR/points.json`.  `RUST_LOG` controls verbosity.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use qs_core::SimClock;
use qs_fd::{FdConfig, FdSweep};

const DEFAULT_OUTPUT_DIR: &str = "output/triangle";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(path: Option<&Path>) -> Result<FdConfig> {
    let Some(path) = path else {
        return Ok(FdConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let output_dir = args.next().map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR), PathBuf::from);

    let config = load_config(config_path.as_deref())?;
    let mut sweep = FdSweep::new(config)?;

    let cfg = sweep.config();
    println!("=== triangle: fundamental diagram sweep ===");
    println!(
        "Modes: {}  |  split (PCU): {:?}  |  points: {:?}",
        cfg.modes.join(", "),
        cfg.modal_split_pcu,
        cfg.points
    );
    println!(
        "Track: 3 × {} m, {} lane(s), {} PCU/h  |  ring holds {:.0} PCU",
        cfg.track.branch_length_m,
        cfg.track.lanes,
        cfg.track.capacity_per_hour,
        sweep.network_pcu_capacity()
    );
    let window = SimClock::new(cfg.sim.start_secs, cfg.sim.tick_duration_secs);
    println!(
        "Each point: at most {} ticks of {} s from {}",
        cfg.sim.end_tick().0,
        cfg.sim.tick_duration_secs,
        window
    );
    println!();

    std::fs::create_dir_all(&output_dir).with_context(|| format!("creating {}", output_dir.display()))?;
    let mut table = sweep.create_table(&output_dir.join("data.txt"))?;

    let t0 = Instant::now();
    let points = sweep.run(Some(&mut table))?;
    let elapsed = t0.elapsed();

    let json = File::create(output_dir.join("points.json"))?;
    serde_json::to_writer_pretty(json, &points)?;
    info!(points = points.len(), rows = table.rows(), dir = %output_dir.display(), "output written");

    println!("Sweep complete in {:.1} s", elapsed.as_secs_f64());
    println!("  points run   : {}", points.len());
    println!("  data.txt     : {} valid rows", table.rows());
    for (i, (name, (flow, speed))) in sweep
        .config()
        .modes
        .iter()
        .zip(sweep.flow_unstable_counts().iter().zip(sweep.speed_unstable_counts()))
        .enumerate()
    {
        println!("  mode {i} {name:<10}: {flow} flow-unstable, {speed} speed-unstable");
    }
    println!();

    println!("{:>8} {:>10} {:>10} {:>10}", "agents", "k [1/km]", "q [1/h]", "v [km/h]");
    println!("{}", "-".repeat(41));
    for row in points.iter().filter_map(|p| p.to_row()) {
        println!("{:>8} {:>10.2} {:>10.2} {:>10.2}", row.agents, row.density, row.flow, row.speed_kmh);
    }

    Ok(())
}
