use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "RS-TDR",
    about = "A top-down racing simulation core written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug printing (only for non-realtime mode)
    #[clap(short, long)]
    pub debug: bool,

    /// Run the race in real-time and stream state snapshots to a consumer
    #[clap(short = 'g', long)]
    pub realtime: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of simulation runs (only for non-realtime mode, ignored in real-time mode)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the spawn configuration file (OPTIONAL: if not set, uses the built-in default race)
    #[clap(short, long)]
    pub spawn_path: Option<PathBuf>,

    /// Set path to the color-coded track map image (OPTIONAL: if not set, the whole plane is drivable)
    #[clap(short, long)]
    pub map_path: Option<PathBuf>,

    /// Set path to the racing line CSV file (OPTIONAL: if not set, AI vehicles coast and no power-ups spawn)
    #[clap(short, long)]
    pub line_path: Option<PathBuf>,

    /// Set real-time factor (only relevant in real-time mode)
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Set simulation timestep size in seconds, should be in the range [0.001, 0.1]
    #[clap(short, long, default_value = "0.016")]
    pub timestep_size: f64,

    /// Set the simulated time cap in seconds after which a run is classified as-is
    #[clap(long, default_value = "1800.0")]
    pub max_sim_time: f64,
}
