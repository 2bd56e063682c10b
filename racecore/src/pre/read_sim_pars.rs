use anyhow::Context;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

fn default_heading() -> f64 {
    90.0
}

fn default_player_color() -> String {
    "red".to_string()
}

fn default_ai_color() -> String {
    "blue".to_string()
}

fn default_ai_speed() -> f64 {
    350.0
}

fn default_offset() -> f64 {
    0.0
}

fn default_max_laps() -> u32 {
    2
}

fn default_no_hazards() -> usize {
    crate::core::powerup::DEFAULT_NO_HAZARDS
}

fn default_no_boosts() -> usize {
    crate::core::powerup::DEFAULT_NO_BOOSTS
}

fn default_countdown_time() -> f64 {
    crate::core::state_handler::DEFAULT_COUNTDOWN_TIME
}

/// PlayerPars stores the spawn parameters of the player vehicle.
#[derive(Debug, Deserialize, Clone)]
pub struct PlayerPars {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_heading")]
    pub heading: f64,
    #[serde(default = "default_player_color")]
    pub color: String,
}

/// * `x`, `y` - Spawn position in world coordinates
/// * `speed` - (units/s) Cruise speed of the steering controller, also the
/// vehicle's top speed
/// * `racing_line_offset` - Perpendicular offset of the followed racing line
/// * `color` - CSS color string used for visualization
#[derive(Debug, Deserialize, Clone)]
pub struct AiCarPars {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_ai_speed")]
    pub speed: f64,
    #[serde(default = "default_offset")]
    pub racing_line_offset: f64,
    #[serde(default = "default_ai_color")]
    pub color: String,
}

/// SpawnConfig stores everything needed to set up one race: the vehicle
/// spawns, the finish line and the race format.
#[derive(Debug, Deserialize, Clone)]
pub struct SpawnConfig {
    pub player: PlayerPars,
    #[serde(default)]
    pub ai_cars: Vec<AiCarPars>,
    /// Finish line segment as [[x1, y1], [x2, y2]]; no lap tracking without it
    #[serde(default)]
    pub finish_line: Option<[[f64; 2]; 2]>,
    #[serde(default = "default_max_laps")]
    pub max_laps: u32,
    #[serde(default = "default_no_hazards")]
    pub no_hazards: usize,
    #[serde(default = "default_no_boosts")]
    pub no_boosts: usize,
    #[serde(default = "default_countdown_time")]
    pub countdown_time: f64,
}

impl Default for SpawnConfig {
    fn default() -> SpawnConfig {
        SpawnConfig {
            player: PlayerPars {
                x: 2180.0,
                y: 4700.0,
                heading: default_heading(),
                color: default_player_color(),
            },
            ai_cars: Vec::new(),
            finish_line: None,
            max_laps: default_max_laps(),
            no_hazards: default_no_hazards(),
            no_boosts: default_no_boosts(),
            countdown_time: default_countdown_time(),
        }
    }
}

/// try_read_spawn_config reads the JSON file and decodes the JSON string into
/// the spawn configuration struct.
pub fn try_read_spawn_config(filepath: &Path) -> anyhow::Result<SpawnConfig> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open spawn configuration file {}!",
            filepath.display()
        ))?;
    let cfg = serde_json::from_reader(&fh).context(format!(
        "Failed to parse spawn configuration file {}!",
        filepath.display()
    ))?;
    Ok(cfg)
}

/// read_spawn_config loads the spawn configuration, falling back to the
/// built-in default race when no file path is given or reading fails.
pub fn read_spawn_config(filepath: Option<&Path>) -> SpawnConfig {
    match filepath {
        Some(path) => match try_read_spawn_config(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                println!(
                    "WARNING: {:#}. Falling back to the default spawn configuration!",
                    err
                );
                SpawnConfig::default()
            }
        },
        None => SpawnConfig::default(),
    }
}
