use crate::core::effects::EffectKind;
use crate::post::race_result::RaceResult;

pub const MAX_GUI_UPDATE_FREQUENCY: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Per-vehicle state snapshot consumed by the rendering collaborator.
#[derive(Debug, Clone, Default)]
pub struct CarState {
    pub name: String,
    pub color: RgbColor,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub speed: f64,
    pub stunned: bool,
    pub laps: u32,
}

/// Fire-and-forget notifications for the rendering/audio collaborators. The
/// core never awaits a response to any of these.
#[derive(Debug, Clone)]
pub enum SimEvent {
    CollisionOccurred { x: f64, y: f64, intensity: f64 },
    PowerUpCollected { kind: EffectKind },
    LapCompleted { car: usize, laps: u32 },
    RaceFinished(RaceResult),
}

/// RaceSnapshot is the read-only view of one simulation tick that is sent
/// over the channel to the GUI/audio side.
#[derive(Debug, Clone, Default)]
pub struct RaceSnapshot {
    pub race_time: f64,
    pub countdown_display: Option<String>,
    pub car_states: Vec<CarState>,
    pub events: Vec<SimEvent>,

    // final results payload (sent once when the race finishes)
    pub final_result: Option<RaceResult>,
}
