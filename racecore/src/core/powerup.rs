use crate::core::car::Car;
use crate::core::effects::EffectKind;
use rand::seq::SliceRandom;
use rand::Rng;

pub const HAZARD_RADIUS: f64 = 25.0;
pub const HAZARD_SLOW_FACTOR: f64 = 0.25;
pub const HAZARD_EFFECT_DURATION: f64 = 3.0;
pub const HAZARD_RESPAWN_DELAY: f64 = 10.0;

pub const BOOST_RADIUS: f64 = 20.0;
pub const BOOST_FACTOR: f64 = 1.4;
pub const BOOST_EFFECT_DURATION: f64 = 5.0;
pub const BOOST_RESPAWN_DELAY: f64 = 15.0;

// Placement on the racing line.
pub const POWERUP_LINE_JITTER: f64 = 30.0;
pub const POWERUP_MIN_SPACING: f64 = 200.0;
pub const DEFAULT_NO_HAZARDS: usize = 8;
pub const DEFAULT_NO_BOOSTS: usize = 5;

/// Closed set of power-up behaviors. A hazard slows the collector, a boost
/// pad speeds it up; both go through the effect registry.
#[derive(Debug, Clone, Copy)]
pub enum PowerUpKind {
    Hazard { factor: f64, duration: f64 },
    Boost { factor: f64, duration: f64 },
}

impl PowerUpKind {
    pub fn effect_kind(&self) -> EffectKind {
        match self {
            PowerUpKind::Hazard { .. } => EffectKind::Slow,
            PowerUpKind::Boost { .. } => EffectKind::Boost,
        }
    }
}

/// Stationary circular pickup with an {active, cooling-down} lifecycle.
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub kind: PowerUpKind,
    pub active: bool,
    respawn_timer: f64,
    respawn_delay: f64,
}

impl PowerUp {
    pub fn hazard(x: f64, y: f64) -> PowerUp {
        PowerUp {
            x,
            y,
            radius: HAZARD_RADIUS,
            kind: PowerUpKind::Hazard {
                factor: HAZARD_SLOW_FACTOR,
                duration: HAZARD_EFFECT_DURATION,
            },
            active: true,
            respawn_timer: 0.0,
            respawn_delay: HAZARD_RESPAWN_DELAY,
        }
    }

    pub fn boost(x: f64, y: f64) -> PowerUp {
        PowerUp {
            x,
            y,
            radius: BOOST_RADIUS,
            kind: PowerUpKind::Boost {
                factor: BOOST_FACTOR,
                duration: BOOST_EFFECT_DURATION,
            },
            active: true,
            respawn_timer: 0.0,
            respawn_delay: BOOST_RESPAWN_DELAY,
        }
    }

    /// check is a pure proximity test; inactive power-ups never match.
    pub fn check(&self, car: &Car) -> bool {
        if !self.active {
            return false;
        }
        let dx = car.x - self.x;
        let dy = car.y - self.y;
        let distance = (dx * dx + dy * dy).sqrt();
        distance < self.radius + car.collision_radius()
    }

    /// collect applies the effect to the vehicle, deactivates the power-up
    /// and arms the respawn timer. Collecting while inactive is a no-op.
    /// Returns the applied effect kind on success.
    pub fn collect(&mut self, car: &mut Car) -> Option<EffectKind> {
        if !self.active {
            return None;
        }

        match self.kind {
            PowerUpKind::Hazard { factor, duration } => {
                car.effects.apply(EffectKind::Slow, factor, duration)
            }
            PowerUpKind::Boost { factor, duration } => {
                car.effects.apply(EffectKind::Boost, factor, duration)
            }
        }

        self.active = false;
        self.respawn_timer = self.respawn_delay;
        Some(self.kind.effect_kind())
    }

    /// tick counts the respawn timer down and reactivates at zero.
    pub fn tick(&mut self, dt: f64) {
        if !self.active {
            self.respawn_timer -= dt;
            if self.respawn_timer <= 0.0 {
                self.active = true;
                self.respawn_timer = 0.0;
            }
        }
    }
}

/// spawn_powerups_on_racing_line scatters hazards and boost pads near
/// shuffled racing-line points with positional jitter, keeping a minimum
/// spacing between pickups. Returns fewer than requested if the line cannot
/// host them.
pub fn spawn_powerups_on_racing_line(
    racing_line: &[[f64; 2]],
    no_hazards: usize,
    no_boosts: usize,
) -> Vec<PowerUp> {
    let mut powerups = Vec::new();
    if racing_line.len() < no_hazards + no_boosts {
        return powerups;
    }

    let mut rng = rand::thread_rng();
    let mut indices: Vec<usize> = (0..racing_line.len()).collect();
    indices.shuffle(&mut rng);

    let mut used_positions: Vec<[f64; 2]> = Vec::new();

    let is_position_valid = |used: &[[f64; 2]], x: f64, y: f64| -> bool {
        used.iter().all(|p| {
            let dx = x - p[0];
            let dy = y - p[1];
            (dx * dx + dy * dy).sqrt() >= POWERUP_MIN_SPACING
        })
    };

    let mut hazards_spawned = 0;
    let mut boosts_spawned = 0;

    for &idx in indices.iter() {
        if hazards_spawned >= no_hazards && boosts_spawned >= no_boosts {
            break;
        }

        let base = racing_line[idx];
        let x = base[0] + rng.gen_range(-POWERUP_LINE_JITTER..=POWERUP_LINE_JITTER);
        let y = base[1] + rng.gen_range(-POWERUP_LINE_JITTER..=POWERUP_LINE_JITTER);

        if !is_position_valid(&used_positions, x, y) {
            continue;
        }

        if hazards_spawned < no_hazards {
            powerups.push(PowerUp::hazard(x, y));
            hazards_spawned += 1;
        } else {
            powerups.push(PowerUp::boost(x, y));
            boosts_spawned += 1;
        }
        used_positions.push([x, y]);
    }

    powerups
}
