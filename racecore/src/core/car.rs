use crate::core::effects::EffectRegistry;

// Default arcade handling parameters (world units, degrees per second).
pub const MAX_SPEED: f64 = 400.0;
pub const ACCELERATION: f64 = 200.0;
pub const FRICTION: f64 = 100.0;
pub const BRAKE_FORCE: f64 = 500.0;
pub const TURN_SPEED: f64 = 180.0;

// Collision footprint of the car sprite.
pub const CAR_WIDTH: f64 = 40.0;
pub const CAR_HEIGHT: f64 = 76.0;

// Stun profiles. Forward excursions are penalized harder than reverse ones;
// the forward profile forces a reverse speed, the reverse profile a smaller
// forward one.
pub const STUN_SPEED_FORWARD_HIT: f64 = -150.0;
pub const STUN_TIME_FORWARD_HIT: f64 = 0.5;
pub const STUN_SPEED_REVERSE_HIT: f64 = 75.0;
pub const STUN_TIME_REVERSE_HIT: f64 = 0.25;

/// Raw input intents, sampled once per tick from the input-polling
/// collaborator and consumed by the player vehicle's control mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub accelerate: bool,
    pub brake: bool,
    pub reverse: bool,
    pub turn_left: bool,
    pub turn_right: bool,
}

/// Forced-speed state overriding normal control for a fixed duration after a
/// collision.
#[derive(Debug, Clone, Copy)]
pub struct Stun {
    pub remaining: f64,
    pub forced_speed: f64,
}

/// A single vehicle: kinematic body, stun state and active effect set.
/// Heading is in degrees, 0 = facing up (decreasing y), clockwise positive.
/// Speed is signed; negative means reverse.
#[derive(Debug, Clone)]
pub struct Car {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub speed: f64,
    pub width: f64,
    pub height: f64,
    pub max_speed: f64,
    pub acceleration: f64,
    pub friction: f64,
    pub brake_force: f64,
    pub turn_speed: f64,
    pub color: String,
    pub stun: Option<Stun>,
    pub effects: EffectRegistry,
}

impl Car {
    pub fn new(x: f64, y: f64, heading: f64, color: &str) -> Car {
        Car {
            x,
            y,
            heading,
            speed: 0.0,
            width: CAR_WIDTH,
            height: CAR_HEIGHT,
            max_speed: MAX_SPEED,
            acceleration: ACCELERATION,
            friction: FRICTION,
            brake_force: BRAKE_FORCE,
            turn_speed: TURN_SPEED,
            color: color.to_owned(),
            stun: None,
            effects: EffectRegistry::new(),
        }
    }

    /// effective_max_speed is the base max speed scaled by the product of all
    /// active effect factors.
    pub fn effective_max_speed(&self) -> f64 {
        self.effects.effective_max_speed(self.max_speed)
    }

    /// collision_radius deliberately under-approximates the sprite footprint
    /// to avoid over-sensitive contact.
    pub fn collision_radius(&self) -> f64 {
        self.width.min(self.height) / 3.0
    }

    /// apply_stun forces the given speed for the given duration. A vehicle
    /// that is already stunned keeps its current stun.
    pub fn apply_stun(&mut self, forced_speed: f64, duration: f64) {
        if self.stun.is_some() {
            return;
        }
        self.stun = Some(Stun {
            remaining: duration,
            forced_speed,
        });
    }

    /// tick_stun advances the stun timer and returns true while the vehicle
    /// is under forced-speed control. On expiry the speed is zeroed.
    pub fn tick_stun(&mut self, dt: f64) -> bool {
        let stun = match self.stun {
            Some(s) => s,
            None => return false,
        };

        let remaining = stun.remaining - dt;
        self.speed = stun.forced_speed;

        if remaining <= 0.0 {
            self.stun = None;
            self.speed = 0.0;
        } else {
            self.stun = Some(Stun {
                remaining,
                forced_speed: stun.forced_speed,
            });
        }

        true
    }

    /// handle_input maps the raw input intents to speed and heading changes.
    /// Brake decays the speed toward zero, accelerate and reverse are
    /// rate-limited and clamped to [-max_speed/2, effective max speed], and
    /// without any intent friction bleeds the speed off. Turning only applies
    /// while the vehicle is moving.
    pub fn handle_input(&mut self, input: &InputState, dt: f64) {
        if self.stun.is_some() {
            return;
        }

        if input.brake {
            if self.speed > 0.0 {
                self.speed = (self.speed - self.brake_force * dt).max(0.0);
            } else if self.speed < 0.0 {
                self.speed = (self.speed + self.brake_force * dt).min(0.0);
            }
        } else if input.accelerate {
            self.speed += self.acceleration * dt;
        } else if input.reverse {
            self.speed -= self.acceleration * dt;
        } else if self.speed > 0.0 {
            self.speed = (self.speed - self.friction * dt).max(0.0);
        } else if self.speed < 0.0 {
            self.speed = (self.speed + self.friction * dt).min(0.0);
        }

        self.clamp_speed();

        if self.speed.abs() > 0.0 {
            if input.turn_left {
                self.heading -= self.turn_speed * dt;
            }
            if input.turn_right {
                self.heading += self.turn_speed * dt;
            }
        }
    }

    /// clamp_speed enforces the speed invariant outside of stuns.
    pub fn clamp_speed(&mut self) {
        if self.stun.is_some() {
            return;
        }
        let upper = self.effective_max_speed();
        let lower = -self.max_speed / 2.0;
        self.speed = self.speed.min(upper).max(lower);
    }

    /// integrate advances the position under the current heading and speed.
    /// Screen-space convention: heading 0 degrees moves toward decreasing y.
    pub fn integrate(&mut self, dt: f64) {
        let heading_rad = self.heading.to_radians();
        self.x += heading_rad.sin() * self.speed * dt;
        self.y -= heading_rad.cos() * self.speed * dt;
    }
}
