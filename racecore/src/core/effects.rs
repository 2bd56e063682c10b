use serde::{Deserialize, Serialize};

/// Timed speed modifier kinds. A vehicle carries at most one active instance
/// of each kind; applying a new one of the same kind replaces the old.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Boost,
    Slow,
}

/// * `kind` - Modifier kind (boost or slow)
/// * `factor` - Multiplicative factor applied to the base max speed
/// * `remaining` - (s) Remaining duration, effect is dropped at <= 0
#[derive(Debug, Clone)]
pub struct Effect {
    pub kind: EffectKind,
    pub factor: f64,
    pub remaining: f64,
}

/// EffectRegistry holds the active timed modifiers of a single vehicle and
/// folds them into the effective max speed.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    effects: Vec<Effect>,
}

impl EffectRegistry {
    pub fn new() -> EffectRegistry {
        EffectRegistry {
            effects: Vec::new(),
        }
    }

    /// apply replaces any existing effect of the same kind (no stacking).
    pub fn apply(&mut self, kind: EffectKind, factor: f64, duration: f64) {
        self.effects.retain(|e| e.kind != kind);
        self.effects.push(Effect {
            kind,
            factor,
            remaining: duration,
        });
    }

    /// tick decrements all timers and drops every effect whose remaining time
    /// goes to zero or below this step. An effect whose remaining time equals
    /// dt exactly is dropped as well.
    pub fn tick(&mut self, dt: f64) {
        for effect in self.effects.iter_mut() {
            effect.remaining -= dt;
        }
        self.effects.retain(|e| e.remaining > 0.0);
    }

    /// effective_max_speed folds all active factors multiplicatively over the
    /// base max speed. Boost and slow compose order-independently.
    pub fn effective_max_speed(&self, base_max_speed: f64) -> f64 {
        self.effects
            .iter()
            .fold(base_max_speed, |speed, e| speed * e.factor)
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
