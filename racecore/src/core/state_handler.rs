use crate::interfaces::gui_interface::SimEvent;
use crate::post::race_result::{RaceResult, ResultEntry};

/// Crossing distance threshold, deliberately larger than the visual width of
/// the finish line to tolerate discrete-time sampling gaps at high speed.
pub const CROSSING_THRESHOLD: f64 = 80.0;

/// Re-arm cooldown after a registered crossing.
pub const LAP_COOLDOWN: f64 = 5.0;

pub const DEFAULT_COUNTDOWN_TIME: f64 = 3.0;

/// Synthetic penalty per lap still owed when the race is finalized before a
/// vehicle finishes. Deterministic and order-preserving, not a simulated
/// completion.
pub const TIME_PENALTY_PER_LAP: f64 = 60.0;

/// Finish line segment in world coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FinishLine {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

impl FinishLine {
    pub fn new(start: [f64; 2], end: [f64; 2]) -> FinishLine {
        FinishLine { start, end }
    }

    /// side locates a point on one side or the other of the line direction
    /// vector: the sign of the 2D cross product, collapsed to +/-1.
    pub fn side(&self, x: f64, y: f64) -> i8 {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        let cross = dx * (y - self.start[1]) - dy * (x - self.start[0]);
        if cross > 0.0 {
            1
        } else {
            -1
        }
    }

    /// distance returns the distance from a point to the segment, using a
    /// clamped parametrization. A zero-length line degrades to point
    /// distance.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        let length_sq = dx * dx + dy * dy;

        let t = if length_sq > 0.0 {
            (((x - self.start[0]) * dx + (y - self.start[1]) * dy) / length_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let nearest_x = self.start[0] + t * dx;
        let nearest_y = self.start[1] + t * dy;
        let dist_x = x - nearest_x;
        let dist_y = y - nearest_y;
        (dist_x * dist_x + dist_y * dist_y).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    NotStarted,
    Countdown,
    Racing,
    Finished,
}

impl Default for RacePhase {
    fn default() -> Self {
        RacePhase::NotStarted
    }
}

/// Per-vehicle lap tracking state, index-parallel to the vehicle arena.
#[derive(Debug, Clone)]
pub struct LapTracker {
    pub name: String,
    pub phase: RacePhase,
    pub laps: u32,
    last_side: Option<i8>,
    cooldown: f64,
    pub current_lap_time: f64,
    pub lap_times: Vec<f64>,
    pub best_lap_time: Option<f64>,
    pub finish_time: Option<f64>,
}

impl LapTracker {
    fn new(name: String) -> LapTracker {
        LapTracker {
            name,
            phase: RacePhase::NotStarted,
            laps: 0,
            last_side: None,
            cooldown: 0.0,
            current_lap_time: 0.0,
            lap_times: Vec::new(),
            best_lap_time: None,
            finish_time: None,
        }
    }

    /// init_side primes the crossing detector from the current position.
    /// Initialization never registers a lap.
    fn init_side(&mut self, line: &FinishLine, x: f64, y: f64) {
        self.last_side = Some(line.side(x, y));
    }

    /// track_crossing checks for an armed side flip near the finish line and
    /// registers a lap when one occurs. Returns the new lap count on a
    /// registered crossing.
    fn track_crossing(
        &mut self,
        line: &FinishLine,
        x: f64,
        y: f64,
        max_laps: u32,
        race_time: f64,
    ) -> Option<u32> {
        if self.phase != RacePhase::Racing {
            return None;
        }
        if line.distance(x, y) >= CROSSING_THRESHOLD {
            return None;
        }

        let side = line.side(x, y);
        let mut registered = None;

        if let Some(last_side) = self.last_side {
            if last_side != side && self.cooldown <= 0.0 {
                self.laps += 1;
                self.cooldown = LAP_COOLDOWN;

                // the opening crossing starts lap timing, it does not
                // complete a lap
                if self.laps > 1 {
                    let lap_time = self.current_lap_time;
                    self.lap_times.push(lap_time);
                    if self.best_lap_time.map_or(true, |best| lap_time < best) {
                        self.best_lap_time = Some(lap_time);
                    }
                }
                self.current_lap_time = 0.0;

                if self.laps > max_laps {
                    self.phase = RacePhase::Finished;
                    self.finish_time = Some(race_time);
                }

                registered = Some(self.laps);
            }
        }

        self.last_side = Some(side);
        registered
    }
}

/// Race state machine: countdown, per-vehicle lap tracking, timing and
/// result assembly. Vehicle index 0 is the human player; the race ends as
/// soon as the player finishes.
#[derive(Debug)]
pub struct RaceManager {
    pub phase: RacePhase,
    countdown_time: f64,
    countdown_timer: f64,
    pub max_laps: u32,
    pub finish_line: Option<FinishLine>,
    pub trackers: Vec<LapTracker>,
    pub total_race_time: f64,
    final_result: Option<RaceResult>,
}

impl RaceManager {
    pub fn new(
        max_laps: u32,
        countdown_time: f64,
        finish_line: Option<FinishLine>,
        names: Vec<String>,
    ) -> RaceManager {
        RaceManager {
            phase: RacePhase::NotStarted,
            countdown_time,
            countdown_timer: 0.0,
            max_laps,
            finish_line,
            trackers: names.into_iter().map(LapTracker::new).collect(),
            total_race_time: 0.0,
            final_result: None,
        }
    }

    /// start_countdown arms the fixed countdown. Only valid once per race.
    pub fn start_countdown(&mut self) {
        if self.phase != RacePhase::NotStarted {
            return;
        }
        self.phase = RacePhase::Countdown;
        self.countdown_timer = self.countdown_time;
        for tracker in self.trackers.iter_mut() {
            tracker.phase = RacePhase::Countdown;
        }
    }

    pub fn is_racing(&self) -> bool {
        self.phase == RacePhase::Racing
    }

    pub fn is_finished(&self) -> bool {
        self.phase == RacePhase::Finished
    }

    pub fn final_result(&self) -> Option<&RaceResult> {
        self.final_result.as_ref()
    }

    /// countdown_display returns the HUD string while the countdown runs.
    pub fn countdown_display(&self) -> Option<String> {
        if self.phase != RacePhase::Countdown {
            return None;
        }
        let countdown_num = self.countdown_timer as i64 + 1;
        if countdown_num > 0 && self.countdown_timer > 0.0 {
            Some(countdown_num.to_string())
        } else {
            Some("START!".to_string())
        }
    }

    /// update advances countdown and lap tracking from the already-stepped
    /// vehicle positions of this tick.
    pub fn update(&mut self, dt: f64, positions: &[[f64; 2]], events: &mut Vec<SimEvent>) {
        match self.phase {
            RacePhase::NotStarted | RacePhase::Finished => {}
            RacePhase::Countdown => {
                self.countdown_timer -= dt;
                if self.countdown_timer <= 0.0 {
                    self.phase = RacePhase::Racing;
                    let line = self.finish_line;
                    for (i, tracker) in self.trackers.iter_mut().enumerate() {
                        tracker.phase = RacePhase::Racing;
                        if let Some(line) = &line {
                            tracker.init_side(line, positions[i][0], positions[i][1]);
                        }
                    }
                }
            }
            RacePhase::Racing => {
                self.total_race_time += dt;
                let line = self.finish_line;
                let max_laps = self.max_laps;
                let race_time = self.total_race_time;

                for (i, tracker) in self.trackers.iter_mut().enumerate() {
                    if tracker.phase != RacePhase::Racing {
                        continue;
                    }
                    tracker.cooldown = (tracker.cooldown - dt).max(0.0);
                    tracker.current_lap_time += dt;

                    if let Some(line) = &line {
                        if let Some(laps) = tracker.track_crossing(
                            line,
                            positions[i][0],
                            positions[i][1],
                            max_laps,
                            race_time,
                        ) {
                            events.push(SimEvent::LapCompleted { car: i, laps });
                        }
                    }
                }

                if self.trackers[0].phase == RacePhase::Finished {
                    let result = self.finalize();
                    events.push(SimEvent::RaceFinished(result));
                }
            }
        }
    }

    /// finalize assembles the ranked classification. Vehicles that have not
    /// finished get a synthetic finish time of the current race time plus the
    /// per-lap penalty for every lap still owed.
    pub fn finalize(&mut self) -> RaceResult {
        let mut result = RaceResult {
            max_laps: self.max_laps,
            entries: Vec::with_capacity(self.trackers.len()),
        };

        for tracker in self.trackers.iter_mut() {
            let finish_time = match tracker.finish_time {
                Some(t) => t,
                None => {
                    let laps_owed = (self.max_laps as i64 - tracker.laps as i64).max(0) as f64;
                    self.total_race_time + laps_owed * TIME_PENALTY_PER_LAP
                }
            };
            tracker.phase = RacePhase::Finished;

            result.entries.push(ResultEntry {
                name: tracker.name.clone(),
                finish_time,
                position: None,
                laps: tracker.laps,
                best_lap_time: tracker.best_lap_time,
                lap_times: tracker.lap_times.clone(),
            });
        }

        result.rank();
        self.phase = RacePhase::Finished;
        self.final_result = Some(result.clone());
        result
    }

    /// reset returns the machine to its pre-race state. Crossing sides and
    /// all timers are cleared.
    pub fn reset(&mut self) {
        self.phase = RacePhase::NotStarted;
        self.countdown_timer = 0.0;
        self.total_race_time = 0.0;
        self.final_result = None;
        for tracker in self.trackers.iter_mut() {
            let name = tracker.name.clone();
            *tracker = LapTracker::new(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertical_line() -> FinishLine {
        // crossing it flips the sign of x
        FinishLine::new([0.0, -100.0], [0.0, 100.0])
    }

    fn manager(names: &[&str]) -> RaceManager {
        RaceManager::new(
            2,
            1.0,
            Some(vertical_line()),
            names.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn distance_uses_clamped_projection() {
        let line = vertical_line();
        assert_relative_eq!(line.distance(50.0, 0.0), 50.0);
        // beyond the segment end the nearest point is the endpoint
        assert_relative_eq!(line.distance(0.0, 200.0), 100.0);
    }

    #[test]
    fn zero_length_line_has_finite_distance() {
        let line = FinishLine::new([10.0, 10.0], [10.0, 10.0]);
        assert_relative_eq!(line.distance(13.0, 14.0), 5.0);
        assert!(line.distance(10.0, 10.0) == 0.0);
    }

    #[test]
    fn vehicle_on_line_with_unset_side_registers_no_lap_on_first_tick() {
        let mut mgr = manager(&["PLAYER"]);
        mgr.start_countdown();
        let mut events = Vec::new();

        // vehicle at rest exactly on the finish line through the countdown
        mgr.update(1.0, &[[0.0, 0.0]], &mut events);
        assert!(mgr.is_racing());
        mgr.update(0.016, &[[0.0, 0.0]], &mut events);
        mgr.update(0.016, &[[0.0, 0.0]], &mut events);

        assert!(events.is_empty());
        assert_eq!(mgr.trackers[0].laps, 0);
    }

    #[test]
    fn oscillation_faster_than_cooldown_counts_at_most_once() {
        let mut mgr = manager(&["PLAYER"]);
        mgr.start_countdown();
        let mut events = Vec::new();
        mgr.update(1.0, &[[-10.0, 0.0]], &mut events);

        // flip sides every tick, well within the cooldown window
        for i in 0..40 {
            let x = if i % 2 == 0 { 10.0 } else { -10.0 };
            mgr.update(0.05, &[[x, 0.0]], &mut events);
        }

        assert_eq!(mgr.trackers[0].laps, 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn crossings_after_cooldown_register_again() {
        let mut mgr = manager(&["PLAYER"]);
        mgr.start_countdown();
        let mut events = Vec::new();
        mgr.update(1.0, &[[-10.0, 0.0]], &mut events);

        mgr.update(6.0, &[[10.0, 0.0]], &mut events);
        assert_eq!(mgr.trackers[0].laps, 1);
        mgr.update(6.0, &[[-10.0, 0.0]], &mut events);
        assert_eq!(mgr.trackers[0].laps, 2);
    }

    #[test]
    fn best_lap_skips_the_opening_crossing() {
        let mut mgr = manager(&["PLAYER"]);
        mgr.max_laps = 10;
        mgr.start_countdown();
        let mut events = Vec::new();
        mgr.update(1.0, &[[-10.0, 0.0]], &mut events);

        mgr.update(6.0, &[[10.0, 0.0]], &mut events); // opening crossing
        assert!(mgr.trackers[0].best_lap_time.is_none());

        mgr.update(8.0, &[[-10.0, 0.0]], &mut events); // first full lap
        assert_relative_eq!(mgr.trackers[0].best_lap_time.unwrap(), 8.0);

        mgr.update(6.0, &[[10.0, 0.0]], &mut events); // faster lap
        assert_relative_eq!(mgr.trackers[0].best_lap_time.unwrap(), 6.0);
        assert_eq!(mgr.trackers[0].lap_times, vec![8.0, 6.0]);
    }

    #[test]
    fn player_finish_ends_race_with_synthetic_ai_times() {
        let mut mgr = manager(&["PLAYER", "AI 1"]);
        mgr.start_countdown();
        let mut events = Vec::new();

        // countdown expiry initializes both sides at x = -10
        mgr.update(1.0, &[[-10.0, 0.0], [-10.0, 0.0]], &mut events);

        // both cross once (player lap 1, AI lap 1), then the AI parks
        mgr.update(6.0, &[[10.0, 0.0], [10.0, 0.0]], &mut events);
        mgr.update(6.0, &[[-10.0, 0.0], [10.0, 0.0]], &mut events);
        mgr.update(6.0, &[[10.0, 0.0], [10.0, 0.0]], &mut events);

        // player reached lap 3 of max 2 -> race is over immediately
        assert!(mgr.is_finished());
        let result = mgr.final_result().unwrap();
        assert_eq!(result.entries.len(), 2);

        assert_eq!(result.entries[0].name, "PLAYER");
        assert_eq!(result.entries[0].position, Some(1));
        assert_relative_eq!(result.entries[0].finish_time, 18.0);

        // AI owes one lap: race time + one penalty
        assert_eq!(result.entries[1].name, "AI 1");
        assert_eq!(result.entries[1].position, Some(2));
        assert_relative_eq!(
            result.entries[1].finish_time,
            18.0 + TIME_PENALTY_PER_LAP
        );

        let finished_event = events
            .iter()
            .any(|e| matches!(e, SimEvent::RaceFinished(_)));
        assert!(finished_event);
    }

    #[test]
    fn reset_clears_sides_and_timers() {
        let mut mgr = manager(&["PLAYER"]);
        mgr.start_countdown();
        let mut events = Vec::new();
        mgr.update(1.0, &[[-10.0, 0.0]], &mut events);
        mgr.update(6.0, &[[10.0, 0.0]], &mut events);
        assert_eq!(mgr.trackers[0].laps, 1);

        mgr.reset();
        assert_eq!(mgr.phase, RacePhase::NotStarted);
        assert_eq!(mgr.trackers[0].laps, 0);
        assert!(mgr.trackers[0].last_side.is_none());
        assert_relative_eq!(mgr.total_race_time, 0.0);
    }
}
