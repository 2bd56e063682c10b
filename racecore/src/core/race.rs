use crate::core::car::{Car, InputState};
use crate::core::collision;
use crate::core::driver::{AiDriver, WaypointPath};
use crate::core::powerup::{spawn_powerups_on_racing_line, PowerUp};
use crate::core::state_handler::{FinishLine, RaceManager};
use crate::core::track::Occupancy;
use crate::interfaces::gui_interface::SimEvent;
use crate::pre::read_sim_pars::SpawnConfig;

/// Upper bound on a single simulation step. Larger host frame gaps are
/// clamped so fast vehicles cannot tunnel through thin geometry.
pub const MAX_TIMESTEP: f64 = 0.1;

/// Race owns the whole simulation state for one race: the vehicle arena
/// (index 0 is the player), the parallel steering controllers, the power-ups,
/// the occupancy oracle and the race state machine. All components are
/// stepped strictly in order within `simulate_timestep`; rendering only ever
/// reads snapshots.
pub struct Race {
    pub cars: Vec<Car>,
    drivers: Vec<Option<AiDriver>>,
    pub powerups: Vec<PowerUp>,
    pub track: Box<dyn Occupancy>,
    pub manager: RaceManager,
    events: Vec<SimEvent>,
}

impl Race {
    /// new builds the race from the spawn configuration. When
    /// `player_autopilot` is set (headless runs without an input source) the
    /// player car follows the base racing line like an AI vehicle.
    pub fn new(
        spawn_cfg: &SpawnConfig,
        track: Box<dyn Occupancy>,
        racing_line: Vec<[f64; 2]>,
        player_autopilot: bool,
    ) -> Race {
        let no_cars = 1 + spawn_cfg.ai_cars.len();
        let mut cars = Vec::with_capacity(no_cars);
        let mut drivers: Vec<Option<AiDriver>> = Vec::with_capacity(no_cars);
        let mut names = Vec::with_capacity(no_cars);

        // player car
        let player = &spawn_cfg.player;
        let player_car = Car::new(player.x, player.y, player.heading, &player.color);
        if player_autopilot {
            drivers.push(Some(AiDriver::new(
                WaypointPath::new(racing_line.clone()),
                player_car.max_speed,
            )));
        } else {
            drivers.push(None);
        }
        cars.push(player_car);
        names.push("PLAYER".to_string());

        // AI cars with staggered racing lines
        for (i, ai_pars) in spawn_cfg.ai_cars.iter().enumerate() {
            let mut car = Car::new(ai_pars.x, ai_pars.y, player.heading, &ai_pars.color);
            car.max_speed = ai_pars.speed;

            let path = WaypointPath::with_offset(&racing_line, ai_pars.racing_line_offset);
            drivers.push(Some(AiDriver::new(path, ai_pars.speed)));
            cars.push(car);
            names.push(format!("AI {}", i + 1));
        }

        let finish_line = spawn_cfg
            .finish_line
            .map(|line| FinishLine::new(line[0], line[1]));

        let powerups =
            spawn_powerups_on_racing_line(&racing_line, spawn_cfg.no_hazards, spawn_cfg.no_boosts);

        Race {
            cars,
            drivers,
            powerups,
            track,
            manager: RaceManager::new(
                spawn_cfg.max_laps,
                spawn_cfg.countdown_time,
                finish_line,
                names,
            ),
            events: Vec::new(),
        }
    }

    /// simulate_timestep advances the whole simulation by one frame:
    /// (1) effect timers, (2) steering/input, (3) integration,
    /// (4) collisions, (5) power-up interaction, (6) race state. Vehicles
    /// only move once the countdown has expired.
    pub fn simulate_timestep(&mut self, dt: f64, input: &InputState) {
        let dt = dt.max(0.0).min(MAX_TIMESTEP);

        for car in self.cars.iter_mut() {
            car.effects.tick(dt);
        }

        if self.manager.is_racing() {
            for (i, car) in self.cars.iter_mut().enumerate() {
                let stunned = car.tick_stun(dt);
                if !stunned {
                    match self.drivers[i].as_mut() {
                        Some(driver) => driver.steer(car, dt),
                        None => car.handle_input(input, dt),
                    }
                }
                car.integrate(dt);
            }

            collision::run_collisions(&mut self.cars, self.track.as_ref(), &mut self.events);

            for powerup in self.powerups.iter_mut() {
                powerup.tick(dt);
                for car in self.cars.iter_mut() {
                    if powerup.check(car) {
                        if let Some(kind) = powerup.collect(car) {
                            self.events.push(SimEvent::PowerUpCollected { kind });
                        }
                        break;
                    }
                }
            }
        }

        let positions: Vec<[f64; 2]> = self.cars.iter().map(|c| [c.x, c.y]).collect();
        self.manager.update(dt, &positions, &mut self.events);
    }

    /// drain_events hands the events emitted since the last call to the
    /// caller. Fire-and-forget: the core never waits for the consumer.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_finished(&self) -> bool {
        self.manager.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::OpenTrack;
    use crate::pre::read_sim_pars::{AiCarPars, SpawnConfig};

    fn straight_loop() -> Vec<[f64; 2]> {
        // rectangle, long straights in x
        vec![
            [0.0, 0.0],
            [2000.0, 0.0],
            [2000.0, 600.0],
            [0.0, 600.0],
        ]
    }

    fn config_with_one_ai() -> SpawnConfig {
        let mut cfg = SpawnConfig::default();
        cfg.player = crate::pre::read_sim_pars::PlayerPars {
            x: 100.0,
            y: 0.0,
            heading: 90.0,
            color: "red".to_string(),
        };
        cfg.ai_cars = vec![AiCarPars {
            x: 100.0,
            y: 600.0,
            speed: 350.0,
            racing_line_offset: 0.0,
            color: "blue".to_string(),
        }];
        cfg.finish_line = Some([[50.0, -100.0], [50.0, 100.0]]);
        cfg.max_laps = 1;
        cfg.no_hazards = 0;
        cfg.no_boosts = 0;
        cfg.countdown_time = 1.0;
        cfg
    }

    #[test]
    fn vehicles_hold_position_during_countdown() {
        let cfg = config_with_one_ai();
        let mut race = Race::new(&cfg, Box::new(OpenTrack), straight_loop(), true);
        race.manager.start_countdown();

        race.simulate_timestep(0.016, &InputState::default());
        assert_eq!(race.cars[0].x, 100.0);
        assert_eq!(race.cars[0].speed, 0.0);
    }

    #[test]
    fn autopilot_race_runs_to_completion() {
        let cfg = config_with_one_ai();
        let mut race = Race::new(&cfg, Box::new(OpenTrack), straight_loop(), true);
        race.manager.start_countdown();

        let input = InputState::default();
        let mut steps = 0;
        while !race.is_finished() && steps < 200_000 {
            race.simulate_timestep(0.016, &input);
            steps += 1;
        }

        assert!(race.is_finished(), "race did not finish within the step budget");
        let result = race.manager.final_result().unwrap();
        assert_eq!(result.entries.len(), 2);
        assert!(result
            .entries
            .iter()
            .all(|e| e.position.is_some() && e.finish_time.is_finite()));

        let events = race.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::RaceFinished(_))));
    }

    #[test]
    fn oversized_dt_is_clamped() {
        let cfg = config_with_one_ai();
        let mut race = Race::new(&cfg, Box::new(OpenTrack), straight_loop(), true);
        race.manager.start_countdown();
        // each 10 s step is clamped to MAX_TIMESTEP, so the 1 s countdown
        // takes several steps to expire
        while !race.manager.is_racing() {
            race.simulate_timestep(10.0, &InputState::default());
        }

        let x_before = race.cars[0].x;
        let y_before = race.cars[0].y;
        race.simulate_timestep(10.0, &InputState::default());
        let dx = race.cars[0].x - x_before;
        let dy = race.cars[0].y - y_before;
        let moved = (dx * dx + dy * dy).sqrt();
        // a 10 s step may move at most max_speed * MAX_TIMESTEP
        assert!(moved <= race.cars[0].max_speed * MAX_TIMESTEP + 1e-9);
    }
}
