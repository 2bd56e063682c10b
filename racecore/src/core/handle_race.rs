use crate::core::car::InputState;
use crate::core::race::Race;
use crate::core::track::Occupancy;
use crate::interfaces::gui_interface::{
    CarState, RaceSnapshot, RgbColor, MAX_GUI_UPDATE_FREQUENCY,
};
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SpawnConfig;
use anyhow::Context;
use css_color_parser;
use flume::Sender;
use helpers::general::argmax;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// handle_race creates and simulates a race on the basis of the inserted
/// parameters, and returns the final classification for post-processing. The
/// player car drives on autopilot, so the run needs no input source.
///
/// If a sender is inserted, the race is simulated in real-time and state
/// snapshots are pushed over the channel for visualization; otherwise the
/// race is simulated as fast as possible. `max_sim_time` caps the simulated
/// race time so a vehicle stuck off the racing line cannot hang the run.
pub fn handle_race(
    spawn_cfg: &SpawnConfig,
    track: Box<dyn Occupancy>,
    racing_line: Vec<[f64; 2]>,
    timestep_size: f64,
    print_debug: bool,
    tx: Option<&Sender<RaceSnapshot>>,
    realtime_factor: f64,
    max_sim_time: f64,
) -> anyhow::Result<RaceResult> {
    let mut race = Race::new(spawn_cfg, track, racing_line, true);
    race.manager.start_countdown();

    // parse the configured color strings once up front
    let mut colors = Vec::with_capacity(race.cars.len());
    for car in race.cars.iter() {
        let parsed = car
            .color
            .parse::<css_color_parser::Color>()
            .context(format!("Could not parse car color {}!", car.color))?;
        colors.push(RgbColor {
            r: parsed.r,
            g: parsed.g,
            b: parsed.b,
        });
    }

    // check if sender was inserted -> in that case use real-time simulation for GUI
    let sim_realtime = tx.is_some();
    let input = InputState::default();

    if !sim_realtime {
        let mut t_sim = 0.0;
        let mut t_race_update_print = 0.0;
        let mut last_printed_lap = 0u32;

        while !race.is_finished() {
            race.simulate_timestep(timestep_size, &input);
            t_sim += timestep_size;

            let leader_lap = leader_laps(&race);
            if print_debug && race.manager.total_race_time > t_race_update_print + 0.9999 {
                println!(
                    "INFO: Simulating... Current race time is {:.3}s, leader lap is {}",
                    race.manager.total_race_time, leader_lap
                );
                t_race_update_print = race.manager.total_race_time;
            }
            if print_debug && leader_lap > last_printed_lap {
                println!("INFO: Leader started lap {}", leader_lap);
                last_printed_lap = leader_lap;
            }

            if t_sim > max_sim_time {
                println!(
                    "WARNING: Simulated time exceeded {:.0}s without a finish, \
                     classifying the field as-is!",
                    max_sim_time
                );
                race.manager.finalize();
                break;
            }
        }
    } else {
        let mut t_sim = 0.0;
        let mut t_race_update_gui = 0.0;

        while !race.is_finished() {
            let t_start = Instant::now();
            race.simulate_timestep(timestep_size, &input);
            t_sim += timestep_size;

            if t_sim > t_race_update_gui + 1.0 / MAX_GUI_UPDATE_FREQUENCY - 0.001 {
                let snapshot = build_snapshot(&mut race, &colors);
                tx.unwrap()
                    .send(snapshot)
                    .context("Failed to send race snapshot to GUI!")?;
                t_race_update_gui = t_sim;
            }

            if t_sim > max_sim_time {
                println!(
                    "WARNING: Simulated time exceeded {:.0}s without a finish, \
                     classifying the field as-is!",
                    max_sim_time
                );
                race.manager.finalize();
                break;
            }

            // sleep until time step is finished in real-time as well (calculation in ms)
            let t_sleep = (timestep_size * 1000.0 / realtime_factor) as i64
                - t_start.elapsed().as_millis() as i64;

            if t_sleep > 0 {
                sleep(Duration::from_millis(t_sleep as u64));
            } else {
                println!("WARNING: Could not keep up with real-time!")
            }
        }

        // after the real-time loop finishes, send the final result once
        if let Some(tx) = tx {
            let mut final_snapshot = build_snapshot(&mut race, &colors);
            final_snapshot.final_result = race.manager.final_result().cloned();
            tx.send(final_snapshot)
                .context("Failed to send final race snapshot to GUI!")?;
        }
    }

    race.manager
        .final_result()
        .cloned()
        .context("Race ended without a final classification!")
}

fn leader_laps(race: &Race) -> u32 {
    let laps: Vec<u32> = race.manager.trackers.iter().map(|t| t.laps).collect();
    laps[argmax(&laps)]
}

fn build_snapshot(race: &mut Race, colors: &[RgbColor]) -> RaceSnapshot {
    let mut car_states = Vec::with_capacity(race.cars.len());
    for (i, car) in race.cars.iter().enumerate() {
        car_states.push(CarState {
            name: race.manager.trackers[i].name.clone(),
            color: colors[i],
            x: car.x,
            y: car.y,
            heading: car.heading,
            speed: car.speed,
            stunned: car.stun.is_some(),
            laps: race.manager.trackers[i].laps,
        });
    }

    RaceSnapshot {
        race_time: race.manager.total_race_time,
        countdown_display: race.manager.countdown_display(),
        car_states,
        events: race.drain_events(),
        final_result: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::OpenTrack;
    use crate::pre::read_sim_pars::SpawnConfig;

    fn headless_config() -> (SpawnConfig, Vec<[f64; 2]>) {
        let mut cfg = SpawnConfig::default();
        cfg.player.x = 100.0;
        cfg.player.y = 0.0;
        cfg.ai_cars.clear();
        cfg.finish_line = Some([[50.0, -100.0], [50.0, 100.0]]);
        cfg.max_laps = 1;
        cfg.no_hazards = 0;
        cfg.no_boosts = 0;
        cfg.countdown_time = 1.0;

        let line = vec![
            [0.0, 0.0],
            [2000.0, 0.0],
            [2000.0, 600.0],
            [0.0, 600.0],
        ];
        (cfg, line)
    }

    #[test]
    fn headless_run_returns_ranked_result() {
        let (cfg, line) = headless_config();
        let result = handle_race(
            &cfg,
            Box::new(OpenTrack),
            line,
            0.016,
            false,
            None,
            1.0,
            1800.0,
        )
        .unwrap();

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].position, Some(1));
        assert!(result.entries[0].finish_time > 0.0);
    }

    #[test]
    fn sim_time_cap_forces_a_classification() {
        let (mut cfg, line) = headless_config();
        // unreachable finish line, the cap has to cut the race off
        cfg.finish_line = Some([[1e7, 0.0], [1e7, 100.0]]);

        let result = handle_race(
            &cfg,
            Box::new(OpenTrack),
            line,
            0.016,
            false,
            None,
            1.0,
            5.0,
        )
        .unwrap();

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].laps, 0);
        // one lap owed on top of the race time at the cut-off
        assert!(result.entries[0].finish_time >= 60.0);
    }

    #[test]
    fn unparsable_color_is_reported() {
        let (mut cfg, line) = headless_config();
        cfg.player.color = "not-a-color".to_string();

        let res = handle_race(
            &cfg,
            Box::new(OpenTrack),
            line,
            0.016,
            false,
            None,
            1.0,
            5.0,
        );
        assert!(res.is_err());
    }
}
