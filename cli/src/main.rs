use clap::Parser;
use plotters::prelude::*;
use racecore::core::handle_race::handle_race;
use racecore::core::track::{load_racing_line, Occupancy, OpenTrack, Track};
use racecore::interfaces::gui_interface::{RaceSnapshot, SimEvent};
use racecore::post::race_result::RaceResult;
use racecore::pre::read_sim_pars::read_spawn_config;
use racecore::pre::sim_opts::SimOpts;
use rayon::prelude::*;
use std::thread;
use std::time::Instant;

/// export_results_plot draws the lap times of every classified vehicle over
/// the lap index and writes the chart to a PNG in output/.
fn export_results_plot(result: &RaceResult) -> anyhow::Result<String> {
    let out_dir = std::path::Path::new("output");
    std::fs::create_dir_all(out_dir)?;
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();
    let filename = format!("race_plot_{}.png", ts);
    let out_path = out_dir.join(filename);

    let max_lap_count = result
        .entries
        .iter()
        .map(|e| e.lap_times.len())
        .max()
        .unwrap_or(0);
    anyhow::ensure!(max_lap_count > 0, "No completed laps to plot!");

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for entry in result.entries.iter() {
        for &lt in entry.lap_times.iter() {
            if lt.is_finite() && lt > 0.0 {
                if lt < y_min {
                    y_min = lt;
                }
                if lt > y_max {
                    y_max = lt;
                }
            }
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    let margin = ((y_max - y_min) * 0.05).max(0.1);
    y_min -= margin;
    y_max += margin;

    let root = BitMapBackend::new(out_path.to_str().unwrap(), (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Lap times", ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1u32..(max_lap_count as u32 + 1), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Lap")
        .y_desc("s")
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    let palette = Palette99::pick;
    for (i, entry) in result.entries.iter().enumerate() {
        let series: Vec<(u32, f64)> = entry
            .lap_times
            .iter()
            .enumerate()
            .filter(|(_, &lt)| lt.is_finite() && lt > 0.0)
            .map(|(lap, &lt)| (lap as u32 + 1, lt))
            .collect();

        chart
            .draw_series(LineSeries::new(series.into_iter(), palette(i)))?
            .label(entry.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], palette(i)));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .label_font(("sans-serif", 16))
        .position(plotters::chart::SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(out_path.to_string_lossy().into_owned())
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    // get spawn configuration (falls back to the built-in default race)
    if let Some(spawn_path) = &sim_opts.spawn_path {
        println!("INFO: Reading spawn configuration from {:?}", spawn_path);
    }
    let spawn_cfg = read_spawn_config(sim_opts.spawn_path.as_deref());

    // load the track occupancy map, if one was provided
    let track = match &sim_opts.map_path {
        Some(map_path) => {
            println!("INFO: Loading track map from {:?}", map_path);
            Some(Track::from_image_file(map_path)?)
        }
        None => {
            println!("WARNING: No track map provided, the whole plane is drivable!");
            None
        }
    };

    // load the racing line followed by the AI vehicles
    let racing_line = match &sim_opts.line_path {
        Some(line_path) => {
            println!("INFO: Loading racing line from {:?}", line_path);
            load_racing_line(line_path)?
        }
        None => {
            println!(
                "WARNING: No racing line provided, AI vehicles will coast and no power-ups spawn!"
            );
            Vec::new()
        }
    };

    println!(
        "INFO: Simulating a {}-lap race with {} AI vehicles and a time step size of {:.3}s",
        spawn_cfg.max_laps,
        spawn_cfg.ai_cars.len(),
        sim_opts.timestep_size
    );

    // EXECUTION -----------------------------------------------------------------------------------
    if !sim_opts.realtime {
        println!(
            "INFO: Running {} simulation run(s) without visualization...",
            sim_opts.no_sim_runs
        );
        let t_start = Instant::now();

        // runs are independent, simulate them in parallel
        let results: Vec<anyhow::Result<RaceResult>> = (0..sim_opts.no_sim_runs)
            .into_par_iter()
            .map(|_| {
                let oracle: Box<dyn Occupancy> = match &track {
                    Some(t) => Box::new(t.clone()),
                    None => Box::new(OpenTrack),
                };
                handle_race(
                    &spawn_cfg,
                    oracle,
                    racing_line.clone(),
                    sim_opts.timestep_size,
                    sim_opts.debug,
                    None,
                    1.0,
                    sim_opts.max_sim_time,
                )
            })
            .collect();

        println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());

        let mut first_result: Option<&RaceResult> = None;
        for (i, result) in results.iter().enumerate() {
            match result {
                Ok(result) => {
                    if sim_opts.no_sim_runs > 1 {
                        let winner = &result.entries[0];
                        println!(
                            "INFO: Run {}: {} won in {:.3}s",
                            i + 1,
                            winner.name,
                            winner.finish_time
                        );
                    }
                    if first_result.is_none() {
                        first_result = Some(result);
                    }
                }
                Err(err) => println!("WARNING: Run {} failed: {:#}", i + 1, err),
            }
        }

        let race_result =
            first_result.ok_or_else(|| anyhow::anyhow!("All simulation runs failed!"))?;
        race_result.print_classification();

        let out_path = race_result.write_classification_to_file(None)?;
        println!("INFO: Classification written to {}", out_path);

        match export_results_plot(race_result) {
            Ok(path) => println!("INFO: Lap time plot written to {}", path),
            Err(err) => println!("WARNING: Could not write lap time plot: {:#}", err),
        }
    } else {
        println!("INFO: Running one simulation run in real-time...");

        let (tx, rx) = flume::unbounded::<RaceSnapshot>();

        // consumer thread prints the streamed snapshots while the race runs
        let consumer = thread::spawn(move || {
            let mut last_countdown: Option<String> = None;
            for snapshot in rx.iter() {
                if snapshot.countdown_display != last_countdown {
                    if let Some(display) = &snapshot.countdown_display {
                        println!("INFO: {}", display);
                    }
                    last_countdown = snapshot.countdown_display.clone();
                }

                for event in snapshot.events.iter() {
                    match event {
                        SimEvent::LapCompleted { car, laps } => {
                            let name = snapshot
                                .car_states
                                .get(*car)
                                .map(|c| c.name.as_str())
                                .unwrap_or("?");
                            println!(
                                "INFO: {} crossed the line (lap {}) at {:.3}s",
                                name, laps, snapshot.race_time
                            );
                        }
                        SimEvent::PowerUpCollected { kind } => {
                            println!("INFO: Power-up collected: {:?}", kind);
                        }
                        SimEvent::CollisionOccurred { x, y, intensity } => {
                            println!(
                                "INFO: Collision at ({:.0}, {:.0}), intensity {:.1}",
                                x, y, intensity
                            );
                        }
                        SimEvent::RaceFinished(_) => {}
                    }
                }

                if let Some(final_result) = &snapshot.final_result {
                    final_result.print_classification();
                }
            }
        });

        let oracle: Box<dyn Occupancy> = match &track {
            Some(t) => Box::new(t.clone()),
            None => Box::new(OpenTrack),
        };
        let race_result = handle_race(
            &spawn_cfg,
            oracle,
            racing_line.clone(),
            sim_opts.timestep_size,
            false,
            Some(&tx),
            sim_opts.realtime_factor,
            sim_opts.max_sim_time,
        )?;

        // close the channel so the consumer thread drains and exits
        drop(tx);
        let _ = consumer.join();

        let out_path = race_result.write_classification_to_file(None)?;
        println!("INFO: Classification written to {}", out_path);
    }

    Ok(())
}
