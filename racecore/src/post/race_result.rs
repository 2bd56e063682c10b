use std::fmt::Write;
use std::io::Write as IoWrite;

use helpers::general::{argsort, SortOrder};
use serde::{Deserialize, Serialize};

/// * `name` - Entry name ("PLAYER", "AI 1", ...)
/// * `finish_time` - (s) Race time at which the entry finished; synthetic for
/// AI that were still out when the race ended
/// * `position` - 1-based rank, assigned by `rank`
/// * `laps` - Number of registered finish-line crossings
/// * `best_lap_time` - (s) Best completed lap, if any
/// * `lap_times` - (s) Durations of all completed laps
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResultEntry {
    pub name: String,
    pub finish_time: f64,
    pub position: Option<u32>,
    pub laps: u32,
    pub best_lap_time: Option<f64>,
    pub lap_times: Vec<f64>,
}

/// RaceResult contains the final classification of a race.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RaceResult {
    pub max_laps: u32,
    pub entries: Vec<ResultEntry>,
}

impl RaceResult {
    /// rank sorts the entries by finish time ascending and assigns 1-based
    /// positions. The sort is stable, so ties keep recording order.
    pub fn rank(&mut self) {
        let finish_times: Vec<f64> = self.entries.iter().map(|e| e.finish_time).collect();
        let order = argsort(&finish_times, SortOrder::Ascending);

        let mut ranked = Vec::with_capacity(self.entries.len());
        for (pos, &idx) in order.iter().enumerate() {
            let mut entry = self.entries[idx].clone();
            entry.position = Some(pos as u32 + 1);
            ranked.push(entry);
        }
        self.entries = ranked;
    }

    /// print_classification prints the final classification to the console.
    pub fn print_classification(&self) {
        println!("RESULT: Final classification ({} laps)", self.max_laps);
        for entry in self.entries.iter() {
            println!(
                "{:3}. {:8} {:8.3}s  best lap: {}",
                entry.position.unwrap_or(0),
                entry.name,
                entry.finish_time,
                match entry.best_lap_time {
                    Some(t) => format!("{:.3}s", t),
                    None => "-".to_string(),
                }
            );
        }
    }

    /// write_classification_to_file writes the classification to a text file
    /// in output/. Returns the path to the written file.
    pub fn write_classification_to_file(
        &self,
        path: Option<&std::path::Path>,
    ) -> anyhow::Result<String> {
        let mut content = String::new();
        writeln!(
            &mut content,
            "RESULT: Final classification ({} laps)",
            self.max_laps
        )?;

        for entry in self.entries.iter() {
            write!(
                &mut content,
                "{:3}. {:8} {:8.3}s",
                entry.position.unwrap_or(0),
                entry.name,
                entry.finish_time
            )?;
            if entry.lap_times.is_empty() {
                writeln!(&mut content)?;
            } else {
                let laps: Vec<String> = entry
                    .lap_times
                    .iter()
                    .map(|t| format!("{:.3}s", t))
                    .collect();
                writeln!(&mut content, "  laps: {}", laps.join(", "))?;
            }
        }

        let out_dir = std::path::Path::new("output");
        std::fs::create_dir_all(out_dir)?;
        let out_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            out_dir.join("last_run.txt")
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, finish_time: f64) -> ResultEntry {
        ResultEntry {
            name: name.to_string(),
            finish_time,
            position: None,
            laps: 3,
            best_lap_time: Some(30.0),
            lap_times: vec![31.0, 30.0],
        }
    }

    #[test]
    fn rank_sorts_ascending_and_assigns_positions() {
        let mut result = RaceResult {
            max_laps: 2,
            entries: vec![entry("PLAYER", 125.0), entry("AI 1", 110.0), entry("AI 2", 180.0)],
        };
        result.rank();

        let names: Vec<&str> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["AI 1", "PLAYER", "AI 2"]);
        let positions: Vec<u32> = result.entries.iter().map(|e| e.position.unwrap()).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn ties_are_broken_by_recording_order() {
        let mut result = RaceResult {
            max_laps: 2,
            entries: vec![entry("PLAYER", 100.0), entry("AI 1", 100.0)],
        };
        result.rank();
        assert_eq!(result.entries[0].name, "PLAYER");
        assert_eq!(result.entries[1].name, "AI 1");
    }

    #[test]
    fn serde_round_trip_preserves_ranking() {
        let mut result = RaceResult {
            max_laps: 2,
            entries: vec![
                entry("PLAYER", 125.0),
                entry("AI 1", 110.0),
                entry("AI 2", 110.0),
            ],
        };
        result.rank();

        let json = serde_json::to_string(&result).unwrap();
        let mut reloaded: RaceResult = serde_json::from_str(&json).unwrap();
        let before: Vec<(String, Option<u32>)> = reloaded
            .entries
            .iter()
            .map(|e| (e.name.clone(), e.position))
            .collect();

        // re-ranking the reloaded list must be a no-op
        reloaded.rank();
        let after: Vec<(String, Option<u32>)> = reloaded
            .entries
            .iter()
            .map(|e| (e.name.clone(), e.position))
            .collect();
        assert_eq!(before, after);
    }
}
