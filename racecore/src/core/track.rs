use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// World coordinates are map-image pixels scaled up by this factor.
pub const MAP_SCALE_FACTOR: f64 = 4.0;

/// Track occupancy oracle: classifies a world position as on-track or
/// off-track. Out-of-bounds queries must report off-track.
pub trait Occupancy {
    fn is_on_track(&self, x: f64, y: f64) -> bool;
}

/// Occupancy oracle backed by a color-coded map image. The per-pixel
/// classification is precomputed at load time.
#[derive(Debug, Clone)]
pub struct Track {
    pixels: Vec<bool>,
    width: u32,
    height: u32,
    scale: f64,
}

/// classify_pixel decides on-track membership from the map color coding:
/// strong green is grass (off-track), dark colors are asphalt, red/orange is
/// the finish-line paint (drivable).
fn classify_pixel(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);

    if g > 100 && g > r + 20 && g > b + 20 {
        return false;
    }
    if r < 150 && g < 150 && b < 150 {
        return true;
    }
    if r > 150 && g > 100 && b < 100 {
        return true;
    }
    false
}

impl Track {
    /// from_image_file loads and classifies the color-coded map image.
    pub fn from_image_file(filepath: &Path) -> Result<Track> {
        let img = image::open(filepath)
            .context(format!(
                "Failed to open track map image {}!",
                filepath.to_str().unwrap_or("unknown")
            ))?
            .to_rgba8();

        let (width, height) = img.dimensions();
        let mut pixels = Vec::with_capacity((width * height) as usize);

        for y in 0..height {
            for x in 0..width {
                let px = img.get_pixel(x, y);
                pixels.push(classify_pixel(px[0], px[1], px[2]));
            }
        }

        Ok(Track {
            pixels,
            width,
            height,
            scale: MAP_SCALE_FACTOR,
        })
    }

    /// from_grid builds an oracle from a precomputed occupancy grid
    /// (row-major, `width * height` entries).
    pub fn from_grid(pixels: Vec<bool>, width: u32, height: u32, scale: f64) -> Result<Track> {
        anyhow::ensure!(
            pixels.len() == (width * height) as usize,
            "Occupancy grid has {} entries, expected {}x{}!",
            pixels.len(),
            width,
            height
        );
        Ok(Track {
            pixels,
            width,
            height,
            scale,
        })
    }

    /// world_width is the map width in world units.
    pub fn world_width(&self) -> f64 {
        self.width as f64 * self.scale
    }

    pub fn world_height(&self) -> f64 {
        self.height as f64 * self.scale
    }
}

impl Occupancy for Track {
    fn is_on_track(&self, x: f64, y: f64) -> bool {
        let map_x = (x / self.scale).floor() as i64;
        let map_y = (y / self.scale).floor() as i64;

        if map_x < 0 || map_x >= self.width as i64 || map_y < 0 || map_y >= self.height as i64 {
            return false;
        }

        self.pixels[(map_y * self.width as i64 + map_x) as usize]
    }
}

/// Degraded fallback oracle used when no map image is available: every query
/// is on-track, so the collision system never stuns for excursions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTrack;

impl Occupancy for OpenTrack {
    fn is_on_track(&self, _x: f64, _y: f64) -> bool {
        true
    }
}

/// * `x` - (world units) racing line point x
/// * `y` - (world units) racing line point y
#[derive(Debug, Deserialize, Clone)]
pub struct CsvLineEl {
    pub x: f64,
    pub y: f64,
}

/// load_racing_line reads the ordered racing-line waypoints from a CSV file
/// with x/y columns.
pub fn load_racing_line(filepath: &Path) -> Result<Vec<[f64; 2]>> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open racing line file {}!",
            filepath.to_str().unwrap_or("unknown")
        ))?;

    let mut csv_reader = csv::Reader::from_reader(&fh);
    let mut racing_line: Vec<[f64; 2]> = vec![];

    for result in csv_reader.deserialize() {
        let el: CsvLineEl = result.context(format!(
            "Failed to parse racing line file {}!",
            filepath.to_str().unwrap_or("unknown")
        ))?;
        racing_line.push([el.x, el.y]);
    }

    Ok(racing_line)
}
