use crate::core::car::Car;
use helpers::general::normalize_angle_deg;

/// Distance at which a waypoint counts as reached.
pub const WAYPOINT_THRESHOLD: f64 = 30.0;

// Cornering heuristics: above the hard angle the controller brakes toward 20%
// of cruise speed, above the soft angle it coasts down toward 40%. The
// thresholds are tuned magic numbers from the original handling model.
pub const CORNER_HARD_ANGLE: f64 = 45.0;
pub const CORNER_SOFT_ANGLE: f64 = 25.0;
pub const CORNER_HARD_SPEED_FRAC: f64 = 0.2;
pub const CORNER_SOFT_SPEED_FRAC: f64 = 0.4;

/// Ordered cyclic sequence of 2D points defining a racing line. Immutable
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct WaypointPath {
    points: Vec<[f64; 2]>,
}

impl WaypointPath {
    pub fn new(points: Vec<[f64; 2]>) -> WaypointPath {
        WaypointPath { points }
    }

    /// with_offset builds a perpendicular-offset variant of the base path so
    /// multiple AI vehicles can drive staggered lines without colliding on
    /// the same geometry. Zero-length segments keep the original point.
    pub fn with_offset(base: &[[f64; 2]], offset: f64) -> WaypointPath {
        if offset == 0.0 {
            return WaypointPath::new(base.to_vec());
        }

        let mut points = Vec::with_capacity(base.len());
        for (i, point) in base.iter().enumerate() {
            let next = base[(i + 1) % base.len()];
            let dx = next[0] - point[0];
            let dy = next[1] - point[1];
            let length = (dx * dx + dy * dy).sqrt();

            if length > 0.0 {
                let perp_x = -dy / length;
                let perp_y = dx / length;
                points.push([point[0] + perp_x * offset, point[1] + perp_y * offset]);
            } else {
                points.push(*point);
            }
        }

        WaypointPath::new(points)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn point(&self, idx: usize) -> [f64; 2] {
        self.points[idx]
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }
}

/// Reactive waypoint-following steering controller for AI vehicles.
#[derive(Debug)]
pub struct AiDriver {
    path: WaypointPath,
    current_waypoint: usize,
    cruise_speed: f64,
    waypoint_threshold: f64,
}

impl AiDriver {
    pub fn new(path: WaypointPath, cruise_speed: f64) -> AiDriver {
        AiDriver {
            path,
            current_waypoint: 0,
            cruise_speed,
            waypoint_threshold: WAYPOINT_THRESHOLD,
        }
    }

    pub fn current_waypoint(&self) -> usize {
        self.current_waypoint
    }

    /// steer turns and regulates speed toward the current target waypoint.
    /// The target index advances by at most one per tick, even if the
    /// threshold is large. An empty path makes the controller a no-op and the
    /// vehicle coasts under friction.
    pub fn steer(&mut self, car: &mut Car, dt: f64) {
        if self.path.is_empty() {
            if car.speed > 0.0 {
                car.speed = (car.speed - car.friction * dt).max(0.0);
            } else if car.speed < 0.0 {
                car.speed = (car.speed + car.friction * dt).min(0.0);
            }
            return;
        }

        let mut target = self.path.point(self.current_waypoint);
        let mut dx = target[0] - car.x;
        let mut dy = target[1] - car.y;
        let distance = (dx * dx + dy * dy).sqrt();

        // single-step lookahead only
        if distance < self.waypoint_threshold {
            self.current_waypoint = (self.current_waypoint + 1) % self.path.len();
            target = self.path.point(self.current_waypoint);
            dx = target[0] - car.x;
            dy = target[1] - car.y;
        }

        // screen convention: heading 0 = up, clockwise positive
        let target_heading = dx.atan2(-dy).to_degrees();
        let angle_diff = normalize_angle_deg(target_heading - car.heading);

        let turn_budget = car.turn_speed * dt;
        if angle_diff.abs() < turn_budget {
            car.heading = target_heading;
        } else if angle_diff > 0.0 {
            car.heading += turn_budget;
        } else {
            car.heading -= turn_budget;
        }

        let target_speed = self.cruise_speed.min(car.effective_max_speed());

        // exactly one speed regime per tick: hard corner, soft corner, or
        // cruise regulation
        if angle_diff.abs() > CORNER_HARD_ANGLE {
            let corner_speed = target_speed * CORNER_HARD_SPEED_FRAC;
            if car.speed > corner_speed {
                car.speed = (car.speed - car.brake_force * dt * 0.2).max(corner_speed);
            } else if car.speed < corner_speed {
                car.speed = (car.speed + car.acceleration * dt).min(corner_speed);
            }
        } else if angle_diff.abs() > CORNER_SOFT_ANGLE {
            let corner_speed = target_speed * CORNER_SOFT_SPEED_FRAC;
            if car.speed > corner_speed {
                car.speed = (car.speed - car.friction * dt * 1.5).max(corner_speed);
            } else if car.speed < corner_speed {
                car.speed = (car.speed + car.acceleration * dt).min(corner_speed);
            }
        } else if car.speed < target_speed {
            car.speed = (car.speed + car.acceleration * dt).min(target_speed);
        } else if car.speed > target_speed {
            car.speed = (car.speed - car.friction * dt).max(target_speed);
        }

        car.clamp_speed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_path() -> WaypointPath {
        WaypointPath::new(vec![
            [0.0, 0.0],
            [1000.0, 0.0],
            [1000.0, 1000.0],
            [0.0, 1000.0],
        ])
    }

    #[test]
    fn empty_path_coasts_under_friction() {
        let mut driver = AiDriver::new(WaypointPath::new(vec![]), 300.0);
        let mut car = Car::new(0.0, 0.0, 0.0, "blue");
        car.speed = 100.0;
        driver.steer(&mut car, 0.1);
        assert_relative_eq!(car.speed, 100.0 - car.friction * 0.1);
        assert_relative_eq!(car.heading, 0.0);
    }

    #[test]
    fn waypoint_advances_by_exactly_one_per_threshold_crossing() {
        let mut driver = AiDriver::new(square_path(), 300.0);
        // large threshold: even if several waypoints are in range, only one
        // advancement per tick
        driver.waypoint_threshold = 1e6;
        let mut car = Car::new(0.0, 0.0, 0.0, "blue");

        driver.steer(&mut car, 0.016);
        assert_eq!(driver.current_waypoint(), 1);
        driver.steer(&mut car, 0.016);
        assert_eq!(driver.current_waypoint(), 2);
        driver.steer(&mut car, 0.016);
        assert_eq!(driver.current_waypoint(), 3);
        // cyclic wrap
        driver.steer(&mut car, 0.016);
        assert_eq!(driver.current_waypoint(), 0);
    }

    #[test]
    fn heading_snaps_when_within_turn_budget() {
        let mut driver = AiDriver::new(WaypointPath::new(vec![[1000.0, 0.0]]), 300.0);
        let mut car = Car::new(0.0, 0.0, 89.0, "blue");
        // target is due east (+x) = 90 degrees; 1 degree left at 180 deg/s
        driver.steer(&mut car, 0.1);
        assert_relative_eq!(car.heading, 90.0);
    }

    #[test]
    fn turn_is_rate_limited() {
        let mut driver = AiDriver::new(WaypointPath::new(vec![[0.0, 1000.0]]), 300.0);
        let mut car = Car::new(0.0, 0.0, 0.0, "blue");
        // target is due south = 180 degrees away
        driver.steer(&mut car, 0.1);
        assert_relative_eq!(car.heading.abs(), car.turn_speed * 0.1);
    }

    #[test]
    fn hard_corner_brakes_toward_fifth_of_cruise() {
        let mut driver = AiDriver::new(WaypointPath::new(vec![[-1000.0, 0.0]]), 300.0);
        let mut car = Car::new(0.0, 0.0, 90.0, "blue");
        car.speed = 300.0;
        // target is 180 degrees off -> hard cornering
        for _ in 0..200 {
            car.heading = 90.0; // pin the heading so the angle stays wide
            driver.steer(&mut car, 0.05);
        }
        assert_relative_eq!(car.speed, 300.0 * CORNER_HARD_SPEED_FRAC);
    }

    #[test]
    fn soft_corner_coasts_toward_two_fifths_of_cruise() {
        // target bearing is 125 degrees, i.e. 35 degrees off the pinned
        // heading, between the soft and hard thresholds
        let target = [1000.0 * 125f64.to_radians().sin(), 1000.0 * -(125f64.to_radians().cos())];
        let mut driver = AiDriver::new(WaypointPath::new(vec![target]), 300.0);
        let mut car = Car::new(0.0, 0.0, 90.0, "blue");
        car.speed = 300.0;
        for _ in 0..200 {
            car.heading = 90.0; // pin the heading so the angle stays moderate
            driver.steer(&mut car, 0.05);
        }
        assert_relative_eq!(car.speed, 300.0 * CORNER_SOFT_SPEED_FRAC);
    }

    #[test]
    fn offset_path_shifts_points_perpendicular_to_segments() {
        let base = vec![[0.0, 0.0], [100.0, 0.0], [100.0, 100.0]];
        let path = WaypointPath::with_offset(&base, 10.0);
        // first segment points +x, perpendicular is (0, 1) * offset
        assert_relative_eq!(path.point(0)[0], 0.0);
        assert_relative_eq!(path.point(0)[1], 10.0);
        // second segment points +y, perpendicular is (-1, 0) * offset
        assert_relative_eq!(path.point(1)[0], 90.0);
        assert_relative_eq!(path.point(1)[1], 0.0);
    }

    #[test]
    fn zero_offset_keeps_base_path() {
        let base = vec![[1.0, 2.0], [3.0, 4.0]];
        let path = WaypointPath::with_offset(&base, 0.0);
        assert_eq!(path.points(), &base[..]);
    }
}
