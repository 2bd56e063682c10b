use crate::core::car::{
    Car, STUN_SPEED_FORWARD_HIT, STUN_SPEED_REVERSE_HIT, STUN_TIME_FORWARD_HIT,
    STUN_TIME_REVERSE_HIT,
};
use crate::core::track::Occupancy;
use crate::interfaces::gui_interface::SimEvent;
use rand::Rng;

/// Symmetric position-only separation applied to each colliding vehicle.
pub const PUSHBACK_DISTANCE: f64 = 8.0;

pub const TRACK_COLLISION_INTENSITY: f64 = 1.0;
pub const CAR_COLLISION_INTENSITY: f64 = 2.0;

/// check_track_collision reports whether the vehicle left the drivable area.
pub fn check_track_collision(car: &Car, track: &dyn Occupancy) -> bool {
    !track.is_on_track(car.x, car.y)
}

/// handle_track_collision applies the off-track stun. Forward excursions get
/// the full reverse stun, reverse excursions a smaller and shorter forward
/// one. A vehicle that is already stunned keeps its current stun.
pub fn handle_track_collision(car: &mut Car) {
    if car.speed >= 0.0 {
        car.apply_stun(STUN_SPEED_FORWARD_HIT, STUN_TIME_FORWARD_HIT);
    } else {
        car.apply_stun(STUN_SPEED_REVERSE_HIT, STUN_TIME_REVERSE_HIT);
    }
}

/// check_car_collision tests the two collision circles for overlap.
pub fn check_car_collision(car1: &Car, car2: &Car) -> bool {
    let dx = car1.x - car2.x;
    let dy = car1.y - car2.y;
    let distance = (dx * dx + dy * dy).sqrt();
    distance < car1.collision_radius() + car2.collision_radius()
}

/// handle_car_collision pushes both vehicles apart along the line between
/// their centers, zeroes their speeds and stuns both with the forward
/// profile. Exactly coincident centers fall back to a random separation
/// direction.
pub fn handle_car_collision(car1: &mut Car, car2: &mut Car) {
    let mut dx = car1.x - car2.x;
    let mut dy = car1.y - car2.y;
    let mut distance = (dx * dx + dy * dy).sqrt();

    if distance == 0.0 {
        let mut rng = rand::thread_rng();
        while distance == 0.0 {
            dx = rng.gen_range(-1.0..=1.0);
            dy = rng.gen_range(-1.0..=1.0);
            distance = (dx * dx + dy * dy).sqrt();
        }
    }

    let nx = dx / distance;
    let ny = dy / distance;

    car1.x += nx * PUSHBACK_DISTANCE;
    car1.y += ny * PUSHBACK_DISTANCE;
    car2.x -= nx * PUSHBACK_DISTANCE;
    car2.y -= ny * PUSHBACK_DISTANCE;

    car1.speed = 0.0;
    car2.speed = 0.0;

    car1.apply_stun(STUN_SPEED_FORWARD_HIT, STUN_TIME_FORWARD_HIT);
    car2.apply_stun(STUN_SPEED_FORWARD_HIT, STUN_TIME_FORWARD_HIT);
}

/// run_collisions performs the per-tick vehicle-vs-track check for every
/// vehicle and the all-pairs vehicle-vs-vehicle check (O(n^2), fine for the
/// single-digit vehicle counts this targets). Each pair is resolved fully
/// before the next one is evaluated. Emitted collision events are appended
/// to `events`.
pub fn run_collisions(cars: &mut [Car], track: &dyn Occupancy, events: &mut Vec<SimEvent>) {
    for car in cars.iter_mut() {
        if check_track_collision(car, track) && car.stun.is_none() {
            events.push(SimEvent::CollisionOccurred {
                x: car.x,
                y: car.y,
                intensity: TRACK_COLLISION_INTENSITY,
            });
            handle_track_collision(car);
        }
    }

    for i in 0..cars.len() {
        for j in (i + 1)..cars.len() {
            let (left, right) = cars.split_at_mut(j);
            let car1 = &mut left[i];
            let car2 = &mut right[0];

            if check_car_collision(car1, car2) {
                events.push(SimEvent::CollisionOccurred {
                    x: (car1.x + car2.x) / 2.0,
                    y: (car1.y + car2.y) / 2.0,
                    intensity: CAR_COLLISION_INTENSITY,
                });
                handle_car_collision(car1, car2);
            }
        }
    }
}
