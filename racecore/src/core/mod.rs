pub mod car;
pub mod collision;
pub mod driver;
pub mod effects;
pub mod handle_race;
pub mod powerup;
pub mod race;
pub mod state_handler;
pub mod track;
