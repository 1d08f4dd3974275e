pub mod events;
pub mod refresh;
pub mod schedule;
